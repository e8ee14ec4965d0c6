use thiserror::Error;

/// Failure kinds surfaced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no leaderboard entry for `{0}`")]
    NotFound(String),
    #[error("invalid leaderboard data: {0}")]
    Validation(String),
    #[error("store request failed: {0}")]
    Transport(String),
}

impl StoreError {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "not_found",
            StoreError::Validation(_) => "validation",
            StoreError::Transport(_) => "transport",
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return StoreError::Transport(format!("failed to decode store response: {err}"));
        }

        StoreError::Transport(err.to_string())
    }
}

// 23502 not_null_violation, 23505 unique_violation, 23514 check_violation,
// 22P02 invalid_text_representation
const VALIDATION_SQLSTATES: &[&str] = &["23502", "23505", "23514", "22P02"];

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row".to_owned()),
            sqlx::Error::Database(db_err) => {
                let is_validation = db_err
                    .code()
                    .is_some_and(|code| VALIDATION_SQLSTATES.iter().any(|known| *known == code));

                if is_validation {
                    StoreError::Validation(db_err.message().to_owned())
                } else {
                    StoreError::Transport(db_err.to_string())
                }
            }
            other => StoreError::Transport(other.to_string()),
        }
    }
}
