use tracing::{debug, error};

use crate::{
    database::Database,
    error::StoreError,
    model::leaderboard::{EntryChanges, LeaderboardEntry, NewEntry, Operation, UpsertOutcome},
};

/// Insert `username` with `xp`, or overwrite the xp of the existing row.
///
/// The handle is only written when it is non-empty, so an empty or absent
/// handle never clears one that is already stored.
///
/// The existence check and the write are two separate store calls. A second
/// writer acting on the same username in between can cause a duplicate-key
/// rejection on insert or a lost update.
pub async fn upsert_entry(
    db: &Database,
    username: &str,
    xp: i64,
    social_handle: Option<&str>,
) -> Result<UpsertOutcome, StoreError> {
    let result = try_upsert_entry(db, username, xp, social_handle).await;

    if let Err(err) = &result {
        error!(username, kind = err.kind(), error = %err, "error updating leaderboard");
    }

    result
}

async fn try_upsert_entry(
    db: &Database,
    username: &str,
    xp: i64,
    social_handle: Option<&str>,
) -> Result<UpsertOutcome, StoreError> {
    validate_username(username)?;
    if xp < 0 {
        return Err(StoreError::Validation(format!(
            "xp must be non-negative, got {xp}"
        )));
    }

    let handle = non_empty(social_handle).map(str::to_owned);
    let existing = db.backend().find_by_username(username).await?;

    if let Some(existing) = existing {
        debug!(username, previous_xp = existing.xp, "existing entry found");

        let changes = EntryChanges {
            xp: Some(xp),
            x_handle: handle,
        };
        return update_existing(db, username, &changes).await;
    }

    let rows = db
        .backend()
        .insert(&NewEntry {
            telegram_username: username.to_owned(),
            xp,
            x_handle: handle,
        })
        .await?;

    Ok(UpsertOutcome {
        operation: Operation::Insert,
        rows,
    })
}

/// Set the social handle for `username`, creating the entry with zero xp if needed.
pub async fn register_handle(
    db: &Database,
    username: &str,
    handle: &str,
) -> Result<UpsertOutcome, StoreError> {
    let result = try_register_handle(db, username, handle).await;

    if let Err(err) = &result {
        error!(username, kind = err.kind(), error = %err, "error registering handle");
    }

    result
}

async fn try_register_handle(
    db: &Database,
    username: &str,
    handle: &str,
) -> Result<UpsertOutcome, StoreError> {
    validate_username(username)?;
    let Some(handle) = non_empty(Some(handle.trim())) else {
        return Err(StoreError::Validation("handle must not be empty".to_owned()));
    };

    if db.backend().find_by_username(username).await?.is_some() {
        let changes = EntryChanges {
            xp: None,
            x_handle: Some(handle.to_owned()),
        };
        return update_existing(db, username, &changes).await;
    }

    let rows = db
        .backend()
        .insert(&NewEntry {
            telegram_username: username.to_owned(),
            xp: 0,
            x_handle: Some(handle.to_owned()),
        })
        .await?;

    Ok(UpsertOutcome {
        operation: Operation::Insert,
        rows,
    })
}

async fn update_existing(
    db: &Database,
    username: &str,
    changes: &EntryChanges,
) -> Result<UpsertOutcome, StoreError> {
    let rows = db.backend().update(username, changes).await?;

    // the row disappeared between lookup and write
    if rows.is_empty() {
        return Err(StoreError::NotFound(username.to_owned()));
    }

    Ok(UpsertOutcome {
        operation: Operation::Update,
        rows,
    })
}

/// Entries ordered by xp descending. Tie order is left to the backend.
pub async fn try_list_ranked(
    db: &Database,
    limit: Option<usize>,
) -> Result<Vec<LeaderboardEntry>, StoreError> {
    db.backend().list_by_xp(limit).await
}

/// Like [`try_list_ranked`] without a limit, but a failed query is logged and
/// reported as an empty leaderboard.
pub async fn list_ranked(db: &Database) -> Vec<LeaderboardEntry> {
    match try_list_ranked(db, None).await {
        Ok(entries) => entries,
        Err(err) => {
            error!(kind = err.kind(), error = %err, "error fetching leaderboard");
            Vec::new()
        }
    }
}

fn validate_username(username: &str) -> Result<(), StoreError> {
    if username.trim().is_empty() {
        return Err(StoreError::Validation(
            "username must not be empty".to_owned(),
        ));
    }
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}
