use std::num::TryFromIntError;

use sqlx::PgPool;

use crate::error::StoreError;
use crate::model::leaderboard::{EntryChanges, EntryKey, LeaderboardEntry, NewEntry};

#[derive(sqlx::FromRow)]
struct EntryKeyRow {
    telegram_username: String,
    xp: i64,
}

#[derive(sqlx::FromRow)]
struct LeaderboardRow {
    telegram_username: String,
    x_handle: Option<String>,
    xp: i64,
}

/// Direct SQL access to the `leaderboard` table.
///
/// `xp` is read back through a `BIGINT` cast so tables created with an
/// `INTEGER` xp column decode the same way as the migrated schema.
#[derive(Clone, Debug)]
pub struct PgTable {
    pool: PgPool,
}

impl PgTable {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<EntryKey>, StoreError> {
        let row: Option<EntryKeyRow> = sqlx::query_as(
            "SELECT telegram_username, xp::BIGINT AS xp
             FROM leaderboard
             WHERE telegram_username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| EntryKey {
            telegram_username: row.telegram_username,
            xp: row.xp,
        }))
    }

    pub async fn update(
        &self,
        username: &str,
        changes: &EntryChanges,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let rows: Vec<LeaderboardRow> = sqlx::query_as(
            "UPDATE leaderboard
             SET xp = COALESCE($1, xp), x_handle = COALESCE($2, x_handle)
             WHERE telegram_username = $3
             RETURNING telegram_username, x_handle, xp::BIGINT AS xp",
        )
        .bind(changes.xp)
        .bind(changes.x_handle.as_deref())
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(to_entry).collect())
    }

    pub async fn insert(&self, entry: &NewEntry) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let rows: Vec<LeaderboardRow> = sqlx::query_as(
            "INSERT INTO leaderboard (telegram_username, xp, x_handle)
             VALUES ($1, $2, $3)
             RETURNING telegram_username, x_handle, xp::BIGINT AS xp",
        )
        .bind(&entry.telegram_username)
        .bind(entry.xp)
        .bind(entry.x_handle.as_deref())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(to_entry).collect())
    }

    pub async fn list_by_xp(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        // LIMIT NULL is LIMIT ALL
        let limit = limit
            .map(i64::try_from)
            .transpose()
            .map_err(|err: TryFromIntError| {
                StoreError::Validation(format!("limit out of i64 range: {err}"))
            })?;

        let rows: Vec<LeaderboardRow> = sqlx::query_as(
            "SELECT telegram_username, x_handle, xp::BIGINT AS xp
             FROM leaderboard
             ORDER BY xp DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(to_entry).collect())
    }
}

fn to_entry(row: LeaderboardRow) -> LeaderboardEntry {
    LeaderboardEntry {
        username: row.telegram_username,
        xp: row.xp,
        social_handle: row.x_handle,
    }
}
