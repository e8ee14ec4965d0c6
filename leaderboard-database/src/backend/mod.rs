mod memory;
mod postgres;
mod rest;

pub use memory::MemoryTable;
pub use postgres::PgTable;
pub use rest::RestTable;

use crate::error::StoreError;
use crate::model::leaderboard::{EntryChanges, EntryKey, LeaderboardEntry, NewEntry};

/// The four table operations the store client is built on.
#[derive(Clone, Debug)]
pub enum StoreBackend {
    Rest(RestTable),
    Postgres(PgTable),
    Memory(MemoryTable),
}

impl StoreBackend {
    pub async fn find_by_username(&self, username: &str) -> Result<Option<EntryKey>, StoreError> {
        match self {
            StoreBackend::Rest(table) => table.find_by_username(username).await,
            StoreBackend::Postgres(table) => table.find_by_username(username).await,
            StoreBackend::Memory(table) => table.find_by_username(username).await,
        }
    }

    /// Apply `changes` to the row keyed by `username` and return the updated rows.
    pub async fn update(
        &self,
        username: &str,
        changes: &EntryChanges,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        match self {
            StoreBackend::Rest(table) => table.update(username, changes).await,
            StoreBackend::Postgres(table) => table.update(username, changes).await,
            StoreBackend::Memory(table) => table.update(username, changes).await,
        }
    }

    pub async fn insert(&self, entry: &NewEntry) -> Result<Vec<LeaderboardEntry>, StoreError> {
        match self {
            StoreBackend::Rest(table) => table.insert(entry).await,
            StoreBackend::Postgres(table) => table.insert(entry).await,
            StoreBackend::Memory(table) => table.insert(entry).await,
        }
    }

    /// All rows ordered by xp descending, optionally capped at `limit`.
    pub async fn list_by_xp(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        match self {
            StoreBackend::Rest(table) => table.list_by_xp(limit).await,
            StoreBackend::Postgres(table) => table.list_by_xp(limit).await,
            StoreBackend::Memory(table) => table.list_by_xp(limit).await,
        }
    }
}
