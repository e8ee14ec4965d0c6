use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::model::leaderboard::{EntryChanges, EntryKey, LeaderboardEntry, NewEntry};

/// Process-local table. Rows keep insertion order, so equal-xp ties list oldest first.
#[derive(Clone, Debug, Default)]
pub struct MemoryTable {
    rows: Arc<Mutex<Vec<LeaderboardEntry>>>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<EntryKey>, StoreError> {
        let rows = self.rows.lock().await;

        Ok(rows
            .iter()
            .find(|row| row.username == username)
            .map(|row| EntryKey {
                telegram_username: row.username.clone(),
                xp: row.xp,
            }))
    }

    pub async fn update(
        &self,
        username: &str,
        changes: &EntryChanges,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let mut rows = self.rows.lock().await;

        let Some(row) = rows.iter_mut().find(|row| row.username == username) else {
            return Ok(Vec::new());
        };

        if let Some(xp) = changes.xp {
            row.xp = xp;
        }
        if let Some(handle) = &changes.x_handle {
            row.social_handle = Some(handle.clone());
        }

        Ok(vec![row.clone()])
    }

    pub async fn insert(&self, entry: &NewEntry) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let mut rows = self.rows.lock().await;

        if rows.iter().any(|row| row.username == entry.telegram_username) {
            return Err(StoreError::Validation(format!(
                "duplicate key value for telegram_username `{}`",
                entry.telegram_username
            )));
        }
        if entry.xp < 0 {
            return Err(StoreError::Validation("xp must be non-negative".to_owned()));
        }

        let row = LeaderboardEntry::from(entry.clone());
        rows.push(row.clone());

        Ok(vec![row])
    }

    pub async fn list_by_xp(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let mut rows = self.rows.lock().await.clone();

        // stable sort keeps insertion order among ties
        rows.sort_by(|a, b| b.xp.cmp(&a.xp));
        if let Some(limit) = limit {
            rows.truncate(limit);
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryTable;
    use crate::error::StoreError;
    use crate::model::leaderboard::{EntryChanges, NewEntry};

    fn new_entry(username: &str, xp: i64) -> NewEntry {
        NewEntry {
            telegram_username: username.to_owned(),
            xp,
            x_handle: None,
        }
    }

    #[tokio::test]
    async fn update_of_missing_row_returns_nothing() {
        let table = MemoryTable::new();
        let changes = EntryChanges {
            xp: Some(10),
            x_handle: None,
        };

        let rows = table.update("ghost", &changes).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let table = MemoryTable::new();
        table.insert(&new_entry("alice", 1)).await.unwrap();

        let err = table.insert(&new_entry("alice", 2)).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn listing_keeps_insertion_order_for_ties_and_honours_limit() {
        let table = MemoryTable::new();
        for (name, xp) in [("a", 5), ("b", 9), ("c", 5), ("d", 1)] {
            table.insert(&new_entry(name, xp)).await.unwrap();
        }

        let names: Vec<String> = table
            .list_by_xp(None)
            .await
            .unwrap()
            .into_iter()
            .map(|row| row.username)
            .collect();
        assert_eq!(names, ["b", "a", "c", "d"]);

        let top = table.list_by_xp(Some(2)).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].username, "b");
    }
}
