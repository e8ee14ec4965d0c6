use std::fmt;

use serde::{Deserialize, Serialize};

/// One user's row in the leaderboard table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    #[serde(rename = "telegram_username")]
    pub username: String,
    pub xp: i64,
    #[serde(rename = "x_handle", default)]
    pub social_handle: Option<String>,
}

/// The columns selected when checking whether a user already exists.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct EntryKey {
    pub telegram_username: String,
    pub xp: i64,
}

/// Partial update payload. Absent fields leave the stored column untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EntryChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_handle: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewEntry {
    pub telegram_username: String,
    pub xp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_handle: Option<String>,
}

impl From<NewEntry> for LeaderboardEntry {
    fn from(entry: NewEntry) -> Self {
        Self {
            username: entry.telegram_username,
            xp: entry.xp,
            social_handle: entry.x_handle,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Update,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Update => "update",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful upsert: which path was taken and the rows the store returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub operation: Operation,
    pub rows: Vec<LeaderboardEntry>,
}
