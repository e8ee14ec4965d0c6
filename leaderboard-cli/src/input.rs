use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;

/// One record of the input file. Discarded once it has been upserted.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct InputRecord {
    pub telegram_username: String,
    pub xp: i64,
    #[serde(default)]
    pub x_handle: Option<String>,
}

pub fn parse_records(raw: &str) -> anyhow::Result<Vec<InputRecord>> {
    serde_json::from_str(raw).context("input is not a JSON array of leaderboard records")
}

pub async fn load_records(path: &Path) -> anyhow::Result<Vec<InputRecord>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read input file `{}`", path.display()))?;

    parse_records(&raw).with_context(|| format!("failed to parse `{}`", path.display()))
}
