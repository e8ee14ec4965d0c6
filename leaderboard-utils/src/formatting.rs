use leaderboard_database::model::leaderboard::LeaderboardEntry;

/// Header printed before the ranked listing of a batch run.
pub const LISTING_HEADER: &str = "Current Leaderboard:";

/// Header of the compact board layout.
pub const BOARD_HEADER: &str = "Leaderboard 🏆";

/// Progress line logged before a record is upserted.
pub fn format_processing_line(username: &str, xp: i64, social_handle: Option<&str>) -> String {
    match social_handle.filter(|handle| !handle.is_empty()) {
        Some(handle) => format!("Processing user: {username} with XP: {xp}, X: {handle}"),
        None => format!("Processing user: {username} with XP: {xp}"),
    }
}

/// Format one ranked entry, e.g. `1. @alice (@alice_x): 50 XP`. `rank` is 1-based.
pub fn format_rank_line(rank: usize, entry: &LeaderboardEntry) -> String {
    let handle = entry
        .social_handle
        .as_deref()
        .filter(|handle| !handle.is_empty())
        .map(|handle| format!(" ({handle})"))
        .unwrap_or_default();

    format!("{}. @{}{}: {} XP", rank, entry.username, handle, entry.xp)
}

/// One line per entry in rank order.
pub fn format_listing(entries: &[LeaderboardEntry]) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| format_rank_line(index + 1, entry))
        .collect()
}

/// Compact board: a header, then `rank. @name` padded to 20 columns and the xp.
pub fn format_board(entries: &[LeaderboardEntry]) -> String {
    let mut lines = vec![BOARD_HEADER.to_owned()];

    lines.extend(entries.iter().enumerate().map(|(index, entry)| {
        let username = format!("@{}", entry.username);
        format!("{}. {:<20} {}", index + 1, username, entry.xp)
    }));

    lines.join("\n")
}
