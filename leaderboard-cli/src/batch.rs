use std::path::Path;

use tracing::{error, info};

use leaderboard_database::{
    Database, StoreError,
    impls::leaderboard::{list_ranked, upsert_entry},
    model::leaderboard::{LeaderboardEntry, Operation, UpsertOutcome},
};
use leaderboard_utils::formatting::{LISTING_HEADER, format_listing, format_processing_line};

use crate::input::{InputRecord, load_records};

/// Per-run counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn record(&mut self, result: &Result<UpsertOutcome, StoreError>) {
        self.processed += 1;
        match result {
            Ok(outcome) => match outcome.operation {
                Operation::Insert => self.inserted += 1,
                Operation::Update => self.updated += 1,
            },
            Err(_) => self.failed += 1,
        }
    }
}

/// Upsert every record in order. A failed record is logged and skipped.
pub async fn run_batch(db: &Database, records: &[InputRecord]) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for record in records {
        let username = record.telegram_username.as_str();
        info!(
            "{}",
            format_processing_line(username, record.xp, record.x_handle.as_deref())
        );

        let result = upsert_entry(db, username, record.xp, record.x_handle.as_deref()).await;

        match &result {
            Ok(outcome) => {
                info!(
                    operation = %outcome.operation,
                    rows = ?outcome.rows,
                    "Operation successful: {}",
                    outcome.operation
                );
            }
            Err(err) => {
                error!(
                    username,
                    kind = err.kind(),
                    error = %err,
                    "Operation failed for {}",
                    username
                );
            }
        }

        summary.record(&result);
    }

    info!(
        processed = summary.processed,
        inserted = summary.inserted,
        updated = summary.updated,
        failed = summary.failed,
        "Batch complete."
    );

    summary
}

/// Load `input`, upsert its records, then print the full ranking.
pub async fn sync(db: &Database, input: &Path) -> anyhow::Result<BatchSummary> {
    let records = load_records(input).await?;
    info!(records = records.len(), path = %input.display(), "Loaded input records.");

    let summary = run_batch(db, &records).await;

    let entries = list_ranked(db).await;
    print_listing(&entries);

    Ok(summary)
}

pub fn print_listing(entries: &[LeaderboardEntry]) {
    println!("\n{LISTING_HEADER}");
    for line in format_listing(entries) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use leaderboard_core::RestSettings;
    use leaderboard_database::{
        Database,
        backend::{RestTable, StoreBackend},
        impls::leaderboard::list_ranked,
        model::leaderboard::LeaderboardEntry,
    };

    use super::{BatchSummary, run_batch, sync};
    use crate::input::{InputRecord, parse_records};

    fn record(username: &str, xp: i64, handle: Option<&str>) -> InputRecord {
        InputRecord {
            telegram_username: username.to_owned(),
            xp,
            x_handle: handle.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn batch_against_empty_store_produces_ranking() {
        let db = Database::memory();
        let records = parse_records(
            r#"[
                {"telegram_username": "a", "xp": 5},
                {"telegram_username": "b", "xp": 10, "x_handle": "@b"}
            ]"#,
        )
        .unwrap();

        let summary = run_batch(&db, &records).await;
        assert_eq!(
            summary,
            BatchSummary {
                processed: 2,
                inserted: 2,
                updated: 0,
                failed: 0,
            }
        );

        assert_eq!(
            list_ranked(&db).await,
            vec![
                LeaderboardEntry {
                    username: "b".to_owned(),
                    xp: 10,
                    social_handle: Some("@b".to_owned()),
                },
                LeaderboardEntry {
                    username: "a".to_owned(),
                    xp: 5,
                    social_handle: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn failed_record_does_not_stop_the_batch() {
        let db = Database::memory();
        let records = vec![
            record("first", 3, None),
            record("", 100, None),
            record("broken", -4, Some("@broken")),
            record("last", 8, Some("@last")),
        ];

        let summary = run_batch(&db, &records).await;
        assert_eq!(summary.processed, 4);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.inserted, 2);

        let names: Vec<String> = list_ranked(&db)
            .await
            .into_iter()
            .map(|entry| entry.username)
            .collect();
        assert_eq!(names, ["last", "first"]);
    }

    /// Minimal PostgREST stand-in: lookups find nothing, inserts echo their
    /// payload, and any request naming `failing_user` gets a 500.
    async fn spawn_rest_store(failing_user: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(answer_rest_request(socket, failing_user));
            }
        });

        format!("http://{addr}")
    }

    async fn answer_rest_request(mut socket: TcpStream, failing_user: &str) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        let head_end = loop {
            let read = socket.read(&mut chunk).await.unwrap_or(0);
            if read == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..read]);
            if let Some(pos) = buf.windows(4).position(|window| window == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while buf.len() < head_end + content_length {
            let read = socket.read(&mut chunk).await.unwrap_or(0);
            if read == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..read]);
        }

        let body = String::from_utf8_lossy(&buf[head_end..]).into_owned();
        let request_line = head.lines().next().unwrap_or_default();

        let (status, payload) = if request_line.contains(&format!("eq.{failing_user}"))
            || body.contains(failing_user)
        {
            (
                "500 Internal Server Error",
                r#"{"message":"internal error"}"#.to_owned(),
            )
        } else if request_line.starts_with("POST") {
            ("201 Created", body)
        } else {
            ("200 OK", "[]".to_owned())
        };

        let response = format!(
            "HTTP/1.1 {status}\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{payload}",
            payload.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    }

    #[tokio::test]
    async fn store_failure_for_one_record_does_not_stop_the_batch() {
        let url = spawn_rest_store("broken").await;
        let table = RestTable::new(
            &RestSettings {
                url,
                api_key: "key".to_owned(),
            },
            "leaderboard",
        )
        .unwrap();
        let db = Database::new(StoreBackend::Rest(table));

        let records = vec![
            record("first", 3, None),
            record("broken", 5, Some("@broken")),
            record("last", 8, Some("@last")),
        ];

        let summary = run_batch(&db, &records).await;
        assert_eq!(
            summary,
            BatchSummary {
                processed: 3,
                inserted: 2,
                updated: 0,
                failed: 1,
            }
        );
    }

    #[tokio::test]
    async fn second_batch_updates_and_keeps_handles() {
        let db = Database::memory();
        run_batch(&db, &[record("a", 1, Some("@a"))]).await;

        let summary = run_batch(&db, &[record("a", 40, None), record("b", 2, None)]).await;
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.inserted, 1);

        let ranked = list_ranked(&db).await;
        assert_eq!(ranked[0].username, "a");
        assert_eq!(ranked[0].xp, 40);
        assert_eq!(ranked[0].social_handle.as_deref(), Some("@a"));
    }

    #[tokio::test]
    async fn sync_fails_before_any_write_when_input_is_missing() {
        let db = Database::memory();

        let result = sync(&db, std::path::Path::new("./missing-leaderboard-data.json")).await;
        assert!(result.is_err());
        assert!(list_ranked(&db).await.is_empty());
    }
}
