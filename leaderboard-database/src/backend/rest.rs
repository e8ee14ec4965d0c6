use anyhow::Context as _;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use leaderboard_core::RestSettings;

use crate::error::StoreError;
use crate::model::leaderboard::{EntryChanges, EntryKey, LeaderboardEntry, NewEntry};

const KEY_COLUMNS: &str = "telegram_username,xp";
const ENTRY_COLUMNS: &str = "telegram_username,x_handle,xp";
const RETURN_REPRESENTATION: &str = "return=representation";

/// Error body returned by PostgREST for rejected requests.
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    message: Option<String>,
    code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

/// A single table reached through a PostgREST-compatible HTTP API.
#[derive(Clone, Debug)]
pub struct RestTable {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RestTable {
    pub fn new(settings: &RestSettings, table: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: table_endpoint(&settings.url, table),
            api_key: settings.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, &self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<EntryKey>, StoreError> {
        let response = self
            .request(Method::GET)
            .query(&[
                ("select", KEY_COLUMNS.to_owned()),
                ("telegram_username", eq_filter(username)),
            ])
            .send()
            .await?;

        let mut rows: Vec<EntryKey> = read_rows(response).await?;
        if rows.len() > 1 {
            warn!(
                username,
                matches = rows.len(),
                "more than one leaderboard row for username; using the first"
            );
        }

        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    pub async fn update(
        &self,
        username: &str,
        changes: &EntryChanges,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let response = self
            .request(Method::PATCH)
            .query(&[("telegram_username", eq_filter(username))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(changes)
            .send()
            .await?;

        read_rows(response).await
    }

    pub async fn insert(&self, entry: &NewEntry) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let response = self
            .request(Method::POST)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&[entry])
            .send()
            .await?;

        read_rows(response).await
    }

    pub async fn list_by_xp(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let response = self
            .request(Method::GET)
            .query(&list_query(limit))
            .send()
            .await?;

        read_rows(response).await
    }
}

fn table_endpoint(base_url: &str, table: &str) -> String {
    format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table)
}

fn eq_filter(value: &str) -> String {
    format!("eq.{value}")
}

fn list_query(limit: Option<usize>) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("select", ENTRY_COLUMNS.to_owned()),
        ("order", "xp.desc".to_owned()),
    ];
    if let Some(limit) = limit {
        query.push(("limit", limit.to_string()));
    }
    query
}

async fn read_rows<T>(response: Response) -> Result<Vec<T>, StoreError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<Vec<T>>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), body = %body, "store rejected request");

    Err(error_from_response(status, &body))
}

/// Map a non-success response onto a store error kind.
fn error_from_response(status: StatusCode, body: &str) -> StoreError {
    let parsed: PostgrestError = serde_json::from_str(body).unwrap_or_default();

    let mut message = parsed
        .message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status.to_string()
            } else {
                trimmed.to_owned()
            }
        });

    if let Some(code) = parsed.code {
        message.push_str(&format!(" (code {code})"));
    }
    if let Some(details) = parsed.details.filter(|details| !details.is_empty()) {
        message.push_str(&format!(": {details}"));
    }
    if let Some(hint) = parsed.hint.filter(|hint| !hint.is_empty()) {
        message.push_str(&format!(" [hint: {hint}]"));
    }

    let rejected_payload = status.is_client_error()
        && status != StatusCode::UNAUTHORIZED
        && status != StatusCode::FORBIDDEN
        && status != StatusCode::NOT_FOUND;

    if rejected_payload {
        StoreError::Validation(message)
    } else {
        StoreError::Transport(format!("HTTP {}: {message}", status.as_u16()))
    }
}
