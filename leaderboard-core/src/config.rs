use std::env;
use std::fmt;

use anyhow::bail;

const DEFAULT_MAX_CONNECTIONS: u64 = 5;

/// Connection parameters for a PostgREST-compatible hosted store.
#[derive(Clone)]
pub struct RestSettings {
    pub url: String,
    pub api_key: String,
}

impl fmt::Debug for RestSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestSettings")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct PostgresSettings {
    pub database_url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl fmt::Debug for PostgresSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresSettings")
            .field("database_url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub enum StoreSettings {
    Rest(RestSettings),
    Postgres(PostgresSettings),
    Memory,
}

impl StoreSettings {
    pub fn backend_name(&self) -> &'static str {
        match self {
            StoreSettings::Rest(_) => "rest",
            StoreSettings::Postgres(_) => "postgres",
            StoreSettings::Memory => "memory",
        }
    }
}

/// Process-wide configuration, built once at startup and handed to the store.
#[derive(Clone, Debug)]
pub struct Config {
    pub store: StoreSettings,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let backend = get("STORE_BACKEND")
            .map(|value| value.to_ascii_lowercase())
            .unwrap_or_else(|| "rest".to_owned());

        let store = match backend.as_str() {
            "rest" | "supabase" => {
                let (Some(url), Some(api_key)) = (get("SUPABASE_URL"), get("SUPABASE_ANON_KEY"))
                else {
                    bail!("SUPABASE_URL and SUPABASE_ANON_KEY must be provided in the environment");
                };

                StoreSettings::Rest(RestSettings {
                    url: url.trim_end_matches('/').to_owned(),
                    api_key,
                })
            }
            "postgres" | "postgresql" => {
                let Some(database_url) = get("DATABASE_URL") else {
                    bail!("DATABASE_URL must be provided when STORE_BACKEND=postgres");
                };

                let max_connections = parse_u64(
                    get("DATABASE_MAX_CONNECTIONS").as_deref(),
                    DEFAULT_MAX_CONNECTIONS,
                );

                StoreSettings::Postgres(PostgresSettings {
                    database_url,
                    max_connections: u32::try_from(max_connections.max(1)).unwrap_or(u32::MAX),
                    run_migrations: parse_bool(get("AUTO_RUN_MIGRATIONS").as_deref(), true),
                })
            }
            "memory" => StoreSettings::Memory,
            other => bail!("unknown STORE_BACKEND `{other}` (expected rest, postgres or memory)"),
        };

        Ok(Self { store })
    }
}

fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value {
        Some(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        None => default,
    }
}

fn parse_u64(value: Option<&str>, default: u64) -> u64 {
    match value {
        Some(value) => value.trim().parse::<u64>().unwrap_or(default),
        None => default,
    }
}
