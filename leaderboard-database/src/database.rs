use anyhow::Context as _;
use sqlx::{migrate::Migrator, postgres::PgPoolOptions};
use tracing::{info, warn};

use leaderboard_core::{Config, StoreSettings};

use crate::backend::{MemoryTable, PgTable, RestTable, StoreBackend};

/// Compile-time discovered SQLx migrations for the `leaderboard-database` crate.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// The single table every operation reads and writes.
pub const LEADERBOARD_TABLE: &str = "leaderboard";

/// Shared store handle passed across crates.
#[derive(Clone, Debug)]
pub struct Database {
    backend: StoreBackend,
}

impl Database {
    /// Create a handle from an already constructed backend.
    pub fn new(backend: StoreBackend) -> Self {
        Self { backend }
    }

    /// Create a handle over an empty process-local table.
    pub fn memory() -> Self {
        Self::new(StoreBackend::Memory(MemoryTable::new()))
    }

    /// Build the backend selected by `config`, connecting and migrating where needed.
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let backend = match &config.store {
            StoreSettings::Rest(settings) => {
                let table = RestTable::new(settings, LEADERBOARD_TABLE)?;
                info!(endpoint = table.endpoint(), "Using hosted REST store.");
                StoreBackend::Rest(table)
            }
            StoreSettings::Postgres(settings) => {
                let pool = PgPoolOptions::new()
                    .max_connections(settings.max_connections)
                    .connect(&settings.database_url)
                    .await
                    .context("failed to connect to PostgreSQL")?;
                info!("PostgreSQL connection established.");

                if settings.run_migrations {
                    MIGRATOR
                        .run(&pool)
                        .await
                        .context("failed to apply database migrations")?;
                    info!("Database migrations applied.");
                } else {
                    info!(
                        "Auto migrations disabled (set AUTO_RUN_MIGRATIONS=true to run at startup)."
                    );
                }

                StoreBackend::Postgres(PgTable::new(pool))
            }
            StoreSettings::Memory => {
                warn!("Using in-memory store; nothing will be persisted after exit.");
                StoreBackend::Memory(MemoryTable::new())
            }
        };

        Ok(Self::new(backend))
    }

    /// Expose the backend for query modules.
    pub fn backend(&self) -> &StoreBackend {
        &self.backend
    }
}
