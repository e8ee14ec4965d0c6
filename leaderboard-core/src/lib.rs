/// Startup configuration read from the environment.
pub mod config;

pub use config::{Config, PostgresSettings, RestSettings, StoreSettings};
