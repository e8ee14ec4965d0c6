pub mod backend;
pub mod database;
pub mod error;
pub mod impls;
pub mod model;

pub use database::{Database, LEADERBOARD_TABLE, MIGRATOR};
pub use error::StoreError;
