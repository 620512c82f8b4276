pub mod database;
pub mod environment;
pub mod policy;

pub use database::{init_db, DbPool};
pub use environment::{AppEnv, Config};
