use sqlx::{mysql::MySqlPoolOptions, MySql, Pool};

use super::environment::Config;

pub type DbPool = Pool<MySql>;

pub async fn init_db(config: &Config) -> Result<DbPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
}
