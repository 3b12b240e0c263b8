use crate::config::DatabaseConfig;
use crate::error::AppResult;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;

/// Shared handle; `DatabaseConnection` itself is not `Clone` under the `mock` feature.
pub type DbPool = Arc<DatabaseConnection>;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let pool = Database::connect(options).await?;
    Ok(Arc::new(pool))
}

pub async fn run_migrations(pool: &DbPool) -> AppResult<()> {
    Migrator::up(pool.as_ref(), None).await?;
    Ok(())
}

/// Statements a mock pool has executed, rendered for substring checks.
#[cfg(test)]
pub(crate) fn statement_log(pool: DbPool) -> String {
    match Arc::try_unwrap(pool) {
        Ok(db) => format!("{:?}", db.into_transaction_log()),
        Err(_) => panic!("mock pool is still shared"),
    }
}

/// Mock row answering a paginator `COUNT(*)`.
#[cfg(test)]
pub(crate) fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
    std::collections::BTreeMap::from([("num_items", sea_orm::Value::BigInt(Some(n)))])
}
