//! Persistence for the officer panel: entities, migrations and the
//! repositories the services read and write through.
//!
//! Every table lives in one Postgres database. [`init`] opens the shared
//! pool, [`migrate`] brings the schema up to date before the server
//! accepts requests.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use std::time::Duration;

use foodify_common::{config::DatabaseConfig, AppError, Config};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::log::LevelFilter;

/// Waiting longer than this for a connection fails the request.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Idle connections above `min_connections` are closed after this.
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);
/// Connections are recycled after this, idle or not.
const MAX_LIFETIME: Duration = Duration::from_secs(1800);

/// Pool options for the panel's database.
///
/// Statements are logged at debug so `RUST_LOG=sqlx=debug` shows the SQL
/// behind a failing listing without flooding the default output.
#[must_use]
pub fn connect_options(database: &DatabaseConfig) -> ConnectOptions {
    let mut opt = ConnectOptions::new(&database.url);
    opt.max_connections(database.max_connections)
        .min_connections(database.min_connections)
        .connect_timeout(CONNECT_TIMEOUT)
        .acquire_timeout(CONNECT_TIMEOUT)
        .idle_timeout(IDLE_TIMEOUT)
        .max_lifetime(MAX_LIFETIME)
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);
    opt
}

/// Open the connection pool.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    Database::connect(connect_options(&config.database))
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Apply every migration the database has not seen yet.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    let pending = migrations::Migrator::get_pending_migrations(db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    tracing::info!(pending = pending.len(), "Applying migrations");

    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_options_follow_config() {
        let database = DatabaseConfig {
            url: "postgres://localhost/foodify".to_string(),
            max_connections: 7,
            min_connections: 2,
        };

        let opt = connect_options(&database);

        assert_eq!(opt.get_url(), "postgres://localhost/foodify");
        assert_eq!(opt.get_max_connections(), Some(7));
        assert_eq!(opt.get_min_connections(), Some(2));
        assert_eq!(opt.get_idle_timeout(), Some(IDLE_TIMEOUT));
        assert_eq!(opt.get_max_lifetime(), Some(MAX_LIFETIME));
    }
}
