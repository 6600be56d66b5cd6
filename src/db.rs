//! Database connection and pool management.
//!
//! Initializes the SeaORM connection pool with retry/backoff, exposes a
//! liveness probe, and opens the per-request unit of work handlers pass to the
//! workflow.

use anyhow::{Context, Result};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, DbErr,
    Statement, TransactionTrait,
};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::AppConfig;

const MAX_CONNECT_ATTEMPTS: u32 = 5;

/// Errors that can occur while establishing the pool
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {source}")]
    ConnectionFailed {
        #[from]
        source: DbErr,
    },
    #[error("Invalid database configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Initializes a database connection pool from configuration.
///
/// Transient connection failures are retried with exponential backoff
/// starting at 100ms.
///
/// ```no_run
/// use rental_management::{config::AppConfig, db::init_pool};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let db = init_pool(&AppConfig::default()).await?;
///     rental_management::db::health_check(&db).await?;
///     Ok(())
/// }
/// ```
pub async fn init_pool(cfg: &AppConfig) -> Result<DatabaseConnection> {
    if cfg.database_url.trim().is_empty() {
        return Err(DatabaseError::InvalidConfiguration {
            message: "Database URL cannot be empty".to_string(),
        }
        .into());
    }
    if cfg.db_max_connections == 0 {
        return Err(DatabaseError::InvalidConfiguration {
            message: "db_max_connections must be at least 1".to_string(),
        }
        .into());
    }

    let mut opt = ConnectOptions::new(&cfg.database_url);
    opt.max_connections(cfg.db_max_connections)
        .acquire_timeout(Duration::from_millis(cfg.db_acquire_timeout_ms))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let mut retry_delay = Duration::from_millis(100);
    let mut attempt = 1;

    loop {
        match Database::connect(opt.clone()).await {
            Ok(conn) => {
                log::info!("Connected to database (attempt {})", attempt);
                return Ok(conn);
            }
            Err(e) if attempt >= MAX_CONNECT_ATTEMPTS => {
                log::error!(
                    "Failed to connect to database after {} attempts: {}",
                    MAX_CONNECT_ATTEMPTS,
                    e
                );
                return Err(DatabaseError::ConnectionFailed { source: e }.into());
            }
            Err(e) => {
                log::warn!(
                    "Database connection attempt {} failed: {}, retrying in {:?}",
                    attempt,
                    e,
                    retry_delay
                );
                sleep(retry_delay).await;
                retry_delay *= 2;
                attempt += 1;
            }
        }
    }
}

/// Verifies the connection is alive by running `SELECT 1`.
pub async fn health_check<C: ConnectionTrait>(db: &C) -> Result<()> {
    let stmt = Statement::from_string(db.get_database_backend(), "SELECT 1".to_string());

    db.query_one(stmt)
        .await
        .context("Database health check failed")?;

    Ok(())
}

/// Opens the unit of work for one request.
///
/// The transaction must be committed explicitly; dropping it rolls back.
pub async fn begin_unit_of_work(db: &DatabaseConnection) -> Result<DatabaseTransaction, DbErr> {
    db.begin().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::{Migrator, MigratorTrait};
    use crate::models::{Asset, asset};
    use sea_orm::{ActiveModelTrait, EntityTrait, Set};
    use uuid::Uuid;

    async fn memory_db() -> DatabaseConnection {
        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 1,
            ..Default::default()
        };
        let db = init_pool(&config).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn empty_database_url_rejected() {
        let config = AppConfig {
            database_url: "  ".to_string(),
            ..Default::default()
        };

        let err = init_pool(&config).await.unwrap_err();
        assert!(matches!(
            err.downcast::<DatabaseError>(),
            Ok(DatabaseError::InvalidConfiguration { .. })
        ));
    }

    #[tokio::test]
    async fn zero_pool_size_rejected() {
        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 0,
            ..Default::default()
        };

        assert!(init_pool(&config).await.is_err());
    }

    #[tokio::test]
    async fn health_check_succeeds_on_live_pool() {
        let db = memory_db().await;
        assert!(health_check(&db).await.is_ok());
    }

    #[tokio::test]
    async fn dropped_unit_of_work_rolls_back() {
        let db = memory_db().await;
        let id = Uuid::new_v4();

        {
            let txn = begin_unit_of_work(&db).await.unwrap();
            asset::ActiveModel {
                id: Set(id),
                name: Set("Unit 1".to_string()),
            }
            .insert(&txn)
            .await
            .unwrap();
        }

        assert!(Asset::find_by_id(id).one(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn committed_unit_of_work_persists() {
        let db = memory_db().await;
        let id = Uuid::new_v4();

        let txn = begin_unit_of_work(&db).await.unwrap();
        asset::ActiveModel {
            id: Set(id),
            name: Set("Unit 2".to_string()),
        }
        .insert(&txn)
        .await
        .unwrap();
        txn.commit().await.unwrap();

        assert!(Asset::find_by_id(id).one(&db).await.unwrap().is_some());
    }
}
