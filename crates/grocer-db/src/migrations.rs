//! # Database Migrations
//!
//! Embedded SQL migrations for the store schema.
//!
//! ## Schema Files
//! ```text
//! migrations/sqlite/
//! ├── 001_catalog_and_parties.sql     categories, products, inventory,
//! │                                   customers, suppliers, users
//! └── 002_invoices_and_ledgers.sql    sales, purchases and their items,
//!                                     accounting_transactions,
//!                                     inventory_movements, settings
//! ```
//!
//! Applied migrations are tracked in `_sqlx_migrations`; running them again
//! is a no-op. Never edit an applied migration, add the next file instead.
//! Changing the schema also bumps [`crate::repository::SCHEMA_VERSION`]
//! when backups are affected.

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::DbResult;

/// Embedded at compile time; no SQL files are read at runtime.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!(available = MIGRATOR.migrations.len(), "Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied");
    Ok(())
}

/// Returns (embedded migrations, applied migrations).
///
/// A store that has never been migrated reports zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = match sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
    {
        Ok(count) => count,
        Err(e) => {
            warn!(error = %e, "Could not read migration table");
            0
        }
    };

    Ok((total, applied as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_migrations_applied_and_idempotent() {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();

        let (total, applied) = migration_status(db.pool()).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(applied, 2);

        db.run_migrations().await.unwrap();
        assert_eq!(migration_status(db.pool()).await.unwrap(), (2, 2));
    }

    #[tokio::test]
    async fn test_unmigrated_store_reports_zero() {
        let db = Database::open(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();
        assert_eq!(migration_status(db.pool()).await.unwrap(), (2, 0));
    }
}
