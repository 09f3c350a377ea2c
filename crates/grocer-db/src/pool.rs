//! # Store Lifecycle
//!
//! Opening, sharing and closing the SQLite-backed store.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DbConfig::new(path) / DbConfig::in_memory()                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::open(config).await    create file, WAL, run migrations      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreState::Ready ── clone the handle into every consumer             │
//! │       │               db.products() / db.orders() / db.begin() ...     │
//! │       ▼                                                                 │
//! │  db.close().await                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreState::Closed ── every operation fails with ConnectionFailed     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no global instance; whoever opens the store passes the handle
//! on. Clones share one pool, so closing any clone closes all of them.
//!
//! ## WAL Mode
//! File-backed stores use WAL journaling with NORMAL synchronous: readers
//! don't block the writer, and a crash can lose at most the last
//! committed transaction, never corrupt the file.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use grocer_core::{Category, Customer, Product, Supplier, User};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::{
    AccountingLedger, BackupRepository, CatalogRepository, DashboardRepository, InventoryLedger,
    OrderRepository, SettingsRepository,
};
use crate::store::{Collection, Record, StoreTx};

const MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Store connection settings.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/grocer.db")
///     .max_connections(5)
///     .acquire_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub database_path: PathBuf,

    /// Default: 5 (one register, a few background reads)
    pub max_connections: u32,

    /// Default: 1
    pub min_connections: u32,

    /// How long an operation waits for a free connection.
    /// Default: 30 seconds
    pub acquire_timeout: Duration,

    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// A private in-memory store, gone when closed.
    ///
    /// One connection that never expires: a second connection or a
    /// recycled one would see a different, empty database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(MEMORY_PATH),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY_PATH
    }
}

// =============================================================================
// Database
// =============================================================================

/// Where the store is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Ready,
    Closed,
}

/// Handle on an open store; cheap to clone.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::open(DbConfig::new("./grocer.db")).await?;
///
/// let rice = db.products().create(&Product::new("Rice 1kg", 500)).await?;
/// let sale_id = db.orders().record_sale(&header, &lines).await?;
/// let today = db.dashboard().snapshot().await;
///
/// db.close().await;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the store and applies migrations.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Enables WAL, NORMAL synchronous and foreign keys
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn open(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            in_memory = config.is_in_memory(),
            "Opening store"
        );

        let pool = if config.is_in_memory() {
            let options = SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
                .foreign_keys(true);

            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .acquire_timeout(config.acquire_timeout)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            let options = SqliteConnectOptions::new()
                .filename(&config.database_path)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .foreign_keys(true)
                .create_if_missing(true);

            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .acquire_timeout(config.acquire_timeout)
                .idle_timeout(Some(config.idle_timeout))
                .connect_with(options)
                .await
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        };

        debug!(max_connections = config.max_connections, "Pool created");

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        info!("Store ready");
        Ok(db)
    }

    /// Applies pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// For queries not covered by the repositories.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn state(&self) -> StoreState {
        if self.pool.is_closed() {
            StoreState::Closed
        } else {
            StoreState::Ready
        }
    }

    /// Closes the pool; later operations fail with `ConnectionFailed`.
    pub async fn close(&self) {
        info!("Closing store");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Starts a transaction scope spanning several record operations.
    pub async fn begin(&self) -> DbResult<StoreTx> {
        let tx = self.pool.begin().await?;
        Ok(StoreTx::new(tx))
    }

    // -------------------------------------------------------------------------
    // Collections
    // -------------------------------------------------------------------------

    /// Generic handle on any record collection.
    pub fn collection<T: Record>(&self) -> Collection<T> {
        Collection::new(self.pool.clone())
    }

    pub fn products(&self) -> Collection<Product> {
        self.collection()
    }

    pub fn categories(&self) -> Collection<Category> {
        self.collection()
    }

    pub fn customers(&self) -> Collection<Customer> {
        self.collection()
    }

    pub fn suppliers(&self) -> Collection<Supplier> {
        self.collection()
    }

    pub fn users(&self) -> Collection<User> {
        self.collection()
    }

    // -------------------------------------------------------------------------
    // Repositories
    // -------------------------------------------------------------------------

    pub fn inventory(&self) -> InventoryLedger {
        InventoryLedger::new(self.pool.clone())
    }

    pub fn accounting(&self) -> AccountingLedger {
        AccountingLedger::new(self.pool.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    pub fn dashboard(&self) -> DashboardRepository {
        DashboardRepository::new(self.pool.clone())
    }

    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::new(self.pool.clone())
    }

    pub fn backup(&self) -> BackupRepository {
        BackupRepository::new(self.pool.clone())
    }

    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;
    use grocer_core::MovementType;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = test_db().await;
        assert!(db.health_check().await);
        assert_eq!(db.state(), StoreState::Ready);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/grocer.db")
            .max_connections(10)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(3));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.acquire_timeout, Duration::from_secs(3));
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }

    #[tokio::test]
    async fn test_operations_fail_after_close() {
        let db = test_db().await;
        let id = db.products().create(&Product::new("Rice", 500)).await.unwrap();

        let other_handle = db.clone();
        db.close().await;

        assert_eq!(other_handle.state(), StoreState::Closed);
        assert!(!db.health_check().await);

        let err = other_handle.products().get(id).await.unwrap_err();
        assert!(err.is_closed());
        assert!(matches!(db.begin().await, Err(DbError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grocer.db");

        let db = Database::open(DbConfig::new(&path)).await.unwrap();
        let id = db
            .products()
            .create(&Product::new("Rice", 500).with_stock(10))
            .await
            .unwrap();
        db.inventory()
            .adjust_stock(id, 4, MovementType::Sale)
            .await
            .unwrap();
        db.close().await;

        let db = Database::open(DbConfig::new(&path)).await.unwrap();
        let rice = db.products().get(id).await.unwrap().unwrap();
        assert_eq!(rice.stock, 6);
        assert_eq!(db.inventory().movements_for(id).await.unwrap().len(), 1);
        db.close().await;
    }

    #[tokio::test]
    async fn test_transaction_scope_rolls_back_on_drop() {
        let db = test_db().await;

        {
            let mut tx = db.begin().await.unwrap();
            tx.create(&Customer::new("Ahmed")).await.unwrap();
            assert_eq!(tx.count::<Customer>().await.unwrap(), 1);
        }
        assert_eq!(db.customers().count().await.unwrap(), 0);

        let mut tx = db.begin().await.unwrap();
        let id = tx.create(&Customer::new("Fatima")).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(db.customers().get(id).await.unwrap().unwrap().name, "Fatima");
    }
}
