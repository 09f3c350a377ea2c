//! # grocer-db: Embedded Store for Grocer POS
//!
//! Durable storage and every multi-step workflow of the point of sale:
//! record collections, the inventory and accounting ledgers, sale and
//! purchase recording, dashboard figures and backup/restore.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Grocer POS Data Flow                             │
//! │                                                                         │
//! │  UI (external)                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    grocer-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌───────────────┐   │   │
//! │  │   │   Database    │   │  Repositories  │   │  Migrations   │   │   │
//! │  │   │   (pool.rs)   │   │                │   │  (embedded)   │   │   │
//! │  │   │               │   │ orders         │   │               │   │   │
//! │  │   │ open / close  │◄──│ inventory      │   │ 001_catalog   │   │   │
//! │  │   │ begin         │   │ accounting     │   │ 002_invoices  │   │   │
//! │  │   │ collection<T> │   │ dashboard ...  │   │               │   │   │
//! │  │   └───────────────┘   └────────────────┘   └───────────────┘   │   │
//! │  │           │                                                     │   │
//! │  │           ▼                                                     │   │
//! │  │   store.rs + records.rs: generic Record collections            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL)                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Store lifecycle and repository accessors
//! - [`store`] - Generic record collections and transaction scope
//! - [`records`] - Table mapping of every domain record
//! - [`repository`] - Ledgers, workflows, dashboard, catalog, backup, settings
//! - [`config`] - TOML + environment configuration
//! - [`migrations`] - Embedded schema migrations
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use grocer_db::{Database, DbConfig};
//! use grocer_core::{LineItem, SaleHeader, TaxRate};
//!
//! let db = Database::open(DbConfig::new("grocer.db")).await?;
//!
//! let lines = vec![LineItem::new(cola_id, 3, 500)];
//! let header = SaleHeader::from_lines("INV-1", &lines, TaxRate::zero());
//! let sale_id = db.orders().record_sale(&header, &lines).await?;
//!
//! let backup = db.backup().export_json().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod records;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::StoreConfig;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, StoreState};
pub use store::{Collection, IndexValue, Record, StoreTx};

pub use repository::{
    AccountingLedger, BackupData, BackupRepository, BackupSnapshot, CatalogRepository,
    DashboardRepository, ImportReport, InventoryLedger, OrderRepository, SaleDetail,
    SettingsRepository, StoreSettings, SCHEMA_VERSION,
};
