//! # Repository Module
//!
//! Workflows and reads built on top of the record store.
//!
//! ## Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  UI / seed bin                                                          │
//! │       │   db.orders().record_sale(&header, &lines)                      │
//! │       ▼                                                                 │
//! │  OrderRepository ─────┬──► InventoryLedger::adjust_stock_in            │
//! │  (one transaction)    └──► AccountingLedger::post_in                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  store::{insert, get, list_by, ...}     (store.rs, records.rs)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! │                                                                         │
//! │  DashboardRepository, CatalogRepository, BackupRepository and          │
//! │  SettingsRepository read and write through the same store functions.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`InventoryLedger`] - stock adjustments and movement history
//! - [`AccountingLedger`] - append-only postings and balances
//! - [`OrderRepository`] - sale and purchase workflows
//! - [`DashboardRepository`] - aggregate figures
//! - [`CatalogRepository`] - search, reference labels, invoice detail, seeding
//! - [`BackupRepository`] - export/import
//! - [`SettingsRepository`] - keyed settings

pub mod accounting;
pub mod backup;
pub mod catalog;
pub mod dashboard;
pub mod inventory;
pub mod orders;
pub mod settings;

pub use accounting::AccountingLedger;
pub use backup::{BackupData, BackupRepository, BackupSnapshot, ImportReport, SCHEMA_VERSION};
pub use catalog::{CatalogRepository, SaleDetail, SaleDetailLine, SeedReport};
pub use dashboard::DashboardRepository;
pub use inventory::InventoryLedger;
pub use orders::OrderRepository;
pub use settings::{SettingsRepository, StoreSettings};
