//! # grocer-core: Pure Business Logic for Grocer POS
//!
//! This crate holds the record types and the business rules of the
//! grocery point-of-sale store as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Grocer POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              UI / invoice printer (external collaborators)      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    grocer-db (Embedded Store)                   │   │
//! │  │   Collections • Inventory Ledger • Accounting Ledger            │   │
//! │  │   Orchestrator • Dashboard • Backup/Restore                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ grocer-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  types   │ │inventory │ │ invoice  │ │  stats   │          │   │
//! │  │   │ records  │ │StockChng │ │ totals   │ │dashboard │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Persisted records (Product, Sale, InventoryMovement, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`inventory`] - Stock arithmetic behind every stock mutation
//! - [`invoice`] - Sale/purchase headers, line items and totals
//! - [`ledger`] - Account codes and the balance sign convention
//! - [`stats`] - Dashboard folds over fetched records
//! - [`references`] - Lookup-miss labels for weak references
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use grocer_core::money::Money;
//! use grocer_core::types::TaxRate;
//!
//! let price = Money::from_cents(1500);
//! let tax = price.calculate_tax(TaxRate::from_bps(500)); // 5%
//! assert_eq!(tax.cents(), 75);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod inventory;
pub mod invoice;
pub mod ledger;
pub mod money;
pub mod references;
pub mod stats;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use inventory::StockChange;
pub use invoice::{InvoiceTotals, LineItem, PurchaseHeader, SaleHeader};
pub use money::Money;
pub use stats::DashboardSnapshot;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Low-stock threshold used when neither the product nor the settings
/// provide one.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Maximum quantity on a single sale or purchase line.
///
/// Guards against typing 10000 instead of 10 at the register; purchases of
/// whole pallets still fit comfortably.
pub const MAX_LINE_QUANTITY: i64 = 100_000;
