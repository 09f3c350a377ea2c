//! # Backup and Restore
//!
//! Whole-store export to one JSON document and destructive import from it.
//!
//! ## Document
//! ```text
//! {
//!   "version": 2,
//!   "exportDate": "2026-10-16T10:15:00Z",
//!   "data": {
//!     "products": [...], "categories": [...], "customers": [...],
//!     "suppliers": [...], "users": [...], "sales": [...],
//!     "saleItems": [...], "purchases": [...], "purchaseItems": [...],
//!     "transactions": [...], "inventory": [...],
//!     "inventoryMovements": [...], "settings": [...]
//!   }
//! }
//! ```
//!
//! ## Import
//! ```text
//! version > SCHEMA_VERSION ──► IncompatibleVersion (nothing touched)
//! BEGIN
//!   clear every collection present in `data`   (items before headers)
//!   insert every record, ids kept              (headers before items)
//!     record-level failure ──► warn!, skipped
//!     anything else        ──► error, whole import rolled back
//! COMMIT
//! ```
//!
//! A collection missing from `data` is left as it is. Replacing `sales`
//! or `purchases` also drops their items unless those are in the document
//! too, since items are owned by their header.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};
use ts_rs::TS;

use grocer_core::validation::validate_product;
use grocer_core::{
    AccountingTransaction, Category, CoreError, Customer, InventoryEntry, InventoryMovement,
    Product, Purchase, PurchaseItem, Sale, SaleItem, Setting, Supplier, User,
};

use crate::error::{DbError, DbResult};
use crate::repository::settings;
use crate::store::{self, Record};

/// Schema version written into every export.
pub const SCHEMA_VERSION: u32 = 2;

// =============================================================================
// Document Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    pub version: u32,
    #[ts(as = "String")]
    pub export_date: DateTime<Utc>,
    pub data: BackupData,
}

/// Collection contents; `None` means "not part of this backup".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Product>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customers: Option<Vec<Customer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppliers: Option<Vec<Supplier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales: Option<Vec<Sale>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_items: Option<Vec<SaleItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchases: Option<Vec<Purchase>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_items: Option<Vec<PurchaseItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<AccountingTransaction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Vec<InventoryEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_movements: Option<Vec<InventoryMovement>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Vec<Setting>>,
}

/// Imported and skipped record counts of one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CollectionReport {
    pub imported: usize,
    pub skipped: usize,
}

/// Outcome of an import, keyed by collection name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub collections: BTreeMap<String, CollectionReport>,
}

impl ImportReport {
    pub fn collection(&self, name: &str) -> CollectionReport {
        self.collections.get(name).copied().unwrap_or_default()
    }

    pub fn total_imported(&self) -> usize {
        self.collections.values().map(|c| c.imported).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.collections.values().map(|c| c.skipped).sum()
    }
}

pub fn to_json(snapshot: &BackupSnapshot) -> DbResult<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

pub fn from_json(json: &str) -> DbResult<BackupSnapshot> {
    Ok(serde_json::from_str(json)?)
}

// =============================================================================
// Restore Helpers
// =============================================================================

fn accept<T>(_: &T) -> DbResult<()> {
    Ok(())
}

fn check_product(product: &Product) -> DbResult<()> {
    validate_product(product).map_err(CoreError::from)?;
    Ok(())
}

/// Inserts `records` keeping their ids; record-level failures are counted
/// and skipped.
async fn restore_records<T: Record>(
    conn: &mut SqliteConnection,
    records: &[T],
    check: fn(&T) -> DbResult<()>,
    report: &mut ImportReport,
) -> DbResult<()> {
    let mut counts = CollectionReport::default();

    for record in records {
        let result = match check(record) {
            Ok(()) => store::insert(&mut *conn, record).await.map(|_| ()),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => counts.imported += 1,
            Err(e) if e.is_record_level() => {
                warn!(
                    collection = T::COLLECTION,
                    id = record.id(),
                    error = %e,
                    "Skipping record during import"
                );
                counts.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    report.collections.insert(T::COLLECTION.to_string(), counts);
    Ok(())
}

async fn restore_settings(
    conn: &mut SqliteConnection,
    records: &[Setting],
    report: &mut ImportReport,
) -> DbResult<()> {
    let mut counts = CollectionReport::default();

    for setting in records {
        match settings::restore_in(&mut *conn, setting).await {
            Ok(()) => counts.imported += 1,
            Err(e) if e.is_record_level() => {
                warn!(key = %setting.key, error = %e, "Skipping setting during import");
                counts.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    report.collections.insert("settings".to_string(), counts);
    Ok(())
}

async fn clear_if<T: Record>(conn: &mut SqliteConnection, present: bool) -> DbResult<()> {
    if present {
        let removed = store::clear::<T>(conn).await?;
        info!(collection = T::COLLECTION, removed, "Collection cleared for import");
    }
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct BackupRepository {
    pool: SqlitePool,
}

impl BackupRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BackupRepository { pool }
    }

    /// Reads every collection inside one transaction.
    pub async fn export(&self) -> DbResult<BackupSnapshot> {
        let mut tx = self.pool.begin().await?;

        let data = BackupData {
            products: Some(store::list(&mut tx).await?),
            categories: Some(store::list(&mut tx).await?),
            customers: Some(store::list(&mut tx).await?),
            suppliers: Some(store::list(&mut tx).await?),
            users: Some(store::list(&mut tx).await?),
            sales: Some(store::list(&mut tx).await?),
            sale_items: Some(store::list(&mut tx).await?),
            purchases: Some(store::list(&mut tx).await?),
            purchase_items: Some(store::list(&mut tx).await?),
            transactions: Some(store::list(&mut tx).await?),
            inventory: Some(store::list(&mut tx).await?),
            inventory_movements: Some(store::list(&mut tx).await?),
            settings: Some(settings::all_in(&mut tx).await?),
        };

        tx.commit().await?;

        let snapshot = BackupSnapshot {
            version: SCHEMA_VERSION,
            export_date: Utc::now(),
            data,
        };

        info!(
            products = snapshot.data.products.as_ref().map_or(0, Vec::len),
            sales = snapshot.data.sales.as_ref().map_or(0, Vec::len),
            "Store exported"
        );
        Ok(snapshot)
    }

    pub async fn export_json(&self) -> DbResult<String> {
        to_json(&self.export().await?)
    }

    /// Replaces every collection present in the snapshot.
    ///
    /// ## Errors
    /// - `IncompatibleVersion` when the snapshot is newer than this store
    /// - any store-level failure; the import is then rolled back entirely
    pub async fn import(&self, snapshot: &BackupSnapshot) -> DbResult<ImportReport> {
        if snapshot.version > SCHEMA_VERSION {
            warn!(
                found = snapshot.version,
                supported = SCHEMA_VERSION,
                "Rejected backup from a newer schema"
            );
            return Err(DbError::IncompatibleVersion {
                found: snapshot.version,
                supported: SCHEMA_VERSION,
            });
        }

        let data = &snapshot.data;
        let mut tx = self.pool.begin().await?;
        let conn: &mut SqliteConnection = &mut tx;

        // items before headers
        clear_if::<SaleItem>(conn, data.sale_items.is_some()).await?;
        clear_if::<PurchaseItem>(conn, data.purchase_items.is_some()).await?;
        clear_if::<Sale>(conn, data.sales.is_some()).await?;
        clear_if::<Purchase>(conn, data.purchases.is_some()).await?;
        clear_if::<Product>(conn, data.products.is_some()).await?;
        clear_if::<Category>(conn, data.categories.is_some()).await?;
        clear_if::<InventoryEntry>(conn, data.inventory.is_some()).await?;
        clear_if::<Customer>(conn, data.customers.is_some()).await?;
        clear_if::<Supplier>(conn, data.suppliers.is_some()).await?;
        clear_if::<User>(conn, data.users.is_some()).await?;
        clear_if::<AccountingTransaction>(conn, data.transactions.is_some()).await?;
        clear_if::<InventoryMovement>(conn, data.inventory_movements.is_some()).await?;
        if data.settings.is_some() {
            settings::clear_in(conn).await?;
        }

        let mut report = ImportReport::default();

        // headers before items
        if let Some(records) = &data.categories {
            restore_records(conn, records, accept, &mut report).await?;
        }
        if let Some(records) = &data.products {
            restore_records(conn, records, check_product, &mut report).await?;
        }
        if let Some(records) = &data.inventory {
            restore_records(conn, records, accept, &mut report).await?;
        }
        if let Some(records) = &data.customers {
            restore_records(conn, records, accept, &mut report).await?;
        }
        if let Some(records) = &data.suppliers {
            restore_records(conn, records, accept, &mut report).await?;
        }
        if let Some(records) = &data.users {
            restore_records(conn, records, accept, &mut report).await?;
        }
        if let Some(records) = &data.sales {
            restore_records(conn, records, accept, &mut report).await?;
        }
        if let Some(records) = &data.sale_items {
            restore_records(conn, records, accept, &mut report).await?;
        }
        if let Some(records) = &data.purchases {
            restore_records(conn, records, accept, &mut report).await?;
        }
        if let Some(records) = &data.purchase_items {
            restore_records(conn, records, accept, &mut report).await?;
        }
        if let Some(records) = &data.transactions {
            restore_records(conn, records, accept, &mut report).await?;
        }
        if let Some(records) = &data.inventory_movements {
            restore_records(conn, records, accept, &mut report).await?;
        }
        if let Some(records) = &data.settings {
            restore_settings(conn, records, &mut report).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            version = snapshot.version,
            imported = report.total_imported(),
            skipped = report.total_skipped(),
            "Store imported"
        );
        Ok(report)
    }

    pub async fn import_json(&self, json: &str) -> DbResult<ImportReport> {
        self.import(&from_json(json)?).await
    }
}
