//! # Catalog Helpers
//!
//! Product search, weak-reference resolution and the invoice detail view.
//!
//! ## Weak References
//! ```text
//! Product.categoryId ──► Category     miss → "Uncategorized"
//! SaleItem.productId ──► Product      miss → name snapshot, else "Unknown product"
//! Sale.customerId    ──► Customer     miss → "Walk-in customer"
//! Purchase.supplierId ─► Supplier     miss → "Unknown supplier"
//! ```
//! None of these are foreign keys; a deleted target never breaks history.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use ts_rs::TS;

use grocer_core::references::{category_label, customer_label, product_label, supplier_label};
use grocer_core::validation::validate_search_query;
use grocer_core::{
    Category, CoreError, Customer, Product, PurchaseItem, Sale, SaleItem, Supplier,
};

use crate::error::{DbError, DbResult};
use crate::repository::settings::{self, StoreSettings};
use crate::store::{self, IndexValue, Record};

// =============================================================================
// Invoice Detail
// =============================================================================

/// One item of [`SaleDetail`] with its product name resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetailLine {
    pub item: SaleItem,
    pub product_name: String,
}

/// Everything an invoice printer needs for one sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    pub sale: Sale,
    pub customer_name: String,
    pub lines: Vec<SaleDetailLine>,
}

/// Counts of what [`CatalogRepository::seed_defaults`] inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub categories: usize,
    pub products: usize,
    pub settings: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        self.categories == 0 && self.products == 0 && self.settings == 0
    }
}

// (name, icon, color)
const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Beverages", "fas fa-wine-bottle", "#3498db"),
    ("Canned goods", "fas fa-can-food", "#e74c3c"),
    ("Nuts", "fas fa-seedling", "#f39c12"),
    ("Sweets", "fas fa-candy", "#9b59b6"),
    ("Ice cream", "fas fa-ice-cream", "#1abc9c"),
    ("Vegetables", "fas fa-carrot", "#27ae60"),
    ("Fruits", "fas fa-apple-alt", "#2ecc71"),
    ("Meat", "fas fa-drumstick-bite", "#c0392b"),
    ("Dairy", "fas fa-cheese", "#f1c40f"),
    ("Cleaning", "fas fa-pump-soap", "#7f8c8d"),
];

// (name, barcode, sale, cost, stock, min stock, category)
const SAMPLE_PRODUCTS: &[(&str, &str, i64, i64, i64, i64, &str)] = &[
    ("Coca-Cola 330ml", "5449000000996", 500, 350, 100, 10, "Beverages"),
    ("Pepsi 330ml", "5449000131880", 500, 350, 80, 10, "Beverages"),
    ("Cadbury chocolate", "7622210645142", 800, 600, 50, 5, "Sweets"),
];

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Case-insensitive substring match on name or code, or an exact
    /// barcode match. A blank term returns every product.
    ///
    /// Matching happens here rather than in SQL: SQLite's `lower()` only
    /// folds ASCII, so "ÉCLAIR" would never match "éclair".
    pub async fn search_products(&self, term: &str) -> DbResult<Vec<Product>> {
        let term = validate_search_query(term).map_err(CoreError::from)?;
        let mut conn = self.pool.acquire().await?;
        let products: Vec<Product> = store::list(&mut conn).await?;
        if term.is_empty() {
            return Ok(products);
        }

        let needle = term.to_lowercase();
        let folds = |text: &str| text.to_lowercase().contains(&needle);

        let mut hits: Vec<Product> = products
            .into_iter()
            .filter(|p| {
                folds(&p.name)
                    || p.code.as_deref().is_some_and(folds)
                    || p.barcode.as_deref() == Some(term.as_str())
            })
            .collect();
        hits.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(term = %term, count = hits.len(), "Product search");
        Ok(hits)
    }

    /// `None` lists uncategorized products.
    pub async fn products_by_category(&self, category_id: Option<i64>) -> DbResult<Vec<Product>> {
        let mut conn = self.pool.acquire().await?;
        store::list_by(&mut conn, "categoryId", IndexValue::from(category_id)).await
    }

    async fn lookup<T: Record>(&self, id: Option<i64>) -> DbResult<Option<T>> {
        match id {
            Some(id) if id > 0 => {
                let mut conn = self.pool.acquire().await?;
                store::get(&mut conn, id).await
            }
            _ => Ok(None),
        }
    }

    pub async fn category_name(&self, category_id: Option<i64>) -> DbResult<String> {
        let category: Option<Category> = self.lookup(category_id).await?;
        Ok(category_label(category.as_ref()))
    }

    pub async fn product_name(&self, product_id: i64) -> DbResult<String> {
        let product: Option<Product> = self.lookup(Some(product_id)).await?;
        Ok(product_label(product.as_ref()))
    }

    pub async fn customer_name(&self, customer_id: Option<i64>) -> DbResult<String> {
        let customer: Option<Customer> = self.lookup(customer_id).await?;
        Ok(customer_label(customer.as_ref()))
    }

    pub async fn supplier_name(&self, supplier_id: Option<i64>) -> DbResult<String> {
        let supplier: Option<Supplier> = self.lookup(supplier_id).await?;
        Ok(supplier_label(supplier.as_ref()))
    }

    pub async fn items_for_sale(&self, sale_id: i64) -> DbResult<Vec<SaleItem>> {
        let mut conn = self.pool.acquire().await?;
        store::list_by(&mut conn, "saleId", IndexValue::Int(sale_id)).await
    }

    pub async fn items_for_purchase(&self, purchase_id: i64) -> DbResult<Vec<PurchaseItem>> {
        let mut conn = self.pool.acquire().await?;
        store::list_by(&mut conn, "purchaseId", IndexValue::Int(purchase_id)).await
    }

    /// Header, items and resolved names of one sale.
    ///
    /// Item names prefer the snapshot taken at sale time, so renaming or
    /// deleting a product later does not rewrite printed history.
    pub async fn sale_detail(&self, sale_id: i64) -> DbResult<SaleDetail> {
        let sale: Sale = self
            .lookup(Some(sale_id))
            .await?
            .ok_or_else(|| DbError::not_found(Sale::COLLECTION, sale_id))?;

        let customer_name = self.customer_name(sale.customer_id).await?;

        let mut lines = Vec::new();
        for item in self.items_for_sale(sale_id).await? {
            let product_name = match &item.product_name {
                Some(name) => name.clone(),
                None => self.product_name(item.product_id).await?,
            };
            lines.push(SaleDetailLine { item, product_name });
        }

        Ok(SaleDetail {
            sale,
            customer_name,
            lines,
        })
    }

    /// Inserts the default categories, sample products and settings when
    /// the catalog is empty. Does nothing otherwise.
    pub async fn seed_defaults(&self) -> DbResult<SeedReport> {
        let mut tx = self.pool.begin().await?;
        let mut report = SeedReport::default();

        let existing =
            store::count::<Category>(&mut tx).await? + store::count::<Product>(&mut tx).await?;
        if existing > 0 {
            debug!(existing, "Catalog not empty, skipping seed");
            return Ok(report);
        }

        let mut category_ids = Vec::with_capacity(DEFAULT_CATEGORIES.len());
        for (name, icon, color) in DEFAULT_CATEGORIES {
            let category = Category::new(*name).with_style(*icon, *color);
            let id = store::insert(&mut tx, &category).await?;
            category_ids.push((*name, id));
            report.categories += 1;
        }

        for (name, barcode, sale, cost, stock, min_stock, category) in SAMPLE_PRODUCTS {
            let mut product = Product::new(*name, *sale)
                .with_barcode(*barcode)
                .with_cost(*cost)
                .with_stock(*stock)
                .with_min_stock(*min_stock);
            if let Some((_, id)) = category_ids.iter().find(|(n, _)| n == category) {
                product = product.with_category(*id);
            }
            store::insert(&mut tx, &product).await?;
            report.products += 1;
        }

        for (key, value) in StoreSettings::default().entries() {
            if settings::insert_missing_in(&mut tx, key, &value).await? {
                report.settings += 1;
            }
        }

        tx.commit().await?;

        info!(
            categories = report.categories,
            products = report.products,
            settings = report.settings,
            "Seeded default catalog"
        );
        Ok(report)
    }
}
