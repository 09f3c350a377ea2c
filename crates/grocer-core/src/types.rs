//! # Domain Types
//!
//! Every record persisted by the store, plus the small value types they use.
//!
//! ## Collections
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Record Collections                              │
//! │                                                                         │
//! │  Catalog            Parties             Invoices                        │
//! │  ──────────         ──────────          ───────────────────────         │
//! │  products           customers           sales ──owns──► saleItems       │
//! │  categories         suppliers           purchases ─owns─► purchaseItems │
//! │  inventory          users                                               │
//! │                                                                         │
//! │  Ledgers (append-only)                  Configuration                   │
//! │  ─────────────────────                  ─────────────                   │
//! │  transactions (accounting postings)     settings (key → scalar)        │
//! │  inventoryMovements (stock history)                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every record except [`Setting`] has an integer `id` assigned by the store
//! on creation. A record whose `id` is `0` has not been stored yet.
//!
//! ## Weak References
//! `category_id`, `customer_id`, `supplier_id`, `product_id` and
//! `reference_id` are plain identifiers: the store never checks that the
//! target exists and never cascades deletes through them. Lookups that miss
//! render through [`crate::references`]. The only owning links are
//! `SaleItem.sale_id` and `PurchaseItem.purchase_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 825 bps = 8.25%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage, as stored in the `taxRate`
    /// setting. Negative inputs clamp to zero.
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round().max(0.0) as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Enumerations
// =============================================================================

/// How a sale or purchase was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    /// On account: the amount is owed by the customer (or to the supplier).
    Credit,
    Transfer,
}

/// Why a product's stock changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// Stock leaves the shelf; quantity is subtracted.
    Sale,
    /// Stock arrives from a supplier; quantity is added.
    Purchase,
    /// Stock count correction; the signed delta is applied as given.
    #[default]
    Manual,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Sale => "sale",
            MovementType::Purchase => "purchase",
            MovementType::Manual => "manual",
        }
    }
}

/// Kind of business event behind an accounting posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Sale,
    Purchase,
    #[default]
    Other,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Sale => "sale",
            EntryType::Purchase => "purchase",
            EntryType::Other => "other",
        }
    }
}

/// Debit/credit discriminator of a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum EntrySide {
    #[default]
    Debit,
    Credit,
}

impl EntrySide {
    /// The other side of the books; used for offsetting entries.
    pub fn opposite(&self) -> Self {
        match self {
            EntrySide::Debit => EntrySide::Credit,
            EntrySide::Credit => EntrySide::Debit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Cashier,
}

// =============================================================================
// Catalog
// =============================================================================

/// A product on the shelf.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,

    /// Display name shown to cashier and on invoices.
    pub name: String,

    /// Barcode (EAN-13, UPC-A, ...). Not unique: two pack sizes may share one.
    pub barcode: Option<String>,

    /// Optional shop-internal code.
    pub code: Option<String>,

    pub description: Option<String>,

    /// Selling price in minor units.
    pub sale_price_cents: i64,

    /// Purchase cost in minor units; `None` when unknown.
    pub cost_price_cents: Option<i64>,

    /// Units on hand. Never negative after a committed operation.
    pub stock: i64,

    /// Reorder threshold. `0` defers to the `lowStockThreshold` setting.
    pub min_stock: i64,

    /// Unit label ("piece", "kg", "box").
    pub unit: String,

    /// Weak reference to [`Category`].
    pub category_id: Option<i64>,

    pub tax_rate_bps: u32,

    /// Opaque image reference owned by the UI.
    pub image: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates an unsaved product with zero stock.
    pub fn new(name: impl Into<String>, sale_price_cents: i64) -> Self {
        let now = Utc::now();
        Product {
            name: name.into(),
            sale_price_cents,
            unit: "piece".to_string(),
            created_at: now,
            updated_at: now,
            ..Default::default()
        }
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_cost(mut self, cost_price_cents: i64) -> Self {
        self.cost_price_cents = Some(cost_price_cents);
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_min_stock(mut self, min_stock: i64) -> Self {
        self.min_stock = min_stock;
        self
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Unit value used for inventory valuation: cost price, or the sale
    /// price when the cost is unknown.
    pub fn valuation_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents.unwrap_or(self.sale_price_cents))
    }

    /// `stock × valuation_price`.
    pub fn stock_value(&self) -> Money {
        self.valuation_price().multiply_quantity(self.stock)
    }

    /// Threshold this product is compared against for low-stock alerts.
    pub fn reorder_threshold(&self, default_threshold: i64) -> i64 {
        if self.min_stock > 0 {
            self.min_stock
        } else {
            default_threshold
        }
    }

    pub fn is_low_stock(&self, default_threshold: i64) -> bool {
        self.stock <= self.reorder_threshold(default_threshold)
    }
}

/// A product category. Names are unique.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Category {
            name: name.into(),
            created_at: now,
            updated_at: now,
            ..Default::default()
        }
    }

    pub fn with_style(mut self, icon: impl Into<String>, color: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self.color = Some(color.into());
        self
    }
}

/// Per-warehouse stock bookkeeping. One entry per product.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    pub id: i64,
    /// Weak reference to [`Product`]; unique across entries.
    pub product_id: i64,
    pub warehouse: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Parties
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Receivable: positive when the customer owes the shop.
    pub balance_cents: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Customer {
            name: name.into(),
            created_at: now,
            updated_at: now,
            ..Default::default()
        }
    }

    pub fn with_balance(mut self, balance_cents: i64) -> Self {
        self.balance_cents = balance_cents;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Payable: positive when the shop owes the supplier.
    pub balance_cents: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Supplier {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Supplier {
            name: name.into(),
            created_at: now,
            updated_at: now,
            ..Default::default()
        }
    }
}

/// A store operator. Identity only; the store enforces no permissions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    /// Unique login name.
    pub username: String,
    pub display_name: String,
    pub role: UserRole,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sales
// =============================================================================

/// A sale invoice header.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: i64,
    /// Unique across all sales.
    pub invoice_number: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    /// Weak reference to [`Customer`]; `None` for walk-in sales.
    pub customer_id: Option<i64>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line of a sale. Owned by its [`Sale`].
///
/// The product name is frozen at the time of sale so the invoice still
/// reads correctly after the product is renamed or deleted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    /// Weak reference to [`Product`].
    pub product_id: i64,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// `unit_price_cents × quantity`.
    pub line_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Purchases
// =============================================================================

/// A purchase invoice header; the mirror of [`Sale`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: i64,
    /// Unique across all purchases.
    pub invoice_number: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    /// Weak reference to [`Supplier`].
    pub supplier_id: Option<i64>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A line of a purchase. Owned by its [`Purchase`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseItem {
    pub id: i64,
    pub purchase_id: i64,
    pub product_id: i64,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub line_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Ledgers
// =============================================================================

/// An accounting posting. Append-only: corrections are new entries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AccountingTransaction {
    pub id: i64,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Weak reference to the originating sale or purchase.
    pub reference_id: Option<i64>,
    pub description: String,
    /// Always non-negative; the side carries the direction.
    pub amount_cents: i64,
    pub account_code: String,
    pub debit_credit: EntrySide,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl AccountingTransaction {
    /// Creates an unsaved posting dated now.
    pub fn new(
        entry_type: EntryType,
        account_code: impl Into<String>,
        debit_credit: EntrySide,
        amount_cents: i64,
    ) -> Self {
        let now = Utc::now();
        AccountingTransaction {
            date: now,
            entry_type,
            account_code: account_code.into(),
            debit_credit,
            amount_cents,
            created_at: now,
            updated_at: now,
            ..Default::default()
        }
    }

    pub fn with_reference(mut self, reference_id: i64) -> Self {
        self.reference_id = Some(reference_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Business date of the posting; creation timestamps stay "now".
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }
}

/// One stock mutation. Append-only, exactly one per stock change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryMovement {
    pub id: i64,
    pub product_id: i64,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    /// Signed change applied to stock (negative for sales).
    pub quantity_delta: i64,
    pub old_stock: i64,
    pub new_stock: i64,
    /// Human-readable origin, e.g. "Sale INV-20261016-101500123".
    pub reference: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Settings
// =============================================================================

/// A configuration entry: `key` → free-form scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    pub key: String,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub value: serde_json::Value,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(8.25).bps(), 825);
        assert_eq!(TaxRate::from_percentage(-3.0).bps(), 0);
        assert!((TaxRate::from_bps(500).percentage() - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_valuation_falls_back_to_sale_price() {
        let with_cost = Product::new("Cola 330ml", 500).with_cost(350).with_stock(10);
        assert_eq!(with_cost.stock_value().cents(), 3500);

        let without_cost = Product::new("Cola 330ml", 500).with_stock(10);
        assert_eq!(without_cost.stock_value().cents(), 5000);
    }

    #[test]
    fn test_low_stock_threshold() {
        let product = Product::new("Chocolate", 800).with_stock(5);
        // min_stock 0 defers to the default threshold
        assert!(product.is_low_stock(5));
        assert!(!product.is_low_stock(4));

        let product = product.with_min_stock(10);
        assert!(product.is_low_stock(0));
        assert_eq!(product.reorder_threshold(5), 10);
    }

    #[test]
    fn test_record_json_uses_camel_case() {
        let movement = InventoryMovement {
            movement_type: MovementType::Sale,
            quantity_delta: -3,
            ..Default::default()
        };
        let json = serde_json::to_value(&movement).unwrap();
        assert_eq!(json["type"], "sale");
        assert_eq!(json["quantityDelta"], -3);
        assert!(json.get("oldStock").is_some());

        let entry = AccountingTransaction::new(EntryType::Sale, "4010", EntrySide::Credit, 1500);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["debitCredit"], "credit");
        assert_eq!(json["accountCode"], "4010");
    }

    #[test]
    fn test_entry_side_opposite() {
        assert_eq!(EntrySide::Debit.opposite(), EntrySide::Credit);
        assert_eq!(EntrySide::Credit.opposite(), EntrySide::Debit);
    }
}
