//! # Invoices
//!
//! Input shapes for the sale and purchase workflows: a header describing the
//! invoice and the line items being sold or received.
//!
//! ## From Cart to Records
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   LineItem::from_product(&cola, 3)     (price + name frozen here)      │
//! │            │                                                            │
//! │            ▼                                                            │
//! │   SaleHeader::from_lines("INV-...", &lines, tax_rate)                   │
//! │            │   subtotal = Σ unit_price × quantity                       │
//! │            │   tax      = subtotal × rate                               │
//! │            │   total    = subtotal + tax                                │
//! │            ▼                                                            │
//! │   grocer-db checkout ──► Sale + SaleItem rows (one transaction)        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Header totals are trusted as given: the UI may apply discounts or round
//! differently, so only line totals are recomputed by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PaymentMethod, Product, Purchase, PurchaseItem, Sale, SaleItem, TaxRate};
use crate::validation::{validate_amount_cents, validate_line_quantity};

pub const SALE_INVOICE_PREFIX: &str = "INV";
pub const PURCHASE_INVOICE_PREFIX: &str = "PUR";

/// Generates an invoice number such as `INV-20261016-101500123`.
///
/// Millisecond resolution; two invoices generated in the same millisecond
/// collide and the second is rejected by the unique index.
pub fn generate_invoice_number(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}", prefix, at.format("%Y%m%d-%H%M%S%3f"))
}

// =============================================================================
// Line Items
// =============================================================================

/// One product line of a sale or purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: i64,
    /// Name snapshot stored on the item record.
    pub product_name: Option<String>,
    pub quantity: i64,
    /// Sale price for sales, unit cost for purchases.
    pub unit_price_cents: i64,
}

impl LineItem {
    pub fn new(product_id: i64, quantity: i64, unit_price_cents: i64) -> Self {
        LineItem {
            product_id,
            product_name: None,
            quantity,
            unit_price_cents,
        }
    }

    /// Sale line at the product's current price.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        LineItem {
            product_id: product.id,
            product_name: Some(product.name.clone()),
            quantity,
            unit_price_cents: product.sale_price_cents,
        }
    }

    /// Purchase line at the product's cost, falling back to its sale price.
    pub fn purchase_of(product: &Product, quantity: i64) -> Self {
        LineItem {
            product_id: product.id,
            product_name: Some(product.name.clone()),
            quantity,
            unit_price_cents: product.valuation_price().cents(),
        }
    }

    /// `unit_price × quantity`, saturating. Lines that passed
    /// [`validate_lines`] never saturate.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }

    pub fn checked_line_total(&self) -> CoreResult<Money> {
        Money::from_cents(self.unit_price_cents)
            .checked_multiply_quantity(self.quantity)
            .ok_or_else(|| overflow("line total"))
    }

    pub fn to_sale_item(&self, sale_id: i64, now: DateTime<Utc>) -> SaleItem {
        SaleItem {
            id: 0,
            sale_id,
            product_id: self.product_id,
            product_name: self.product_name.clone(),
            quantity: self.quantity,
            unit_price_cents: self.unit_price_cents,
            line_total_cents: self.line_total().cents(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_purchase_item(&self, purchase_id: i64, now: DateTime<Utc>) -> PurchaseItem {
        PurchaseItem {
            id: 0,
            purchase_id,
            product_id: self.product_id,
            product_name: self.product_name.clone(),
            quantity: self.quantity,
            unit_cost_cents: self.unit_price_cents,
            line_total_cents: self.line_total().cents(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Checks a batch of lines before anything is written.
///
/// Fails with [`CoreError::EmptyCart`] when there are no lines and with a
/// validation error for a non-positive or absurd quantity, a negative
/// price, or line totals too large to add up.
pub fn validate_lines(lines: &[LineItem]) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let mut subtotal = Money::zero();
    for line in lines {
        validate_line_quantity(line.quantity)?;
        validate_amount_cents("unit price", line.unit_price_cents)?;
        subtotal = subtotal
            .checked_add(line.checked_line_total()?)
            .ok_or_else(|| overflow("subtotal"))?;
    }

    Ok(())
}

fn overflow(field: &str) -> CoreError {
    ValidationError::Overflow {
        field: field.to_string(),
    }
    .into()
}

// =============================================================================
// Totals
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl InvoiceTotals {
    /// Sums line totals and applies one tax rate to the subtotal.
    ///
    /// ```rust
    /// use grocer_core::invoice::{InvoiceTotals, LineItem};
    /// use grocer_core::types::TaxRate;
    ///
    /// let lines = vec![LineItem::new(1, 3, 500), LineItem::new(2, 1, 800)];
    /// let totals = InvoiceTotals::from_lines(&lines, TaxRate::from_bps(500));
    /// assert_eq!(totals.subtotal_cents, 2300);
    /// assert_eq!(totals.tax_cents, 115);
    /// assert_eq!(totals.total_cents, 2415);
    /// ```
    pub fn from_lines(lines: &[LineItem], rate: TaxRate) -> Self {
        let subtotal: Money = lines.iter().map(LineItem::line_total).sum();
        let tax = subtotal.calculate_tax(rate);
        InvoiceTotals {
            subtotal_cents: subtotal.cents(),
            tax_cents: tax.cents(),
            total_cents: (subtotal + tax).cents(),
        }
    }
}

// =============================================================================
// Headers
// =============================================================================

/// Everything the caller decides about a sale before it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleHeader {
    pub invoice_number: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub customer_id: Option<i64>,
    pub notes: Option<String>,
}

impl SaleHeader {
    /// A cash sale dated now with zero totals.
    pub fn new(invoice_number: impl Into<String>) -> Self {
        SaleHeader {
            invoice_number: invoice_number.into(),
            date: Utc::now(),
            subtotal_cents: 0,
            tax_cents: 0,
            total_cents: 0,
            payment_method: PaymentMethod::Cash,
            customer_id: None,
            notes: None,
        }
    }

    /// A cash sale with totals computed from `lines`.
    pub fn from_lines(invoice_number: impl Into<String>, lines: &[LineItem], rate: TaxRate) -> Self {
        SaleHeader::new(invoice_number).with_totals(InvoiceTotals::from_lines(lines, rate))
    }

    pub fn with_totals(mut self, totals: InvoiceTotals) -> Self {
        self.subtotal_cents = totals.subtotal_cents;
        self.tax_cents = totals.tax_cents;
        self.total_cents = totals.total_cents;
        self
    }

    pub fn with_customer(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_payment(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    pub fn to_record(&self, now: DateTime<Utc>) -> Sale {
        Sale {
            id: 0,
            invoice_number: self.invoice_number.clone(),
            date: self.date,
            subtotal_cents: self.subtotal_cents,
            tax_cents: self.tax_cents,
            total_cents: self.total_cents,
            payment_method: self.payment_method,
            customer_id: self.customer_id,
            notes: self.notes.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The purchase-side mirror of [`SaleHeader`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseHeader {
    pub invoice_number: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub supplier_id: Option<i64>,
    pub notes: Option<String>,
}

impl PurchaseHeader {
    pub fn new(invoice_number: impl Into<String>) -> Self {
        PurchaseHeader {
            invoice_number: invoice_number.into(),
            date: Utc::now(),
            subtotal_cents: 0,
            tax_cents: 0,
            total_cents: 0,
            payment_method: PaymentMethod::Cash,
            supplier_id: None,
            notes: None,
        }
    }

    pub fn from_lines(invoice_number: impl Into<String>, lines: &[LineItem], rate: TaxRate) -> Self {
        PurchaseHeader::new(invoice_number).with_totals(InvoiceTotals::from_lines(lines, rate))
    }

    pub fn with_totals(mut self, totals: InvoiceTotals) -> Self {
        self.subtotal_cents = totals.subtotal_cents;
        self.tax_cents = totals.tax_cents;
        self.total_cents = totals.total_cents;
        self
    }

    pub fn with_supplier(mut self, supplier_id: i64) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    pub fn with_payment(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    pub fn to_record(&self, now: DateTime<Utc>) -> Purchase {
        Purchase {
            id: 0,
            invoice_number: self.invoice_number.clone(),
            date: self.date,
            subtotal_cents: self.subtotal_cents,
            tax_cents: self.tax_cents,
            total_cents: self.total_cents,
            payment_method: self.payment_method,
            supplier_id: self.supplier_id,
            notes: self.notes.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}
