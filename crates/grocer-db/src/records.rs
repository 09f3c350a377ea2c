//! Table mappings for every record collection.
//!
//! Column lists must follow the field order of `bind_columns`; both follow
//! the migration's column order.

use chrono::{DateTime, Utc};

use grocer_core::{
    AccountingTransaction, Category, Customer, InventoryEntry, InventoryMovement, Product,
    Purchase, PurchaseItem, Sale, SaleItem, Supplier, User,
};

use crate::error::DbError;
use crate::store::{DeleteGuard, Record, SqliteQuery};

/// `id`, `set_id` and `touch` for records with the usual `id`/`updated_at`
/// fields.
macro_rules! identity {
    () => {
        fn id(&self) -> i64 {
            self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = id;
        }

        fn touch(&mut self, now: DateTime<Utc>) {
            self.updated_at = now;
        }
    };
}

// =============================================================================
// Catalog
// =============================================================================

impl Record for Product {
    const COLLECTION: &'static str = "products";
    const TABLE: &'static str = "products";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "barcode",
        "code",
        "description",
        "sale_price_cents",
        "cost_price_cents",
        "stock",
        "min_stock",
        "unit",
        "category_id",
        "tax_rate_bps",
        "image",
        "created_at",
        "updated_at",
    ];
    const INDEXES: &'static [(&'static str, &'static str)] = &[
        ("categoryId", "category_id"),
        ("barcode", "barcode"),
        ("name", "name"),
        ("stock", "stock"),
    ];

    identity!();

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.name.clone())
            .bind(self.barcode.clone())
            .bind(self.code.clone())
            .bind(self.description.clone())
            .bind(self.sale_price_cents)
            .bind(self.cost_price_cents)
            .bind(self.stock)
            .bind(self.min_stock)
            .bind(self.unit.clone())
            .bind(self.category_id)
            .bind(self.tax_rate_bps)
            .bind(self.image.clone())
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

fn category_in_use(id: i64, product_count: i64) -> DbError {
    DbError::CategoryInUse { id, product_count }
}

impl Record for Category {
    const COLLECTION: &'static str = "categories";
    const TABLE: &'static str = "categories";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "icon",
        "color",
        "description",
        "created_at",
        "updated_at",
    ];
    const INDEXES: &'static [(&'static str, &'static str)] = &[("name", "name")];

    identity!();

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.name.clone())
            .bind(self.icon.clone())
            .bind(self.color.clone())
            .bind(self.description.clone())
            .bind(self.created_at)
            .bind(self.updated_at)
    }

    fn delete_guard() -> Option<DeleteGuard> {
        Some(DeleteGuard {
            table: Product::TABLE,
            column: "category_id",
            error: category_in_use,
        })
    }
}

impl Record for InventoryEntry {
    const COLLECTION: &'static str = "inventory";
    const TABLE: &'static str = "inventory_entries";
    const COLUMNS: &'static [&'static str] = &[
        "product_id",
        "warehouse",
        "quantity",
        "created_at",
        "updated_at",
    ];
    const INDEXES: &'static [(&'static str, &'static str)] =
        &[("productId", "product_id"), ("warehouse", "warehouse")];

    identity!();

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.product_id)
            .bind(self.warehouse.clone())
            .bind(self.quantity)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

// =============================================================================
// Parties
// =============================================================================

impl Record for Customer {
    const COLLECTION: &'static str = "customers";
    const TABLE: &'static str = "customers";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "phone",
        "email",
        "address",
        "balance_cents",
        "notes",
        "created_at",
        "updated_at",
    ];
    const INDEXES: &'static [(&'static str, &'static str)] =
        &[("phone", "phone"), ("name", "name")];

    identity!();

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.name.clone())
            .bind(self.phone.clone())
            .bind(self.email.clone())
            .bind(self.address.clone())
            .bind(self.balance_cents)
            .bind(self.notes.clone())
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl Record for Supplier {
    const COLLECTION: &'static str = "suppliers";
    const TABLE: &'static str = "suppliers";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "contact_person",
        "phone",
        "email",
        "address",
        "balance_cents",
        "notes",
        "created_at",
        "updated_at",
    ];
    const INDEXES: &'static [(&'static str, &'static str)] =
        &[("name", "name"), ("phone", "phone")];

    identity!();

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.name.clone())
            .bind(self.contact_person.clone())
            .bind(self.phone.clone())
            .bind(self.email.clone())
            .bind(self.address.clone())
            .bind(self.balance_cents)
            .bind(self.notes.clone())
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl Record for User {
    const COLLECTION: &'static str = "users";
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "username",
        "display_name",
        "role",
        "created_at",
        "updated_at",
    ];
    const INDEXES: &'static [(&'static str, &'static str)] =
        &[("username", "username"), ("role", "role")];

    identity!();

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.username.clone())
            .bind(self.display_name.clone())
            .bind(self.role)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

// =============================================================================
// Invoices
// =============================================================================

impl Record for Sale {
    const COLLECTION: &'static str = "sales";
    const TABLE: &'static str = "sales";
    const COLUMNS: &'static [&'static str] = &[
        "invoice_number",
        "date",
        "subtotal_cents",
        "tax_cents",
        "total_cents",
        "payment_method",
        "customer_id",
        "notes",
        "created_at",
        "updated_at",
    ];
    const INDEXES: &'static [(&'static str, &'static str)] = &[
        ("customerId", "customer_id"),
        ("date", "date"),
        ("invoiceNumber", "invoice_number"),
    ];

    identity!();

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.invoice_number.clone())
            .bind(self.date)
            .bind(self.subtotal_cents)
            .bind(self.tax_cents)
            .bind(self.total_cents)
            .bind(self.payment_method)
            .bind(self.customer_id)
            .bind(self.notes.clone())
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl Record for SaleItem {
    const COLLECTION: &'static str = "saleItems";
    const TABLE: &'static str = "sale_items";
    const COLUMNS: &'static [&'static str] = &[
        "sale_id",
        "product_id",
        "product_name",
        "quantity",
        "unit_price_cents",
        "line_total_cents",
        "created_at",
        "updated_at",
    ];
    const INDEXES: &'static [(&'static str, &'static str)] =
        &[("saleId", "sale_id"), ("productId", "product_id")];

    identity!();

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.sale_id)
            .bind(self.product_id)
            .bind(self.product_name.clone())
            .bind(self.quantity)
            .bind(self.unit_price_cents)
            .bind(self.line_total_cents)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl Record for Purchase {
    const COLLECTION: &'static str = "purchases";
    const TABLE: &'static str = "purchases";
    const COLUMNS: &'static [&'static str] = &[
        "invoice_number",
        "date",
        "subtotal_cents",
        "tax_cents",
        "total_cents",
        "payment_method",
        "supplier_id",
        "notes",
        "created_at",
        "updated_at",
    ];
    const INDEXES: &'static [(&'static str, &'static str)] = &[
        ("supplierId", "supplier_id"),
        ("date", "date"),
        ("invoiceNumber", "invoice_number"),
    ];

    identity!();

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.invoice_number.clone())
            .bind(self.date)
            .bind(self.subtotal_cents)
            .bind(self.tax_cents)
            .bind(self.total_cents)
            .bind(self.payment_method)
            .bind(self.supplier_id)
            .bind(self.notes.clone())
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl Record for PurchaseItem {
    const COLLECTION: &'static str = "purchaseItems";
    const TABLE: &'static str = "purchase_items";
    const COLUMNS: &'static [&'static str] = &[
        "purchase_id",
        "product_id",
        "product_name",
        "quantity",
        "unit_cost_cents",
        "line_total_cents",
        "created_at",
        "updated_at",
    ];
    const INDEXES: &'static [(&'static str, &'static str)] =
        &[("purchaseId", "purchase_id"), ("productId", "product_id")];

    identity!();

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.purchase_id)
            .bind(self.product_id)
            .bind(self.product_name.clone())
            .bind(self.quantity)
            .bind(self.unit_cost_cents)
            .bind(self.line_total_cents)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

// =============================================================================
// Ledgers
// =============================================================================

impl Record for AccountingTransaction {
    const COLLECTION: &'static str = "transactions";
    const TABLE: &'static str = "accounting_transactions";
    const COLUMNS: &'static [&'static str] = &[
        "date",
        "entry_type",
        "reference_id",
        "description",
        "amount_cents",
        "account_code",
        "debit_credit",
        "created_at",
        "updated_at",
    ];
    const INDEXES: &'static [(&'static str, &'static str)] = &[
        ("date", "date"),
        ("type", "entry_type"),
        ("referenceId", "reference_id"),
        ("accountCode", "account_code"),
    ];
    const APPEND_ONLY: bool = true;

    identity!();

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.date)
            .bind(self.entry_type)
            .bind(self.reference_id)
            .bind(self.description.clone())
            .bind(self.amount_cents)
            .bind(self.account_code.clone())
            .bind(self.debit_credit)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl Record for InventoryMovement {
    const COLLECTION: &'static str = "inventoryMovements";
    const TABLE: &'static str = "inventory_movements";
    const COLUMNS: &'static [&'static str] = &[
        "product_id",
        "date",
        "movement_type",
        "quantity_delta",
        "old_stock",
        "new_stock",
        "reference",
        "created_at",
        "updated_at",
    ];
    const INDEXES: &'static [(&'static str, &'static str)] = &[
        ("productId", "product_id"),
        ("date", "date"),
        ("type", "movement_type"),
    ];
    const APPEND_ONLY: bool = true;

    identity!();

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.product_id)
            .bind(self.date)
            .bind(self.movement_type)
            .bind(self.quantity_delta)
            .bind(self.old_stock)
            .bind(self.new_stock)
            .bind(self.reference.clone())
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}
