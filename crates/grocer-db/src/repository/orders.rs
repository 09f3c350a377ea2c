//! # Sale/Purchase Orchestrator
//!
//! The multi-collection workflows: one invoice touches the header, its
//! items, every product's stock, the movement history and the accounting
//! ledger.
//!
//! ## record_sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_lines        EmptyCart / bad quantity → nothing written      │
//! │  BEGIN                                                                  │
//! │    INSERT sales                      (invoice number UNIQUE)           │
//! │    for each line:                                                       │
//! │      INSERT sale_items                                                  │
//! │      adjust_stock_in(product, qty, Sale, "Sale INV-...")               │
//! │    INSERT accounting_transactions    (credit 4010, header total)       │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any step fails → `?` returns the error unchanged and the dropped      │
//! │  transaction rolls back header, items, stock and movements together.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `record_purchase` mirrors it: stock goes up and 5010 is debited.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use grocer_core::invoice::validate_lines;
use grocer_core::ledger;
use grocer_core::validation::validate_invoice_number;
use grocer_core::{LineItem, MovementType, Product, PurchaseHeader, SaleHeader};

use crate::error::{DbError, DbResult};
use crate::repository::accounting::post_in;
use crate::repository::inventory::adjust_stock_in;
use crate::store;

/// Fills a missing name snapshot from the product row.
async fn with_name_snapshot(conn: &mut SqliteConnection, line: &LineItem) -> DbResult<LineItem> {
    if line.product_name.is_some() || line.product_id <= 0 {
        return Ok(line.clone());
    }

    let product: Option<Product> = store::get(&mut *conn, line.product_id).await?;
    let mut line = line.clone();
    line.product_name = product.map(|p| p.name);
    Ok(line)
}

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Records a sale atomically and returns the new sale's id.
    ///
    /// ## Errors
    /// - `EmptyCart` when `lines` is empty
    /// - `Validation` for a non-positive quantity, a line total too large
    ///   for `i64`, or an empty invoice number
    /// - `ProductNotFound` / `InsufficientStock` from the inventory ledger
    /// - `ConstraintViolation` for a duplicate invoice number
    ///
    /// On any error nothing of the sale remains in the store; the error is
    /// logged at `warn` and returned unchanged.
    pub async fn record_sale(&self, header: &SaleHeader, lines: &[LineItem]) -> DbResult<i64> {
        self.write_sale(header, lines).await.inspect_err(|e| {
            warn!(invoice = %header.invoice_number, error = %e, "Sale rejected");
        })
    }

    /// Records a purchase atomically and returns the new purchase's id.
    pub async fn record_purchase(
        &self,
        header: &PurchaseHeader,
        lines: &[LineItem],
    ) -> DbResult<i64> {
        self.write_purchase(header, lines).await.inspect_err(|e| {
            warn!(invoice = %header.invoice_number, error = %e, "Purchase rejected");
        })
    }

    async fn write_sale(&self, header: &SaleHeader, lines: &[LineItem]) -> DbResult<i64> {
        validate_lines(lines)?;
        validate_invoice_number(&header.invoice_number).map_err(grocer_core::CoreError::from)?;

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let sale_id = store::insert(&mut tx, &header.to_record(now)).await?;
        let reference = format!("Sale {}", header.invoice_number);

        for line in lines {
            let line = with_name_snapshot(&mut tx, line).await?;
            store::insert(&mut tx, &line.to_sale_item(sale_id, now)).await?;
            adjust_stock_in(
                &mut tx,
                line.product_id,
                line.quantity,
                MovementType::Sale,
                Some(&reference),
            )
            .await?;
        }

        post_in(
            &mut tx,
            &ledger::sale_posting(
                sale_id,
                &header.invoice_number,
                header.total_cents,
                header.date,
            ),
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id,
            invoice = %header.invoice_number,
            lines = lines.len(),
            total_cents = header.total_cents,
            "Sale recorded"
        );
        Ok(sale_id)
    }

    async fn write_purchase(&self, header: &PurchaseHeader, lines: &[LineItem]) -> DbResult<i64> {
        validate_lines(lines)?;
        validate_invoice_number(&header.invoice_number).map_err(grocer_core::CoreError::from)?;

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let purchase_id = store::insert(&mut tx, &header.to_record(now)).await?;
        let reference = format!("Purchase {}", header.invoice_number);

        for line in lines {
            let line = with_name_snapshot(&mut tx, line).await?;
            store::insert(&mut tx, &line.to_purchase_item(purchase_id, now)).await?;
            adjust_stock_in(
                &mut tx,
                line.product_id,
                line.quantity,
                MovementType::Purchase,
                Some(&reference),
            )
            .await?;
        }

        post_in(
            &mut tx,
            &ledger::purchase_posting(
                purchase_id,
                &header.invoice_number,
                header.total_cents,
                header.date,
            ),
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            purchase_id,
            invoice = %header.invoice_number,
            lines = lines.len(),
            total_cents = header.total_cents,
            "Purchase recorded"
        );
        Ok(purchase_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{stocked_product, test_db};
    use chrono::TimeZone;
    use grocer_core::error::ValidationError;
    use grocer_core::ledger::{COST_OF_GOODS_ACCOUNT, SALES_REVENUE_ACCOUNT};
    use grocer_core::{
        AccountingTransaction, CoreError, EntrySide, EntryType, InventoryMovement, Purchase,
        PurchaseItem, Sale, SaleItem, TaxRate,
    };

    #[tokio::test]
    async fn test_simple_sale() {
        let db = test_db().await;
        let mut product = Product::new("Cola 330ml", 500).with_cost(350).with_stock(100);
        product.id = db.products().create(&product).await.unwrap();

        let sold_at = Utc.with_ymd_and_hms(2025, 1, 5, 9, 0, 0).unwrap();
        let lines = vec![LineItem::from_product(&product, 3)];
        let header = SaleHeader::from_lines("INV-1", &lines, TaxRate::zero()).with_date(sold_at);

        let sale_id = db.orders().record_sale(&header, &lines).await.unwrap();

        let product = db.products().get(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 97);

        let items = db.catalog().items_for_sale(sale_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].line_total_cents, 1500);
        assert_eq!(items[0].product_name.as_deref(), Some("Cola 330ml"));

        let movements = db.inventory().movements_for(product.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].old_stock, 100);
        assert_eq!(movements[0].new_stock, 97);
        assert_eq!(movements[0].movement_type, MovementType::Sale);
        assert_eq!(movements[0].reference, "Sale INV-1");

        let postings = db
            .accounting()
            .entries_for_reference(EntryType::Sale, sale_id)
            .await
            .unwrap();
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].amount_cents, 1500);
        assert_eq!(postings[0].debit_credit, EntrySide::Credit);
        assert_eq!(postings[0].account_code, SALES_REVENUE_ACCOUNT);
        assert_eq!(postings[0].date, sold_at);
    }

    #[tokio::test]
    async fn test_overflowing_line_total_rejected() {
        let db = test_db().await;
        let id = stocked_product(&db, "Caviar", 10).await;

        let lines = vec![LineItem::new(id, 2, i64::MAX)];
        let err = db
            .orders()
            .record_sale(&SaleHeader::new("INV-OVF"), &lines)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Validation(ValidationError::Overflow { .. }))
        ));

        let err = db
            .orders()
            .record_purchase(&PurchaseHeader::new("PUR-OVF"), &lines)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        assert_eq!(db.products().get(id).await.unwrap().unwrap().stock, 10);
        assert_eq!(db.collection::<Sale>().count().await.unwrap(), 0);
        assert_eq!(db.collection::<Purchase>().count().await.unwrap(), 0);
        assert_eq!(db.collection::<InventoryMovement>().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sale_total_includes_tax() {
        let db = test_db().await;
        let id = stocked_product(&db, "Soap", 10).await;

        let lines = vec![LineItem::new(id, 2, 500)];
        let header = SaleHeader::from_lines("INV-TAX", &lines, TaxRate::from_bps(1500));
        assert_eq!(header.total_cents, 1150);

        db.orders().record_sale(&header, &lines).await.unwrap();
        let balance = db.accounting().account_balance(SALES_REVENUE_ACCOUNT).await.unwrap();
        assert_eq!(balance.cents(), -1150);
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_nothing() {
        let db = test_db().await;
        let id = stocked_product(&db, "Chocolate", 2).await;

        let lines = vec![LineItem::new(id, 5, 800)];
        let header = SaleHeader::from_lines("INV-2", &lines, TaxRate::zero());

        let err = db.orders().record_sale(&header, &lines).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InsufficientStock { .. })));

        assert_eq!(db.products().get(id).await.unwrap().unwrap().stock, 2);
        assert_eq!(db.collection::<Sale>().count().await.unwrap(), 0);
        assert_eq!(db.collection::<SaleItem>().count().await.unwrap(), 0);
        assert_eq!(db.collection::<InventoryMovement>().count().await.unwrap(), 0);
        assert_eq!(db.collection::<AccountingTransaction>().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_second_line_failure_rolls_back_first() {
        let db = test_db().await;
        let plenty = stocked_product(&db, "Rice", 50).await;
        let scarce = stocked_product(&db, "Saffron", 1).await;

        let lines = vec![LineItem::new(plenty, 10, 300), LineItem::new(scarce, 4, 2000)];
        let header = SaleHeader::from_lines("INV-3", &lines, TaxRate::zero());

        assert!(db.orders().record_sale(&header, &lines).await.is_err());

        assert_eq!(db.products().get(plenty).await.unwrap().unwrap().stock, 50);
        assert_eq!(db.collection::<Sale>().count().await.unwrap(), 0);
        assert_eq!(db.collection::<SaleItem>().count().await.unwrap(), 0);
        assert_eq!(db.collection::<InventoryMovement>().count().await.unwrap(), 0);
        assert_eq!(db.collection::<AccountingTransaction>().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_product_rolls_back() {
        let db = test_db().await;

        let lines = vec![LineItem::new(999, 1, 100)];
        let header = SaleHeader::from_lines("INV-4", &lines, TaxRate::zero());

        let err = db.orders().record_sale(&header, &lines).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::ProductNotFound(999))));
        assert_eq!(db.collection::<Sale>().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_cart() {
        let db = test_db().await;

        let err = db
            .orders()
            .record_sale(&SaleHeader::new("INV-5"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::EmptyCart)));

        let err = db
            .orders()
            .record_purchase(&PurchaseHeader::new("PUR-5"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_non_positive_quantity_rejected() {
        let db = test_db().await;
        let id = stocked_product(&db, "Eggs", 30).await;

        let lines = vec![LineItem::new(id, -2, 100)];
        let err = db
            .orders()
            .record_sale(&SaleHeader::new("INV-6"), &lines)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
        assert_eq!(db.products().get(id).await.unwrap().unwrap().stock, 30);
    }

    #[tokio::test]
    async fn test_duplicate_invoice_number() {
        let db = test_db().await;
        let id = stocked_product(&db, "Bread", 20).await;
        let lines = vec![LineItem::new(id, 1, 150)];
        let header = SaleHeader::from_lines("INV-7", &lines, TaxRate::zero());

        db.orders().record_sale(&header, &lines).await.unwrap();
        let err = db.orders().record_sale(&header, &lines).await.unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation { .. }));

        // the rejected sale did not touch stock
        assert_eq!(db.products().get(id).await.unwrap().unwrap().stock, 19);
    }

    #[tokio::test]
    async fn test_simple_purchase() {
        let db = test_db().await;
        let id = stocked_product(&db, "Flour", 5).await;
        let supplier_id = db
            .suppliers()
            .create(&grocer_core::Supplier::new("Wholesale Co"))
            .await
            .unwrap();

        let received_at = Utc.with_ymd_and_hms(2025, 12, 31, 23, 30, 0).unwrap();
        let lines = vec![LineItem::new(id, 20, 250)];
        let header = PurchaseHeader::from_lines("PUR-1", &lines, TaxRate::zero())
            .with_supplier(supplier_id)
            .with_date(received_at);

        let purchase_id = db.orders().record_purchase(&header, &lines).await.unwrap();

        assert_eq!(db.products().get(id).await.unwrap().unwrap().stock, 25);

        let purchase = db.collection::<Purchase>().get(purchase_id).await.unwrap().unwrap();
        assert_eq!(purchase.supplier_id, Some(supplier_id));
        assert_eq!(purchase.total_cents, 5000);

        let items = db.catalog().items_for_purchase(purchase_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_cost_cents, 250);
        assert_eq!(db.collection::<PurchaseItem>().count().await.unwrap(), 1);

        let movements = db.inventory().movements_for(id).await.unwrap();
        assert_eq!(movements[0].quantity_delta, 20);
        assert_eq!(movements[0].reference, "Purchase PUR-1");

        let balance = db.accounting().account_balance(COST_OF_GOODS_ACCOUNT).await.unwrap();
        assert_eq!(balance.cents(), 5000);

        let postings = db.accounting().entries_for(COST_OF_GOODS_ACCOUNT).await.unwrap();
        assert_eq!(postings[0].date, received_at);
        assert_eq!(purchase.date, received_at);
    }

    #[test]
    fn test_stock_conservation() {
        use proptest::prelude::*;

        // (is_sale, quantity)
        let op_strategy = proptest::collection::vec((any::<bool>(), 1i64..20), 1..12);
        let config = ProptestConfig {
            cases: 16,
            ..ProptestConfig::default()
        };

        proptest!(config, |(initial in 0i64..40, ops in op_strategy)| {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                let db = test_db().await;
                let id = stocked_product(&db, "Tea", initial).await;
                let mut expected = initial;

                for (n, (is_sale, qty)) in ops.iter().enumerate() {
                    let lines = vec![LineItem::new(id, *qty, 100)];
                    if *is_sale {
                        let header = SaleHeader::from_lines(format!("INV-{}", n), &lines, TaxRate::zero());
                        match db.orders().record_sale(&header, &lines).await {
                            Ok(_) => expected -= qty,
                            Err(DbError::Core(CoreError::InsufficientStock { .. })) => {
                                assert!(expected < *qty);
                            }
                            Err(e) => panic!("unexpected error: {}", e),
                        }
                    } else {
                        let header = PurchaseHeader::from_lines(format!("PUR-{}", n), &lines, TaxRate::zero());
                        db.orders().record_purchase(&header, &lines).await.unwrap();
                        expected += qty;
                    }

                    let stock = db.products().get(id).await.unwrap().unwrap().stock;
                    assert_eq!(stock, expected);
                    assert!(stock >= 0);
                }
            });
        });
    }
}
