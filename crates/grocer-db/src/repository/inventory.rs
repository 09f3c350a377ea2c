//! # Inventory Ledger
//!
//! The single authority for stock mutation.
//!
//! ## One Adjustment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    SELECT product            ── missing? ProductNotFound               │
//! │    StockChange::compute      ── negative? InsufficientStock            │
//! │    UPDATE products.stock                                                │
//! │    INSERT inventory_movements (old, new, delta, reference)              │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock write and its movement record commit together or not at all.
//! Sale and purchase workflows call [`adjust_stock_in`] on their own
//! transaction so the whole invoice shares that guarantee.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use grocer_core::inventory::default_reference;
use grocer_core::{CoreError, InventoryMovement, MovementType, Product, StockChange};

use crate::error::DbResult;
use crate::store::{self, IndexValue};

/// Applies one movement to one product on `conn`.
///
/// Does not commit; the caller owns the transaction.
pub(crate) async fn adjust_stock_in(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity: i64,
    movement: MovementType,
    reference: Option<&str>,
) -> DbResult<StockChange> {
    let product: Product = store::get(&mut *conn, product_id)
        .await?
        .ok_or(CoreError::ProductNotFound(product_id))?;

    let change = StockChange::compute(product_id, product.stock, quantity, movement)?;
    let now = Utc::now();

    sqlx::query("UPDATE products SET stock = ?, updated_at = ? WHERE id = ?")
        .bind(change.new_stock)
        .bind(now)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    let record = InventoryMovement {
        id: 0,
        product_id,
        date: now,
        movement_type: movement,
        quantity_delta: change.delta,
        old_stock: change.old_stock,
        new_stock: change.new_stock,
        reference: reference.unwrap_or(default_reference(movement)).to_string(),
        created_at: now,
        updated_at: now,
    };
    store::insert(&mut *conn, &record).await?;

    debug!(
        product_id,
        movement = movement.as_str(),
        old_stock = change.old_stock,
        new_stock = change.new_stock,
        "Stock adjusted"
    );

    Ok(change)
}

/// Stock adjustments and movement history.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    pool: SqlitePool,
}

impl InventoryLedger {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryLedger { pool }
    }

    /// Adjusts stock and records the movement; returns the new stock.
    ///
    /// `quantity` is a magnitude for `Sale`/`Purchase` and a signed delta
    /// for `Manual`.
    pub async fn adjust_stock(
        &self,
        product_id: i64,
        quantity: i64,
        movement: MovementType,
    ) -> DbResult<i64> {
        self.adjust_stock_with_reference(product_id, quantity, movement, None)
            .await
    }

    /// Same as [`InventoryLedger::adjust_stock`] with an explicit reference
    /// text on the movement record.
    pub async fn adjust_stock_with_reference(
        &self,
        product_id: i64,
        quantity: i64,
        movement: MovementType,
        reference: Option<&str>,
    ) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;
        let change = adjust_stock_in(&mut tx, product_id, quantity, movement, reference).await?;
        tx.commit().await?;
        Ok(change.new_stock)
    }

    /// Movement history of one product, oldest first.
    pub async fn movements_for(&self, product_id: i64) -> DbResult<Vec<InventoryMovement>> {
        let mut conn = self.pool.acquire().await?;
        store::list_by(&mut conn, "productId", IndexValue::Int(product_id)).await
    }

    pub async fn movements(&self) -> DbResult<Vec<InventoryMovement>> {
        let mut conn = self.pool.acquire().await?;
        store::list(&mut conn).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::test_support::{stocked_product, test_db};

    #[tokio::test]
    async fn test_sale_movement_subtracts_and_records() {
        let db = test_db().await;
        let id = stocked_product(&db, "Cola 330ml", 100).await;

        let new_stock = db
            .inventory()
            .adjust_stock(id, 3, MovementType::Sale)
            .await
            .unwrap();
        assert_eq!(new_stock, 97);

        let product = db.products().get(id).await.unwrap().unwrap();
        assert_eq!(product.stock, 97);

        let movements = db.inventory().movements_for(id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].old_stock, 100);
        assert_eq!(movements[0].new_stock, 97);
        assert_eq!(movements[0].quantity_delta, -3);
        assert_eq!(movements[0].movement_type, MovementType::Sale);
        assert_eq!(movements[0].reference, "Automatic sale adjustment");
    }

    #[tokio::test]
    async fn test_purchase_and_manual_movements() {
        let db = test_db().await;
        let id = stocked_product(&db, "Rice 1kg", 10).await;

        let stock = db
            .inventory()
            .adjust_stock(id, 20, MovementType::Purchase)
            .await
            .unwrap();
        assert_eq!(stock, 30);

        let stock = db
            .inventory()
            .adjust_stock_with_reference(id, -5, MovementType::Manual, Some("Spoiled"))
            .await
            .unwrap();
        assert_eq!(stock, 25);

        let movements = db.inventory().movements_for(id).await.unwrap();
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[1].reference, "Spoiled");
    }

    #[tokio::test]
    async fn test_insufficient_stock_writes_nothing() {
        let db = test_db().await;
        let id = stocked_product(&db, "Chocolate", 2).await;

        let err = db
            .inventory()
            .adjust_stock(id, 5, MovementType::Sale)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InsufficientStock {
                available: 2,
                requested: 5,
                ..
            })
        ));

        let product = db.products().get(id).await.unwrap().unwrap();
        assert_eq!(product.stock, 2);
        assert!(db.inventory().movements_for(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quantity_beyond_stock_range_rejected() {
        let db = test_db().await;
        let id = stocked_product(&db, "Sugar", 10).await;

        let err = db
            .inventory()
            .adjust_stock(id, i64::MAX, MovementType::Purchase)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        assert_eq!(db.products().get(id).await.unwrap().unwrap().stock, 10);
        assert!(db.inventory().movements_for(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let db = test_db().await;

        let err = db
            .inventory()
            .adjust_stock(404, 1, MovementType::Purchase)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::ProductNotFound(404))));
    }

    #[tokio::test]
    async fn test_movements_are_append_only() {
        let db = test_db().await;
        let id = stocked_product(&db, "Milk", 10).await;
        db.inventory()
            .adjust_stock(id, 1, MovementType::Sale)
            .await
            .unwrap();

        let movement = db.inventory().movements().await.unwrap().remove(0);
        let movements = db.collection::<InventoryMovement>();

        assert!(matches!(
            movements.update(&movement).await,
            Err(DbError::AppendOnly { .. })
        ));
        assert!(matches!(
            movements.delete(movement.id).await,
            Err(DbError::AppendOnly { .. })
        ));
    }
}
