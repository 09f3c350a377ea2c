//! # Stock Arithmetic
//!
//! The pure half of the inventory ledger: given a product's current stock and
//! a requested movement, compute the resulting stock or refuse.
//!
//! ## Movement Direction
//! ```text
//! MovementType::Sale      stock - quantity
//! MovementType::Purchase  stock + quantity
//! MovementType::Manual    stock + quantity   (quantity is signed)
//! ```
//!
//! Whatever the type, a result below zero is rejected, and a quantity that
//! would take stock past `i64::MAX` is a validation error. The database layer
//! reads the product, calls [`StockChange::compute`], then writes the new
//! stock and the movement record in the same transaction.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::MovementType;

/// Result of applying one movement to one product's stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub product_id: i64,
    pub old_stock: i64,
    pub new_stock: i64,
    /// Signed change stored on the movement record.
    pub delta: i64,
}

impl StockChange {
    /// Applies `quantity` of `movement` to `current` stock.
    ///
    /// For sales and purchases `quantity` is a magnitude; its sign is
    /// ignored. For manual adjustments it is applied as given.
    ///
    /// ```rust
    /// use grocer_core::inventory::StockChange;
    /// use grocer_core::types::MovementType;
    ///
    /// let change = StockChange::compute(1, 10, 3, MovementType::Sale).unwrap();
    /// assert_eq!(change.new_stock, 7);
    /// assert_eq!(change.delta, -3);
    /// ```
    pub fn compute(
        product_id: i64,
        current: i64,
        quantity: i64,
        movement: MovementType,
    ) -> CoreResult<Self> {
        let overflow = || ValidationError::Overflow {
            field: "stock".to_string(),
        };

        let delta = match movement {
            MovementType::Sale => quantity.checked_abs().map(|q| -q),
            MovementType::Purchase => quantity.checked_abs(),
            MovementType::Manual => Some(quantity),
        }
        .ok_or_else(overflow)?;
        let new_stock = current.checked_add(delta).ok_or_else(overflow)?;

        if new_stock < 0 {
            return Err(CoreError::InsufficientStock {
                product_id,
                available: current,
                requested: delta.saturating_abs(),
            });
        }

        Ok(StockChange {
            product_id,
            old_stock: current,
            new_stock,
            delta,
        })
    }
}

/// Reference text recorded on a movement when the caller supplies none.
pub fn default_reference(movement: MovementType) -> &'static str {
    match movement {
        MovementType::Sale => "Automatic sale adjustment",
        MovementType::Purchase => "Automatic purchase adjustment",
        MovementType::Manual => "Manual stock adjustment",
    }
}
