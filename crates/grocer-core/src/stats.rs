//! # Dashboard Statistics
//!
//! Pure folds behind the dashboard. The database layer fetches rows and
//! hands them over; nothing here is cached or maintained incrementally.
//!
//! ## Figures
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  today's sales      Σ sale.total   where sale.date is the given day    │
//! │  month's sales      Σ sale.total   where sale.date is in year/month    │
//! │  inventory value    Σ stock × (cost price, else sale price)            │
//! │  receivables        Σ customer.balance                                 │
//! │  low stock          # products with stock <= threshold                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Calendar days are UTC days.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Customer, Product, Sale};

/// Sum of sale totals dated on `day`, `None` on overflow.
pub fn daily_sales(sales: &[Sale], day: NaiveDate) -> Option<Money> {
    Money::checked_sum(
        sales
            .iter()
            .filter(|sale| sale.date.date_naive() == day)
            .map(Sale::total),
    )
}

/// Sum of sale totals dated in `year`/`month` (1-based month).
pub fn monthly_sales(sales: &[Sale], year: i32, month: u32) -> Option<Money> {
    Money::checked_sum(
        sales
            .iter()
            .filter(|sale| sale.date.year() == year && sale.date.month() == month)
            .map(Sale::total),
    )
}

/// Value of everything on the shelves.
pub fn inventory_valuation(products: &[Product]) -> Option<Money> {
    products.iter().try_fold(Money::zero(), |acc, product| {
        acc.checked_add(product.valuation_price().checked_multiply_quantity(product.stock)?)
    })
}

/// What customers owe in total. Negative balances (prepaid credit) offset.
pub fn receivables_total(customers: &[Customer]) -> Option<Money> {
    Money::checked_sum(customers.iter().map(|c| Money::from_cents(c.balance_cents)))
}

/// Products at or below their reorder threshold.
pub fn low_stock<'a>(products: &'a [Product], default_threshold: i64) -> impl Iterator<Item = &'a Product> {
    products
        .iter()
        .filter(move |p| p.is_low_stock(default_threshold))
}

/// Everything the dashboard shows, computed at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub daily_sales_cents: i64,
    pub monthly_sales_cents: i64,
    pub inventory_value_cents: i64,
    pub receivables_cents: i64,
    pub product_count: i64,
    pub customer_count: i64,
    pub low_stock_count: i64,
}

impl DashboardSnapshot {
    /// Folds fetched collections into a snapshot for `day`.
    ///
    /// A figure whose sum overflows is reported as zero.
    pub fn compute(
        day: NaiveDate,
        sales: &[Sale],
        products: &[Product],
        customers: &[Customer],
        default_threshold: i64,
    ) -> Self {
        Self::compute_with(day, sales, products, customers, default_threshold, |_| {})
    }

    /// Like [`compute`](Self::compute), calling `on_overflow` with the
    /// name of each figure that was zeroed.
    pub fn compute_with(
        day: NaiveDate,
        sales: &[Sale],
        products: &[Product],
        customers: &[Customer],
        default_threshold: i64,
        mut on_overflow: impl FnMut(&'static str),
    ) -> Self {
        let mut figure = |name: &'static str, total: Option<Money>| match total {
            Some(money) => money.cents(),
            None => {
                on_overflow(name);
                0
            }
        };

        DashboardSnapshot {
            date: day,
            daily_sales_cents: figure("daily sales", daily_sales(sales, day)),
            monthly_sales_cents: figure(
                "monthly sales",
                monthly_sales(sales, day.year(), day.month()),
            ),
            inventory_value_cents: figure("inventory value", inventory_valuation(products)),
            receivables_cents: figure("receivables", receivables_total(customers)),
            product_count: products.len() as i64,
            customer_count: customers.len() as i64,
            low_stock_count: low_stock(products, default_threshold).count() as i64,
        }
    }
}
