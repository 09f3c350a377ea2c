//! # Dashboard Reads
//!
//! Fetches rows and hands them to the folds in `grocer_core::stats`.
//! Nothing is cached; every call recomputes from the store.
//!
//! A failed read is logged at `warn` and counts as "no data", so the
//! dashboard shows zeros instead of an error. A sum too large for `i64`
//! is treated the same way.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::warn;

use grocer_core::stats;
use grocer_core::{Customer, DashboardSnapshot, Money, Product, Sale};

use crate::repository::settings::SettingsRepository;
use crate::store::{self, Record};

#[derive(Debug, Clone)]
pub struct DashboardRepository {
    pool: SqlitePool,
}

impl DashboardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DashboardRepository { pool }
    }

    /// Full collection read; empty on failure.
    async fn rows<T: Record>(&self) -> Vec<T> {
        let result = match self.pool.acquire().await {
            Ok(mut conn) => store::list::<T>(&mut conn).await,
            Err(e) => Err(e.into()),
        };

        result.unwrap_or_else(|e| {
            warn!(collection = T::COLLECTION, error = %e, "Dashboard read failed");
            Vec::new()
        })
    }

    /// Sum of sale totals dated on `day` (UTC calendar day).
    pub async fn daily_sales(&self, day: NaiveDate) -> Money {
        figure("daily sales", stats::daily_sales(&self.rows::<Sale>().await, day))
    }

    /// `month` is 1-based.
    pub async fn monthly_sales(&self, year: i32, month: u32) -> Money {
        figure(
            "monthly sales",
            stats::monthly_sales(&self.rows::<Sale>().await, year, month),
        )
    }

    pub async fn inventory_valuation(&self) -> Money {
        figure(
            "inventory value",
            stats::inventory_valuation(&self.rows::<Product>().await),
        )
    }

    pub async fn receivables_total(&self) -> Money {
        figure(
            "receivables",
            stats::receivables_total(&self.rows::<Customer>().await),
        )
    }

    pub async fn low_stock_products(&self) -> Vec<Product> {
        let threshold = self.threshold().await;
        let products = self.rows::<Product>().await;
        stats::low_stock(&products, threshold).cloned().collect()
    }

    /// Snapshot for the current UTC day.
    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot_at(Utc::now().date_naive()).await
    }

    pub async fn snapshot_at(&self, day: NaiveDate) -> DashboardSnapshot {
        let sales = self.rows::<Sale>().await;
        let products = self.rows::<Product>().await;
        let customers = self.rows::<Customer>().await;
        let threshold = self.threshold().await;

        DashboardSnapshot::compute_with(day, &sales, &products, &customers, threshold, overflowed)
    }

    async fn threshold(&self) -> i64 {
        SettingsRepository::new(self.pool.clone())
            .low_stock_threshold()
            .await
    }
}

fn overflowed(name: &'static str) {
    warn!(figure = name, "Dashboard figure overflowed, showing zero");
}

fn figure(name: &'static str, total: Option<Money>) -> Money {
    total.unwrap_or_else(|| {
        overflowed(name);
        Money::zero()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{stocked_product, test_db};
    use chrono::TimeZone;
    use grocer_core::{LineItem, SaleHeader, TaxRate};

    #[tokio::test]
    async fn test_two_sales_today() {
        let db = test_db().await;
        let id = stocked_product(&db, "Cola", 100).await;
        let now = Utc::now();

        for (invoice, qty) in [("INV-A", 3), ("INV-B", 1)] {
            let lines = vec![LineItem::new(id, qty, 500)];
            let mut header = SaleHeader::from_lines(invoice, &lines, TaxRate::zero()).with_date(now);
            if invoice == "INV-B" {
                header.total_cents = 800;
            }
            db.orders().record_sale(&header, &lines).await.unwrap();
        }

        let today = now.date_naive();
        assert_eq!(db.dashboard().daily_sales(today).await.cents(), 2300);
        assert_eq!(
            db.dashboard()
                .daily_sales(today.pred_opt().unwrap())
                .await
                .cents(),
            0
        );
    }

    #[tokio::test]
    async fn test_snapshot() {
        let db = test_db().await;

        let day = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let date = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();

        // stock 100 at cost 350, stock 2 at cost 350
        let plenty = stocked_product(&db, "Cola", 100).await;
        stocked_product(&db, "Chips", 2).await;
        db.customers()
            .create(&Customer::new("Ahmed").with_balance(4000))
            .await
            .unwrap();

        for (invoice, at, total) in [("INV-1", date, 1500), ("INV-2", earlier, 700)] {
            let lines = vec![LineItem::new(plenty, 1, total)];
            let header = SaleHeader::from_lines(invoice, &lines, TaxRate::zero()).with_date(at);
            db.orders().record_sale(&header, &lines).await.unwrap();
        }

        let snapshot = db.dashboard().snapshot_at(day).await;
        assert_eq!(snapshot.daily_sales_cents, 1500);
        assert_eq!(snapshot.monthly_sales_cents, 2200);
        assert_eq!(snapshot.inventory_value_cents, (98 + 2) * 350);
        assert_eq!(snapshot.receivables_cents, 4000);
        assert_eq!(snapshot.product_count, 2);
        assert_eq!(snapshot.customer_count, 1);
        // min_stock 0 falls back to threshold 5
        assert_eq!(snapshot.low_stock_count, 1);

        let low = db.dashboard().low_stock_products().await;
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Chips");
    }

    #[tokio::test]
    async fn test_reads_degrade_after_close() {
        let db = test_db().await;
        stocked_product(&db, "Cola", 10).await;
        db.close().await;

        let snapshot = db.dashboard().snapshot().await;
        assert_eq!(snapshot.product_count, 0);
        assert_eq!(snapshot.inventory_value_cents, 0);
    }

    #[tokio::test]
    async fn test_overflowing_valuation_degrades_to_zero() {
        let db = test_db().await;
        db.products()
            .create(&Product::new("Gold bar", i64::MAX).with_stock(2))
            .await
            .unwrap();
        db.customers()
            .create(&Customer::new("Ahmed").with_balance(900))
            .await
            .unwrap();

        assert_eq!(db.dashboard().inventory_valuation().await, Money::zero());

        let snapshot = db.dashboard().snapshot().await;
        assert_eq!(snapshot.inventory_value_cents, 0);
        assert_eq!(snapshot.receivables_cents, 900);
        assert_eq!(snapshot.product_count, 1);
    }
}
