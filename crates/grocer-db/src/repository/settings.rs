//! # Settings Store
//!
//! Keyed JSON values consumed by the UI: company name, currency, default
//! tax rate (a percentage number such as `15`) and the low-stock threshold.
//!
//! Reads never fail the caller: a missing key or a failed read yields the
//! default, logged at `warn` for the failure case.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::types::Json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};
use ts_rs::TS;

use grocer_core::{Setting, TaxRate, DEFAULT_LOW_STOCK_THRESHOLD};

use crate::error::DbResult;

pub const COMPANY_NAME: &str = "companyName";
pub const TAX_RATE: &str = "taxRate";
pub const CURRENCY: &str = "currency";
pub const LOW_STOCK_THRESHOLD: &str = "lowStockThreshold";

pub const DEFAULT_COMPANY_NAME: &str = "My Grocery";
pub const DEFAULT_CURRENCY: &str = "YER";

/// Inserts or replaces one setting on `conn`, stamping `updated_at`.
pub(crate) async fn upsert_in(conn: &mut SqliteConnection, key: &str, value: &Value) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(Json(value))
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    debug!(key, "Setting saved");
    Ok(())
}

/// Inserts the setting only when the key is absent; returns whether it did.
pub(crate) async fn insert_missing_in(
    conn: &mut SqliteConnection,
    key: &str,
    value: &Value,
) -> DbResult<bool> {
    let result = sqlx::query(
        "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?) ON CONFLICT(key) DO NOTHING",
    )
    .bind(key)
    .bind(Json(value))
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Inserts a setting exactly as exported, keeping its timestamp.
pub(crate) async fn restore_in(conn: &mut SqliteConnection, setting: &Setting) -> DbResult<()> {
    sqlx::query("INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)")
        .bind(&setting.key)
        .bind(Json(&setting.value))
        .bind(setting.updated_at)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub(crate) async fn all_in(conn: &mut SqliteConnection) -> DbResult<Vec<Setting>> {
    let settings = sqlx::query_as::<_, Setting>(
        "SELECT key, value, updated_at FROM settings ORDER BY key",
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(settings)
}

pub(crate) async fn clear_in(conn: &mut SqliteConnection) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM settings").execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

/// Typed view of the well-known keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    pub company_name: String,
    pub currency: String,
    pub tax_rate: TaxRate,
    pub low_stock_threshold: i64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            tax_rate: TaxRate::zero(),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

impl StoreSettings {
    /// The key/value pairs as stored.
    pub fn entries(&self) -> Vec<(&'static str, Value)> {
        vec![
            (COMPANY_NAME, json!(self.company_name)),
            (CURRENCY, json!(self.currency)),
            (TAX_RATE, json!(self.tax_rate.percentage())),
            (LOW_STOCK_THRESHOLD, json!(self.low_stock_threshold)),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Returns `None` for a missing key and for a failed read.
    pub async fn get_setting(&self, key: &str) -> Option<Value> {
        match self.try_get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read setting");
                None
            }
        }
    }

    pub async fn get_setting_or(&self, key: &str, default: Value) -> Value {
        self.get_setting(key).await.unwrap_or(default)
    }

    /// Like [`SettingsRepository::get_setting`] but surfaces read errors.
    pub async fn try_get(&self, key: &str) -> DbResult<Option<Value>> {
        let row: Option<Json<Value>> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|Json(value)| value))
    }

    pub async fn set_setting(&self, key: &str, value: Value) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_in(&mut conn, key, &value).await
    }

    /// Succeeds when the key does not exist.
    pub async fn delete_setting(&self, key: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        debug!(key, "Setting deleted");
        Ok(())
    }

    pub async fn all(&self) -> DbResult<Vec<Setting>> {
        let mut conn = self.pool.acquire().await?;
        all_in(&mut conn).await
    }

    /// Reads the typed view; each missing or malformed key falls back to
    /// its default.
    pub async fn store_settings(&self) -> StoreSettings {
        let defaults = StoreSettings::default();

        let company_name = self
            .get_setting(COMPANY_NAME)
            .await
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or(defaults.company_name);
        let currency = self
            .get_setting(CURRENCY)
            .await
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or(defaults.currency);
        let tax_rate = self
            .get_setting(TAX_RATE)
            .await
            .and_then(|v| v.as_f64())
            .map(TaxRate::from_percentage)
            .unwrap_or(defaults.tax_rate);

        StoreSettings {
            company_name,
            currency,
            tax_rate,
            low_stock_threshold: self.low_stock_threshold().await,
        }
    }

    pub async fn save_store_settings(&self, settings: &StoreSettings) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in settings.entries() {
            upsert_in(&mut tx, key, &value).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn low_stock_threshold(&self) -> i64 {
        self.get_setting(LOW_STOCK_THRESHOLD)
            .await
            .and_then(|v| v.as_i64())
            .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;

    #[tokio::test]
    async fn test_set_get_delete() {
        let db = test_db().await;
        let settings = db.settings();

        assert!(settings.get_setting(CURRENCY).await.is_none());
        assert_eq!(
            settings.get_setting_or(CURRENCY, json!("YER")).await,
            json!("YER")
        );

        settings.set_setting(CURRENCY, json!("SAR")).await.unwrap();
        assert_eq!(settings.get_setting(CURRENCY).await, Some(json!("SAR")));

        // upsert replaces
        settings.set_setting(CURRENCY, json!("USD")).await.unwrap();
        assert_eq!(settings.get_setting(CURRENCY).await, Some(json!("USD")));
        assert_eq!(settings.all().await.unwrap().len(), 1);

        settings.delete_setting(CURRENCY).await.unwrap();
        settings.delete_setting(CURRENCY).await.unwrap();
        assert!(settings.get_setting(CURRENCY).await.is_none());
    }

    #[tokio::test]
    async fn test_store_settings_defaults_and_round_trip() {
        let db = test_db().await;
        let settings = db.settings();

        assert_eq!(settings.store_settings().await, StoreSettings::default());

        let custom = StoreSettings {
            company_name: "Corner Shop".to_string(),
            currency: "SAR".to_string(),
            tax_rate: TaxRate::from_bps(1500),
            low_stock_threshold: 3,
        };
        settings.save_store_settings(&custom).await.unwrap();

        assert_eq!(settings.store_settings().await, custom);
        assert_eq!(settings.get_setting(TAX_RATE).await, Some(json!(15.0)));
    }

    #[tokio::test]
    async fn test_malformed_value_falls_back() {
        let db = test_db().await;
        let settings = db.settings();

        settings
            .set_setting(LOW_STOCK_THRESHOLD, json!("lots"))
            .await
            .unwrap();
        assert_eq!(settings.low_stock_threshold().await, DEFAULT_LOW_STOCK_THRESHOLD);
    }
}
