//! # Record Store
//!
//! Generic keyed-collection storage: every collection is one table described
//! by a [`Record`] implementation, and the same five operations work on all
//! of them.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Record (trait)                  one impl per collection (records.rs) │
//! │   ├── COLLECTION / TABLE          "saleItems" / "sale_items"           │
//! │   ├── COLUMNS                     everything except `id`               │
//! │   ├── INDEXES                     "saleId" → sale_id, ...              │
//! │   ├── APPEND_ONLY                 ledgers refuse update/delete         │
//! │   └── delete_guard()              categories refuse while in use       │
//! │                                                                         │
//! │   free functions on &mut SqliteConnection                              │
//! │   insert · get · list · list_by · update · delete · count              │
//! │        ▲                                   ▲                            │
//! │        │                                   │                            │
//! │   Collection<T>  (pool, one op = one      StoreTx  (one SQLite          │
//! │                   atomic statement)                 transaction,        │
//! │                                                     rollback on drop)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identifiers
//! Identifiers are assigned by SQLite (`AUTOINCREMENT`). A record handed to
//! `create` with `id == 0` gets the next one; a positive `id` is kept, which
//! is how backup import preserves identity. Point lookups with `id <= 0`
//! fail with [`DbError::InvalidKey`].

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{FromRow, Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::debug;

use grocer_core::{MovementType, StockChange};

use crate::error::{DbError, DbResult};

/// A query under construction, as handed to [`Record::bind_columns`].
pub type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

// =============================================================================
// Record Trait
// =============================================================================

/// Refuses a delete while other rows still point at the record.
#[derive(Debug, Clone, Copy)]
pub struct DeleteGuard {
    /// Table holding the references.
    pub table: &'static str,
    /// Column holding the referenced id.
    pub column: &'static str,
    /// Builds the error from (id, referencing row count).
    pub error: fn(i64, i64) -> DbError,
}

/// Describes how one collection maps onto its table.
pub trait Record: for<'r> FromRow<'r, SqliteRow> + Send + Sync + Unpin + Clone + 'static {
    /// Collection name as used in backups and error messages.
    const COLLECTION: &'static str;
    const TABLE: &'static str;
    /// Column names except `id`, in the order `bind_columns` binds them.
    const COLUMNS: &'static [&'static str];
    /// Secondary indexes: (index name, column).
    const INDEXES: &'static [(&'static str, &'static str)];
    const APPEND_ONLY: bool = false;

    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
    /// Stamps the modification time.
    fn touch(&mut self, now: DateTime<Utc>);
    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q>;

    fn delete_guard() -> Option<DeleteGuard> {
        None
    }
}

/// Value looked up on a secondary index.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    Int(i64),
    Text(String),
    /// Matches rows where the indexed column IS NULL.
    Null,
}

impl From<i64> for IndexValue {
    fn from(v: i64) -> Self {
        IndexValue::Int(v)
    }
}

impl From<&str> for IndexValue {
    fn from(v: &str) -> Self {
        IndexValue::Text(v.to_string())
    }
}

impl From<String> for IndexValue {
    fn from(v: String) -> Self {
        IndexValue::Text(v)
    }
}

impl From<Option<i64>> for IndexValue {
    fn from(v: Option<i64>) -> Self {
        v.map_or(IndexValue::Null, IndexValue::Int)
    }
}

impl From<MovementType> for IndexValue {
    fn from(v: MovementType) -> Self {
        IndexValue::Text(v.as_str().to_string())
    }
}

impl From<grocer_core::EntryType> for IndexValue {
    fn from(v: grocer_core::EntryType) -> Self {
        IndexValue::Text(v.as_str().to_string())
    }
}

// =============================================================================
// SQL Builders
// =============================================================================

pub(crate) fn select_clause<T: Record>() -> String {
    format!("SELECT id, {} FROM {}", T::COLUMNS.join(", "), T::TABLE)
}

fn insert_sql<T: Record>() -> String {
    let placeholders = vec!["?"; T::COLUMNS.len() + 1].join(", ");
    format!(
        "INSERT INTO {} (id, {}) VALUES ({})",
        T::TABLE,
        T::COLUMNS.join(", "),
        placeholders
    )
}

fn update_sql<T: Record>() -> String {
    let assignments = T::COLUMNS
        .iter()
        .map(|c| format!("{} = ?", c))
        .collect::<Vec<_>>()
        .join(", ");
    format!("UPDATE {} SET {} WHERE id = ?", T::TABLE, assignments)
}

fn index_column<T: Record>(index: &str) -> DbResult<&'static str> {
    T::INDEXES
        .iter()
        .find(|(name, _)| *name == index)
        .map(|(_, column)| *column)
        .ok_or_else(|| DbError::UnknownIndex {
            collection: T::COLLECTION.to_string(),
            index: index.to_string(),
        })
}

fn check_key<T: Record>(id: i64) -> DbResult<()> {
    if id <= 0 {
        return Err(DbError::invalid_key(T::COLLECTION, id));
    }
    Ok(())
}

fn check_mutable<T: Record>() -> DbResult<()> {
    if T::APPEND_ONLY {
        return Err(DbError::AppendOnly {
            collection: T::COLLECTION.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Operations
// =============================================================================

/// Inserts `record` and returns its identifier.
pub(crate) async fn insert<T: Record>(conn: &mut SqliteConnection, record: &T) -> DbResult<i64> {
    let sql = insert_sql::<T>();
    let id = (record.id() > 0).then_some(record.id());

    let query = record.bind_columns(sqlx::query(&sql).bind(id));
    let result = query.execute(&mut *conn).await?;
    let id = result.last_insert_rowid();

    debug!(collection = T::COLLECTION, id, "Record created");
    Ok(id)
}

pub(crate) async fn get<T: Record>(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<T>> {
    check_key::<T>(id)?;

    let sql = format!("{} WHERE id = ?", select_clause::<T>());
    let record = sqlx::query_as::<_, T>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(record)
}

pub(crate) async fn list<T: Record>(conn: &mut SqliteConnection) -> DbResult<Vec<T>> {
    let sql = format!("{} ORDER BY id", select_clause::<T>());
    let records = sqlx::query_as::<_, T>(&sql).fetch_all(&mut *conn).await?;
    Ok(records)
}

pub(crate) async fn list_by<T: Record>(
    conn: &mut SqliteConnection,
    index: &str,
    value: IndexValue,
) -> DbResult<Vec<T>> {
    let column = index_column::<T>(index)?;

    let records = match value {
        IndexValue::Null => {
            let sql = format!("{} WHERE {} IS NULL ORDER BY id", select_clause::<T>(), column);
            sqlx::query_as::<_, T>(&sql).fetch_all(&mut *conn).await?
        }
        IndexValue::Int(v) => {
            let sql = format!("{} WHERE {} = ? ORDER BY id", select_clause::<T>(), column);
            sqlx::query_as::<_, T>(&sql).bind(v).fetch_all(&mut *conn).await?
        }
        IndexValue::Text(v) => {
            let sql = format!("{} WHERE {} = ? ORDER BY id", select_clause::<T>(), column);
            sqlx::query_as::<_, T>(&sql).bind(v).fetch_all(&mut *conn).await?
        }
    };

    debug!(collection = T::COLLECTION, index, count = records.len(), "Index lookup");
    Ok(records)
}

/// Full replace by identifier. Stamps `updated_at`.
pub(crate) async fn update<T: Record>(conn: &mut SqliteConnection, record: &T) -> DbResult<()> {
    check_mutable::<T>()?;
    check_key::<T>(record.id())?;

    let mut record = record.clone();
    record.touch(Utc::now());

    let sql = update_sql::<T>();
    let result = record
        .bind_columns(sqlx::query(&sql))
        .bind(record.id())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(T::COLLECTION, record.id()));
    }

    debug!(collection = T::COLLECTION, id = record.id(), "Record updated");
    Ok(())
}

/// Deletes by identifier. Succeeds when the record does not exist.
///
/// Run the guard check and the delete on the same connection inside a
/// transaction; [`Collection::delete`] does that.
pub(crate) async fn delete<T: Record>(conn: &mut SqliteConnection, id: i64) -> DbResult<()> {
    check_mutable::<T>()?;
    check_key::<T>(id)?;

    if let Some(guard) = T::delete_guard() {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = ?", guard.table, guard.column);
        let references: i64 = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        if references > 0 {
            return Err((guard.error)(id, references));
        }
    }

    let sql = format!("DELETE FROM {} WHERE id = ?", T::TABLE);
    let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;

    debug!(
        collection = T::COLLECTION,
        id,
        existed = result.rows_affected() > 0,
        "Record deleted"
    );
    Ok(())
}

/// Empties a collection, ledgers included. Only backup import does this.
pub(crate) async fn clear<T: Record>(conn: &mut SqliteConnection) -> DbResult<u64> {
    let sql = format!("DELETE FROM {}", T::TABLE);
    let result = sqlx::query(&sql).execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

pub(crate) async fn count<T: Record>(conn: &mut SqliteConnection) -> DbResult<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
    let count: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *conn).await?;
    Ok(count)
}

// =============================================================================
// Collection Handle
// =============================================================================

/// Pool-backed handle on one collection.
///
/// Each call is one atomic operation; nothing spans calls. Use
/// [`crate::Database::begin`] for multi-step writes.
///
/// ```rust,ignore
/// let id = db.products().create(&Product::new("Rice 1kg", 500)).await?;
/// let rice = db.products().get(id).await?;
/// let uncategorized = db.products().list_by("categoryId", IndexValue::Null).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Collection<T> {
    pool: SqlitePool,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Collection<T> {
    pub fn new(pool: SqlitePool) -> Self {
        Collection {
            pool,
            _record: PhantomData,
        }
    }

    pub async fn create(&self, record: &T) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, record).await
    }

    /// Like [`Collection::create`], handing the record back with its id.
    pub async fn create_record(&self, mut record: T) -> DbResult<T> {
        let id = self.create(&record).await?;
        record.set_id(id);
        Ok(record)
    }

    /// Returns `Ok(None)` when the record does not exist.
    pub async fn get(&self, id: i64) -> DbResult<Option<T>> {
        let mut conn = self.pool.acquire().await?;
        get(&mut conn, id).await
    }

    /// Every record, in insertion order.
    pub async fn list(&self) -> DbResult<Vec<T>> {
        let mut conn = self.pool.acquire().await?;
        list(&mut conn).await
    }

    /// Equality lookup on a named secondary index.
    pub async fn list_by(&self, index: &str, value: impl Into<IndexValue>) -> DbResult<Vec<T>> {
        let mut conn = self.pool.acquire().await?;
        list_by(&mut conn, index, value.into()).await
    }

    pub async fn update(&self, record: &T) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        update(&mut conn, record).await
    }

    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        delete::<T>(&mut tx, id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        count::<T>(&mut conn).await
    }
}

// =============================================================================
// Transaction Scope
// =============================================================================

/// One SQLite transaction exposing the record operations.
///
/// Dropped without [`StoreTx::commit`], everything done through it is
/// rolled back.
///
/// ```rust,ignore
/// let mut tx = db.begin().await?;
/// let customer_id = tx.create(&Customer::new("Ahmed")).await?;
/// tx.adjust_stock(rice_id, -2, MovementType::Manual, Some("Spoiled")).await?;
/// tx.commit().await?;
/// ```
pub struct StoreTx {
    tx: Transaction<'static, Sqlite>,
}

impl StoreTx {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        StoreTx { tx }
    }

    pub async fn create<T: Record>(&mut self, record: &T) -> DbResult<i64> {
        insert(&mut self.tx, record).await
    }

    pub async fn get<T: Record>(&mut self, id: i64) -> DbResult<Option<T>> {
        get(&mut self.tx, id).await
    }

    pub async fn list<T: Record>(&mut self) -> DbResult<Vec<T>> {
        list(&mut self.tx).await
    }

    pub async fn list_by<T: Record>(
        &mut self,
        index: &str,
        value: impl Into<IndexValue>,
    ) -> DbResult<Vec<T>> {
        list_by(&mut self.tx, index, value.into()).await
    }

    pub async fn update<T: Record>(&mut self, record: &T) -> DbResult<()> {
        update(&mut self.tx, record).await
    }

    pub async fn delete<T: Record>(&mut self, id: i64) -> DbResult<()> {
        delete::<T>(&mut self.tx, id).await
    }

    pub async fn count<T: Record>(&mut self) -> DbResult<i64> {
        count::<T>(&mut self.tx).await
    }

    /// Inventory ledger adjustment inside this transaction.
    pub async fn adjust_stock(
        &mut self,
        product_id: i64,
        quantity: i64,
        movement: MovementType,
        reference: Option<&str>,
    ) -> DbResult<StockChange> {
        crate::repository::inventory::adjust_stock_in(
            &mut self.tx,
            product_id,
            quantity,
            movement,
            reference,
        )
        .await
    }

    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }

    /// Explicit rollback; dropping the scope does the same.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;
    use grocer_core::{Category, Customer, InventoryEntry, Product, Sale, User};

    #[tokio::test]
    async fn test_create_get_list() {
        let db = test_db().await;
        let products = db.products();

        let rice = products
            .create_record(Product::new("Rice 1kg", 500).with_stock(10))
            .await
            .unwrap();
        assert!(rice.id > 0);

        let oil = products.create(&Product::new("Oil 1L", 900)).await.unwrap();
        assert!(oil > rice.id);

        let fetched = products.get(rice.id).await.unwrap().unwrap();
        assert_eq!(fetched, rice);
        assert!(products.get(oil + 100).await.unwrap().is_none());

        let all = products.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Rice 1kg");
        assert_eq!(products.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_explicit_id_is_kept() {
        let db = test_db().await;
        let mut customer = Customer::new("Ahmed");
        customer.id = 40;

        assert_eq!(db.customers().create(&customer).await.unwrap(), 40);
        assert_eq!(db.customers().create(&Customer::new("Ali")).await.unwrap(), 41);
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let db = test_db().await;

        assert!(matches!(
            db.products().get(0).await,
            Err(DbError::InvalidKey { .. })
        ));
        assert!(matches!(
            db.products().delete(-3).await,
            Err(DbError::InvalidKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_by_index() {
        let db = test_db().await;
        let drinks = db.categories().create(&Category::new("Drinks")).await.unwrap();

        db.products()
            .create(&Product::new("Water", 100).with_category(drinks))
            .await
            .unwrap();
        db.products().create(&Product::new("Soap", 300)).await.unwrap();

        let in_drinks = db.products().list_by("categoryId", drinks).await.unwrap();
        assert_eq!(in_drinks.len(), 1);

        let none = db.products().list_by("categoryId", IndexValue::Null).await.unwrap();
        assert_eq!(none[0].name, "Soap");

        let by_name = db.products().list_by("name", "Water").await.unwrap();
        assert_eq!(by_name.len(), 1);

        let err = db.products().list_by("colour", "red").await.unwrap_err();
        assert!(matches!(err, DbError::UnknownIndex { .. }));
    }

    #[tokio::test]
    async fn test_update() {
        let db = test_db().await;
        let mut rice = db
            .products()
            .create_record(Product::new("Rice", 500))
            .await
            .unwrap();
        let created = rice.updated_at;

        rice.sale_price_cents = 550;
        db.products().update(&rice).await.unwrap();

        let stored = db.products().get(rice.id).await.unwrap().unwrap();
        assert_eq!(stored.sale_price_cents, 550);
        assert!(stored.updated_at >= created);

        rice.id = 999;
        assert!(matches!(
            db.products().update(&rice).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let db = test_db().await;
        let id = db.customers().create(&Customer::new("Ahmed")).await.unwrap();

        db.customers().delete(id).await.unwrap();
        db.customers().delete(id).await.unwrap();
        assert!(db.customers().get(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_category_delete_guard() {
        let db = test_db().await;
        let drinks = db.categories().create(&Category::new("Drinks")).await.unwrap();
        let water = db
            .products()
            .create(&Product::new("Water", 100).with_category(drinks))
            .await
            .unwrap();

        let err = db.categories().delete(drinks).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::CategoryInUse { product_count: 1, .. }
        ));
        assert!(db.categories().get(drinks).await.unwrap().is_some());

        db.products().delete(water).await.unwrap();
        db.categories().delete(drinks).await.unwrap();
        assert!(db.categories().get(drinks).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_indexes() {
        let db = test_db().await;

        db.categories().create(&Category::new("Drinks")).await.unwrap();
        assert!(matches!(
            db.categories().create(&Category::new("Drinks")).await,
            Err(DbError::ConstraintViolation { .. })
        ));

        let sale = Sale {
            invoice_number: "INV-1".to_string(),
            ..Default::default()
        };
        db.collection::<Sale>().create(&sale).await.unwrap();
        assert!(matches!(
            db.collection::<Sale>().create(&sale).await,
            Err(DbError::ConstraintViolation { .. })
        ));

        let user = User {
            username: "admin".to_string(),
            ..Default::default()
        };
        db.users().create(&user).await.unwrap();
        assert!(db.users().create(&user).await.is_err());

        let rice = db.products().create(&Product::new("Rice", 500)).await.unwrap();
        let entry = InventoryEntry {
            product_id: rice,
            warehouse: "main".to_string(),
            quantity: 10,
            ..Default::default()
        };
        db.collection::<InventoryEntry>().create(&entry).await.unwrap();
        assert!(db.collection::<InventoryEntry>().create(&entry).await.is_err());
    }

    #[tokio::test]
    async fn test_negative_stock_rejected_by_store() {
        let db = test_db().await;
        let mut product = Product::new("Rice", 500);
        product.stock = -1;

        assert!(matches!(
            db.products().create(&product).await,
            Err(DbError::ConstraintViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_store_tx_adjust_stock() {
        let db = test_db().await;
        let id = db
            .products()
            .create(&Product::new("Rice", 500).with_stock(5))
            .await
            .unwrap();

        let mut tx = db.begin().await.unwrap();
        let change = tx
            .adjust_stock(id, -2, MovementType::Manual, Some("Spoiled"))
            .await
            .unwrap();
        assert_eq!(change.new_stock, 3);
        tx.rollback().await.unwrap();

        assert_eq!(db.products().get(id).await.unwrap().unwrap().stock, 5);
    }
}
