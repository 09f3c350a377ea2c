//! # Accounting Ledger
//!
//! Append-only postings and balance queries.
//!
//! ## Posting Flow
//! ```text
//! record_sale ──► post_in(tx, credit 4010, total)      ┐
//! record_purchase ──► post_in(tx, debit 5010, total)   ├─► accounting_transactions
//! reverse(id) ──► post(offsetting entry)               ┘      (never updated,
//!                                                              never deleted)
//! account_balance(code) = Σ debit − Σ credit
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use grocer_core::ledger;
use grocer_core::{AccountingTransaction, EntryType, Money};

use crate::error::{DbError, DbResult};
use crate::store::{self, IndexValue, Record};

/// Validates and appends one posting on `conn`.
pub(crate) async fn post_in(
    conn: &mut SqliteConnection,
    entry: &AccountingTransaction,
) -> DbResult<i64> {
    ledger::validate_posting(entry)?;
    let id = store::insert(&mut *conn, entry).await?;

    debug!(
        id,
        account = %entry.account_code,
        side = ?entry.debit_credit,
        amount_cents = entry.amount_cents,
        "Posted ledger entry"
    );
    Ok(id)
}

#[derive(Debug, Clone)]
pub struct AccountingLedger {
    pool: SqlitePool,
}

impl AccountingLedger {
    pub fn new(pool: SqlitePool) -> Self {
        AccountingLedger { pool }
    }

    /// Appends a posting. Fails on an empty account code or a negative
    /// amount; never touches earlier postings.
    pub async fn post(&self, entry: &AccountingTransaction) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        post_in(&mut conn, entry).await
    }

    /// Debit-normal balance of one account: debits add, credits subtract.
    ///
    /// An account without postings has a zero balance.
    pub async fn account_balance(&self, account_code: &str) -> DbResult<Money> {
        let entries = self.entries_for(account_code).await?;
        Ok(ledger::balance(&entries))
    }

    /// Posts the entry that cancels `entry_id` and returns the new entry's id.
    pub async fn reverse(&self, entry_id: i64) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;

        let original: AccountingTransaction = store::get(&mut tx, entry_id)
            .await?
            .ok_or_else(|| DbError::not_found(AccountingTransaction::COLLECTION, entry_id))?;

        let reversal = ledger::offsetting_entry(&original, Utc::now());
        let id = post_in(&mut tx, &reversal).await?;
        tx.commit().await?;

        info!(original = entry_id, reversal = id, "Ledger entry reversed");
        Ok(id)
    }

    pub async fn entries_for(&self, account_code: &str) -> DbResult<Vec<AccountingTransaction>> {
        let mut conn = self.pool.acquire().await?;
        store::list_by(&mut conn, "accountCode", IndexValue::from(account_code)).await
    }

    /// Postings that originate from one sale or purchase.
    pub async fn entries_for_reference(
        &self,
        entry_type: EntryType,
        reference_id: i64,
    ) -> DbResult<Vec<AccountingTransaction>> {
        let mut conn = self.pool.acquire().await?;
        let entries: Vec<AccountingTransaction> =
            store::list_by(&mut conn, "referenceId", IndexValue::Int(reference_id)).await?;
        Ok(entries
            .into_iter()
            .filter(|e| e.entry_type == entry_type)
            .collect())
    }

    pub async fn entries(&self) -> DbResult<Vec<AccountingTransaction>> {
        let mut conn = self.pool.acquire().await?;
        store::list(&mut conn).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;
    use grocer_core::ledger::{COST_OF_GOODS_ACCOUNT, SALES_REVENUE_ACCOUNT};
    use grocer_core::{CoreError, EntrySide};

    #[tokio::test]
    async fn test_balance_sign_convention() {
        let db = test_db().await;
        let books = db.accounting();

        books.post(&ledger::sale_posting(1, "INV-1", 1500, Utc::now())).await.unwrap();
        books.post(&ledger::sale_posting(2, "INV-2", 800, Utc::now())).await.unwrap();
        books.post(&ledger::purchase_posting(1, "PUR-1", 3500, Utc::now())).await.unwrap();

        assert_eq!(books.account_balance(SALES_REVENUE_ACCOUNT).await.unwrap().cents(), -2300);
        assert_eq!(books.account_balance(COST_OF_GOODS_ACCOUNT).await.unwrap().cents(), 3500);
        assert!(books.account_balance("9999").await.unwrap().is_zero());
    }

    #[tokio::test]
    async fn test_post_requires_account_code() {
        let db = test_db().await;

        let entry = AccountingTransaction::new(EntryType::Other, "", EntrySide::Debit, 100);
        let err = db.accounting().post(&entry).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
        assert!(db.accounting().entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reverse_nets_to_zero() {
        let db = test_db().await;
        let books = db.accounting();

        let id = books.post(&ledger::sale_posting(9, "INV-9", 1500, Utc::now())).await.unwrap();
        let reversal_id = books.reverse(id).await.unwrap();
        assert!(reversal_id > id);

        assert!(books.account_balance(SALES_REVENUE_ACCOUNT).await.unwrap().is_zero());

        let reversal = db.collection::<AccountingTransaction>().get(reversal_id).await.unwrap().unwrap();
        assert_eq!(reversal.debit_credit, EntrySide::Debit);
        assert_eq!(reversal.entry_type, EntryType::Other);
        assert_eq!(reversal.reference_id, Some(9));

        // original is untouched
        let original = db.collection::<AccountingTransaction>().get(id).await.unwrap().unwrap();
        assert_eq!(original.debit_credit, EntrySide::Credit);
    }

    #[tokio::test]
    async fn test_reverse_unknown_entry() {
        let db = test_db().await;
        let err = db.accounting().reverse(77).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_postings_are_append_only() {
        let db = test_db().await;
        let id = db
            .accounting()
            .post(&ledger::sale_posting(1, "INV-1", 1500, Utc::now()))
            .await
            .unwrap();

        let postings = db.collection::<AccountingTransaction>();
        let mut entry = postings.get(id).await.unwrap().unwrap();
        entry.amount_cents = 1;

        assert!(matches!(postings.update(&entry).await, Err(DbError::AppendOnly { .. })));
        assert!(matches!(postings.delete(id).await, Err(DbError::AppendOnly { .. })));
        assert_eq!(postings.get(id).await.unwrap().unwrap().amount_cents, 1500);
    }
}
