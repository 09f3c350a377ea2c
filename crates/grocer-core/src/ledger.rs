//! # Accounting Rules
//!
//! Account codes and the balance sign convention of the accounting ledger.
//!
//! ## Sign Convention
//! ```text
//! balance(account) = Σ debit amounts − Σ credit amounts
//!
//!   Sale of 15.00      credit 4010  ──►  balance(4010) = -15.00
//!   Purchase of 35.00  debit  5010  ──►  balance(5010) = +35.00
//! ```
//!
//! Debit-normal throughout: revenue accounts read negative, expense and
//! asset accounts read positive. Postings are never edited; a mistake is
//! undone by an offsetting entry on the opposite side.

use chrono::{DateTime, Utc};

use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{AccountingTransaction, EntrySide, EntryType};
use crate::validation::{validate_account_code, validate_amount_cents};

/// Credited by every recorded sale.
pub const SALES_REVENUE_ACCOUNT: &str = "4010";

/// Debited by every recorded purchase.
pub const COST_OF_GOODS_ACCOUNT: &str = "5010";

/// Signed contribution of one posting to its account's balance.
#[inline]
pub fn signed_amount(entry: &AccountingTransaction) -> Money {
    let amount = Money::from_cents(entry.amount_cents);
    match entry.debit_credit {
        EntrySide::Debit => amount,
        EntrySide::Credit => -amount,
    }
}

/// Folds postings into a balance. Callers pass one account's entries.
pub fn balance<'a, I>(entries: I) -> Money
where
    I: IntoIterator<Item = &'a AccountingTransaction>,
{
    entries.into_iter().map(signed_amount).sum()
}

/// Checks the required fields of a posting.
pub fn validate_posting(entry: &AccountingTransaction) -> CoreResult<()> {
    validate_account_code(&entry.account_code)?;
    validate_amount_cents("amount", entry.amount_cents)?;
    Ok(())
}

/// The posting that cancels `original`: same account and amount, opposite
/// side, type `other`.
pub fn offsetting_entry(original: &AccountingTransaction, now: DateTime<Utc>) -> AccountingTransaction {
    AccountingTransaction {
        id: 0,
        date: now,
        entry_type: EntryType::Other,
        reference_id: original.reference_id,
        description: format!("Reversal of entry {}", original.id),
        amount_cents: original.amount_cents,
        account_code: original.account_code.clone(),
        debit_credit: original.debit_credit.opposite(),
        created_at: now,
        updated_at: now,
    }
}

/// Revenue posting for a recorded sale, dated like the sale.
pub fn sale_posting(
    sale_id: i64,
    invoice_number: &str,
    total_cents: i64,
    date: DateTime<Utc>,
) -> AccountingTransaction {
    AccountingTransaction::new(EntryType::Sale, SALES_REVENUE_ACCOUNT, EntrySide::Credit, total_cents)
        .with_reference(sale_id)
        .with_description(format!("Sale {}", invoice_number))
        .with_date(date)
}

/// Cost-of-goods posting for a recorded purchase, dated like the purchase.
pub fn purchase_posting(
    purchase_id: i64,
    invoice_number: &str,
    total_cents: i64,
    date: DateTime<Utc>,
) -> AccountingTransaction {
    AccountingTransaction::new(
        EntryType::Purchase,
        COST_OF_GOODS_ACCOUNT,
        EntrySide::Debit,
        total_cents,
    )
    .with_reference(purchase_id)
    .with_description(format!("Purchase {}", invoice_number))
    .with_date(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_is_debit_normal() {
        let entries = vec![
            sale_posting(1, "INV-1", 1500, Utc::now()),
            sale_posting(2, "INV-2", 800, Utc::now()),
        ];
        assert_eq!(balance(&entries).cents(), -2300);

        let purchases = vec![purchase_posting(1, "PUR-1", 3500, Utc::now())];
        assert_eq!(balance(&purchases).cents(), 3500);
    }

    #[test]
    fn test_postings_carry_invoice_date() {
        use chrono::TimeZone;

        let sold_at = Utc.with_ymd_and_hms(2025, 1, 5, 9, 0, 0).unwrap();
        let sale = sale_posting(1, "INV-1", 1500, sold_at);
        assert_eq!(sale.date, sold_at);
        assert!(sale.created_at > sold_at);

        let purchase = purchase_posting(1, "PUR-1", 3500, sold_at);
        assert_eq!(purchase.date, sold_at);
    }

    #[test]
    fn test_offsetting_entry_cancels() {
        let mut original = sale_posting(7, "INV-7", 1500, Utc::now());
        original.id = 3;

        let reversal = offsetting_entry(&original, Utc::now());
        assert_eq!(reversal.debit_credit, EntrySide::Debit);
        assert_eq!(reversal.entry_type, EntryType::Other);
        assert_eq!(reversal.reference_id, Some(7));
        assert_eq!(reversal.account_code, SALES_REVENUE_ACCOUNT);

        assert!(balance([&original, &reversal]).is_zero());
    }

    #[test]
    fn test_validate_posting() {
        assert!(validate_posting(&sale_posting(1, "INV-1", 0, Utc::now())).is_ok());

        let mut missing_code = sale_posting(1, "INV-1", 100, Utc::now());
        missing_code.account_code.clear();
        assert!(validate_posting(&missing_code).is_err());

        let mut negative = sale_posting(1, "INV-1", 100, Utc::now());
        negative.amount_cents = -1;
        assert!(validate_posting(&negative).is_err());
    }
}
