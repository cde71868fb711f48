//! Running balances and reconciliation against stored transactions

use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    check_reconciliation_with_tolerance, ReconciliationResult, Transaction,
    DEFAULT_RECONCILIATION_TOLERANCE,
};
use crate::ports::TransactionStore;

/// Round to cents, halves away from zero
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Sort a copy of `transactions` by date (stable) and attach the running
/// balance after each one, starting from `initial_balance`.
///
/// Only the amount's sign matters here; `type` is never consulted.
pub fn compute_running_balance(transactions: &[Transaction], initial_balance: Decimal) -> Vec<Transaction> {
    let mut sorted = transactions.to_vec();
    sorted.sort_by_key(|tx| tx.date);

    let mut running = initial_balance;
    for tx in &mut sorted {
        running = running.saturating_add(tx.amount);
        tx.balance = Some(round_cents(running));
    }
    sorted
}

/// Balance after the last transaction, or the initial balance for an empty list
pub fn closing_balance(balanced: &[Transaction], initial_balance: Decimal) -> Decimal {
    balanced
        .last()
        .and_then(|tx| tx.balance)
        .unwrap_or_else(|| round_cents(initial_balance))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceResult {
    pub updated: usize,
    pub closing_balance: Decimal,
}

/// Maintains stored running balances for an account
pub struct BalanceService {
    store: Arc<dyn TransactionStore>,
    tolerance: Decimal,
}

impl BalanceService {
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self {
            store,
            tolerance: DEFAULT_RECONCILIATION_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn tolerance(&self) -> Decimal {
        self.tolerance
    }

    /// Recompute every running balance for the account from `initial_balance`
    pub async fn update_transaction_balances(
        &self,
        account: Option<&str>,
        initial_balance: Decimal,
    ) -> Result<RebalanceResult> {
        let stored = self.store.list_transactions(account).await?;
        let balanced = compute_running_balance(&stored, initial_balance);

        let updates: Vec<(Uuid, Decimal)> = balanced
            .iter()
            .filter_map(|tx| tx.balance.map(|b| (tx.id, b)))
            .collect();
        self.store.update_balances(&updates).await?;

        info!(account = account.unwrap_or("-"), updated = updates.len(), "Recomputed running balances");
        Ok(RebalanceResult {
            updated: updates.len(),
            closing_balance: closing_balance(&balanced, initial_balance),
        })
    }

    /// Compare the account's latest stored balance with a statement's ending balance
    pub async fn reconcile_account(
        &self,
        account: Option<&str>,
        stated_ending_balance: Decimal,
    ) -> Result<ReconciliationResult> {
        let computed = self.store.latest_balance(account).await?.ok_or_else(|| {
            Error::not_found(format!(
                "No running balance stored for account {}",
                account.unwrap_or("(none)")
            ))
        })?;
        Ok(self.reconcile(computed, stated_ending_balance))
    }

    pub fn reconcile(&self, computed: Decimal, stated_ending_balance: Decimal) -> ReconciliationResult {
        check_reconciliation_with_tolerance(computed, stated_ending_balance, self.tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn tx(day: u32, description: &str, amount: Decimal) -> Transaction {
        Transaction::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), description, amount)
    }

    #[test]
    fn test_sorted_running_balance() {
        let input = vec![
            tx(6, "Client Payment", dec!(1500.00)),
            tx(5, "Starbucks Coffee", dec!(-4.50)),
        ];
        let balanced = compute_running_balance(&input, dec!(1000.00));
        assert_eq!(balanced[0].description, "Starbucks Coffee");
        assert_eq!(balanced[0].balance, Some(dec!(995.50)));
        assert_eq!(balanced[1].balance, Some(dec!(2495.50)));
        // Input untouched
        assert!(input.iter().all(|t| t.balance.is_none()));
    }

    #[test]
    fn test_same_day_keeps_file_order() {
        let input = vec![tx(5, "first", dec!(1)), tx(4, "zero", dec!(1)), tx(5, "second", dec!(1))];
        let names: Vec<String> = compute_running_balance(&input, Decimal::ZERO)
            .into_iter()
            .map(|t| t.description)
            .collect();
        assert_eq!(names, vec!["zero", "first", "second"]);
    }

    #[test]
    fn test_balance_consistency() {
        let input = vec![
            tx(1, "a", dec!(10.005)),
            tx(2, "b", dec!(-3.333)),
            tx(3, "c", dec!(0.125)),
            tx(4, "d", dec!(-100)),
        ];
        let initial = dec!(50.00);
        let balanced = compute_running_balance(&input, initial);
        let mut acc = initial;
        for t in &balanced {
            acc += t.amount;
            assert_eq!(t.balance, Some(round_cents(acc)));
        }
        assert_eq!(balanced[0].balance, Some(dec!(60.01)));
    }

    #[test]
    fn test_type_is_ignored() {
        let mut refund = tx(1, "Refund", dec!(20.00));
        refund.transaction_type = Some(crate::domain::TransactionType::Expense);
        let balanced = compute_running_balance(&[refund], dec!(0));
        assert_eq!(balanced[0].balance, Some(dec!(20.00)));
    }

    #[test]
    fn test_huge_opening_balance_saturates() {
        let input = vec![tx(1, "a", dec!(1.00)), tx(2, "b", dec!(-1.00))];
        let balanced = compute_running_balance(&input, Decimal::MAX);
        assert_eq!(balanced[0].balance, Some(Decimal::MAX));
        assert_eq!(balanced[1].balance, Some(Decimal::MAX - dec!(1)));
    }

    #[test]
    fn test_closing_balance_of_empty_list() {
        assert_eq!(closing_balance(&[], dec!(12.345)), dec!(12.35));
    }

    #[tokio::test]
    async fn test_update_and_reconcile_account() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_transactions(&[tx(6, "Client Payment", dec!(1500.00)), tx(5, "Coffee", dec!(-4.50))])
            .await
            .unwrap();
        let service = BalanceService::new(store.clone());

        let result = service.update_transaction_balances(None, dec!(1000.00)).await.unwrap();
        assert_eq!(result.updated, 2);
        assert_eq!(result.closing_balance, dec!(2495.50));

        let rec = service.reconcile_account(None, dec!(2495.51)).await.unwrap();
        assert!(rec.reconciled);
        assert_eq!(rec.difference, dec!(-0.01));

        let rec = service.reconcile_account(None, dec!(2500.00)).await.unwrap();
        assert!(!rec.reconciled);
    }

    #[tokio::test]
    async fn test_reconcile_without_balances_is_not_found() {
        let service = BalanceService::new(Arc::new(MemoryStore::new()));
        let err = service.reconcile_account(Some("chk"), dec!(10)).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
