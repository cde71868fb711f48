//! In-memory transaction store

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::Transaction;
use crate::ports::TransactionStore;

/// Keeps transactions in insertion order. Useful for previews and tests.
#[derive(Default)]
pub struct MemoryStore {
    transactions: Mutex<Vec<Transaction>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with already-persisted transactions (ids are kept)
    pub fn with_transactions(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions: Mutex::new(transactions),
        }
    }

    /// Counts through a poisoned lock; a panic elsewhere never hides rows
    pub fn len(&self) -> usize {
        self.transactions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Transaction>>> {
        self.transactions
            .lock()
            .map_err(|_| Error::store("memory store lock poisoned"))
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn find_by_date_and_description(
        &self,
        date: NaiveDate,
        description: &str,
    ) -> Result<Vec<Transaction>> {
        Ok(self
            .lock()?
            .iter()
            .filter(|tx| tx.date == date && tx.description == description)
            .cloned()
            .collect())
    }

    async fn insert_transactions(&self, transactions: &[Transaction]) -> Result<Vec<Transaction>> {
        let saved: Vec<Transaction> = transactions
            .iter()
            .cloned()
            .map(|mut tx| {
                tx.id = Uuid::new_v4();
                tx
            })
            .collect();
        self.lock()?.extend(saved.iter().cloned());
        Ok(saved)
    }

    async fn list_transactions(&self, account: Option<&str>) -> Result<Vec<Transaction>> {
        let mut listed: Vec<Transaction> = self
            .lock()?
            .iter()
            .filter(|tx| tx.bank_account_id.as_deref() == account)
            .cloned()
            .collect();
        listed.sort_by_key(|tx| tx.date);
        Ok(listed)
    }

    async fn update_balances(&self, balances: &[(Uuid, Decimal)]) -> Result<()> {
        let by_id: HashMap<Uuid, Decimal> = balances.iter().copied().collect();
        for tx in self.lock()?.iter_mut() {
            if let Some(balance) = by_id.get(&tx.id) {
                tx.balance = Some(*balance);
            }
        }
        Ok(())
    }

    async fn latest_balance(&self, account: Option<&str>) -> Result<Option<Decimal>> {
        Ok(self
            .list_transactions(account)
            .await?
            .iter()
            .rev()
            .find_map(|tx| tx.balance))
    }

    async fn vendor_names(&self) -> Result<Vec<String>> {
        let names: BTreeSet<String> = self
            .lock()?
            .iter()
            .filter_map(|tx| tx.vendor.clone())
            .collect();
        Ok(names.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tx(day: u32, description: &str, amount: Decimal) -> Transaction {
        Transaction::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), description, amount)
    }

    #[tokio::test]
    async fn test_insert_assigns_new_ids() {
        let store = MemoryStore::new();
        let parsed = tx(5, "Coffee", dec!(-4.50));
        let saved = store.insert_transactions(&[parsed.clone()]).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_ne!(saved[0].id, parsed.id);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_list_orders_by_date_then_insertion() {
        let store = MemoryStore::new();
        store
            .insert_transactions(&[tx(6, "B", dec!(1)), tx(5, "A", dec!(1)), tx(6, "C", dec!(1))])
            .await
            .unwrap();
        let listed = store.list_transactions(None).await.unwrap();
        let names: Vec<&str> = listed.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_account_filter_and_latest_balance() {
        let mut a = tx(5, "A", dec!(10));
        a.bank_account_id = Some("chk".to_string());
        a.balance = Some(dec!(110));
        let b = tx(6, "B", dec!(10));
        let store = MemoryStore::with_transactions(vec![a, b]);

        assert_eq!(store.list_transactions(Some("chk")).await.unwrap().len(), 1);
        assert_eq!(store.latest_balance(Some("chk")).await.unwrap(), Some(dec!(110)));
        assert_eq!(store.latest_balance(None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_balances_and_find() {
        let store = MemoryStore::new();
        let saved = store.insert_transactions(&[tx(5, "Coffee", dec!(-4.50))]).await.unwrap();
        store.update_balances(&[(saved[0].id, dec!(95.50))]).await.unwrap();

        let found = store
            .find_by_date_and_description(saved[0].date, "Coffee")
            .await
            .unwrap();
        assert_eq!(found[0].balance, Some(dec!(95.50)));
        assert!(store
            .find_by_date_and_description(saved[0].date, "coffee")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_poisoned_lock_keeps_count_and_fails_queries() {
        let store = MemoryStore::with_transactions(vec![tx(5, "A", dec!(1)), tx(6, "B", dec!(1))]);
        let poisoned = std::thread::scope(|s| {
            s.spawn(|| {
                let _guard = store.transactions.lock().unwrap();
                panic!("writer died holding the lock");
            })
            .join()
            .is_err()
        });
        assert!(poisoned);

        assert_eq!(store.len(), 2);
        assert!(!store.is_empty());
        let err = store.list_transactions(None).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
    }
}
