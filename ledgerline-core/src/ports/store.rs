//! Transaction store port - persistence abstraction

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::Transaction;

/// Persistent transaction storage
///
/// `account` filters are optional everywhere: `None` means transactions that
/// were imported without a bank account id.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Stored transactions with this date and exactly this description.
    /// Amount comparison is left to the caller.
    async fn find_by_date_and_description(
        &self,
        date: NaiveDate,
        description: &str,
    ) -> Result<Vec<Transaction>>;

    /// Persist new transactions, returning them with their permanent ids
    async fn insert_transactions(&self, transactions: &[Transaction]) -> Result<Vec<Transaction>>;

    /// All transactions for an account, ascending by date then insertion order
    async fn list_transactions(&self, account: Option<&str>) -> Result<Vec<Transaction>>;

    /// Overwrite stored running balances
    async fn update_balances(&self, balances: &[(Uuid, Decimal)]) -> Result<()>;

    /// Running balance of the account's most recent transaction, if any has one
    async fn latest_balance(&self, account: Option<&str>) -> Result<Option<Decimal>>;

    /// Distinct vendor names already attached to stored transactions
    async fn vendor_names(&self) -> Result<Vec<String>>;
}
