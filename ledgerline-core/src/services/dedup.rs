//! Duplicate detection
//!
//! Two transactions describe the same bank event when they share a date, have
//! exactly the same description, and their amounts differ by less than a cent.
//! [`is_same_event`] is the only place that rule lives; the in-memory and
//! store-backed detectors both call it.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::Transaction;
use crate::ports::TransactionStore;

/// Amounts closer than this are the same amount
pub const DUPLICATE_AMOUNT_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

pub const DEFAULT_DEDUP_CONCURRENCY: usize = 8;

/// Progress callback: `(checked, total)`
pub type ScanProgress<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

pub fn is_same_event(a: &Transaction, b: &Transaction) -> bool {
    a.date == b.date
        && a.description == b.description
        && a
            .amount
            .checked_sub(b.amount)
            .is_some_and(|diff| diff.abs() < DUPLICATE_AMOUNT_EPSILON)
}

/// The incoming transactions that match something in `existing`, in incoming order
pub fn find_duplicates(existing: &[Transaction], incoming: &[Transaction]) -> Vec<Transaction> {
    incoming
        .iter()
        .filter(|tx| existing.iter().any(|e| is_same_event(e, tx)))
        .cloned()
        .collect()
}

/// Later repeats of an earlier transaction in the same batch
pub fn find_duplicates_within(transactions: &[Transaction]) -> Vec<Transaction> {
    transactions
        .iter()
        .enumerate()
        .filter(|(i, tx)| transactions[..*i].iter().any(|e| is_same_event(e, tx)))
        .map(|(_, tx)| tx.clone())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateStatus {
    Unique,
    Duplicate,
    /// The store lookup failed; the transaction is kept
    Unknown,
}

/// Result of a store-backed scan. `kept` and `duplicates` preserve input order.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub kept: Vec<Transaction>,
    pub duplicates: Vec<Transaction>,
    /// How many of `kept` could not be checked
    pub unknown: usize,
    pub warnings: Vec<String>,
}

/// Checks incoming transactions against a [`TransactionStore`], one lookup
/// per transaction with a bounded number in flight.
pub struct DuplicateScanner {
    store: Arc<dyn TransactionStore>,
    concurrency: usize,
}

impl DuplicateScanner {
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self {
            store,
            concurrency: DEFAULT_DEDUP_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Status of each incoming transaction, by index
    pub async fn statuses(
        &self,
        incoming: &[Transaction],
        progress: Option<ScanProgress<'_>>,
    ) -> Vec<DuplicateStatus> {
        let total = incoming.len();
        let store = &self.store;
        let mut statuses = vec![DuplicateStatus::Unknown; total];

        let mut lookups = stream::iter(incoming.iter().enumerate())
            .map(|(idx, tx)| async move {
                let status = match store.find_by_date_and_description(tx.date, &tx.description).await {
                    Ok(candidates) if candidates.iter().any(|c| is_same_event(c, tx)) => {
                        DuplicateStatus::Duplicate
                    }
                    Ok(_) => DuplicateStatus::Unique,
                    Err(e) => {
                        warn!(index = idx, error = %e, "Duplicate lookup failed");
                        DuplicateStatus::Unknown
                    }
                };
                (idx, status)
            })
            .buffer_unordered(self.concurrency);

        let mut checked = 0;
        while let Some((idx, status)) = lookups.next().await {
            statuses[idx] = status;
            checked += 1;
            if let Some(report) = progress {
                report(checked, total);
            }
        }
        statuses
    }

    /// Split `incoming` into kept and duplicate transactions.
    ///
    /// Never fails: a transaction whose lookup errored is kept and warned about.
    pub async fn scan(
        &self,
        incoming: Vec<Transaction>,
        progress: Option<ScanProgress<'_>>,
    ) -> ScanOutcome {
        let statuses = self.statuses(&incoming, progress).await;

        let mut outcome = ScanOutcome::default();
        for (tx, status) in incoming.into_iter().zip(statuses) {
            match status {
                DuplicateStatus::Unique => outcome.kept.push(tx),
                DuplicateStatus::Duplicate => outcome.duplicates.push(tx),
                DuplicateStatus::Unknown => {
                    outcome.warnings.push(format!(
                        "Could not check '{}' on {} for duplicates; kept it",
                        tx.description,
                        tx.date_string()
                    ));
                    outcome.unknown += 1;
                    outcome.kept.push(tx);
                }
            }
        }

        debug!(
            kept = outcome.kept.len(),
            duplicates = outcome.duplicates.len(),
            unknown = outcome.unknown,
            "Duplicate scan finished"
        );
        outcome
    }
}
