//! Core domain entities
//!
//! Transactions and the pure normalization rules applied to statement cells.
//! No I/O happens here.

mod amount;
mod date;
mod reconciliation;
mod transaction;
pub mod result;
pub mod vendor;

pub use amount::{amount_from_debit_credit, parse_amount, try_parse_amount, MAX_AMOUNT};
pub use date::{parse_date, DateFallback, DateOrder};
pub use reconciliation::{
    check_reconciliation, check_reconciliation_with_tolerance, ReconciliationResult,
    DEFAULT_RECONCILIATION_TOLERANCE,
};
pub use transaction::{StatementType, Transaction, TransactionType};
pub use vendor::Classification;
