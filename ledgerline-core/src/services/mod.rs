//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on one step of getting a statement into the books.

pub mod balance;
pub mod dedup;
pub mod enrichment;
pub mod import;
pub mod migration;
pub mod summary;

pub use balance::{closing_balance, compute_running_balance, round_cents, BalanceService, RebalanceResult};
pub use dedup::{
    find_duplicates, find_duplicates_within, is_same_event, DuplicateScanner, DuplicateStatus,
    ScanOutcome, ScanProgress,
};
pub use enrichment::{apply_classification, EnrichmentReport, EnrichmentService, VendorCache};
pub use import::{ImportReport, ImportRequest, ImportService, ImportSettings};
pub use migration::{MigrationResult, MigrationService};
pub use summary::{summarize, CategoryTotal, FinancialSummary, MonthlyTotals, SummaryOptions};
