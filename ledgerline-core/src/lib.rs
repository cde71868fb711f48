//! Ledgerline Core - bank statement ingestion and reconciliation
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Transaction, dates, amounts, vendors)
//! - **statement**: CSV validation, column mapping, parsing and export
//! - **ports**: Trait definitions for external dependencies (TransactionStore, VendorClassifier)
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (DuckDB, in-memory, HTTP classifier)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod migrations;
pub mod ports;
pub mod services;
pub mod statement;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::duckdb::DuckDbStore;
use adapters::heuristic::HeuristicClassifier;
use adapters::http_classifier::HttpClassifier;
use config::Config;
use ports::{TransactionStore, VendorClassifier};
use services::{BalanceService, ImportService};

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use domain::{Classification, StatementType, Transaction, TransactionType};
pub use statement::{StructuralError, StructureReport};

/// Database file inside the data directory
pub const DB_FILENAME: &str = "ledgerline.duckdb";

/// Main context for ledgerline operations
///
/// Holds the store, resolved configuration and the services wired to them.
pub struct LedgerlineContext {
    pub config: Config,
    pub store: Arc<DuckDbStore>,
    pub classifier: Arc<dyn VendorClassifier>,
    pub import_service: ImportService,
    pub balance_service: BalanceService,
}

impl LedgerlineContext {
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;

        let db_path = data_dir.join(DB_FILENAME);
        let store = Arc::new(DuckDbStore::open(&db_path)?);
        store.ensure_schema().context("Failed to initialize database schema")?;

        // Without an endpoint, vendors still get extracted locally
        let classifier: Arc<dyn VendorClassifier> = match HttpClassifier::from_config(&config.classifier)? {
            Some(http) => Arc::new(http),
            None => Arc::new(HeuristicClassifier::new()),
        };

        let dyn_store: Arc<dyn TransactionStore> = store.clone();
        let import_service = ImportService::new(Arc::clone(&dyn_store), config.import_settings())
            .with_classifier(Arc::clone(&classifier));
        let balance_service =
            BalanceService::new(dyn_store).with_tolerance(config.reconciliation_tolerance);

        Ok(Self {
            config,
            store,
            classifier,
            import_service,
            balance_service,
        })
    }
}
