//! Import service - statement CSV to stored transactions
//!
//! validate -> parse -> tag account -> drop duplicates -> enrich -> running
//! balance -> reconcile -> persist. Stored rows dated after the statement
//! start get their balances re-chained. Everything up to persisting also runs in
//! preview mode.

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::balance::{closing_balance, compute_running_balance};
use super::dedup::{find_duplicates_within, DuplicateScanner, ScanProgress, DEFAULT_DEDUP_CONCURRENCY};
use super::enrichment::{EnrichmentReport, EnrichmentService, VendorCache, DEFAULT_MIN_CONFIDENCE};
use crate::domain::result::Result;
use crate::domain::{
    check_reconciliation_with_tolerance, ReconciliationResult, Transaction,
    DEFAULT_RECONCILIATION_TOLERANCE,
};
use crate::ports::{TransactionStore, VendorClassifier};
use crate::statement::{parse_csv, validate_structure, ParseOptions};

/// Settings that stay fixed across imports
#[derive(Debug, Clone)]
pub struct ImportSettings {
    pub parse: ParseOptions,
    pub dedup_concurrency: usize,
    pub reconciliation_tolerance: Decimal,
    pub min_confidence: f64,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            parse: ParseOptions::default(),
            dedup_concurrency: DEFAULT_DEDUP_CONCURRENCY,
            reconciliation_tolerance: DEFAULT_RECONCILIATION_TOLERANCE,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

/// One import run
#[derive(Debug, Clone, Default)]
pub struct ImportRequest {
    pub bank_account_id: Option<String>,
    /// Defaults to the account's latest stored balance, then zero
    pub initial_balance: Option<Decimal>,
    /// Reconcile against this when given
    pub stated_ending_balance: Option<Decimal>,
    /// Run the classifier on new transactions
    pub enrich: bool,
    /// Do everything except write to the store
    pub preview: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// New transactions, date-ordered, with running balances
    pub transactions: Vec<Transaction>,
    pub duplicates: Vec<Transaction>,
    pub warnings: Vec<String>,
    pub skipped_rows: usize,
    pub duplicate_status_unknown: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichmentReport>,
    pub opening_balance: Decimal,
    pub closing_balance: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciliation: Option<ReconciliationResult>,
    /// Zero in preview mode
    pub imported: usize,
    /// Stored transactions whose balance moved because the statement
    /// predates them. Written only outside preview mode.
    pub rebalanced: usize,
    pub preview: bool,
}

pub struct ImportService {
    store: Arc<dyn TransactionStore>,
    classifier: Option<Arc<dyn VendorClassifier>>,
    settings: ImportSettings,
}

impl ImportService {
    pub fn new(store: Arc<dyn TransactionStore>, settings: ImportSettings) -> Self {
        Self {
            store,
            classifier: None,
            settings,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn VendorClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// Import statement CSV text.
    ///
    /// Fails only on structurally unusable CSV or a store error while reading
    /// the opening balance or writing. Row problems, failed duplicate lookups
    /// and classifier errors end up in `warnings`.
    pub async fn import_csv(
        &self,
        text: &str,
        request: &ImportRequest,
        cache: &mut VendorCache,
        progress: Option<ScanProgress<'_>>,
    ) -> Result<ImportReport> {
        validate_structure(text).into_result()?;

        let parsed = parse_csv(text, &self.settings.parse);
        let mut warnings = parsed.warnings;
        let mut incoming = parsed.transactions;
        for tx in &mut incoming {
            tx.bank_account_id = request.bank_account_id.clone();
        }

        let repeats = find_duplicates_within(&incoming);
        if !repeats.is_empty() {
            warnings.push(format!(
                "{} transactions appear more than once in this file",
                repeats.len()
            ));
        }

        let scan = DuplicateScanner::new(Arc::clone(&self.store))
            .with_concurrency(self.settings.dedup_concurrency)
            .scan(incoming, progress)
            .await;
        warnings.extend(scan.warnings);
        if !scan.duplicates.is_empty() {
            warnings.push(format!("{} duplicate transactions excluded", scan.duplicates.len()));
        }
        let mut kept = scan.kept;

        let enrichment = match (&self.classifier, request.enrich) {
            (Some(classifier), true) => Some(self.enrich(classifier, &mut kept, cache).await),
            (None, true) => {
                warnings.push("No classifier configured; skipped vendor enrichment".to_string());
                None
            }
            _ => None,
        };

        let account = request.bank_account_id.as_deref();
        let (prefix, later) = self.split_stored(account, &kept).await?;
        let opening_balance = match request.initial_balance {
            Some(balance) => balance,
            None => match prefix.iter().rev().find_map(|tx| tx.balance) {
                Some(balance) => balance,
                None => self.store.latest_balance(account).await?.unwrap_or(Decimal::ZERO),
            },
        };

        // Stored rows dated after the statement start are re-chained behind the
        // new ones; on equal dates stored rows stay first
        let later_ids: HashSet<Uuid> = later.iter().map(|tx| tx.id).collect();
        let merged: Vec<Transaction> = later.into_iter().chain(kept).collect();
        let (balanced, restated): (Vec<Transaction>, Vec<Transaction>) =
            compute_running_balance(&merged, opening_balance)
                .into_iter()
                .partition(|tx| !later_ids.contains(&tx.id));
        let rebalanced: Vec<(Uuid, Decimal)> = restated
            .iter()
            .filter_map(|tx| tx.balance.map(|b| (tx.id, b)))
            .collect();
        if !rebalanced.is_empty() {
            warnings.push(format!(
                "Statement predates {} stored transactions; their balances were recomputed",
                rebalanced.len()
            ));
        }
        let closing = closing_balance(&balanced, opening_balance);

        let reconciliation = request.stated_ending_balance.map(|stated| {
            check_reconciliation_with_tolerance(closing, stated, self.settings.reconciliation_tolerance)
        });
        if let Some(rec) = &reconciliation {
            if !rec.reconciled {
                warnings.push(format!(
                    "Balance does not reconcile: computed {} differs from statement by {}",
                    closing, rec.difference
                ));
            }
        }

        let (transactions, imported) = if request.preview {
            (balanced, 0)
        } else {
            let saved = self.store.insert_transactions(&balanced).await?;
            if !rebalanced.is_empty() {
                self.store.update_balances(&rebalanced).await?;
            }
            let count = saved.len();
            (saved, count)
        };

        info!(
            imported,
            duplicates = scan.duplicates.len(),
            skipped = parsed.skipped_rows,
            warnings = warnings.len(),
            rebalanced = rebalanced.len(),
            preview = request.preview,
            "Statement import finished"
        );

        Ok(ImportReport {
            transactions,
            duplicates: scan.duplicates,
            warnings,
            skipped_rows: parsed.skipped_rows,
            duplicate_status_unknown: scan.unknown,
            enrichment,
            opening_balance,
            closing_balance: closing,
            reconciliation,
            imported,
            rebalanced: rebalanced.len(),
            preview: request.preview,
        })
    }

    /// Stored account rows dated up to the statement's first day, and the
    /// rows after it whose balances a back-dated statement invalidates
    async fn split_stored(
        &self,
        account: Option<&str>,
        kept: &[Transaction],
    ) -> Result<(Vec<Transaction>, Vec<Transaction>)> {
        let Some(start) = kept.iter().map(|tx| tx.date).min() else {
            return Ok((Vec::new(), Vec::new()));
        };
        let stored = self.store.list_transactions(account).await?;
        Ok(stored.into_iter().partition(|tx| tx.date <= start))
    }

    async fn enrich(
        &self,
        classifier: &Arc<dyn VendorClassifier>,
        transactions: &mut [Transaction],
        cache: &mut VendorCache,
    ) -> EnrichmentReport {
        let existing = match self.store.vendor_names().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Could not load existing vendor names");
                Vec::new()
            }
        };
        EnrichmentService::new(Arc::clone(classifier))
            .with_min_confidence(self.settings.min_confidence)
            .enrich(transactions, &existing, cache)
            .await
    }
}
