//! Vendor/category enrichment through a [`VendorClassifier`]

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::vendor::comparison_key;
use crate::domain::{Classification, Transaction};
use crate::ports::VendorClassifier;

/// Classifications below or at this confidence only set the vendor
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.85;

/// Classifications already obtained in this session, keyed by description.
///
/// Owned by the caller and passed into each enrichment run, so separate runs
/// never share state unless the caller wants them to.
#[derive(Debug, Default, Clone)]
pub struct VendorCache {
    entries: HashMap<String, Classification>,
}

impl VendorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, description: &str) -> Option<&Classification> {
        self.entries.get(&comparison_key(description))
    }

    pub fn insert(&mut self, description: &str, classification: Classification) {
        self.entries.insert(comparison_key(description), classification);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentReport {
    pub enriched: usize,
    pub from_cache: usize,
    pub failed: usize,
    /// Already had a vendor, left alone
    pub skipped: usize,
}

/// Attach a classification to a transaction.
///
/// The vendor and confidence always land; category, type and statement type
/// only when the classifier is more sure than `min_confidence`.
pub fn apply_classification(tx: &mut Transaction, classification: &Classification, min_confidence: f64) {
    tx.vendor = Some(classification.vendor.clone());
    tx.confidence_score = Some(classification.confidence);

    if classification.confidence > min_confidence {
        if let Some(category) = &classification.category {
            tx.category = Some(category.clone());
        }
        if let Some(transaction_type) = classification.transaction_type {
            tx.transaction_type = Some(transaction_type);
        }
        if let Some(statement_type) = classification.statement_type {
            tx.statement_type = Some(statement_type);
        }
    }
}

pub struct EnrichmentService {
    classifier: Arc<dyn VendorClassifier>,
    min_confidence: f64,
}

impl EnrichmentService {
    pub fn new(classifier: Arc<dyn VendorClassifier>) -> Self {
        Self {
            classifier,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Classify each transaction that has no vendor yet.
    ///
    /// Classifier failures are logged and leave that transaction unenriched.
    pub async fn enrich(
        &self,
        transactions: &mut [Transaction],
        existing_vendor_names: &[String],
        cache: &mut VendorCache,
    ) -> EnrichmentReport {
        let mut report = EnrichmentReport::default();
        let mut known: Vec<String> = existing_vendor_names.to_vec();

        for (idx, tx) in transactions.iter_mut().enumerate() {
            if tx.vendor.is_some() {
                report.skipped += 1;
                continue;
            }

            if let Some(cached) = cache.get(&tx.description) {
                apply_classification(tx, cached, self.min_confidence);
                report.from_cache += 1;
                continue;
            }

            match self.classifier.classify(&tx.description, &known).await {
                Ok(classification) => {
                    apply_classification(tx, &classification, self.min_confidence);
                    if !known.contains(&classification.vendor) {
                        known.push(classification.vendor.clone());
                    }
                    cache.insert(&tx.description, classification);
                    report.enriched += 1;
                }
                Err(e) => {
                    warn!(
                        classifier = self.classifier.name(),
                        index = idx,
                        error = %e,
                        "Vendor classification failed"
                    );
                    report.failed += 1;
                }
            }
        }

        debug!(
            enriched = report.enriched,
            cached = report.from_cache,
            failed = report.failed,
            "Enrichment finished"
        );
        report
    }
}
