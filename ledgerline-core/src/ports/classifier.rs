//! Vendor classifier port

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::Classification;

/// External vendor/category classifier
///
/// Callers treat any error as "no enrichment" and carry on.
#[async_trait]
pub trait VendorClassifier: Send + Sync {
    /// Short name for logs, e.g. "http" or "heuristic"
    fn name(&self) -> &str;

    /// Classify one transaction description. `existing_vendor_names` lets the
    /// classifier reuse a vendor the user already has instead of inventing a
    /// near-duplicate.
    async fn classify(
        &self,
        description: &str,
        existing_vendor_names: &[String],
    ) -> Result<Classification>;
}
