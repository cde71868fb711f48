//! Offline classifier: vendor name from the description text alone

use async_trait::async_trait;

use crate::domain::result::{Error, Result};
use crate::domain::vendor::{extract_vendor_name, match_existing_vendor};
use crate::domain::Classification;
use crate::ports::VendorClassifier;

/// Confidence for a name pulled out of the description
pub const EXTRACTED_CONFIDENCE: f64 = 0.7;
/// Confidence when the extracted name matches a vendor already on file
pub const MATCHED_CONFIDENCE: f64 = 0.9;

/// Extracts vendor names locally. Never assigns category or type, so its
/// results only ever set the vendor.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VendorClassifier for HeuristicClassifier {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn classify(
        &self,
        description: &str,
        existing_vendor_names: &[String],
    ) -> Result<Classification> {
        let extracted = extract_vendor_name(description).ok_or_else(|| {
            Error::classifier(format!("no vendor name found in '{}'", description.trim()))
        })?;

        Ok(match match_existing_vendor(&extracted, existing_vendor_names) {
            Some(known) => Classification::vendor_only(known, MATCHED_CONFIDENCE),
            None => Classification::vendor_only(extracted, EXTRACTED_CONFIDENCE),
        })
    }
}
