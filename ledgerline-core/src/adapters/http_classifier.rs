//! HTTP vendor classifier client
//!
//! POSTs `{"description", "existingVendors"}` as JSON and expects
//! `{"vendor", "category"?, "type"?, "statementType"?, "confidence"}` back.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ClassifierConfig;
use crate::domain::result::{Error, Result};
use crate::domain::{Classification, StatementType, TransactionType};
use crate::ports::VendorClassifier;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyRequest<'a> {
    description: &'a str,
    existing_vendors: &'a [String],
}

/// Response as sent; labels are checked after parsing so one odd label
/// doesn't throw away the vendor
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyResponse {
    vendor: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(rename = "type", default)]
    transaction_type: Option<String>,
    #[serde(default)]
    statement_type: Option<String>,
    confidence: f64,
}

impl ClassifyResponse {
    fn into_classification(self) -> Result<Classification> {
        let vendor = self.vendor.trim().to_string();
        if vendor.is_empty() {
            return Err(Error::classifier("response has an empty vendor"));
        }
        if !self.confidence.is_finite() {
            return Err(Error::classifier("response confidence is not a number"));
        }
        Ok(Classification {
            vendor,
            category: self.category.filter(|c| !c.trim().is_empty()),
            transaction_type: self
                .transaction_type
                .and_then(|t| TransactionType::from_str(&t).ok()),
            statement_type: self
                .statement_type
                .and_then(|t| StatementType::from_str(&t).ok()),
            confidence: self.confidence.clamp(0.0, 1.0),
        })
    }
}

pub struct HttpClassifier {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpClassifier {
    pub fn new(endpoint: Url, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| Error::Config("classifier token contains invalid characters".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::classifier(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// Build from config; `None` when no endpoint is configured
    pub fn from_config(config: &ClassifierConfig) -> Result<Option<Self>> {
        match &config.endpoint {
            Some(endpoint) => Ok(Some(Self::new(
                endpoint.clone(),
                config.token.as_deref(),
                config.timeout,
            )?)),
            None => Ok(None),
        }
    }

    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::classifier(format!("timed out after {} seconds", self.timeout.as_secs()))
        } else if error.is_connect() {
            Error::classifier(format!("unable to connect to {}", self.endpoint))
        } else {
            Error::classifier(format!("request failed: {}", error))
        }
    }
}

#[async_trait]
impl VendorClassifier for HttpClassifier {
    fn name(&self) -> &str {
        "http"
    }

    async fn classify(
        &self,
        description: &str,
        existing_vendor_names: &[String],
    ) -> Result<Classification> {
        let body = ClassifyRequest {
            description,
            existing_vendors: existing_vendor_names,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::classifier(format!("HTTP {}", status.as_u16())));
        }

        let payload: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| Error::classifier(format!("unreadable response: {}", e)))?;
        payload.into_classification()
    }
}
