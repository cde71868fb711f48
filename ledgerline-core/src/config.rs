//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "import": { "dateOrder": "monthFirst", "dateFallback": "skip", "dedupConcurrency": 8 },
//!   "reconciliation": { "tolerance": "0.02" },
//!   "classifier": { "endpoint": "https://...", "timeoutSecs": 10, "minConfidence": 0.85 }
//! }
//! ```
//! Keys this crate does not know about are kept when saving.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::domain::{DateFallback, DateOrder, DEFAULT_RECONCILIATION_TOLERANCE};
use crate::services::dedup::DEFAULT_DEDUP_CONCURRENCY;
use crate::services::enrichment::DEFAULT_MIN_CONFIDENCE;
use crate::services::ImportSettings;
use crate::statement::ParseOptions;

pub const SETTINGS_FILE: &str = "settings.json";

pub const ENV_DATE_ORDER: &str = "LEDGERLINE_DATE_ORDER";
pub const ENV_CLASSIFIER_URL: &str = "LEDGERLINE_CLASSIFIER_URL";
pub const ENV_CLASSIFIER_TOKEN: &str = "LEDGERLINE_CLASSIFIER_TOKEN";

const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u64 = 10;

/// Keys accepted by [`Config::set`] and listed by [`Config::entries`]
pub const KEYS: [&str; 7] = [
    "import.dateOrder",
    "import.dateFallback",
    "import.dedupConcurrency",
    "reconciliation.tolerance",
    "classifier.endpoint",
    "classifier.timeoutSecs",
    "classifier.minConfidence",
];

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    import: ImportSection,
    #[serde(default)]
    reconciliation: ReconciliationSection,
    #[serde(default)]
    classifier: ClassifierSection,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportSection {
    #[serde(default)]
    date_order: DateOrder,
    #[serde(default)]
    date_fallback: DateFallback,
    #[serde(default = "default_dedup_concurrency")]
    dedup_concurrency: usize,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

impl Default for ImportSection {
    fn default() -> Self {
        Self {
            date_order: DateOrder::default(),
            date_fallback: DateFallback::default(),
            dedup_concurrency: DEFAULT_DEDUP_CONCURRENCY,
            other: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReconciliationSection {
    #[serde(default = "default_tolerance")]
    tolerance: Decimal,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

impl Default for ReconciliationSection {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_RECONCILIATION_TOLERANCE,
            other: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassifierSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default = "default_min_confidence")]
    min_confidence: f64,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: DEFAULT_CLASSIFIER_TIMEOUT_SECS,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            other: HashMap::new(),
        }
    }
}

fn default_dedup_concurrency() -> usize {
    DEFAULT_DEDUP_CONCURRENCY
}

fn default_tolerance() -> Decimal {
    DEFAULT_RECONCILIATION_TOLERANCE
}

fn default_timeout_secs() -> u64 {
    DEFAULT_CLASSIFIER_TIMEOUT_SECS
}

fn default_min_confidence() -> f64 {
    DEFAULT_MIN_CONFIDENCE
}

/// Where and how to reach the HTTP vendor classifier
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub endpoint: Option<Url>,
    /// From the environment only, never written to disk
    pub token: Option<String>,
    pub timeout: Duration,
    pub min_confidence: f64,
}

/// Resolved configuration: settings.json plus environment overrides
#[derive(Debug, Clone)]
pub struct Config {
    pub date_order: DateOrder,
    pub date_fallback: DateFallback,
    pub dedup_concurrency: usize,
    pub reconciliation_tolerance: Decimal,
    pub classifier: ClassifierConfig,
    // File contents, written back by save()
    settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            date_order: DateOrder::default(),
            date_fallback: DateFallback::default(),
            dedup_concurrency: DEFAULT_DEDUP_CONCURRENCY,
            reconciliation_tolerance: DEFAULT_RECONCILIATION_TOLERANCE,
            classifier: ClassifierConfig {
                endpoint: None,
                token: None,
                timeout: Duration::from_secs(DEFAULT_CLASSIFIER_TIMEOUT_SECS),
                min_confidence: DEFAULT_MIN_CONFIDENCE,
            },
            settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the data directory, applying `LEDGERLINE_*` overrides
    pub fn load(data_dir: &Path) -> Result<Self> {
        Self::resolve(read_settings(data_dir)?, |key| std::env::var(key).ok())
    }

    /// Like [`load`](Self::load) but with a custom environment, for tests
    pub fn load_with_env<F>(data_dir: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::resolve(read_settings(data_dir)?, env)
    }

    fn resolve<F>(settings: SettingsFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let date_order = match env(ENV_DATE_ORDER) {
            Some(raw) => DateOrder::from_str(&raw)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Invalid {}", ENV_DATE_ORDER))?,
            None => settings.import.date_order,
        };

        let endpoint = env(ENV_CLASSIFIER_URL)
            .or_else(|| settings.classifier.endpoint.clone())
            .filter(|s| !s.trim().is_empty())
            .map(|raw| parse_endpoint(&raw))
            .transpose()?;

        if settings.reconciliation.tolerance.is_sign_negative() {
            bail!("reconciliation.tolerance must not be negative");
        }
        if !(0.0..=1.0).contains(&settings.classifier.min_confidence) {
            bail!("classifier.minConfidence must be between 0 and 1");
        }

        Ok(Self {
            date_order,
            date_fallback: settings.import.date_fallback,
            dedup_concurrency: settings.import.dedup_concurrency.max(1),
            reconciliation_tolerance: settings.reconciliation.tolerance,
            classifier: ClassifierConfig {
                endpoint,
                token: env(ENV_CLASSIFIER_TOKEN).filter(|t| !t.is_empty()),
                timeout: Duration::from_secs(settings.classifier.timeout_secs.max(1)),
                min_confidence: settings.classifier.min_confidence,
            },
            settings,
        })
    }

    /// Save config to the data directory.
    ///
    /// Keys this crate doesn't manage are preserved; environment overrides
    /// are not persisted.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let mut settings = read_settings(data_dir)?;
        settings.import.date_order = self.settings.import.date_order;
        settings.import.date_fallback = self.settings.import.date_fallback;
        settings.import.dedup_concurrency = self.settings.import.dedup_concurrency;
        settings.reconciliation.tolerance = self.settings.reconciliation.tolerance;
        settings.classifier.endpoint = self.settings.classifier.endpoint.clone();
        settings.classifier.timeout_secs = self.settings.classifier.timeout_secs;
        settings.classifier.min_confidence = self.settings.classifier.min_confidence;

        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(data_dir.join(SETTINGS_FILE), content)?;
        Ok(())
    }

    /// Update one setting by its dotted key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "import.dateOrder" => {
                let order = DateOrder::from_str(value).map_err(anyhow::Error::msg)?;
                self.settings.import.date_order = order;
                self.date_order = order;
            }
            "import.dateFallback" => {
                let fallback = match value.to_lowercase().as_str() {
                    "skip" => DateFallback::Skip,
                    "today" => DateFallback::Today,
                    other => bail!("Unknown date fallback: {} (expected skip or today)", other),
                };
                self.settings.import.date_fallback = fallback;
                self.date_fallback = fallback;
            }
            "import.dedupConcurrency" => {
                let n: usize = value.parse().context("dedupConcurrency must be a positive integer")?;
                if n == 0 {
                    bail!("dedupConcurrency must be at least 1");
                }
                self.settings.import.dedup_concurrency = n;
                self.dedup_concurrency = n;
            }
            "reconciliation.tolerance" => {
                let tolerance = Decimal::from_str(value).context("tolerance must be a decimal number")?;
                if tolerance.is_sign_negative() {
                    bail!("reconciliation.tolerance must not be negative");
                }
                self.settings.reconciliation.tolerance = tolerance;
                self.reconciliation_tolerance = tolerance;
            }
            "classifier.endpoint" => {
                if value.is_empty() {
                    self.settings.classifier.endpoint = None;
                    self.classifier.endpoint = None;
                } else {
                    self.classifier.endpoint = Some(parse_endpoint(value)?);
                    self.settings.classifier.endpoint = Some(value.to_string());
                }
            }
            "classifier.timeoutSecs" => {
                let secs: u64 = value.parse().context("timeoutSecs must be a positive integer")?;
                self.settings.classifier.timeout_secs = secs.max(1);
                self.classifier.timeout = Duration::from_secs(secs.max(1));
            }
            "classifier.minConfidence" => {
                let min: f64 = value.parse().context("minConfidence must be a number")?;
                if !(0.0..=1.0).contains(&min) {
                    bail!("classifier.minConfidence must be between 0 and 1");
                }
                self.settings.classifier.min_confidence = min;
                self.classifier.min_confidence = min;
            }
            other => bail!("Unknown setting: {} (known: {})", other, KEYS.join(", ")),
        }
        Ok(())
    }

    /// Effective value of every known key
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let order = match self.date_order {
            DateOrder::MonthFirst => "monthFirst",
            DateOrder::DayFirst => "dayFirst",
        };
        let fallback = match self.date_fallback {
            DateFallback::Skip => "skip",
            DateFallback::Today => "today",
        };
        vec![
            (KEYS[0], order.to_string()),
            (KEYS[1], fallback.to_string()),
            (KEYS[2], self.dedup_concurrency.to_string()),
            (KEYS[3], self.reconciliation_tolerance.to_string()),
            (
                KEYS[4],
                self.classifier
                    .endpoint
                    .as_ref()
                    .map(Url::to_string)
                    .unwrap_or_default(),
            ),
            (KEYS[5], self.classifier.timeout.as_secs().to_string()),
            (KEYS[6], self.classifier.min_confidence.to_string()),
        ]
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            date_order: self.date_order,
            date_fallback: self.date_fallback,
        }
    }

    pub fn import_settings(&self) -> ImportSettings {
        ImportSettings {
            parse: self.parse_options(),
            dedup_concurrency: self.dedup_concurrency,
            reconciliation_tolerance: self.reconciliation_tolerance,
            min_confidence: self.classifier.min_confidence,
        }
    }
}

fn read_settings(data_dir: &Path) -> Result<SettingsFile> {
    let path = data_dir.join(SETTINGS_FILE);
    if !path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "Ignoring unreadable settings file");
        SettingsFile::default()
    }))
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("Invalid classifier endpoint: {}", raw))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("Classifier endpoint must be http or https, got {}", other),
    }
}
