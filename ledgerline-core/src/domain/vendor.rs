//! Vendor classification types and local vendor-name extraction

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::transaction::{StatementType, TransactionType};

/// What a vendor classifier says about one transaction description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub vendor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<TransactionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_type: Option<StatementType>,
    /// 0.0 ..= 1.0
    pub confidence: f64,
}

impl Classification {
    pub fn vendor_only(vendor: impl Into<String>, confidence: f64) -> Self {
        Self {
            vendor: vendor.into(),
            category: None,
            transaction_type: None,
            statement_type: None,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

const PREFIXES: &[&str] = &[
    "POS PURCHASE", "CARD PURCHASE", "PURCHASE", "FNB PAYMENT", "EFT PAYMENT", "PAYMENT TO",
    "PYMT TO", "PAYMENT", "DEBIT ORDER", "DIRECT DEBIT", "ATM WITHDRAWAL", "TRANSFER",
    "CREDIT", "DEBIT", "POS", "TFR", "TRANSACTION", "DEP", "WDL", "ONLINE", "ACH",
    "DEPOSIT", "WITHDRAWAL", "CHQ", "CHEQUE", "CHECK", "CASH", "PMT", "STMT", "STATEMENT",
];

const SUFFIXES: &[&str] = &[
    r"\(PTY\) LTD", r"\(PTY\)", "ACCOUNT", "CARD", "PAYMENT", "DEBIT", "CREDIT", "TRANSFER",
    "TXN", "TRANSACTION", "WITHDRAW", "DEPOSIT", "FEE", "CHARGE", "SERVICE", "LLC", "INC",
    "LTD", "LIMITED", "PTY", "TECHNOLOGIES", "TECHNOLOGY", "SOLUTIONS", "CC", "VISA",
    "MASTERCARD", r"#\d+", r"\d+/\d+", r"\d+-\d+", r"\(\d+\)", r"REF\d+", r"ID:\d+",
    r"\*+\d+\*+", r"\d{6}\*+\d{4}", r"\d{2}/\d{2}/\d{2,4}",
];

const STOP_WORDS: &[&str] = &[
    "THE", "A", "AN", "AND", "OR", "AT", "ON", "IN", "TO", "FOR", "BY", "WITH", "FROM", "OF",
    "LTD", "LLC", "INC", "CO", "CORP", "CORPORATION", "PTY", "LIMITED", "PAYMENT", "TRANSFER",
    "TRANSACTION", "FEE", "CHARGE", "SERVICE", "REF", "REFERENCE", "ID", "NUM", "NUMBER",
    "DATE", "TIME", "AMOUNT",
];

struct VendorPatterns {
    prefixes: Vec<Regex>,
    suffixes: Vec<Regex>,
    noise: Vec<Regex>,
    separators: Regex,
}

fn patterns() -> &'static VendorPatterns {
    static PATTERNS: OnceLock<VendorPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |p: String| Regex::new(&p).expect("vendor pattern is a valid regex");
        VendorPatterns {
            prefixes: PREFIXES
                .iter()
                .map(|p| compile(format!(r"^{}\s+", regex::escape(p))))
                .collect(),
            suffixes: SUFFIXES.iter().map(|s| compile(format!(r"\s+{}$", s))).collect(),
            noise: [
                r"\b\d{5,}\b",
                r"\b[A-Z0-9]{10,}\b",
                r"REF:\s*\S+",
                r"\d{2}/\d{2}/\d{2,4}",
                r"\d+\.\d+",
                r"\(\d+\)",
            ]
            .iter()
            .map(|p| compile(p.to_string()))
            .collect(),
            separators: compile(r"[\\/\-\*:#]+".to_string()),
        }
    })
}

/// Pull a short vendor name out of a raw bank description.
///
/// `"POS PURCHASE STARBUCKS COFFEE #12345 SEATTLE"` -> `"Starbucks Coffee Seattle"`.
/// Returns `None` when nothing recognizable is left.
pub fn extract_vendor_name(description: &str) -> Option<String> {
    let p = patterns();
    let mut vendor = description.trim().to_uppercase();

    for prefix in &p.prefixes {
        vendor = prefix.replace(&vendor, "").into_owned();
    }
    for suffix in &p.suffixes {
        vendor = suffix.replace(&vendor, "").into_owned();
    }
    for noise in &p.noise {
        vendor = noise.replace_all(&vendor, "").into_owned();
    }
    vendor = p.separators.replace_all(&vendor, " ").into_owned();

    let words: Vec<String> = vendor
        .split_whitespace()
        .filter(|w| w.len() > 1)
        .filter(|w| !STOP_WORDS.contains(w))
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .take(3)
        .map(title_case)
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

/// Find a known vendor that names the same merchant as `candidate`
pub fn match_existing_vendor<'a>(candidate: &str, existing: &'a [String]) -> Option<&'a str> {
    let key = comparison_key(candidate);
    if key.is_empty() {
        return None;
    }
    existing
        .iter()
        .find(|name| comparison_key(name) == key)
        .map(String::as_str)
}

/// Lowercase alphanumerics only, used for cache keys and vendor comparison
pub fn comparison_key(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_banking_noise() {
        assert_eq!(
            extract_vendor_name("POS PURCHASE STARBUCKS COFFEE #12345").as_deref(),
            Some("Starbucks Coffee")
        );
        assert_eq!(
            extract_vendor_name("CARD PURCHASE AMAZON MKTPLACE 09/15/23").as_deref(),
            Some("Amazon Mktplace")
        );
        assert_eq!(
            extract_vendor_name("DIRECT DEBIT NETFLIX.COM REF:ABC123").as_deref(),
            Some("Netflix.com")
        );
    }

    #[test]
    fn test_keeps_at_most_three_words() {
        assert_eq!(
            extract_vendor_name("The Corner Bakery And Cafe Downtown").as_deref(),
            Some("Corner Bakery Cafe")
        );
    }

    #[test]
    fn test_nothing_left() {
        assert_eq!(extract_vendor_name(""), None);
        assert_eq!(extract_vendor_name("PAYMENT 1234567"), None);
    }

    #[test]
    fn test_match_existing_vendor() {
        let existing = vec!["Starbucks Coffee".to_string(), "Netflix".to_string()];
        assert_eq!(match_existing_vendor("STARBUCKS-COFFEE", &existing), Some("Starbucks Coffee"));
        assert_eq!(match_existing_vendor("Spotify", &existing), None);
        assert_eq!(match_existing_vendor("", &existing), None);
    }

    #[test]
    fn test_classification_deserializes_wire_shape() {
        let json = r#"{"vendor":"Uber","category":"Travel","type":"expense","statementType":"profit_loss","confidence":0.9}"#;
        let c: Classification = serde_json::from_str(json).unwrap();
        assert_eq!(c.vendor, "Uber");
        assert_eq!(c.transaction_type, Some(TransactionType::Expense));
        assert_eq!(c.statement_type, Some(StatementType::ProfitLoss));
    }
}
