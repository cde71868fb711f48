//! Transaction domain model

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Accounting type of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
    Asset,
    Liability,
    Equity,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
        }
    }

    /// Default type for a freshly parsed row: outflows are expenses
    pub fn from_amount(amount: Decimal) -> Self {
        if amount.is_sign_negative() && !amount.is_zero() {
            Self::Expense
        } else {
            Self::Income
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "asset" => Ok(Self::Asset),
            "liability" => Ok(Self::Liability),
            "equity" => Ok(Self::Equity),
            other => Err(format!("Unknown transaction type: {}", other)),
        }
    }
}

/// Which financial statement a transaction rolls up into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementType {
    ProfitLoss,
    BalanceSheet,
}

impl StatementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProfitLoss => "profit_loss",
            Self::BalanceSheet => "balance_sheet",
        }
    }
}

impl FromStr for StatementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "profit_loss" => Ok(Self::ProfitLoss),
            "balance_sheet" => Ok(Self::BalanceSheet),
            other => Err(format!("Unknown statement type: {}", other)),
        }
    }
}

/// A single bank statement transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Temporary for freshly parsed rows, replaced by the store on save
    pub id: Uuid,
    pub date: NaiveDate,
    pub description: String,
    /// Negative = outflow, positive = inflow
    pub amount: Decimal,
    /// Running balance immediately after this transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Decimal>,

    // =========================================================================
    // Enrichment (classifier or manual review)
    // =========================================================================
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<TransactionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_type: Option<StatementType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default)]
    pub vendor_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,

    /// Only set by explicit user action
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_account_id: Option<String>,
}

impl Transaction {
    /// Create a new transaction with required fields
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            description: description.into().trim().to_string(),
            amount,
            balance: None,
            category: None,
            transaction_type: None,
            statement_type: None,
            vendor: None,
            vendor_verified: false,
            confidence_score: None,
            is_verified: false,
            bank_account_id: None,
        }
    }

    /// Canonical `YYYY-MM-DD` rendering of the date
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// True once a classifier or reviewer has attached a vendor
    pub fn is_enriched(&self) -> bool {
        self.vendor.is_some()
    }
}
