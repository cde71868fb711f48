//! Statement CSV -> transactions

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::columns::{detect_columns, AmountColumns, ColumnMapping};
use super::RawRow;
use crate::domain::{
    amount_from_debit_credit, parse_date, try_parse_amount, DateFallback, DateOrder, Transaction,
    TransactionType,
};

/// Knobs for [`parse_csv`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOptions {
    pub date_order: DateOrder,
    pub date_fallback: DateFallback,
}

/// Parsed transactions in file order plus everything worth telling the user
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub transactions: Vec<Transaction>,
    pub warnings: Vec<String>,
    /// Non-blank data rows that produced no transaction
    pub skipped_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<ColumnMapping>,
}

/// Parse statement CSV text.
///
/// Bad rows become warnings, never errors. A file the tokenizer cannot read
/// at all yields no transactions and a single warning.
pub fn parse_csv(text: &str, options: &ParseOptions) -> ParseResult {
    match parse_records(text, options) {
        Ok(result) => {
            debug!(
                parsed = result.transactions.len(),
                skipped = result.skipped_rows,
                warnings = result.warnings.len(),
                "Parsed statement CSV"
            );
            result
        }
        Err(e) => {
            warn!(error = %e, "Statement CSV could not be tokenized");
            ParseResult {
                warnings: vec![format!("Error parsing CSV: {}", e)],
                ..Default::default()
            }
        }
    }
}

fn parse_records(text: &str, options: &ParseOptions) -> Result<ParseResult, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mapping = detect_columns(&headers);
    let today = Local::now().date_naive();

    let mut result = ParseResult::default();
    for (field, index) in mapping.fallback_fields() {
        let header = headers.get(index).map(String::as_str).unwrap_or("");
        result.warnings.push(format!(
            "No {} column recognized, assuming column {} ('{}')",
            field,
            index + 1,
            header
        ));
    }

    for (i, record) in reader.records().enumerate() {
        let row = RawRow::new(i + 1, record?);
        if row.is_blank() {
            continue;
        }
        match parse_row(&row, &mapping, options, today, &mut result.warnings) {
            Some(tx) => result.transactions.push(tx),
            None => result.skipped_rows += 1,
        }
    }

    result.mapping = Some(mapping);
    Ok(result)
}

fn parse_row(
    row: &RawRow,
    mapping: &ColumnMapping,
    options: &ParseOptions,
    today: NaiveDate,
    warnings: &mut Vec<String>,
) -> Option<Transaction> {
    let n = row.number();

    let (raw_date, description) =
        match (row.value(mapping.date.index), row.value(mapping.description.index)) {
            (Some(date), Some(description)) => (date, description),
            _ => {
                warnings.push(format!("Skipped row {}: missing required data", n));
                return None;
            }
        };

    let date = match parse_date(raw_date, options.date_order) {
        Some(date) => date,
        None => match options.date_fallback {
            DateFallback::Skip => {
                warnings.push(format!("Skipped row {}: could not parse date '{}'", n, raw_date));
                return None;
            }
            DateFallback::Today => {
                warnings.push(format!(
                    "Row {}: could not parse date '{}', using today's date",
                    n, raw_date
                ));
                today
            }
        },
    };

    let amount = read_amount(row, mapping.amount, warnings);

    let mut tx = Transaction::new(date, description, amount);
    tx.transaction_type = Some(TransactionType::from_amount(amount));

    if let Some(raw) = mapping.balance.and_then(|i| row.value(i)) {
        match try_parse_amount(raw) {
            Some(balance) => tx.balance = Some(balance),
            None => warnings.push(format!("Row {}: ignored unreadable balance '{}'", n, raw)),
        }
    }
    tx.category = mapping
        .category
        .and_then(|i| row.value(i))
        .map(str::to_string);

    Some(tx)
}

fn read_amount(row: &RawRow, columns: AmountColumns, warnings: &mut Vec<String>) -> Decimal {
    let n = row.number();
    match columns {
        AmountColumns::Single(col) => {
            let raw = row.cell(col.index).unwrap_or("");
            try_parse_amount(raw).unwrap_or_else(|| {
                warnings.push(format!("Row {}: could not parse amount '{}', using 0", n, raw));
                Decimal::ZERO
            })
        }
        AmountColumns::DebitCredit { debit, credit } => {
            let debit = debit.and_then(|i| row.value(i));
            let credit = credit.and_then(|i| row.value(i));
            amount_from_debit_credit(debit, credit).unwrap_or_else(|| {
                warnings.push(format!("Row {}: no readable debit or credit amount, using 0", n));
                Decimal::ZERO
            })
        }
    }
}
