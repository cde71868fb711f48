//! Transactions -> CSV

use crate::domain::result::{Error, Result};
use crate::domain::Transaction;

pub const EXPORT_HEADERS: [&str; 7] =
    ["date", "description", "amount", "category", "type", "vendor", "balance"];

/// Serialize transactions in the given order. Fields with commas, quotes or
/// newlines are quoted the standard way.
pub fn export_csv(transactions: &[Transaction]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(EXPORT_HEADERS)?;

    for tx in transactions {
        writer.write_record([
            tx.date_string(),
            tx.description.clone(),
            tx.amount.to_string(),
            tx.category.clone().unwrap_or_default(),
            tx.transaction_type.map(|t| t.as_str().to_string()).unwrap_or_default(),
            tx.vendor.clone().unwrap_or_default(),
            tx.balance.map(|b| b.to_string()).unwrap_or_default(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Other(format!("Failed to flush CSV export: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::Other(format!("CSV export is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionType;
    use crate::statement::{parse_csv, ParseOptions};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_export_quotes_commas_and_quotes() {
        let mut tx = Transaction::new(
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            "Coffee, \"large\"",
            dec!(-4.50),
        );
        tx.transaction_type = Some(TransactionType::Expense);
        tx.vendor = Some("Starbucks".to_string());
        tx.balance = Some(dec!(995.50));

        let out = export_csv(&[tx]).unwrap();
        assert_eq!(
            out,
            "date,description,amount,category,type,vendor,balance\n\
             2024-01-05,\"Coffee, \"\"large\"\"\",-4.50,,expense,Starbucks,995.50\n"
        );
    }

    #[test]
    fn test_export_empty_list_is_header_only() {
        assert_eq!(
            export_csv(&[]).unwrap(),
            "date,description,amount,category,type,vendor,balance\n"
        );
    }

    #[test]
    fn test_export_reads_back() {
        let parsed = parse_csv(
            "Date,Description,Amount\n2024-01-05,\"A, B\",-4.50\n2024-01-06,Pay,100\n",
            &ParseOptions::default(),
        );
        let out = export_csv(&parsed.transactions).unwrap();
        let again = parse_csv(&out, &ParseOptions::default());
        assert_eq!(again.transactions.len(), 2);
        assert_eq!(again.transactions[0].description, "A, B");
        assert_eq!(again.transactions[1].amount, dec!(100));
    }
}
