//! Validate command - check a CSV file's structure

use std::path::Path;

use anyhow::{bail, Result};
use colored::Colorize;
use ledgerline_core::statement::{detect_columns, validate_structure, AmountColumns, ColumnRef};

use super::read_statement;
use crate::output;

pub fn run(file: &Path, json: bool) -> Result<()> {
    let text = read_statement(file)?;
    let report = validate_structure(&text);

    if json {
        output::json(&report)?;
    } else if report.is_valid {
        output::success(&format!("{} can be imported", file.display()));
        println!();

        let mapping = detect_columns(&report.headers);
        let column = |r: ColumnRef| {
            let name = report.headers.get(r.index).map(String::as_str).unwrap_or("?");
            if r.is_detected() {
                name.to_string()
            } else {
                format!("{} {}", name, "(assumed)".yellow())
            }
        };
        let header = |idx: usize| report.headers.get(idx).cloned().unwrap_or_default();

        println!("  Date: {}", column(mapping.date));
        println!("  Description: {}", column(mapping.description));
        match mapping.amount {
            AmountColumns::Single(r) => println!("  Amount: {}", column(r)),
            AmountColumns::DebitCredit { debit, credit } => {
                if let Some(d) = debit {
                    println!("  Debit: {}", header(d));
                }
                if let Some(c) = credit {
                    println!("  Credit: {}", header(c));
                }
            }
        }
        if let Some(b) = mapping.balance {
            println!("  Balance: {}", header(b));
        }
        if let Some(c) = mapping.category {
            println!("  Category: {}", header(c));
        }
    }

    match report.error {
        Some(e) if !json => bail!(e),
        Some(_) => bail!("CSV is not valid"),
        None => Ok(()),
    }
}
