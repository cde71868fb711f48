//! Parse command - show what a CSV file would import, without touching the database

use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use colored::Colorize;
use ledgerline_core::config::Config;
use ledgerline_core::domain::DateOrder;
use ledgerline_core::services::{closing_balance, compute_running_balance};
use ledgerline_core::statement::{parse_csv, validate_structure};
use rust_decimal::Decimal;

use super::{get_data_dir, read_statement};
use crate::output;

pub fn run(file: &Path, date_order: Option<&str>, limit: usize, json: bool) -> Result<()> {
    let config = Config::load(&get_data_dir()?)?;
    let mut options = config.parse_options();
    if let Some(order) = date_order {
        options.date_order = DateOrder::from_str(order).map_err(anyhow::Error::msg)?;
    }

    let text = read_statement(file)?;
    validate_structure(&text).into_result()?;
    let result = parse_csv(&text, &options);

    if json {
        return output::json(&result);
    }

    println!(
        "{} {} transactions, {} rows skipped",
        "Parsed".bold(),
        result.transactions.len(),
        result.skipped_rows
    );
    println!();

    let balanced = compute_running_balance(&result.transactions, Decimal::ZERO);
    output::print_transactions(&balanced, limit);
    println!();
    println!("  Net change: {:.2}", closing_balance(&balanced, Decimal::ZERO));

    output::print_warnings(&result.warnings);
    Ok(())
}
