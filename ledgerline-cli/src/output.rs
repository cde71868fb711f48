//! Output formatting utilities

use anyhow::Result;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, CellAlignment, ContentArrangement, Table};
use rust_decimal::Decimal;
use serde::Serialize;

use ledgerline_core::{OperationResult, Transaction};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Print `data` wrapped in a successful [`OperationResult`]
pub fn json<T: Serialize>(data: T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&OperationResult::ok(data))?);
    Ok(())
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Money with a sign and two decimals; negatives in red
pub fn money_cell(amount: Decimal) -> Cell {
    let text = format!("{:.2}", amount);
    let cell = Cell::new(&text).set_alignment(CellAlignment::Right);
    if amount.is_sign_negative() && !amount.is_zero() {
        cell.fg(comfy_table::Color::Red)
    } else {
        cell
    }
}

/// Table of transactions, at most `limit` rows
pub fn transaction_table(transactions: &[Transaction], limit: usize) -> Table {
    let mut table = create_table();
    table.set_header(vec!["Date", "Description", "Amount", "Balance", "Type", "Vendor"]);
    for tx in transactions.iter().take(limit) {
        table.add_row(vec![
            Cell::new(tx.date_string()),
            Cell::new(&tx.description),
            money_cell(tx.amount),
            tx.balance.map(money_cell).unwrap_or_else(|| Cell::new("-")),
            Cell::new(tx.transaction_type.map(|t| t.as_str()).unwrap_or("-")),
            Cell::new(tx.vendor.as_deref().unwrap_or("-")),
        ]);
    }
    table
}

/// Print a transaction table followed by a "... and N more" line when truncated
pub fn print_transactions(transactions: &[Transaction], limit: usize) {
    if transactions.is_empty() {
        println!("No transactions.");
        return;
    }
    println!("{}", transaction_table(transactions, limit));
    if transactions.len() > limit {
        println!("... and {} more", transactions.len() - limit);
    }
}

pub fn print_warnings(warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    println!();
    println!("{}", format!("Warnings ({})", warnings.len()).yellow().bold());
    for w in warnings {
        println!("  - {}", w);
    }
}
