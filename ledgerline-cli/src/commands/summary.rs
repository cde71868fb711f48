//! Summary command - totals by accounting type

use anyhow::Result;
use colored::Colorize;
use comfy_table::Cell;
use ledgerline_core::ports::TransactionStore;
use ledgerline_core::services::{summarize, CategoryTotal, SummaryOptions};

use super::get_context;
use crate::output::{self, money_cell};

fn category_table(title: &str, totals: &[CategoryTotal]) {
    if totals.is_empty() {
        return;
    }
    println!();
    println!("{}", title.bold());
    let mut table = output::create_table();
    table.set_header(vec!["Category", "Amount"]);
    for total in totals {
        table.add_row(vec![Cell::new(&total.category), money_cell(total.amount)]);
    }
    println!("{}", table);
}

pub async fn run(account: Option<&str>, verified_only: bool, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let transactions = ctx.store.list_transactions(account).await?;
    let summary = summarize(&transactions, SummaryOptions { verified_only });

    if json {
        return output::json(&summary);
    }

    println!("{}", "Financial Summary".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec![Cell::new("Income"), money_cell(summary.total_income)]);
    table.add_row(vec![Cell::new("Expenses"), money_cell(summary.total_expenses)]);
    table.add_row(vec![Cell::new("Net profit"), money_cell(summary.net_profit)]);
    table.add_row(vec![Cell::new("Assets"), money_cell(summary.total_assets)]);
    table.add_row(vec![Cell::new("Liabilities"), money_cell(summary.total_liabilities)]);
    table.add_row(vec![Cell::new("Equity"), money_cell(summary.total_equity)]);
    table.add_row(vec![Cell::new("Cash balance"), money_cell(summary.cash_balance)]);
    println!("{}", table);

    category_table("Expenses by category", &summary.expenses_by_category);
    category_table("Income by category", &summary.income_by_category);

    if !summary.monthly.is_empty() {
        println!();
        println!("{}", "Monthly".bold());
        let mut table = output::create_table();
        table.set_header(vec!["Month", "Income", "Expenses", "Net"]);
        for month in &summary.monthly {
            table.add_row(vec![
                Cell::new(&month.month),
                money_cell(month.income),
                money_cell(month.expenses),
                money_cell(month.net_income),
            ]);
        }
        println!("{}", table);
    }

    if summary.unclassified > 0 {
        println!();
        output::warning(&format!(
            "{} transactions have no type and are not counted",
            summary.unclassified
        ));
    }
    Ok(())
}
