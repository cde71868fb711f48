//! Import command - import transactions from a statement CSV

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use ledgerline_core::services::{ImportRequest, VendorCache};
use rust_decimal::Decimal;

use super::{get_context, read_statement};
use crate::output;

const PREVIEW_ROWS: usize = 10;

pub struct ImportArgs {
    pub file: PathBuf,
    pub account: Option<String>,
    pub initial_balance: Option<Decimal>,
    pub ending_balance: Option<Decimal>,
    pub enrich: bool,
    pub preview: bool,
}

fn scan_progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::with_template("{spinner} Checking for duplicates {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

pub async fn run(args: ImportArgs, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let text = read_statement(&args.file)?;

    let request = ImportRequest {
        bank_account_id: args.account,
        initial_balance: args.initial_balance,
        stated_ending_balance: args.ending_balance,
        enrich: args.enrich,
        preview: args.preview,
    };

    let bar = if json { ProgressBar::hidden() } else { scan_progress_bar() };
    let progress = |checked: usize, total: usize| {
        bar.set_length(total as u64);
        bar.set_position(checked as u64);
    };

    let mut cache = VendorCache::new();
    let report = ctx
        .import_service
        .import_csv(&text, &request, &mut cache, Some(&progress))
        .await;
    bar.finish_and_clear();
    let report = report?;

    if json {
        return output::json(&report);
    }

    if report.preview {
        println!("{}", "PREVIEW MODE - No changes applied".yellow());
        println!();
        output::print_transactions(&report.transactions, PREVIEW_ROWS);
    } else {
        output::success("Import complete");
    }

    println!();
    println!("  Imported: {}", report.imported);
    println!("  Duplicates: {}", report.duplicates.len());
    println!("  Skipped rows: {}", report.skipped_rows);
    if report.duplicate_status_unknown > 0 {
        println!("  Not checked for duplicates: {}", report.duplicate_status_unknown);
    }
    if let Some(enrichment) = &report.enrichment {
        println!(
            "  Vendors: {} classified, {} from cache, {} failed",
            enrichment.enriched, enrichment.from_cache, enrichment.failed
        );
    }
    println!("  Opening balance: {:.2}", report.opening_balance);
    println!("  Closing balance: {:.2}", report.closing_balance);
    if report.rebalanced > 0 {
        println!("  Later balances recomputed: {}", report.rebalanced);
    }

    if let Some(rec) = &report.reconciliation {
        if rec.reconciled {
            output::success("  Reconciled with statement");
        } else {
            output::warning(&format!("  Off by {:.2}", rec.difference));
        }
    }

    output::print_warnings(&report.warnings);
    Ok(())
}
