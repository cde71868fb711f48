//! Export command - stored transactions as CSV

use std::path::Path;

use anyhow::{Context, Result};
use ledgerline_core::ports::TransactionStore;
use ledgerline_core::statement::export_csv;

use super::get_context;
use crate::output;

pub async fn run(account: Option<&str>, output_path: Option<&Path>) -> Result<()> {
    let ctx = get_context()?;
    let transactions = ctx.store.list_transactions(account).await?;
    let csv = export_csv(&transactions)?;

    match output_path {
        Some(path) => {
            std::fs::write(path, csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            output::success(&format!(
                "Exported {} transactions to {}",
                transactions.len(),
                path.display()
            ));
        }
        None => print!("{}", csv),
    }
    Ok(())
}
