//! CLI command implementations

pub mod config;
pub mod export;
pub mod import;
pub mod parse;
pub mod rebalance;
pub mod reconcile;
pub mod summary;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ledgerline_core::LedgerlineContext;
use tracing::debug;

/// Get the ledgerline directory from environment or default
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("LEDGERLINE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory; set LEDGERLINE_DIR")?;
    Ok(home.join(".ledgerline"))
}

/// Get or create ledgerline context
pub fn get_context() -> Result<LedgerlineContext> {
    let data_dir = get_data_dir()?;

    // Create directory if it doesn't exist
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create ledgerline directory: {:?}", data_dir))?;

    debug!(data_dir = %data_dir.display(), "Opening ledgerline context");
    LedgerlineContext::new(&data_dir).context("Failed to initialize ledgerline context")
}

/// Read a statement file as text
pub fn read_statement(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
