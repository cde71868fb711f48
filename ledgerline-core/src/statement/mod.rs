//! Bank statement CSV handling
//!
//! Raw CSV text goes in, typed [`Transaction`](crate::domain::Transaction)s and
//! human-readable warnings come out. Header cells are matched heuristically
//! since every bank names its columns differently.

mod columns;
mod export;
mod parser;
mod structure;

use thiserror::Error;

pub use columns::{detect_columns, AmountColumns, ColumnMapping, ColumnRef, ColumnSource};
pub use export::{export_csv, EXPORT_HEADERS};
pub use parser::{parse_csv, ParseOptions, ParseResult};
pub use structure::{validate_structure, StructureReport};

/// Why a CSV file cannot be imported at all.
///
/// The `Display` text is shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("CSV file is empty")]
    Empty,

    #[error("CSV file has no header row")]
    NoHeader,

    #[error("CSV file has no data rows")]
    NoDataRows,

    #[error("CSV is missing required columns: date, description, amount")]
    MissingAllRequired,

    #[error("CSV is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),

    #[error("CSV is missing a date column")]
    MissingDate,

    #[error("CSV is missing a description column")]
    MissingDescription,

    #[error("CSV is missing an amount column")]
    MissingAmount,

    #[error("CSV could not be read: {0}")]
    Unreadable(String),
}

/// One data row as the tokenizer produced it, before any typing.
///
/// Cells are addressed by header position and come back trimmed. Rows never
/// leave this module.
pub(crate) struct RawRow {
    number: usize,
    record: csv::StringRecord,
}

impl RawRow {
    pub(crate) fn new(number: usize, record: csv::StringRecord) -> Self {
        Self { number, record }
    }

    /// 1-based data row number, header excluded
    pub(crate) fn number(&self) -> usize {
        self.number
    }

    /// Trimmed cell at `index`, `None` when the row is too short
    pub(crate) fn cell(&self, index: usize) -> Option<&str> {
        self.record.get(index).map(str::trim)
    }

    /// Trimmed, non-empty cell at `index`
    pub(crate) fn value(&self, index: usize) -> Option<&str> {
        self.cell(index).filter(|s| !s.is_empty())
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.record.iter().all(|c| c.trim().is_empty())
    }
}
