//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB and an in-memory list for the TransactionStore port
//! - An HTTP client and a local name extractor for VendorClassifier

pub mod duckdb;
pub mod heuristic;
pub mod http_classifier;
pub mod memory;
