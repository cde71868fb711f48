//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. Services depend
//! only on these traits, never on a concrete store or classifier.

mod classifier;
mod store;

pub use classifier::VendorClassifier;
pub use store::TransactionStore;
