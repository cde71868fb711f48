//! Integration tests for the DuckDB store
//!
//! These tests run the import and balance services against a real DuckDB
//! file in a temp directory.
//!
//! Run with: cargo test --test duckdb_store_tests -- --nocapture

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use tempfile::TempDir;

use ledgerline_core::adapters::duckdb::DuckDbStore;
use ledgerline_core::adapters::heuristic::HeuristicClassifier;
use ledgerline_core::ports::{TransactionStore, VendorClassifier};
use ledgerline_core::services::{
    BalanceService, ImportRequest, ImportService, ImportSettings, VendorCache,
};
use ledgerline_core::{Error, LedgerlineContext, Transaction};

// ============================================================================
// Test Helpers
// ============================================================================

const JANUARY: &str = "Date,Description,Debit,Credit,Balance\n\
                       01/05/2024,POS PURCHASE STARBUCKS COFFEE #12345,4.50,,995.50\n\
                       01/06/2024,Client Payment,,1500.00,2495.50\n";

const FEBRUARY: &str = "Date,Description,Debit,Credit\n\
                        01/06/2024,Client Payment,,1500.00\n\
                        02/01/2024,Rent,900.00,\n";

/// Create a test store with schema initialized
fn create_test_store(temp_dir: &TempDir) -> Arc<DuckDbStore> {
    let db_path = temp_dir.path().join("test.duckdb");
    let store = DuckDbStore::open(&db_path).expect("Failed to open store");
    store.ensure_schema().expect("Failed to initialize schema");
    Arc::new(store)
}

fn checking() -> ImportRequest {
    ImportRequest {
        bank_account_id: Some("checking".to_string()),
        ..Default::default()
    }
}

// ============================================================================
// Import Tests
// ============================================================================

#[tokio::test]
async fn test_import_twice_skips_duplicates_and_continues_balance() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let service = ImportService::new(store.clone(), ImportSettings::default());

    let first = ImportRequest {
        initial_balance: Some(dec!(1000.00)),
        ..checking()
    };
    let report = service
        .import_csv(JANUARY, &first, &mut VendorCache::new(), None)
        .await
        .unwrap();
    assert_eq!(report.imported, 2);
    assert_eq!(report.closing_balance, dec!(2495.50));

    let second = ImportRequest {
        stated_ending_balance: Some(dec!(1595.50)),
        ..checking()
    };
    let report = service
        .import_csv(FEBRUARY, &second, &mut VendorCache::new(), None)
        .await
        .unwrap();
    assert_eq!(report.imported, 1);
    assert_eq!(report.duplicates.len(), 1);
    assert_eq!(report.opening_balance, dec!(2495.50));
    assert_eq!(report.closing_balance, dec!(1595.50));
    assert!(report.reconciliation.unwrap().reconciled);

    assert_eq!(store.transaction_count().unwrap(), 3);
}

#[tokio::test]
async fn test_back_dated_import_rechains_later_balances() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let service = ImportService::new(store.clone(), ImportSettings::default());

    let rent = ImportRequest {
        initial_balance: Some(dec!(1000.00)),
        ..checking()
    };
    service
        .import_csv("Date,Description,Amount
2024-02-01,Rent,-900.00
", &rent, &mut VendorCache::new(), None)
        .await
        .unwrap();

    let report = service
        .import_csv("Date,Description,Amount
2024-01-15,Salary,3000.00
", &checking(), &mut VendorCache::new(), None)
        .await
        .unwrap();
    assert_eq!(report.imported, 1);
    assert_eq!(report.rebalanced, 1);
    assert_eq!(report.opening_balance, dec!(100.00));
    assert_eq!(report.closing_balance, dec!(3100.00));
    assert!(report.warnings.iter().any(|w| w.contains("predates 1 stored transactions")));

    let stored = store.list_transactions(Some("checking")).await.unwrap();
    let balances: Vec<_> = stored.iter().map(|t| (t.description.as_str(), t.balance)).collect();
    assert_eq!(
        balances,
        vec![("Salary", Some(dec!(3100.00))), ("Rent", Some(dec!(2200.00)))]
    );
    assert_eq!(store.latest_balance(Some("checking")).await.unwrap(), Some(dec!(2200.00)));
}

#[tokio::test]
async fn test_stored_values_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let service = ImportService::new(store.clone(), ImportSettings::default())
        .with_classifier(Arc::new(HeuristicClassifier::new()));

    let request = ImportRequest {
        initial_balance: Some(dec!(1000.00)),
        enrich: true,
        ..checking()
    };
    service
        .import_csv(JANUARY, &request, &mut VendorCache::new(), None)
        .await
        .unwrap();

    let stored = store.list_transactions(Some("checking")).await.unwrap();
    assert_eq!(stored.len(), 2);

    let coffee = &stored[0];
    assert_eq!(coffee.date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    assert_eq!(coffee.amount, dec!(-4.50));
    assert_eq!(coffee.balance, Some(dec!(995.50)));
    assert_eq!(coffee.vendor.as_deref(), Some("Starbucks Coffee"));
    assert!(!coffee.vendor_verified);
    assert_eq!(coffee.bank_account_id.as_deref(), Some("checking"));

    let names = store.vendor_names().await.unwrap();
    assert!(names.contains(&"Starbucks Coffee".to_string()));

    // Other accounts are separate
    assert!(store.list_transactions(Some("savings")).await.unwrap().is_empty());
    assert!(store.list_transactions(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_preview_leaves_database_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let service = ImportService::new(store.clone(), ImportSettings::default());

    let request = ImportRequest {
        preview: true,
        ..checking()
    };
    let report = service
        .import_csv(JANUARY, &request, &mut VendorCache::new(), None)
        .await
        .unwrap();
    assert_eq!(report.transactions.len(), 2);
    assert_eq!(store.transaction_count().unwrap(), 0);
}

// ============================================================================
// Balance Tests
// ============================================================================

#[tokio::test]
async fn test_rebalance_rewrites_stored_balances() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let date = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();

    // Inserted out of date order and without balances
    let txs = vec![
        Transaction::new(date(10), "Groceries", dec!(-60.25)),
        Transaction::new(date(2), "Paycheck", dec!(2000.00)),
        Transaction::new(date(15), "Utilities", dec!(-120.10)),
    ];
    store.insert_transactions(&txs).await.unwrap();

    let balances = BalanceService::new(store.clone());
    let result = balances
        .update_transaction_balances(None, dec!(100.00))
        .await
        .unwrap();
    assert_eq!(result.updated, 3);
    assert_eq!(result.closing_balance, dec!(1919.65));

    let stored = store.list_transactions(None).await.unwrap();
    let got: Vec<_> = stored.iter().map(|t| t.balance.unwrap()).collect();
    assert_eq!(got, vec![dec!(2100.00), dec!(2039.75), dec!(1919.65)]);

    let rec = balances.reconcile_account(None, dec!(1919.66)).await.unwrap();
    assert!(rec.reconciled);
    let rec = balances.reconcile_account(None, dec!(1920.00)).await.unwrap();
    assert!(!rec.reconciled);
}

#[tokio::test]
async fn test_reconcile_without_balances_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let err = BalanceService::new(store)
        .reconcile_account(Some("checking"), dec!(10.00))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

// ============================================================================
// Context Tests
// ============================================================================

#[test]
fn test_context_reopens_existing_database() {
    let temp_dir = TempDir::new().unwrap();
    {
        let ctx = LedgerlineContext::new(temp_dir.path()).unwrap();
        assert_eq!(ctx.store.transaction_count().unwrap(), 0);
    }
    let ctx = LedgerlineContext::new(temp_dir.path()).unwrap();
    assert_eq!(ctx.classifier.name(), "heuristic");
    let applied = ctx.store.run_migrations().unwrap();
    assert!(applied.applied.is_empty());
}
