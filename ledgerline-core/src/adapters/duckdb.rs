//! DuckDB transaction store

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use duckdb::{params, Connection};
use rust_decimal::Decimal;
use tracing::warn;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{StatementType, Transaction, TransactionType};
use crate::ports::TransactionStore;
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of attempts when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

const SELECT_COLUMNS: &str = "transaction_id, transaction_date::VARCHAR, description, \
     amount::VARCHAR, balance::VARCHAR, category, transaction_type, statement_type, vendor, \
     vendor_verified, confidence_score, is_verified, bank_account_id";

/// DuckDB-backed [`TransactionStore`]
pub struct DuckDbStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl DuckDbStore {
    /// Open (or create) a database file.
    ///
    /// Retries with exponential backoff while another process holds the file.
    pub fn open(db_path: &Path) -> Result<Self> {
        let mut attempt = 0;
        loop {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: Some(db_path.to_path_buf()),
                    })
                }
                Err(e) if is_retryable_error(&e.to_string()) && attempt + 1 < MAX_RETRIES => {
                    let delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                    warn!(
                        attempt = attempt + 1,
                        max = MAX_RETRIES,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Database busy, retrying"
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Throwaway database, mostly for previews and tests
    pub fn open_in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory_with_flags(config)?),
            db_path: None,
        })
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Cached extensions can fail code signing on macOS; nothing here needs them
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Apply pending schema migrations
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.lock()?;
        MigrationService::new(&conn).run_pending()
    }

    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    pub fn transaction_count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::database("connection lock poisoned"))
    }

    fn query_transactions(
        conn: &Connection,
        sql: &str,
        params: &[&dyn duckdb::ToSql],
    ) -> Result<Vec<Transaction>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, |row| {
                Ok(StoredRow {
                    id: row.get(0)?,
                    date: row.get(1)?,
                    description: row.get(2)?,
                    amount: row.get(3)?,
                    balance: row.get(4)?,
                    category: row.get(5)?,
                    transaction_type: row.get(6)?,
                    statement_type: row.get(7)?,
                    vendor: row.get(8)?,
                    vendor_verified: row.get(9)?,
                    confidence_score: row.get(10)?,
                    is_verified: row.get(11)?,
                    bank_account_id: row.get(12)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(Transaction::try_from).collect()
    }
}

/// A row exactly as DuckDB hands it back
struct StoredRow {
    id: String,
    date: String,
    description: String,
    amount: String,
    balance: Option<String>,
    category: Option<String>,
    transaction_type: Option<String>,
    statement_type: Option<String>,
    vendor: Option<String>,
    vendor_verified: bool,
    confidence_score: Option<f64>,
    is_verified: bool,
    bank_account_id: Option<String>,
}

impl TryFrom<StoredRow> for Transaction {
    type Error = Error;

    fn try_from(row: StoredRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| Error::database(format!("bad transaction id '{}': {}", row.id, e)))?;
        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
            .map_err(|e| Error::database(format!("bad date '{}': {}", row.date, e)))?;

        Ok(Transaction {
            id,
            date,
            description: row.description,
            amount: decimal_from_sql(&row.amount)?,
            balance: row.balance.as_deref().map(decimal_from_sql).transpose()?,
            category: row.category,
            // Unknown labels from older data are dropped rather than failing the read
            transaction_type: row.transaction_type.and_then(|t| TransactionType::from_str(&t).ok()),
            statement_type: row.statement_type.and_then(|t| StatementType::from_str(&t).ok()),
            vendor: row.vendor,
            vendor_verified: row.vendor_verified,
            confidence_score: row.confidence_score,
            is_verified: row.is_verified,
            bank_account_id: row.bank_account_id,
        })
    }
}

/// DECIMAL(18,4) comes back as `"-4.5000"`; keep cents, drop padding beyond
fn decimal_from_sql(raw: &str) -> Result<Decimal> {
    let mut value = Decimal::from_str(raw.trim())
        .map_err(|e| Error::database(format!("bad decimal '{}': {}", raw, e)))?
        .normalize();
    if value.scale() < 2 {
        value.rescale(2);
    }
    Ok(value)
}

#[async_trait]
impl TransactionStore for DuckDbStore {
    async fn find_by_date_and_description(
        &self,
        date: NaiveDate,
        description: &str,
    ) -> Result<Vec<Transaction>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM transactions
             WHERE transaction_date = CAST(? AS DATE) AND description = ?
             ORDER BY seq",
            SELECT_COLUMNS
        );
        let date = date.format("%Y-%m-%d").to_string();
        Self::query_transactions(&conn, &sql, &[&date, &description])
    }

    async fn insert_transactions(&self, transactions: &[Transaction]) -> Result<Vec<Transaction>> {
        let mut conn = self.lock()?;
        let db_tx = conn.transaction()?;
        let mut saved = Vec::with_capacity(transactions.len());
        {
            let mut stmt = db_tx.prepare(
                "INSERT INTO transactions (
                    transaction_id, bank_account_id, transaction_date, description, amount,
                    balance, category, transaction_type, statement_type, vendor,
                    vendor_verified, confidence_score, is_verified
                 ) VALUES (?, ?, CAST(? AS DATE), ?, CAST(? AS DECIMAL(18, 4)),
                           CAST(? AS DECIMAL(18, 4)), ?, ?, ?, ?, ?, ?, ?)",
            )?;
            for tx in transactions {
                let mut stored = tx.clone();
                stored.id = Uuid::new_v4();
                stmt.execute(params![
                    stored.id.to_string(),
                    stored.bank_account_id,
                    stored.date_string(),
                    stored.description,
                    stored.amount.to_string(),
                    stored.balance.map(|b| b.to_string()),
                    stored.category,
                    stored.transaction_type.map(|t| t.as_str()),
                    stored.statement_type.map(|t| t.as_str()),
                    stored.vendor,
                    stored.vendor_verified,
                    stored.confidence_score,
                    stored.is_verified,
                ])?;
                saved.push(stored);
            }
        }
        db_tx.commit()?;
        Ok(saved)
    }

    async fn list_transactions(&self, account: Option<&str>) -> Result<Vec<Transaction>> {
        let conn = self.lock()?;
        match account {
            Some(account) => {
                let sql = format!(
                    "SELECT {} FROM transactions WHERE bank_account_id = ?
                     ORDER BY transaction_date, seq",
                    SELECT_COLUMNS
                );
                Self::query_transactions(&conn, &sql, &[&account])
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM transactions WHERE bank_account_id IS NULL
                     ORDER BY transaction_date, seq",
                    SELECT_COLUMNS
                );
                Self::query_transactions(&conn, &sql, &[])
            }
        }
    }

    async fn update_balances(&self, balances: &[(Uuid, Decimal)]) -> Result<()> {
        let mut conn = self.lock()?;
        let db_tx = conn.transaction()?;
        {
            let mut stmt = db_tx.prepare(
                "UPDATE transactions SET balance = CAST(? AS DECIMAL(18, 4))
                 WHERE transaction_id = ?",
            )?;
            for (id, balance) in balances {
                stmt.execute(params![balance.to_string(), id.to_string()])?;
            }
        }
        db_tx.commit()?;
        Ok(())
    }

    async fn latest_balance(&self, account: Option<&str>) -> Result<Option<Decimal>> {
        let conn = self.lock()?;
        let filter = if account.is_some() {
            "bank_account_id = ?"
        } else {
            "bank_account_id IS NULL"
        };
        let sql = format!(
            "SELECT balance::VARCHAR FROM transactions
             WHERE {} AND balance IS NOT NULL
             ORDER BY transaction_date DESC, seq DESC
             LIMIT 1",
            filter
        );
        let mut stmt = conn.prepare(&sql)?;
        let latest: Option<String> = match account {
            Some(account) => stmt.query_map([account], |row| row.get(0))?.next().transpose()?,
            None => stmt.query_map([], |row| row.get(0))?.next().transpose()?,
        };
        latest.as_deref().map(decimal_from_sql).transpose()
    }

    async fn vendor_names(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT vendor FROM transactions WHERE vendor IS NOT NULL ORDER BY vendor",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }
}
