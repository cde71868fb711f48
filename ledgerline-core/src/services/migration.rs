//! Migration service - manages database schema migrations
//!
//! Migrations are SQL files embedded at compile time. Each migration is
//! tracked in the sys_migrations table so re-running is a no-op.

use duckdb::Connection;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::result::Result;
use crate::migrations::MIGRATIONS;

const BOOTSTRAP: &str = "000_migrations.sql";

/// Result of running migrations
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationResult {
    /// Names of newly applied migrations
    pub applied: Vec<String>,
    /// Count of migrations that were already applied
    pub already_applied: usize,
}

/// Applies embedded migrations to a DuckDB connection
pub struct MigrationService<'a> {
    conn: &'a Connection,
}

impl<'a> MigrationService<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Run all pending migrations.
    ///
    /// Bootstraps `sys_migrations` on a fresh database, then applies every
    /// migration not yet recorded, in order.
    pub fn run_pending(&self) -> Result<MigrationResult> {
        let mut applied = Vec::new();

        if !self.migrations_table_exists()? {
            if let Some((name, sql)) = MIGRATIONS.iter().find(|(n, _)| *n == BOOTSTRAP) {
                self.conn.execute_batch(sql)?;
                self.record_migration(name)?;
                applied.push(name.to_string());
            }
        }

        let recorded = self.get_applied()?;
        let already_applied = recorded.len() - applied.len();

        for (name, sql) in MIGRATIONS.iter().filter(|(n, _)| *n != BOOTSTRAP) {
            if recorded.iter().any(|r| r.as_str() == *name) {
                continue;
            }
            debug!(migration = *name, "Applying migration");
            self.conn.execute_batch(sql)?;
            self.record_migration(name)?;
            applied.push(name.to_string());
        }

        if !applied.is_empty() {
            info!(count = applied.len(), "Applied database migrations");
        }

        Ok(MigrationResult { applied, already_applied })
    }

    fn migrations_table_exists(&self) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'sys_migrations'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Names of applied migrations, sorted
    pub fn get_applied(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT migration_name FROM sys_migrations ORDER BY migration_name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Names of migrations not yet applied
    pub fn get_pending(&self) -> Result<Vec<String>> {
        let applied = if self.migrations_table_exists()? {
            self.get_applied()?
        } else {
            Vec::new()
        };
        Ok(MIGRATIONS
            .iter()
            .filter(|(name, _)| !applied.iter().any(|a| a.as_str() == *name))
            .map(|(name, _)| name.to_string())
            .collect())
    }

    fn record_migration(&self, name: &str) -> Result<()> {
        self.conn
            .execute("INSERT INTO sys_migrations (migration_name) VALUES (?)", [name])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_run_on_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        let service = MigrationService::new(&conn);

        let result = service.run_pending().unwrap();
        assert_eq!(result.applied.len(), MIGRATIONS.len());
        assert_eq!(result.already_applied, 0);

        // Running again should apply nothing
        let again = service.run_pending().unwrap();
        assert!(again.applied.is_empty());
        assert_eq!(again.already_applied, MIGRATIONS.len());
    }

    #[test]
    fn test_get_pending_on_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        let service = MigrationService::new(&conn);
        assert_eq!(service.get_pending().unwrap().len(), MIGRATIONS.len());

        service.run_pending().unwrap();
        assert!(service.get_pending().unwrap().is_empty());
    }

    #[test]
    fn test_schema_has_transactions_table() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationService::new(&conn).run_pending().unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
