//! Database migrations - embedded SQL files
//!
//! Migrations are compiled into the binary with `include_str!` and applied
//! in name order. Each one is recorded in `sys_migrations`.

/// All migrations as `(filename, sql)`.
///
/// New migrations get the next `NNN_description.sql` name and an entry here.
pub const MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("001_initial_schema.sql")),
];
