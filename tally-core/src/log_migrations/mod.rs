//! Log database migrations
//!
//! Embedded the same way as the ledger migrations and applied by
//! `LoggingService` through `MigrationService::with_migrations` when the
//! logs database is opened.

/// Log migrations in application order: (filename, sql_content)
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("001_initial_schema.sql")),
];
