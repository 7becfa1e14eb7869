//! Database migrations - embedded SQL files
//!
//! Migrations are compiled into the binary at build time using include_str!.
//! Each migration is a tuple of (name, sql_content).
//! Migrations are sorted by name and applied in order.

/// All migrations, embedded at compile time.
/// Format: (filename, sql_content)
///
/// IMPORTANT: When adding a new migration:
/// 1. Create the SQL file: NNN_description.sql
/// 2. Add an entry here in order
pub const MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_create_categories.sql", include_str!("001_create_categories.sql")),
    ("002_create_transactions.sql", include_str!("002_create_transactions.sql")),
    (
        "003_add_category_id_to_transactions.sql",
        include_str!("003_add_category_id_to_transactions.sql"),
    ),
];
