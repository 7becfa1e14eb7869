//! Tally Core - Business logic for a personal finance ledger
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Transaction, Category, Balance)
//! - **ports**: Store traits and the Repository unit-of-work abstraction
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (DuckDB, in-memory)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::duckdb::DuckDbRepository;
use config::Config;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{Balance, Category, NewTransaction, Transaction, TransactionType};
pub use services::{EntryPoint, LogEvent, LoggingService};

/// Database file name inside the tally directory
pub const DB_FILENAME: &str = "tally.duckdb";

/// Main context for Tally operations
///
/// Holds the configuration and every service wired to the ledger database.
pub struct TallyContext {
    pub config: Config,
    pub transaction_service: TransactionService<DuckDbRepository>,
    pub category_service: CategoryService<DuckDbRepository>,
    pub import_service: ImportService<DuckDbRepository>,
}

impl TallyContext {
    /// Open the ledger in `tally_dir`, creating the directory and schema as needed
    pub fn new(tally_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(tally_dir)
            .with_context(|| format!("Failed to create {}", tally_dir.display()))?;

        let config = Config::load(tally_dir)?;
        let import_options = config.import_options()?;

        let db_path = tally_dir.join(DB_FILENAME);
        let repository = Arc::new(DuckDbRepository::new(&db_path)?);

        // Initialize schema
        repository.ensure_schema()?;

        let transaction_service = TransactionService::new(Arc::clone(&repository));
        let category_service = CategoryService::new(Arc::clone(&repository));
        let import_service = ImportService::new(Arc::clone(&repository), import_options);

        Ok(Self {
            config,
            transaction_service,
            category_service,
            import_service,
        })
    }
}
