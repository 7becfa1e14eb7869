//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case and receives its repository at construction.

mod category;
pub mod import;
pub mod logging;
pub mod migration;
mod transaction;

pub use category::CategoryService;
pub use import::{ImportOptions, ImportResult, ImportService};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use transaction::{TransactionList, TransactionService};
