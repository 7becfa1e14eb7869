//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

pub mod balance;
mod category;
pub mod result;
mod transaction;

pub use balance::Balance;
pub use category::Category;
pub use transaction::{normalize_value, NewTransaction, Transaction, TransactionType};
