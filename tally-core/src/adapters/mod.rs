//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the Repository port
//! - Process memory for the Repository port (tests and embedding)

pub mod duckdb;
pub mod memory;
