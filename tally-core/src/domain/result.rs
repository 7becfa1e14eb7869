//! Result and error types for the core library

use rust_decimal::Decimal;
use thiserror::Error;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    /// An outcome would push the balance below zero
    #[error("You do not have enough balance (balance: {balance}, requested: {requested})")]
    InsufficientBalance { balance: Decimal, requested: Decimal },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn is_insufficient_balance(&self) -> bool {
        matches!(self, Self::InsufficientBalance { .. })
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_balance_message() {
        let err = Error::InsufficientBalance {
            balance: Decimal::new(1000, 2),
            requested: Decimal::new(2500, 2),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("You do not have enough balance"));
        assert!(msg.contains("10.00"));
        assert!(msg.contains("25.00"));
        assert!(err.is_insufficient_balance());
    }

    #[test]
    fn test_constructors() {
        assert!(matches!(Error::validation("bad"), Error::Validation(m) if m == "bad"));
        assert!(matches!(Error::not_found("x"), Error::NotFound(_)));
        assert!(!Error::database("locked").is_insufficient_balance());
    }
}
