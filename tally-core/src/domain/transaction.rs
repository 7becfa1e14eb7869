//! Transaction domain model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::category::Category;
use super::result::{Error, Result};

/// Scale used when storing transaction values (DECIMAL(18,2))
pub const VALUE_SCALE: u32 = 2;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Earnings, increases the balance
    Income,
    /// Expense, reduces the balance
    Outcome,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Outcome => "outcome",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let kind = s.trim();
        if kind.eq_ignore_ascii_case("income") {
            Ok(TransactionType::Income)
        } else if kind.eq_ignore_ascii_case("outcome") {
            Ok(TransactionType::Outcome)
        } else {
            Err(Error::validation(format!(
                "Invalid transaction type '{}': expected 'income' or 'outcome'",
                kind
            )))
        }
    }
}

/// A single recorded financial event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub title: String,
    /// Non-negative magnitude; the direction comes from `kind`
    pub value: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category_id: Option<Uuid>,
    /// Hydrated category, present when the transaction has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction with a fresh id
    pub fn new(title: impl Into<String>, value: Decimal, kind: TransactionType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            value: normalize_value(value),
            kind,
            category_id: None,
            category: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a category, keeping `category_id` in sync
    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.category_id = category.as_ref().map(|c| c.id);
        self.category = category;
        self
    }

    /// Signed contribution of this transaction to the balance
    pub fn signed_value(&self) -> Decimal {
        match self.kind {
            TransactionType::Income => self.value,
            TransactionType::Outcome => -self.value,
        }
    }
}

/// Request to create a single transaction
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub title: String,
    pub value: Decimal,
    pub kind: TransactionType,
    /// Category title; resolved or created on insert
    pub category: String,
}

impl NewTransaction {
    pub fn new(
        title: impl Into<String>,
        value: Decimal,
        kind: TransactionType,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            value,
            kind,
            category: category.into(),
        }
    }

    /// Check caller preconditions, returning a trimmed copy
    pub fn validated(&self) -> Result<Self> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::validation("Transaction title must not be empty"));
        }
        if self.value < Decimal::ZERO {
            return Err(Error::validation("Transaction value must not be negative"));
        }
        let category = self.category.trim();
        if category.is_empty() {
            return Err(Error::validation("Category title must not be empty"));
        }
        Ok(Self {
            title: title.to_string(),
            value: normalize_value(self.value),
            kind: self.kind,
            category: category.to_string(),
        })
    }
}

/// Round a value to the stored scale
pub fn normalize_value(value: Decimal) -> Decimal {
    value.round_dp(VALUE_SCALE)
}
