//! Balance aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::transaction::{Transaction, TransactionType};

/// Sum of incomes minus sum of outcomes across the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balance {
    pub income: Decimal,
    pub outcome: Decimal,
    pub total: Decimal,
}

impl Balance {
    pub fn new(income: Decimal, outcome: Decimal) -> Self {
        Self {
            income,
            outcome,
            total: income - outcome,
        }
    }

    /// Aggregate a list of transactions
    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let (income, outcome) = transactions.into_iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(income, outcome), tx| match tx.kind {
                TransactionType::Income => (income + tx.value, outcome),
                TransactionType::Outcome => (income, outcome + tx.value),
            },
        );
        Self::new(income, outcome)
    }

    /// Whether an outcome of `value` keeps the total non-negative
    pub fn can_afford(&self, value: Decimal) -> bool {
        value <= self.total
    }
}
