//! In-memory repository
//!
//! Keeps the ledger in process memory with the same constraints the DuckDB
//! schema enforces (unique category titles, category references must exist).
//! A unit of work runs against a copy of the state that replaces the
//! original only when the work succeeds.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Balance, Category, Transaction};
use crate::ports::{CategoryStore, LedgerSession, Repository, TransactionStore};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    categories: Vec<Category>,
    transactions: Vec<Transaction>,
}

/// Repository backed by plain vectors behind a mutex
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
    fail_transaction_inserts: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every transaction insert fail with a database error
    pub fn fail_transaction_inserts(&self, fail: bool) {
        self.fail_transaction_inserts.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }
}

impl Repository for MemoryRepository {
    fn atomically<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&dyn LedgerSession) -> Result<T>,
    {
        let mut state = self.lock()?;
        let session = MemorySession {
            state: RefCell::new(state.clone()),
            fail_transaction_inserts: self.fail_transaction_inserts.load(Ordering::SeqCst),
        };

        let value = work(&session)?;
        *state = session.state.into_inner();
        Ok(value)
    }

    fn delete_category(&self, id: Uuid) -> Result<bool> {
        let mut state = self.lock()?;
        let now = Utc::now();

        for tx in state.transactions.iter_mut().filter(|t| t.category_id == Some(id)) {
            tx.category_id = None;
            tx.category = None;
            tx.updated_at = now;
        }

        let before = state.categories.len();
        state.categories.retain(|c| c.id != id);
        Ok(state.categories.len() < before)
    }
}

struct MemorySession {
    state: RefCell<MemoryState>,
    fail_transaction_inserts: bool,
}

impl MemorySession {
    fn hydrate(&self, tx: &Transaction) -> Transaction {
        let state = self.state.borrow();
        let category = tx
            .category_id
            .and_then(|id| state.categories.iter().find(|c| c.id == id).cloned());
        Transaction {
            category,
            ..tx.clone()
        }
    }
}

impl CategoryStore for MemorySession {
    fn find_category_by_title(&self, title: &str) -> Result<Option<Category>> {
        Ok(self
            .state
            .borrow()
            .categories
            .iter()
            .find(|c| c.title == title)
            .cloned())
    }

    fn find_categories_by_titles(&self, titles: &[String]) -> Result<Vec<Category>> {
        Ok(self
            .state
            .borrow()
            .categories
            .iter()
            .filter(|c| titles.contains(&c.title))
            .cloned()
            .collect())
    }

    fn insert_category(&self, category: &Category) -> Result<()> {
        self.insert_categories(std::slice::from_ref(category))
    }

    fn insert_categories(&self, categories: &[Category]) -> Result<()> {
        let mut state = self.state.borrow_mut();
        for (i, category) in categories.iter().enumerate() {
            let clashes_stored = state.categories.iter().any(|c| c.title == category.title);
            let clashes_batch = categories[..i].iter().any(|c| c.title == category.title);
            if clashes_stored || clashes_batch {
                return Err(Error::database(format!(
                    "Duplicate key \"title: {}\" violates unique constraint",
                    category.title
                )));
            }
        }
        state.categories.extend(categories.iter().cloned());
        Ok(())
    }

    fn get_categories(&self) -> Result<Vec<Category>> {
        let mut categories = self.state.borrow().categories.clone();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }
}

impl TransactionStore for MemorySession {
    fn get_balance(&self) -> Result<Balance> {
        Ok(Balance::from_transactions(&self.state.borrow().transactions))
    }

    fn insert_transaction(&self, tx: &Transaction) -> Result<()> {
        self.insert_transactions(std::slice::from_ref(tx))
    }

    fn insert_transactions(&self, txs: &[Transaction]) -> Result<()> {
        if self.fail_transaction_inserts {
            return Err(Error::database("Transaction inserts are disabled"));
        }

        let mut state = self.state.borrow_mut();
        for tx in txs {
            if let Some(id) = tx.category_id {
                if !state.categories.iter().any(|c| c.id == id) {
                    return Err(Error::database(format!(
                        "Violates foreign key constraint: category {} does not exist",
                        id
                    )));
                }
            }
        }
        state.transactions.extend(txs.iter().cloned());
        Ok(())
    }

    fn get_transactions(&self) -> Result<Vec<Transaction>> {
        let mut txs: Vec<Transaction> = self
            .state
            .borrow()
            .transactions
            .iter()
            .map(|t| self.hydrate(t))
            .collect();
        txs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(txs)
    }

    fn get_transaction_by_id(&self, id: Uuid) -> Result<Option<Transaction>> {
        let found = self
            .state
            .borrow()
            .transactions
            .iter()
            .find(|t| t.id == id)
            .cloned();
        Ok(found.map(|t| self.hydrate(&t)))
    }

    fn delete_transaction(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.borrow_mut();
        let before = state.transactions.len();
        state.transactions.retain(|t| t.id != id);
        Ok(state.transactions.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionType;
    use rust_decimal::Decimal;

    #[test]
    fn test_duplicate_titles_rejected() {
        let repo = MemoryRepository::new();
        repo.atomically(|s| s.insert_category(&Category::new("Food"))).unwrap();

        let result = repo.atomically(|s| s.insert_category(&Category::new("Food")));
        assert!(matches!(result, Err(Error::Database(_))));

        let batch = repo.atomically(|s| {
            s.insert_categories(&[Category::new("Travel"), Category::new("Travel")])
        });
        assert!(batch.is_err());
        assert_eq!(repo.atomically(|s| s.get_categories()).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_category_reference_rejected() {
        let repo = MemoryRepository::new();
        let tx = Transaction::new("Lunch", Decimal::TEN, TransactionType::Outcome)
            .with_category(Some(Category::new("Never stored")));

        assert!(repo.atomically(|s| s.insert_transaction(&tx)).is_err());
    }

    #[test]
    fn test_error_discards_changes() {
        let repo = MemoryRepository::new();
        let result: Result<()> = repo.atomically(|s| {
            s.insert_transaction(&Transaction::new("Salary", Decimal::TEN, TransactionType::Income))?;
            Err(Error::validation("abort"))
        });

        assert!(result.is_err());
        assert!(repo.atomically(|s| s.get_transactions()).unwrap().is_empty());
    }

    #[test]
    fn test_delete_category_detaches_transactions() {
        let repo = MemoryRepository::new();
        let food = Category::new("Food");
        let tx = Transaction::new("Lunch", Decimal::TEN, TransactionType::Outcome)
            .with_category(Some(food.clone()));
        repo.atomically(|s| {
            s.insert_category(&food)?;
            s.insert_transaction(&tx)
        })
        .unwrap();

        assert!(repo.delete_category(food.id).unwrap());

        let stored = repo.atomically(|s| s.get_transaction_by_id(tx.id)).unwrap().unwrap();
        assert!(stored.category_id.is_none());
        assert!(stored.category.is_none());
    }
}
