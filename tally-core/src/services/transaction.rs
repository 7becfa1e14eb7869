//! Transaction service - single creation with the balance rule

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Balance, Category, NewTransaction, Transaction, TransactionType};
use crate::ports::Repository;

/// Transactions together with the balance they add up to
#[derive(Debug, Serialize)]
pub struct TransactionList {
    pub transactions: Vec<Transaction>,
    pub balance: Balance,
}

/// Service for recording and inspecting individual transactions
pub struct TransactionService<R: Repository> {
    repository: Arc<R>,
}

impl<R: Repository> TransactionService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Record one transaction
    ///
    /// An outcome larger than the current balance is rejected with
    /// [`Error::InsufficientBalance`]. The category is looked up by title and
    /// created when missing. The balance check, the category insert and the
    /// transaction insert share one unit of work.
    pub fn create(&self, request: NewTransaction) -> Result<Transaction> {
        let request = request.validated()?;

        self.repository.atomically(|session| {
            let balance = session.get_balance()?;
            if request.kind == TransactionType::Outcome && !balance.can_afford(request.value) {
                return Err(Error::InsufficientBalance {
                    balance: balance.total,
                    requested: request.value,
                });
            }

            let category = match session.find_category_by_title(&request.category)? {
                Some(existing) => existing,
                None => {
                    let created = Category::new(request.category.clone());
                    session.insert_category(&created)?;
                    created
                }
            };

            let tx = Transaction::new(request.title.clone(), request.value, request.kind)
                .with_category(Some(category));
            session.insert_transaction(&tx)?;

            Ok(tx)
        })
    }

    /// All transactions, oldest first, plus the balance
    pub fn list(&self) -> Result<TransactionList> {
        self.repository.atomically(|session| {
            Ok(TransactionList {
                transactions: session.get_transactions()?,
                balance: session.get_balance()?,
            })
        })
    }

    pub fn balance(&self) -> Result<Balance> {
        self.repository.atomically(|session| session.get_balance())
    }

    pub fn get(&self, id: Uuid) -> Result<Option<Transaction>> {
        self.repository.atomically(|session| session.get_transaction_by_id(id))
    }

    /// Delete a transaction by id
    pub fn delete(&self, id: Uuid) -> Result<()> {
        let deleted = self
            .repository
            .atomically(|session| session.delete_transaction(id))?;
        if !deleted {
            return Err(Error::not_found(format!("Transaction {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryRepository;
    use rust_decimal::Decimal;

    fn service() -> (Arc<MemoryRepository>, TransactionService<MemoryRepository>) {
        let repo = Arc::new(MemoryRepository::new());
        (Arc::clone(&repo), TransactionService::new(repo))
    }

    fn income(title: &str, value: i64, category: &str) -> NewTransaction {
        NewTransaction::new(title, Decimal::new(value, 0), TransactionType::Income, category)
    }

    fn outcome(title: &str, value: i64, category: &str) -> NewTransaction {
        NewTransaction::new(title, Decimal::new(value, 0), TransactionType::Outcome, category)
    }

    #[test]
    fn test_outcome_above_balance_is_rejected() {
        let (repo, service) = service();
        service.create(income("Salary", 100, "Work")).unwrap();

        let err = service.create(outcome("Laptop", 150, "Tech")).unwrap_err();
        assert!(err.is_insufficient_balance());
        assert!(err.to_string().contains("You do not have enough balance"));

        // Neither the transaction nor its new category were stored
        let categories = repo.atomically(|s| s.get_categories()).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(service.list().unwrap().transactions.len(), 1);
    }

    #[test]
    fn test_outcome_on_empty_ledger_is_rejected() {
        let (_repo, service) = service();
        let err = service.create(outcome("Coffee", 1, "Food")).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientBalance { balance, requested }
                if balance == Decimal::ZERO && requested == Decimal::ONE
        ));
    }

    #[test]
    fn test_outcome_within_balance_reduces_total() {
        let (_repo, service) = service();
        service.create(income("Salary", 1000, "Work")).unwrap();

        let tx = service.create(outcome("Rent", 1000, "Housing")).unwrap();
        assert_eq!(tx.kind, TransactionType::Outcome);
        assert_eq!(service.balance().unwrap().total, Decimal::ZERO);
    }

    #[test]
    fn test_income_is_never_checked() {
        let (_repo, service) = service();
        let tx = service.create(income("Gift", 10, "Family")).unwrap();
        assert_eq!(service.balance().unwrap().total, Decimal::new(10, 0));
        assert_eq!(tx.category.map(|c| c.title), Some("Family".to_string()));
    }

    #[test]
    fn test_unseen_category_is_created_once() {
        let (repo, service) = service();
        let tx = service.create(income("Salary", 5000, "Salary")).unwrap();

        let categories = repo.atomically(|s| s.get_categories()).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].title, "Salary");
        assert_eq!(tx.category_id, Some(categories[0].id));
    }

    #[test]
    fn test_existing_category_is_reused() {
        let (repo, service) = service();
        let first = service.create(income("Salary", 5000, "Work")).unwrap();
        let second = service.create(income("Bonus", 500, "Work")).unwrap();

        assert_eq!(first.category_id, second.category_id);
        assert_eq!(repo.atomically(|s| s.get_categories()).unwrap().len(), 1);
    }

    #[test]
    fn test_validation_runs_before_storage() {
        let (repo, service) = service();
        let err = service.create(income("  ", 10, "Work")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(repo.atomically(|s| s.get_categories()).unwrap().is_empty());
    }

    #[test]
    fn test_storage_failure_rolls_back_category() {
        let (repo, service) = service();
        repo.fail_transaction_inserts(true);

        let err = service.create(income("Salary", 10, "Work")).unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert!(repo.atomically(|s| s.get_categories()).unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_transaction() {
        let (_repo, service) = service();
        let tx = service.create(income("Salary", 10, "Work")).unwrap();

        service.delete(tx.id).unwrap();
        assert!(service.get(tx.id).unwrap().is_none());
        assert!(matches!(service.delete(tx.id), Err(Error::NotFound(_))));
    }
}
