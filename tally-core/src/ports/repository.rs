//! Repository port - storage abstraction
//!
//! The stores are split the way the ledger thinks about them: categories and
//! transactions. A [`LedgerSession`] exposes both inside one unit of work, and
//! a [`Repository`] hands out sessions through [`Repository::atomically`].

use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{Balance, Category, Transaction};

/// Persisted set of categories keyed by unique title
pub trait CategoryStore {
    /// Find a category by exact title
    fn find_category_by_title(&self, title: &str) -> Result<Option<Category>>;

    /// Find every category whose title is in `titles` (single query)
    fn find_categories_by_titles(&self, titles: &[String]) -> Result<Vec<Category>>;

    /// Insert one category
    fn insert_category(&self, category: &Category) -> Result<()>;

    /// Insert a batch of categories in one insert operation
    fn insert_categories(&self, categories: &[Category]) -> Result<()>;

    /// Get all categories ordered by title
    fn get_categories(&self) -> Result<Vec<Category>>;
}

/// Append-mostly collection of transactions
pub trait TransactionStore {
    /// Sum of incomes, sum of outcomes and their difference
    fn get_balance(&self) -> Result<Balance>;

    /// Insert one transaction
    fn insert_transaction(&self, tx: &Transaction) -> Result<()>;

    /// Insert a batch of transactions in one insert operation
    fn insert_transactions(&self, txs: &[Transaction]) -> Result<()>;

    /// Get all transactions with their categories hydrated, oldest first
    fn get_transactions(&self) -> Result<Vec<Transaction>>;

    /// Get a transaction by ID
    fn get_transaction_by_id(&self, id: Uuid) -> Result<Option<Transaction>>;

    /// Delete a transaction, returning whether a row was removed
    fn delete_transaction(&self, id: Uuid) -> Result<bool>;
}

/// Both stores, bound to one unit of work
pub trait LedgerSession: CategoryStore + TransactionStore {}

impl<T: CategoryStore + TransactionStore> LedgerSession for T {}

/// Database repository abstraction
///
/// Implementations (adapters) provide the actual storage. Services receive a
/// repository at construction and never look one up globally.
pub trait Repository: Send + Sync {
    /// Run `work` in one atomic unit: committed if it returns `Ok`,
    /// rolled back if it returns `Err`.
    fn atomically<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&dyn LedgerSession) -> Result<T>;

    /// Delete a category, nulling out every transaction reference first.
    ///
    /// Kept outside [`Repository::atomically`]: the reference update and the
    /// delete are separate statements.
    fn delete_category(&self, id: Uuid) -> Result<bool>;
}
