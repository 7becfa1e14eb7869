//! DuckDB repository implementation

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::{params, params_from_iter, Connection};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Balance, Category, Transaction, TransactionType};
use crate::ports::{CategoryStore, LedgerSession, Repository, TransactionStore};
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Timestamp layout bound into TIMESTAMP columns
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

impl From<duckdb::Error> for Error {
    fn from(err: duckdb::Error) -> Self {
        Error::Database(err.to_string())
    }
}

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// DuckDB repository implementation
///
/// One connection guarded by a mutex; every unit of work holds the lock for
/// its whole duration, so calls within a process are serialized.
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
}

impl DuckDbRepository {
    /// Open (or create) a DuckDB database file
    ///
    /// Retries with exponential backoff on file locking errors, which occur
    /// when another process has the database open.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut attempt = 0;
        loop {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if !is_retryable_error(&err_msg) || attempt + 1 >= MAX_RETRIES {
                        return Err(e.into());
                    }
                    let delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                    eprintln!(
                        "[tally] Database busy, retrying in {}ms (attempt {}/{}): {}",
                        delay.as_millis(),
                        attempt + 1,
                        MAX_RETRIES,
                        err_msg
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }

    /// Open an in-memory database (schema still needs `ensure_schema`)
    pub fn in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn try_open_connection(db_path: &Path) -> duckdb::Result<Connection> {
        // Extension autoloading stays off; nothing here needs extensions
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(db_path, config)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.lock()?;
        MigrationService::new(&conn)
            .run_pending()
            .map_err(|e| Error::database(format!("{:#}", e)))
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }
}

impl Repository for DuckDbRepository {
    fn atomically<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&dyn LedgerSession) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let outcome = work(&DuckDbSession { conn: &tx });
        match outcome {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    eprintln!("[tally] Rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    /// Null out references, then delete the category.
    ///
    /// Not wrapped in an explicit transaction: DuckDB checks foreign keys
    /// against committed index state, so deleting a parent whose children were
    /// detached in the same transaction is rejected. Each statement
    /// auto-commits and the order keeps the constraint satisfied.
    fn delete_category(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock()?;
        let id = id.to_string();

        conn.execute(
            "UPDATE transactions
             SET category_id = NULL, updated_at = CAST(? AS TIMESTAMP)
             WHERE category_id = CAST(? AS UUID)",
            params![format_timestamp(&Utc::now()), id],
        )?;

        let deleted = conn.execute(
            "DELETE FROM categories WHERE id = CAST(? AS UUID)",
            params![id],
        )?;

        Ok(deleted > 0)
    }
}

/// Stores bound to one open DuckDB transaction
struct DuckDbSession<'a> {
    conn: &'a Connection,
}

const CATEGORY_COLUMNS: &str = "CAST(id AS VARCHAR), title,
    CAST(created_at AS VARCHAR), CAST(updated_at AS VARCHAR)";

const TRANSACTION_SELECT: &str = "SELECT CAST(t.id AS VARCHAR), t.title, CAST(t.value AS VARCHAR),
        t.\"type\", CAST(t.category_id AS VARCHAR),
        CAST(t.created_at AS VARCHAR), CAST(t.updated_at AS VARCHAR),
        c.title, CAST(c.created_at AS VARCHAR), CAST(c.updated_at AS VARCHAR)
    FROM transactions t
    LEFT JOIN categories c ON c.id = t.category_id";

impl CategoryStore for DuckDbSession<'_> {
    fn find_category_by_title(&self, title: &str) -> Result<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE title = ?", CATEGORY_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![title], CategoryRow::read)?
            .collect::<duckdb::Result<Vec<_>>>()?;

        rows.into_iter().next().map(CategoryRow::into_category).transpose()
    }

    fn find_categories_by_titles(&self, titles: &[String]) -> Result<Vec<Category>> {
        if titles.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; titles.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM categories WHERE title IN ({})",
            CATEGORY_COLUMNS, placeholders
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(titles.iter()), CategoryRow::read)?
            .collect::<duckdb::Result<Vec<_>>>()?;

        rows.into_iter().map(CategoryRow::into_category).collect()
    }

    fn insert_category(&self, category: &Category) -> Result<()> {
        self.insert_categories(std::slice::from_ref(category))
    }

    fn insert_categories(&self, categories: &[Category]) -> Result<()> {
        if categories.is_empty() {
            return Ok(());
        }

        let values = vec![
            "(CAST(? AS UUID), ?, CAST(? AS TIMESTAMP), CAST(? AS TIMESTAMP))";
            categories.len()
        ]
        .join(", ");
        let sql = format!(
            "INSERT INTO categories (id, title, created_at, updated_at) VALUES {}",
            values
        );

        let mut bound: Vec<String> = Vec::with_capacity(categories.len() * 4);
        for category in categories {
            bound.push(category.id.to_string());
            bound.push(category.title.clone());
            bound.push(format_timestamp(&category.created_at));
            bound.push(format_timestamp(&category.updated_at));
        }

        self.conn.execute(&sql, params_from_iter(bound.iter()))?;
        Ok(())
    }

    fn get_categories(&self) -> Result<Vec<Category>> {
        let sql = format!("SELECT {} FROM categories ORDER BY title", CATEGORY_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], CategoryRow::read)?
            .collect::<duckdb::Result<Vec<_>>>()?;

        rows.into_iter().map(CategoryRow::into_category).collect()
    }
}

impl TransactionStore for DuckDbSession<'_> {
    fn get_balance(&self) -> Result<Balance> {
        let (income, outcome): (String, String) = self.conn.query_row(
            "SELECT
                CAST(COALESCE(SUM(CASE WHEN \"type\" = 'income' THEN value END), 0) AS VARCHAR),
                CAST(COALESCE(SUM(CASE WHEN \"type\" = 'outcome' THEN value END), 0) AS VARCHAR)
             FROM transactions",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(Balance::new(parse_decimal(&income)?, parse_decimal(&outcome)?))
    }

    fn insert_transaction(&self, tx: &Transaction) -> Result<()> {
        self.insert_transactions(std::slice::from_ref(tx))
    }

    fn insert_transactions(&self, txs: &[Transaction]) -> Result<()> {
        if txs.is_empty() {
            return Ok(());
        }

        let values = vec![
            "(CAST(? AS UUID), ?, CAST(? AS DECIMAL(18, 2)), ?, CAST(? AS UUID), \
             CAST(? AS TIMESTAMP), CAST(? AS TIMESTAMP))";
            txs.len()
        ]
        .join(", ");
        let sql = format!(
            "INSERT INTO transactions (id, title, value, \"type\", category_id, created_at, updated_at)
             VALUES {}",
            values
        );

        // Option<String> so a missing category binds as NULL
        let mut bound: Vec<Option<String>> = Vec::with_capacity(txs.len() * 7);
        for tx in txs {
            bound.push(Some(tx.id.to_string()));
            bound.push(Some(tx.title.clone()));
            bound.push(Some(tx.value.to_string()));
            bound.push(Some(tx.kind.as_str().to_string()));
            bound.push(tx.category_id.map(|id| id.to_string()));
            bound.push(Some(format_timestamp(&tx.created_at)));
            bound.push(Some(format_timestamp(&tx.updated_at)));
        }

        self.conn.execute(&sql, params_from_iter(bound.iter()))?;
        Ok(())
    }

    fn get_transactions(&self) -> Result<Vec<Transaction>> {
        let sql = format!("{} ORDER BY t.created_at, t.id", TRANSACTION_SELECT);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], TransactionRow::read)?
            .collect::<duckdb::Result<Vec<_>>>()?;

        rows.into_iter().map(TransactionRow::into_transaction).collect()
    }

    fn get_transaction_by_id(&self, id: Uuid) -> Result<Option<Transaction>> {
        let sql = format!("{} WHERE t.id = CAST(? AS UUID)", TRANSACTION_SELECT);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![id.to_string()], TransactionRow::read)?
            .collect::<duckdb::Result<Vec<_>>>()?;

        rows.into_iter()
            .next()
            .map(TransactionRow::into_transaction)
            .transpose()
    }

    fn delete_transaction(&self, id: Uuid) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM transactions WHERE id = CAST(? AS UUID)",
            params![id.to_string()],
        )?;
        Ok(deleted > 0)
    }
}

/// Raw category columns, converted outside the row callback
struct CategoryRow {
    id: String,
    title: String,
    created_at: String,
    updated_at: String,
}

impl CategoryRow {
    fn read(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            created_at: row.get(2)?,
            updated_at: row.get(3)?,
        })
    }

    fn into_category(self) -> Result<Category> {
        Ok(Category {
            id: parse_uuid(&self.id)?,
            title: self.title,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

/// Raw transaction columns joined with the optional category
struct TransactionRow {
    id: String,
    title: String,
    value: String,
    kind: String,
    category_id: Option<String>,
    created_at: String,
    updated_at: String,
    category_title: Option<String>,
    category_created_at: Option<String>,
    category_updated_at: Option<String>,
}

impl TransactionRow {
    fn read(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            value: row.get(2)?,
            kind: row.get(3)?,
            category_id: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
            category_title: row.get(7)?,
            category_created_at: row.get(8)?,
            category_updated_at: row.get(9)?,
        })
    }

    fn into_transaction(self) -> Result<Transaction> {
        let category_id = self.category_id.as_deref().map(parse_uuid).transpose()?;

        let category = match (category_id, self.category_title) {
            (Some(id), Some(title)) => Some(Category {
                id,
                title,
                created_at: parse_optional_timestamp(self.category_created_at.as_deref())?,
                updated_at: parse_optional_timestamp(self.category_updated_at.as_deref())?,
            }),
            _ => None,
        };

        Ok(Transaction {
            id: parse_uuid(&self.id)?,
            title: self.title,
            value: parse_decimal(&self.value)?,
            kind: TransactionType::from_str(&self.kind)
                .map_err(|_| Error::database(format!("Unknown transaction type in row: {}", self.kind)))?,
            category_id,
            category,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

// Helper functions

fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.naive_utc().format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a DuckDB TIMESTAMP rendered as VARCHAR (stored as UTC)
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::database(format!("Invalid timestamp '{}': {}", s, e)))
}

fn parse_optional_timestamp(s: Option<&str>) -> Result<DateTime<Utc>> {
    match s {
        Some(s) => parse_timestamp(s),
        None => Err(Error::database("Missing category timestamp")),
    }
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::database(format!("Invalid UUID '{}': {}", s, e)))
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).map_err(|e| Error::database(format!("Invalid decimal '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> DuckDbRepository {
        let repo = DuckDbRepository::in_memory().unwrap();
        repo.ensure_schema().unwrap();
        repo
    }

    #[test]
    fn test_timestamp_roundtrip_keeps_microseconds() {
        let now = Utc::now();
        let parsed = parse_timestamp(&format_timestamp(&now)).unwrap();
        assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
    }

    #[test]
    fn test_parse_timestamp_without_fraction() {
        let parsed = parse_timestamp("2024-01-15 10:30:00").unwrap();
        assert_eq!(parsed.format("%H:%M").to_string(), "10:30");
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_is_retryable_error() {
        assert!(is_retryable_error("IO Error: database is locked"));
        assert!(is_retryable_error("The process cannot access the file"));
        assert!(!is_retryable_error("Catalog Error: Table does not exist"));
    }

    #[test]
    fn test_empty_balance_is_zero() {
        let repo = repo();
        let balance = repo.atomically(|s| s.get_balance()).unwrap();
        assert_eq!(balance, Balance::default());
    }

    #[test]
    fn test_batch_insert_and_lookup_by_titles() {
        let repo = repo();
        let food = Category::new("Food");
        let rent = Category::new("Housing");

        repo.atomically(|s| s.insert_categories(&[food.clone(), rent.clone()]))
            .unwrap();

        let found = repo
            .atomically(|s| {
                s.find_categories_by_titles(&["Housing".to_string(), "Travel".to_string()])
            })
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, rent.id);

        let by_title = repo.atomically(|s| s.find_category_by_title("Food")).unwrap();
        assert_eq!(by_title.map(|c| c.id), Some(food.id));
    }

    #[test]
    fn test_transactions_hydrate_category_and_balance() {
        let repo = repo();
        let salary = Category::new("Salary");
        let income = Transaction::new("Paycheck", Decimal::new(500000, 2), TransactionType::Income)
            .with_category(Some(salary.clone()));
        let outcome = Transaction::new("Cash", Decimal::new(2050, 2), TransactionType::Outcome);

        repo.atomically(|s| {
            s.insert_category(&salary)?;
            s.insert_transactions(&[income.clone(), outcome.clone()])
        })
        .unwrap();

        let stored = repo.atomically(|s| s.get_transactions()).unwrap();
        assert_eq!(stored.len(), 2);

        let paycheck = stored.iter().find(|t| t.id == income.id).unwrap();
        assert_eq!(paycheck.value, Decimal::new(5000, 0));
        assert_eq!(paycheck.kind, TransactionType::Income);
        assert_eq!(paycheck.category.as_ref().map(|c| c.title.as_str()), Some("Salary"));

        let cash = stored.iter().find(|t| t.id == outcome.id).unwrap();
        assert!(cash.category_id.is_none());
        assert!(cash.category.is_none());

        let balance = repo.atomically(|s| s.get_balance()).unwrap();
        assert_eq!(balance.income, Decimal::new(5000, 0));
        assert_eq!(balance.outcome, Decimal::new(2050, 2));
        assert_eq!(balance.total, Decimal::new(497950, 2));
    }

    #[test]
    fn test_failed_unit_of_work_rolls_back() {
        let repo = repo();

        let result: Result<()> = repo.atomically(|s| {
            s.insert_category(&Category::new("Temporary"))?;
            Err(Error::validation("abort"))
        });
        assert!(result.is_err());

        let categories = repo.atomically(|s| s.get_categories()).unwrap();
        assert!(categories.is_empty());
    }

    #[test]
    fn test_delete_category_nulls_references() {
        let repo = repo();
        let food = Category::new("Food");
        let tx = Transaction::new("Lunch", Decimal::new(1200, 2), TransactionType::Outcome)
            .with_category(Some(food.clone()));

        repo.atomically(|s| {
            s.insert_category(&food)?;
            s.insert_transaction(&tx)
        })
        .unwrap();

        assert!(repo.delete_category(food.id).unwrap());
        assert!(!repo.delete_category(food.id).unwrap());

        let stored = repo
            .atomically(|s| s.get_transaction_by_id(tx.id))
            .unwrap()
            .unwrap();
        assert!(stored.category_id.is_none());
    }

    #[test]
    fn test_delete_transaction() {
        let repo = repo();
        let tx = Transaction::new("Gift", Decimal::new(50, 0), TransactionType::Income);
        repo.atomically(|s| s.insert_transaction(&tx)).unwrap();

        assert!(repo.atomically(|s| s.delete_transaction(tx.id)).unwrap());
        assert!(repo.atomically(|s| s.get_transaction_by_id(tx.id)).unwrap().is_none());
        assert!(!repo.atomically(|s| s.delete_transaction(tx.id)).unwrap());
    }
}
