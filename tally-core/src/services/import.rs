//! Import service - bulk CSV transaction import
//!
//! Rows are `title,type,value,category` after a header line. Categories that
//! do not exist yet are created in one batch, transactions in another, and
//! both batches commit or roll back together.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::{normalize_value, Category, Transaction, TransactionType};
use crate::ports::{LedgerSession, Repository};

/// Column positions in an import row
const TITLE_COLUMN: usize = 0;
const TYPE_COLUMN: usize = 1;
const VALUE_COLUMN: usize = 2;
const CATEGORY_COLUMN: usize = 3;

/// Options for CSV processing
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Field delimiter byte
    pub delimiter: u8,
    /// Keep the source file after a successful import
    pub keep_source_file: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            keep_source_file: false,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImportResult {
    /// Created transactions, in file order
    pub transactions: Vec<Transaction>,
    /// Categories that did not exist before this import
    pub created_categories: Vec<Category>,
    /// Rows skipped because a required field was empty or malformed
    pub skipped: usize,
    /// Whether this was a preview (nothing written)
    pub preview: bool,
}

/// A parsed row waiting for its category
#[derive(Debug, Clone)]
struct Candidate {
    title: String,
    kind: TransactionType,
    value: Decimal,
    category: Option<String>,
}

struct ParsedFile {
    candidates: Vec<Candidate>,
    skipped: usize,
}

struct ImportPlan {
    created_categories: Vec<Category>,
    transactions: Vec<Transaction>,
}

/// Import service for CSV imports
pub struct ImportService<R: Repository> {
    repository: Arc<R>,
    options: ImportOptions,
}

impl<R: Repository> ImportService<R> {
    pub fn new(repository: Arc<R>, options: ImportOptions) -> Self {
        Self {
            repository,
            options,
        }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Import transactions from a CSV file, then delete the file
    ///
    /// No balance check is applied to imported rows. If anything fails the
    /// ledger is left untouched and the file stays where it was.
    pub fn import(&self, file_path: &Path) -> Result<ImportResult> {
        let parsed = self.parse(file_path)?;

        let plan = self.repository.atomically(|session| {
            let plan = build_plan(session, &parsed.candidates)?;
            session.insert_categories(&plan.created_categories)?;
            session.insert_transactions(&plan.transactions)?;
            Ok(plan)
        })?;

        if !self.options.keep_source_file {
            fs::remove_file(file_path)?;
        }

        Ok(ImportResult {
            transactions: plan.transactions,
            created_categories: plan.created_categories,
            skipped: parsed.skipped,
            preview: false,
        })
    }

    /// Report what `import` would create without writing anything
    pub fn preview(&self, file_path: &Path) -> Result<ImportResult> {
        let parsed = self.parse(file_path)?;

        let plan = self
            .repository
            .atomically(|session| build_plan(session, &parsed.candidates))?;

        Ok(ImportResult {
            transactions: plan.transactions,
            created_categories: plan.created_categories,
            skipped: parsed.skipped,
            preview: true,
        })
    }

    fn parse(&self, file_path: &Path) -> Result<ParsedFile> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .delimiter(self.options.delimiter)
            .from_path(file_path)?;

        let mut candidates = Vec::new();
        let mut skipped = 0;

        for record in reader.byte_records() {
            let record = record?;
            let candidate = csv::StringRecord::from_byte_record(record)
                .ok()
                .and_then(|record| parse_row(&record, self.options.delimiter));
            match candidate {
                Some(candidate) => candidates.push(candidate),
                None => skipped += 1,
            }
        }

        Ok(ParsedFile {
            candidates,
            skipped,
        })
    }
}

/// Resolve every candidate's category, deciding which categories are new
fn build_plan(session: &dyn LedgerSession, candidates: &[Candidate]) -> Result<ImportPlan> {
    let mut seen = HashSet::new();
    let titles: Vec<String> = candidates
        .iter()
        .filter_map(|c| c.category.clone())
        .filter(|title| seen.insert(title.clone()))
        .collect();

    let mut available: HashMap<String, Category> = session
        .find_categories_by_titles(&titles)?
        .into_iter()
        .map(|c| (c.title.clone(), c))
        .collect();

    let created_categories: Vec<Category> = titles
        .iter()
        .filter(|title| !available.contains_key(*title))
        .map(|title| Category::new(title.clone()))
        .collect();

    for category in &created_categories {
        available.insert(category.title.clone(), category.clone());
    }

    let transactions = candidates
        .iter()
        .map(|c| {
            let category = c.category.as_ref().and_then(|t| available.get(t)).cloned();
            Transaction::new(c.title.clone(), c.value, c.kind).with_category(category)
        })
        .collect();

    Ok(ImportPlan {
        created_categories,
        transactions,
    })
}

/// Parse one record; `None` marks a row to skip
fn parse_row(record: &csv::StringRecord, delimiter: u8) -> Option<Candidate> {
    let field = |i: usize| record.get(i).unwrap_or("");

    let title = field(TITLE_COLUMN);
    let kind = field(TYPE_COLUMN);
    let value = field(VALUE_COLUMN);
    if title.is_empty() || kind.is_empty() || value.is_empty() {
        return None;
    }

    let kind = TransactionType::from_str(kind).ok()?;
    let value = parse_value(value, delimiter)?;
    let category = Some(field(CATEGORY_COLUMN))
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    Some(Candidate {
        title: title.to_string(),
        kind,
        value,
        category,
    })
}

/// Parse a non-negative amount, tolerating currency symbols and separators
///
/// With a `,` delimiter a comma inside a quoted value groups thousands. With
/// any other delimiter the comma is the decimal mark and `.` groups thousands.
fn parse_value(s: &str, delimiter: u8) -> Option<Decimal> {
    let cleaned: String = s.chars().filter(|c| !matches!(c, '$' | ' ')).collect();

    let cleaned = if delimiter == b',' {
        cleaned.replace(',', "")
    } else if cleaned.contains(',') {
        if cleaned.matches(',').count() > 1 {
            return None;
        }
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    let value = Decimal::from_str(&cleaned).ok()?;
    if value < Decimal::ZERO {
        return None;
    }
    Some(normalize_value(value))
}
