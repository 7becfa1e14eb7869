//! New command - create new records

use std::str::FromStr;

use anyhow::{anyhow, Result};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Input;
use rust_decimal::Decimal;
use tally_core::{NewTransaction, TransactionType};

use super::{get_context, get_logger, log_command, log_outcome};
use crate::output;

#[derive(Subcommand)]
pub enum NewCommands {
    /// Record a single transaction
    Transaction {
        /// Transaction title
        #[arg(long)]
        title: Option<String>,
        /// Amount (non-negative)
        #[arg(long)]
        value: Option<String>,
        /// income or outcome
        #[arg(long = "type")]
        kind: Option<String>,
        /// Category title (created if it does not exist)
        #[arg(long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: NewCommands) -> Result<()> {
    match command {
        NewCommands::Transaction {
            title,
            value,
            kind,
            category,
            json,
        } => run_transaction(title, value, kind, category, json),
    }
}

/// Use the flag value or prompt for it
///
/// Prompting needs a terminal; piped input must pass every flag.
fn value_or_prompt(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None if atty::isnt(atty::Stream::Stdin) => {
            Err(anyhow!("Missing {} (pass it as a flag when stdin is not a terminal)", prompt))
        }
        None => Ok(Input::new().with_prompt(prompt).interact_text()?),
    }
}

/// Turn prompted or flag text into a creation request
fn build_request(
    title: String,
    value: &str,
    kind: &str,
    category: String,
) -> Result<NewTransaction, tally_core::Error> {
    let value = Decimal::from_str(value.trim())
        .map_err(|_| tally_core::Error::validation(format!("Invalid value: {}", value)))?;
    let kind = TransactionType::from_str(kind)?;
    Ok(NewTransaction::new(title, value, kind, category))
}

fn run_transaction(
    title: Option<String>,
    value: Option<String>,
    kind: Option<String>,
    category: Option<String>,
    json: bool,
) -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "new");

    let ctx = get_context()?;

    let title = value_or_prompt(title, "Title")?;
    let value_str = value_or_prompt(value, "Value")?;
    let kind_str = value_or_prompt(kind, "Type (income/outcome)")?;
    let category = value_or_prompt(category, "Category")?;

    let result = build_request(title, &value_str, &kind_str, category)
        .and_then(|request| ctx.transaction_service.create(request));
    log_outcome(
        &logger,
        "new",
        "transaction_created",
        "transaction_create_failed",
        &result,
    );

    let tx = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tx)?);
    } else {
        println!("{}", "Transaction created".green());
        println!("  ID: {}", tx.id);
        println!("  Title: {}", tx.title);
        println!("  Amount: {}", output::format_signed(&tx));
        if let Some(category) = &tx.category {
            println!("  Category: {}", category.title);
        }
    }

    Ok(())
}
