//! Import command - import transactions from CSV

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use super::{get_context, get_logger, log_command, log_outcome};
use crate::output;

pub fn run(file: PathBuf, preview: bool, json: bool) -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "import");

    let ctx = get_context()?;

    let result = if preview {
        ctx.import_service.preview(&file)
    } else {
        let result = ctx.import_service.import(&file);
        log_outcome(&logger, "import", "import_completed", "import_failed", &result);
        result
    };
    let result = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.preview {
        output::info("Preview - nothing was imported");
    }

    if result.transactions.is_empty() {
        output::warning("No transactions found in file");
    } else {
        println!("{}", output::transactions_table(&result.transactions));
    }

    println!();
    let verb = if result.preview { "Would import" } else { "Imported" };
    println!(
        "{} {} transactions",
        verb,
        result.transactions.len().to_string().bold()
    );

    if !result.created_categories.is_empty() {
        let titles: Vec<&str> = result
            .created_categories
            .iter()
            .map(|c| c.title.as_str())
            .collect();
        let verb = if result.preview { "Would create" } else { "Created" };
        println!("{} categories: {}", verb, titles.join(", "));
    }

    if result.skipped > 0 {
        println!("{}", format!("Skipped {} malformed rows", result.skipped).dimmed());
    }

    if !result.preview {
        if ctx.import_service.options().keep_source_file {
            println!("{}", format!("Kept {}", file.display()).dimmed());
        } else {
            println!("{}", format!("Removed {}", file.display()).dimmed());
        }
    }

    Ok(())
}
