//! Remove command - delete a transaction or a category

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use uuid::Uuid;

use super::get_context;

#[derive(Subcommand)]
pub enum RemoveCommands {
    /// Delete a transaction
    Transaction {
        /// Transaction ID
        id: String,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
    /// Delete a category; its transactions keep existing without one
    Category {
        /// Category ID
        id: String,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

fn confirm(message: &str) -> Result<bool> {
    println!("\n{}", message.yellow());
    Ok(Confirm::new()
        .with_prompt("Are you sure?")
        .default(false)
        .interact()?)
}

pub fn run(command: RemoveCommands) -> Result<()> {
    let ctx = get_context()?;

    match command {
        RemoveCommands::Transaction { id, force } => {
            let id = Uuid::parse_str(&id).with_context(|| format!("Invalid transaction ID: {}", id))?;
            if !force && !confirm(&format!("This will delete transaction {}.", id))? {
                println!("{}\n", "Cancelled".dimmed());
                return Ok(());
            }
            ctx.transaction_service.delete(id)?;
            println!("\n{} Transaction {} removed\n", "✓".green(), id);
        }
        RemoveCommands::Category { id, force } => {
            let id = Uuid::parse_str(&id).with_context(|| format!("Invalid category ID: {}", id))?;
            if !force {
                let message = format!("This will delete category {}.", id);
                println!("{}", "Transactions in it will remain, without a category.".dimmed());
                if !confirm(&message)? {
                    println!("{}\n", "Cancelled".dimmed());
                    return Ok(());
                }
            }
            ctx.category_service.delete(id)?;
            println!("\n{} Category {} removed\n", "✓".green(), id);
        }
    }

    Ok(())
}
