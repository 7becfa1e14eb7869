//! Tally CLI - a personal finance ledger in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{balance, categories, import, list, logs, new, remove};

/// Tally - record income and outcome, import CSV statements
#[derive(Parser)]
#[command(name = "tally", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create new records
    New {
        #[command(subcommand)]
        command: new::NewCommands,
    },

    /// Import transactions from CSV (title,type,value,category)
    Import {
        /// Path to CSV file
        file: PathBuf,
        /// Preview without importing
        #[arg(long)]
        preview: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List transactions and the balance
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the balance
    Balance {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List categories
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a transaction or a category
    Remove {
        #[command(subcommand)]
        command: remove::RemoveCommands,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::New { command } => new::run(command),
        Commands::Import { file, preview, json } => import::run(file, preview, json),
        Commands::List { json } => list::run(json),
        Commands::Balance { json } => balance::run(json),
        Commands::Categories { json } => categories::run(json),
        Commands::Remove { command } => remove::run(command),
        Commands::Logs { command } => logs::run(command),
    }
}
