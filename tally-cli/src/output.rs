//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use rust_decimal::Decimal;
use tally_core::{Balance, Transaction, TransactionType};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format a money amount with two decimals
pub fn format_money(value: Decimal) -> String {
    if value < Decimal::ZERO {
        format!("-${:.2}", -value)
    } else {
        format!("${:.2}", value)
    }
}

/// Signed, colored amount for a transaction row
pub fn format_signed(tx: &Transaction) -> String {
    let amount = format_money(tx.signed_value());
    match tx.kind {
        TransactionType::Income => format!("+{}", amount).green().to_string(),
        TransactionType::Outcome => amount.red().to_string(),
    }
}

/// Table of transactions: id, title, type, category, amount
pub fn transactions_table(transactions: &[Transaction]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["ID", "Title", "Type", "Category", "Amount"]);

    for tx in transactions {
        let category = tx
            .category
            .as_ref()
            .map(|c| c.title.clone())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(tx.id.to_string()),
            Cell::new(&tx.title),
            Cell::new(tx.kind.as_str()),
            Cell::new(category),
            Cell::new(format_signed(tx)),
        ]);
    }

    table
}

/// Print the balance summary lines
pub fn print_balance(balance: &Balance) {
    println!("  Income:  {}", format_money(balance.income).green());
    println!("  Outcome: {}", format_money(balance.outcome).red());
    let total = format_money(balance.total);
    if balance.total < Decimal::ZERO {
        println!("  Total:   {}", total.red().bold());
    } else {
        println!("  Total:   {}", total.bold());
    }
}
