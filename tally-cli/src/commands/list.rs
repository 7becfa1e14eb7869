//! List command - show transactions and balance

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let list = ctx.transaction_service.list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    if list.transactions.is_empty() {
        println!("No transactions yet.");
    } else {
        println!("{}", "Transactions".bold());
        println!("{}", output::transactions_table(&list.transactions));
    }

    println!();
    println!("{}", "Balance".bold());
    output::print_balance(&list.balance);

    Ok(())
}
