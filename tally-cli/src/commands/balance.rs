//! Balance command - show income, outcome and total

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let balance = ctx.transaction_service.balance()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&balance)?);
        return Ok(());
    }

    println!("{}", "Balance".bold());
    output::print_balance(&balance);

    Ok(())
}
