//! Rebalance command - recompute stored running balances

use anyhow::Result;
use rust_decimal::Decimal;

use super::get_context;
use crate::output;

pub async fn run(account: Option<&str>, initial_balance: Decimal, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let result = ctx
        .balance_service
        .update_transaction_balances(account, initial_balance)
        .await?;

    if json {
        return output::json(&result);
    }

    if result.updated == 0 {
        output::warning("No transactions to rebalance.");
        return Ok(());
    }
    output::success(&format!("Updated {} running balances", result.updated));
    println!("  Closing balance: {:.2}", result.closing_balance);
    Ok(())
}
