//! Reconcile command - compare the stored balance with a statement

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;

use super::get_context;
use crate::output;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReconcileOutput<'a> {
    account: Option<&'a str>,
    stated_ending_balance: Decimal,
    tolerance: Decimal,
    reconciled: bool,
    difference: Decimal,
}

pub async fn run(account: Option<&str>, ending_balance: Decimal, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let result = ctx
        .balance_service
        .reconcile_account(account, ending_balance)
        .await?;

    if json {
        return output::json(ReconcileOutput {
            account,
            stated_ending_balance: ending_balance,
            tolerance: ctx.balance_service.tolerance(),
            reconciled: result.reconciled,
            difference: result.difference,
        });
    }

    let computed = ending_balance + result.difference;
    println!("  Stored balance: {:.2}", computed);
    println!("  Statement balance: {:.2}", ending_balance);
    if result.reconciled {
        output::success(&format!(
            "Reconciled (difference {:.2}, tolerance {})",
            result.difference,
            ctx.balance_service.tolerance()
        ));
    } else {
        output::warning(&format!("Does not reconcile: off by {:.2}", result.difference));
        output::info("Run 'ledgerline rebalance' if stored balances are stale.");
    }
    Ok(())
}
