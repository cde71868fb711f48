//! Type-aware financial summary
//!
//! Unlike the running balance, this branches on `type`: amounts are bucketed
//! by their accounting type using their absolute value.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{Transaction, TransactionType};

const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotals {
    /// `YYYY-MM`
    pub month: String,
    pub income: Decimal,
    pub expenses: Decimal,
    pub net_income: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    pub total_equity: Decimal,
    /// income - expenses
    pub net_profit: Decimal,
    /// assets - liabilities + equity
    pub cash_balance: Decimal,
    /// Largest first
    pub expenses_by_category: Vec<CategoryTotal>,
    pub income_by_category: Vec<CategoryTotal>,
    /// Oldest month first
    pub monthly: Vec<MonthlyTotals>,
    /// Transactions without a type, left out of every total
    pub unclassified: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryOptions {
    /// Count only transactions a user has verified
    pub verified_only: bool,
}

pub fn summarize(transactions: &[Transaction], options: SummaryOptions) -> FinancialSummary {
    let mut summary = FinancialSummary::default();
    let mut expenses_by_category: HashMap<String, Decimal> = HashMap::new();
    let mut income_by_category: HashMap<String, Decimal> = HashMap::new();
    let mut monthly: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();

    for tx in transactions.iter().filter(|t| !options.verified_only || t.is_verified) {
        let Some(transaction_type) = tx.transaction_type else {
            summary.unclassified += 1;
            continue;
        };
        let amount = tx.amount.abs();
        let category = tx.category.clone().unwrap_or_else(|| UNCATEGORIZED.to_string());
        let month = tx.date.format("%Y-%m").to_string();

        match transaction_type {
            TransactionType::Income => {
                add(&mut summary.total_income, amount);
                add(income_by_category.entry(category).or_default(), amount);
                add(&mut monthly.entry(month).or_default().0, amount);
            }
            TransactionType::Expense => {
                add(&mut summary.total_expenses, amount);
                add(expenses_by_category.entry(category).or_default(), amount);
                add(&mut monthly.entry(month).or_default().1, amount);
            }
            TransactionType::Asset => add(&mut summary.total_assets, amount),
            TransactionType::Liability => add(&mut summary.total_liabilities, amount),
            TransactionType::Equity => add(&mut summary.total_equity, amount),
        }
    }

    summary.net_profit = summary.total_income.saturating_sub(summary.total_expenses);
    summary.cash_balance = summary
        .total_assets
        .saturating_sub(summary.total_liabilities)
        .saturating_add(summary.total_equity);
    summary.expenses_by_category = sorted_totals(expenses_by_category);
    summary.income_by_category = sorted_totals(income_by_category);
    summary.monthly = monthly
        .into_iter()
        .map(|(month, (income, expenses))| MonthlyTotals {
            month,
            income,
            expenses,
            net_income: income.saturating_sub(expenses),
        })
        .collect();
    summary
}

/// Totals clamp at the `Decimal` range instead of panicking
fn add(total: &mut Decimal, amount: Decimal) {
    *total = total.saturating_add(amount);
}

fn sorted_totals(totals: HashMap<String, Decimal>) -> Vec<CategoryTotal> {
    let mut list: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, amount)| CategoryTotal { category, amount })
        .collect();
    list.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.category.cmp(&b.category)));
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn typed(m: u32, amount: Decimal, t: TransactionType, category: Option<&str>) -> Transaction {
        let mut tx = Transaction::new(NaiveDate::from_ymd_opt(2024, m, 10).unwrap(), "x", amount);
        tx.transaction_type = Some(t);
        tx.category = category.map(str::to_string);
        tx.is_verified = true;
        tx
    }

    #[test]
    fn test_totals_by_type() {
        let txs = vec![
            typed(1, dec!(1500.00), TransactionType::Income, Some("Sales")),
            typed(1, dec!(-4.50), TransactionType::Expense, Some("Meals")),
            typed(2, dec!(-900.00), TransactionType::Expense, Some("Rent")),
            typed(2, dec!(-20.00), TransactionType::Expense, None),
            typed(2, dec!(5000.00), TransactionType::Asset, None),
            typed(2, dec!(-1200.00), TransactionType::Liability, None),
            typed(2, dec!(300.00), TransactionType::Equity, None),
        ];
        let s = summarize(&txs, SummaryOptions::default());

        assert_eq!(s.total_income, dec!(1500.00));
        assert_eq!(s.total_expenses, dec!(924.50));
        assert_eq!(s.net_profit, dec!(575.50));
        assert_eq!(s.cash_balance, dec!(4100.00));
        assert_eq!(s.expenses_by_category[0].category, "Rent");
        assert_eq!(s.expenses_by_category[1].category, UNCATEGORIZED);
        assert_eq!(s.income_by_category.len(), 1);

        assert_eq!(s.monthly.len(), 2);
        assert_eq!(s.monthly[0].month, "2024-01");
        assert_eq!(s.monthly[0].net_income, dec!(1495.50));
        assert_eq!(s.monthly[1].expenses, dec!(920.00));
    }

    #[test]
    fn test_verified_only_and_untyped() {
        let mut unverified = typed(1, dec!(100), TransactionType::Income, None);
        unverified.is_verified = false;
        let mut untyped = typed(1, dec!(50), TransactionType::Income, None);
        untyped.transaction_type = None;

        let s = summarize(&[unverified.clone(), untyped.clone()], SummaryOptions { verified_only: true });
        assert_eq!(s.total_income, Decimal::ZERO);
        assert_eq!(s.unclassified, 1);

        let s = summarize(&[unverified, untyped], SummaryOptions::default());
        assert_eq!(s.total_income, dec!(100));
    }

    #[test]
    fn test_extreme_totals_saturate() {
        let transactions = vec![
            typed(1, Decimal::MAX, TransactionType::Income, None),
            typed(1, Decimal::MAX, TransactionType::Income, None),
            typed(1, Decimal::MAX, TransactionType::Expense, None),
            typed(2, Decimal::MAX, TransactionType::Liability, None),
            typed(2, Decimal::MAX, TransactionType::Liability, None),
        ];
        let summary = summarize(&transactions, SummaryOptions::default());
        assert_eq!(summary.total_income, Decimal::MAX);
        assert_eq!(summary.net_profit, Decimal::ZERO);
        assert_eq!(summary.cash_balance, Decimal::MIN);
        assert_eq!(summary.monthly[0].net_income, Decimal::ZERO);
    }
}
