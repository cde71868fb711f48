//! Statement reconciliation

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest gap between computed and stated balances still treated as a match.
/// Two cents, applied uniformly to every reconciliation path.
pub const DEFAULT_RECONCILIATION_TOLERANCE: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

/// Outcome of comparing a computed balance with a statement's ending balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub reconciled: bool,
    /// computed - stated; positive means the ledger shows more than the bank
    pub difference: Decimal,
}

/// Reconcile using the default two-cent tolerance
pub fn check_reconciliation(computed_balance: Decimal, stated_ending_balance: Decimal) -> ReconciliationResult {
    check_reconciliation_with_tolerance(
        computed_balance,
        stated_ending_balance,
        DEFAULT_RECONCILIATION_TOLERANCE,
    )
}

pub fn check_reconciliation_with_tolerance(
    computed_balance: Decimal,
    stated_ending_balance: Decimal,
    tolerance: Decimal,
) -> ReconciliationResult {
    let difference = computed_balance - stated_ending_balance;
    ReconciliationResult {
        reconciled: difference.abs() <= tolerance.abs(),
        difference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_tolerance_is_two_cents() {
        assert_eq!(DEFAULT_RECONCILIATION_TOLERANCE, dec!(0.02));
    }

    #[test]
    fn test_within_tolerance() {
        let result = check_reconciliation(dec!(100.00), dec!(100.019));
        assert!(result.reconciled);
        assert_eq!(result.difference, dec!(-0.019));

        assert!(check_reconciliation(dec!(100.00), dec!(100.02)).reconciled);
        assert!(check_reconciliation(dec!(100.02), dec!(100.00)).reconciled);
    }

    #[test]
    fn test_outside_tolerance() {
        let result = check_reconciliation(dec!(100.00), dec!(100.03));
        assert!(!result.reconciled);
        assert_eq!(result.difference, dec!(-0.03));
    }

    #[test]
    fn test_custom_tolerance() {
        let result = check_reconciliation_with_tolerance(dec!(100.00), dec!(100.019), dec!(0.01));
        assert!(!result.reconciled);
    }
}
