//! Amount normalization for statement rows

use std::str::FromStr;

use rust_decimal::Decimal;

/// Largest magnitude accepted: 14 integer digits and 4 decimals, the range
/// a stored `DECIMAL(18, 4)` holds
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA763_FFFF, 0x0DE0_B6B3, 0, false, 4);

/// Parse a raw amount cell, defaulting to zero when it cannot be read
pub fn parse_amount(raw: &str) -> Decimal {
    try_parse_amount(raw).unwrap_or(Decimal::ZERO)
}

/// Parse a raw amount cell such as `$1,234.56`, `(12.50)`, `-4.50`, `12,50`
///
/// Returns `None` when nothing numeric can be recovered or the value is beyond
/// [`MAX_AMOUNT`], so callers can warn before falling back to zero.
pub fn try_parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | ',' | '(' | ')'))
        .collect();

    let (parenthesized, body) = match cleaned.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };
    if body.contains(['(', ')']) {
        return None;
    }

    let (minus, body) = strip_sign(body)?;
    let normalized = normalize_separators(body)?;
    let value = Decimal::from_str(&normalized).ok()?;
    if value.abs() > MAX_AMOUNT {
        return None;
    }

    Some(if parenthesized || minus { -value } else { value })
}

/// Amount for a row that splits outflows and inflows into two columns.
/// Debits become negative, credits positive; a nonzero credit wins when both
/// columns carry a value.
pub fn amount_from_debit_credit(debit: Option<&str>, credit: Option<&str>) -> Option<Decimal> {
    let debit = debit.and_then(try_parse_amount);
    let credit = credit.and_then(try_parse_amount);

    match (debit, credit) {
        (_, Some(c)) if !c.is_zero() => Some(c.abs()),
        (Some(d), _) if !d.is_zero() => Some(-d.abs()),
        (None, None) => None,
        _ => Some(Decimal::ZERO),
    }
}

/// Leading or trailing `-` marks a negative; a sign anywhere else is garbage
fn strip_sign(body: &str) -> Option<(bool, &str)> {
    let (minus, rest) = if let Some(rest) = body.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = body.strip_suffix('-') {
        (true, rest)
    } else if let Some(rest) = body.strip_prefix('+') {
        (false, rest)
    } else {
        (false, body)
    };

    if rest.contains(['-', '+']) {
        return None;
    }
    Some((minus, rest))
}

/// Resolve `,` and `.` into a plain decimal string.
///
/// A single comma within the last three characters is a decimal comma
/// (`12,50`, `1.234,56`); any other comma is a thousands separator.
fn normalize_separators(body: &str) -> Option<String> {
    let commas: Vec<usize> = body.match_indices(',').map(|(i, _)| i).collect();

    let mut normalized = match commas.as_slice() {
        [idx] if body.len() - idx <= 3 => body.replace('.', "").replace(',', "."),
        _ => {
            let without_commas = body.replace(',', "");
            if without_commas.matches('.').count() > 1 {
                without_commas.replace('.', "")
            } else {
                without_commas
            }
        }
    };

    if normalized.ends_with('.') {
        normalized.pop();
    }
    if normalized.starts_with('.') {
        normalized.insert(0, '0');
    }
    if normalized.is_empty() {
        return None;
    }
    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_canonical_forms() {
        assert_eq!(parse_amount("-4.50"), dec!(-4.50));
        assert_eq!(parse_amount("1500.00"), dec!(1500.00));
        assert_eq!(parse_amount("1,234.56"), dec!(1234.56));
        assert_eq!(parse_amount("(1,234.56)"), dec!(-1234.56));
        assert_eq!(parse_amount("(12.50)"), dec!(-12.50));
        assert_eq!(parse_amount("-1,234,567.89"), dec!(-1234567.89));
    }

    #[test]
    fn test_currency_symbols_and_whitespace() {
        assert_eq!(parse_amount("$1,234.56"), dec!(1234.56));
        assert_eq!(parse_amount(" -$4.50 "), dec!(-4.50));
        assert_eq!(parse_amount("£12.00"), dec!(12.00));
        assert_eq!(parse_amount("($99.99)"), dec!(-99.99));
        assert_eq!(parse_amount("+20"), dec!(20));
        assert_eq!(parse_amount("4.50-"), dec!(-4.50));
    }

    #[test]
    fn test_decimal_comma() {
        assert_eq!(parse_amount("12,50"), dec!(12.50));
        assert_eq!(parse_amount("-3,5"), dec!(-3.5));
        assert_eq!(parse_amount("1.234,56"), dec!(1234.56));
        assert_eq!(parse_amount("€ 1.234.567,00"), dec!(1234567.00));
        // Comma too far from the end is a thousands separator
        assert_eq!(parse_amount("1,234"), dec!(1234));
    }

    #[test]
    fn test_unparseable_is_zero() {
        assert_eq!(parse_amount(""), Decimal::ZERO);
        assert_eq!(parse_amount("n/a"), Decimal::ZERO);
        assert_eq!(parse_amount("1-2"), Decimal::ZERO);
        assert_eq!(try_parse_amount("abc"), None);
        assert_eq!(try_parse_amount("((5))"), None);
        assert_eq!(try_parse_amount("0"), Some(Decimal::ZERO));
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        assert_eq!(try_parse_amount("99999999999999.9999"), Some(MAX_AMOUNT));
        assert_eq!(try_parse_amount("-99999999999999.9999"), Some(-MAX_AMOUNT));
        assert_eq!(try_parse_amount("100000000000000"), None);
        assert_eq!(try_parse_amount("79228162514264337593543950335"), None);
        assert_eq!(try_parse_amount("-79228162514264337593543950335"), None);
        assert_eq!(amount_from_debit_credit(Some("100000000000000"), None), None);
    }

    #[test]
    fn test_debit_credit_pair() {
        assert_eq!(amount_from_debit_credit(Some("25.00"), Some("")), Some(dec!(-25.00)));
        assert_eq!(amount_from_debit_credit(Some(""), Some("100.00")), Some(dec!(100.00)));
        assert_eq!(amount_from_debit_credit(Some("-25.00"), None), Some(dec!(-25.00)));
        assert_eq!(amount_from_debit_credit(Some("0.00"), Some("0")), Some(Decimal::ZERO));
        assert_eq!(amount_from_debit_credit(Some(""), Some("")), None);
        assert_eq!(amount_from_debit_credit(None, None), None);
    }

    #[test]
    fn test_credit_wins_when_both_present() {
        assert_eq!(amount_from_debit_credit(Some("10.00"), Some("15.00")), Some(dec!(15.00)));
        assert_eq!(amount_from_debit_credit(Some("10.00"), Some("0.00")), Some(dec!(-10.00)));
    }
}
