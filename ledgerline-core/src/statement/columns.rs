//! Header detection: which column holds which logical field

use serde::Serialize;

/// How a column position was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnSource {
    /// A header matched one of the field's keywords
    Detected,
    /// No header matched; the conventional position was assumed
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnRef {
    pub index: usize,
    pub source: ColumnSource,
}

impl ColumnRef {
    fn detected(index: usize) -> Self {
        Self { index, source: ColumnSource::Detected }
    }

    fn fallback(index: usize) -> Self {
        Self { index, source: ColumnSource::Fallback }
    }

    pub fn is_detected(&self) -> bool {
        self.source == ColumnSource::Detected
    }
}

/// Where the signed amount comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AmountColumns {
    Single(ColumnRef),
    /// Outflows and inflows in separate columns; at least one is present
    DebitCredit {
        debit: Option<usize>,
        credit: Option<usize>,
    },
}

/// Logical field positions for one CSV file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    pub date: ColumnRef,
    pub description: ColumnRef,
    pub amount: AmountColumns,
    pub balance: Option<usize>,
    pub category: Option<usize>,
}

impl ColumnMapping {
    pub fn has_detected_amount(&self) -> bool {
        match self.amount {
            AmountColumns::Single(col) => col.is_detected(),
            AmountColumns::DebitCredit { .. } => true,
        }
    }

    /// Fields whose position is a guess, with the guessed index
    pub fn fallback_fields(&self) -> Vec<(&'static str, usize)> {
        let mut guessed = Vec::new();
        if !self.date.is_detected() {
            guessed.push(("date", self.date.index));
        }
        if !self.description.is_detected() {
            guessed.push(("description", self.description.index));
        }
        if let AmountColumns::Single(col) = self.amount {
            if !col.is_detected() {
                guessed.push(("amount", col.index));
            }
        }
        guessed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Date,
    Description,
    Amount,
    Debit,
    Credit,
    Balance,
    Category,
}

/// Tie-break order when two fields score the same header. A signed amount
/// column beats debit/credit, so `Payment Amount` stays a single column.
const FIELDS: [Field; 7] = [
    Field::Date,
    Field::Description,
    Field::Amount,
    Field::Debit,
    Field::Credit,
    Field::Balance,
    Field::Category,
];

impl Field {
    fn keywords(self) -> &'static [&'static str] {
        match self {
            Field::Date => &[
                "date", "time", "dt", "trans date", "transaction date", "posted date",
                "posting date", "timestamp",
            ],
            Field::Description => &[
                "description", "desc", "memo", "narrative", "narration", "details",
                "transaction", "note",
            ],
            Field::Amount => &["amount", "amt", "sum", "value", "total"],
            Field::Debit => &["debit", "dr", "payment", "paid", "withdrawal"],
            Field::Credit => &["credit", "cr", "deposit", "received"],
            Field::Balance => &["balance", "running balance", "account balance"],
            Field::Category => &["category", "type", "transaction type"],
        }
    }
}

const EXACT: u8 = 3;
const WHOLE_WORD: u8 = 2;
const SUBSTRING: u8 = 1;

/// Keywords shorter than this only match as a whole word
const MIN_SUBSTRING_LEN: usize = 4;

/// Map headers to logical fields. Never fails: unmatched required fields get
/// their conventional position (date 0, description 1, amount 2).
pub fn detect_columns(headers: &[String]) -> ColumnMapping {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

    // (score, field rank, column)
    let mut candidates: Vec<(u8, usize, usize)> = Vec::new();
    for (rank, field) in FIELDS.iter().enumerate() {
        for (col, header) in normalized.iter().enumerate() {
            let score = score_header(header, field.keywords());
            if score > 0 {
                candidates.push((score, rank, col));
            }
        }
    }
    candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut assigned: [Option<usize>; FIELDS.len()] = [None; FIELDS.len()];
    let mut used = vec![false; headers.len()];
    for (_, rank, col) in candidates {
        if assigned[rank].is_none() && !used[col] {
            assigned[rank] = Some(col);
            used[col] = true;
        }
    }
    let found = |field: Field| {
        FIELDS
            .iter()
            .position(|f| *f == field)
            .and_then(|rank| assigned[rank])
    };

    let scores = |col: usize, field: Field| score_header(&normalized[col], field.keywords()) > 0;

    // An amount header that also names a side (`Debit Amount`) only splits
    // when the opposite side has its own column
    let amount = match (found(Field::Amount), found(Field::Debit), found(Field::Credit)) {
        (Some(col), None, Some(credit)) if scores(col, Field::Debit) => {
            AmountColumns::DebitCredit { debit: Some(col), credit: Some(credit) }
        }
        (Some(col), Some(debit), None) if scores(col, Field::Credit) => {
            AmountColumns::DebitCredit { debit: Some(debit), credit: Some(col) }
        }
        (Some(col), _, _) => AmountColumns::Single(ColumnRef::detected(col)),
        (None, debit, credit) if debit.is_some() || credit.is_some() => {
            AmountColumns::DebitCredit { debit, credit }
        }
        _ => AmountColumns::Single(ColumnRef::fallback(2)),
    };

    ColumnMapping {
        date: found(Field::Date).map_or(ColumnRef::fallback(0), ColumnRef::detected),
        description: found(Field::Description).map_or(ColumnRef::fallback(1), ColumnRef::detected),
        amount,
        balance: found(Field::Balance),
        category: found(Field::Category),
    }
}

/// Lowercase, `_`/`-`/`.` as spaces, single-spaced
fn normalize_header(header: &str) -> String {
    header
        .trim()
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .replace(['_', '-', '.'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn score_header(header: &str, keywords: &[&str]) -> u8 {
    keywords
        .iter()
        .map(|kw| {
            if header == *kw {
                EXACT
            } else if contains_words(header, kw) {
                WHOLE_WORD
            } else if kw.len() >= MIN_SUBSTRING_LEN && header.contains(kw) {
                SUBSTRING
            } else {
                0
            }
        })
        .max()
        .unwrap_or(0)
}

/// True when `keyword`'s words appear contiguously in `header`'s words
fn contains_words(header: &str, keyword: &str) -> bool {
    let header_words: Vec<&str> = header
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let keyword_words: Vec<&str> = keyword.split_whitespace().collect();
    if keyword_words.is_empty() || keyword_words.len() > header_words.len() {
        return false;
    }
    header_words
        .windows(keyword_words.len())
        .any(|w| w == keyword_words.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_standard_headers() {
        let m = detect_columns(&headers(&["Date", "Description", "Amount", "Balance"]));
        assert_eq!(m.date, ColumnRef::detected(0));
        assert_eq!(m.description, ColumnRef::detected(1));
        assert_eq!(m.amount, AmountColumns::Single(ColumnRef::detected(2)));
        assert_eq!(m.balance, Some(3));
        assert_eq!(m.category, None);
        assert!(m.fallback_fields().is_empty());
    }

    #[test]
    fn test_case_and_synonyms() {
        let m = detect_columns(&headers(&["MEMO", "Posted_Date", "Type", "amt"]));
        assert_eq!(m.date.index, 1);
        assert_eq!(m.description.index, 0);
        assert_eq!(m.amount, AmountColumns::Single(ColumnRef::detected(3)));
        assert_eq!(m.category, Some(2));
    }

    #[test]
    fn test_one_column_serves_one_field() {
        // "Transaction Date" must not also become the description
        let m = detect_columns(&headers(&["Transaction Date", "Transaction", "Amount"]));
        assert_eq!(m.date.index, 0);
        assert_eq!(m.description.index, 1);

        let m = detect_columns(&headers(&["Transaction Type", "Date", "Details", "Value"]));
        assert_eq!(m.category, Some(0));
        assert_eq!(m.description.index, 2);
    }

    #[test]
    fn test_short_keywords_need_whole_word() {
        // "address" contains "dr" and "credit card" contains "cr"; neither counts
        let m = detect_columns(&headers(&["Date", "Memo", "Amount", "Address"]));
        assert_eq!(m.amount, AmountColumns::Single(ColumnRef::detected(2)));

        let m = detect_columns(&headers(&["Date", "Memo", "Dr", "Cr"]));
        assert_eq!(m.amount, AmountColumns::DebitCredit { debit: Some(2), credit: Some(3) });
    }

    #[test]
    fn test_debit_credit_pair() {
        let m = detect_columns(&headers(&["Date", "Details", "Debit", "Credit", "Balance"]));
        assert_eq!(m.amount, AmountColumns::DebitCredit { debit: Some(2), credit: Some(3) });
        assert!(m.has_detected_amount());

        let m = detect_columns(&headers(&["Date", "Details", "Debit Amount", "Credit Amount"]));
        assert_eq!(m.amount, AmountColumns::DebitCredit { debit: Some(2), credit: Some(3) });

        let m = detect_columns(&headers(&["Date", "Details", "Withdrawal"]));
        assert_eq!(m.amount, AmountColumns::DebitCredit { debit: Some(2), credit: None });
    }

    #[test]
    fn test_amount_header_naming_one_side_stays_single() {
        let m = detect_columns(&headers(&["Date", "Description", "Payment Amount"]));
        assert_eq!(m.amount, AmountColumns::Single(ColumnRef::detected(2)));

        let m = detect_columns(&headers(&["Date", "Description", "Amount Received"]));
        assert_eq!(m.amount, AmountColumns::Single(ColumnRef::detected(2)));

        let m = detect_columns(&headers(&["Date", "Description", "Paid Amount", "Balance"]));
        assert_eq!(m.amount, AmountColumns::Single(ColumnRef::detected(2)));
        assert_eq!(m.balance, Some(3));
    }

    #[test]
    fn test_positional_fallbacks() {
        let m = detect_columns(&headers(&["a", "b", "c"]));
        assert_eq!(m.date, ColumnRef::fallback(0));
        assert_eq!(m.description, ColumnRef::fallback(1));
        assert_eq!(m.amount, AmountColumns::Single(ColumnRef::fallback(2)));
        assert!(!m.has_detected_amount());
        assert_eq!(
            m.fallback_fields(),
            vec![("date", 0), ("description", 1), ("amount", 2)]
        );
    }

    #[test]
    fn test_exact_match_beats_partial() {
        let m = detect_columns(&headers(&["Payment Date", "Date", "Narrative", "Amount"]));
        assert_eq!(m.date.index, 1);
        // The leftover "Payment Date" column is taken as a debit column, but a
        // single amount column still wins
        assert_eq!(m.amount, AmountColumns::Single(ColumnRef::detected(3)));
    }

    #[test]
    fn test_byte_order_mark_ignored() {
        let m = detect_columns(&headers(&["\u{feff}Date", "Description", "Amount"]));
        assert_eq!(m.date, ColumnRef::detected(0));
    }
}
