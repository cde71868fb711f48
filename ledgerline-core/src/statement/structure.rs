//! Fail-fast structural checks before any row is parsed

use serde::{Serialize, Serializer};

use super::columns::detect_columns;
use super::{RawRow, StructuralError};

/// Outcome of [`validate_structure`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureReport {
    pub is_valid: bool,
    pub headers: Vec<String>,
    #[serde(
        rename = "errorMessage",
        serialize_with = "serialize_error",
        skip_serializing_if = "Option::is_none"
    )]
    pub error: Option<StructuralError>,
}

impl StructureReport {
    fn valid(headers: Vec<String>) -> Self {
        Self { is_valid: true, headers, error: None }
    }

    fn invalid(headers: Vec<String>, error: StructuralError) -> Self {
        Self { is_valid: false, headers, error: Some(error) }
    }

    /// Headers when valid, the blocking error otherwise
    pub fn into_result(self) -> Result<Vec<String>, StructuralError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.headers),
        }
    }
}

fn serialize_error<S: Serializer>(
    error: &Option<StructuralError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(err) => serializer.serialize_str(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Check that `text` is a CSV with a header row, at least one data row, and
/// recognizable date, description and amount columns.
///
/// Positional fallbacks do not count: a header has to actually look like the
/// field for the file to pass.
pub fn validate_structure(text: &str) -> StructureReport {
    if text.trim().is_empty() {
        return StructureReport::invalid(Vec::new(), StructuralError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(record) => record.iter().map(|h| h.trim().to_string()).collect(),
        Err(e) => {
            return StructureReport::invalid(Vec::new(), StructuralError::Unreadable(e.to_string()))
        }
    };
    if headers.iter().all(|h| h.is_empty()) {
        return StructureReport::invalid(headers, StructuralError::NoHeader);
    }

    let mut has_data = false;
    for (i, record) in reader.records().enumerate() {
        match record {
            Ok(record) => {
                if !RawRow::new(i + 1, record).is_blank() {
                    has_data = true;
                    break;
                }
            }
            Err(e) => {
                return StructureReport::invalid(headers, StructuralError::Unreadable(e.to_string()))
            }
        }
    }
    if !has_data {
        return StructureReport::invalid(headers, StructuralError::NoDataRows);
    }

    let mapping = detect_columns(&headers);
    let mut missing = Vec::new();
    if !mapping.date.is_detected() {
        missing.push("date");
    }
    if !mapping.description.is_detected() {
        missing.push("description");
    }
    if !mapping.has_detected_amount() {
        missing.push("amount");
    }

    let error = match missing.as_slice() {
        [] => return StructureReport::valid(headers),
        ["date"] => StructuralError::MissingDate,
        ["description"] => StructuralError::MissingDescription,
        ["amount"] => StructuralError::MissingAmount,
        [_, _, _] => StructuralError::MissingAllRequired,
        _ => StructuralError::MissingColumns(missing),
    };
    StructureReport::invalid(headers, error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_of(text: &str) -> Option<StructuralError> {
        validate_structure(text).error
    }

    #[test]
    fn test_valid_file() {
        let report = validate_structure("Date,Description,Amount\n2024-01-05,Coffee,-4.50\n");
        assert!(report.is_valid);
        assert_eq!(report.headers, vec!["Date", "Description", "Amount"]);
        assert_eq!(report.error, None);
    }

    #[test]
    fn test_debit_credit_counts_as_amount() {
        let report = validate_structure("Date,Memo,Debit,Credit\n2024-01-05,Coffee,4.50,\n");
        assert!(report.is_valid);
    }

    #[test]
    fn test_quoted_fields() {
        let text = "Date,Description,Amount\n2024-01-05,\"Coffee, large\nwith note\",-4.50\n";
        assert!(validate_structure(text).is_valid);
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(error_of(""), Some(StructuralError::Empty));
        assert_eq!(error_of("  \n\n"), Some(StructuralError::Empty));
    }

    #[test]
    fn test_no_header() {
        assert_eq!(error_of(",,\n2024-01-05,Coffee,-4.50\n"), Some(StructuralError::NoHeader));
    }

    #[test]
    fn test_no_data_rows() {
        assert_eq!(error_of("Date,Description,Amount\n"), Some(StructuralError::NoDataRows));
        assert_eq!(error_of("Date,Description,Amount\n,,\n"), Some(StructuralError::NoDataRows));
    }

    #[test]
    fn test_missing_columns_are_distinguished() {
        assert_eq!(error_of("Foo,Bar,Baz\n1,2,3\n"), Some(StructuralError::MissingAllRequired));
        assert_eq!(error_of("Foo,Description,Amount\n1,2,3\n"), Some(StructuralError::MissingDate));
        assert_eq!(error_of("Date,Foo,Amount\n1,2,3\n"), Some(StructuralError::MissingDescription));
        assert_eq!(error_of("Date,Description,Foo\n1,2,3\n"), Some(StructuralError::MissingAmount));
        assert_eq!(
            error_of("Date,Foo,Bar\n1,2,3\n"),
            Some(StructuralError::MissingColumns(vec!["description", "amount"]))
        );
    }

    #[test]
    fn test_report_serializes_message() {
        let json = serde_json::to_value(validate_structure("Date,Description,Foo\n1,2,3\n")).unwrap();
        assert_eq!(json["isValid"], false);
        assert_eq!(json["errorMessage"], "CSV is missing an amount column");
    }

    #[test]
    fn test_into_result() {
        assert!(validate_structure("").into_result().is_err());
        let headers = validate_structure("Date,Memo,Amount\n1,2,3\n").into_result().unwrap();
        assert_eq!(headers.len(), 3);
    }
}
