//! Tabular export for reports.
//!
//! Report rows are JSON objects whose key order is the column order.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::AppError;

/// A report row.
pub type Row = Map<String, Value>;

/// Requested download format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated values.
    #[default]
    Csv,
    /// Pretty-printed JSON array.
    Json,
    /// Not rendered; served as CSV.
    Pdf,
}

impl ExportFormat {
    /// The format actually produced.
    #[must_use]
    pub const fn effective(self) -> Self {
        match self {
            Self::Pdf => Self::Csv,
            other => other,
        }
    }

    /// File extension of the produced file.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self.effective() {
            Self::Json => "json",
            _ => "csv",
        }
    }

    /// Content type of the produced file.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self.effective() {
            Self::Json => "application/json",
            _ => "text/csv; charset=utf-8",
        }
    }

    /// Notice to show when the requested format is not produced as asked.
    #[must_use]
    pub const fn fallback_notice(self) -> Option<&'static str> {
        match self {
            Self::Pdf => Some("PDF export coming soon! Using CSV for now."),
            _ => None,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pdf" => Ok(Self::Pdf),
            other => Err(AppError::BadRequest(format!("Unsupported export format: {other}"))),
        }
    }
}

/// Quote one CSV field. Every field is quoted; embedded quotes are doubled.
#[must_use]
pub fn csv_field(value: &Value) -> String {
    let raw = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!("\"{}\"", raw.replace('"', "\"\""))
}

/// Render rows as CSV with a header taken from the first row's keys.
///
/// Returns `None` for an empty dataset.
#[must_use]
pub fn rows_to_csv(rows: &[Row]) -> Option<String> {
    let first = rows.first()?;
    let headers: Vec<&String> = first.keys().collect();

    let mut out = headers
        .iter()
        .map(|h| csv_field(&Value::String((*h).clone())))
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');

    for row in rows {
        let line = headers
            .iter()
            .map(|h| csv_field(row.get(*h).unwrap_or(&Value::Null)))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }

    Some(out)
}

/// Render rows as pretty-printed JSON (2-space indent).
///
/// Returns `None` for an empty dataset.
#[must_use]
pub fn rows_to_json(rows: &[Row]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }
    serde_json::to_string_pretty(rows).ok()
}

/// Render rows in the requested format.
#[must_use]
pub fn render(rows: &[Row], format: ExportFormat) -> Option<String> {
    match format.effective() {
        ExportFormat::Json => rows_to_json(rows),
        _ => rows_to_csv(rows),
    }
}

/// Download name without extension, e.g. `donations_report_2025-03-01`.
#[must_use]
pub fn report_filename(report_type: &str, date: NaiveDate) -> String {
    format!("{report_type}_report_{}", date.format("%Y-%m-%d"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_csv_quotes_everything() {
        let rows = vec![
            row(json!({"id": "d1", "title": "Rice \"jasmine\"", "views_count": 3, "notes": null})),
            row(json!({"id": "d2", "title": "Bread, whole", "views_count": 0, "notes": "x"})),
        ];

        let csv = rows_to_csv(&rows).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "\"id\",\"title\",\"views_count\",\"notes\"");
        assert_eq!(lines[1], "\"d1\",\"Rice \"\"jasmine\"\"\",\"3\",\"\"");
        assert_eq!(lines[2], "\"d2\",\"Bread, whole\",\"0\",\"x\"");
    }

    #[test]
    fn test_csv_header_follows_first_row_order() {
        let rows = vec![row(json!({"zeta": 1, "alpha": 2}))];
        let csv = rows_to_csv(&rows).unwrap();
        assert!(csv.starts_with("\"zeta\",\"alpha\""));
    }

    #[test]
    fn test_empty_dataset_has_no_export() {
        assert!(rows_to_csv(&[]).is_none());
        assert!(rows_to_json(&[]).is_none());
    }

    #[test]
    fn test_json_is_pretty_two_space() {
        let rows = vec![row(json!({"id": "u1"}))];
        let out = rows_to_json(&rows).unwrap();
        assert_eq!(out, "[\n  {\n    \"id\": \"u1\"\n  }\n]");
    }

    #[test]
    fn test_pdf_falls_back_to_csv() {
        let format: ExportFormat = "pdf".parse().unwrap();
        assert_eq!(format.effective(), ExportFormat::Csv);
        assert_eq!(format.extension(), "csv");
        assert!(format.fallback_notice().is_some());
        assert!("xlsx".parse::<ExportFormat>().is_err());
        assert_eq!("".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
    }

    #[test]
    fn test_report_filename() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(report_filename("donations", date), "donations_report_2025-03-01");
    }
}
