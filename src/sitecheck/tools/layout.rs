use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sitecheck::tools::error::Result;
use crate::sitecheck::tools::model::SHEET_COLUMNS;

/// Default header labels, in sheet column order.
pub const DEFAULT_HEADERS: [&str; SHEET_COLUMNS] =
    ["대분류", "중분류", "소분류", "임무", "담당자", "점수", "점수 범위"];

/// Labels written next to the five metadata values.
pub const DEFAULT_METADATA_LABELS: [&str; 5] = [
    "프로젝트명:",
    "현장(도시군구):",
    "총괄담당자:",
    "검수자:",
    "검수일자:",
];

/// Fixed conventions of the human-authored checklist sheet.
///
/// Every constant the decoder and encoder rely on lives here so a deployment
/// with a differently labelled template can override it from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SheetLayout {
    /// Row index of the first metadata value (project name).
    pub metadata_start_row: usize,
    /// Column index holding metadata values.
    pub metadata_value_column: usize,
    pub metadata_labels: Vec<String>,
    pub header_row: usize,
    pub data_start_row: usize,
    /// Header labels in sheet column order. The first one doubles as the
    /// sentinel that identifies a header row.
    pub headers: Vec<String>,
    /// Range text substituted for a blank score-range cell.
    pub default_score_range: String,
    pub column_widths: Vec<f64>,
    pub sheet_name: String,
    /// Reject non-integer achieved scores instead of coercing them to 0.
    pub strict_scores: bool,
    /// Category used when the first data row has a blank category. Without it
    /// such a sheet is rejected.
    pub category_fallback: Option<String>,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            metadata_start_row: 1,
            metadata_value_column: 1,
            metadata_labels: DEFAULT_METADATA_LABELS
                .iter()
                .map(|label| label.to_string())
                .collect(),
            header_row: 7,
            data_start_row: 8,
            headers: DEFAULT_HEADERS.iter().map(|label| label.to_string()).collect(),
            default_score_range: "0/1".to_string(),
            column_widths: vec![15.0, 26.0, 32.0, 88.0, 8.0, 8.0, 10.0],
            sheet_name: "업무 메뉴얼".to_string(),
            strict_scores: false,
            category_fallback: None,
        }
    }
}

impl SheetLayout {
    /// Loads a layout override from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Label that marks a header row.
    pub fn header_sentinel(&self) -> &str {
        self.headers.first().map(String::as_str).unwrap_or_default()
    }

    /// Header label for a sheet column, falling back to the built-in label.
    pub fn header(&self, column: usize) -> &str {
        self.headers
            .get(column)
            .map(String::as_str)
            .or_else(|| DEFAULT_HEADERS.get(column).copied())
            .unwrap_or_default()
    }

    /// Metadata label for the given slot, falling back to the built-in label.
    pub fn metadata_label(&self, slot: usize) -> &str {
        self.metadata_labels
            .get(slot)
            .map(String::as_str)
            .or_else(|| DEFAULT_METADATA_LABELS.get(slot).copied())
            .unwrap_or_default()
    }

    /// Last metadata row index (the inspection date).
    pub fn metadata_end_row(&self) -> usize {
        self.metadata_start_row + DEFAULT_METADATA_LABELS.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let layout: SheetLayout =
            serde_json::from_str(r#"{"strictScores": true, "sheetName": "Checklist"}"#).unwrap();
        assert!(layout.strict_scores);
        assert_eq!(layout.sheet_name, "Checklist");
        assert_eq!(layout.header_row, 7);
        assert_eq!(layout.header_sentinel(), "대분류");
    }

    #[test]
    fn short_header_list_falls_back_per_column() {
        let layout = SheetLayout {
            headers: vec!["Category".into()],
            ..SheetLayout::default()
        };
        assert_eq!(layout.header(0), "Category");
        assert_eq!(layout.header(6), "점수 범위");
        assert_eq!(layout.metadata_end_row(), 5);
    }
}
