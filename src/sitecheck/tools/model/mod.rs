use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Format used for every calendar date the crate emits.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Shared empty cell handed out for ragged rows.
pub static EMPTY_CELL: CellValue = CellValue::Empty;

/// A primitive spreadsheet cell as produced by the reader adapter and consumed
/// by the writer adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    /// Cell without content.
    #[default]
    Empty,
    /// Plain string cell.
    Text(String),
    /// Numeric cell. Serial dates arrive here when the source stored no date format.
    Number(f64),
    /// Boolean cell.
    Boolean(bool),
    /// Date cell that the reader already recognised as a calendar date.
    Date(NaiveDate),
}

impl CellValue {
    /// Builds a text cell.
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// Coerces the cell into the string a user would see in the sheet.
    ///
    /// Whole numbers render without a decimal point so that a numeric `3` in a
    /// text column reads back as `"3"`.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(value) => value.clone(),
            CellValue::Number(value) => value.to_string(),
            CellValue::Boolean(value) => value.to_string(),
            CellValue::Date(date) => date.format(ISO_DATE_FORMAT).to_string(),
        }
    }

    /// Trimmed text coercion.
    pub fn trimmed(&self) -> String {
        self.to_text().trim().to_string()
    }

    /// Whether the cell is empty or whitespace-only after string coercion.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(value) => value.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

/// Project header block read from the fixed metadata rows of a checklist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    pub project_name: String,
    pub location: String,
    pub general_manager: String,
    pub inspector: String,
    /// ISO `yyyy-mm-dd` date, or empty when the sheet carries none.
    pub inspection_date: String,
}

/// Validated `achieved/maximum` pair parsed from a score-range cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: u32,
    pub max: u32,
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self { min: 0, max: 1 }
    }
}

/// One checklist line item in the normalized row model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRow {
    /// Major category. Never empty once decoded.
    pub category: String,
    pub subcategory: String,
    pub sub_subcategory: String,
    pub task: String,
    pub assignee: String,
    pub achieved_score: u32,
    /// Maximum score taken from the range text, at least 1.
    pub max_score: u32,
    pub score_range_text: String,
}

/// Number of columns a checklist occupies in the sheet.
pub const SHEET_COLUMNS: usize = 7;

impl InspectionRow {
    /// The seven sheet columns of this row, in sheet order.
    pub fn sheet_cells(&self) -> Vec<CellValue> {
        vec![
            CellValue::text(&self.category),
            CellValue::text(&self.subcategory),
            CellValue::text(&self.sub_subcategory),
            CellValue::text(&self.task),
            CellValue::text(&self.assignee),
            CellValue::Number(f64::from(self.achieved_score)),
            CellValue::text(&self.score_range_text),
        ]
    }

    /// Editing-grid row: the sheet columns plus the effective max score as a
    /// trailing helper column. The helper column never reaches the file.
    pub fn to_cells(&self) -> Vec<CellValue> {
        let mut cells = self.sheet_cells();
        cells.push(CellValue::Number(f64::from(self.max_score)));
        cells
    }
}

/// Project record kept by the external project store.
///
/// Only `file_path` is consumed by this crate; the remaining fields are
/// refreshed from decoded metadata and handed back for the caller to persist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: u64,
    pub project_name: String,
    pub location: String,
    pub general_manager: String,
    pub inspector: String,
    pub inspection_date: String,
    pub file_path: String,
    pub upload_date: String,
    pub last_modified: String,
}

impl ProjectRecord {
    /// Returns a copy of the record carrying `metadata` and stamped as modified on `today`.
    pub fn apply_metadata(&self, metadata: &ProjectMetadata, today: NaiveDate) -> ProjectRecord {
        ProjectRecord {
            project_name: metadata.project_name.clone(),
            location: metadata.location.clone(),
            general_manager: metadata.general_manager.clone(),
            inspector: metadata.inspector.clone(),
            inspection_date: metadata.inspection_date.clone(),
            last_modified: today.format(ISO_DATE_FORMAT).to_string(),
            ..self.clone()
        }
    }

    /// Metadata view of the record, used when saving a sheet from stored project data.
    pub fn metadata(&self) -> ProjectMetadata {
        ProjectMetadata {
            project_name: self.project_name.clone(),
            location: self.location.clone(),
            general_manager: self.general_manager.clone(),
            inspector: self.inspector.clone(),
            inspection_date: self.inspection_date.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_coerce_without_fraction() {
        assert_eq!(CellValue::Number(3.0).to_text(), "3");
        assert_eq!(CellValue::Number(2.5).to_text(), "2.5");
    }

    #[test]
    fn numeric_zero_is_not_blank() {
        assert!(!CellValue::Number(0.0).is_blank());
        assert!(CellValue::text("   ").is_blank());
        assert!(CellValue::Empty.is_blank());
    }

    #[test]
    fn editing_grid_row_carries_helper_column() {
        let row = InspectionRow {
            category: "Survey".into(),
            achieved_score: 2,
            max_score: 5,
            score_range_text: "0/5".into(),
            ..InspectionRow::default()
        };
        let cells = row.to_cells();
        assert_eq!(cells.len(), SHEET_COLUMNS + 1);
        assert_eq!(cells[SHEET_COLUMNS], CellValue::Number(5.0));
    }

    #[test]
    fn record_refresh_keeps_identity_fields() {
        let record = ProjectRecord {
            id: 7,
            file_path: "/uploads/site.xlsx".into(),
            upload_date: "2025-05-01".into(),
            ..ProjectRecord::default()
        };
        let metadata = ProjectMetadata {
            project_name: "Bridge".into(),
            inspection_date: "2025-06-03".into(),
            ..ProjectMetadata::default()
        };
        let today = NaiveDate::from_ymd_opt(2025, 6, 4).unwrap();
        let updated = record.apply_metadata(&metadata, today);
        assert_eq!(updated.id, 7);
        assert_eq!(updated.file_path, "/uploads/site.xlsx");
        assert_eq!(updated.project_name, "Bridge");
        assert_eq!(updated.last_modified, "2025-06-04");
        assert_eq!(updated.metadata(), metadata);
    }
}
