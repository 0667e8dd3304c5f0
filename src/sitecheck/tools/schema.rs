use crate::sitecheck::tools::error::{Result, ToolError};
use crate::sitecheck::tools::layout::SheetLayout;
use crate::sitecheck::tools::model::{CellValue, EMPTY_CELL, SHEET_COLUMNS};

/// Fields of a checklist row, in canonical sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Category,
    Subcategory,
    SubSubcategory,
    Task,
    Assignee,
    AchievedScore,
    ScoreRange,
}

impl Field {
    pub const ALL: [Field; SHEET_COLUMNS] = [
        Field::Category,
        Field::Subcategory,
        Field::SubSubcategory,
        Field::Task,
        Field::Assignee,
        Field::AchievedScore,
        Field::ScoreRange,
    ];

    /// Column the field occupies in the canonical layout.
    pub fn position(self) -> usize {
        self as usize
    }
}

/// Field → column mapping used while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    columns: [usize; SHEET_COLUMNS],
}

impl ColumnMap {
    /// The fixed positional layout used when no header row is present.
    pub fn positional() -> Self {
        Self {
            columns: Field::ALL.map(Field::position),
        }
    }

    /// Resolves each field by its header label, so reordered columns still
    /// decode correctly. A missing label is an error rather than a silent
    /// misread.
    pub fn from_header(header: &[CellValue], layout: &SheetLayout) -> Result<Self> {
        let labels: Vec<String> = header.iter().map(CellValue::trimmed).collect();
        let mut columns = [0; SHEET_COLUMNS];
        for field in Field::ALL {
            let expected = layout.header(field.position()).trim();
            columns[field.position()] = labels
                .iter()
                .position(|label| label == expected)
                .ok_or_else(|| ToolError::MissingColumn {
                    label: expected.to_string(),
                })?;
        }
        Ok(Self { columns })
    }

    /// Column index holding `field`.
    pub fn column(&self, field: Field) -> usize {
        self.columns[field.position()]
    }

    /// Cell for `field` in `row`; ragged rows read as empty.
    pub fn cell<'a>(&self, row: &'a [CellValue], field: Field) -> &'a CellValue {
        row.get(self.column(field)).unwrap_or(&EMPTY_CELL)
    }
}

/// Whether `row` is a header row according to the layout's sentinel label.
pub fn is_header_row(row: &[CellValue], layout: &SheetLayout) -> bool {
    row.first()
        .is_some_and(|cell| cell.trimmed() == layout.header_sentinel().trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(labels: &[&str]) -> Vec<CellValue> {
        labels.iter().map(|label| CellValue::text(*label)).collect()
    }

    #[test]
    fn positional_map_is_identity() {
        let map = ColumnMap::positional();
        for field in Field::ALL {
            assert_eq!(map.column(field), field.position());
        }
    }

    #[test]
    fn reordered_header_resolves_by_label() {
        let layout = SheetLayout::default();
        let row = header(&["대분류", "중분류", "소분류", "임무", "점수", "담당자", "점수 범위"]);
        let map = ColumnMap::from_header(&row, &layout).unwrap();
        assert_eq!(map.column(Field::Assignee), 5);
        assert_eq!(map.column(Field::AchievedScore), 4);
    }

    #[test]
    fn missing_label_fails_fast() {
        let layout = SheetLayout::default();
        let row = header(&["대분류", "중분류", "소분류", "임무", "담당자", "점수"]);
        let err = ColumnMap::from_header(&row, &layout).unwrap_err();
        assert!(matches!(err, ToolError::MissingColumn { label } if label == "점수 범위"));
    }

    #[test]
    fn header_detection_uses_sentinel() {
        let layout = SheetLayout::default();
        assert!(is_header_row(&header(&[" 대분류 "]), &layout));
        assert!(!is_header_row(&header(&["Survey"]), &layout));
        assert!(!is_header_row(&[], &layout));
    }

    #[test]
    fn ragged_rows_read_as_empty() {
        let map = ColumnMap::positional();
        let row = header(&["Survey"]);
        assert_eq!(map.cell(&row, Field::ScoreRange), &CellValue::Empty);
    }
}
