use serde::Serialize;
use tracing::debug;

use crate::sitecheck::tools::layout::SheetLayout;
use crate::sitecheck::tools::model::{CellValue, InspectionRow, ProjectMetadata, SHEET_COLUMNS};
use crate::sitecheck::tools::schema::Field;

/// Inclusive rectangular cell range, 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRange {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl CellRange {
    /// Vertical range covering rows `first_row..=last_row` of a single column.
    pub fn column_span(col: u16, first_row: u32, last_row: u32) -> Self {
        Self {
            first_row,
            first_col: col,
            last_row,
            last_col: col,
        }
    }
}

/// A checklist laid out as the human-authored sheet, ready for a writer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedSheet {
    pub sheet_name: String,
    pub cells: Vec<Vec<CellValue>>,
    /// Vertical merges over runs of equal categories.
    pub merges: Vec<CellRange>,
    pub column_widths: Vec<f64>,
    /// Data rows only; `None` when the checklist has no rows.
    pub print_area: Option<CellRange>,
}

impl EncodedSheet {
    /// Cell at the given position, if the grid addresses it.
    pub fn cell(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cells.get(row as usize)?.get(usize::from(col))
    }
}

/// Lays out metadata and rows in the sheet's human-authored format.
pub fn encode(
    metadata: &ProjectMetadata,
    rows: &[InspectionRow],
    layout: &SheetLayout,
) -> EncodedSheet {
    let grid: Vec<Vec<CellValue>> = rows.iter().map(InspectionRow::sheet_cells).collect();
    encode_grid(metadata, &grid, layout)
}

/// Encodes an edited grid (header row excluded). Rows are cut or padded to
/// the seven sheet columns, which drops the editor's helper column.
pub fn encode_grid(
    metadata: &ProjectMetadata,
    grid: &[Vec<CellValue>],
    layout: &SheetLayout,
) -> EncodedSheet {
    let mut cells = preamble(metadata, layout);
    cells.push(
        (0..SHEET_COLUMNS)
            .map(|column| CellValue::text(layout.header(column)))
            .collect(),
    );
    cells.resize_with(layout.data_start_row.max(cells.len()), Vec::new);

    let data_start = cells.len();
    cells.extend(grid.iter().map(|row| fit_row(row)));

    let merges = category_merges(&cells[data_start..], data_start as u32);
    let print_area = (!grid.is_empty()).then(|| CellRange {
        first_row: data_start as u32,
        first_col: 0,
        last_row: (cells.len() - 1) as u32,
        last_col: (SHEET_COLUMNS - 1) as u16,
    });

    let mut column_widths: Vec<f64> = layout
        .column_widths
        .iter()
        .copied()
        .take(SHEET_COLUMNS)
        .collect();
    column_widths.resize(SHEET_COLUMNS, 8.43);

    debug!(
        rows = grid.len(),
        merges = merges.len(),
        "encoded checklist sheet"
    );

    EncodedSheet {
        sheet_name: layout.sheet_name.clone(),
        cells,
        merges,
        column_widths,
        print_area,
    }
}

/// Rows above the header: blank lines plus one labelled row per metadata field.
fn preamble(metadata: &ProjectMetadata, layout: &SheetLayout) -> Vec<Vec<CellValue>> {
    let values = [
        &metadata.project_name,
        &metadata.location,
        &metadata.general_manager,
        &metadata.inspector,
        &metadata.inspection_date,
    ];

    let mut rows = vec![Vec::new(); layout.header_row.max(layout.metadata_end_row() + 1)];
    for (slot, value) in values.into_iter().enumerate() {
        let row = &mut rows[layout.metadata_start_row + slot];
        row.resize(layout.metadata_value_column + 1, CellValue::Empty);
        if layout.metadata_value_column > 0 {
            row[0] = CellValue::text(layout.metadata_label(slot));
        }
        row[layout.metadata_value_column] = CellValue::text(value.as_str());
    }
    rows
}

fn fit_row(row: &[CellValue]) -> Vec<CellValue> {
    let mut fitted: Vec<CellValue> = row.iter().take(SHEET_COLUMNS).cloned().collect();
    fitted.resize(SHEET_COLUMNS, CellValue::Empty);
    fitted
}

/// Merge ranges for every run of two or more consecutive rows sharing the
/// same non-empty category. `offset` is the sheet row of `rows[0]`.
fn category_merges(rows: &[Vec<CellValue>], offset: u32) -> Vec<CellRange> {
    let column = Field::Category.position();
    let categories: Vec<String> = rows
        .iter()
        .map(|row| row.get(column).map(CellValue::trimmed).unwrap_or_default())
        .collect();

    let mut merges = Vec::new();
    let mut start = 0;
    while start < categories.len() {
        let mut end = start;
        while end + 1 < categories.len() && categories[end + 1] == categories[start] {
            end += 1;
        }
        if end > start && !categories[start].is_empty() {
            merges.push(CellRange::column_span(
                column as u16,
                offset + start as u32,
                offset + end as u32,
            ));
        }
        start = end + 1;
    }
    merges
}
