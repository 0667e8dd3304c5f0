use chrono::{Datelike, Local};
use serde::Serialize;
use tracing::{debug, warn};

use crate::sitecheck::tools::date;
use crate::sitecheck::tools::error::{Result, ToolError};
use crate::sitecheck::tools::layout::SheetLayout;
use crate::sitecheck::tools::model::{CellValue, EMPTY_CELL, InspectionRow, ProjectMetadata};
use crate::sitecheck::tools::schema::{ColumnMap, Field, is_header_row};
use crate::sitecheck::tools::score::{self, ScoreCoercion};

/// Result of decoding a checklist sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedSheet {
    pub metadata: ProjectMetadata,
    /// Header labels in canonical field order: the sheet's own labels when a
    /// header row was found, otherwise the layout defaults.
    pub headers: Vec<String>,
    pub rows: Vec<InspectionRow>,
}

impl DecodedSheet {
    /// Editing grid: the header row followed by one row per item, each
    /// carrying the effective max score as a trailing helper column.
    pub fn editor_grid(&self) -> Vec<Vec<CellValue>> {
        let mut grid = Vec::with_capacity(self.rows.len() + 1);
        grid.push(self.headers.iter().map(CellValue::text).collect());
        grid.extend(self.rows.iter().map(InspectionRow::to_cells));
        grid
    }
}

/// Decodes a raw cell grid into metadata and normalized rows.
pub fn decode(cells: &[Vec<CellValue>], layout: &SheetLayout) -> Result<DecodedSheet> {
    decode_with_year(cells, layout, Local::now().year())
}

/// Same as [`decode`] with an explicit reference year for two-digit dates.
pub fn decode_with_year(
    cells: &[Vec<CellValue>],
    layout: &SheetLayout,
    current_year: i32,
) -> Result<DecodedSheet> {
    let metadata = read_metadata(cells, layout, current_year)?;

    let header_row = cells.get(layout.header_row).map(Vec::as_slice);
    let (columns, headers) = match header_row {
        Some(row) if is_header_row(row, layout) => {
            let columns = ColumnMap::from_header(row, layout)?;
            let headers = Field::ALL
                .iter()
                .map(|field| columns.cell(row, *field).trimmed())
                .collect();
            (columns, headers)
        }
        _ => {
            debug!(
                row = layout.header_row,
                "header row not found, using default column layout"
            );
            (ColumnMap::positional(), layout.headers.clone())
        }
    };

    let data = cells
        .iter()
        .enumerate()
        .skip(layout.data_start_row)
        .map(|(index, row)| (index + 1, row.as_slice()));
    let rows = normalize_rows(data, &columns, layout)?;

    Ok(DecodedSheet {
        metadata,
        headers,
        rows,
    })
}

/// Rebuilds rows from an edited grid in canonical column order. The grid
/// excludes the header row; the helper column, when present, is ignored and
/// the max score is derived again from the range text.
pub fn rows_from_grid(grid: &[Vec<CellValue>], layout: &SheetLayout) -> Result<Vec<InspectionRow>> {
    let data = grid
        .iter()
        .enumerate()
        .map(|(index, row)| (index + 1, row.as_slice()));
    normalize_rows(data, &ColumnMap::positional(), layout)
}

fn read_metadata(
    cells: &[Vec<CellValue>],
    layout: &SheetLayout,
    current_year: i32,
) -> Result<ProjectMetadata> {
    // Readers drop trailing blank rows, so absent metadata rows read as empty.
    if cells.is_empty() {
        return Err(ToolError::UnreadableSheet(
            "worksheet has no rows to read metadata from".into(),
        ));
    }

    let value = |slot: usize| metadata_cell(cells, layout, slot);

    let raw_date = value(4);
    let inspection_date = if raw_date.is_blank() {
        String::new()
    } else {
        let normalized = date::normalize_with_year(raw_date, current_year);
        if normalized.is_empty() {
            return Err(ToolError::InvalidDateFormat {
                field: layout.metadata_label(4).trim_end_matches(':').to_string(),
                raw: raw_date.to_text(),
            });
        }
        normalized
    };

    Ok(ProjectMetadata {
        project_name: value(0).trimmed(),
        location: value(1).trimmed(),
        general_manager: value(2).trimmed(),
        inspector: value(3).trimmed(),
        inspection_date,
    })
}

fn metadata_cell<'a>(cells: &'a [Vec<CellValue>], layout: &SheetLayout, slot: usize) -> &'a CellValue {
    cells
        .get(layout.metadata_start_row + slot)
        .and_then(|row| row.get(layout.metadata_value_column))
        .unwrap_or(&EMPTY_CELL)
}

/// Applies blank-row skipping, category inheritance, trimming, and score
/// coercion. `rows` yields 1-based row numbers for error reporting.
fn normalize_rows<'a>(
    rows: impl Iterator<Item = (usize, &'a [CellValue])>,
    columns: &ColumnMap,
    layout: &SheetLayout,
) -> Result<Vec<InspectionRow>> {
    let mut normalized = Vec::new();
    let mut carried: Option<String> = None;
    let mut skipped = 0usize;

    for (row_number, row) in rows {
        if row.iter().all(CellValue::is_blank) {
            skipped += 1;
            continue;
        }

        let category = columns.cell(row, Field::Category).trimmed();
        let category = if !category.is_empty() {
            category
        } else if let Some(previous) = &carried {
            previous.clone()
        } else if let Some(fallback) = &layout.category_fallback {
            warn!(
                row = row_number,
                fallback = %fallback,
                "first data row has no category, using fallback"
            );
            fallback.clone()
        } else {
            return Err(ToolError::AmbiguousFirstCategory { row: row_number });
        };
        carried = Some(category.clone());

        let score_cell = columns.cell(row, Field::AchievedScore);
        let achieved_score = match score::coerce_score(score_cell) {
            ScoreCoercion::Exact(value) => value,
            ScoreCoercion::Coerced(_) if layout.strict_scores => {
                return Err(ToolError::MalformedScore {
                    row: row_number,
                    raw: score_cell.to_text(),
                });
            }
            ScoreCoercion::Coerced(value) => {
                debug!(
                    row = row_number,
                    raw = %score_cell.to_text(),
                    value,
                    "coerced malformed score"
                );
                value
            }
        };

        let range_text = columns.cell(row, Field::ScoreRange).trimmed();
        let score_range_text = if range_text.is_empty() {
            layout.default_score_range.clone()
        } else {
            range_text
        };
        let max_score = score::parse_range(&score_range_text).max;

        normalized.push(InspectionRow {
            category,
            subcategory: columns.cell(row, Field::Subcategory).trimmed(),
            sub_subcategory: columns.cell(row, Field::SubSubcategory).trimmed(),
            task: columns.cell(row, Field::Task).trimmed(),
            assignee: columns.cell(row, Field::Assignee).trimmed(),
            achieved_score,
            max_score,
            score_range_text,
        });
    }

    debug!(rows = normalized.len(), skipped, "normalized checklist rows");
    Ok(normalized)
}
