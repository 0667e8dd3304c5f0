use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::sitecheck::tools::aggregate::{Rollup, aggregate};
use crate::sitecheck::tools::decode::{DecodedSheet, decode, rows_from_grid};
use crate::sitecheck::tools::encode::{EncodedSheet, encode};
use crate::sitecheck::tools::error::{Result, ToolError};
use crate::sitecheck::tools::io::{excel_read, excel_write};
use crate::sitecheck::tools::layout::SheetLayout;
use crate::sitecheck::tools::model::{CellValue, InspectionRow, ProjectMetadata, ProjectRecord};

/// Reads and decodes a checklist workbook.
#[instrument(level = "info", skip_all, fields(input = %input.display()))]
pub fn load_checklist(input: &Path, layout: &SheetLayout) -> Result<DecodedSheet> {
    if !input.exists() {
        return Err(ToolError::MissingInput(input.to_path_buf()));
    }
    let cells = excel_read::read_cells(input)?;
    debug!(grid_rows = cells.len(), "read cell grid");
    let sheet = decode(&cells, layout)?;
    info!(row_count = sheet.rows.len(), "decoded checklist");
    Ok(sheet)
}

/// Encodes rows back into the sheet layout and writes the workbook.
#[instrument(level = "info", skip_all, fields(output = %output.display(), rows = rows.len()))]
pub fn save_checklist(
    output: &Path,
    metadata: &ProjectMetadata,
    rows: &[InspectionRow],
    layout: &SheetLayout,
) -> Result<EncodedSheet> {
    let sheet = encode(metadata, rows, layout);
    debug!(merge_count = sheet.merges.len(), "sheet encoded");
    excel_write::write_sheet(output, &sheet)?;
    Ok(sheet)
}

/// Saves an edited grid (header row excluded). The grid is normalized first,
/// so blank categories inherit and ranges are re-parsed before encoding.
#[instrument(level = "info", skip_all, fields(output = %output.display(), rows = grid.len()))]
pub fn save_grid(
    output: &Path,
    metadata: &ProjectMetadata,
    grid: &[Vec<CellValue>],
    layout: &SheetLayout,
) -> Result<EncodedSheet> {
    let rows = rows_from_grid(grid, layout)?;
    save_checklist(output, metadata, &rows, layout)
}

/// Loads a checklist and rolls its scores up.
#[instrument(level = "info", skip_all, fields(input = %input.display()))]
pub fn evaluate_checklist(input: &Path, layout: &SheetLayout) -> Result<(DecodedSheet, Rollup)> {
    let sheet = load_checklist(input, layout)?;
    let rollup = aggregate(&sheet.rows);
    info!(
        categories = rollup.by_category.len(),
        assignees = rollup.by_assignee.len(),
        "rolled up checklist scores"
    );
    Ok((sheet, rollup))
}

/// Decodes the checklist then writes it back out in the canonical layout.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display())
)]
pub fn rewrite_checklist(input: &Path, output: &Path, layout: &SheetLayout) -> Result<()> {
    let sheet = load_checklist(input, layout)?;
    save_checklist(output, &sheet.metadata, &sheet.rows, layout)?;
    Ok(())
}

/// Re-reads a project's checklist and returns the record refreshed from its
/// metadata. `root` is the directory the record's file path is relative to.
#[instrument(level = "info", skip_all, fields(project = record.id))]
pub fn refresh_project(
    record: &ProjectRecord,
    root: &Path,
    layout: &SheetLayout,
    today: NaiveDate,
) -> Result<ProjectRecord> {
    let path = resolve_project_path(root, &record.file_path);
    let sheet = load_checklist(&path, layout)?;
    Ok(record.apply_metadata(&sheet.metadata, today))
}

/// Joins a store-relative path such as `/uploads/site.xlsx` onto `root`.
pub fn resolve_project_path(root: &Path, file_path: &str) -> PathBuf {
    root.join(file_path.trim_start_matches(['/', '\\']))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_paths_are_rooted() {
        let root = Path::new("/srv/public");
        assert_eq!(
            resolve_project_path(root, "/uploads/site.xlsx"),
            PathBuf::from("/srv/public/uploads/site.xlsx")
        );
        assert_eq!(
            resolve_project_path(root, "uploads/site.xlsx"),
            PathBuf::from("/srv/public/uploads/site.xlsx")
        );
    }

    #[test]
    fn missing_input_is_reported() {
        let err = load_checklist(Path::new("/definitely/not/here.xlsx"), &SheetLayout::default())
            .unwrap_err();
        assert!(matches!(err, ToolError::MissingInput(_)));
    }
}
