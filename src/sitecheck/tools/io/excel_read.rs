use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};

use crate::sitecheck::tools::date;
use crate::sitecheck::tools::error::{Result, ToolError};
use crate::sitecheck::tools::model::CellValue;

/// Reads the first worksheet of an `.xlsx` file into a cell grid addressed
/// from A1.
pub fn read_cells(path: &Path) -> Result<Vec<Vec<CellValue>>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    first_sheet_cells(&mut workbook)
}

/// Same as [`read_cells`] for an in-memory workbook.
pub fn read_cells_from_bytes(bytes: &[u8]) -> Result<Vec<Vec<CellValue>>> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))?;
    first_sheet_cells(&mut workbook)
}

fn first_sheet_cells<R: Read + Seek>(workbook: &mut Xlsx<R>) -> Result<Vec<Vec<CellValue>>> {
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ToolError::UnreadableSheet("workbook has no worksheets".into()))?
        .map_err(ToolError::from)?;
    Ok(range_to_grid(&range))
}

/// The used range of a sheet starts at its first non-empty cell; pad it back
/// out so that grid indices match sheet coordinates.
fn range_to_grid(range: &Range<DataType>) -> Vec<Vec<CellValue>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    let mut grid = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![CellValue::Empty; start_col as usize];
        cells.extend(row.iter().map(cell_value));
        while cells.last().is_some_and(|cell| *cell == CellValue::Empty) {
            cells.pop();
        }
        grid.push(cells);
    }
    grid
}

fn cell_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::Empty => CellValue::Empty,
        DataType::String(value) => CellValue::Text(value.clone()),
        DataType::Float(value) => CellValue::Number(*value),
        DataType::Int(value) => CellValue::Number(*value as f64),
        DataType::Bool(value) => CellValue::Boolean(*value),
        DataType::DateTime(serial) => date::from_serial(*serial)
            .map(CellValue::Date)
            .unwrap_or(CellValue::Number(*serial)),
        other => CellValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_rebased_to_a1() {
        let mut range = Range::new((1, 1), (2, 2));
        range.set_value((1, 1), DataType::String("name".into()));
        range.set_value((2, 2), DataType::Float(4.0));

        let grid = range_to_grid(&range);
        assert_eq!(grid.len(), 3);
        assert!(grid[0].is_empty());
        assert_eq!(grid[1], vec![CellValue::Empty, CellValue::text("name")]);
        assert_eq!(
            grid[2],
            vec![CellValue::Empty, CellValue::Empty, CellValue::Number(4.0)]
        );
    }

    #[test]
    fn date_cells_become_dates() {
        let value = cell_value(&DataType::DateTime(45811.5));
        assert_eq!(value.to_text(), "2025-06-03");
        assert_eq!(cell_value(&DataType::Int(3)), CellValue::Number(3.0));
    }
}
