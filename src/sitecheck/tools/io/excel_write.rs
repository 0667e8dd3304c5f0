use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};

use crate::sitecheck::tools::encode::EncodedSheet;
use crate::sitecheck::tools::error::Result;
use crate::sitecheck::tools::model::{CellValue, ISO_DATE_FORMAT};

/// Writes the encoded checklist to the given path.
pub fn write_sheet(path: &Path, sheet: &EncodedSheet) -> Result<()> {
    let mut workbook = build_workbook(sheet)?;
    workbook.save(path)?;
    Ok(())
}

/// Serialises the encoded checklist into `.xlsx` bytes.
pub fn sheet_to_bytes(sheet: &EncodedSheet) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(sheet)?;
    Ok(workbook.save_to_buffer()?)
}

fn build_workbook(sheet: &EncodedSheet) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&sheet.sheet_name)?;

    for (col_idx, width) in sheet.column_widths.iter().enumerate() {
        worksheet.set_column_width(col_idx as u16, *width)?;
    }

    for (row_idx, row) in sheet.cells.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            write_cell(worksheet, row_idx as u32, col_idx as u16, cell)?;
        }
    }

    // Merging blanks every cell after the first, so only the run's top value survives.
    let merge_format = Format::new().set_align(FormatAlign::VerticalCenter);
    for merge in &sheet.merges {
        let value = sheet
            .cell(merge.first_row, merge.first_col)
            .map(CellValue::to_text)
            .unwrap_or_default();
        worksheet.merge_range(
            merge.first_row,
            merge.first_col,
            merge.last_row,
            merge.last_col,
            &value,
            &merge_format,
        )?;
    }

    if let Some(area) = sheet.print_area {
        worksheet.set_print_area(area.first_row, area.first_col, area.last_row, area.last_col)?;
    }

    Ok(workbook)
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &CellValue) -> Result<()> {
    match cell {
        CellValue::Empty => {}
        CellValue::Text(value) if value.is_empty() => {}
        CellValue::Text(value) => {
            worksheet.write_string(row, col, value)?;
        }
        CellValue::Number(value) => {
            worksheet.write_number(row, col, *value)?;
        }
        CellValue::Boolean(value) => {
            worksheet.write_boolean(row, col, *value)?;
        }
        CellValue::Date(date) => {
            worksheet.write_string(row, col, &date.format(ISO_DATE_FORMAT).to_string())?;
        }
    }
    Ok(())
}
