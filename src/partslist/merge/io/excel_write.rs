use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::warn;

use crate::partslist::merge::assemble::AssembledOutput;
use crate::partslist::merge::error::Result;
use crate::partslist::merge::model::Cell;

/// Name of the single sheet in the merged workbook.
pub const OUTPUT_SHEET: &str = "Merged";

/// Writes the merged table to `<dir>/<name>.xlsx` and returns that path.
///
/// The workbook is saved under a temporary name and renamed into place. The
/// temporary file is removed when either step fails, so a failed write leaves
/// nothing behind in `dir`.
pub fn write_output(dir: &Path, output: &AssembledOutput) -> Result<PathBuf> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(OUTPUT_SHEET)?;

    for (col_idx, header) in output.header.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in output.rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            write_cell(worksheet, (row_idx + 1) as u32, col_idx as u16, cell)?;
        }
    }

    for (letter, width) in &output.column_widths {
        match column_index(letter) {
            Some(col) => {
                worksheet.set_column_width(col, f64::from(*width))?;
            }
            None => warn!(column = %letter, "ignoring width for invalid column letter"),
        }
    }

    if let Some(height) = output.row_height {
        for row in 0..=output.rows.len() as u32 {
            worksheet.set_row_height(row, height)?;
        }
    }

    let col_end = (output.header.len() as u16).saturating_sub(1);
    worksheet.autofilter(0, 0, output.rows.len() as u32, col_end)?;

    let final_path = dir.join(format!("{}.xlsx", output.name));
    let partial_path = dir.join(format!(".{}.partial.xlsx", output.name));
    if let Err(error) = workbook.save(&partial_path) {
        discard_partial(&partial_path);
        return Err(error.into());
    }
    if let Err(error) = fs::rename(&partial_path, &final_path) {
        discard_partial(&partial_path);
        return Err(error.into());
    }
    Ok(final_path)
}

fn discard_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(error) if error.kind() == ErrorKind::NotFound => {}
        Err(error) => warn!(path = %path.display(), %error, "failed to remove partial output"),
    }
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<()> {
    match cell {
        Cell::Empty => {}
        Cell::Text(value) => {
            worksheet.write_string(row, col, value)?;
        }
        Cell::Number(value) => {
            worksheet.write_number(row, col, *value)?;
        }
        Cell::Bool(value) => {
            worksheet.write_boolean(row, col, *value)?;
        }
        Cell::Date(_) => {
            worksheet.write_string(row, col, cell.as_text())?;
        }
    }
    Ok(())
}

/// Zero-based index of a column letter such as `A` or `AB`.
fn column_index(letters: &str) -> Option<u16> {
    if letters.is_empty() {
        return None;
    }
    let mut index: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = u32::from(ch.to_ascii_uppercase()) - u32::from('A') + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    u16::try_from(index - 1).ok()
}

#[cfg(test)]
mod tests {
    use super::column_index;

    #[test]
    fn column_letters_map_to_indices() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("m"), Some(12));
        assert_eq!(column_index("AB"), Some(27));
        assert_eq!(column_index("A1"), None);
        assert_eq!(column_index(""), None);
    }
}
