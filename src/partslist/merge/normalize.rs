use std::fmt;

use crate::partslist::merge::model::{
    Category, Cell, DATE_FORMAT, NormalizedRow, RawTable, layout,
};

/// Stock status that removes a row from the merge.
pub const EXCLUDED_STOCK_MARKER: &str = "no in-house stock";

/// Fields kept from each source row once the leading index column is dropped.
pub const SOURCE_FIELDS: usize = 9;

// Positions within the nine source fields, before the category column is prepended.
const STOCK_STATUS_FIELD: usize = 2;
const FABRICATION_ONLY_FIELD: usize = 7;

/// Why a document produced nothing to merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoData {
    /// The workbook has no sheet with the configured name.
    MissingSheet,
    /// The sheet exists but holds no rows.
    EmptySheet,
}

impl fmt::Display for NoData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoData::MissingSheet => f.write_str("target sheet not found"),
            NoData::EmptySheet => f.write_str("target sheet is empty"),
        }
    }
}

/// A document in the canonical layout.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDocument {
    pub header: NormalizedRow,
    pub data: Vec<NormalizedRow>,
}

impl NormalizedDocument {
    /// Header plus data rows.
    pub fn row_count(&self) -> usize {
        self.data.len() + 1
    }
}

/// Rewrites one document's sheet into the canonical layout.
///
/// `table` is `None` when the workbook lacks the target sheet. Date cells in
/// the processing and delivery columns become `YYYY/MM/DD` text; spreadsheet
/// dates carry no zone, so the wall-clock date is what gets written.
pub fn normalize_document(
    table: Option<RawTable>,
    category: Category,
    category_title: &str,
) -> Result<NormalizedDocument, NoData> {
    let table = table.ok_or(NoData::MissingSheet)?;
    let mut rows = table.into_iter();
    let header = rows.next().ok_or(NoData::EmptySheet)?;

    let mut header = prune_columns(header);
    header.insert(0, Cell::text(category_title));

    let data = rows
        .map(prune_columns)
        .filter(|fields| !is_excluded_stock(fields))
        .map(|mut fields| {
            if matches!(category, Category::Purchased | Category::Electrical) {
                fields[FABRICATION_ONLY_FIELD] = Cell::Empty;
            }
            fields.insert(0, Cell::text(category.label()));
            format_dates(&mut fields);
            NormalizedRow::new(fields)
        })
        .collect();

    format_dates(&mut header);

    Ok(NormalizedDocument {
        header: NormalizedRow::new(header),
        data,
    })
}

/// Drops the artefact index column and keeps exactly nine fields.
pub fn prune_columns(row: Vec<Cell>) -> Vec<Cell> {
    let mut fields: Vec<Cell> = row.into_iter().skip(1).take(SOURCE_FIELDS).collect();
    fields.resize(SOURCE_FIELDS, Cell::Empty);
    fields
}

fn is_excluded_stock(fields: &[Cell]) -> bool {
    matches!(fields.get(STOCK_STATUS_FIELD), Some(Cell::Text(status)) if status == EXCLUDED_STOCK_MARKER)
}

fn format_dates(cells: &mut [Cell]) {
    for column in [layout::PROCESSING_DATE, layout::DELIVERY_DATE] {
        let Some(cell) = cells.get_mut(column) else {
            continue;
        };
        let formatted = match cell {
            Cell::Date(value) => value.format(DATE_FORMAT).to_string(),
            _ => continue,
        };
        *cell = Cell::Text(formatted);
    }
}
