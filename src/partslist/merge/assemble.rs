use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, TimeZone};

use crate::partslist::merge::config::Settings;
use crate::partslist::merge::dedup::MergedDataset;
use crate::partslist::merge::keys::token_number;
use crate::partslist::merge::model::{Category, Cell, NormalizedRow, layout};

/// Blank columns reserved for the reviewers' checkboxes.
pub const MARKER_COLUMNS: usize = 2;
/// Marker columns plus the sequence number.
pub const LEADING_COLUMNS: usize = MARKER_COLUMNS + 1;

/// Format of the timestamp that ends every output name.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M";

/// How a sort column compares. Every key sorts ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Category declaration order.
    Category,
    /// Numeric value of the digits in the cell, 0 when there are none.
    Numeric,
    Lexical,
}

/// One entry of the output ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    /// Column within a [`NormalizedRow`].
    pub column: usize,
    pub order: SortOrder,
}

impl SortKey {
    /// Column of this key in the assembled output.
    pub fn output_column(&self) -> usize {
        self.column + LEADING_COLUMNS
    }

    fn compare(&self, lhs: &NormalizedRow, rhs: &NormalizedRow) -> Ordering {
        let (lhs, rhs) = (lhs.text(self.column), rhs.text(self.column));
        match self.order {
            SortOrder::Category => Category::from_label(&lhs).cmp(&Category::from_label(&rhs)),
            SortOrder::Numeric => token_number(&lhs).cmp(&token_number(&rhs)),
            SortOrder::Lexical => lhs.cmp(&rhs),
        }
    }
}

/// Output ordering: category, unit, supplier, then part number.
pub const SORT_CONTRACT: [SortKey; 4] = [
    SortKey {
        column: layout::CATEGORY,
        order: SortOrder::Category,
    },
    SortKey {
        column: layout::UNIT,
        order: SortOrder::Numeric,
    },
    SortKey {
        column: layout::SUPPLIER,
        order: SortOrder::Lexical,
    },
    SortKey {
        column: layout::PART_NUMBER,
        order: SortOrder::Lexical,
    },
];

/// Everything the presentation layer needs to publish the merge.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledOutput {
    pub name: String,
    pub header: Vec<String>,
    /// Sorted, numbered data rows with the two blank marker columns in front.
    pub rows: Vec<Vec<Cell>>,
    pub sort: Vec<SortKey>,
    pub column_widths: BTreeMap<String, u16>,
    pub row_height: Option<f64>,
}

impl AssembledOutput {
    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }
}

/// Builds the output table and name from a finished merge.
pub fn assemble(dataset: &MergedDataset, settings: &Settings, timestamp: &str) -> AssembledOutput {
    let mut data: Vec<&NormalizedRow> = dataset.data_rows().collect();
    data.sort_by(|lhs, rhs| compare_rows(lhs, rhs));

    let rows = data
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            let mut cells = Vec::with_capacity(LEADING_COLUMNS + row.cells.len());
            cells.resize(MARKER_COLUMNS, Cell::Empty);
            cells.push(Cell::Number((index + 1) as f64));
            cells.extend(row.cells.iter().cloned());
            cells
        })
        .collect();

    AssembledOutput {
        name: output_name(dataset.project_ids(), dataset.filename_tokens(), timestamp),
        header: settings.column_names.header_row(),
        rows,
        sort: SORT_CONTRACT.to_vec(),
        column_widths: settings.column_widths.clone(),
        row_height: settings.row_height,
    }
}

pub fn compare_rows(lhs: &NormalizedRow, rhs: &NormalizedRow) -> Ordering {
    SORT_CONTRACT
        .iter()
        .map(|key| key.compare(lhs, rhs))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// `<project>[_<category tokens>]_<timestamp>`.
///
/// Each category with tokens contributes its letter followed by the unit
/// suffixes joined with `-` (`P01-03`); Electrical contributes its letter alone.
pub fn output_name(
    project_ids: &BTreeSet<String>,
    tokens: &BTreeMap<Category, Vec<String>>,
    timestamp: &str,
) -> String {
    let project = project_ids
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("-");

    let category_tokens: Vec<String> = Category::ALL
        .into_iter()
        .filter_map(|category| {
            let letter = category.letter()?;
            let tokens = tokens.get(&category).filter(|tokens| !tokens.is_empty())?;
            if category == Category::Electrical {
                return Some(letter.to_string());
            }
            let suffixes: Vec<&str> = tokens
                .iter()
                .map(|token| token.strip_prefix(letter).unwrap_or(token))
                .collect();
            Some(format!("{letter}{}", suffixes.join("-")))
        })
        .collect();

    if category_tokens.is_empty() {
        format!("{project}_{timestamp}")
    } else {
        format!("{project}_{}_{timestamp}", category_tokens.join("_"))
    }
}

pub fn timestamp<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format(TIMESTAMP_FORMAT).to_string()
}
