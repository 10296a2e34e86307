use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Output format for date cells.
pub const DATE_FORMAT: &str = "%Y/%m/%d";

/// A single spreadsheet cell value as handed over by the document store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(value) => value.is_empty(),
            _ => false,
        }
    }

    /// Display form used for comparisons, sorting and key extraction.
    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(value) => f.write_str(value),
            Cell::Number(value) => write!(f, "{value}"),
            Cell::Bool(value) => write!(f, "{value}"),
            Cell::Date(value) => write!(f, "{}", value.format(DATE_FORMAT)),
        }
    }
}

/// Raw cell grid of one sheet. The first row is the header.
pub type RawTable = Vec<Vec<Cell>>;

/// One input file as read from the document store.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// File name, carrying the project id, revision date and category.
    pub name: String,
    pub raw_rows: RawTable,
}

/// How a listed part is sourced. Declaration order is the output sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Purchased,
    Fabricated,
    Electrical,
    Unknown,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Purchased,
        Category::Fabricated,
        Category::Electrical,
        Category::Unknown,
    ];

    /// Literal written into the category column. Empty for [`Category::Unknown`].
    pub fn label(self) -> &'static str {
        match self {
            Category::Purchased => "Purchased",
            Category::Fabricated => "Fabricated",
            Category::Electrical => "Electrical",
            Category::Unknown => "",
        }
    }

    /// Single-letter prefix used in filename tokens.
    pub fn letter(self) -> Option<char> {
        match self {
            Category::Purchased => Some('P'),
            Category::Fabricated => Some('F'),
            Category::Electrical => Some('E'),
            Category::Unknown => None,
        }
    }

    pub fn from_label(label: &str) -> Self {
        Category::ALL
            .into_iter()
            .find(|category| *category != Category::Unknown && category.label() == label)
            .unwrap_or(Category::Unknown)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identity of a source document: the group it was listed in plus its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentRef {
    pub group: String,
    pub name: String,
}

impl DocumentRef {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.name)
    }
}

/// A row in the canonical layout: the category label followed by nine fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub cells: Vec<Cell>,
}

impl NormalizedRow {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn get(&self, column: usize) -> Option<&Cell> {
        self.cells.get(column)
    }

    /// Display text of a column, empty when the column is missing.
    pub fn text(&self, column: usize) -> String {
        self.get(column).map(Cell::as_text).unwrap_or_default()
    }
}

/// Column positions of a [`NormalizedRow`].
pub mod layout {
    pub const CATEGORY: usize = 0;
    pub const UNIT: usize = 1;
    pub const PART_NUMBER: usize = 2;
    pub const STOCK_STATUS: usize = 3;
    pub const PART_NAME: usize = 4;
    pub const SPECIFICATION: usize = 5;
    pub const SUPPLIER: usize = 6;
    pub const QUANTITY: usize = 7;
    pub const PROCESSING_DATE: usize = 8;
    pub const DELIVERY_DATE: usize = 9;
    /// Category column plus nine source fields.
    pub const WIDTH: usize = 10;
}
