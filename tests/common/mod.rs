#![allow(dead_code)]

use partslist_merge::model::{Cell, RawTable};

pub const EXCLUDED: &str = "no in-house stock";

/// Raw header as found in the source sheets: an index column, nine fields, two extras.
pub fn raw_header() -> Vec<Cell> {
    [
        "#",
        "Unit",
        "Part Number",
        "Stock",
        "Part Name",
        "Specification",
        "Supplier",
        "Quantity",
        "Processing",
        "Delivery",
        "Notes",
        "Extra",
    ]
    .map(Cell::text)
    .to_vec()
}

/// A twelve-column raw data row.
pub fn raw_part(index: u32, unit: &str, part_number: &str, stock: &str, supplier: &str) -> Vec<Cell> {
    vec![
        Cell::Number(f64::from(index)),
        Cell::text(unit),
        Cell::text(part_number),
        Cell::text(stock),
        Cell::text(format!("{part_number} body")),
        Cell::text("SS400"),
        Cell::text(supplier),
        Cell::Number(2.0),
        Cell::text("process-only"),
        Cell::Empty,
        Cell::text("note"),
        Cell::text("extra"),
    ]
}

/// Header plus one in-stock row per part number, all in `unit`.
pub fn parts_table(unit: &str, part_numbers: &[&str]) -> RawTable {
    let mut table = vec![raw_header()];
    table.extend(
        part_numbers
            .iter()
            .enumerate()
            .map(|(index, part)| raw_part(index as u32 + 1, unit, part, "in stock", "Acme")),
    );
    table
}
