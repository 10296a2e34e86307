use std::fs;
use std::path::Path;

use calamine::{DataType, Reader, open_workbook_auto};
use chrono::{FixedOffset, TimeZone};
use partslist_merge::MergeError;
use partslist_merge::config::Settings;
use partslist_merge::io::excel_read::FolderStore;
use partslist_merge::io::excel_write::OUTPUT_SHEET;
use partslist_merge::run;
use rust_xlsxwriter::Workbook;
use tempfile::tempdir;

const HEADER: [&str; 12] = [
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
];

fn write_parts_workbook(path: &Path, sheet: &str, parts: &[(&str, &str, &str)]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).expect("sheet name");

    for (col, title) in HEADER.iter().enumerate() {
        worksheet.write_string(0, col as u16, *title).expect("header");
    }
    for (index, (unit, part, stock)) in parts.iter().enumerate() {
        let row = (index + 1) as u32;
        worksheet.write_number(row, 0, row as f64).expect("index");
        worksheet.write_string(row, 1, *unit).expect("unit");
        worksheet.write_string(row, 2, *part).expect("part");
        worksheet.write_string(row, 3, *stock).expect("stock");
        worksheet.write_string(row, 6, "Acme").expect("supplier");
    }

    workbook.save(path).expect("workbook saved");
}

fn now() -> chrono::DateTime<FixedOffset> {
    FixedOffset::east_opt(9 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 2, 1, 8, 15, 0)
        .unwrap()
}

#[test]
fn merges_workbooks_from_disk() {
    let root = tempdir().expect("root");
    let scratch = tempdir().expect("scratch");
    let output = tempdir().expect("output");
    let settings = Settings::default();

    let line1 = root.path().join("Line 1 parts list");
    let line2 = root.path().join("Line 2 parts list");
    let ignored = root.path().join("_old parts list");
    for dir in [&line1, &line2, &ignored] {
        fs::create_dir_all(dir).expect("group dir");
    }

    write_parts_workbook(
        &line1.join("20240105_J0000000001_Purchased_1unit.xlsx"),
        &settings.target_sheet_name,
        &[
            ("1", "OLD-1", "in stock"),
            ("1", "OLD-2", "in stock"),
            ("1", "OLD-3", "in stock"),
            ("1", "OLD-X", "no in-house stock"),
        ],
    );
    write_parts_workbook(
        &line2.join("20240110_J0000000001_Purchased_1unit.xlsx"),
        &settings.target_sheet_name,
        &[("1", "NEW-2", "in stock"), ("1", "NEW-1", "in stock")],
    );
    write_parts_workbook(
        &line2.join("20240110_J0000000001_Fabricated_1unit.xlsx"),
        "Other",
        &[("1", "FAB-1", "in stock")],
    );
    write_parts_workbook(
        &ignored.join("20240201_J0000000001_Purchased_1unit.xlsx"),
        &settings.target_sheet_name,
        &[("1", "IGNORED", "in stock")],
    );
    fs::write(line1.join("notes.txt"), "not a workbook").expect("notes");

    let store = FolderStore::open(root.path())
        .expect("root exists")
        .with_scratch_dir(scratch.path());
    let report = run::run(&store, &settings, output.path(), now());

    assert!(report.success, "{report:?}");
    assert_eq!(report.processed_files, Some(2));
    assert_eq!(report.total_rows, Some(2));
    assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);

    let path = output.path().join("J0000000001_P01_20240201-0815.xlsx");
    assert_eq!(report.url.as_deref(), Some(path.display().to_string().as_str()));

    let mut workbook = open_workbook_auto(&path).expect("output opens");
    let range = workbook
        .worksheet_range(OUTPUT_SHEET)
        .expect("output sheet")
        .expect("output range");

    assert_eq!(range.height(), 3);
    assert_eq!(
        range.get_value((0, 0)),
        Some(&DataType::String("Ordered".to_string()))
    );
    assert_eq!(range.get_value((1, 2)), Some(&DataType::Float(1.0)));
    assert_eq!(
        range.get_value((1, 5)),
        Some(&DataType::String("NEW-1".to_string()))
    );
    assert_eq!(
        range.get_value((2, 5)),
        Some(&DataType::String("NEW-2".to_string()))
    );
}

#[test]
fn missing_root_is_reported() {
    let root = tempdir().expect("root");
    let missing = root.path().join("absent");

    let error = FolderStore::open(&missing).unwrap_err();

    assert!(matches!(error, MergeError::MissingRoot(_)));
    assert!(!run::RunReport::failed(&error).success);
}
