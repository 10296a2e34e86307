use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use calamine::{DataType, Range, Reader, open_workbook_auto};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::partslist::merge::error::{MergeError, Result};
use crate::partslist::merge::model::{Cell, RawTable};
use crate::partslist::merge::pipeline::{DocumentEntry, DocumentStore, GroupEntry};

// Largest serial Excel accepts (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Document store over a local directory tree.
///
/// Immediate subdirectories of the root are the groups; the files inside a
/// group are its documents. Workbooks are read from a staged copy in a
/// scratch directory so the source workbooks are never held open.
#[derive(Debug, Clone)]
pub struct FolderStore {
    root: PathBuf,
    scratch: PathBuf,
}

/// A staged copy of a source workbook.
#[derive(Debug)]
pub struct StagedCopy {
    path: PathBuf,
}

impl FolderStore {
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(MergeError::MissingRoot(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            scratch: std::env::temp_dir(),
        })
    }

    /// Stages copies under `scratch` instead of the system temp directory.
    pub fn with_scratch_dir(mut self, scratch: impl Into<PathBuf>) -> Self {
        self.scratch = scratch.into();
        self
    }

    /// Copies `source` into the scratch directory under a fresh name.
    ///
    /// A copy that fails after creating its destination has the partial file
    /// removed before the error is returned.
    fn stage<F>(&self, source: &Path, copy: F) -> Result<StagedCopy>
    where
        F: FnOnce(&Path, &Path) -> io::Result<u64>,
    {
        let extension = source
            .extension()
            .map(|extension| extension.to_string_lossy().into_owned())
            .unwrap_or_default();
        let path = self
            .scratch
            .join(format!("partslist-{}.{extension}", Uuid::new_v4()));
        if let Err(error) = copy(source, &path) {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(cleanup) if cleanup.kind() == io::ErrorKind::NotFound => {}
                Err(cleanup) => warn!(
                    staged = %path.display(),
                    error = %cleanup,
                    "failed to remove partial staged copy"
                ),
            }
            return Err(error.into());
        }
        debug!(source = %source.display(), staged = %path.display(), "staged workbook copy");
        Ok(StagedCopy { path })
    }
}

impl DocumentStore for FolderStore {
    type Handle = PathBuf;
    type Converted = StagedCopy;

    fn describe_root(&self) -> String {
        self.root.display().to_string()
    }

    fn list_groups(&self) -> Result<Vec<GroupEntry>> {
        let mut groups = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            groups.push(GroupEntry {
                id: entry.path().display().to_string(),
                name: entry.file_name().to_string_lossy().into_owned(),
            });
        }
        groups.sort_by(|lhs, rhs| lhs.name.cmp(&rhs.name));
        Ok(groups)
    }

    fn list_documents(&self, group: &GroupEntry) -> Result<Vec<DocumentEntry<PathBuf>>> {
        let mut documents = Vec::new();
        for entry in fs::read_dir(&group.id)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            documents.push(DocumentEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                handle: entry.path(),
            });
        }
        documents.sort_by(|lhs, rhs| lhs.name.cmp(&rhs.name));
        Ok(documents)
    }

    fn convert(&self, handle: &PathBuf) -> Result<StagedCopy> {
        self.stage(handle, |source, staged| fs::copy(source, staged))
    }

    fn read_tabular(&self, converted: &StagedCopy, sheet: &str) -> Result<Option<RawTable>> {
        let mut workbook = open_workbook_auto(&converted.path)?;
        let Some(range) = workbook.worksheet_range(sheet) else {
            return Ok(None);
        };
        let range = range.map_err(MergeError::from)?;
        Ok(Some(range_to_table(&range)))
    }

    fn discard_temporary(&self, converted: StagedCopy) -> Result<()> {
        fs::remove_file(&converted.path)?;
        Ok(())
    }
}

/// Converts a calamine range into a grid anchored at A1.
///
/// calamine trims leading empty rows and columns; padding them back keeps
/// column indices aligned with the sheet's column letters.
fn range_to_table(range: &Range<DataType>) -> RawTable {
    let (row_offset, col_offset) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));
    let width = col_offset + range.width();

    let mut table: RawTable = (0..row_offset).map(|_| vec![Cell::Empty; width]).collect();
    table.extend(range.rows().map(|row| {
        let mut cells = vec![Cell::Empty; col_offset];
        cells.extend(row.iter().map(to_cell));
        cells
    }));
    table
}

fn to_cell(cell: &DataType) -> Cell {
    match cell {
        DataType::Empty => Cell::Empty,
        DataType::String(value) => Cell::Text(value.clone()),
        DataType::Float(value) => Cell::Number(*value),
        DataType::Int(value) => Cell::Number(*value as f64),
        DataType::Bool(value) => Cell::Bool(*value),
        DataType::DateTime(serial) => excel_serial_to_datetime(*serial)
            .map(Cell::Date)
            .unwrap_or(Cell::Number(*serial)),
        DataType::DateTimeIso(value) => parse_iso_datetime(value)
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::Text(value.clone())),
        other => Cell::Text(other.to_string()),
    }
}

fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !(0.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_dates_use_the_1899_epoch() {
        let date = excel_serial_to_datetime(45_296.5).expect("in range");
        assert_eq!(date.format("%Y/%m/%d %H:%M").to_string(), "2024/01/05 12:00");
        assert!(excel_serial_to_datetime(-1.0).is_none());
    }

    #[test]
    fn iso_datetimes_parse_with_or_without_time() {
        assert!(parse_iso_datetime("2024-01-05T08:30:00").is_some());
        assert!(parse_iso_datetime("2024-01-05").is_some());
        assert!(parse_iso_datetime("next tuesday").is_none());
    }

    #[test]
    fn interrupted_copies_are_removed_from_scratch() {
        let root = tempfile::tempdir().expect("root");
        let scratch = tempfile::tempdir().expect("scratch");
        let source = root.path().join("20240105_J0000000001_Purchased_1unit.xlsx");
        fs::write(&source, b"workbook").expect("source");
        let store = FolderStore::open(root.path())
            .expect("root exists")
            .with_scratch_dir(scratch.path());

        let result = store.stage(&source, |_, staged| {
            fs::write(staged, b"work")?;
            Err(io::Error::other("no space left on device"))
        });

        assert!(matches!(result, Err(MergeError::Io(_))));
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
        assert!(source.exists());
    }

    #[test]
    fn staged_copies_keep_the_source_extension() {
        let root = tempfile::tempdir().expect("root");
        let scratch = tempfile::tempdir().expect("scratch");
        let source = root.path().join("list.XLSM");
        fs::write(&source, b"workbook").expect("source");
        let store = FolderStore::open(root.path())
            .expect("root exists")
            .with_scratch_dir(scratch.path());

        let staged = store.convert(&source).expect("staged");

        assert_eq!(staged.path.extension().unwrap(), "XLSM");
        assert_eq!(fs::read(&staged.path).unwrap(), b"workbook");
        store.discard_temporary(staged).expect("discarded");
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn trimmed_ranges_are_anchored_at_a1() {
        let mut range = Range::new((1, 2), (2, 3));
        range.set_value((1, 2), DataType::String("header".into()));
        range.set_value((2, 3), DataType::Float(4.0));

        let table = range_to_table(&range);

        assert_eq!(table.len(), 3);
        assert!(table[0].iter().all(Cell::is_empty));
        assert_eq!(table[1][2], Cell::text("header"));
        assert_eq!(table[2][3], Cell::Number(4.0));
        assert_eq!(table[1].len(), 4);
    }
}
