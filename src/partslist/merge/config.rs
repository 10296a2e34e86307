use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::partslist::merge::error::{MergeError, Result};

/// Process-wide settings, loaded once at start-up and passed by reference to
/// every stage of the merge.
///
/// Keys mirror the upstream key/value store, so a settings file reads like:
///
/// ```toml
/// TARGET_SHEET_NAME = "Parts"
/// ROW_HEIGHT = 21.0
///
/// [COLUMN_NAMES]
/// SUPPLIER = "Vendor"
///
/// [COLUMN_WIDTHS]
/// E = 180
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct Settings {
    /// Sheet read from every source workbook.
    pub target_sheet_name: String,
    /// Header titles of the output table.
    pub column_names: ColumnNames,
    /// Column letter → width. Passed through to the writer untouched.
    pub column_widths: BTreeMap<String, u16>,
    /// Row height for the output sheet. Passed through to the writer untouched.
    pub row_height: Option<f64>,
    /// Identifier of the presentation template, if any.
    pub template_spreadsheet_id: Option<String>,
    /// Destination for the merged workbook when none is given on the command line.
    pub output_folder_id: Option<String>,
    /// Token a folder name must contain to count as a parts-list folder.
    pub group_name_marker: String,
    /// Folders whose names start with this prefix are ignored.
    pub reserved_group_prefix: String,
    /// UTC offset used when stamping the output name.
    pub time_zone_offset_hours: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_sheet_name: "Parts".to_string(),
            column_names: ColumnNames::default(),
            column_widths: BTreeMap::new(),
            row_height: None,
            template_spreadsheet_id: None,
            output_folder_id: None,
            group_name_marker: "parts list".to_string(),
            reserved_group_prefix: "_".to_string(),
            time_zone_offset_hours: 0,
        }
    }
}

impl Settings {
    /// Reads and validates settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&source)?;
        debug!(path = %path.display(), sheet = %settings.target_sheet_name, "loaded settings");
        Ok(settings)
    }

    /// Parses and validates settings from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_sheet_name.trim().is_empty() {
            return Err(MergeError::InvalidConfig(
                "TARGET_SHEET_NAME must not be empty".into(),
            ));
        }
        if self.group_name_marker.is_empty() {
            return Err(MergeError::InvalidConfig(
                "GROUP_NAME_MARKER must not be empty".into(),
            ));
        }
        if !(-23..=23).contains(&self.time_zone_offset_hours) {
            return Err(MergeError::InvalidConfig(format!(
                "TIME_ZONE_OFFSET_HOURS out of range: {}",
                self.time_zone_offset_hours
            )));
        }
        Ok(())
    }

    /// Fixed offset used for output timestamps.
    pub fn time_zone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.time_zone_offset_hours * 3600)
            .unwrap_or_else(|| Utc.fix())
    }
}

/// Titles of the thirteen output columns, in output order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct ColumnNames {
    pub ordered: String,
    pub received: String,
    pub number: String,
    pub category: String,
    pub unit: String,
    pub part_number: String,
    pub stock_status: String,
    pub part_name: String,
    pub specification: String,
    pub supplier: String,
    pub quantity: String,
    pub processing_date: String,
    pub delivery_date: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            ordered: "Ordered".to_string(),
            received: "Received".to_string(),
            number: "No.".to_string(),
            category: "Category".to_string(),
            unit: "Unit".to_string(),
            part_number: "Part Number".to_string(),
            stock_status: "Stock".to_string(),
            part_name: "Part Name".to_string(),
            specification: "Specification".to_string(),
            supplier: "Supplier".to_string(),
            quantity: "Quantity".to_string(),
            processing_date: "Processing Date".to_string(),
            delivery_date: "Delivery Date".to_string(),
        }
    }
}

impl ColumnNames {
    /// Header row of the output table.
    pub fn header_row(&self) -> Vec<String> {
        [
            &self.ordered,
            &self.received,
            &self.number,
            &self.category,
            &self.unit,
            &self.part_number,
            &self.stock_status,
            &self.part_name,
            &self.specification,
            &self.supplier,
            &self.quantity,
            &self.processing_date,
            &self.delivery_date,
        ]
        .into_iter()
        .cloned()
        .collect()
    }
}
