use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::partslist::merge::assemble::{self, AssembledOutput};
use crate::partslist::merge::config::Settings;
use crate::partslist::merge::error::{MergeError, Result};
use crate::partslist::merge::io::excel_write;
use crate::partslist::merge::pipeline::{AggregationPipeline, DocumentStore};

/// Outcome of a run as reported to callers. Fatal errors never escape as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_files: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    pub fn succeeded(url: String, processed_files: usize, total_rows: usize) -> Self {
        Self {
            success: true,
            url: Some(url),
            processed_files: Some(processed_files),
            total_rows: Some(total_rows),
            error: None,
        }
    }

    pub fn failed(error: &MergeError) -> Self {
        Self {
            success: false,
            url: None,
            processed_files: None,
            total_rows: None,
            error: Some(error.to_string()),
        }
    }

    /// Pretty-printed JSON, as emitted on stdout by the binary.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A completed merge and where it was written.
#[derive(Debug, Clone)]
pub struct Consolidation {
    pub output: AssembledOutput,
    pub path: PathBuf,
    pub processed_files: usize,
}

/// Merges every parts list in `store` and writes the result under `output_dir`.
#[instrument(
    level = "info",
    skip_all,
    fields(root = %store.describe_root(), output = %output_dir.display())
)]
pub fn consolidate<S: DocumentStore>(
    store: &S,
    settings: &Settings,
    output_dir: &Path,
    now: DateTime<FixedOffset>,
) -> Result<Consolidation> {
    let aggregation = AggregationPipeline::new(store, settings).run()?;
    let output = assemble::assemble(
        &aggregation.dataset,
        settings,
        &assemble::timestamp(&now),
    );
    info!(name = %output.name, total_rows = output.total_rows(), "assembled merged parts list");

    fs::create_dir_all(output_dir)?;
    let path = excel_write::write_output(output_dir, &output)?;
    info!(path = %path.display(), "merged workbook written");

    Ok(Consolidation {
        output,
        path,
        processed_files: aggregation.processed_files,
    })
}

/// Runs [`consolidate`] and folds the outcome into a [`RunReport`].
pub fn run<S: DocumentStore>(
    store: &S,
    settings: &Settings,
    output_dir: &Path,
    now: DateTime<FixedOffset>,
) -> RunReport {
    match consolidate(store, settings, output_dir, now) {
        Ok(consolidation) => RunReport::succeeded(
            consolidation.path.display().to_string(),
            consolidation.processed_files,
            consolidation.output.total_rows(),
        ),
        Err(error) => {
            error!(%error, "merge failed");
            RunReport::failed(&error)
        }
    }
}
