use std::fmt::Debug;

use tracing::{debug, info, instrument, warn};

use crate::partslist::merge::config::Settings;
use crate::partslist::merge::dedup::{Admission, MergedDataset};
use crate::partslist::merge::error::{MergeError, Result};
use crate::partslist::merge::keys::{RevisionKey, build_filename_token, classify_category};
use crate::partslist::merge::model::{DocumentRef, RawTable, SourceDocument};
use crate::partslist::merge::normalize::normalize_document;

/// Workbook extensions the pipeline will read. Compared case-insensitively.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["xls", "xlsx", "xlsm"];

/// A folder of parts lists, as listed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    pub id: String,
    pub name: String,
}

/// A file inside a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry<H> {
    pub name: String,
    pub handle: H,
}

/// Source of parts-list workbooks.
///
/// Reading goes through a converted temporary copy: `convert` creates it,
/// `read_tabular` reads the target sheet from it, and `discard_temporary`
/// releases it. The pipeline always discards what it converted.
pub trait DocumentStore {
    type Handle: Debug;
    type Converted;

    /// Human-readable name of the root, used in error messages.
    fn describe_root(&self) -> String;

    /// Every subgroup of the root, unfiltered.
    fn list_groups(&self) -> Result<Vec<GroupEntry>>;

    /// Every document in a group, unfiltered.
    fn list_documents(&self, group: &GroupEntry) -> Result<Vec<DocumentEntry<Self::Handle>>>;

    fn convert(&self, handle: &Self::Handle) -> Result<Self::Converted>;

    /// Cell grid of `sheet`, or `None` when the workbook has no such sheet.
    fn read_tabular(&self, converted: &Self::Converted, sheet: &str) -> Result<Option<RawTable>>;

    fn discard_temporary(&self, converted: Self::Converted) -> Result<()>;
}

/// Converted copy released when dropped, on success and failure paths alike.
struct TemporaryCopy<'s, S: DocumentStore> {
    store: &'s S,
    converted: Option<S::Converted>,
    document: &'s str,
}

impl<'s, S: DocumentStore> TemporaryCopy<'s, S> {
    fn acquire(store: &'s S, handle: &S::Handle, document: &'s str) -> Result<Self> {
        let converted = store.convert(handle)?;
        Ok(Self {
            store,
            converted: Some(converted),
            document,
        })
    }

    fn read(&self, sheet: &str) -> Result<Option<RawTable>> {
        match &self.converted {
            Some(converted) => self.store.read_tabular(converted, sheet),
            None => Ok(None),
        }
    }
}

impl<S: DocumentStore> Drop for TemporaryCopy<'_, S> {
    fn drop(&mut self) {
        if let Some(converted) = self.converted.take() {
            if let Err(error) = self.store.discard_temporary(converted) {
                warn!(document = self.document, %error, "failed to discard temporary copy");
            }
        }
    }
}

/// Whether a folder name marks a parts-list group.
pub fn is_parts_list_group(name: &str, settings: &Settings) -> bool {
    let reserved = !settings.reserved_group_prefix.is_empty()
        && name.starts_with(&settings.reserved_group_prefix);
    !reserved && name.contains(&settings.group_name_marker)
}

pub fn has_supported_extension(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, extension)| {
        SUPPORTED_EXTENSIONS
            .iter()
            .any(|supported| extension.eq_ignore_ascii_case(supported))
    })
}

/// What a finished aggregation hands to output assembly.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub dataset: MergedDataset,
    /// Documents that were read and normalised, whether or not they survived.
    pub processed_files: usize,
}

/// Drives every parts-list document of a store through key extraction,
/// normalisation and deduplication, one document at a time.
pub struct AggregationPipeline<'a, S: DocumentStore> {
    store: &'a S,
    settings: &'a Settings,
    dataset: MergedDataset,
    processed_files: usize,
}

impl<'a, S: DocumentStore> AggregationPipeline<'a, S> {
    pub fn new(store: &'a S, settings: &'a Settings) -> Self {
        Self {
            store,
            settings,
            dataset: MergedDataset::new(),
            processed_files: 0,
        }
    }

    /// Merges every matching group.
    ///
    /// Fails when no group matches, when no document could be read, or when
    /// the merged dataset ends up empty. Individual unreadable documents are
    /// skipped with a warning.
    #[instrument(level = "info", skip_all, fields(sheet = %self.settings.target_sheet_name))]
    pub fn run(mut self) -> Result<Aggregation> {
        let groups: Vec<GroupEntry> = self
            .store
            .list_groups()?
            .into_iter()
            .filter(|group| is_parts_list_group(&group.name, self.settings))
            .collect();

        if groups.is_empty() {
            return Err(MergeError::NoMatchingGroups {
                root: self.store.describe_root(),
                marker: self.settings.group_name_marker.clone(),
            });
        }
        info!(group_count = groups.len(), "found parts-list folders");

        for group in &groups {
            self.process_group(group);
        }

        self.dataset.sort_filename_tokens();

        if self.processed_files == 0 {
            return Err(MergeError::NoDocumentsProcessed);
        }
        if self.dataset.data_row_count() == 0 {
            return Err(MergeError::EmptyMergedDataset);
        }

        info!(
            processed_files = self.processed_files,
            merged_rows = self.dataset.data_row_count(),
            "aggregation finished"
        );
        Ok(Aggregation {
            dataset: self.dataset,
            processed_files: self.processed_files,
        })
    }

    #[instrument(level = "debug", skip_all, fields(group = %group.name))]
    fn process_group(&mut self, group: &GroupEntry) {
        let documents = match self.store.list_documents(group) {
            Ok(documents) => documents,
            Err(error) => {
                warn!(%error, "failed to list documents, skipping folder");
                return;
            }
        };

        for entry in documents {
            if !has_supported_extension(&entry.name) {
                debug!(document = %entry.name, "skipping unsupported file");
                continue;
            }
            let document = DocumentRef::new(group.id.clone(), entry.name.clone());
            if let Err(error) = self.process_document(&document, &entry.handle) {
                warn!(%document, %error, "skipping unreadable document");
            }
        }
    }

    fn process_document(&mut self, document: &DocumentRef, handle: &S::Handle) -> Result<()> {
        let raw_rows = {
            let copy = TemporaryCopy::acquire(self.store, handle, &document.name)?;
            copy.read(&self.settings.target_sheet_name)?
        };
        self.ingest(document, raw_rows);
        Ok(())
    }

    /// Runs one already-read document through normalisation and deduplication.
    pub fn ingest(&mut self, document: &DocumentRef, raw_rows: Option<RawTable>) -> Option<Admission> {
        let category = classify_category(&document.name);
        let normalized = match normalize_document(
            raw_rows,
            category,
            &self.settings.column_names.category,
        ) {
            Ok(normalized) => normalized,
            Err(reason) => {
                warn!(%document, %reason, "no data in document, skipping");
                return None;
            }
        };
        self.processed_files += 1;

        let key = RevisionKey::derive(&document.name, &normalized.data);
        self.dataset.record_summary(&key);
        let token = build_filename_token(&document.name, category);
        let data_rows = normalized.data.len();

        let admission = self.dataset.admit(document, normalized, &key, &token);
        match &admission {
            Admission::AcceptedNew => {
                info!(%document, key = %key.dedup_key(), rows = data_rows, "accepted")
            }
            Admission::AcceptedSupersedes { replaced } => info!(
                %document,
                %replaced,
                key = %key.dedup_key(),
                rows = data_rows,
                "accepted, superseding older revision"
            ),
            Admission::RejectedStale { kept } => debug!(
                %document,
                %kept,
                revision = %key.revision_date,
                "rejected, a newer revision is already merged"
            ),
        }
        Some(admission)
    }

    /// Convenience for feeding a document that was read elsewhere.
    pub fn ingest_source(&mut self, group: &str, source: SourceDocument) -> Option<Admission> {
        let document = DocumentRef::new(group, source.name);
        self.ingest(&document, Some(source.raw_rows))
    }

    pub fn dataset(&self) -> &MergedDataset {
        &self.dataset
    }
}
