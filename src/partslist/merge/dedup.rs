use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::partslist::merge::keys::{RevisionDate, RevisionKey, token_number};
use crate::partslist::merge::model::{Category, DocumentRef, NormalizedRow};
use crate::partslist::merge::normalize::NormalizedDocument;

/// Result of offering a document to [`MergedDataset::admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// First revision seen for its dedup key.
    AcceptedNew,
    /// Newer than the stored revision, whose rows were removed.
    AcceptedSupersedes { replaced: DocumentRef },
    /// Not newer than the stored revision. Nothing changed.
    RejectedStale { kept: DocumentRef },
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Admission::RejectedStale { .. })
    }
}

/// Registry entry for the current winner of a dedup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedRevision {
    pub document: DocumentRef,
    pub revision_date: RevisionDate,
}

impl AcceptedRevision {
    /// Later date wins; equal dates fall back to the lexically greater name.
    fn is_superseded_by(&self, document: &DocumentRef, revision_date: RevisionDate) -> bool {
        (revision_date, document.name.as_str()) > (self.revision_date, self.document.name.as_str())
    }
}

#[derive(Debug, Clone)]
struct TrackedRow {
    /// `None` for the header row.
    owner: Option<DocumentRef>,
    row: NormalizedRow,
}

/// Running result of a merge: accepted rows, the winner registry, and the
/// summary sets used to name the output.
#[derive(Debug, Clone, Default)]
pub struct MergedDataset {
    rows: Vec<TrackedRow>,
    accepted: HashMap<String, AcceptedRevision>,
    project_ids: BTreeSet<String>,
    unit_numbers: BTreeSet<String>,
    categories: BTreeSet<Category>,
    filename_tokens: BTreeMap<Category, Vec<String>>,
}

impl MergedDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers a normalised document for its dedup key.
    ///
    /// The header row is kept only from the very first admitted document.
    /// `token` is recorded for the document's category only when the key is new.
    pub fn admit(
        &mut self,
        document: &DocumentRef,
        normalized: NormalizedDocument,
        key: &RevisionKey,
        token: &str,
    ) -> Admission {
        let dedup_key = key.dedup_key();

        let Some(stored) = self.accepted.get(&dedup_key) else {
            if self.accepted.is_empty() {
                self.rows.push(TrackedRow {
                    owner: None,
                    row: normalized.header,
                });
            }
            self.accepted.insert(
                dedup_key,
                AcceptedRevision {
                    document: document.clone(),
                    revision_date: key.revision_date,
                },
            );
            self.append(document, normalized.data);
            if !token.is_empty() {
                self.filename_tokens
                    .entry(key.category)
                    .or_default()
                    .push(token.to_string());
            }
            return Admission::AcceptedNew;
        };

        if !stored.is_superseded_by(document, key.revision_date) {
            return Admission::RejectedStale {
                kept: stored.document.clone(),
            };
        }

        let replaced = stored.document.clone();
        self.rows
            .retain(|tracked| tracked.owner.as_ref() != Some(&replaced));
        self.accepted.insert(
            dedup_key,
            AcceptedRevision {
                document: document.clone(),
                revision_date: key.revision_date,
            },
        );
        self.append(document, normalized.data);
        Admission::AcceptedSupersedes { replaced }
    }

    /// Adds a key's project id, unit number and category to the summary sets.
    pub fn record_summary(&mut self, key: &RevisionKey) {
        if !key.project_id.is_empty() {
            self.project_ids.insert(key.project_id.clone());
        }
        if !key.unit_digits.is_empty() {
            self.unit_numbers.insert(key.unit_digits.clone());
        }
        if key.category != Category::Unknown {
            self.categories.insert(key.category);
        }
    }

    /// Orders every category's tokens by their numeric part, keeping ties stable.
    pub fn sort_filename_tokens(&mut self) {
        for tokens in self.filename_tokens.values_mut() {
            tokens.sort_by_key(|token| token_number(token));
        }
    }

    fn append(&mut self, document: &DocumentRef, data: Vec<NormalizedRow>) {
        self.rows.extend(data.into_iter().map(|row| TrackedRow {
            owner: Some(document.clone()),
            row,
        }));
    }

    /// All rows, header first, with provenance stripped.
    pub fn rows(&self) -> impl Iterator<Item = &NormalizedRow> {
        self.rows.iter().map(|tracked| &tracked.row)
    }

    pub fn header(&self) -> Option<&NormalizedRow> {
        self.rows
            .iter()
            .find(|tracked| tracked.owner.is_none())
            .map(|tracked| &tracked.row)
    }

    /// Rows contributed by documents, excluding the header.
    pub fn data_rows(&self) -> impl Iterator<Item = &NormalizedRow> {
        self.rows
            .iter()
            .filter(|tracked| tracked.owner.is_some())
            .map(|tracked| &tracked.row)
    }

    /// Number of rows including the header.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn data_row_count(&self) -> usize {
        self.data_rows().count()
    }

    pub fn rows_owned_by(&self, document: &DocumentRef) -> usize {
        self.rows
            .iter()
            .filter(|tracked| tracked.owner.as_ref() == Some(document))
            .count()
    }

    pub fn accepted(&self, dedup_key: &str) -> Option<&AcceptedRevision> {
        self.accepted.get(dedup_key)
    }

    pub fn project_ids(&self) -> &BTreeSet<String> {
        &self.project_ids
    }

    pub fn unit_numbers(&self) -> &BTreeSet<String> {
        &self.unit_numbers
    }

    pub fn categories(&self) -> &BTreeSet<Category> {
        &self.categories
    }

    pub fn filename_tokens(&self) -> &BTreeMap<Category, Vec<String>> {
        &self.filename_tokens
    }
}
