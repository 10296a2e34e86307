use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, MergeError>;

/// Error type covering the failures that can occur while parts lists are
/// located, read, merged, or written out.
///
/// Only fatal conditions travel through this type. Problems confined to a
/// single document are logged by the pipeline and the document is skipped.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the settings file is not valid TOML for [`Settings`](crate::config::Settings).
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Raised when the run report cannot be serialised.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when the settings parse but carry unusable values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::Error),

    /// Raised when no root folder was given or it does not exist.
    #[error("root folder not found: {0}")]
    MissingRoot(PathBuf),

    /// Raised when no subfolder passes the parts-list name filter.
    #[error("no parts-list folders found under {root} (expected names containing '{marker}')")]
    NoMatchingGroups { root: String, marker: String },

    /// Raised when every candidate document was skipped.
    #[error("no parts-list documents could be read")]
    NoDocumentsProcessed,

    /// Raised when documents were read but no data row survived the merge.
    #[error("merged dataset is empty")]
    EmptyMergedDataset,

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
