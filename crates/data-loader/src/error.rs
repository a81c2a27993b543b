//! Error types for the data-loader crate.

use thiserror::Error;

/// Errors that can occur while loading an episode catalog.
///
/// Individual malformed episode records are not errors: the parser skips them
/// and reports them through `EpisodeCatalog::skipped`. These variants cover
/// failures that make the whole catalog unusable.
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The file is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but none of the supported layouts matched
    #[error("Unsupported catalog layout: {0}")]
    UnsupportedLayout(String),

    /// A show was requested that the document does not contain
    #[error("Show not found in catalog: {0}")]
    ShowNotFound(String),

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience alias for results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
