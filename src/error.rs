//! Error types shared by the resolution pipeline.

use keyframe_table::TableError;

/// Failures that escape the matching pipeline.
///
/// A below-threshold match or a missing asset file is not an error; those
/// are reported through the regular result types.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A required request parameter was absent or blank.
    #[error("Missing '{0}' parameter")]
    MissingInput(&'static str),

    /// The embedding backend failed.
    #[error("embedding backend error: {0:#}")]
    Embedding(#[source] anyhow::Error),

    /// An asset file exists but could not be read or parsed.
    #[error("asset '{file}' could not be loaded: {source}")]
    Asset {
        /// Filename as listed in the phrase catalog.
        file: String,
        /// Underlying table error.
        #[source]
        source: TableError,
    },

    /// An asset filename would resolve outside the asset directory.
    #[error("asset name '{0}' is not a plain filename")]
    InvalidAssetName(String),

    /// The catalog definition is unusable.
    #[error("catalog error: {0}")]
    Catalog(String),
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
