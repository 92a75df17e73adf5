//! Error types for the merge engine.

use std::path::PathBuf;

use boundary::GeometryError;
use netcdf_parser::NetCdfError;
use thiserror::Error;

/// Guidance attached to resource errors.
pub const SMALLER_CHUNKS_HINT: &str =
    "try a smaller chunk policy, e.g. SST_MERGE_CHUNK_TIME=10 SST_MERGE_CHUNK_ROWS=100 SST_MERGE_CHUNK_COLS=100";

/// Errors that can occur during a merge.
#[derive(Error, Debug)]
pub enum MergeError {
    /// The boundary could not be turned into a region of interest.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Input files disagree on dimensions or variables.
    #[error("schema mismatch in {}: {detail}", file.display())]
    SchemaMismatch { file: PathBuf, detail: String },

    /// No accepted horizontal coordinate pair was found.
    #[error("no recognized horizontal coordinates: searched {searched}, found [{found}]")]
    UnsupportedCoordinate { searched: String, found: String },

    /// A time-dependent variable is not laid out as (time, lat, lon).
    #[error("variable '{variable}' has dimensions ({}), expected ({expected})", dimensions.join(", "))]
    UnsupportedLayout {
        variable: String,
        dimensions: Vec<String>,
        expected: String,
    },

    /// A chunk, the memory limit or an allocation was too large.
    #[error("resource limit exceeded: {detail}; {hint}")]
    ResourceExceeded { detail: String, hint: String },

    /// The feasibility gate rejected the input set.
    #[error("merge is not feasible: {reason}")]
    Infeasible { reason: String },

    /// Reading an input file failed.
    #[error(transparent)]
    Source(#[from] NetCdfError),

    /// Writing the output failed.
    #[error("failed to write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },

    /// The merge was cancelled.
    #[error("merge cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem error outside the NetCDF library.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MergeError {
    /// Create a ResourceExceeded error with the standard hint.
    pub fn resource(detail: impl Into<String>) -> Self {
        Self::ResourceExceeded {
            detail: detail.into(),
            hint: SMALLER_CHUNKS_HINT.to_string(),
        }
    }

    /// Create a SchemaMismatch error.
    pub fn schema(file: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            file: file.into(),
            detail: detail.into(),
        }
    }

    /// Create a Write error from a library error.
    pub fn write(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Write {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Whether the error aborted an otherwise valid run on purpose.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type for merge operations.
pub type Result<T> = std::result::Result<T, MergeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_error_carries_hint() {
        let err = MergeError::resource("chunk of 10 GiB exceeds budget");
        let text = err.to_string();
        assert!(text.contains("10 GiB"));
        assert!(text.contains("smaller chunk policy"));
    }

    #[test]
    fn test_layout_message_lists_dimensions() {
        let err = MergeError::UnsupportedLayout {
            variable: "sst".to_string(),
            dimensions: vec!["time".into(), "lon".into(), "lat".into()],
            expected: "time, lat, lon".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "variable 'sst' has dimensions (time, lon, lat), expected (time, lat, lon)"
        );
    }
}
