//! Error types for boundary resolution.

use std::path::PathBuf;

use sst_common::BboxError;
use thiserror::Error;

/// Result type for boundary operations.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Errors raised while turning a boundary file into a region of interest.
#[derive(Error, Debug)]
pub enum GeometryError {
    /// The boundary file could not be read
    #[error("failed to read boundary {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The boundary file is not valid for its format
    #[error("failed to parse boundary {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// No feature in the file carries a geometry
    #[error("boundary {} contains no features with geometry", path.display())]
    Empty { path: PathBuf },

    /// Extension not handled by this build
    #[error("unsupported boundary format '{extension}' for {} (GeoJSON is always supported; build with the `gdal` feature for other vector formats)", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// Invalid bounds or buffer
    #[error(transparent)]
    Bounds(#[from] BboxError),

    /// GDAL failed to open or read the file
    #[cfg(feature = "gdal")]
    #[error("GDAL error reading {}: {source}", path.display())]
    Gdal {
        path: PathBuf,
        #[source]
        source: gdal::errors::GdalError,
    },
}
