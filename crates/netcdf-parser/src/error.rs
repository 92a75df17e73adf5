//! Error types for NetCDF parsing operations.

use std::path::PathBuf;

use sst_common::TimeParseError;
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The library could not open the file
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: netcdf::Error,
    },

    /// The library failed while reading a variable
    #[error("failed to read '{variable}' from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        variable: String,
        #[source]
        source: netcdf::Error,
    },

    /// Missing required dimension, variable or attribute
    #[error("missing {what} in {}", path.display())]
    MissingData { path: PathBuf, what: String },

    /// Invalid data format
    #[error("invalid data in {}: {message}", path.display())]
    InvalidFormat { path: PathBuf, message: String },

    /// Time coordinate could not be decoded
    #[error("invalid time axis in {}: {source}", path.display())]
    Time {
        path: PathBuf,
        #[source]
        source: TimeParseError,
    },
}

impl NetCdfError {
    pub(crate) fn missing(path: &std::path::Path, what: impl Into<String>) -> Self {
        Self::MissingData {
            path: path.to_path_buf(),
            what: what.into(),
        }
    }

    pub(crate) fn invalid(path: &std::path::Path, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// The file this error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. }
            | Self::Open { path, .. }
            | Self::Read { path, .. }
            | Self::MissingData { path, .. }
            | Self::InvalidFormat { path, .. }
            | Self::Time { path, .. } => path,
        }
    }
}
