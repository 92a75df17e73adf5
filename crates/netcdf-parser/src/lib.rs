//! NetCDF access for daily gridded SST analyses.
//!
//! This crate reads NetCDF-4 files such as OSTIA L4 GHRSST analyses. It
//! provides three things:
//!
//! - **Probing**: dimensions, variables, packing and the decoded time axis of
//!   a file, without reading any data variable ([`probe_file`]).
//! - **Slab reads**: one time step of one variable over a row/column window,
//!   unpacked to `f32` with fill values mapped to NaN ([`read_slab`]).
//! - **Summaries**: per-variable shape, storage type and missing counts for
//!   a single file ([`summarize_file`]).
//!
//! # Implementation Notes
//!
//! The `netcdf` crate wraps libnetcdf/HDF5 (system requirements:
//! `libhdf5-dev libnetcdf-dev`). The C library serializes calls internally,
//! so handles are cheap to open per operation and are never shared across
//! threads.

pub mod error;
pub mod inspect;
pub mod native;
pub mod schema;

pub use error::{NetCdfError, NetCdfResult};
pub use inspect::{summarize_file, FileSummary, VariableSummary};
pub use native::{probe_file, read_coordinate, read_slab, read_slab_into, silence_hdf5_errors};
pub use schema::{DimensionInfo, Packing, RasterFile, VariableInfo};
