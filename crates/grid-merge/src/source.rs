//! Access to input rasters.
//!
//! The engine never touches NetCDF directly: every metadata probe and slab
//! read goes through a [`RasterSource`]. [`NetCdfSource`] is the production
//! implementation; tests plug in synthetic sources.

use std::ops::Range;
use std::path::Path;

use netcdf_parser::{NetCdfError, NetCdfResult, Packing, RasterFile};

/// One time step of one variable over a row/column window.
#[derive(Debug, Clone)]
pub struct SlabRequest<'a> {
    pub path: &'a Path,
    pub variable: &'a str,
    /// Index along the file's own time dimension.
    pub time_index: usize,
    pub rows: Range<usize>,
    pub cols: Range<usize>,
    pub packing: &'a Packing,
}

impl SlabRequest<'_> {
    /// Number of values the slab holds.
    pub fn len(&self) -> usize {
        self.rows.len() * self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A provider of raster metadata and data slabs.
pub trait RasterSource: Send + Sync {
    /// Size of the file in bytes.
    fn file_size(&self, path: &Path) -> NetCdfResult<u64>;

    /// Metadata of a file, without reading data variables.
    fn probe(&self, path: &Path, time_dimension: &str) -> NetCdfResult<RasterFile>;

    /// A 1-D coordinate variable.
    fn read_coordinate(&self, path: &Path, name: &str) -> NetCdfResult<Vec<f64>>;

    /// Fill `out` (exactly `request.len()` values) with an unpacked slab.
    fn read_slab_into(&self, request: &SlabRequest<'_>, out: &mut [f32]) -> NetCdfResult<()>;
}

/// [`RasterSource`] backed by NetCDF files on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetCdfSource;

impl RasterSource for NetCdfSource {
    fn file_size(&self, path: &Path) -> NetCdfResult<u64> {
        std::fs::metadata(path)
            .map(|m| m.len())
            .map_err(|source| NetCdfError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    fn probe(&self, path: &Path, time_dimension: &str) -> NetCdfResult<RasterFile> {
        netcdf_parser::probe_file(path, time_dimension)
    }

    fn read_coordinate(&self, path: &Path, name: &str) -> NetCdfResult<Vec<f64>> {
        netcdf_parser::read_coordinate(path, name)
    }

    fn read_slab_into(&self, request: &SlabRequest<'_>, out: &mut [f32]) -> NetCdfResult<()> {
        netcdf_parser::read_slab_into(
            request.path,
            request.variable,
            request.time_index,
            request.rows.clone(),
            request.cols.clone(),
            request.packing,
            out,
        )
    }
}
