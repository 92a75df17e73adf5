//! Output sinks for evaluated chunks.

mod netcdf_writer;

pub use netcdf_writer::NetCdfWriter;

use crate::error::Result;
use crate::types::ChunkRegion;

/// Receives evaluated chunks, one at a time, in any order.
pub trait ChunkSink {
    /// Store `data` (row-major, `region.len()` values) for `variable`.
    fn write_chunk(&mut self, variable: &str, region: &ChunkRegion, data: &[f32]) -> Result<()>;
}
