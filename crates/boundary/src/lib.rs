//! Region-of-interest resolution from vector boundary files.
//!
//! A boundary file (GeoJSON natively, any OGR format with the `gdal`
//! feature) is reduced to the union bounding box of its feature geometries
//! and expanded by a symmetric buffer in degrees. Only the bounding box is
//! used downstream; geometry shapes are not clipped against.
//!
//! ```ignore
//! use boundary::resolve_boundary;
//!
//! let region = resolve_boundary(Path::new("aoi.geojson"), 0.1)?;
//! println!("selecting {}", region.bounds.describe());
//! ```

pub mod error;
pub mod geojson;
#[cfg(feature = "gdal")]
pub mod ogr;
pub mod region;

pub use error::{GeometryError, GeometryResult};
pub use region::{resolve_boundary, RegionOfInterest, DEFAULT_BUFFER_DEGREES};
