//! OGR-backed boundary reading (Shapefile, GeoPackage, ...).
//!
//! Only compiled with the `gdal` feature.

use std::path::Path;

use gdal::vector::LayerAccess;
use gdal::Dataset;
use sst_common::BoundingBox;
use tracing::debug;

use crate::error::{GeometryError, GeometryResult};

/// Union envelope of every feature geometry across all layers.
///
/// Returns `None` when no feature carries a non-empty geometry.
pub fn read_envelope(path: &Path) -> GeometryResult<Option<BoundingBox>> {
    let gdal_err = |source| GeometryError::Gdal {
        path: path.to_path_buf(),
        source,
    };
    let dataset = Dataset::open(path).map_err(gdal_err)?;

    let mut envelope: Option<BoundingBox> = None;
    let mut features = 0usize;

    for mut layer in dataset.layers() {
        for feature in layer.features() {
            let Some(geometry) = feature.geometry() else {
                continue;
            };
            if geometry.is_empty() {
                continue;
            }
            let env = geometry.envelope();
            let bbox = BoundingBox::new(env.MinX, env.MinY, env.MaxX, env.MaxY);
            envelope = Some(match envelope {
                Some(e) => e.union(&bbox),
                None => bbox,
            });
            features += 1;
        }
    }

    debug!(path = %path.display(), features, "Read OGR boundary");
    Ok(envelope)
}
