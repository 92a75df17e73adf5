//! Minimal GeoJSON model: just enough to compute an envelope.
//!
//! Accepts a `FeatureCollection`, a single `Feature` or a bare geometry at
//! the top level. Properties are ignored. Positions may carry a third
//! (elevation) value, which is ignored too.

use serde::Deserialize;
use serde_json::Value;
use sst_common::BoundingBox;

/// A GeoJSON position: `[x, y]` or `[x, y, z]`.
pub type Position = Vec<f64>;

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

/// A GeoJSON Feature. `geometry` may be `null`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

/// GeoJSON geometry types.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    /// Array of linear rings (first is exterior, rest are holes).
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

impl Geometry {
    /// Collect every position in this geometry.
    fn visit_positions<'a>(&'a self, out: &mut Vec<&'a Position>) {
        match self {
            Geometry::Point { coordinates } => out.push(coordinates),
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                out.extend(coordinates.iter())
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                out.extend(coordinates.iter().flatten())
            }
            Geometry::MultiPolygon { coordinates } => {
                out.extend(coordinates.iter().flatten().flatten())
            }
            Geometry::GeometryCollection { geometries } => {
                for g in geometries {
                    g.visit_positions(out);
                }
            }
        }
    }

    /// Axis-aligned envelope, or `None` for an empty geometry.
    ///
    /// Fails if a position has fewer than two coordinates.
    pub fn envelope(&self) -> Result<Option<BoundingBox>, String> {
        let mut positions = Vec::new();
        self.visit_positions(&mut positions);

        let mut envelope: Option<BoundingBox> = None;
        for p in positions {
            if p.len() < 2 {
                return Err(format!("position {:?} has fewer than 2 coordinates", p));
            }
            let point = BoundingBox::new(p[0], p[1], p[0], p[1]);
            envelope = Some(match envelope {
                Some(e) => e.union(&point),
                None => point,
            });
        }
        Ok(envelope)
    }
}

/// Parse GeoJSON text into its geometries, in document order.
///
/// Features whose geometry is `null` are skipped.
pub fn parse_geometries(text: &str) -> Result<Vec<Geometry>, String> {
    let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing 'type' member at top level".to_string())?;

    match kind {
        "FeatureCollection" => {
            let fc: FeatureCollection = serde_json::from_value(value).map_err(|e| e.to_string())?;
            Ok(fc.features.into_iter().filter_map(|f| f.geometry).collect())
        }
        "Feature" => {
            let feature: Feature = serde_json::from_value(value).map_err(|e| e.to_string())?;
            Ok(feature.geometry.into_iter().collect())
        }
        _ => {
            let geometry: Geometry = serde_json::from_value(value).map_err(|e| e.to_string())?;
            Ok(vec![geometry])
        }
    }
}

/// Union envelope of all geometries; `None` when nothing has a position.
pub fn union_envelope(geometries: &[Geometry]) -> Result<Option<BoundingBox>, String> {
    let mut union: Option<BoundingBox> = None;
    for g in geometries {
        if let Some(e) = g.envelope()? {
            union = Some(match union {
                Some(u) => u.union(&e),
                None => e,
            });
        }
    }
    Ok(union)
}
