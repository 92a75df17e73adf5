//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in the boundary's native coordinates.
///
/// For geographic boundaries (EPSG:4326) the coordinates are degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates without validation.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Check the min <= max invariant on both axes.
    pub fn validate(&self) -> Result<(), BboxError> {
        let corners = [self.min_lon, self.min_lat, self.max_lon, self.max_lat];
        if corners.iter().any(|v| !v.is_finite()) {
            return Err(BboxError::NonFinite(*self));
        }
        if self.min_lon > self.max_lon || self.min_lat > self.max_lat {
            return Err(BboxError::Inverted(*self));
        }
        Ok(())
    }

    /// Expand symmetrically by `buffer` on every side.
    ///
    /// The buffer must be finite and non-negative, so the result always
    /// contains `self`.
    pub fn expand(&self, buffer: f64) -> Result<Self, BboxError> {
        if !buffer.is_finite() || buffer < 0.0 {
            return Err(BboxError::InvalidBuffer(buffer));
        }
        Ok(Self {
            min_lon: self.min_lon - buffer,
            min_lat: self.min_lat - buffer,
            max_lon: self.max_lon + buffer,
            max_lat: self.max_lat + buffer,
        })
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    /// Check if a point lies inside the box, edges included.
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Check if `other` lies entirely inside this box.
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        other.min_lon >= self.min_lon
            && other.max_lon <= self.max_lon
            && other.min_lat >= self.min_lat
            && other.max_lat <= self.max_lat
    }

    /// Human-readable extent, rounded to two decimals.
    ///
    /// This is the form recorded in the output's `spatial_subset` attribute.
    pub fn describe(&self) -> String {
        format!(
            "lon: {:.2} to {:.2}, lat: {:.2} to {:.2}",
            self.min_lon, self.max_lon, self.min_lat, self.max_lat
        )
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BboxError {
    #[error("bounding box {0} has a non-finite corner")]
    NonFinite(BoundingBox),

    #[error("bounding box {0} is inverted (min > max)")]
    Inverted(BoundingBox),

    #[error("buffer must be finite and >= 0, got {0}")]
    InvalidBuffer(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_contains_original() {
        let raw = BoundingBox::new(-10.0, 40.0, 5.0, 55.0);
        let buffered = raw.expand(0.1).unwrap();
        assert!(buffered.contains_box(&raw));
        assert!((buffered.min_lon - (-10.1)).abs() < 1e-12);
        assert!((buffered.max_lat - 55.1).abs() < 1e-12);
    }

    #[test]
    fn test_expand_rejects_negative_buffer() {
        let raw = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert_eq!(raw.expand(-0.5), Err(BboxError::InvalidBuffer(-0.5)));
        assert!(raw.expand(f64::NAN).is_err());
    }

    #[test]
    fn test_describe_two_decimals() {
        let bbox = BoundingBox::new(-10.123, 40.0, 5.999, 55.5);
        assert_eq!(bbox.describe(), "lon: -10.12 to 6.00, lat: 40.00 to 55.50");
    }
}
