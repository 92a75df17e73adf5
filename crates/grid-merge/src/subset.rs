//! Spatial selection, time ordering and gap detection.

use std::ops::Range;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sst_common::{detect_gaps, BoundingBox, TimeGap};

use crate::dataset::TimeSlice;
use crate::events::{MergeEvent, MergeObserver, Stage, StageTimer};
use crate::normalize::NormalizedDataset;

/// Inclusive selection of `axis` values within `[min, max]`.
///
/// `axis` must be monotonic (ascending or descending); the matching indices
/// are then contiguous. Returns `None` when nothing matches.
pub fn select_range(axis: &[f64], min: f64, max: f64) -> Option<Range<usize>> {
    let inside = |v: &f64| *v >= min && *v <= max;
    let start = axis.iter().position(inside)?;
    let end = axis.iter().rposition(inside)?;
    Some(start..end + 1)
}

/// Sort slices by time (stable) and drop repeated timestamps, keeping the
/// first occurrence in input order. Returns the number dropped.
pub fn sort_and_dedup(slices: &mut Vec<TimeSlice>) -> usize {
    slices.sort_by_key(|s| s.time);
    let before = slices.len();
    slices.dedup_by_key(|s| s.time);
    before - slices.len()
}

/// The normalized dataset restricted to a box and ordered by time.
#[derive(Debug, Clone)]
pub struct SubsetDataset {
    pub source: NormalizedDataset,
    /// The box the selection was made with.
    pub bounds: BoundingBox,
    /// Selected index window on the source longitude axis.
    pub lon_range: Range<usize>,
    /// Selected index window on the source latitude axis.
    pub lat_range: Range<usize>,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    /// Strictly ascending, no duplicates.
    pub slices: Vec<TimeSlice>,
    pub duplicates_dropped: usize,
    pub gaps: Vec<TimeGap>,
}

impl SubsetDataset {
    /// (time, lat, lon) extents.
    pub fn shape(&self) -> [usize; 3] {
        [self.slices.len(), self.lat.len(), self.lon.len()]
    }

    pub fn times(&self) -> Vec<DateTime<Utc>> {
        self.slices.iter().map(|s| s.time).collect()
    }

    pub fn time_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.slices.first()?.time, self.slices.last()?.time))
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.source.variables.iter().map(|v| v.name.clone()).collect()
    }

    /// Total missing sampling intervals over all gaps.
    pub fn missing_intervals(&self) -> u64 {
        self.gaps.iter().map(|g| g.missing).sum()
    }
}

/// Why a selection came out empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmptySelection {
    pub bounds: BoundingBox,
    /// (min, max) of the dataset longitudes, if any.
    pub lon_extent: Option<(f64, f64)>,
    /// (min, max) of the dataset latitudes, if any.
    pub lat_extent: Option<(f64, f64)>,
    pub selected_lon: usize,
    pub selected_lat: usize,
}

impl std::fmt::Display for EmptySelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let extent = |e: Option<(f64, f64)>| match e {
            Some((lo, hi)) => format!("{:.2} to {:.2}", lo, hi),
            None => "none".to_string(),
        };
        write!(
            f,
            "box {} selects {} longitudes and {} latitudes (dataset lon: {}, lat: {})",
            self.bounds.describe(),
            self.selected_lon,
            self.selected_lat,
            extent(self.lon_extent),
            extent(self.lat_extent)
        )
    }
}

/// Result of subsetting.
#[derive(Debug, Clone)]
pub enum Selection {
    Subset(SubsetDataset),
    Empty(EmptySelection),
}

fn extent(axis: &[f64]) -> Option<(f64, f64)> {
    let min = axis.iter().copied().fold(f64::INFINITY, f64::min);
    let max = axis.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (min <= max).then_some((min, max))
}

/// Restrict `dataset` to `bounds`, sort by time and detect gaps larger
/// than `interval`.
pub fn subset(
    dataset: NormalizedDataset,
    bounds: &BoundingBox,
    interval: Duration,
    observer: &dyn MergeObserver,
) -> Selection {
    let _timer = StageTimer::start(observer, Stage::Subset);

    let lon_range = select_range(&dataset.lon, bounds.min_lon, bounds.max_lon);
    let lat_range = select_range(&dataset.lat, bounds.min_lat, bounds.max_lat);

    let (lon_range, lat_range) = match (lon_range, lat_range) {
        (Some(lon), Some(lat)) => (lon, lat),
        (lon, lat) => {
            let empty = EmptySelection {
                bounds: *bounds,
                lon_extent: extent(&dataset.lon),
                lat_extent: extent(&dataset.lat),
                selected_lon: lon.map(|r| r.len()).unwrap_or(0),
                selected_lat: lat.map(|r| r.len()).unwrap_or(0),
            };
            observer.on_event(&MergeEvent::EmptySelection {
                reason: empty.to_string(),
            });
            return Selection::Empty(empty);
        }
    };

    let mut slices = dataset.dataset.slices.clone();
    let duplicates_dropped = sort_and_dedup(&mut slices);
    let times: Vec<DateTime<Utc>> = slices.iter().map(|s| s.time).collect();
    let gaps = detect_gaps(&times, interval);

    let lon = dataset.lon[lon_range.clone()].to_vec();
    let lat = dataset.lat[lat_range.clone()].to_vec();

    observer.on_event(&MergeEvent::SubsetSelected {
        time_steps: slices.len(),
        rows: lat.len(),
        cols: lon.len(),
        duplicates_dropped,
    });
    for gap in &gaps {
        observer.on_event(&MergeEvent::GapDetected { gap: *gap });
    }

    Selection::Subset(SubsetDataset {
        source: dataset,
        bounds: *bounds,
        lon_range,
        lat_range,
        lon,
        lat,
        slices,
        duplicates_dropped,
        gaps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn slice(file: usize, day: u32) -> TimeSlice {
        TimeSlice {
            file,
            local_index: 0,
            time: Utc.with_ymd_and_hms(2020, 1, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_select_range_ascending_inclusive() {
        let axis = [-2.0, -1.0, 0.0, 1.0, 2.0];
        assert_eq!(select_range(&axis, -1.0, 1.0), Some(1..4));
        assert_eq!(select_range(&axis, -1.5, 0.5), Some(1..3));
        assert_eq!(select_range(&axis, -10.0, 10.0), Some(0..5));
    }

    #[test]
    fn test_select_range_descending() {
        let axis = [2.0, 1.0, 0.0, -1.0, -2.0];
        assert_eq!(select_range(&axis, -1.0, 1.0), Some(1..4));
    }

    #[test]
    fn test_select_range_empty() {
        let axis = [0.0, 1.0, 2.0];
        assert_eq!(select_range(&axis, 5.0, 6.0), None);
        assert_eq!(select_range(&axis, 0.2, 0.8), None);
        assert_eq!(select_range(&[], 0.0, 1.0), None);
    }

    #[test]
    fn test_sort_and_dedup_keeps_first() {
        let mut slices = vec![slice(0, 3), slice(1, 1), slice(2, 3), slice(3, 2)];
        let dropped = sort_and_dedup(&mut slices);
        assert_eq!(dropped, 1);
        let files: Vec<usize> = slices.iter().map(|s| s.file).collect();
        assert_eq!(files, vec![1, 3, 0]);
        assert!(slices.windows(2).all(|w| w[0].time < w[1].time));
    }

    #[test]
    fn test_extent() {
        assert_eq!(extent(&[3.0, 1.0, 2.0]), Some((1.0, 3.0)));
        assert_eq!(extent(&[]), None);
    }

    #[test]
    fn test_empty_selection_display() {
        let empty = EmptySelection {
            bounds: BoundingBox::new(100.0, 50.0, 110.0, 60.0),
            lon_extent: Some((-5.0, 4.0)),
            lat_extent: Some((-2.0, 3.0)),
            selected_lon: 0,
            selected_lat: 0,
        };
        let text = empty.to_string();
        assert!(text.contains("lon: 100.00 to 110.00"));
        assert!(text.contains("dataset lon: -5.00 to 4.00"));
    }
}
