//! CF time handling and daily-gap detection.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Unit of a CF `"<unit> since <epoch>"` time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Length of one unit in seconds.
    pub fn seconds(&self) -> f64 {
        match self {
            Self::Seconds => 1.0,
            Self::Minutes => 60.0,
            Self::Hours => 3600.0,
            Self::Days => 86400.0,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "seconds" | "second" | "secs" | "sec" | "s" => Some(Self::Seconds),
            "minutes" | "minute" | "mins" | "min" => Some(Self::Minutes),
            "hours" | "hour" | "hrs" | "hr" | "h" => Some(Self::Hours),
            "days" | "day" | "d" => Some(Self::Days),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
        }
    }
}

/// Parsed CF time units, e.g. `seconds since 1981-01-01 00:00:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfTimeUnits {
    pub unit: TimeUnit,
    pub epoch: DateTime<Utc>,
}

impl CfTimeUnits {
    pub fn new(unit: TimeUnit, epoch: DateTime<Utc>) -> Self {
        Self { unit, epoch }
    }

    /// Parse a CF `units` attribute value.
    pub fn parse(units: &str) -> Result<Self, TimeParseError> {
        let (unit_str, epoch_str) = units
            .split_once(" since ")
            .ok_or_else(|| TimeParseError::InvalidUnits(units.to_string()))?;

        let unit = TimeUnit::parse(unit_str.trim())
            .ok_or_else(|| TimeParseError::UnknownUnit(unit_str.trim().to_string()))?;
        let epoch = parse_epoch(epoch_str.trim())
            .ok_or_else(|| TimeParseError::InvalidEpoch(epoch_str.trim().to_string()))?;

        Ok(Self { unit, epoch })
    }

    /// Convert a raw coordinate value to a UTC timestamp.
    pub fn decode(&self, value: f64) -> Result<DateTime<Utc>, TimeParseError> {
        if !value.is_finite() {
            return Err(TimeParseError::OutOfRange(value));
        }
        let millis = (value * self.unit.seconds() * 1000.0).round();
        if millis.abs() > i64::MAX as f64 {
            return Err(TimeParseError::OutOfRange(value));
        }
        self.epoch
            .checked_add_signed(Duration::milliseconds(millis as i64))
            .ok_or(TimeParseError::OutOfRange(value))
    }

    /// Convert a UTC timestamp back to a raw coordinate value.
    pub fn encode(&self, time: DateTime<Utc>) -> f64 {
        let millis = (time - self.epoch).num_milliseconds() as f64;
        millis / 1000.0 / self.unit.seconds()
    }

    /// Render as a CF `units` attribute value.
    pub fn to_units_string(&self) -> String {
        format!(
            "{} since {}",
            self.unit.as_str(),
            self.epoch.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

fn parse_epoch(s: &str) -> Option<DateTime<Utc>> {
    // Drop a trailing zone designator; CF epochs in these products are UTC.
    let s = s.trim_end_matches(" UTC").trim_end_matches('Z');

    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

/// A discontinuity between two consecutive timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeGap {
    /// Last timestamp before the gap.
    pub start: DateTime<Utc>,
    /// First timestamp after the gap.
    pub end: DateTime<Utc>,
    /// Number of sampling intervals missing between `start` and `end`.
    pub missing: u64,
}

/// Find every adjacent pair in `times` separated by more than `interval`.
///
/// `times` must already be sorted ascending. Runs in one linear pass. A
/// separation that is not a whole multiple of `interval` counts the partial
/// interval as missing.
pub fn detect_gaps(times: &[DateTime<Utc>], interval: Duration) -> Vec<TimeGap> {
    let step = interval.num_milliseconds();
    if step <= 0 {
        return Vec::new();
    }

    times
        .windows(2)
        .filter_map(|pair| {
            let diff = (pair[1] - pair[0]).num_milliseconds();
            if diff <= step {
                return None;
            }
            let intervals = (diff + step - 1) / step;
            Some(TimeGap {
                start: pair[0],
                end: pair[1],
                missing: (intervals - 1) as u64,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeParseError {
    #[error("time units '{0}' are not of the form '<unit> since <epoch>'")]
    InvalidUnits(String),

    #[error("unknown time unit '{0}'")]
    UnknownUnit(String),

    #[error("invalid time epoch '{0}'")]
    InvalidEpoch(String),

    #[error("time value {0} is out of range")]
    OutOfRange(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap() + Duration::days(n - 1)
    }

    #[test]
    fn test_parse_ostia_units() {
        let units = CfTimeUnits::parse("seconds since 1981-01-01 00:00:00").unwrap();
        assert_eq!(units.unit, TimeUnit::Seconds);
        assert_eq!(units.epoch, Utc.with_ymd_and_hms(1981, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_date_only_epoch() {
        let units = CfTimeUnits::parse("days since 1970-01-01").unwrap();
        assert_eq!(units.unit, TimeUnit::Days);
        let t = units.decode(1.5).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(1970, 1, 2, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            CfTimeUnits::parse("fortnights"),
            Err(TimeParseError::InvalidUnits(_))
        ));
        assert!(matches!(
            CfTimeUnits::parse("fortnights since 2000-01-01"),
            Err(TimeParseError::UnknownUnit(_))
        ));
        assert!(matches!(
            CfTimeUnits::parse("days since yesterday"),
            Err(TimeParseError::InvalidEpoch(_))
        ));
    }

    #[test]
    fn test_encode_inverts_decode() {
        let units = CfTimeUnits::parse("hours since 2000-01-01T00:00:00").unwrap();
        let t = units.decode(36.0).unwrap();
        assert_eq!(units.encode(t), 36.0);
        assert_eq!(units.to_units_string(), "hours since 2000-01-01 00:00:00");
    }

    #[test]
    fn test_single_gap_two_missing_days() {
        let times = vec![day(1), day(2), day(5), day(6)];
        let gaps = detect_gaps(&times, Duration::days(1));
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].start, day(2));
        assert_eq!(gaps[0].end, day(5));
        assert_eq!(gaps[0].missing, 2);
    }

    #[test]
    fn test_no_gaps_for_daily_series() {
        let times: Vec<_> = (1..=10).map(day).collect();
        assert!(detect_gaps(&times, Duration::days(1)).is_empty());
        assert!(detect_gaps(&times[..1], Duration::days(1)).is_empty());
        assert!(detect_gaps(&[], Duration::days(1)).is_empty());
    }

    #[test]
    fn test_partial_interval_counts_as_missing() {
        let times = vec![day(1), day(1) + Duration::hours(36)];
        let gaps = detect_gaps(&times, Duration::days(1));
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].missing, 1);
    }
}
