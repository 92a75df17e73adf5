//! Common types and utilities shared across the SST merge workspace.

pub mod bbox;
pub mod time;

pub use bbox::{BboxError, BoundingBox};
pub use time::{detect_gaps, CfTimeUnits, TimeGap, TimeParseError, TimeUnit};
