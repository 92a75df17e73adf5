//! Coordinate axis and SST value generators for tests.
//!
//! Values are chosen so that every cell is exactly representable as `f32`
//! and encodes where it came from, which lets tests check subsetting and
//! reordering by value alone.

/// Creates a regularly spaced axis: `start, start + step, ...` (`n` values).
///
/// A negative `step` produces a descending axis.
pub fn regular_axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Deterministic SST value for a cell of an unpacked fixture.
///
/// Encodes `day * 10_000 + row * 100 + col`, exact in `f32` for
/// `day < 1000` and `row, col < 100`.
pub fn sst_value(day: i64, row: usize, col: usize) -> f32 {
    (day * 10_000 + (row * 100 + col) as i64) as f32
}

/// Raw `i16` value stored for a cell of a packed fixture.
pub fn packed_raw_value(row: usize, col: usize) -> i16 {
    (row * 100 + col) as i16
}

/// Scale factor used by packed fixtures.
pub const PACKED_SCALE_FACTOR: f32 = 0.01;

/// Offset used by packed fixtures (0 °C in kelvin).
pub const PACKED_ADD_OFFSET: f32 = 273.15;

/// Fill value used by packed fixtures.
pub const PACKED_FILL_VALUE: i16 = -32768;

/// Fill value used by unpacked fixtures.
pub const FLOAT_FILL_VALUE: f32 = -32768.0;

/// Decoded value of a packed fixture cell.
pub fn packed_sst_value(row: usize, col: usize) -> f32 {
    (packed_raw_value(row, col) as f64 * PACKED_SCALE_FACTOR as f64 + PACKED_ADD_OFFSET as f64)
        as f32
}
