//! Unit and timing constants shared by the engine and its tests.

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: i64 = 1_000;

/// Divisor turning `elapsed_us * speed_mm_per_ms` into a one-way distance:
/// a factor 2 for the round trip and 1000 for the µs→ms unit change.
pub const ROUND_TRIP_DIVISOR: u128 = 2_000;

/// Low time before the trigger pulse (HC-SR04 protocol).
pub const TRIGGER_SETTLE_US: u64 = 2;
/// High time of the trigger pulse (HC-SR04 protocol).
pub const TRIGGER_PULSE_US: u64 = 10;

/// Clamp a 64-bit intermediate into the `i32` range.
#[inline]
pub fn saturate_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
