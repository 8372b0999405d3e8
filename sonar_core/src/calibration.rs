use crate::util::{ROUND_TRIP_DIVISOR, saturate_i32};

/// Linear time-of-flight calibration.
/// distance_mm = elapsed_us * speed_of_sound_mm_per_ms / 2000 - zero_offset_mm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    /// mm/ms, numerically equal to m/s.
    pub speed_of_sound_mm_per_ms: u32,
    pub zero_offset_mm: i32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            speed_of_sound_mm_per_ms: 350,
            zero_offset_mm: 0,
        }
    }
}

impl Calibration {
    /// Convert a measured echo pulse width into a one-way distance.
    ///
    /// The product is formed in 128 bits so that a stale timestamp (huge
    /// elapsed value) saturates instead of overflowing.
    pub fn distance_mm(&self, elapsed_us: u64) -> i32 {
        let travel = u128::from(elapsed_us) * u128::from(self.speed_of_sound_mm_per_ms)
            / ROUND_TRIP_DIVISOR;
        let travel = i64::try_from(travel).unwrap_or(i64::MAX);
        saturate_i32(travel.saturating_sub(i64::from(self.zero_offset_mm)))
    }
}
