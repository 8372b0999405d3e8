//! `From` implementations bridging `sonar_config` types to `sonar_core` types.

use crate::calibration::Calibration;
use crate::config::{RangeCfg, SonarCfg};
use crate::runner::RunParams;

// ── RangeCfg ─────────────────────────────────────────────────────────────────

impl From<&sonar_config::RangeCfg> for RangeCfg {
    fn from(c: &sonar_config::RangeCfg) -> Self {
        Self {
            min_mm: c.min_mm,
            max_mm: c.max_mm,
        }
    }
}

// ── SonarCfg ─────────────────────────────────────────────────────────────────

impl From<&sonar_config::Config> for SonarCfg {
    fn from(c: &sonar_config::Config) -> Self {
        Self {
            range: (&c.range).into(),
            window_size: c.window.size,
        }
    }
}

// ── Calibration ──────────────────────────────────────────────────────────────

impl From<&sonar_config::CalibrationCfg> for Calibration {
    fn from(c: &sonar_config::CalibrationCfg) -> Self {
        Self {
            speed_of_sound_mm_per_ms: c.speed_of_sound_mm_per_ms,
            zero_offset_mm: c.zero_offset_mm,
        }
    }
}

// ── RunParams ────────────────────────────────────────────────────────────────

impl From<&sonar_config::PollCfg> for RunParams {
    fn from(c: &sonar_config::PollCfg) -> Self {
        Self {
            interval: std::time::Duration::from_millis(c.interval_ms),
            report_every: c.report_every,
            max_polls: None,
        }
    }
}
