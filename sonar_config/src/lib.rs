#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the sonar workspace.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Only the `[pins]` and `[range]` tables are mandatory; everything else
//!   falls back to the defaults documented on each struct.
use serde::Deserialize;

/// Smallest window that still yields a velocity estimate.
pub const MIN_WINDOW_SIZE: usize = 3;
/// Hard capacity of the sample window.
pub const MAX_WINDOW_SIZE: usize = 30;

/// Fastest poll cadence accepted from a config file. The HC-SR04 datasheet
/// asks for 60 ms between triggers; anything below this floor loses every
/// echo beyond a couple of metres.
pub const MIN_POLL_INTERVAL_MS: u64 = 10;
/// Recommended re-trigger interval for HC-SR04-class sensors.
pub const RECOMMENDED_POLL_INTERVAL_MS: u64 = 60;

#[derive(Debug, Deserialize)]
pub struct Pins {
    /// GPIO driving the sensor's TRIG input
    pub trigger: u8,
    /// GPIO reading the sensor's ECHO output (must support edge interrupts)
    pub echo: u8,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct RangeCfg {
    /// Inclusive lower bound of the valid band (mm)
    pub min_mm: i32,
    /// Exclusive upper bound of the valid band (mm)
    pub max_mm: i32,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct WindowCfg {
    /// Number of poll slots kept in the circular window
    pub size: usize,
}

impl Default for WindowCfg {
    fn default() -> Self {
        Self { size: 10 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Speed of sound in mm/ms (numerically equal to m/s)
    pub speed_of_sound_mm_per_ms: u32,
    /// Subtracted from every computed distance (mm)
    pub zero_offset_mm: i32,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            speed_of_sound_mm_per_ms: 350,
            zero_offset_mm: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct PollCfg {
    /// Delay between consecutive trigger pulses
    pub interval_ms: u64,
    /// Emit a report every N polls
    pub report_every: u32,
}

impl Default for PollCfg {
    fn default() -> Self {
        Self {
            interval_ms: RECOMMENDED_POLL_INTERVAL_MS,
            report_every: 10,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Target profile for the simulated backend.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SimCfg {
    /// Distance the simulated target oscillates around (mm)
    pub base_mm: u32,
    /// Peak deviation from `base_mm` (mm); 0 keeps the target still
    pub amplitude_mm: u32,
    /// Period of the oscillation
    pub period_ms: u64,
    /// Swallow every N-th echo (0 never drops)
    pub drop_every: u32,
    /// Delay between the trigger pulse and the echo line rising
    pub echo_latency_us: u64,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            base_mm: 500,
            amplitude_mm: 0,
            period_ms: 4_000,
            drop_every: 0,
            echo_latency_us: 450,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    pub range: RangeCfg,
    #[serde(default)]
    pub window: WindowCfg,
    #[serde(default)]
    pub calibration: CalibrationCfg,
    #[serde(default)]
    pub poll: PollCfg,
    #[serde(default)]
    pub logging: Logging,
    /// Simulated target, used when no hardware backend is compiled in
    #[serde(default)]
    pub sim: SimCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins
        if self.pins.trigger == self.pins.echo {
            eyre::bail!("pins.trigger and pins.echo must differ");
        }

        // Range
        if self.range.min_mm < 0 {
            eyre::bail!("range.min_mm must be >= 0");
        }
        if self.range.min_mm >= self.range.max_mm {
            eyre::bail!("range.min_mm must be < range.max_mm");
        }

        // Window
        if !(MIN_WINDOW_SIZE..=MAX_WINDOW_SIZE).contains(&self.window.size) {
            eyre::bail!(
                "window.size must be in [{MIN_WINDOW_SIZE}, {MAX_WINDOW_SIZE}], got {}",
                self.window.size
            );
        }

        // Calibration
        if self.calibration.speed_of_sound_mm_per_ms == 0 {
            eyre::bail!("calibration.speed_of_sound_mm_per_ms must be > 0");
        }

        // Poll
        if self.poll.interval_ms < MIN_POLL_INTERVAL_MS {
            eyre::bail!("poll.interval_ms must be >= {MIN_POLL_INTERVAL_MS}");
        }
        if self.poll.interval_ms > 60_000 {
            eyre::bail!("poll.interval_ms is unreasonably large (>60s)");
        }
        if self.poll.report_every == 0 {
            eyre::bail!("poll.report_every must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        // Sim
        if self.sim.period_ms == 0 {
            eyre::bail!("sim.period_ms must be >= 1");
        }
        if self.sim.amplitude_mm > self.sim.base_mm {
            eyre::bail!("sim.amplitude_mm must not exceed sim.base_mm");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[pins]
trigger = 23
echo = 24

[range]
min_mm = 20
max_mm = 4000
"#;

    #[test]
    fn minimal_config_fills_defaults() {
        let cfg = load_toml(MINIMAL).expect("parse");
        assert_eq!(cfg.window.size, 10);
        assert_eq!(cfg.calibration.speed_of_sound_mm_per_ms, 350);
        assert_eq!(cfg.calibration.zero_offset_mm, 0);
        assert_eq!(cfg.poll.interval_ms, RECOMMENDED_POLL_INTERVAL_MS);
        assert!(cfg.logging.file.is_none());
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn missing_range_is_a_parse_error() {
        let toml = "[pins]\ntrigger = 1\necho = 2\n";
        assert!(load_toml(toml).is_err());
    }
}
