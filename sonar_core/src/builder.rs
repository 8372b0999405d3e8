//! Type-state builder for `SonarEngine`.
//!
//! `build()` only exists once both an edge source and a trigger pin have been
//! supplied; the configuration is checked at build time and reported as a
//! typed `BuildError`.

use eyre::WrapErr;
use sonar_traits::{Clock, EdgeSource, Level, MonotonicClock, TriggerPin};

use crate::calibration::Calibration;
use crate::config::SonarCfg;
use crate::engine::{Phase, SonarEngine};
use crate::error::{BuildError, Result};
use crate::hw_error::hw_report;
use crate::window::SampleWindow;
use crate::{MAX_WINDOW_SIZE, MIN_WINDOW_SIZE};

/// Placeholder for a backend that has not been supplied yet.
pub struct Missing;

pub struct SonarBuilder<E, T, C> {
    edges: E,
    trigger: T,
    clock: C,
    config: Option<SonarCfg>,
    calibration: Option<Calibration>,
}

impl Default for SonarBuilder<Missing, Missing, MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl SonarBuilder<Missing, Missing, MonotonicClock> {
    /// Start building an engine with the real-time clock.
    pub fn new() -> Self {
        Self {
            edges: Missing,
            trigger: Missing,
            clock: MonotonicClock::new(),
            config: None,
            calibration: None,
        }
    }
}

impl<T, C> SonarBuilder<Missing, T, C> {
    /// Edge notification backend for the echo pin.
    pub fn with_edges<E: EdgeSource>(self, edges: E) -> SonarBuilder<E, T, C> {
        SonarBuilder {
            edges,
            trigger: self.trigger,
            clock: self.clock,
            config: self.config,
            calibration: self.calibration,
        }
    }
}

impl<E, C> SonarBuilder<E, Missing, C> {
    /// Output driving the sensor's trigger input.
    pub fn with_trigger<T: TriggerPin>(self, trigger: T) -> SonarBuilder<E, T, C> {
        SonarBuilder {
            edges: self.edges,
            trigger,
            clock: self.clock,
            config: self.config,
            calibration: self.calibration,
        }
    }
}

impl<E, T, C> SonarBuilder<E, T, C> {
    /// Replace the clock (tests inject a `ManualClock`).
    pub fn with_clock<C2: Clock>(self, clock: C2) -> SonarBuilder<E, T, C2> {
        SonarBuilder {
            edges: self.edges,
            trigger: self.trigger,
            clock,
            config: self.config,
            calibration: self.calibration,
        }
    }

    pub fn with_config(mut self, config: SonarCfg) -> Self {
        self.config = Some(config);
        self
    }

    /// Optional; defaults to 350 mm/ms and no offset.
    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = Some(calibration);
        self
    }
}

impl<E: EdgeSource, T: TriggerPin, C: Clock> SonarBuilder<E, T, C> {
    /// Validate the configuration, park the trigger line high and return an
    /// engine with an all-missed window.
    pub fn build(mut self) -> Result<SonarEngine<E, T, C>> {
        let config = self.config.ok_or(BuildError::MissingConfig)?;
        if !(MIN_WINDOW_SIZE..=MAX_WINDOW_SIZE).contains(&config.window_size) {
            return Err(BuildError::InvalidConfig("window_size out of range").into());
        }
        if config.range.min_mm >= config.range.max_mm {
            return Err(BuildError::InvalidConfig("min_mm must be below max_mm").into());
        }
        let calibration = self.calibration.unwrap_or_default();
        if calibration.speed_of_sound_mm_per_ms == 0 {
            return Err(BuildError::InvalidConfig("speed_of_sound must be > 0").into());
        }

        self.edges
            .cancel()
            .map_err(hw_report)
            .wrap_err("clearing echo watch")?;
        self.trigger
            .set_level(Level::High)
            .map_err(hw_report)
            .wrap_err("parking trigger line")?;

        tracing::info!(
            window_size = config.window_size,
            min_mm = config.range.min_mm,
            max_mm = config.range.max_mm,
            speed_of_sound = calibration.speed_of_sound_mm_per_ms,
            zero_offset = calibration.zero_offset_mm,
            "sonar engine initialised"
        );

        Ok(SonarEngine {
            edges: self.edges,
            trigger: self.trigger,
            clock: self.clock,
            window: SampleWindow::new(config.window_size),
            range: config.range,
            calibration,
            initial_calibration: calibration,
            phase: Phase::Idle,
        })
    }
}
