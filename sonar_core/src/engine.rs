//! The sampling engine (`SonarEngine`).
//!
//! Owns the circular window and the edge state machine that turns a
//! rising/falling pair on the echo line into one distance sample:
//!
//! ```text
//! Idle --poll()--> Armed --rising--> Timing --falling--> Idle
//! ```
//!
//! Exactly one edge watch is live at a time. A poll always cancels whatever
//! watch is outstanding and re-arms the rising edge, so an echo that never
//! completes costs one slot and nothing else.

use std::time::Duration;

use eyre::WrapErr;
use sonar_traits::{Clock, Edge, EdgeSource, Level, MonotonicClock, TriggerPin};
use tracing::{debug, trace, warn};

use crate::calibration::Calibration;
use crate::config::RangeCfg;
use crate::error::Result;
use crate::hw_error::hw_report;
use crate::reading::{Reading, Report};
use crate::stats;
use crate::util::{TRIGGER_PULSE_US, TRIGGER_SETTLE_US};
use crate::window::{SampleWindow, Slot};

/// Where the current measurement cycle stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No watch armed.
    Idle,
    /// Trigger sent, waiting for the echo line to rise.
    Armed,
    /// Echo line is high since `start_us`.
    Timing { start_us: u64 },
}

/// Engine over boxed backends, for callers that pick hardware at runtime.
pub type BoxedSonar = SonarEngine<
    Box<dyn EdgeSource + Send>,
    Box<dyn TriggerPin + Send>,
    MonotonicClock,
>;

pub struct SonarEngine<E: EdgeSource, T: TriggerPin, C: Clock = MonotonicClock> {
    pub(crate) edges: E,
    pub(crate) trigger: T,
    pub(crate) clock: C,
    pub(crate) window: SampleWindow,
    pub(crate) range: RangeCfg,
    pub(crate) calibration: Calibration,
    /// Calibration supplied at build time; `reset` returns to it.
    pub(crate) initial_calibration: Calibration,
    pub(crate) phase: Phase,
}

impl<E: EdgeSource, T: TriggerPin, C: Clock> core::fmt::Debug for SonarEngine<E, T, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SonarEngine")
            .field("window_size", &self.window.len())
            .field("write_index", &self.window.write_index())
            .field("poll_index", &self.window.poll_index())
            .field("phase", &self.phase)
            .field("calibration", &self.calibration)
            .finish()
    }
}

impl<E: EdgeSource, T: TriggerPin, C: Clock> SonarEngine<E, T, C> {
    // ── Poll driver ──────────────────────────────────────────────────────

    /// Run one measurement cycle: reconcile lost echoes, stamp the slot,
    /// arm the rising edge and fire the trigger pulse.
    ///
    /// Callers must respect the sensor's re-trigger interval; the engine does
    /// not rate-limit.
    pub fn poll(&mut self) -> Result<()> {
        self.edges
            .cancel()
            .map_err(hw_report)
            .wrap_err("cancelling echo watch")?;
        self.phase = Phase::Idle;

        let missed = self.window.reconcile();
        if missed > 0 {
            debug!(missed, "echo lost, slot marked missed");
        }

        let slot = self.window.stamp_poll(self.clock.now_ms());

        if let Err(e) = self.arm_and_fire() {
            self.disarm();
            return Err(e);
        }

        self.window.advance_poll();
        trace!(slot, "poll issued");
        Ok(())
    }

    fn arm_and_fire(&mut self) -> Result<()> {
        self.phase = Phase::Armed;
        self.edges
            .watch(Edge::Rising)
            .map_err(hw_report)
            .wrap_err("arming rising-edge watch")?;
        self.pulse_trigger().wrap_err("sending trigger pulse")
    }

    /// Back to `Idle` with no watch live after a failed poll. The slot stays
    /// unwritten and `poll_index` does not move, so `write_index` cannot
    /// overtake it.
    fn disarm(&mut self) {
        self.phase = Phase::Idle;
        if let Err(e) = self.edges.cancel() {
            warn!(error = %e, "could not cancel echo watch after failed poll");
        }
    }

    /// HC-SR04 trigger: low 2 µs, high 10 µs, low.
    fn pulse_trigger(&mut self) -> Result<()> {
        self.trigger.set_level(Level::Low).map_err(hw_report)?;
        self.clock.sleep(Duration::from_micros(TRIGGER_SETTLE_US));
        self.trigger.set_level(Level::High).map_err(hw_report)?;
        self.clock.sleep(Duration::from_micros(TRIGGER_PULSE_US));
        self.trigger.set_level(Level::Low).map_err(hw_report)?;
        Ok(())
    }

    // ── Edge handlers ────────────────────────────────────────────────────

    /// Entry point for edge notifications, stamped with the engine clock at
    /// the time of the call. Edges that do not match the current phase are
    /// ignored.
    pub fn on_edge(&mut self, edge: Edge) -> Result<()> {
        let at_us = self.clock.now_us();
        self.on_edge_at(edge, at_us)
    }

    /// Like `on_edge`, with the edge time captured by the caller. `at_us`
    /// must come from the same clock the engine runs on.
    pub fn on_edge_at(&mut self, edge: Edge, at_us: u64) -> Result<()> {
        match (self.phase, edge) {
            (Phase::Armed, Edge::Rising) => self.on_rising(at_us),
            (Phase::Timing { start_us }, Edge::Falling) => self.on_falling(start_us, at_us),
            (phase, edge) => {
                trace!(?phase, ?edge, "ignoring edge outside its phase");
                Ok(())
            }
        }
    }

    fn on_rising(&mut self, at_us: u64) -> Result<()> {
        self.phase = Phase::Timing { start_us: at_us };
        self.edges
            .watch(Edge::Falling)
            .map_err(hw_report)
            .wrap_err("arming falling-edge watch")
    }

    fn on_falling(&mut self, start_us: u64, at_us: u64) -> Result<()> {
        let elapsed_us = at_us.wrapping_sub(start_us);
        let distance_mm = self.calibration.distance_mm(elapsed_us);
        let slot = self.window.record(Slot::Echo(distance_mm));
        self.phase = Phase::Idle;
        trace!(slot, elapsed_us, distance_mm, "echo complete");
        self.edges
            .cancel()
            .map_err(hw_report)
            .wrap_err("cancelling falling-edge watch")
    }

    // ── Statistics ───────────────────────────────────────────────────────

    /// Mean in-band distance, or why there is none.
    pub fn mean_distance(&self) -> Reading {
        stats::mean_distance(&self.window, &self.range)
    }

    /// Mean squared deviation of the whole window from `reference_mm`.
    pub fn variance(&self, reference_mm: i32) -> u64 {
        stats::variance(&self.window, reference_mm)
    }

    /// Mean velocity in mm/s (positive = moving away).
    pub fn mean_velocity(&self) -> i32 {
        stats::mean_velocity(&self.window, &self.range)
    }

    /// All three statistics from a single view of the window.
    pub fn report(&self) -> Report {
        let distance = self.mean_distance();
        Report {
            distance,
            variance_mm2: distance.distance_mm().map(|mm| self.variance(mm)),
            velocity_mm_s: self.mean_velocity(),
        }
    }

    // ── Calibration ──────────────────────────────────────────────────────

    pub fn set_speed_of_sound(&mut self, mm_per_ms: u32) {
        self.calibration.speed_of_sound_mm_per_ms = mm_per_ms;
    }

    pub fn set_zero_offset(&mut self, mm: i32) {
        self.calibration.zero_offset_mm = mm;
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    // ── Lifecycle / inspection ───────────────────────────────────────────

    /// Drop all samples, cancel any watch and restore the build-time
    /// calibration.
    pub fn reset(&mut self) -> Result<()> {
        self.edges
            .cancel()
            .map_err(hw_report)
            .wrap_err("cancelling echo watch")?;
        self.phase = Phase::Idle;
        self.window.reset();
        self.calibration = self.initial_calibration;
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn range(&self) -> RangeCfg {
        self.range
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    pub fn window_size(&self) -> usize {
        self.window.len()
    }

    pub fn write_index(&self) -> usize {
        self.window.write_index()
    }

    pub fn poll_index(&self) -> usize {
        self.window.poll_index()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
