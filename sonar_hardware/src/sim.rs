//! Simulated HC-SR04.
//!
//! A background thread waits for trigger pulses, then raises and drops the
//! echo line after the delays a real sensor would produce for a target whose
//! distance follows [`SimProfile`]. Edges go through the same
//! [`ArmedEdge`] filter the GPIO backend uses, so the engine sees the same
//! notification pattern on both.
//!
//! The thread is shut down and joined when the [`SimSonar`] is dropped.
use crossbeam_channel as xch;
use sonar_traits::{Clock, Edge, EdgeSink, EdgeSource, Level, TriggerPin};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::armed::ArmedEdge;
use crate::error::{HwError, Result};

/// How often the idle thread looks at the shutdown flag.
const IDLE_CHECK: Duration = Duration::from_millis(20);

/// Target motion and sensor behaviour of the simulation.
#[derive(Debug, Clone, Copy)]
pub struct SimProfile {
    pub base_mm: u32,
    /// Peak deviation of a sinusoid around `base_mm`; 0 keeps the target still.
    pub amplitude_mm: u32,
    pub period_ms: u64,
    /// Swallow every N-th ping (0 never drops).
    pub drop_every: u32,
    /// Trigger to echo-rise delay.
    pub echo_latency_us: u64,
    /// Speed of sound the simulated air has, in mm/ms.
    pub speed_of_sound_mm_per_ms: u32,
}

impl Default for SimProfile {
    fn default() -> Self {
        Self {
            base_mm: 500,
            amplitude_mm: 0,
            period_ms: 4_000,
            drop_every: 0,
            echo_latency_us: 450,
            speed_of_sound_mm_per_ms: 350,
        }
    }
}

impl SimProfile {
    /// Target distance `t_ms` after the simulation started.
    pub fn distance_mm_at(&self, t_ms: u64) -> u32 {
        if self.amplitude_mm == 0 || self.period_ms == 0 {
            return self.base_mm;
        }
        let phase = (t_ms % self.period_ms) as f64 / self.period_ms as f64;
        let offset = f64::from(self.amplitude_mm) * (phase * std::f64::consts::TAU).sin();
        (f64::from(self.base_mm) + offset).round().max(0.0) as u32
    }

    /// Echo pulse width for a target at `distance_mm`.
    pub fn echo_us(&self, distance_mm: u32) -> u64 {
        let speed = u64::from(self.speed_of_sound_mm_per_ms.max(1));
        u64::from(distance_mm) * 2_000 / speed
    }

    /// Whether the 1-based `ping` is swallowed.
    pub fn drops(&self, ping: u64) -> bool {
        self.drop_every != 0 && ping % u64::from(self.drop_every) == 0
    }
}

type SinkCell = Arc<OnceLock<Arc<dyn EdgeSink>>>;

pub struct SimSonar {
    armed: Arc<ArmedEdge>,
    ping_tx: xch::Sender<()>,
    sink: SinkCell,
    pings: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl SimSonar {
    pub fn spawn<C: Clock + Send + 'static>(profile: SimProfile, clock: C) -> Self {
        let (ping_tx, ping_rx) = xch::bounded::<()>(1);
        let armed = Arc::new(ArmedEdge::new());
        let sink: SinkCell = Arc::new(OnceLock::new());
        let pings = Arc::new(AtomicU64::new(0));
        let shutdown = Arc::new(AtomicBool::new(false));

        let worker = EchoWorker {
            profile,
            clock,
            armed: armed.clone(),
            sink: sink.clone(),
            pings: pings.clone(),
            shutdown: shutdown.clone(),
        };
        let join_handle = std::thread::spawn(move || worker.run(&ping_rx));

        Self {
            armed,
            ping_tx,
            sink,
            pings,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    pub fn edge_source(&self) -> SimEdgeSource {
        SimEdgeSource {
            armed: self.armed.clone(),
        }
    }

    pub fn trigger(&self) -> SimTrigger {
        SimTrigger {
            ping_tx: self.ping_tx.clone(),
            level: None,
            pulse_open: false,
        }
    }

    /// Route echo edges to `sink`. Pings before this are answered silently.
    pub fn attach(&self, sink: Arc<dyn EdgeSink>) -> Result<()> {
        self.sink.set(sink).map_err(|_| HwError::AlreadyAttached)
    }

    /// Trigger pulses seen so far, dropped ones included.
    pub fn pings(&self) -> u64 {
        self.pings.load(Ordering::Relaxed)
    }
}

impl Drop for SimSonar {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("sim echo thread joined"),
                Err(e) => tracing::warn!(?e, "sim echo thread panicked during shutdown"),
            }
        }
    }
}

struct EchoWorker<C> {
    profile: SimProfile,
    clock: C,
    armed: Arc<ArmedEdge>,
    sink: SinkCell,
    pings: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
}

impl<C: Clock> EchoWorker<C> {
    fn run(self, ping_rx: &xch::Receiver<()>) {
        let epoch_us = self.clock.now_us();
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                tracing::debug!("sim echo thread received shutdown signal");
                break;
            }
            match ping_rx.recv_timeout(IDLE_CHECK) {
                Ok(()) => {}
                Err(xch::RecvTimeoutError::Timeout) => continue,
                Err(xch::RecvTimeoutError::Disconnected) => {
                    tracing::debug!("all sim triggers dropped, exiting thread");
                    break;
                }
            }

            let ping = self.pings.fetch_add(1, Ordering::Relaxed) + 1;
            if self.profile.drops(ping) {
                tracing::trace!(ping, "sim echo dropped");
                continue;
            }
            let t_ms = self.clock.elapsed_us(epoch_us) / 1_000;
            let distance_mm = self.profile.distance_mm_at(t_ms);
            let width_us = self.profile.echo_us(distance_mm);
            tracing::trace!(ping, distance_mm, width_us, "sim echo");

            self.clock.sleep(Duration::from_micros(self.profile.echo_latency_us));
            self.deliver(Edge::Rising);
            self.clock.sleep(Duration::from_micros(width_us));
            self.deliver(Edge::Falling);
        }
        tracing::trace!("sim echo thread exiting cleanly");
    }

    fn deliver(&self, edge: Edge) {
        if !self.armed.fire(edge) {
            return;
        }
        if let Some(sink) = self.sink.get() {
            sink.notify(edge);
        }
    }
}

/// Edge source half of the simulation.
#[derive(Debug, Clone)]
pub struct SimEdgeSource {
    armed: Arc<ArmedEdge>,
}

impl EdgeSource for SimEdgeSource {
    fn watch(
        &mut self,
        edge: Edge,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.armed.arm(edge);
        Ok(())
    }

    fn cancel(
        &mut self,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.armed.disarm();
        Ok(())
    }
}

/// Trigger half of the simulation.
///
/// A ping is sent on the falling edge of a pulse that started from low; the
/// very first high (the idle level set at init) does not count.
#[derive(Debug)]
pub struct SimTrigger {
    ping_tx: xch::Sender<()>,
    level: Option<Level>,
    pulse_open: bool,
}

impl TriggerPin for SimTrigger {
    fn set_level(
        &mut self,
        level: Level,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match (self.level, level) {
            (Some(Level::Low), Level::High) => self.pulse_open = true,
            (Some(Level::High), Level::Low) if self.pulse_open => {
                self.pulse_open = false;
                match self.ping_tx.try_send(()) {
                    // the sensor is still busy with the previous ping
                    Ok(()) | Err(xch::TrySendError::Full(())) => {}
                    Err(xch::TrySendError::Disconnected(())) => {
                        return Err(Box::new(HwError::Disconnected));
                    }
                }
            }
            _ => {}
        }
        self.level = Some(level);
        Ok(())
    }
}
