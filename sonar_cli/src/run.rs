//! Backend assembly and the `run` / `self-check` commands.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use eyre::WrapErr;
use serde_json::json;
use sonar_config::{Config, RECOMMENDED_POLL_INTERVAL_MS};
use sonar_core::error::{Result, SonarError};
use sonar_core::runner::{self, RunParams, RunSummary};
use sonar_core::{BoxedSonar, Calibration, Report, SharedSonar, SonarBuilder, SonarCfg};
use sonar_traits::{EdgeSink, EdgeSource, TriggerPin};

type SharedBoxed = SharedSonar<
    Box<dyn EdgeSource + Send>,
    Box<dyn TriggerPin + Send>,
    sonar_traits::MonotonicClock,
>;

/// Whatever has to outlive the engine for edges to keep flowing.
enum Listener {
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    Sim(sonar_hardware::SimSonar),
    #[cfg(all(feature = "hardware", target_os = "linux"))]
    Gpio(sonar_hardware::hcsr04::EchoListener),
}

impl Listener {
    fn attach(&mut self, sink: Arc<dyn EdgeSink>) -> Result<()> {
        match self {
            #[cfg(not(all(feature = "hardware", target_os = "linux")))]
            Listener::Sim(sim) => sim.attach(sink)?,
            #[cfg(all(feature = "hardware", target_os = "linux"))]
            Listener::Gpio(l) => l.attach(sink)?,
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        match self {
            #[cfg(not(all(feature = "hardware", target_os = "linux")))]
            Listener::Sim(_) => "sim",
            #[cfg(all(feature = "hardware", target_os = "linux"))]
            Listener::Gpio(_) => "gpio",
        }
    }
}

struct Backend {
    edges: Box<dyn EdgeSource + Send>,
    trigger: Box<dyn TriggerPin + Send>,
    listener: Listener,
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_backend(cfg: &Config) -> Result<Backend> {
    let (edges, trigger, listener) =
        sonar_hardware::hcsr04::open(cfg.pins.trigger, cfg.pins.echo)
            .wrap_err("open hc-sr04 pins")?;
    Ok(Backend {
        edges: Box::new(edges),
        trigger: Box::new(trigger),
        listener: Listener::Gpio(listener),
    })
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn open_backend(cfg: &Config) -> Result<Backend> {
    let profile = sonar_hardware::SimProfile {
        base_mm: cfg.sim.base_mm,
        amplitude_mm: cfg.sim.amplitude_mm,
        period_ms: cfg.sim.period_ms,
        drop_every: cfg.sim.drop_every,
        echo_latency_us: cfg.sim.echo_latency_us,
        speed_of_sound_mm_per_ms: cfg.calibration.speed_of_sound_mm_per_ms,
    };
    let sim = sonar_hardware::SimSonar::spawn(profile, sonar_traits::MonotonicClock::new());
    Ok(Backend {
        edges: Box::new(sim.edge_source()),
        trigger: Box::new(sim.trigger()),
        listener: Listener::Sim(sim),
    })
}

/// Open the backend, build the engine and route echo edges into it.
/// The returned listener must be kept alive while polling.
fn assemble(cfg: &Config) -> Result<(SharedBoxed, Listener)> {
    let Backend {
        edges,
        trigger,
        mut listener,
    } = open_backend(cfg)?;
    let engine: BoxedSonar = SonarBuilder::new()
        .with_edges(edges)
        .with_trigger(trigger)
        .with_config(SonarCfg::from(cfg))
        .with_calibration(Calibration::from(&cfg.calibration))
        .build()?;
    let shared = SharedSonar::new(engine);
    listener.attach(shared.sink()?)?;
    tracing::info!(
        backend = listener.name(),
        trigger_pin = cfg.pins.trigger,
        echo_pin = cfg.pins.echo,
        "sonar ready"
    );
    Ok((shared, listener))
}

fn unix_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

pub fn report_json(poll: u64, report: &Report) -> serde_json::Value {
    json!({
        "timestamp": unix_ms(),
        "poll": poll,
        "reading": report.distance.kind(),
        "distance_mm": report.distance.distance_mm(),
        "variance_mm2": report.variance_mm2,
        "velocity_mm_s": report.velocity_mm_s,
    })
}

pub fn report_text(poll: u64, report: &Report) -> String {
    match report.variance_mm2 {
        Some(var) => format!(
            "poll {poll}: distance {}, variance {var} mm², velocity {} mm/s",
            report.distance, report.velocity_mm_s
        ),
        None => format!(
            "poll {poll}: {}, velocity {} mm/s",
            report.distance, report.velocity_mm_s
        ),
    }
}

pub fn run_sonar(
    cfg: &Config,
    polls: Option<u64>,
    json_mode: bool,
    shutdown: &AtomicBool,
) -> Result<RunSummary> {
    if cfg.poll.interval_ms < RECOMMENDED_POLL_INTERVAL_MS {
        tracing::warn!(
            interval_ms = cfg.poll.interval_ms,
            recommended_ms = RECOMMENDED_POLL_INTERVAL_MS,
            "poll interval below the sensor's re-trigger time; far echoes will be lost"
        );
    }
    let (sonar, _listener) = assemble(cfg)?;
    let params = RunParams {
        max_polls: polls,
        ..RunParams::from(&cfg.poll)
    };

    let stdout = std::io::stdout();
    let summary = runner::run(
        &sonar,
        &sonar_traits::MonotonicClock::new(),
        params,
        shutdown,
        |poll, report| {
            let mut out = stdout.lock();
            if json_mode {
                writeln!(out, "{}", report_json(poll, report))?;
            } else {
                writeln!(out, "{}", report_text(poll, report))?;
            }
            out.flush()?;
            Ok(())
        },
    )?;
    tracing::info!(
        polls = summary.polls,
        reports = summary.reports,
        "run finished"
    );
    Ok(summary)
}

/// Fill one window at the configured cadence and require at least one echo.
pub fn self_check(cfg: &Config, json_mode: bool) -> Result<()> {
    let (sonar, listener) = assemble(cfg)?;
    let window = cfg.window.size;
    let params = RunParams {
        max_polls: Some(window as u64),
        report_every: u32::try_from(window).unwrap_or(u32::MAX),
        ..RunParams::from(&cfg.poll)
    };
    let shutdown = AtomicBool::new(false);
    let summary = runner::run(
        &sonar,
        &sonar_traits::MonotonicClock::new(),
        params,
        &shutdown,
        |_, _| Ok(()),
    )?;

    let echoes = sonar
        .lock()?
        .window()
        .slots()
        .iter()
        .filter(|s| s.echo().is_some())
        .count();
    if echoes == 0 {
        return Err(SonarError::Hardware(format!(
            "no echo received in {} polls",
            summary.polls
        )))
        .wrap_err("self-check failed");
    }

    let reading = summary.last_report.map(|r| r.distance);
    if json_mode {
        println!(
            "{}",
            json!({
                "self_check": "ok",
                "backend": listener.name(),
                "echoes": echoes,
                "polls": summary.polls,
                "reading": reading.map(|r| r.kind()),
                "distance_mm": reading.and_then(|r| r.distance_mm()),
            })
        );
    } else {
        let shown = reading.map_or_else(|| "none".to_string(), |r| r.to_string());
        println!(
            "self-check ok: backend={}, {echoes}/{} echoes, reading {shown}",
            listener.name(),
            summary.polls
        );
    }
    Ok(())
}
