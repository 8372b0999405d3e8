use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel as xch;
use sonar_hardware::error::HwError;
use sonar_hardware::{SimEdgeSource, SimProfile, SimSonar};
use sonar_traits::{Edge, EdgeSink, EdgeSource, Level, MonotonicClock, TriggerPin};

/// Forwards edges to a channel and, like the engine, arms the falling edge
/// once the rising one arrives.
struct ChannelSink {
    tx: xch::Sender<(Edge, Instant)>,
    edges: std::sync::Mutex<SimEdgeSource>,
}

impl EdgeSink for ChannelSink {
    fn notify(&self, edge: Edge) {
        if edge == Edge::Rising
            && let Ok(mut e) = self.edges.lock()
        {
            e.watch(Edge::Falling).expect("arm falling");
        }
        let _ = self.tx.send((edge, Instant::now()));
    }
}

fn setup(profile: SimProfile) -> (SimSonar, xch::Receiver<(Edge, Instant)>) {
    let sim = SimSonar::spawn(profile, MonotonicClock::new());
    let (tx, rx) = xch::unbounded();
    sim.attach(Arc::new(ChannelSink {
        tx,
        edges: std::sync::Mutex::new(sim.edge_source()),
    }))
    .expect("attach");
    (sim, rx)
}

fn pulse(trigger: &mut impl TriggerPin) {
    trigger.set_level(Level::Low).expect("low");
    trigger.set_level(Level::High).expect("high");
    trigger.set_level(Level::Low).expect("low");
}

#[test]
fn armed_ping_produces_rising_then_falling() {
    let (sim, rx) = setup(SimProfile {
        base_mm: 700, // 4000 µs echo at 350 mm/ms
        ..SimProfile::default()
    });
    let mut edges = sim.edge_source();
    let mut trigger = sim.trigger();
    trigger.set_level(Level::High).expect("park");

    edges.watch(Edge::Rising).expect("watch");
    pulse(&mut trigger);

    let (first, t_rise) = rx.recv_timeout(Duration::from_secs(1)).expect("rising");
    let (second, t_fall) = rx.recv_timeout(Duration::from_secs(1)).expect("falling");
    assert_eq!(first, Edge::Rising);
    assert_eq!(second, Edge::Falling);
    assert!(t_fall.duration_since(t_rise) >= Duration::from_micros(4_000));
    assert_eq!(sim.pings(), 1);
}

#[test]
fn unarmed_ping_is_silent() {
    let (sim, rx) = setup(SimProfile::default());
    let mut trigger = sim.trigger();
    trigger.set_level(Level::High).expect("park");
    pulse(&mut trigger);

    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    assert_eq!(sim.pings(), 1);
}

#[test]
fn dropped_pings_follow_the_schedule() {
    let (sim, rx) = setup(SimProfile {
        base_mm: 100,
        drop_every: 2,
        ..SimProfile::default()
    });
    let mut edges = sim.edge_source();
    let mut trigger = sim.trigger();
    trigger.set_level(Level::High).expect("park");

    let mut answered = Vec::new();
    for _ in 0..4 {
        edges.watch(Edge::Rising).expect("watch");
        pulse(&mut trigger);
        let got = rx.recv_timeout(Duration::from_millis(100)).is_ok();
        if got {
            rx.recv_timeout(Duration::from_millis(100)).expect("falling");
        }
        answered.push(got);
    }
    assert_eq!(answered, vec![true, false, true, false]);
    assert_eq!(sim.pings(), 4);
}

#[test]
fn second_attach_is_rejected() {
    let (sim, _rx) = setup(SimProfile::default());
    let (tx, _rx2) = xch::unbounded();
    let err = sim
        .attach(Arc::new(ChannelSink {
            tx,
            edges: std::sync::Mutex::new(sim.edge_source()),
        }))
        .expect_err("already attached");
    assert!(matches!(err, HwError::AlreadyAttached));
}

#[test]
fn drop_joins_promptly() {
    let (sim, _rx) = setup(SimProfile::default());
    let started = Instant::now();
    drop(sim);
    assert!(started.elapsed() < Duration::from_millis(500));
}
