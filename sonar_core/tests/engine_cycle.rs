use sonar_core::error::SonarError;
use sonar_core::mocks::{DeadTrigger, EdgeCall, FlakyTrigger, RecordingEdges, RecordingTrigger};
use sonar_core::{Calibration, Phase, RangeCfg, SonarBuilder, SonarCfg, SonarEngine, Slot};
use sonar_traits::{Edge, Level, ManualClock, TriggerPin};

type TestSonar = SonarEngine<RecordingEdges, RecordingTrigger, ManualClock>;

fn cfg(window_size: usize) -> SonarCfg {
    SonarCfg {
        range: RangeCfg {
            min_mm: 20,
            max_mm: 4_000,
        },
        window_size,
    }
}

fn build(clock: ManualClock) -> (TestSonar, RecordingEdges, RecordingTrigger) {
    let edges = RecordingEdges::new();
    let trigger = RecordingTrigger::new(clock.clone());
    let sonar = SonarBuilder::new()
        .with_edges(edges.clone())
        .with_trigger(trigger.clone())
        .with_clock(clock)
        .with_config(cfg(5))
        .build()
        .expect("build sonar");
    (sonar, edges, trigger)
}

fn echo<T: TriggerPin>(
    sonar: &mut SonarEngine<RecordingEdges, T, ManualClock>,
    clock: &ManualClock, elapsed_us: u64) {
    sonar.on_edge(Edge::Rising).expect("rising");
    clock.advance_us(elapsed_us);
    sonar.on_edge(Edge::Falling).expect("falling");
}

#[test]
fn reference_echo_lands_in_first_slot() {
    let clock = ManualClock::new();
    let (mut sonar, edges, _) = build(clock.clone());
    let write_before = sonar.write_index();

    sonar.poll().expect("poll");
    echo(&mut sonar, &clock, 5_820);

    assert_eq!(sonar.window().slot(write_before), Some(Slot::Echo(1_018)));
    assert_eq!(sonar.write_index(), 1);
    assert_eq!(sonar.poll_index(), 1);
    assert_eq!(sonar.phase(), Phase::Idle);
    assert_eq!(edges.armed(), None);
}

#[test]
fn watches_follow_the_state_machine() {
    let clock = ManualClock::new();
    let (mut sonar, edges, _) = build(clock.clone());
    edges.clear();

    sonar.poll().expect("poll");
    assert_eq!(edges.calls(), vec![EdgeCall::Cancel, EdgeCall::Watch(Edge::Rising)]);
    assert_eq!(sonar.phase(), Phase::Armed);

    clock.advance_us(400);
    sonar.on_edge(Edge::Rising).expect("rising");
    assert_eq!(edges.armed(), Some(Edge::Falling));
    // the trigger pulse moved the manual clock by 2 + 10 µs
    assert_eq!(sonar.phase(), Phase::Timing { start_us: 412 });

    clock.advance_us(1_000);
    sonar.on_edge(Edge::Falling).expect("falling");
    assert_eq!(
        edges.calls(),
        vec![
            EdgeCall::Cancel,
            EdgeCall::Watch(Edge::Rising),
            EdgeCall::Watch(Edge::Falling),
            EdgeCall::Cancel,
        ]
    );
}

#[test]
fn trigger_pulse_follows_hcsr04_timing() {
    let clock = ManualClock::starting_at_us(1_000);
    let (mut sonar, _, trigger) = build(clock.clone());
    // build parks the line high
    assert_eq!(trigger.levels(), vec![(Level::High, 1_000)]);
    trigger.clear();

    sonar.poll().expect("poll");
    assert_eq!(
        trigger.levels(),
        vec![(Level::Low, 1_000), (Level::High, 1_002), (Level::Low, 1_012)]
    );
}

#[test]
fn poll_records_trigger_time_in_ms() {
    let clock = ManualClock::new();
    let (mut sonar, _, _) = build(clock.clone());
    clock.advance_ms(250);
    sonar.poll().expect("poll");
    assert_eq!(sonar.window().timestamp_ms(0), Some(250));
}

#[test]
fn edges_outside_their_phase_are_ignored() {
    let clock = ManualClock::new();
    let (mut sonar, edges, _) = build(clock.clone());
    edges.clear();

    // idle: nothing armed
    sonar.on_edge(Edge::Rising).expect("ignored");
    sonar.on_edge(Edge::Falling).expect("ignored");
    assert_eq!(sonar.phase(), Phase::Idle);

    // armed: a falling edge before any rising edge does not complete a sample
    sonar.poll().expect("poll");
    sonar.on_edge(Edge::Falling).expect("ignored");
    assert_eq!(sonar.phase(), Phase::Armed);
    assert_eq!(sonar.write_index(), 0);
}

#[test]
fn calibration_changes_apply_to_next_echo() {
    let clock = ManualClock::new();
    let (mut sonar, _, _) = build(clock.clone());
    sonar.set_speed_of_sound(340);
    sonar.set_zero_offset(10);

    sonar.poll().expect("poll");
    echo(&mut sonar, &clock, 5_820);
    // 5820 * 340 / 2000 = 989, minus 10
    assert_eq!(sonar.window().slot(0), Some(Slot::Echo(979)));
    assert_eq!(
        sonar.calibration(),
        Calibration {
            speed_of_sound_mm_per_ms: 340,
            zero_offset_mm: 10
        }
    );
}

#[test]
fn echo_timing_survives_counter_wrap() {
    let clock = ManualClock::starting_at_us(u64::MAX - 1_000);
    let (mut sonar, _, _) = build(clock.clone());
    sonar.poll().expect("poll");
    echo(&mut sonar, &clock, 5_820);
    assert_eq!(sonar.window().slot(0), Some(Slot::Echo(1_018)));
}

#[test]
fn late_falling_edge_after_repoll_is_discarded() {
    let clock = ManualClock::new();
    let (mut sonar, edges, _) = build(clock.clone());

    sonar.poll().expect("poll 1");
    sonar.on_edge(Edge::Rising).expect("rising");
    clock.advance_ms(60);

    // echo never fell before the next cycle
    sonar.poll().expect("poll 2");
    assert_eq!(sonar.window().slot(0), Some(Slot::Missed));
    assert_eq!(sonar.write_index(), 1);
    assert_eq!(edges.armed(), Some(Edge::Rising));

    sonar.on_edge(Edge::Falling).expect("stale falling ignored");
    assert_eq!(sonar.write_index(), 1);

    echo(&mut sonar, &clock, 2_000);
    assert_eq!(sonar.window().slot(1), Some(Slot::Echo(350)));
}

#[test]
fn reset_restores_initial_state_and_calibration() {
    let clock = ManualClock::new();
    let (mut sonar, edges, _) = build(clock.clone());
    sonar.poll().expect("poll");
    echo(&mut sonar, &clock, 5_820);
    sonar.poll().expect("poll");
    sonar.set_zero_offset(33);

    sonar.reset().expect("reset");
    assert_eq!(sonar.write_index(), 0);
    assert_eq!(sonar.poll_index(), 0);
    assert_eq!(sonar.phase(), Phase::Idle);
    assert_eq!(edges.armed(), None);
    assert!(sonar.window().slots().iter().all(|s| *s == Slot::Missed));
    assert_eq!(sonar.calibration(), Calibration::default());
}

#[test]
fn dead_trigger_fails_build_with_typed_error() {
    let err = SonarBuilder::new()
        .with_edges(RecordingEdges::new())
        .with_trigger(DeadTrigger)
        .with_clock(ManualClock::new())
        .with_config(cfg(5))
        .build()
        .expect_err("trigger line is gone");
    match err.downcast_ref::<SonarError>() {
        Some(SonarError::Disconnected) => {}
        other => panic!("expected Disconnected, got: {other:?}"),
    }
}

#[test]
fn trigger_failure_mid_poll_leaves_engine_idle_and_keeps_samples() {
    let clock = ManualClock::new();
    let edges = RecordingEdges::new();
    // One call parks the line at build, three per poll; the final low of the
    // third poll fails.
    let mut sonar = SonarBuilder::new()
        .with_edges(edges.clone())
        .with_trigger(FlakyTrigger::failing_after(1 + 3 + 3 + 2))
        .with_clock(clock.clone())
        .with_calibration(Calibration {
            speed_of_sound_mm_per_ms: 350,
            zero_offset_mm: 0,
        })
        .with_config(cfg(5))
        .build()
        .expect("build sonar");

    for _ in 0..2 {
        sonar.poll().expect("poll");
        echo(&mut sonar, &clock, 2_000);
        clock.advance_ms(60);
    }
    assert_eq!(sonar.window().slot(0), Some(Slot::Echo(350)));
    assert_eq!(sonar.window().slot(1), Some(Slot::Echo(350)));

    let err = sonar.poll().expect_err("trigger drops mid-pulse");
    match err.downcast_ref::<SonarError>() {
        Some(SonarError::Disconnected) => {}
        other => panic!("expected Disconnected, got: {other:?}"),
    }
    assert_eq!(sonar.phase(), Phase::Idle);
    assert_eq!(edges.armed(), None);
    assert_eq!(sonar.write_index(), 2);
    assert_eq!(sonar.poll_index(), 2);

    // A stray echo after the failure must not be recorded.
    echo(&mut sonar, &clock, 2_000);
    assert_eq!(sonar.write_index(), 2);
    assert_eq!(sonar.window().pending(), 0);

    // The trigger stays dead, but the retry still must not wipe samples.
    sonar.poll().expect_err("trigger still gone");
    assert_eq!(sonar.window().slot(0), Some(Slot::Echo(350)));
    assert_eq!(sonar.window().slot(1), Some(Slot::Echo(350)));
    assert_eq!(sonar.write_index(), sonar.poll_index());
}

#[test]
fn edge_time_passed_in_is_used_for_the_echo() {
    let clock = ManualClock::new();
    let (mut sonar, _, _) = build(clock.clone());

    sonar.poll().expect("poll");
    clock.set_us(50_000);
    sonar.on_edge_at(Edge::Rising, 10_000).expect("rising");
    assert_eq!(sonar.phase(), Phase::Timing { start_us: 10_000 });
    sonar.on_edge_at(Edge::Falling, 12_000).expect("falling");

    assert_eq!(sonar.window().slot(0), Some(Slot::Echo(350)));
}
