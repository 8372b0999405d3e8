#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    let Ok(cfg) = sonar_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }
    // Anything that validates must also build an engine.
    let clock = sonar_traits::ManualClock::new();
    let built = sonar_core::SonarBuilder::new()
        .with_edges(sonar_core::mocks::RecordingEdges::new())
        .with_trigger(sonar_core::mocks::RecordingTrigger::new(clock.clone()))
        .with_clock(clock)
        .with_config((&cfg).into())
        .with_calibration((&cfg.calibration).into())
        .build();
    assert!(built.is_ok(), "validated config rejected by builder");
});
