use rstest::rstest;
use sonar_config::load_toml;

fn config_with(extra: &str) -> String {
    format!(
        r#"
[pins]
trigger = 23
echo = 24

[range]
min_mm = 20
max_mm = 4000

{extra}
"#
    )
}

#[rstest]
#[case("[window]\nsize = 2", "window.size must be in")]
#[case("[window]\nsize = 31", "window.size must be in")]
#[case("[calibration]\nspeed_of_sound_mm_per_ms = 0", "speed_of_sound_mm_per_ms must be > 0")]
#[case("[poll]\ninterval_ms = 5", "poll.interval_ms must be >=")]
#[case("[poll]\nreport_every = 0", "report_every must be >= 1")]
#[case("[logging]\nrotation = \"weekly\"", "logging.rotation must be one of")]
#[case("[sim]\nbase_mm = 100\namplitude_mm = 200", "amplitude_mm must not exceed")]
fn rejects_out_of_range_values(#[case] extra: &str, #[case] expected: &str) {
    let cfg = load_toml(&config_with(extra)).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(expected),
        "unexpected message: {err}"
    );
}

#[test]
fn rejects_inverted_range() {
    let toml = r#"
[pins]
trigger = 23
echo = 24

[range]
min_mm = 500
max_mm = 500
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("min == max is empty band");
    assert!(format!("{err}").contains("range.min_mm must be < range.max_mm"));
}

#[test]
fn rejects_shared_trigger_and_echo_pin() {
    let toml = r#"
[pins]
trigger = 7
echo = 7

[range]
min_mm = 20
max_mm = 4000
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("same pin twice");
    assert!(format!("{err}").contains("must differ"));
}

#[test]
fn accepts_full_config() {
    let toml = r#"
[pins]
trigger = 23
echo = 24

[range]
min_mm = 20
max_mm = 4000

[window]
size = 30

[calibration]
speed_of_sound_mm_per_ms = 343
zero_offset_mm = -5

[poll]
interval_ms = 60
report_every = 5

[logging]
file = "sonar.log"
level = "debug"
rotation = "daily"

[sim]
base_mm = 800
amplitude_mm = 300
period_ms = 2000
drop_every = 4
echo_latency_us = 300
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.window.size, 30);
    assert_eq!(cfg.calibration.zero_offset_mm, -5);
    assert_eq!(cfg.sim.drop_every, 4);
}
