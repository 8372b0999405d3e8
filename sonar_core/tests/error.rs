use rstest::rstest;
use sonar_core::SonarError;
use sonar_core::hw_error::map_hw_error;
use sonar_hardware::error::HwError;

#[test]
fn hw_disconnected_maps_to_disconnected() {
    assert!(matches!(
        map_hw_error(&HwError::Disconnected),
        SonarError::Disconnected
    ));
}

#[rstest]
#[case::gpio(HwError::Gpio("pin 24 busy".into()), "pin 24 busy")]
#[case::io(HwError::Io(std::io::Error::other("bus error")), "bus error")]
fn other_hw_errors_are_faults(#[case] err: HwError, #[case] needle: &str) {
    match map_hw_error(&err) {
        SonarError::HardwareFault(msg) => assert!(msg.contains(needle), "{msg}"),
        other => panic!("unexpected mapping: {other:?}"),
    }
}

#[test]
fn foreign_errors_fall_back_to_message() {
    let e = std::io::Error::other("line Disconnected by peer");
    assert!(matches!(map_hw_error(&e), SonarError::Disconnected));

    let e = std::io::Error::other("permission denied");
    match map_hw_error(&e) {
        SonarError::Hardware(msg) => assert_eq!(msg, "permission denied"),
        other => panic!("unexpected mapping: {other:?}"),
    }
}
