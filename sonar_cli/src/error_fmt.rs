//! Human-readable error descriptions and structured JSON error formatting.

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use sonar_core::error::{BuildError, SonarError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingConfig => {
                "What happened: The sonar engine was built without a configuration.\nLikely causes: The config was not wired into the builder.\nHow to fix: Pass the range and window settings via with_config(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/sonar_config.toml for a sample."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<SonarError>() {
        return match se {
            SonarError::Config(msg) => format!(
                "What happened: Configuration is invalid or incomplete ({msg}).\nLikely causes: Missing [pins]/[range] tables or out-of-range values.\nHow to fix: Edit the TOML config and try again."
            ),
            SonarError::Disconnected => "What happened: The sensor backend went away.\nLikely causes: GPIO released by another process, or the simulated sensor thread stopped.\nHow to fix: Check wiring and that no other program holds the pins, then restart.".to_string(),
            SonarError::Hardware(msg) if msg.contains("no echo") => format!(
                "What happened: The sensor never answered ({msg}).\nLikely causes: ECHO not wired to the configured pin, no 5V/GND, or nothing in front of the sensor.\nHow to fix: Verify [pins] trigger/echo and power, and that the echo line is level-shifted to 3.3V."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("open hc-sr04 pins") {
        return "What happened: Failed to initialize GPIO pins.\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO (gpio group).".to_string();
    }

    if lower.contains("reading config") {
        let cause = err.root_cause();
        return format!(
            "What happened: Could not read the config file ({cause}).\nHow to fix: Pass --config <FILE> pointing to a readable TOML file."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable name for the error class, used as `reason` in JSON output.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    use sonar_core::error::{BuildError, SonarError};
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    match err.downcast_ref::<SonarError>() {
        Some(SonarError::Config(_)) => "Config",
        Some(SonarError::Disconnected) => "Disconnected",
        Some(SonarError::Hardware(_) | SonarError::HardwareFault(_)) => "Hardware",
        Some(SonarError::State(_)) => "State",
        None => "Error",
    }
}

/// Stable exit codes: config 2, disconnected 3, hardware 4, anything else 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match reason_name(err) {
        "Config" => 2,
        "Disconnected" => 3,
        "Hardware" => 4,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}
