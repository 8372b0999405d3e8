//! Maps `Box<dyn Error>` from trait boundaries to typed `SonarError`.
//!
//! The traits in `sonar_traits` use `Box<dyn Error + Send + Sync>` so any
//! backend can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `sonar_hardware::HwError`.

use crate::error::SonarError;

/// Map a trait-boundary error to a typed `SonarError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> SonarError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<sonar_hardware::error::HwError>() {
            return match hw {
                sonar_hardware::error::HwError::Disconnected => SonarError::Disconnected,
                other => SonarError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("disconnected") {
        SonarError::Disconnected
    } else {
        SonarError::Hardware(s)
    }
}

/// Convert a boxed trait error into an `eyre::Report` carrying a `SonarError`.
pub(crate) fn hw_report(e: Box<dyn std::error::Error + Send + Sync>) -> eyre::Report {
    eyre::Report::new(map_hw_error(&*e))
}
