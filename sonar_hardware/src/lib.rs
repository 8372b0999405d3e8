//! Sensor backends for the sonar engine: a threaded simulation and, with
//! the `hardware` feature on Linux, an rppal GPIO driver.
pub mod armed;
pub mod error;
pub mod sim;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod hcsr04;

pub use armed::ArmedEdge;
pub use sim::{SimEdgeSource, SimProfile, SimSonar, SimTrigger};
