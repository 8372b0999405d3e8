#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Interrupt-driven sampling engine for HC-SR04-class ultrasonic sensors
//! (hardware-agnostic).
//!
//! All hardware interactions go through `sonar_traits::EdgeSource`,
//! `sonar_traits::TriggerPin` and `sonar_traits::Clock`.
//!
//! ## Architecture
//!
//! - **Window**: circular buffer of samples and poll timestamps (`window`)
//! - **Engine**: edge state machine and poll driver (`engine`)
//! - **Statistics**: mean distance, variance, velocity (`stats`)
//! - **Calibration**: speed of sound and zero offset (`calibration`)
//! - **Sharing**: mutex handle plus edge sink for callback threads (`shared`)
//! - **Runner**: fixed-cadence poll loop with periodic reports (`runner`)
//!
//! ## Units
//!
//! Distances are integer millimetres, speeds mm/s, poll timestamps
//! milliseconds and echo timing microseconds.

pub mod builder;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod engine;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod reading;
pub mod runner;
pub mod shared;
pub mod stats;
pub mod util;
pub mod window;

pub use builder::{Missing, SonarBuilder};
pub use calibration::Calibration;
pub use config::{Band, RangeCfg, SonarCfg};
pub use engine::{BoxedSonar, Phase, SonarEngine};
pub use error::{BuildError, SonarError};
pub use reading::{Reading, Report};
pub use shared::SharedSonar;
pub use sonar_config::{MAX_WINDOW_SIZE, MIN_WINDOW_SIZE};
pub use window::{SampleWindow, Slot};
