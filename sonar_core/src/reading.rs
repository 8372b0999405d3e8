//! Results returned by the statistics readers.

use std::fmt;

/// Outcome of a mean-distance query over the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    /// Mean of the in-band samples (mm).
    Distance(i32),
    /// Not enough in-band samples and no out-of-band majority.
    NoData,
    /// Most out-of-band samples were beyond the far limit.
    TooFar,
    /// Most out-of-band samples were below the near limit.
    TooClose,
}

impl Reading {
    pub fn distance_mm(self) -> Option<i32> {
        match self {
            Reading::Distance(mm) => Some(mm),
            _ => None,
        }
    }

    /// Stable machine-readable name.
    pub fn kind(self) -> &'static str {
        match self {
            Reading::Distance(_) => "distance",
            Reading::NoData => "no_data",
            Reading::TooFar => "too_far",
            Reading::TooClose => "too_close",
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Distance(mm) => write!(f, "{mm} mm"),
            other => f.write_str(other.kind()),
        }
    }
}

/// Snapshot of all window statistics taken under one lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub distance: Reading,
    /// Variance around the reported mean; `None` when there is no mean.
    pub variance_mm2: Option<u64>,
    pub velocity_mm_s: i32,
}
