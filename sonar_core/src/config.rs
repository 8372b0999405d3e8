//! Runtime configuration types for the sampling engine.
//!
//! These are separate from the TOML-deserialized config in `sonar_config`;
//! see `conversions` for the mapping.

/// Where a sample falls relative to the valid measurement band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    TooClose,
    InBand,
    TooFar,
}

/// Valid measurement band `[min_mm, max_mm)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeCfg {
    /// Inclusive lower bound (mm).
    pub min_mm: i32,
    /// Exclusive upper bound (mm).
    pub max_mm: i32,
}

impl RangeCfg {
    #[inline]
    pub fn classify(&self, mm: i32) -> Band {
        if mm < self.min_mm {
            Band::TooClose
        } else if mm >= self.max_mm {
            Band::TooFar
        } else {
            Band::InBand
        }
    }

    #[inline]
    pub fn contains(&self, mm: i32) -> bool {
        self.classify(mm) == Band::InBand
    }
}

impl Default for RangeCfg {
    fn default() -> Self {
        // HC-SR04 datasheet range: 2 cm to 4 m
        Self {
            min_mm: 20,
            max_mm: 4_000,
        }
    }
}

/// Engine configuration supplied once at build time.
#[derive(Debug, Clone, Copy)]
pub struct SonarCfg {
    pub range: RangeCfg,
    /// Number of slots in the circular window; `MIN_WINDOW_SIZE..=MAX_WINDOW_SIZE`.
    pub window_size: usize,
}

impl Default for SonarCfg {
    fn default() -> Self {
        Self {
            range: RangeCfg::default(),
            window_size: 10,
        }
    }
}
