use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Below this, `MonotonicClock::sleep` busy-waits instead of yielding to the
/// scheduler; trigger pulses need microsecond resolution.
const SPIN_THRESHOLD: Duration = Duration::from_micros(500);

/// Monotonic microsecond/millisecond counters used for echo timing.
///
/// - now_us(): microseconds since the clock's epoch
/// - now_ms(): milliseconds since the clock's epoch
/// - sleep(): waits for the provided duration (implementations may simulate)
///
/// Counters may wrap; callers take differences with `elapsed_us`, which uses
/// wrapping subtraction.
pub trait Clock {
    fn now_us(&self) -> u64;
    fn sleep(&self, d: Duration);

    fn now_ms(&self) -> u64 {
        self.now_us() / 1_000
    }

    /// Microseconds elapsed since `start_us`, tolerant of counter wrap-around.
    fn elapsed_us(&self, start_us: u64) -> u64 {
        self.now_us().wrapping_sub(start_us)
    }
}

/// Default, real-time monotonic clock backed by `std::time::Instant`.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now_us(&self) -> u64 {
        let us = self.epoch.elapsed().as_micros();
        (us.min(u128::from(u64::MAX))) as u64
    }

    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        if d < SPIN_THRESHOLD {
            let deadline = Instant::now() + d;
            while Instant::now() < deadline {
                std::hint::spin_loop();
            }
            return;
        }
        thread::sleep(d);
    }
}

/// Deterministic clock whose time only moves when told to.
///
/// now_us() = start + offset
/// sleep(d) advances internal time by d without actually sleeping.
/// Clones share the same counter, so a test can hold one handle while the
/// engine owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_us: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the counter at an arbitrary value (useful for wrap-around tests).
    pub fn starting_at_us(us: u64) -> Self {
        Self {
            now_us: Arc::new(AtomicU64::new(us)),
        }
    }

    /// Advance the clock by the given number of microseconds.
    pub fn advance_us(&self, us: u64) {
        // fetch_add on an atomic wraps, matching a hardware counter
        self.now_us.fetch_add(us, Ordering::SeqCst);
    }

    /// Advance the clock by the given number of milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance_us(ms.wrapping_mul(1_000));
    }

    /// Set the absolute counter value.
    pub fn set_us(&self, us: u64) {
        self.now_us.store(us, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_us(&self) -> u64 {
        self.now_us.load(Ordering::SeqCst)
    }

    fn sleep(&self, d: Duration) {
        let us = d.as_micros().min(u128::from(u64::MAX)) as u64;
        self.advance_us(us);
    }
}
