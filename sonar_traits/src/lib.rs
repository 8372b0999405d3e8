pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Transition direction on the echo line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Rising,
    Falling,
}

/// Logic level of a digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Edge {
    /// The edge that produces the given level once it has been observed.
    pub fn into_level(self) -> Level {
        match self {
            Edge::Rising => Level::High,
            Edge::Falling => Level::Low,
        }
    }
}

impl From<Level> for Edge {
    fn from(level: Level) -> Self {
        match level {
            Level::High => Edge::Rising,
            Level::Low => Edge::Falling,
        }
    }
}

/// Edge notification capability for the echo pin.
///
/// At most one watch is active at a time: `watch` replaces any previous one,
/// `cancel` leaves the line unwatched. Notifications themselves are delivered
/// to an [`EdgeSink`] that the backend was wired to.
pub trait EdgeSource {
    fn watch(&mut self, edge: Edge) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn cancel(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Receiver of edge notifications, callable from interrupt/callback context.
pub trait EdgeSink: Send + Sync {
    fn notify(&self, edge: Edge);
}

/// Output line that drives the sensor's trigger input.
pub trait TriggerPin {
    fn set_level(&mut self, level: Level)
    -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: EdgeSource + ?Sized> EdgeSource for Box<T> {
    fn watch(&mut self, edge: Edge) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).watch(edge)
    }
    fn cancel(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).cancel()
    }
}

impl<T: TriggerPin + ?Sized> TriggerPin for Box<T> {
    fn set_level(
        &mut self,
        level: Level,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_level(level)
    }
}
