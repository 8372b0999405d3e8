//! Test and helper mocks for sonar_core.
//!
//! The recorders are cheap `Arc` handles: keep a clone in the test, move the
//! other into the engine, then inspect what the engine asked for.

use std::sync::{Arc, Mutex};

use sonar_traits::{Clock, Edge, EdgeSource, Level, ManualClock, TriggerPin};

/// One call the engine made on its edge source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeCall {
    Watch(Edge),
    Cancel,
}

/// Edge source that records calls and tracks the single active watch.
#[derive(Debug, Clone, Default)]
pub struct RecordingEdges {
    calls: Arc<Mutex<Vec<EdgeCall>>>,
    armed: Arc<Mutex<Option<Edge>>>,
}

impl RecordingEdges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edge currently being watched, if any.
    pub fn armed(&self) -> Option<Edge> {
        self.armed.lock().map(|g| *g).unwrap_or(None)
    }

    pub fn calls(&self) -> Vec<EdgeCall> {
        self.calls.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut g) = self.calls.lock() {
            g.clear();
        }
    }

    fn push(&self, call: EdgeCall, armed: Option<Edge>) {
        if let Ok(mut g) = self.calls.lock() {
            g.push(call);
        }
        if let Ok(mut a) = self.armed.lock() {
            *a = armed;
        }
    }
}

impl EdgeSource for RecordingEdges {
    fn watch(&mut self, edge: Edge) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.push(EdgeCall::Watch(edge), Some(edge));
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.push(EdgeCall::Cancel, None);
        Ok(())
    }
}

/// Trigger pin that records every level change with the manual clock's time.
#[derive(Debug, Clone)]
pub struct RecordingTrigger {
    clock: ManualClock,
    levels: Arc<Mutex<Vec<(Level, u64)>>>,
}

impl RecordingTrigger {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            levels: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// `(level, now_us)` for every `set_level` call so far.
    pub fn levels(&self) -> Vec<(Level, u64)> {
        self.levels.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut g) = self.levels.lock() {
            g.clear();
        }
    }
}

impl TriggerPin for RecordingTrigger {
    fn set_level(
        &mut self,
        level: Level,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Ok(mut g) = self.levels.lock() {
            g.push((level, self.clock.now_us()));
        }
        Ok(())
    }
}

/// A trigger pin whose line is gone; useful for error-path tests.
pub struct DeadTrigger;

impl TriggerPin for DeadTrigger {
    fn set_level(
        &mut self,
        _level: Level,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("trigger line disconnected")))
    }
}

/// Trigger pin that accepts `ok_calls` level changes, then loses its line.
#[derive(Debug)]
pub struct FlakyTrigger {
    ok_calls: usize,
}

impl FlakyTrigger {
    pub fn failing_after(ok_calls: usize) -> Self {
        Self { ok_calls }
    }
}

impl TriggerPin for FlakyTrigger {
    fn set_level(
        &mut self,
        _level: Level,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match self.ok_calls.checked_sub(1) {
            Some(left) => {
                self.ok_calls = left;
                Ok(())
            }
            None => Err(Box::new(std::io::Error::other("trigger line disconnected"))),
        }
    }
}
