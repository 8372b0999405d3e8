//! Thread-safe handle around a `SonarEngine`.
//!
//! Backends deliver edges from their own callback threads. Both the poll path
//! and the edge handlers go through the same mutex, so a poll-time
//! reconciliation can never interleave with a handler updating
//! `(pulse_start, write_index)`.
//!
//! The sink reads its own copy of the engine clock before taking the lock, so
//! an edge that arrives while `poll()` or `report()` holds the mutex keeps the
//! time it actually happened rather than the time the lock was released.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use sonar_traits::{Clock, Edge, EdgeSink, EdgeSource, TriggerPin};

use crate::engine::SonarEngine;
use crate::error::{Result, SonarError};
use crate::reading::Report;

pub struct SharedSonar<E: EdgeSource, T: TriggerPin, C: Clock> {
    inner: Arc<Mutex<SonarEngine<E, T, C>>>,
}

impl<E: EdgeSource, T: TriggerPin, C: Clock> Clone for SharedSonar<E, T, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: EdgeSource, T: TriggerPin, C: Clock> SharedSonar<E, T, C> {
    pub fn new(engine: SonarEngine<E, T, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Lock the engine for direct access.
    pub fn lock(&self) -> Result<MutexGuard<'_, SonarEngine<E, T, C>>> {
        self.inner
            .lock()
            .map_err(|_| SonarError::State("sonar engine lock poisoned".into()).into())
    }

    pub fn poll(&self) -> Result<()> {
        self.lock()?.poll()
    }

    pub fn report(&self) -> Result<Report> {
        Ok(self.lock()?.report())
    }
}

impl<E, T, C> SharedSonar<E, T, C>
where
    E: EdgeSource + Send + 'static,
    T: TriggerPin + Send + 'static,
    C: Clock + Clone + Send + Sync + 'static,
{
    /// Edge sink for a backend's callback thread.
    ///
    /// The sink holds a weak reference: once every `SharedSonar` handle is
    /// dropped, late edges are discarded.
    pub fn sink(&self) -> Result<Arc<dyn EdgeSink>> {
        let clock = self.lock()?.clock().clone();
        Ok(Arc::new(EngineSink {
            engine: Arc::downgrade(&self.inner),
            clock,
        }))
    }
}

struct EngineSink<E: EdgeSource, T: TriggerPin, C: Clock> {
    engine: Weak<Mutex<SonarEngine<E, T, C>>>,
    clock: C,
}

impl<E, T, C> EdgeSink for EngineSink<E, T, C>
where
    E: EdgeSource + Send,
    T: TriggerPin + Send,
    C: Clock + Send + Sync,
{
    fn notify(&self, edge: Edge) {
        let at_us = self.clock.now_us();
        let Some(engine) = self.engine.upgrade() else {
            tracing::trace!(?edge, "edge after engine drop");
            return;
        };
        let Ok(mut guard) = engine.lock() else {
            tracing::warn!(?edge, "edge dropped: engine lock poisoned");
            return;
        };
        if let Err(e) = guard.on_edge_at(edge, at_us) {
            tracing::warn!(error = %e, ?edge, "edge handler failed");
        }
    }
}
