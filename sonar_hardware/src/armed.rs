use std::sync::atomic::{AtomicU8, Ordering};

use sonar_traits::Edge;

const NONE: u8 = 0;
const RISING: u8 = 1;
const FALLING: u8 = 2;

#[inline]
fn encode(edge: Edge) -> u8 {
    match edge {
        Edge::Rising => RISING,
        Edge::Falling => FALLING,
    }
}

/// The single edge a backend is currently allowed to report.
///
/// Watch and cancel only store into this cell; the interrupt side consumes it
/// with [`ArmedEdge::fire`]. Neither side ever blocks, so a watch issued from
/// inside an edge notification cannot deadlock against the listener.
#[derive(Debug, Default)]
pub struct ArmedEdge(AtomicU8);

impl ArmedEdge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&self, edge: Edge) {
        self.0.store(encode(edge), Ordering::Release);
    }

    pub fn disarm(&self) {
        self.0.store(NONE, Ordering::Release);
    }

    pub fn current(&self) -> Option<Edge> {
        match self.0.load(Ordering::Acquire) {
            RISING => Some(Edge::Rising),
            FALLING => Some(Edge::Falling),
            _ => None,
        }
    }

    /// Consume the watch if it is for `edge`. Returns whether the edge
    /// should be delivered; at most one caller wins per arm.
    pub fn fire(&self, edge: Edge) -> bool {
        self.0
            .compare_exchange(encode(edge), NONE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
