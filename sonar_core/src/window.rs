//! Fixed-capacity circular window of distance samples.
//!
//! Two cursors walk the same ring:
//! - `poll_index`: the next slot a poll cycle claims (advanced by `advance_poll`).
//! - `write_index`: the next slot an echo completion fills (advanced by
//!   `record` and by `reconcile`).
//!
//! `write_index` trails or equals `poll_index`; the gap is the set of polls
//! whose echo is still in flight or was lost.

/// Contents of one window slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Slot {
    /// No echo was recorded for this poll cycle.
    #[default]
    Missed,
    /// Measured distance in millimetres (may be out of band or negative
    /// after a zero offset).
    Echo(i32),
}

impl Slot {
    #[inline]
    pub fn echo(self) -> Option<i32> {
        match self {
            Slot::Echo(mm) => Some(mm),
            Slot::Missed => None,
        }
    }

    /// Value used by the variance reader, where a missed echo counts as 0 mm.
    #[inline]
    pub fn value_or_zero(self) -> i32 {
        self.echo().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct SampleWindow {
    slots: Vec<Slot>,
    timestamps_ms: Vec<u64>,
    write_index: usize,
    poll_index: usize,
}

impl SampleWindow {
    /// Create a window of `size` missed slots. A size of zero is raised to
    /// one; the builder enforces the real bounds.
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            slots: vec![Slot::Missed; size],
            timestamps_ms: vec![0; size],
            write_index: 0,
            poll_index: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn write_index(&self) -> usize {
        self.write_index
    }

    #[inline]
    pub fn poll_index(&self) -> usize {
        self.poll_index
    }

    pub fn slot(&self, i: usize) -> Option<Slot> {
        self.slots.get(i).copied()
    }

    pub fn timestamp_ms(&self, i: usize) -> Option<u64> {
        self.timestamps_ms.get(i).copied()
    }

    /// Raw slots in array order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Number of polls claimed but not yet written (echo in flight or lost).
    pub fn pending(&self) -> usize {
        (self.poll_index + self.len() - self.write_index) % self.len()
    }

    #[inline]
    fn next(&self, i: usize) -> usize {
        (i + 1) % self.len()
    }

    /// Store a completed measurement at `write_index` and advance it.
    /// Returns the slot that was written.
    pub fn record(&mut self, slot: Slot) -> usize {
        let at = self.write_index;
        self.slots[at] = slot;
        self.write_index = self.next(at);
        at
    }

    /// Mark every slot between `write_index` and `poll_index` as missed,
    /// leaving both cursors equal. Returns how many slots were marked.
    pub fn reconcile(&mut self) -> usize {
        let mut missed = 0;
        while self.write_index != self.poll_index {
            self.slots[self.write_index] = Slot::Missed;
            self.write_index = self.next(self.write_index);
            missed += 1;
        }
        missed
    }

    /// Record the trigger time for the slot the current poll claims.
    pub fn stamp_poll(&mut self, now_ms: u64) -> usize {
        self.timestamps_ms[self.poll_index] = now_ms;
        self.poll_index
    }

    pub fn advance_poll(&mut self) {
        self.poll_index = self.next(self.poll_index);
    }

    /// Return every slot to `Missed`, zero the timestamps and rewind both cursors.
    pub fn reset(&mut self) {
        self.slots.fill(Slot::Missed);
        self.timestamps_ms.fill(0);
        self.write_index = 0;
        self.poll_index = 0;
    }

    /// Slots with their poll timestamps, oldest poll first.
    ///
    /// Starts at `poll_index` (the oldest claimed slot) and yields `len - 1`
    /// entries, leaving out the most recent poll whose echo may still be in
    /// flight.
    pub fn poll_order(&self) -> impl Iterator<Item = (Slot, u64)> + '_ {
        let len = self.len();
        (0..len.saturating_sub(1)).map(move |i| {
            let at = (self.poll_index + i) % len;
            (self.slots[at], self.timestamps_ms[at])
        })
    }
}
