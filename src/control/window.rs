//! Ring buffer of the last `N` raw samples.
//!
//! Starts all-zero.  Each push overwrites the oldest slot and moves the
//! head there, so insertion is O(1) and the newest sample is always at
//! `ring[head]`.  Iteration walks backwards from the head, yielding
//! samples newest-first.

use super::RawSample;

/// Number of samples the filter averages over.
pub const WINDOW_LEN: usize = 10;

#[derive(Debug, Clone)]
pub struct SampleWindow<const N: usize = WINDOW_LEN> {
    ring: [RawSample; N],
    /// Index of the newest sample.
    head: usize,
}

impl<const N: usize> Default for SampleWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SampleWindow<N> {
    pub const fn new() -> Self {
        assert!(N > 0, "window capacity must be non-zero");
        Self {
            ring: [0; N],
            head: N - 1,
        }
    }

    /// Insert `sample` as the newest entry, discarding the oldest.
    pub fn push(&mut self, sample: RawSample) {
        self.head = (self.head + 1) % N;
        self.ring[self.head] = sample;
    }

    pub fn newest(&self) -> RawSample {
        self.ring[self.head]
    }

    /// The sample that the next push will discard.
    pub fn oldest(&self) -> RawSample {
        self.ring[(self.head + 1) % N]
    }

    /// Samples newest-first.
    pub fn iter(&self) -> impl Iterator<Item = RawSample> + '_ {
        (0..N).map(move |age| self.ring[(self.head + N - age) % N])
    }

    /// Copy of the window in recency order (index 0 = newest).
    pub fn recent(&self) -> heapless::Vec<RawSample, N> {
        self.iter().collect()
    }

    /// Slot contents in storage order.  Averaging is order-independent, so
    /// the filter reads this directly.
    pub fn as_slice(&self) -> &[RawSample] {
        &self.ring
    }
}
