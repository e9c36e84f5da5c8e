//! Simulated ADC channel for host runs and tests.
//!
//! The reading and a count of forced failures live in atomics shared with
//! a [`SimAdcHandle`], so a driver thread (or a test) can steer the
//! sampler without touching it.  Values above full scale are passed
//! through untouched; range checking is the sampler's job.

use core::sync::atomic::{AtomicU16, AtomicU32, Ordering};
use std::sync::Arc;

use crate::app::ports::SensorPort;
use crate::error::SensorError;

#[derive(Debug, Default)]
struct Shared {
    raw: AtomicU16,
    fail_reads: AtomicU32,
}

/// Sensor side: owned by the sampler.
#[derive(Debug)]
pub struct SimAdc {
    shared: Arc<Shared>,
}

/// Injection side: cloneable, `Send + Sync`.
#[derive(Debug, Clone)]
pub struct SimAdcHandle {
    shared: Arc<Shared>,
}

impl SimAdc {
    pub fn new(initial: u16) -> (Self, SimAdcHandle) {
        let shared = Arc::new(Shared {
            raw: AtomicU16::new(initial),
            fail_reads: AtomicU32::new(0),
        });
        (
            Self {
                shared: Arc::clone(&shared),
            },
            SimAdcHandle { shared },
        )
    }
}

impl SimAdcHandle {
    /// Value returned by subsequent reads.
    pub fn set(&self, raw: u16) {
        self.shared.raw.store(raw, Ordering::Relaxed);
    }

    /// Make the next `count` reads fail with [`SensorError::AdcReadFailed`].
    pub fn fail_next(&self, count: u32) {
        self.shared.fail_reads.store(count, Ordering::Relaxed);
    }
}

impl SensorPort for SimAdc {
    fn read(&mut self) -> Result<u16, SensorError> {
        let forced = self
            .shared
            .fail_reads
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok();
        if forced {
            return Err(SensorError::AdcReadFailed);
        }
        Ok(self.shared.raw.load(Ordering::Relaxed))
    }
}
