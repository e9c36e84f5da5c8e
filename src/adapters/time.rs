//! Host clock adapter.
//!
//! `now()` comes from the embassy-time driver (the `std` driver on the
//! host, a hardware timer on target), so instants share one time base with
//! the rest of the crate.  `sleep_until()` parks the calling thread for
//! the remaining time.

use embassy_time::Instant;

use crate::app::ports::ClockPort;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep_until(&mut self, deadline: Instant) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.as_ticks() > 0 {
            std::thread::sleep(std::time::Duration::from_micros(remaining.as_micros()));
        }
    }
}
