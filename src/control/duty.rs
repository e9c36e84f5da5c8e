//! Filtered value → PWM command.
//!
//! `duty = floor(period · value / max_raw)`, computed in integer ticks of
//! the embassy time base.  Values above `max_raw` saturate at the full
//! period.

use embassy_time::Duration;

use super::FilteredValue;

/// One actuation command: `duty` high-time within every `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub period: Duration,
    pub duty: Duration,
}

impl Command {
    pub const fn off(period: Duration) -> Self {
        Self {
            period,
            duty: Duration::from_ticks(0),
        }
    }

    /// Linear scaling of `value` over `0..=max_raw`.
    pub fn from_value(value: FilteredValue, max_raw: u16, period: Duration) -> Self {
        let duty = if max_raw == 0 {
            period.as_ticks()
        } else {
            let value = u64::from(value.min(max_raw));
            // u16 × u64 tick count: widen to u128 so long periods cannot overflow.
            (u128::from(period.as_ticks()) * u128::from(value) / u128::from(max_raw)) as u64
        };
        Self {
            period,
            duty: Duration::from_ticks(duty),
        }
    }

    /// Fixed percentage of the period, used by the manual override.
    pub fn from_percent(percent: u8, period: Duration) -> Self {
        let percent = u64::from(percent.min(100));
        Self {
            period,
            duty: Duration::from_ticks(period.as_ticks() * percent / 100),
        }
    }
}
