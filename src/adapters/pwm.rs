//! PWM actuator adapter.
//!
//! Bridges [`ActuatorPort`] onto any `embedded-hal` 1.0
//! [`SetDutyCycle`] channel.  The channel's period is fixed when the
//! peripheral is configured; the adapter is built with that period and
//! rejects commands for any other.  Duty is mapped onto
//! `0..=max_duty_cycle()` with truncation.

use core::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use embassy_time::Duration;
use embedded_hal::pwm::{Error as _, ErrorKind, ErrorType, SetDutyCycle};
use log::{debug, warn};

use crate::app::ports::ActuatorPort;
use crate::error::ActuatorError;

pub struct PwmActuator<P> {
    pwm: P,
    period: Duration,
}

impl<P: SetDutyCycle> PwmActuator<P> {
    /// `period` must match the period the channel was configured with.
    pub fn new(pwm: P, period: Duration) -> Self {
        Self { pwm, period }
    }

    /// Channel level for `duty` out of the configured period.
    pub fn level_for(&self, duty: Duration) -> u16 {
        let period = self.period.as_ticks();
        if period == 0 {
            return 0;
        }
        let duty = duty.as_ticks().min(period);
        (u64::from(self.pwm.max_duty_cycle()) * duty / period) as u16
    }
}

impl<P: SetDutyCycle> ActuatorPort for PwmActuator<P> {
    fn set_command(&mut self, period: Duration, duty: Duration) -> Result<(), ActuatorError> {
        if period != self.period || period.as_ticks() == 0 {
            warn!(
                "pwm: command period {}us does not match channel period {}us",
                period.as_micros(),
                self.period.as_micros()
            );
            return Err(ActuatorError::InvalidPeriod);
        }
        let level = self.level_for(duty);
        debug!("pwm: level {}/{}", level, self.pwm.max_duty_cycle());
        self.pwm.set_duty_cycle(level).map_err(|e| {
            warn!("pwm: set_duty_cycle failed: {:?}", e.kind());
            ActuatorError::PwmWriteFailed
        })
    }
}

// ── Simulated channel ─────────────────────────────────────────

/// In-memory PWM channel for host runs.  The current level is shared
/// through an atomic so the host binary can report it.
#[derive(Debug, Clone)]
pub struct SimPwm {
    max: u16,
    level: Arc<AtomicU16>,
}

impl SimPwm {
    pub fn new(max: u16) -> Self {
        Self {
            max,
            level: Arc::new(AtomicU16::new(0)),
        }
    }

    pub fn level(&self) -> u16 {
        self.level.load(Ordering::Relaxed)
    }
}

impl ErrorType for SimPwm {
    type Error = ErrorKind;
}

impl SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        self.max
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        if duty > self.max {
            return Err(ErrorKind::Other);
        }
        self.level.store(duty, Ordering::Relaxed);
        Ok(())
    }
}
