//! Unified error types for the sense-filter-actuate pipeline.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! task runners' error handling uniform. All variants are `Copy` so they
//! can be carried through events and stage exit codes without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the pipeline funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The actuator stage halted after the actuation capability kept
    /// rejecting commands.
    Actuator(ActuatorError),
    /// Configuration is invalid.
    Config(ConfigError),
    /// A stage task could not be spawned. Carries the task name.
    Spawn(&'static str),
    /// A stage task panicked instead of returning. Carries the task name.
    TaskPanicked(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Spawn(name) => write!(f, "failed to spawn task '{name}'"),
            Self::TaskPanicked(name) => write!(f, "task '{name}' panicked"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC conversion returned an error or timed out.
    AdcReadFailed,
    /// Reading is above the converter's full-scale value.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
    /// The requested period cannot be represented by the PWM peripheral.
    InvalidPeriod,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::InvalidPeriod => write!(f, "invalid PWM period"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// A config field failed range validation.
/// The `&'static str` describes which field and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
