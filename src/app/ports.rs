//! Port traits: the boundary between the pipeline stages and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Stage task (domain)
//! ```
//!
//! Driven adapters (ADC, PWM, clock, event sinks) implement these traits.
//! The stages in [`crate::pipeline`] consume them via generics, so the
//! pipeline never touches hardware directly.
//!
//! All port calls are synchronous.  Sensor reads are assumed to complete
//! well within one sampler period.

use embassy_time::{Duration, Instant};

use crate::error::{ActuatorError, SensorError};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the sampler calls this once per period.
pub trait SensorPort {
    /// Acquire one raw conversion.  Range validation is the sampler's job;
    /// implementations return whatever the converter produced.
    fn read(&mut self) -> Result<u16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the actuator stage calls this with every new command.
pub trait ActuatorPort {
    /// Drive the output with `duty` high-time out of every `period`.
    fn set_command(&mut self, period: Duration, duty: Duration) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port (monotonic time + blocking sleep)
// ───────────────────────────────────────────────────────────────

pub trait ClockPort {
    /// Monotonic now.
    fn now(&self) -> Instant;

    /// Block the calling task until `deadline`.  Returns immediately when
    /// the deadline is already in the past.
    fn sleep_until(&mut self, deadline: Instant);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / diagnostics)
// ───────────────────────────────────────────────────────────────

/// The stages emit structured [`PipelineEvent`](super::events::PipelineEvent)s
/// through this port.  Adapters decide where they go (serial log, counters,
/// test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::PipelineEvent);
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: &super::events::PipelineEvent) {
        (**self).emit(event);
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &super::events::PipelineEvent) {}
}
