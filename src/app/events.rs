//! Outbound pipeline events.
//!
//! The stage tasks emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them: log to serial, count them, record them in
//! a test.

use embassy_time::Duration;

use crate::error::{ActuatorError, SensorError};

/// Identifies one of the three pipeline tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Sampler,
    Filter,
    Actuator,
}

impl Stage {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sampler => "sampler",
            Self::Filter => "filter",
            Self::Actuator => "actuator",
        }
    }
}

/// Why a sampler cycle published nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRejection {
    /// The sensing capability returned an error.
    ReadFailed(SensorError),
    /// The reading exceeded the converter's full scale.
    OutOfRange(u16),
}

/// Structured events emitted by the pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    /// A valid raw sample was published to the filter.
    SamplePublished(u16),

    /// A sampler cycle skipped its publish.
    SampleRejected(SampleRejection),

    /// The sampler finished a cycle after its release instant.
    DeadlineOverrun { lateness: Duration },

    /// The filter consumed a sample and published a trimmed mean.
    Filtered { sample: u16, avg1: u16, avg2: u16 },

    /// A duty command reached the actuation capability.
    CommandIssued {
        value: u16,
        duty: Duration,
        period: Duration,
        overridden: bool,
    },

    /// The actuation capability rejected a command.
    ActuationFailed {
        error: ActuatorError,
        consecutive: u8,
    },

    /// The actuator exhausted its failure budget and stopped for good.
    ActuatorHalted(ActuatorError),

    /// A stage left its loop through the shutdown transition.
    Stopped(Stage),
}
