//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured pipeline events to the
//! `log` facade.  Per-sample events go out at `debug`, commands at `info`,
//! degradations at `warn`/`error`.

use log::{debug, error, info, warn};

use crate::app::events::{PipelineEvent, SampleRejection};
use crate::app::ports::EventSink;

/// Adapter that logs every [`PipelineEvent`] to the console.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::SamplePublished(raw) => {
                debug!("SAMPLE | raw={}", raw);
            }
            PipelineEvent::SampleRejected(SampleRejection::ReadFailed(e)) => {
                warn!("SAMPLE | skipped: {}", e);
            }
            PipelineEvent::SampleRejected(SampleRejection::OutOfRange(raw)) => {
                warn!("SAMPLE | skipped: raw={} out of range", raw);
            }
            PipelineEvent::DeadlineOverrun { lateness } => {
                warn!("SAMPLE | overrun by {}us", lateness.as_micros());
            }
            PipelineEvent::Filtered { sample, avg1, avg2 } => {
                debug!("FILTER | in={} avg1={} avg2={}", sample, avg1, avg2);
            }
            PipelineEvent::CommandIssued {
                value,
                duty,
                period,
                overridden,
            } => {
                info!(
                    "ACT    | value={} duty={}us/{}us{}",
                    value,
                    duty.as_micros(),
                    period.as_micros(),
                    if *overridden { " [manual]" } else { "" }
                );
            }
            PipelineEvent::ActuationFailed { error: e, consecutive } => {
                warn!("ACT    | command failed: {} (x{})", e, consecutive);
            }
            PipelineEvent::ActuatorHalted(e) => {
                error!("ACT    | halted after {}; output no longer updated", e);
            }
            PipelineEvent::Stopped(stage) => {
                info!("STOP   | {}", stage.name());
            }
        }
    }
}
