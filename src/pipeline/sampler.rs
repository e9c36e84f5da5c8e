//! Sampler stage.  Periodic leaf task.
//!
//! ```text
//!  COMPUTE_NEXT_DEADLINE ─▶ SAMPLE ─▶ VALIDATE ─▶ PUBLISH ─▶ SLEEP_UNTIL_DEADLINE ─┐
//!          ▲                                                                         │
//!          └─────────────────────────────────────────────────────────────────────────┘
//!          │ shutdown requested
//!          ▼
//!      close(M1)
//! ```
//!
//! The first release instant is `start + P`.  After each cycle the next
//! instant is the previous one plus exactly one period, whether or not the
//! cycle overran.  The sampler never waits on the filter.

use std::sync::Arc;

use embassy_time::{Duration, Instant};
use log::{debug, info, warn};

use crate::app::events::{PipelineEvent, SampleRejection, Stage};
use crate::app::ports::{ClockPort, EventSink, SensorPort};
use crate::control::RawSample;
use crate::error::SensorError;
use crate::mailbox::Mailbox;

use super::{Cycle, Shutdown, StageExit};

pub struct Sampler<S, C> {
    sensor: S,
    clock: C,
    output: Arc<Mailbox<RawSample>>,
    period: Duration,
    max_raw: u16,
    shutdown: Shutdown,
    /// Release instant of the cycle in progress; `None` before the first.
    next_release: Option<Instant>,
}

impl<S: SensorPort, C: ClockPort> Sampler<S, C> {
    pub fn new(
        sensor: S,
        clock: C,
        output: Arc<Mailbox<RawSample>>,
        period: Duration,
        max_raw: u16,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            sensor,
            clock,
            output,
            period,
            max_raw,
            shutdown,
            next_release: None,
        }
    }

    /// The release instant the current (or next) cycle sleeps until.
    pub fn next_release(&self) -> Option<Instant> {
        self.next_release
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Read and range-check one sample.
    pub fn acquire(&mut self) -> Result<RawSample, SampleRejection> {
        let raw = self.sensor.read().map_err(SampleRejection::ReadFailed)?;
        if raw > self.max_raw {
            return Err(SampleRejection::OutOfRange(raw));
        }
        Ok(raw)
    }

    /// Run one full cycle.  Returns [`Cycle::Exit`] only on shutdown.
    pub fn run_cycle(&mut self, sink: &mut impl EventSink) -> Cycle {
        if self.shutdown.is_requested() {
            return Cycle::Exit(StageExit::Shutdown);
        }

        let release = match self.next_release {
            Some(release) => release,
            None => {
                let release = self.clock.now() + self.period;
                self.next_release = Some(release);
                release
            }
        };

        match self.acquire() {
            Ok(sample) => {
                // Write-then-signal happens inside publish().
                self.output.publish(sample);
                debug!("sampler: published {}", sample);
                sink.emit(&PipelineEvent::SamplePublished(sample));
            }
            Err(rejection) => {
                match rejection {
                    SampleRejection::ReadFailed(e) => warn!("sampler: read failed: {}", e),
                    SampleRejection::OutOfRange(raw) => warn!(
                        "sampler: {} {} > {}",
                        SensorError::OutOfRange,
                        raw,
                        self.max_raw
                    ),
                }
                sink.emit(&PipelineEvent::SampleRejected(rejection));
            }
        }

        let finished = self.clock.now();
        if finished < release {
            self.clock.sleep_until(release);
        } else {
            let lateness = finished.saturating_duration_since(release);
            warn!("sampler: overran release by {} us", lateness.as_micros());
            sink.emit(&PipelineEvent::DeadlineOverrun { lateness });
        }
        self.next_release = Some(release + self.period);

        Cycle::Continue
    }

    /// Task body: cycle until shutdown, then close the output mailbox so
    /// the filter can follow.
    pub fn run(mut self, mut sink: impl EventSink) -> StageExit {
        info!("sampler: started (period {} ms)", self.period.as_millis());
        let exit = loop {
            if let Cycle::Exit(exit) = self.run_cycle(&mut sink) {
                break exit;
            }
        };
        self.output.close();
        sink.emit(&PipelineEvent::Stopped(Stage::Sampler));
        info!("sampler: stopped");
        exit
    }
}
