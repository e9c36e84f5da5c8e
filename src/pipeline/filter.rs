//! Filter stage, released by the sampler.
//!
//! Each release pushes the new sample into the [`SampleWindow`], runs the
//! two-pass trimmed mean over the whole window and publishes `avg2`.
//! Samples published while the filter was preempted are lost; only the
//! latest one is seen.

use std::sync::Arc;

use log::{debug, info};

use crate::app::events::{PipelineEvent, Stage};
use crate::app::ports::EventSink;
use crate::control::trimmed_mean::{TrimmedMean, two_pass_trimmed_mean};
use crate::control::window::SampleWindow;
use crate::control::{FilteredValue, RawSample};
use crate::mailbox::Mailbox;

use super::{Cycle, StageExit};

pub struct Filter {
    input: Arc<Mailbox<RawSample>>,
    output: Arc<Mailbox<FilteredValue>>,
    window: SampleWindow,
    last: TrimmedMean,
}

impl Filter {
    pub fn new(input: Arc<Mailbox<RawSample>>, output: Arc<Mailbox<FilteredValue>>) -> Self {
        Self {
            input,
            output,
            window: SampleWindow::new(),
            last: TrimmedMean::default(),
        }
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    /// Result of the most recent run; all-zero before the first.
    pub fn last(&self) -> TrimmedMean {
        self.last
    }

    /// Insert `sample`, recompute and publish.  Returns the full result.
    pub fn process(&mut self, sample: RawSample) -> TrimmedMean {
        self.window.push(sample);
        let result = two_pass_trimmed_mean(self.window.as_slice());
        self.output.publish(result.avg2);
        self.last = result;
        result
    }

    /// Wait for a release and process the sample.  Exits once the input
    /// mailbox is closed and drained.
    pub fn run_cycle(&mut self, sink: &mut impl EventSink) -> Cycle {
        let Ok(sample) = self.input.consume_blocking() else {
            return Cycle::Exit(StageExit::Shutdown);
        };
        let result = self.process(sample);
        debug!(
            "filter: sample={} avg1={} ({} nonzero) avg2={} ({} kept)",
            sample, result.avg1, result.nonzero, result.avg2, result.kept
        );
        sink.emit(&PipelineEvent::Filtered {
            sample,
            avg1: result.avg1,
            avg2: result.avg2,
        });
        Cycle::Continue
    }

    pub fn run(mut self, mut sink: impl EventSink) -> StageExit {
        info!("filter: started");
        let exit = loop {
            if let Cycle::Exit(exit) = self.run_cycle(&mut sink) {
                break exit;
            }
        };
        self.output.close();
        sink.emit(&PipelineEvent::Stopped(Stage::Filter));
        info!("filter: stopped");
        exit
    }
}
