//! Actuator stage, released by the filter.
//!
//! Scales each filtered value into a duty command and hands it to the
//! [`ActuatorPort`].  A manual override, when engaged, replaces the scaled
//! value with a fixed percentage.
//!
//! Failure handling: every rejected command is logged and counted.  Once
//! `failure_budget` consecutive commands fail the task halts for good; the
//! sampler and filter keep running.  A budget of one halts on the first
//! failure.

use std::sync::Arc;

use embassy_time::Duration;
use log::{debug, error, info, warn};

use crate::app::events::{PipelineEvent, Stage};
use crate::app::ports::{ActuatorPort, EventSink};
use crate::control::FilteredValue;
use crate::control::duty::Command;
use crate::error::ActuatorError;
use crate::mailbox::Mailbox;
use crate::manual::ManualOverride;

use super::{Cycle, StageExit};

/// What happened to one command that did not halt the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The capability accepted the command.
    Issued(Command),
    /// The capability rejected the command, still within the failure budget.
    /// The output keeps the last accepted command.
    Rejected {
        error: ActuatorError,
        consecutive: u8,
    },
}

pub struct Actuator<A> {
    actuator: A,
    input: Arc<Mailbox<FilteredValue>>,
    manual: Arc<ManualOverride>,
    period: Duration,
    max_raw: u16,
    failure_budget: u8,
    consecutive_failures: u8,
}

impl<A: ActuatorPort> Actuator<A> {
    pub fn new(
        actuator: A,
        input: Arc<Mailbox<FilteredValue>>,
        manual: Arc<ManualOverride>,
        period: Duration,
        max_raw: u16,
        failure_budget: u8,
    ) -> Self {
        Self {
            actuator,
            input,
            manual,
            period,
            max_raw,
            failure_budget: failure_budget.max(1),
            consecutive_failures: 0,
        }
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Command for `value` under the current override setting.
    /// The flag is `true` when the override supplied the duty.
    pub fn command_for(&self, value: FilteredValue) -> (Command, bool) {
        match self.manual.level().percent() {
            Some(percent) => (Command::from_percent(percent, self.period), true),
            None => (Command::from_value(value, self.max_raw, self.period), false),
        }
    }

    /// Compute and issue the command for `value`.
    ///
    /// A rejection inside the failure budget is reported as
    /// [`Applied::Rejected`]; `Err` carries the exit code once the budget
    /// is spent.
    pub fn apply(
        &mut self,
        value: FilteredValue,
        sink: &mut impl EventSink,
    ) -> Result<Applied, StageExit> {
        let (command, overridden) = self.command_for(value);
        match self.actuator.set_command(command.period, command.duty) {
            Ok(()) => {
                self.consecutive_failures = 0;
                debug!(
                    "actuator: value={} duty={}us/{}us{}",
                    value,
                    command.duty.as_micros(),
                    command.period.as_micros(),
                    if overridden { " (manual)" } else { "" }
                );
                sink.emit(&PipelineEvent::CommandIssued {
                    value,
                    duty: command.duty,
                    period: command.period,
                    overridden,
                });
                Ok(Applied::Issued(command))
            }
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                sink.emit(&PipelineEvent::ActuationFailed {
                    error: e,
                    consecutive: self.consecutive_failures,
                });
                if self.consecutive_failures >= self.failure_budget {
                    error!(
                        "actuator: {} ({} consecutive), halting with output at last good command",
                        e, self.consecutive_failures
                    );
                    sink.emit(&PipelineEvent::ActuatorHalted(e));
                    Err(StageExit::Halted(e))
                } else {
                    warn!(
                        "actuator: {} ({}/{} consecutive)",
                        e, self.consecutive_failures, self.failure_budget
                    );
                    Ok(Applied::Rejected {
                        error: e,
                        consecutive: self.consecutive_failures,
                    })
                }
            }
        }
    }

    pub fn run_cycle(&mut self, sink: &mut impl EventSink) -> Cycle {
        let Ok(value) = self.input.consume_blocking() else {
            return Cycle::Exit(StageExit::Shutdown);
        };
        match self.apply(value, sink) {
            Ok(_) => Cycle::Continue,
            Err(exit) => Cycle::Exit(exit),
        }
    }

    pub fn run(mut self, mut sink: impl EventSink) -> StageExit {
        info!(
            "actuator: started (period {} us, full scale {})",
            self.period.as_micros(),
            self.max_raw
        );
        let exit = loop {
            if let Cycle::Exit(exit) = self.run_cycle(&mut sink) {
                break exit;
            }
        };
        if exit == StageExit::Shutdown {
            sink.emit(&PipelineEvent::Stopped(Stage::Actuator));
            info!("actuator: stopped");
        }
        exit
    }
}
