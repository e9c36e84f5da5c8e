//! Runtime diagnostics for the pipeline.
//!
//! [`PipelineStats`] is a block of relaxed atomic counters shared by all
//! three stage tasks.  Stages never touch it directly: each task's event
//! sink is wrapped in a [`StatsSink`], which counts every
//! [`PipelineEvent`] before forwarding it.  [`PipelineStats::snapshot`]
//! produces a serialisable copy for the operator log or a host dump.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::app::events::{PipelineEvent, SampleRejection};
use crate::app::ports::EventSink;

#[derive(Debug, Default)]
pub struct PipelineStats {
    samples_published: AtomicU32,
    read_failures: AtomicU32,
    out_of_range: AtomicU32,
    overruns: AtomicU32,
    worst_lateness_us: AtomicU64,
    filter_runs: AtomicU32,
    commands_issued: AtomicU32,
    overridden_commands: AtomicU32,
    actuation_failures: AtomicU32,
    actuator_halted: AtomicBool,
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub samples_published: u32,
    pub read_failures: u32,
    pub out_of_range: u32,
    pub overruns: u32,
    pub worst_lateness_us: u64,
    pub filter_runs: u32,
    pub commands_issued: u32,
    pub overridden_commands: u32,
    pub actuation_failures: u32,
    pub actuator_halted: bool,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the counters for one event.
    pub fn record(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::SamplePublished(_) => bump(&self.samples_published),
            PipelineEvent::SampleRejected(SampleRejection::ReadFailed(_)) => {
                bump(&self.read_failures);
            }
            PipelineEvent::SampleRejected(SampleRejection::OutOfRange(_)) => {
                bump(&self.out_of_range);
            }
            PipelineEvent::DeadlineOverrun { lateness } => {
                bump(&self.overruns);
                self.worst_lateness_us
                    .fetch_max(lateness.as_micros(), Ordering::Relaxed);
            }
            PipelineEvent::Filtered { .. } => bump(&self.filter_runs),
            PipelineEvent::CommandIssued { overridden, .. } => {
                bump(&self.commands_issued);
                if *overridden {
                    bump(&self.overridden_commands);
                }
            }
            PipelineEvent::ActuationFailed { .. } => bump(&self.actuation_failures),
            PipelineEvent::ActuatorHalted(_) => {
                self.actuator_halted.store(true, Ordering::Relaxed);
            }
            PipelineEvent::Stopped(_) => {}
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            samples_published: self.samples_published.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            out_of_range: self.out_of_range.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
            worst_lateness_us: self.worst_lateness_us.load(Ordering::Relaxed),
            filter_runs: self.filter_runs.load(Ordering::Relaxed),
            commands_issued: self.commands_issued.load(Ordering::Relaxed),
            overridden_commands: self.overridden_commands.load(Ordering::Relaxed),
            actuation_failures: self.actuation_failures.load(Ordering::Relaxed),
            actuator_halted: self.actuator_halted.load(Ordering::Relaxed),
        }
    }
}

fn bump(counter: &AtomicU32) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Event sink decorator that counts events into shared [`PipelineStats`].
pub struct StatsSink<S> {
    stats: Arc<PipelineStats>,
    inner: S,
}

impl<S: EventSink> StatsSink<S> {
    pub fn new(stats: Arc<PipelineStats>, inner: S) -> Self {
        Self { stats, inner }
    }
}

impl<S: EventSink> EventSink for StatsSink<S> {
    fn emit(&mut self, event: &PipelineEvent) {
        self.stats.record(event);
        self.inner.emit(event);
    }
}
