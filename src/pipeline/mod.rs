//! The three-stage sense, filter, actuate pipeline.
//!
//! ```text
//!  ┌──────────┐  M1 (raw)   ┌──────────┐  M2 (filtered)  ┌──────────┐
//!  │ Sampler  │────────────▶│  Filter  │────────────────▶│ Actuator │──▶ ActuatorPort
//!  │ periodic │  publish +  │ reactive │   publish +     │ reactive │
//!  └──────────┘  release    └──────────┘   release       └──────────┘
//!       ▲
//!  SensorPort · ClockPort
//! ```
//!
//! [`Pipeline`] owns the two mailboxes, the shutdown token, the manual
//! override and the shared counters.  Stages can be built individually and
//! driven one cycle at a time ([`Pipeline::sampler`], [`Pipeline::filter`],
//! [`Pipeline::actuator`]), or spawned together on their own threads with
//! [`Pipeline::spawn`].
//!
//! Shutdown propagates downstream: the sampler notices the token at the
//! start of its next cycle and closes `M1`; the filter drains `M1`, closes
//! `M2` and exits; the actuator drains `M2` and exits.

pub mod actuator;
pub mod filter;
pub mod sampler;

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use log::{info, warn};

use crate::app::events::Stage;
use crate::app::ports::{ActuatorPort, ClockPort, EventSink, SensorPort};
use crate::config::PipelineConfig;
use crate::control::{FilteredValue, RawSample};
use crate::diagnostics::{PipelineStats, StatsSink};
use crate::error::{ActuatorError, Error, Result};
use crate::mailbox::Mailbox;
use crate::manual::ManualOverride;
use crate::task::spawn_task;

pub use actuator::{Actuator, Applied};
pub use filter::Filter;
pub use sampler::Sampler;

/// How a stage task left its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageExit {
    /// Shutdown transition (token or closed input mailbox).
    Shutdown,
    /// The actuator exhausted its failure budget.
    Halted(ActuatorError),
}

impl StageExit {
    pub fn halt_error(self) -> Option<ActuatorError> {
        match self {
            Self::Halted(e) => Some(e),
            Self::Shutdown => None,
        }
    }
}

/// Outcome of a single stage cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    Continue,
    Exit(StageExit),
}

/// Cooperative stop request shared by every task.
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Shared wiring for one pipeline instance.
pub struct Pipeline {
    config: PipelineConfig,
    samples: Arc<Mailbox<RawSample>>,
    filtered: Arc<Mailbox<FilteredValue>>,
    shutdown: Shutdown,
    manual: Arc<ManualOverride>,
    stats: Arc<PipelineStats>,
}

impl Pipeline {
    /// Validate `config` and create empty mailboxes (both start at 0).
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            samples: Arc::new(Mailbox::new(0)),
            filtered: Arc::new(Mailbox::new(0)),
            shutdown: Shutdown::new(),
            manual: Arc::new(ManualOverride::new()),
            stats: Arc::new(PipelineStats::new()),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// `M1`: sampler → filter.
    pub fn samples(&self) -> &Arc<Mailbox<RawSample>> {
        &self.samples
    }

    /// `M2`: filter → actuator.
    pub fn filtered(&self) -> &Arc<Mailbox<FilteredValue>> {
        &self.filtered
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    pub fn manual_override(&self) -> &Arc<ManualOverride> {
        &self.manual
    }

    pub fn stats(&self) -> &Arc<PipelineStats> {
        &self.stats
    }

    pub fn sampler<S: SensorPort, C: ClockPort>(&self, sensor: S, clock: C) -> Sampler<S, C> {
        Sampler::new(
            sensor,
            clock,
            Arc::clone(&self.samples),
            self.config.sampler_period(),
            self.config.max_raw(),
            self.shutdown.clone(),
        )
    }

    pub fn filter(&self) -> Filter {
        Filter::new(Arc::clone(&self.samples), Arc::clone(&self.filtered))
    }

    pub fn actuator<A: ActuatorPort>(&self, actuator: A) -> Actuator<A> {
        Actuator::new(
            actuator,
            Arc::clone(&self.filtered),
            Arc::clone(&self.manual),
            self.config.command_period(),
            self.config.max_raw(),
            self.config.max_consecutive_actuation_failures,
        )
    }

    /// Start all three stages on their own threads.  Every task gets its
    /// own clone of `sink`, wrapped so the shared counters see each event.
    pub fn spawn<S, A, C, E>(
        self,
        sensor: S,
        actuator: A,
        clock: C,
        sink: E,
    ) -> Result<PipelineHandle>
    where
        S: SensorPort + Send + 'static,
        A: ActuatorPort + Send + 'static,
        C: ClockPort + Send + 'static,
        E: EventSink + Clone + Send + 'static,
    {
        let stack_kb = self.config.task_stack_kb;

        // Downstream first so every consumer is waiting before its producer runs.
        let actuator_task = {
            let stage = self.actuator(actuator);
            let sink = StatsSink::new(Arc::clone(&self.stats), sink.clone());
            spawn_task(Stage::Actuator.name(), stack_kb, move || stage.run(sink))?
        };

        let filter_task = {
            let stage = self.filter();
            let sink = StatsSink::new(Arc::clone(&self.stats), sink.clone());
            match spawn_task(Stage::Filter.name(), stack_kb, move || stage.run(sink)) {
                Ok(handle) => handle,
                Err(e) => {
                    self.filtered.close();
                    return Err(e);
                }
            }
        };

        let sampler_task = {
            let stage = self.sampler(sensor, clock);
            let sink = StatsSink::new(Arc::clone(&self.stats), sink);
            match spawn_task(Stage::Sampler.name(), stack_kb, move || stage.run(sink)) {
                Ok(handle) => handle,
                Err(e) => {
                    self.samples.close();
                    return Err(e);
                }
            }
        };

        info!(
            "pipeline: running (sample every {} ms, PWM period {} us, full scale {})",
            self.config.sampler_period_ms,
            self.config.command_period_us,
            self.config.max_raw()
        );

        Ok(PipelineHandle {
            pipeline: self,
            sampler: sampler_task,
            filter: filter_task,
            actuator: actuator_task,
        })
    }
}

/// Exit codes of the three tasks, collected by [`PipelineHandle::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineExit {
    pub sampler: StageExit,
    pub filter: StageExit,
    pub actuator: StageExit,
}

impl PipelineExit {
    /// `Err` when any stage halted instead of shutting down.
    pub fn into_result(self) -> Result<()> {
        [self.sampler, self.filter, self.actuator]
            .into_iter()
            .find_map(StageExit::halt_error)
            .map_or(Ok(()), |e| Err(Error::from(e)))
    }
}

/// Running pipeline.  Dropping it without [`stop`](Self::stop) leaves the
/// tasks running until process exit.
pub struct PipelineHandle {
    pipeline: Pipeline,
    sampler: JoinHandle<StageExit>,
    filter: JoinHandle<StageExit>,
    actuator: JoinHandle<StageExit>,
}

impl PipelineHandle {
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Whether the actuator task has already returned (halted).
    pub fn actuator_finished(&self) -> bool {
        self.actuator.is_finished()
    }

    /// Request shutdown and join every task.  Blocks for at most about one
    /// sampler period.
    pub fn stop(self) -> Result<PipelineExit> {
        self.pipeline.shutdown.request();
        let sampler = join(Stage::Sampler, self.sampler)?;
        let filter = join(Stage::Filter, self.filter)?;
        let actuator = join(Stage::Actuator, self.actuator)?;
        info!("pipeline: stopped");
        Ok(PipelineExit {
            sampler,
            filter,
            actuator,
        })
    }
}

fn join(stage: Stage, handle: JoinHandle<StageExit>) -> Result<StageExit> {
    handle.join().map_err(|_| {
        warn!("pipeline: {} task panicked", stage.name());
        Error::TaskPanicked(stage.name())
    })
}
