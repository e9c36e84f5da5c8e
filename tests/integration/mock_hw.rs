//! Mock hardware adapters for integration tests.
//!
//! A virtual clock that only moves when told to, a scripted sensor that
//! can stall that clock to simulate slow conversions, an actuator that
//! records every command, and an event recorder.  All of them are cheap
//! to clone so a test can keep a handle after moving one into a stage.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use embassy_time::{Duration, Instant};
use sensepipe::app::events::PipelineEvent;
use sensepipe::app::ports::{ActuatorPort, ClockPort, EventSink, SensorPort};
use sensepipe::error::{ActuatorError, SensorError};

// ── VirtualClock ──────────────────────────────────────────────

/// Clock that advances only through `advance()` or `sleep_until()`.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now_us: Arc<AtomicU64>,
    sleeps: Arc<Mutex<Vec<Instant>>>,
}

#[allow(dead_code)]
impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now_us.fetch_add(by.as_micros(), Ordering::SeqCst);
    }

    pub fn now_ms(&self) -> u64 {
        self.now_us.load(Ordering::SeqCst) / 1000
    }

    /// Every deadline passed to `sleep_until`, in call order.
    pub fn sleeps(&self) -> Vec<Instant> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl ClockPort for VirtualClock {
    fn now(&self) -> Instant {
        Instant::from_micros(self.now_us.load(Ordering::SeqCst))
    }

    fn sleep_until(&mut self, deadline: Instant) {
        self.sleeps.lock().unwrap().push(deadline);
        self.now_us.fetch_max(deadline.as_micros(), Ordering::SeqCst);
    }
}

// ── MockSensor ────────────────────────────────────────────────

/// Scripted sensor.  Each reading may take virtual time, which is how
/// tests provoke deadline overruns.  An exhausted script reads as a
/// failed conversion.
pub struct MockSensor {
    clock: VirtualClock,
    script: VecDeque<(Result<u16, SensorError>, Duration)>,
}

#[allow(dead_code)]
impl MockSensor {
    pub fn new(clock: &VirtualClock) -> Self {
        Self {
            clock: clock.clone(),
            script: VecDeque::new(),
        }
    }

    pub fn reading(self, raw: u16) -> Self {
        self.slow_reading(raw, Duration::from_ticks(0))
    }

    pub fn readings(mut self, raws: &[u16]) -> Self {
        for &raw in raws {
            self = self.reading(raw);
        }
        self
    }

    pub fn slow_reading(mut self, raw: u16, latency: Duration) -> Self {
        self.script.push_back((Ok(raw), latency));
        self
    }

    pub fn failure(mut self, error: SensorError) -> Self {
        self.script.push_back((Err(error), Duration::from_ticks(0)));
        self
    }
}

impl SensorPort for MockSensor {
    fn read(&mut self) -> Result<u16, SensorError> {
        let Some((result, latency)) = self.script.pop_front() else {
            return Err(SensorError::AdcReadFailed);
        };
        self.clock.advance(latency);
        result
    }
}

// ── MockActuator ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandCall {
    pub period: Duration,
    pub duty: Duration,
}

#[derive(Debug, Default)]
struct ActuatorState {
    calls: Vec<CommandCall>,
    failing: bool,
}

/// Records every accepted command; rejects all of them while `failing`.
#[derive(Debug, Clone, Default)]
pub struct MockActuator {
    state: Arc<Mutex<ActuatorState>>,
}

#[allow(dead_code)]
impl MockActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    pub fn calls(&self) -> Vec<CommandCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn last_duty_us(&self) -> Option<u64> {
        self.state
            .lock()
            .unwrap()
            .calls
            .last()
            .map(|c| c.duty.as_micros())
    }
}

impl ActuatorPort for MockActuator {
    fn set_command(&mut self, period: Duration, duty: Duration) -> Result<(), ActuatorError> {
        let mut state = self.state.lock().unwrap();
        if state.failing {
            return Err(ActuatorError::PwmWriteFailed);
        }
        state.calls.push(CommandCall { period, duty });
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<PipelineEvent>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&PipelineEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &PipelineEvent) {
        self.events.lock().unwrap().push(*event);
    }
}
