//! Sensepipe host entry point.
//!
//! Runs the full sense, filter, actuate pipeline against simulated
//! hardware so the timing and filtering behaviour can be watched in the
//! log without a board attached.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  SimAdc          PwmActuator<SimPwm>   SystemClock           │
//! │  (SensorPort)    (ActuatorPort)        (ClockPort)           │
//! │  LogEventSink (EventSink)                                    │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │   Sampler ──M1──▶ Filter ──M2──▶ Actuator                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `sensepipe [config.json]`.  `SENSEPIPE_RUN_SECS` sets the run
//! length (default 30 s); `RUST_LOG` the log level (default `info`).

use std::thread;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use log::{info, warn};

use sensepipe::adapters::log_sink::LogEventSink;
use sensepipe::adapters::pwm::{PwmActuator, SimPwm};
use sensepipe::adapters::sim_adc::{SimAdc, SimAdcHandle};
use sensepipe::adapters::time::SystemClock;
use sensepipe::config::PipelineConfig;
use sensepipe::pipeline::{Pipeline, Shutdown};

const DEFAULT_RUN_SECS: u64 = 30;
/// Resolution of the simulated PWM channel.
const PWM_MAX_LEVEL: u16 = 1000;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("========================================");
    info!("  sensepipe v{}", env!("CARGO_PKG_VERSION"));
    info!("========================================");

    // ── 1. Configuration ──────────────────────────────────────
    let config = load_config()?;
    let run_secs = run_secs();
    info!(
        "config: period={}ms resolution={}bit pwm={}us budget={} run={}s",
        config.sampler_period_ms,
        config.adc_resolution_bits,
        config.command_period_us,
        config.max_consecutive_actuation_failures,
        run_secs
    );

    // ── 2. Adapters ───────────────────────────────────────────
    let (adc, adc_handle) = SimAdc::new(config.max_raw() / 2);
    let pwm = SimPwm::new(PWM_MAX_LEVEL);
    let actuator = PwmActuator::new(pwm.clone(), config.command_period());

    // ── 3. Pipeline ───────────────────────────────────────────
    let pipeline = Pipeline::new(config.clone())?;
    let handle = pipeline.spawn(adc, actuator, SystemClock::new(), LogEventSink::new())?;

    // ── 4. Simulated input ────────────────────────────────────
    let driver_stop = Shutdown::new();
    let driver = {
        let stop = driver_stop.clone();
        let step = StdDuration::from_millis(u64::from(config.sampler_period_ms));
        let max_raw = config.max_raw();
        thread::Builder::new()
            .name("sim-input".into())
            .spawn(move || drive_input(&adc_handle, &stop, step, max_raw))
            .context("failed to spawn input driver")?
    };

    // ── 5. Run ────────────────────────────────────────────────
    let deadline = std::time::Instant::now() + StdDuration::from_secs(run_secs);
    while std::time::Instant::now() < deadline {
        thread::sleep(StdDuration::from_millis(250));
        if handle.actuator_finished() {
            warn!("main: actuator halted, stopping early");
            break;
        }
    }

    // ── 6. Shutdown ───────────────────────────────────────────
    let stats = std::sync::Arc::clone(handle.pipeline().stats());
    let exit = handle.stop()?;
    driver_stop.request();
    if driver.join().is_err() {
        warn!("main: input driver panicked");
    }

    info!(
        "main: exits sampler={:?} filter={:?} actuator={:?}, final PWM level {}/{}",
        exit.sampler,
        exit.filter,
        exit.actuator,
        pwm.level(),
        PWM_MAX_LEVEL
    );
    println!("{}", serde_json::to_string_pretty(&stats.snapshot())?);
    exit.into_result()?;
    Ok(())
}

/// Config from the JSON file named by the first argument, or defaults.
fn load_config() -> Result<PipelineConfig> {
    let Some(path) = std::env::args().nth(1) else {
        info!("config: no file given, using defaults");
        return Ok(PipelineConfig::default());
    };
    let text =
        std::fs::read_to_string(&path).with_context(|| format!("reading config {path}"))?;
    let config: PipelineConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing config {path}"))?;
    info!("config: loaded {}", path);
    Ok(config)
}

fn run_secs() -> u64 {
    match std::env::var("SENSEPIPE_RUN_SECS") {
        Ok(v) => v.parse().unwrap_or_else(|_| {
            warn!("SENSEPIPE_RUN_SECS={:?} is not a number, using {}", v, DEFAULT_RUN_SECS);
            DEFAULT_RUN_SECS
        }),
        Err(_) => DEFAULT_RUN_SECS,
    }
}

/// Triangle ramp across the input range with a periodic spike and an
/// occasional failed conversion, one step per sample period.
fn drive_input(adc: &SimAdcHandle, stop: &Shutdown, step: StdDuration, max_raw: u16) {
    const RAMP_STEPS: u32 = 40;
    const SPIKE_EVERY: u32 = 13;
    const FAIL_EVERY: u32 = 17;

    let mut n: u32 = 0;
    while !stop.is_requested() {
        let phase = n % (2 * RAMP_STEPS);
        let rising = if phase < RAMP_STEPS { phase } else { 2 * RAMP_STEPS - phase };
        let level = (u32::from(max_raw) * rising / RAMP_STEPS) as u16;

        if n % SPIKE_EVERY == SPIKE_EVERY - 1 {
            adc.set(max_raw);
        } else {
            adc.set(level);
        }
        if n % FAIL_EVERY == FAIL_EVERY - 1 {
            adc.fail_next(1);
        }

        n = n.wrapping_add(1);
        thread::sleep(step);
    }
}
