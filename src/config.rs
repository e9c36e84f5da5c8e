//! Pipeline configuration parameters
//!
//! All tunable parameters for the sense-filter-actuate pipeline. The
//! window length and trimming band of the filter are fixed and live in
//! [`crate::control`]; only timing, converter resolution and the
//! actuation failure budget are configurable.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const MIN_TASK_STACK_KB: usize = 4;
const MAX_TASK_STACK_KB: usize = 8 * 1024;

/// Core pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    // --- Sampler ---
    /// Sampler release period (milliseconds)
    pub sampler_period_ms: u32,
    /// ADC resolution in bits; full scale is `2^bits - 1`
    pub adc_resolution_bits: u8,

    // --- Actuator ---
    /// PWM period the duty cycle is expressed against (microseconds)
    pub command_period_us: u32,
    /// Consecutive actuation failures tolerated before the actuator halts.
    /// `1` halts on the first failure.
    pub max_consecutive_actuation_failures: u8,

    // --- Tasks ---
    /// Stack size for each stage task (KiB)
    pub task_stack_kb: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            // Sampler
            sampler_period_ms: 1000, // 1 Hz
            adc_resolution_bits: 10, // MAX_RAW = 1023

            // Actuator
            command_period_us: 1000, // 1 kHz PWM
            max_consecutive_actuation_failures: 1,

            // Tasks
            task_stack_kb: 16,
        }
    }
}

impl PipelineConfig {
    /// Reject out-of-range values. Nothing is clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampler_period_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "sampler_period_ms must be non-zero",
            ));
        }
        if !(1..=16).contains(&self.adc_resolution_bits) {
            return Err(ConfigError::ValidationFailed(
                "adc_resolution_bits must be within 1..=16",
            ));
        }
        if self.command_period_us == 0 {
            return Err(ConfigError::ValidationFailed(
                "command_period_us must be non-zero",
            ));
        }
        if self.max_consecutive_actuation_failures == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_consecutive_actuation_failures must be at least 1",
            ));
        }
        if !(MIN_TASK_STACK_KB..=MAX_TASK_STACK_KB).contains(&self.task_stack_kb) {
            return Err(ConfigError::ValidationFailed(
                "task_stack_kb must be within 4..=8192",
            ));
        }
        Ok(())
    }

    /// Largest valid raw reading (`MAX_RAW`).
    pub fn max_raw(&self) -> u16 {
        ((1u32 << self.adc_resolution_bits) - 1) as u16
    }

    pub fn sampler_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.sampler_period_ms))
    }

    pub fn command_period(&self) -> Duration {
        Duration::from_micros(u64::from(self.command_period_us))
    }
}
