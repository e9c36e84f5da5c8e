//! Pure control-path computations shared by the pipeline stages.
//!
//! - [`window`]: fixed-capacity ring of the most recent raw samples
//! - [`trimmed_mean`]: two-pass outlier-rejecting average over the window
//! - [`duty`]: linear mapping from filtered value to PWM high-time

pub mod duty;
pub mod trimmed_mean;
pub mod window;

/// A raw ADC conversion, `0..=MAX_RAW`.
pub type RawSample = u16;

/// Output of the filter stage, `0..=MAX_RAW`.
pub type FilteredValue = u16;
