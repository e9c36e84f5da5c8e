//! Application boundary: port traits and outbound events.
//!
//! The pipeline stages in [`crate::pipeline`] hold the domain logic; every
//! interaction with the ADC, the PWM, the clock and the operator log goes
//! through the **port traits** defined in [`ports`], keeping the stages
//! fully testable without real peripherals.

pub mod events;
pub mod ports;
