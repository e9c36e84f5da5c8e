//! Sense-filter-actuate pipeline library.
//!
//! A periodic sampler reads an ADC channel, a filter reduces the last ten
//! samples to a two-pass trimmed mean, and an actuator scales the result
//! into a PWM duty command.  Stages hand values over through single-slot
//! [`mailbox::Mailbox`]es; hardware is reached only through the port
//! traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod mailbox;
pub mod manual;
pub mod pipeline;
pub mod task;
