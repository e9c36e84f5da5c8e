//! Manual duty override.
//!
//! A push-button cycles the output through fixed intensities, bypassing the
//! filtered value:
//!
//! ```text
//!  Auto ──press──▶ 0% ──press──▶ 33% ──press──▶ 66% ──press──▶ 100% ──press──▶ Auto
//! ```
//!
//! [`ManualOverride::press`] is a single atomic read-modify-write, so the
//! GPIO ISR (wired outside this crate) may call it directly.  The actuator
//! stage reads the level on every command.

use core::sync::atomic::{AtomicU8, Ordering};

/// Current override setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OverrideLevel {
    /// No override; the filtered value drives the output.
    Auto = 0,
    Off = 1,
    Low = 2,
    Mid = 3,
    Full = 4,
}

impl OverrideLevel {
    const COUNT: u8 = 5;

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Off,
            2 => Self::Low,
            3 => Self::Mid,
            4 => Self::Full,
            _ => Self::Auto,
        }
    }

    /// Forced duty in percent, `None` for [`Auto`](Self::Auto).
    pub const fn percent(self) -> Option<u8> {
        match self {
            Self::Auto => None,
            Self::Off => Some(0),
            Self::Low => Some(33),
            Self::Mid => Some(66),
            Self::Full => Some(100),
        }
    }

    pub const fn next(self) -> Self {
        match self {
            Self::Auto => Self::Off,
            Self::Off => Self::Low,
            Self::Low => Self::Mid,
            Self::Mid => Self::Full,
            Self::Full => Self::Auto,
        }
    }
}

/// Lock-free override state shared between the button ISR and the actuator.
#[derive(Debug)]
pub struct ManualOverride {
    level: AtomicU8,
}

impl Default for ManualOverride {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualOverride {
    pub const fn new() -> Self {
        Self {
            level: AtomicU8::new(OverrideLevel::Auto as u8),
        }
    }

    /// Advance to the next level.  Returns the new level.
    /// Lock-free, so callable from interrupt context.
    pub fn press(&self) -> OverrideLevel {
        let prev = self
            .level
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                Some((raw + 1) % OverrideLevel::COUNT)
            })
            .unwrap_or(OverrideLevel::Auto as u8);
        OverrideLevel::from_u8(prev).next()
    }

    pub fn level(&self) -> OverrideLevel {
        OverrideLevel::from_u8(self.level.load(Ordering::Acquire))
    }

    pub fn set(&self, level: OverrideLevel) {
        self.level.store(level as u8, Ordering::Release);
    }

    /// Return control to the filtered value.
    pub fn clear(&self) {
        self.set(OverrideLevel::Auto);
    }
}
