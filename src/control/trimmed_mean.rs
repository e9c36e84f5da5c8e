//! Two-pass trimmed mean.
//!
//! Pass 1 averages the non-zero entries (zero is the startup placeholder,
//! and a genuine zero reading is excluded along with it).  Pass 2 averages
//! the entries inside `[0.9·avg1, 1.1·avg1]`, bounds inclusive.  Both
//! divisions truncate.
//!
//! The band test is done in integers as `9·avg1 <= 10·v <= 11·avg1`, which
//! is the exact rational form of the ±10% band.  When `avg1` is zero the
//! band collapses to `[0, 0]` and pass 2 keeps only exact zeros, so the
//! result is zero.

use super::{FilteredValue, RawSample};

/// Band half-width as a fraction of `avg1`: `TRIM_NUM / TRIM_DEN` = 10%.
const TRIM_NUM: u32 = 1;
const TRIM_DEN: u32 = 10;

/// Intermediate and final results of one filter run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrimmedMean {
    /// Mean of the non-zero entries (pass 1).
    pub avg1: u16,
    /// Mean of the entries inside the band around `avg1` (pass 2).
    pub avg2: FilteredValue,
    /// Entries that contributed to `avg1`.
    pub nonzero: usize,
    /// Entries that contributed to `avg2`.
    pub kept: usize,
}

/// Pass 1: truncated mean of the non-zero entries, `0` when there are none.
pub fn nonzero_mean(samples: &[RawSample]) -> (u16, usize) {
    let (sum, count) = samples
        .iter()
        .filter(|&&s| s != 0)
        .fold((0u32, 0u32), |(sum, n), &s| (sum + u32::from(s), n + 1));
    if count == 0 {
        (0, 0)
    } else {
        ((sum / count) as u16, count as usize)
    }
}

/// Whether `sample` lies in the inclusive ±10% band around `center`.
pub fn within_band(sample: RawSample, center: u16) -> bool {
    let v = u32::from(sample) * TRIM_DEN;
    let c = u32::from(center);
    let lo = c * (TRIM_DEN - TRIM_NUM);
    let hi = c * (TRIM_DEN + TRIM_NUM);
    (lo..=hi).contains(&v)
}

/// Pass 2: truncated mean of the entries inside the band around `center`,
/// `0` when none qualify.
pub fn banded_mean(samples: &[RawSample], center: u16) -> (u16, usize) {
    let (sum, count) = samples
        .iter()
        .filter(|&&s| within_band(s, center))
        .fold((0u32, 0u32), |(sum, n), &s| (sum + u32::from(s), n + 1));
    if count == 0 {
        (0, 0)
    } else {
        ((sum / count) as u16, count as usize)
    }
}

/// Run both passes.  `avg1` is fixed before pass 2 starts.
pub fn two_pass_trimmed_mean(samples: &[RawSample]) -> TrimmedMean {
    let (avg1, nonzero) = nonzero_mean(samples);
    let (avg2, kept) = banded_mean(samples, avg1);
    TrimmedMean {
        avg1,
        avg2,
        nonzero,
        kept,
    }
}
