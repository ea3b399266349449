//! Remaining-time evaluation for a single countdown frame.

use std::fmt;

/// Remaining time split into whole hours, minutes and seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Hms {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Hms {
    pub fn from_whole_secs(secs: u64) -> Self {
        Self {
            hours: secs / 3600,
            minutes: (secs % 3600) / 60,
            seconds: secs % 60,
        }
    }
}

/// Zero-padded `HH:MM:SS`; hours widen past two digits.
impl fmt::Display for Hms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}

/// Seconds left on the clock, clamped to zero when `elapsed` overruns `total`.
pub fn remaining_secs(elapsed: f64, total: f64) -> f64 {
    let remaining = total - elapsed;
    if remaining.is_finite() && remaining > 0.0 {
        remaining
    } else {
        0.0
    }
}

pub fn remaining_hms(elapsed: f64, total: f64) -> Hms {
    Hms::from_whole_secs(remaining_secs(elapsed, total).trunc() as u64)
}

/// Text shown on the frame at `elapsed` seconds into a `total` second countdown.
pub fn countdown_label(elapsed: f64, total: f64) -> String {
    remaining_hms(elapsed, total).to_string()
}
