//! Units for reporting measured durations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Nanosecond,
    Microsecond,
    #[default]
    Millisecond,
    Second,
    Minute,
}

impl TimeUnit {
    /// Parse a unit name. Unknown or empty names fall back to milliseconds.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "ns" | "nanosecond" | "nanoseconds" => TimeUnit::Nanosecond,
            "us" | "µs" | "microsecond" | "microseconds" => TimeUnit::Microsecond,
            "ms" | "millisecond" | "milliseconds" => TimeUnit::Millisecond,
            "s" | "second" | "seconds" => TimeUnit::Second,
            "m" | "min" | "minute" | "minutes" => TimeUnit::Minute,
            _ => TimeUnit::Millisecond,
        }
    }

    /// `d` expressed in this unit.
    pub fn convert(self, d: Duration) -> f64 {
        match self {
            TimeUnit::Nanosecond => d.as_nanos() as f64,
            TimeUnit::Microsecond => d.as_nanos() as f64 / 1_000.0,
            TimeUnit::Millisecond => d.as_nanos() as f64 / 1_000_000.0,
            TimeUnit::Second => d.as_secs_f64(),
            TimeUnit::Minute => d.as_secs_f64() / 60.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Nanosecond => "nanosecond",
            TimeUnit::Microsecond => "microsecond",
            TimeUnit::Millisecond => "millisecond",
            TimeUnit::Second => "second",
            TimeUnit::Minute => "minute",
        }
    }
}
