use std::{fmt::Display, time::Duration};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn millis(&self) -> u64 {
        match self {
            TimeUnit::Milliseconds => 1,
            TimeUnit::Seconds => 1_000,
            TimeUnit::Minutes => 60_000,
            TimeUnit::Hours => 3_600_000,
            TimeUnit::Days => 86_400_000,
        }
    }

    pub fn convert(&self, amount: u64, unit: TimeUnit) -> u64 {
        amount.saturating_mul(self.millis()) / unit.millis()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Time {
    pub amount: u64,
    pub unit: TimeUnit,
}

impl Time {
    pub fn new(amount: u64, unit: TimeUnit) -> Self {
        Self { amount, unit }
    }

    pub fn seconds(amount: u64) -> Self {
        Self::new(amount, TimeUnit::Seconds)
    }

    pub fn hours(amount: u64) -> Self {
        Self::new(amount, TimeUnit::Hours)
    }

    pub fn convert(&self, unit: TimeUnit) -> Time {
        Time {
            amount: self.unit.convert(self.amount, unit),
            unit,
        }
    }

    pub fn as_millis(&self) -> u64 {
        self.convert(TimeUnit::Milliseconds).amount
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.as_millis())
    }

    /// The same span as a signed `chrono` delta, saturating at its maximum.
    pub fn as_delta(&self) -> chrono::TimeDelta {
        i64::try_from(self.as_millis())
            .ok()
            .and_then(chrono::TimeDelta::try_milliseconds)
            .unwrap_or(chrono::TimeDelta::MAX)
    }
}

impl From<Duration> for Time {
    fn from(value: Duration) -> Self {
        Self::new(value.as_millis() as u64, TimeUnit::Milliseconds)
    }
}

impl Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let unit = match self.unit {
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "m",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
        };
        write!(f, "{}{}", self.amount, unit)
    }
}

/// A number of events allowed per interval.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Frequency {
    pub amount: u64,
    pub interval: Time,
}

impl Frequency {
    pub fn new(amount: u64, interval: Time) -> Self {
        Self { amount, interval }
    }
}
