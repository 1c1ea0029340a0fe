use std::{fmt::Display, str::FromStr};

use anyhow::bail;

use crate::time::{Frequency, Time};

/// Requests allowed per sliding window.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Quota {
    pub requests: u64,
    pub window: Time,
}

impl Quota {
    pub fn new(requests: u64, window: Time) -> Self {
        Self { requests, window }
    }
}

impl From<Frequency> for Quota {
    fn from(value: Frequency) -> Self {
        Self::new(value.amount, value.interval)
    }
}

/// What the limiter answers when its backing store cannot be reached.
///
/// Has no `Default`: every limiter names its policy.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Admit the request.
    Open,
    /// Reject the request as rate limited.
    Closed,
}

impl Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => bail!("Unknown failure policy '{}', expected 'open' or 'closed'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub quota: Quota,
    pub failure_policy: FailurePolicy,
    pub prefix: String,
    pub timeout: Time,
}

impl Config {
    pub fn new(quota: Quota, failure_policy: FailurePolicy) -> Self {
        Self {
            quota,
            failure_policy,
            prefix: "fx-gateway:ratelimit".to_string(),
            timeout: Time::seconds(2),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Time) -> Self {
        self.timeout = timeout;
        self
    }
}
