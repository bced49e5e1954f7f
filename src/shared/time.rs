use chrono::{DateTime, Utc};

/// Source of "now" for the listing state resolver
pub trait Clock: Send + Sync {
    /// Seconds since Unix epoch, the unit rental windows are stored in
    fn now_epoch_seconds(&self) -> i64;
}

/// Production implementation of Clock using system time
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Test implementation of Clock with fixed/controllable time
#[derive(Debug, Clone)]
pub struct FixedClock {
    timestamp: DateTime<Utc>,
}

impl FixedClock {
    pub fn from_rfc3339(timestamp_str: &str) -> Result<Self, chrono::ParseError> {
        let timestamp = DateTime::parse_from_rfc3339(timestamp_str)?.with_timezone(&Utc);
        Ok(Self { timestamp })
    }

    /// Panics on a timestamp chrono cannot represent
    pub fn from_epoch_seconds(seconds: i64) -> Self {
        let timestamp = DateTime::from_timestamp(seconds, 0).expect("Invalid timestamp");
        Self { timestamp }
    }

    pub fn advance_seconds(&mut self, seconds: i64) {
        self.timestamp += chrono::Duration::seconds(seconds);
    }
}

impl Clock for FixedClock {
    fn now_epoch_seconds(&self) -> i64 {
        self.timestamp.timestamp()
    }
}

/// Calendar date (UTC) of an epoch-seconds timestamp, for rental windows
pub fn display_date(epoch_seconds: i64) -> String {
    match DateTime::from_timestamp(epoch_seconds, 0) {
        Some(timestamp) => timestamp.format("%Y-%m-%d").to_string(),
        None => String::new(),
    }
}
