use std::fmt;
use std::str::FromStr;

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("invalid time '{input}': expected HH:MM")]
    MalformedTime { input: String },
    #[error("invalid interval '{input}': expected HH:MM-HH:MM")]
    MalformedInterval { input: String },
}

pub type ScheduleResult<T> = std::result::Result<T, ScheduleError>;

/// Wall-clock time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> ScheduleResult<Self> {
        Self::from_hm(hour, minute).ok_or_else(|| ScheduleError::MalformedTime {
            input: format!("{hour:02}:{minute:02}"),
        })
    }

    pub const fn from_hm(hour: u8, minute: u8) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self { hour, minute })
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    pub fn now_local() -> Self {
        let now = chrono::Local::now();
        Self {
            hour: now.hour() as u8,
            minute: now.minute() as u8,
        }
    }
}

impl FromStr for ClockTime {
    type Err = ScheduleError;

    /// Accepts exactly `HH:MM`, zero-padded, 24-hour.
    fn from_str(input: &str) -> ScheduleResult<Self> {
        let malformed = || ScheduleError::MalformedTime {
            input: input.to_string(),
        };
        let bytes = input.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(malformed());
        }
        let (hour, minute) = (&input[..2], &input[3..]);
        if !hour.bytes().chain(minute.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let hour = hour.parse::<u8>().map_err(|_| malformed())?;
        let minute = minute.parse::<u8>().map_err(|_| malformed())?;
        Self::new(hour, minute).map_err(|_| malformed())
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ScheduleError;

    fn try_from(value: String) -> ScheduleResult<Self> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// The daily interval during which dark mode is expected. May wrap past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeWindow {
    pub const fn new(start: ClockTime, end: ClockTime) -> Self {
        Self { start, end }
    }

    /// Start inclusive, end exclusive. `start >= end` wraps past midnight, so
    /// `start == end` covers the whole day.
    pub fn is_dark_at(&self, now: ClockTime) -> bool {
        if self.start < self.end {
            self.start <= now && now < self.end
        } else {
            now >= self.start || now < self.end
        }
    }
}

impl FromStr for TimeWindow {
    type Err = ScheduleError;

    fn from_str(input: &str) -> ScheduleResult<Self> {
        parse_interval(input)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Parses the user-facing `HH:MM-HH:MM` form.
pub fn parse_interval(input: &str) -> ScheduleResult<TimeWindow> {
    let malformed = || ScheduleError::MalformedInterval {
        input: input.to_string(),
    };
    let (start, end) = input.trim().split_once('-').ok_or_else(malformed)?;
    let start = start.parse::<ClockTime>().map_err(|_| malformed())?;
    let end = end.parse::<ClockTime>().map_err(|_| malformed())?;
    Ok(TimeWindow::new(start, end))
}
