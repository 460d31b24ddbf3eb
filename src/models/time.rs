use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

/// Minutes since midnight.
pub type Minutes = i32;

pub const MINUTES_PER_DAY: Minutes = 24 * 60;

/// Grid every candidate time is rounded to when nothing closer wins.
pub const GRID_MINUTES: Minutes = 5;

/// Wall-clock time on a 24h clock. `24:00` is allowed so a range can end at midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(Minutes);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);
    pub const END_OF_DAY: ClockTime = ClockTime(MINUTES_PER_DAY);

    pub fn parse(s: &str) -> Result<Self, EngineError> {
        to_minutes(s).map(ClockTime)
    }

    pub fn from_hm(hour: Minutes, minute: Minutes) -> Result<Self, EngineError> {
        from_minutes(hour * 60 + minute)
    }

    pub fn minutes(self) -> Minutes {
        self.0
    }

    /// Shift by `delta` minutes, failing if the result leaves the day.
    pub fn checked_add(self, delta: Minutes) -> Option<Self> {
        let m = self.0.checked_add(delta)?;
        (0..=MINUTES_PER_DAY).contains(&m).then_some(ClockTime(m))
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        ClockTime::parse(&s)
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> Self {
        t.to_string()
    }
}

/// Parse `HH:MM` (or `H:MM`) into minutes since midnight.
pub fn to_minutes(s: &str) -> Result<Minutes, EngineError> {
    let invalid = || EngineError::InvalidTimeFormat(s.to_string());

    let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return Err(invalid());
    }
    let hour: Minutes = h.parse().map_err(|_| invalid())?;
    let minute: Minutes = m.parse().map_err(|_| invalid())?;
    if !(0..60).contains(&minute) || !(0..=24).contains(&hour) || (hour == 24 && minute != 0) {
        return Err(invalid());
    }
    Ok(hour * 60 + minute)
}

pub fn from_minutes(minutes: Minutes) -> Result<ClockTime, EngineError> {
    if !(0..=MINUTES_PER_DAY).contains(&minutes) {
        return Err(EngineError::InvalidTimeFormat(format!("{minutes} minutes")));
    }
    Ok(ClockTime(minutes))
}

/// Half-open overlap test: touching endpoints do not overlap.
pub fn overlaps(a_start: Minutes, a_end: Minutes, b_start: Minutes, b_end: Minutes) -> bool {
    a_start < b_end && b_start < a_end
}

pub fn clamp(value: Minutes, min: Minutes, max: Minutes) -> Minutes {
    if max < min {
        return min;
    }
    value.max(min).min(max)
}

/// Round to the nearest multiple of `grid`; halves round up.
pub fn snap(value: Minutes, grid: Minutes) -> Minutes {
    if grid <= 0 {
        return value;
    }
    (value + grid / 2).div_euclid(grid) * grid
}

/// Half-open `[start, end)` range of clock times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeRange {
    pub fn new(start: ClockTime, end: ClockTime) -> Result<Self, EngineError> {
        if start >= end {
            return Err(EngineError::InvalidTimeFormat(format!(
                "range {start}-{end} is empty"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> Minutes {
        self.end.minutes() - self.start.minutes()
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        overlaps(
            self.start.minutes(),
            self.end.minutes(),
            other.start.minutes(),
            other.end.minutes(),
        )
    }
}
