use serde::{Deserialize, Serialize};

use super::time::{ClockTime, TimeRange};

/// What a resource's working window looks like on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayWindow {
    Open { open: ClockTime, close: ClockTime },
    /// Weekly day-off or vacation.
    DayOff,
    /// No hours configured for this weekday.
    Closed,
}

impl DayWindow {
    pub fn is_day_off(&self) -> bool {
        matches!(self, DayWindow::DayOff)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Bookable,
    Blocked,
    OutsideHours,
    DayOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupantKind {
    Booking,
    TimeOff,
}

/// Something holding time on the resource's day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub id: String,
    pub kind: OccupantKind,
    pub range: TimeRange,
}

/// A read-time segment of the display window. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub kind: SlotKind,
    /// Bookings and time-off that produced a blocked slot, with their own ranges.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub occupants: Vec<Occupant>,
}

impl Slot {
    pub fn duration(&self) -> i32 {
        self.end_time.minutes() - self.start_time.minutes()
    }
}
