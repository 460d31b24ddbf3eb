use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::time::ClockTime;
use crate::errors::EngineError;

/// A bookable party, e.g. an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub active: bool,
}

/// Weekly hours for one day of the week (0 = Sunday).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingHoursEntry {
    pub day_of_week: u8,
    pub open_time: ClockTime,
    pub close_time: ClockTime,
    #[serde(default)]
    pub is_day_off: bool,
}

impl WorkingHoursEntry {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.day_of_week > 6 {
            return Err(EngineError::InvalidTimeFormat(format!(
                "day_of_week {} out of range 0-6",
                self.day_of_week
            )));
        }
        if !self.is_day_off && self.open_time >= self.close_time {
            return Err(EngineError::InvalidTimeFormat(format!(
                "open {} must be before close {}",
                self.open_time, self.close_time
            )));
        }
        Ok(())
    }
}

pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Short ad-hoc unavailability such as a break or training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeOffBlock {
    pub id: String,
    pub resource_id: String,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub reason: Option<String>,
}

/// Multi-day unavailability; both ends inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vacation {
    pub id: String,
    pub resource_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

impl Vacation {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}
