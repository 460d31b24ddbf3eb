use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::booking::Booking;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Cancelled,
}

/// Where a rescheduled booking used to be, so observers of the old column refresh too.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousPlacement {
    pub resource_id: String,
    pub date: NaiveDate,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub business_id: String,
    pub resource_id: String,
    pub date: NaiveDate,
    pub kind: ChangeKind,
    pub booking: Booking,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<PreviousPlacement>,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, booking: Booking) -> Self {
        Self {
            business_id: booking.business_id.clone(),
            resource_id: booking.resource_id.clone(),
            date: booking.date,
            kind,
            booking,
            previous: None,
        }
    }

    pub fn with_previous(mut self, resource_id: String, date: NaiveDate) -> Self {
        if resource_id != self.resource_id || date != self.date {
            self.previous = Some(PreviousPlacement { resource_id, date });
        }
        self
    }

    /// Whether a view of (`resource_id`, `date`) is affected by this change.
    pub fn touches(&self, resource_id: &str, date: NaiveDate) -> bool {
        (self.resource_id == resource_id && self.date == date)
            || self
                .previous
                .as_ref()
                .is_some_and(|p| p.resource_id == resource_id && p.date == date)
    }
}
