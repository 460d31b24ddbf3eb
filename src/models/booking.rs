use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::time::{ClockTime, TimeRange};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub business_id: String,
    pub resource_id: String,
    pub requester_id: String,
    pub service_id: String,
    pub addon_ids: Vec<String>,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub status: BookingStatus,
    pub previous_date: Option<NaiveDate>,
    pub previous_start: Option<ClockTime>,
    pub previous_end: Option<ClockTime>,
    pub changed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Booked
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Booked,
    Cancelled,
    Finished,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Booked => "booked",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Finished => "finished",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "booked" => Some(BookingStatus::Booked),
            "cancelled" => Some(BookingStatus::Cancelled),
            "finished" => Some(BookingStatus::Finished),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Booked)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields the requester supplies when creating a booking. Business, id and times are server-side.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub requester_id: String,
    pub service_id: String,
    pub addon_ids: Vec<String>,
}

/// Result of running a proposal through the conflict guard.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProposalOutcome {
    Accepted { booking: Booking },
    Rejected { conflicting_booking_id: String },
}

impl ProposalOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ProposalOutcome::Accepted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip_and_terminality() {
        for s in [BookingStatus::Booked, BookingStatus::Cancelled, BookingStatus::Finished] {
            assert_eq!(BookingStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(BookingStatus::parse("pending"), None);
        assert!(!BookingStatus::Booked.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Finished.is_terminal());
    }

    #[test]
    fn rejected_outcome_wire_shape() {
        let outcome = ProposalOutcome::Rejected {
            conflicting_booking_id: "b-1".into(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "rejected", "conflicting_booking_id": "b-1"})
        );
    }
}
