use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{Booking, BookingStatus, ChangeEvent, Minutes};
use crate::services::reschedule::DayColumn;

/// A subscriber's local copy of one business day.
///
/// Change events are applied as they arrive, but they are only a shortcut:
/// after a focus regain, a lagged stream or any commit the view is marked
/// stale and the owner re-fetches the day and calls [`CalendarView::reconcile`].
#[derive(Debug, Clone)]
pub struct CalendarView {
    pub business_id: String,
    pub date: NaiveDate,
    bookings: BTreeMap<String, Booking>,
    stale: bool,
}

impl CalendarView {
    /// Starts stale; nothing has been fetched yet.
    pub fn new(business_id: &str, date: NaiveDate) -> Self {
        Self {
            business_id: business_id.to_string(),
            date,
            bookings: BTreeMap::new(),
            stale: true,
        }
    }

    /// Fold one change in. Returns whether the view changed.
    pub fn apply(&mut self, event: &ChangeEvent) -> bool {
        if event.business_id != self.business_id {
            return false;
        }
        let booking = &event.booking;
        let visible = booking.date == self.date && booking.status != BookingStatus::Cancelled;
        if visible {
            self.bookings.insert(booking.id.clone(), booking.clone());
            true
        } else {
            self.bookings.remove(&booking.id).is_some()
        }
    }

    pub fn on_focus_regained(&mut self) {
        self.stale = true;
    }

    /// The event stream dropped messages.
    pub fn on_lagged(&mut self) {
        self.stale = true;
    }

    /// Our own commit settled, whatever the outcome.
    pub fn on_commit_settled(&mut self) {
        self.stale = true;
    }

    pub fn needs_refetch(&self) -> bool {
        self.stale
    }

    /// Replace local state with a fresh read of the day.
    pub fn reconcile(&mut self, fetched: Vec<Booking>) {
        self.bookings = fetched
            .into_iter()
            .filter(|b| b.date == self.date && b.status != BookingStatus::Cancelled)
            .map(|b| (b.id.clone(), b))
            .collect();
        self.stale = false;
    }

    /// Bookings on one resource, by start time.
    pub fn bookings_for(&self, resource_id: &str) -> Vec<&Booking> {
        let mut list: Vec<&Booking> = self
            .bookings
            .values()
            .filter(|b| b.resource_id == resource_id)
            .collect();
        list.sort_by_key(|b| (b.start_time, b.end_time));
        list
    }

    /// Column geometry for a drag over `resource_id`.
    pub fn day_column(
        &self,
        resource_id: &str,
        (day_start, day_end): (Minutes, Minutes),
        day_off: bool,
    ) -> DayColumn {
        DayColumn {
            resource_id: resource_id.to_string(),
            date: self.date,
            day_start,
            day_end,
            day_off,
            bookings: self
                .bookings_for(resource_id)
                .into_iter()
                .filter(|b| b.is_active())
                .map(|b| (b.id.clone(), b.range()))
                .collect(),
        }
    }
}
