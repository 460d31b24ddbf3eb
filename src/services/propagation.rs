use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::models::ChangeEvent;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Best-effort fan-out of booking changes, one channel per business.
///
/// Delivery is at-most-once. A subscriber that lags or reconnects must
/// re-fetch the calendar; nothing here is a source of truth.
pub struct ChangeHub {
    channels: DashMap<String, broadcast::Sender<ChangeEvent>>,
    capacity: usize,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl ChangeHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to a business calendar. Creates the channel if needed.
    pub fn subscribe(&self, business_id: &str) -> broadcast::Receiver<ChangeEvent> {
        self.channels
            .entry(business_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Fire and forget. Returns how many subscribers the event reached.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let Some(sender) = self.channels.get(&event.business_id).map(|s| s.clone()) else {
            return 0;
        };
        let business_id = event.business_id.clone();
        match sender.send(event) {
            Ok(n) => n,
            Err(_) => {
                // Everyone went away; drop the channel unless someone re-subscribed meanwhile.
                self.channels
                    .remove_if(&business_id, |_, s| s.receiver_count() == 0);
                0
            }
        }
    }

    pub fn subscriber_count(&self, business_id: &str) -> usize {
        self.channels
            .get(business_id)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Booking, BookingStatus, ChangeKind, ClockTime};
    use chrono::NaiveDate;

    fn booking(business: &str) -> Booking {
        let now = chrono::Utc::now().naive_utc();
        Booking {
            id: "b-1".into(),
            business_id: business.into(),
            resource_id: "res-1".into(),
            requester_id: "client".into(),
            service_id: "svc".into(),
            addon_ids: vec![],
            date: NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
            start_time: ClockTime::parse("10:00").unwrap(),
            end_time: ClockTime::parse("10:30").unwrap(),
            status: BookingStatus::Booked,
            previous_date: None,
            previous_start: None,
            previous_end: None,
            changed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn subscribers_of_the_business_receive_events() {
        let hub = ChangeHub::default();
        let mut a = hub.subscribe("biz-1");
        let mut b = hub.subscribe("biz-1");
        let mut other = hub.subscribe("biz-2");

        let reached = hub.publish(ChangeEvent::new(ChangeKind::Created, booking("biz-1")));
        assert_eq!(reached, 2);

        assert_eq!(a.recv().await.unwrap().booking.id, "b-1");
        assert_eq!(b.recv().await.unwrap().kind, ChangeKind::Created);
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_noop() {
        let hub = ChangeHub::default();
        assert_eq!(hub.publish(ChangeEvent::new(ChangeKind::Cancelled, booking("biz-1"))), 0);
    }

    #[tokio::test]
    async fn dropped_receivers_release_the_channel() {
        let hub = ChangeHub::default();
        let rx = hub.subscribe("biz-1");
        assert_eq!(hub.subscriber_count("biz-1"), 1);
        drop(rx);
        assert_eq!(hub.publish(ChangeEvent::new(ChangeKind::Updated, booking("biz-1"))), 0);
        assert_eq!(hub.subscriber_count("biz-1"), 0);
    }

    #[tokio::test]
    async fn slow_subscriber_lags_instead_of_blocking() {
        let hub = ChangeHub::new(2);
        let mut rx = hub.subscribe("biz-1");
        for _ in 0..5 {
            hub.publish(ChangeEvent::new(ChangeKind::Updated, booking("biz-1")));
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
    }
}
