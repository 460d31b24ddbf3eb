//! Fixtures shared by unit tests.

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::{self, queries};
use crate::models::{ClockTime, Resource, WorkingHoursEntry};

pub const BUSINESS: &str = "biz-1";
pub const RESOURCE: &str = "res-1";
pub const OTHER_RESOURCE: &str = "res-2";

/// 2025-06-16, a Monday.
pub fn monday() -> NaiveDate {
    date("2025-06-16")
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn t(s: &str) -> ClockTime {
    ClockTime::parse(s).unwrap()
}

/// Two resources of one business, both working Mon–Fri 09:00–17:00, Sunday off.
pub fn seed(conn: &Connection) {
    for id in [RESOURCE, OTHER_RESOURCE] {
        queries::create_resource(
            conn,
            &Resource {
                id: id.into(),
                business_id: BUSINESS.into(),
                name: id.into(),
                active: true,
            },
        )
        .unwrap();
        for dow in 1..=5 {
            queries::upsert_working_hours(
                conn,
                id,
                &WorkingHoursEntry {
                    day_of_week: dow,
                    open_time: t("09:00"),
                    close_time: t("17:00"),
                    is_day_off: false,
                },
            )
            .unwrap();
        }
        queries::upsert_working_hours(
            conn,
            id,
            &WorkingHoursEntry {
                day_of_week: 0,
                open_time: t("00:00"),
                close_time: t("00:00"),
                is_day_off: true,
            },
        )
        .unwrap();
    }
}

pub fn seeded_conn() -> Connection {
    let conn = db::init_db(":memory:").unwrap();
    seed(&conn);
    conn
}

/// A throwaway on-disk database, for tests that need several connections.
pub struct TempDb {
    pub path: std::path::PathBuf,
}

impl TempDb {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("slotbook-test-{}.db", uuid::Uuid::new_v4()));
        let conn = db::init_db(path.to_str().unwrap()).unwrap();
        seed(&conn);
        Self { path }
    }

    pub fn open(&self, busy_timeout: std::time::Duration) -> Connection {
        db::init_db_with_timeout(self.path.to_str().unwrap(), busy_timeout).unwrap()
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        let base = self.path.to_string_lossy().to_string();
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{base}{suffix}"));
        }
    }
}

/// Seeded in-memory state with a small catalog: haircut 30 min, wash add-on 15 min.
pub fn test_state() -> crate::state::AppState {
    use std::sync::{Arc, Mutex};

    use crate::services::catalog::StaticCatalog;
    use crate::services::identity::StaticIdentity;
    use crate::services::propagation::ChangeHub;

    crate::state::AppState {
        db: Arc::new(Mutex::new(seeded_conn())),
        catalog: Box::new(
            StaticCatalog::default()
                .with_service("haircut", 30)
                .with_addon("wash", 15),
        ),
        identity: Box::new(StaticIdentity::default()),
        hub: ChangeHub::default(),
    }
}
