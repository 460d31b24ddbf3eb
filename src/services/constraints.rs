use std::collections::BTreeSet;

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::EngineError;
use crate::models::resource::day_of_week;
use crate::models::{DayWindow, Resource, TimeOffBlock, Vacation, WorkingHoursEntry};

/// Everything that limits one resource over an inclusive date range.
#[derive(Debug, Clone)]
pub struct Constraints {
    pub resource: Resource,
    pub working_hours: Vec<WorkingHoursEntry>,
    pub day_off_dates: BTreeSet<NaiveDate>,
    pub time_off_blocks: Vec<TimeOffBlock>,
    pub vacations: Vec<Vacation>,
}

impl Constraints {
    /// Build from already-loaded rows. Day-off dates are derived for `[from, to]`.
    pub fn assemble(
        resource: Resource,
        working_hours: Vec<WorkingHoursEntry>,
        time_off_blocks: Vec<TimeOffBlock>,
        vacations: Vec<Vacation>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Self {
        let day_off_dates = from
            .iter_days()
            .take_while(|d| *d <= to)
            .filter(|d| {
                vacations.iter().any(|v| v.covers(*d))
                    || working_hours
                        .iter()
                        .any(|w| w.day_of_week == day_of_week(*d) && w.is_day_off)
            })
            .collect();

        Self {
            resource,
            working_hours,
            day_off_dates,
            time_off_blocks,
            vacations,
        }
    }

    pub fn window_for(&self, date: NaiveDate) -> DayWindow {
        if self.day_off_dates.contains(&date) || self.vacations.iter().any(|v| v.covers(date)) {
            return DayWindow::DayOff;
        }
        let dow = day_of_week(date);
        match self.working_hours.iter().find(|w| w.day_of_week == dow) {
            Some(w) if w.is_day_off => DayWindow::DayOff,
            Some(w) if w.open_time < w.close_time => DayWindow::Open {
                open: w.open_time,
                close: w.close_time,
            },
            // Unconfigured or malformed hours fail safe toward unbookable.
            _ => DayWindow::Closed,
        }
    }

    pub fn time_off_on(&self, date: NaiveDate) -> impl Iterator<Item = &TimeOffBlock> {
        self.time_off_blocks.iter().filter(move |b| b.date == date)
    }
}

pub fn get_constraints(
    conn: &Connection,
    resource_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Constraints, EngineError> {
    let resource = queries::get_resource(conn, resource_id)?
        .ok_or_else(|| EngineError::ResourceNotFound(resource_id.to_string()))?;
    let working_hours = queries::get_working_hours(conn, resource_id)?;
    let time_off = queries::get_time_off_in_range(conn, resource_id, from, to)?;
    let vacations = queries::get_vacations_in_range(conn, resource_id, from, to)?;

    Ok(Constraints::assemble(
        resource,
        working_hours,
        time_off,
        vacations,
        from,
        to,
    ))
}

/// Single-date convenience used by the calculator and the guard.
pub fn day_constraints(
    conn: &Connection,
    resource_id: &str,
    date: NaiveDate,
) -> Result<Constraints, EngineError> {
    get_constraints(conn, resource_id, date, date)
}
