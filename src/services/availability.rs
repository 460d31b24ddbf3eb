use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::EngineError;
use crate::models::time::{from_minutes, MINUTES_PER_DAY};
use crate::models::{
    Booking, ClockTime, DayWindow, Minutes, Occupant, OccupantKind, Slot, SlotKind, TimeOffBlock,
    TimeRange,
};
use crate::services::constraints;

/// Visible range of a day column before widening.
pub const DEFAULT_DISPLAY_START: Minutes = 6 * 60;
pub const DEFAULT_DISPLAY_END: Minutes = 23 * 60;

/// The default 06:00–23:00 range, widened to whole hours so that the working
/// window and every occupant fit.
pub fn display_window(window: &DayWindow, occupied: &[Occupant]) -> (Minutes, Minutes) {
    let mut start = DEFAULT_DISPLAY_START;
    let mut end = DEFAULT_DISPLAY_END;

    if let DayWindow::Open { open, close } = window {
        start = start.min(open.minutes());
        end = end.max(close.minutes());
    }
    for o in occupied {
        start = start.min(o.range.start.minutes());
        end = end.max(o.range.end.minutes());
    }

    let start = start - start.rem_euclid(60);
    let end = ((end + 59) / 60 * 60).min(MINUTES_PER_DAY);
    (start.max(0), end)
}

/// Partition the display window into labelled slots.
///
/// The result is sorted, gap-free and non-overlapping. Occupied time always
/// wins over the working-window edges; overlapping occupants (force-booked
/// doubles) collapse into one blocked slot that lists each of them.
pub fn compute_slots(
    window: &DayWindow,
    duration: Minutes,
    occupied: &[Occupant],
) -> Result<Vec<Slot>, EngineError> {
    if duration <= 0 {
        return Err(EngineError::InvalidDuration(format!("{duration} minutes")));
    }

    let (display_start, display_end) = display_window(window, occupied);

    if window.is_day_off() {
        return Ok(vec![Slot {
            start_time: from_minutes(display_start)?,
            end_time: from_minutes(display_end)?,
            kind: SlotKind::DayOff,
            occupants: Vec::new(),
        }]);
    }

    let mut sorted: Vec<&Occupant> = occupied.iter().collect();
    sorted.sort_by_key(|o| (o.range.start, o.range.end));

    let mut runs: Vec<(Minutes, Minutes, Vec<Occupant>)> = Vec::new();
    for o in sorted {
        let (s, e) = (o.range.start.minutes(), o.range.end.minutes());
        if let Some(last) = runs.last_mut() {
            if s <= last.1 {
                last.1 = last.1.max(e);
                last.2.push(o.clone());
                continue;
            }
        }
        runs.push((s, e, vec![o.clone()]));
    }

    let working = match window {
        DayWindow::Open { open, close } => Some((open.minutes(), close.minutes())),
        _ => None,
    };

    let mut slots = Vec::new();
    let mut cursor = display_start;
    for (start, end, occupants) in runs {
        push_free(&mut slots, cursor, start, working, duration)?;
        push(&mut slots, start, end, SlotKind::Blocked, occupants)?;
        cursor = end;
    }
    push_free(&mut slots, cursor, display_end, working, duration)?;

    Ok(slots)
}

/// Split a free gap at the working-window edges.
fn push_free(
    slots: &mut Vec<Slot>,
    start: Minutes,
    end: Minutes,
    working: Option<(Minutes, Minutes)>,
    duration: Minutes,
) -> Result<(), EngineError> {
    if start >= end {
        return Ok(());
    }
    let Some((open, close)) = working else {
        return push(slots, start, end, SlotKind::OutsideHours, Vec::new());
    };

    push(slots, start, end.min(open), SlotKind::OutsideHours, Vec::new())?;

    let inner_start = start.max(open);
    let inner_end = end.min(close);
    if inner_start < inner_end {
        let kind = if inner_end - inner_start >= duration {
            SlotKind::Bookable
        } else {
            SlotKind::Blocked
        };
        push(slots, inner_start, inner_end, kind, Vec::new())?;
    }

    push(slots, start.max(close), end, SlotKind::OutsideHours, Vec::new())
}

fn push(
    slots: &mut Vec<Slot>,
    start: Minutes,
    end: Minutes,
    kind: SlotKind,
    occupants: Vec<Occupant>,
) -> Result<(), EngineError> {
    if start >= end {
        return Ok(());
    }
    slots.push(Slot {
        start_time: from_minutes(start)?,
        end_time: from_minutes(end)?,
        kind,
        occupants,
    });
    Ok(())
}

/// Start times, every `step` minutes, at which `duration` fits in a bookable slot.
pub fn bookable_starts(slots: &[Slot], duration: Minutes, step: Minutes) -> Vec<ClockTime> {
    let step = step.max(1);
    let mut starts = Vec::new();
    for slot in slots.iter().filter(|s| s.kind == SlotKind::Bookable) {
        let end = slot.end_time.minutes();
        let first = slot.start_time.minutes();
        let mut t = (first + step - 1) / step * step;
        while t + duration <= end {
            if let Ok(ct) = from_minutes(t) {
                starts.push(ct);
            }
            t += step;
        }
    }
    starts
}

pub fn occupants_from(bookings: &[Booking], time_off: &[&TimeOffBlock]) -> Vec<Occupant> {
    let booked = bookings.iter().filter(|b| b.is_active()).map(|b| Occupant {
        id: b.id.clone(),
        kind: OccupantKind::Booking,
        range: b.range(),
    });
    let blocks = time_off.iter().filter_map(|t| {
        TimeRange::new(t.start_time, t.end_time).ok().map(|range| Occupant {
            id: t.id.clone(),
            kind: OccupantKind::TimeOff,
            range,
        })
    });
    booked.chain(blocks).collect()
}

/// Load a resource's day and compute its slots for a booking of `duration` minutes.
pub fn compute_availability(
    conn: &Connection,
    resource_id: &str,
    date: NaiveDate,
    duration: Minutes,
) -> Result<Vec<Slot>, EngineError> {
    if duration <= 0 {
        return Err(EngineError::InvalidDuration(format!("{duration} minutes")));
    }

    let constraints = constraints::day_constraints(conn, resource_id, date)?;
    let bookings = queries::get_booked_for_resource_date(conn, resource_id, date)?;
    let time_off: Vec<&TimeOffBlock> = constraints.time_off_on(date).collect();

    let occupied = occupants_from(&bookings, &time_off);
    // A deactivated resource keeps its existing bookings but takes no new ones.
    let window = if constraints.resource.active {
        constraints.window_for(date)
    } else {
        DayWindow::DayOff
    };
    compute_slots(&window, duration, &occupied)
}
