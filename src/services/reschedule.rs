//! Drag and resize gestures on a calendar column, independent of any UI toolkit.
//!
//! A renderer feeds pointer events and a clock into [`Gesture`] and draws
//! whatever [`Gesture::preview`] returns. Nothing here performs I/O: a release
//! yields a [`CommitRequest`] which the caller sends to the booking API, then
//! reports the result back through [`Gesture::commit_resolved`].

use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::EngineError;
use crate::models::time::{clamp, from_minutes, snap, GRID_MINUTES, MINUTES_PER_DAY};
use crate::models::{Minutes, TimeRange};

#[derive(Debug, Clone)]
pub struct GestureConfig {
    /// How long the pointer must stay put before a booking is grabbed.
    pub hold_threshold_ms: u64,
    /// Movement allowed during the hold; more than this is a scroll.
    pub move_tolerance_px: f64,
    /// Height of one hour in the column.
    pub grid_height_px: f64,
    pub grid_minutes: Minutes,
    pub snap_tolerance_minutes: Minutes,
    pub min_duration_minutes: Minutes,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            hold_threshold_ms: 400,
            move_tolerance_px: 8.0,
            grid_height_px: 60.0,
            grid_minutes: GRID_MINUTES,
            snap_tolerance_minutes: 1,
            min_duration_minutes: 5,
        }
    }
}

impl GestureConfig {
    pub fn pixels_per_minute(&self) -> f64 {
        self.grid_height_px / 60.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureMode {
    Move,
    ResizeStart,
    ResizeEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Holding,
    Armed,
    Previewing,
    Committing,
    ConflictPrompt,
}

/// One rendered resource/day column.
#[derive(Debug, Clone)]
pub struct DayColumn {
    pub resource_id: String,
    pub date: NaiveDate,
    /// Visible range; y = 0 is `day_start`.
    pub day_start: Minutes,
    pub day_end: Minutes,
    pub day_off: bool,
    /// Booked ranges shown in the column, by booking id.
    pub bookings: Vec<(String, TimeRange)>,
}

impl DayColumn {
    /// Offsets are bounded to one day either side of `day_start`; NaN reads as 0.
    pub fn minute_at(&self, y_px: f64, config: &GestureConfig) -> Minutes {
        let day = f64::from(MINUTES_PER_DAY);
        let offset = (y_px / config.pixels_per_minute()).round().clamp(-day, day) as Minutes;
        self.day_start.saturating_add(offset)
    }

    /// Window boundaries plus every other booking's start and end.
    fn edges(&self, exclude_id: &str) -> Vec<Minutes> {
        let mut edges = vec![self.day_start, self.day_end];
        for (id, range) in &self.bookings {
            if id != exclude_id {
                edges.push(range.start.minutes());
                edges.push(range.end.minutes());
            }
        }
        edges
    }
}

/// The booking being dragged, at its last committed placement.
#[derive(Debug, Clone)]
pub struct GestureTarget {
    pub booking_id: String,
    pub resource_id: String,
    pub date: NaiveDate,
    pub start: Minutes,
    pub end: Minutes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub resource_id: String,
    pub date: NaiveDate,
    pub start: Minutes,
    pub end: Minutes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRequest {
    pub booking_id: String,
    pub resource_id: String,
    pub date: NaiveDate,
    pub start: Minutes,
    pub end: Minutes,
    pub force: bool,
}

/// How the booking API answered a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitResult {
    Accepted,
    Rejected { conflicting_booking_id: String },
    /// Transport failure, transient error or any other refusal.
    Failed,
}

/// Distance from `candidate` to the closest edge, if that edge is close
/// enough to capture it. Ties go to the earlier edge.
fn capture(candidate: Minutes, edges: &[Minutes], config: &GestureConfig) -> Option<Minutes> {
    let radius = config.grid_minutes + 2 * config.snap_tolerance_minutes;
    edges
        .iter()
        .map(|e| e - candidate)
        .filter(|d| 2 * d.abs() <= radius)
        .min_by_key(|d| (d.abs(), *d))
}

/// Snap a single time to an edge within the capture radius, otherwise to the grid.
pub fn snap_point(candidate: Minutes, edges: &[Minutes], config: &GestureConfig) -> Minutes {
    match capture(candidate, edges, config) {
        Some(d) => candidate + d,
        None => snap(candidate, config.grid_minutes),
    }
}

/// Snap a moved range. Either edge of the range may be captured; the closer wins
/// and the duration is kept. The result stays inside `[lo, hi]`.
pub fn snap_range(
    start: Minutes,
    duration: Minutes,
    edges: &[Minutes],
    (lo, hi): (Minutes, Minutes),
    config: &GestureConfig,
) -> Minutes {
    let start = clamp(start, lo, hi - duration);
    let by_start = capture(start, edges, config);
    let by_end = capture(start + duration, edges, config);
    let snapped = match (by_start, by_end) {
        (Some(a), Some(b)) => start + if b.abs() < a.abs() { b } else { a },
        (Some(d), None) | (None, Some(d)) => start + d,
        (None, None) => snap(start, config.grid_minutes),
    };
    clamp(snapped, lo, hi - duration)
}

#[derive(Debug)]
pub struct Gesture {
    config: GestureConfig,
    can_force: bool,
    phase: GesturePhase,
    mode: GestureMode,
    target: Option<GestureTarget>,
    preview: Option<Preview>,
    pending: Option<CommitRequest>,
    origin: (f64, f64),
    pressed_at_ms: u64,
    /// Minutes between the grabbed point and the booking start.
    grab_offset: Minutes,
}

impl Gesture {
    pub fn new(config: GestureConfig, can_force: bool) -> Self {
        Self {
            config,
            can_force,
            phase: GesturePhase::Idle,
            mode: GestureMode::Move,
            target: None,
            preview: None,
            pending: None,
            origin: (0.0, 0.0),
            pressed_at_ms: 0,
            grab_offset: 0,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn pointer_down(
        &mut self,
        target: GestureTarget,
        mode: GestureMode,
        column: &DayColumn,
        (x, y): (f64, f64),
        now_ms: u64,
    ) {
        if self.phase != GesturePhase::Idle {
            return;
        }
        self.grab_offset = column.minute_at(y, &self.config) - target.start;
        self.target = Some(target);
        self.mode = mode;
        self.origin = (x, y);
        self.pressed_at_ms = now_ms;
        self.phase = GesturePhase::Holding;
    }

    /// Advance the hold timer without pointer movement.
    pub fn tick(&mut self, now_ms: u64) {
        if self.phase == GesturePhase::Holding
            && now_ms.saturating_sub(self.pressed_at_ms) >= self.config.hold_threshold_ms
        {
            self.phase = GesturePhase::Armed;
        }
    }

    /// `column` is whichever column is under the pointer now.
    pub fn pointer_move(&mut self, column: &DayColumn, (x, y): (f64, f64), now_ms: u64) {
        if self.phase == GesturePhase::Holding {
            let (dx, dy) = (x - self.origin.0, y - self.origin.1);
            if dx.hypot(dy) > self.config.move_tolerance_px {
                self.reset();
                return;
            }
            self.tick(now_ms);
            return;
        }
        if !matches!(self.phase, GesturePhase::Armed | GesturePhase::Previewing) {
            return;
        }
        let Some(target) = &self.target else {
            return;
        };

        let pointer = column.minute_at(y, &self.config);
        let edges = column.edges(&target.booking_id);
        let window = (column.day_start, column.day_end);
        let min = self.config.min_duration_minutes;

        let (start, end) = match self.mode {
            GestureMode::Move => {
                let duration = target.end - target.start;
                let start = snap_range(pointer - self.grab_offset, duration, &edges, window, &self.config);
                (start, start + duration)
            }
            GestureMode::ResizeStart => {
                let hi = target.end - min;
                let start = clamp(pointer, window.0, hi);
                (clamp(snap_point(start, &edges, &self.config), window.0, hi), target.end)
            }
            GestureMode::ResizeEnd => {
                let lo = target.start + min;
                let end = clamp(pointer, lo, window.1);
                (target.start, clamp(snap_point(end, &edges, &self.config), lo, window.1))
            }
        };

        // Resizing stays on the original column.
        let (resource_id, date) = match self.mode {
            GestureMode::Move => (column.resource_id.clone(), column.date),
            _ => (target.resource_id.clone(), target.date),
        };

        self.preview = Some(Preview {
            resource_id,
            date,
            start,
            end,
        });
        self.phase = GesturePhase::Previewing;
    }

    /// Release. Returns the request to send, if any. Dropping on a day-off
    /// column fails here, before any network call, and reverts the preview.
    pub fn pointer_up(&mut self, column: &DayColumn) -> Result<Option<CommitRequest>, EngineError> {
        if self.phase != GesturePhase::Previewing {
            if self.phase != GesturePhase::Committing && self.phase != GesturePhase::ConflictPrompt {
                self.reset();
            }
            return Ok(None);
        }
        let (Some(target), Some(preview)) = (&self.target, &self.preview) else {
            self.reset();
            return Ok(None);
        };

        if column.day_off && self.mode == GestureMode::Move {
            let err = EngineError::ResourceUnavailable {
                resource_id: column.resource_id.clone(),
                date: column.date,
            };
            self.reset();
            return Err(err);
        }

        if preview.resource_id == target.resource_id
            && preview.date == target.date
            && preview.start == target.start
            && preview.end == target.end
        {
            // Dropped where it started.
            self.reset();
            return Ok(None);
        }

        if let Err(err) = from_minutes(preview.start).and_then(|_| from_minutes(preview.end)) {
            self.reset();
            return Err(err);
        }

        let request = CommitRequest {
            booking_id: target.booking_id.clone(),
            resource_id: preview.resource_id.clone(),
            date: preview.date,
            start: preview.start,
            end: preview.end,
            force: false,
        };
        self.pending = Some(request.clone());
        self.phase = GesturePhase::Committing;
        Ok(Some(request))
    }

    pub fn commit_resolved(&mut self, result: CommitResult) {
        if self.phase != GesturePhase::Committing {
            return;
        }
        match result {
            CommitResult::Accepted => {
                self.reset();
            }
            CommitResult::Rejected { .. } if self.pending.as_ref().is_some_and(|p| !p.force) => {
                self.phase = GesturePhase::ConflictPrompt;
            }
            // A forced commit that still failed, or anything else: revert.
            _ => self.reset(),
        }
    }

    /// Re-issue the rejected commit with the override flag. `None` outside a conflict prompt.
    pub fn confirm_override(&mut self) -> Result<Option<CommitRequest>, EngineError> {
        if self.phase != GesturePhase::ConflictPrompt {
            return Ok(None);
        }
        if !self.can_force {
            self.reset();
            return Err(EngineError::Unauthorized);
        }
        let Some(pending) = &mut self.pending else {
            self.reset();
            return Ok(None);
        };
        pending.force = true;
        let request = pending.clone();
        self.phase = GesturePhase::Committing;
        Ok(Some(request))
    }

    /// Abandon the gesture. Has no effect while a commit is in flight.
    pub fn cancel(&mut self) -> bool {
        if self.phase == GesturePhase::Committing {
            return false;
        }
        self.reset();
        true
    }

    fn reset(&mut self) {
        self.phase = GesturePhase::Idle;
        self.target = None;
        self.preview = None;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClockTime;

    fn m(s: &str) -> Minutes {
        ClockTime::parse(s).unwrap().minutes()
    }

    fn range(a: &str, b: &str) -> TimeRange {
        TimeRange::new(ClockTime::parse(a).unwrap(), ClockTime::parse(b).unwrap()).unwrap()
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
    }

    /// 06:00–23:00 at one pixel per minute.
    fn column(resource_id: &str, day_off: bool) -> DayColumn {
        DayColumn {
            resource_id: resource_id.into(),
            date: monday(),
            day_start: m("06:00"),
            day_end: m("23:00"),
            day_off,
            bookings: vec![
                ("other".into(), range("09:30", "10:00")),
                ("mine".into(), range("11:00", "11:30")),
            ],
        }
    }

    fn y(col: &DayColumn, time: &str) -> f64 {
        (m(time) - col.day_start) as f64
    }

    fn target() -> GestureTarget {
        GestureTarget {
            booking_id: "mine".into(),
            resource_id: "res-1".into(),
            date: monday(),
            start: m("11:00"),
            end: m("11:30"),
        }
    }

    /// Grab the booking at its start edge and wait out the hold.
    fn armed(mode: GestureMode) -> (Gesture, DayColumn) {
        let col = column("res-1", false);
        let mut g = Gesture::new(GestureConfig::default(), false);
        let grab = match mode {
            GestureMode::ResizeEnd => y(&col, "11:30"),
            _ => y(&col, "11:00"),
        };
        g.pointer_down(target(), mode, &col, (10.0, grab), 0);
        g.tick(500);
        assert_eq!(g.phase(), GesturePhase::Armed);
        (g, col)
    }

    #[test]
    fn booking_edge_beats_the_grid() {
        let config = GestureConfig::default();
        let edges = [m("10:00")];
        assert_eq!(snap_point(m("10:03"), &edges, &config), m("10:00"));
        assert_eq!(snap_point(m("10:04"), &edges, &config), m("10:05"));
        assert_eq!(snap_point(m("10:12"), &edges, &config), m("10:10"));
    }

    #[test]
    fn drag_to_ten_oh_three_snaps_to_the_booking_end() {
        let (mut g, col) = armed(GestureMode::Move);
        g.pointer_move(&col, (10.0, y(&col, "10:03")), 600);
        let p = g.preview().unwrap();
        assert_eq!((p.start, p.end), (m("10:00"), m("10:30")));
    }

    #[test]
    fn snapping_is_deterministic() {
        let config = GestureConfig::default();
        let edges = [m("06:00"), m("09:30"), m("10:00"), m("23:00")];
        for candidate in m("06:00")..m("22:30") {
            let first = snap_range(candidate, 30, &edges, (m("06:00"), m("23:00")), &config);
            for _ in 0..3 {
                assert_eq!(
                    snap_range(candidate, 30, &edges, (m("06:00"), m("23:00")), &config),
                    first
                );
            }
            assert!(first >= m("06:00") && first + 30 <= m("23:00"));
        }
    }

    #[test]
    fn move_is_clamped_to_the_visible_day() {
        let (mut g, col) = armed(GestureMode::Move);
        g.pointer_move(&col, (10.0, y(&col, "23:00") + 200.0), 600);
        let p = g.preview().unwrap();
        assert_eq!((p.start, p.end), (m("22:30"), m("23:00")));

        g.pointer_move(&col, (10.0, -500.0), 700);
        assert_eq!(g.preview().unwrap().start, m("06:00"));
    }

    #[test]
    fn pointer_far_outside_the_column_is_bounded() {
        let col = column("res-1", false);
        let config = GestureConfig::default();
        assert_eq!(col.minute_at(f64::MAX, &config), col.day_start + MINUTES_PER_DAY);
        assert_eq!(col.minute_at(f64::MIN, &config), col.day_start - MINUTES_PER_DAY);
        assert_eq!(col.minute_at(f64::NAN, &config), col.day_start);

        let flat = GestureConfig {
            grid_height_px: 0.0,
            ..GestureConfig::default()
        };
        assert_eq!(col.minute_at(30.0, &flat), col.day_start + MINUTES_PER_DAY);

        let (mut g, col) = armed(GestureMode::Move);
        g.pointer_move(&col, (10.0, f64::MAX), 600);
        let p = g.preview().unwrap();
        assert_eq!((p.start, p.end), (m("22:30"), m("23:00")));
    }

    #[test]
    fn unrepresentable_drop_reverts_the_preview() {
        let col = DayColumn {
            resource_id: "res-1".into(),
            date: monday(),
            day_start: m("06:00"),
            day_end: MINUTES_PER_DAY,
            day_off: false,
            bookings: vec![],
        };
        let long = GestureTarget {
            booking_id: "long".into(),
            resource_id: "res-1".into(),
            date: monday(),
            start: m("05:00"),
            end: MINUTES_PER_DAY,
        };
        let mut g = Gesture::new(GestureConfig::default(), false);
        g.pointer_down(long, GestureMode::Move, &col, (10.0, 0.0), 0);
        g.tick(500);
        g.pointer_move(&col, (10.0, 10.0), 600);
        let p = g.preview().unwrap();
        assert!(p.end > MINUTES_PER_DAY, "end {}", p.end);

        assert!(matches!(g.pointer_up(&col), Err(EngineError::InvalidTimeFormat(_))));
        assert_eq!(g.phase(), GesturePhase::Idle);
        assert!(g.preview().is_none());
    }

    #[test]
    fn early_movement_is_a_scroll() {
        let col = column("res-1", false);
        let mut g = Gesture::new(GestureConfig::default(), false);
        g.pointer_down(target(), GestureMode::Move, &col, (10.0, y(&col, "11:00")), 0);
        g.pointer_move(&col, (10.0, y(&col, "11:00") + 40.0), 100);
        assert_eq!(g.phase(), GesturePhase::Idle);
        assert!(g.preview().is_none());
    }

    #[test]
    fn small_jitter_during_hold_still_arms() {
        let col = column("res-1", false);
        let mut g = Gesture::new(GestureConfig::default(), false);
        g.pointer_down(target(), GestureMode::Move, &col, (10.0, y(&col, "11:00")), 0);
        g.pointer_move(&col, (12.0, y(&col, "11:00") + 3.0), 200);
        assert_eq!(g.phase(), GesturePhase::Holding);
        g.pointer_move(&col, (12.0, y(&col, "11:00") + 3.0), 450);
        assert_eq!(g.phase(), GesturePhase::Armed);
    }

    #[test]
    fn resize_keeps_the_opposite_edge_and_minimum_length() {
        let (mut g, col) = armed(GestureMode::ResizeEnd);
        g.pointer_move(&col, (10.0, y(&col, "12:10")), 600);
        let p = g.preview().unwrap();
        assert_eq!((p.start, p.end), (m("11:00"), m("12:10")));

        g.pointer_move(&col, (10.0, y(&col, "10:00")), 700);
        let p = g.preview().unwrap();
        assert_eq!((p.start, p.end), (m("11:00"), m("11:05")));

        let (mut g, col) = armed(GestureMode::ResizeStart);
        g.pointer_move(&col, (10.0, y(&col, "10:02")), 600);
        let p = g.preview().unwrap();
        assert_eq!((p.start, p.end), (m("10:00"), m("11:30")));
    }

    #[test]
    fn release_commits_then_accepts() {
        let (mut g, col) = armed(GestureMode::Move);
        g.pointer_move(&col, (10.0, y(&col, "14:00")), 600);
        let req = g.pointer_up(&col).unwrap().unwrap();
        assert_eq!(req.start, m("14:00"));
        assert!(!req.force);
        assert_eq!(g.phase(), GesturePhase::Committing);

        // No new input while in flight.
        assert!(!g.cancel());
        g.pointer_move(&col, (10.0, y(&col, "15:00")), 700);
        assert_eq!(g.preview().unwrap().start, m("14:00"));

        g.commit_resolved(CommitResult::Accepted);
        assert_eq!(g.phase(), GesturePhase::Idle);
    }

    #[test]
    fn conflict_prompt_override_requires_capability() {
        let (mut g, col) = armed(GestureMode::Move);
        g.pointer_move(&col, (10.0, y(&col, "09:40")), 600);
        g.pointer_up(&col).unwrap().unwrap();
        g.commit_resolved(CommitResult::Rejected {
            conflicting_booking_id: "other".into(),
        });
        assert_eq!(g.phase(), GesturePhase::ConflictPrompt);

        assert!(matches!(g.confirm_override(), Err(EngineError::Unauthorized)));
        assert_eq!(g.phase(), GesturePhase::Idle);
        assert!(g.preview().is_none());
    }

    #[test]
    fn staff_override_reissues_with_force() {
        let col = column("res-1", false);
        let mut g = Gesture::new(GestureConfig::default(), true);
        g.pointer_down(target(), GestureMode::Move, &col, (10.0, y(&col, "11:00")), 0);
        g.tick(400);
        g.pointer_move(&col, (10.0, y(&col, "09:40")), 600);
        let first = g.pointer_up(&col).unwrap().unwrap();
        g.commit_resolved(CommitResult::Rejected {
            conflicting_booking_id: "other".into(),
        });

        let forced = g.confirm_override().unwrap().unwrap();
        assert!(forced.force);
        assert_eq!((forced.start, forced.end), (first.start, first.end));
        assert_eq!(g.phase(), GesturePhase::Committing);
        g.commit_resolved(CommitResult::Accepted);
        assert_eq!(g.phase(), GesturePhase::Idle);
    }

    #[test]
    fn failure_reverts_the_preview() {
        let (mut g, col) = armed(GestureMode::Move);
        g.pointer_move(&col, (10.0, y(&col, "14:00")), 600);
        g.pointer_up(&col).unwrap();
        g.commit_resolved(CommitResult::Failed);
        assert_eq!(g.phase(), GesturePhase::Idle);
        assert!(g.preview().is_none());
    }

    #[test]
    fn conflict_prompt_cancel_reverts() {
        let (mut g, col) = armed(GestureMode::Move);
        g.pointer_move(&col, (10.0, y(&col, "09:40")), 600);
        g.pointer_up(&col).unwrap();
        g.commit_resolved(CommitResult::Rejected {
            conflicting_booking_id: "other".into(),
        });
        assert!(g.cancel());
        assert_eq!(g.phase(), GesturePhase::Idle);
        assert!(g.preview().is_none());
    }

    #[test]
    fn cross_resource_drop_retargets_and_day_off_fails_locally() {
        let (mut g, _) = armed(GestureMode::Move);
        let other = column("res-2", false);
        g.pointer_move(&other, (300.0, y(&other, "14:00")), 600);
        let req = g.pointer_up(&other).unwrap().unwrap();
        assert_eq!(req.resource_id, "res-2");

        let (mut g, _) = armed(GestureMode::Move);
        let off = column("res-3", true);
        g.pointer_move(&off, (600.0, y(&off, "14:00")), 600);
        assert!(matches!(
            g.pointer_up(&off),
            Err(EngineError::ResourceUnavailable { .. })
        ));
        assert_eq!(g.phase(), GesturePhase::Idle);
    }

    #[test]
    fn release_in_place_commits_nothing() {
        let (mut g, col) = armed(GestureMode::Move);
        g.pointer_move(&col, (10.0, y(&col, "11:00")), 600);
        assert_eq!(g.pointer_up(&col).unwrap(), None);
        assert_eq!(g.phase(), GesturePhase::Idle);
    }
}
