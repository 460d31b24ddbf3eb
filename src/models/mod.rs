pub mod availability;
pub mod booking;
pub mod change;
pub mod resource;
pub mod time;

pub use availability::{DayWindow, Occupant, OccupantKind, Slot, SlotKind};
pub use booking::{Booking, BookingStatus, NewBooking, ProposalOutcome};
pub use change::{ChangeEvent, ChangeKind, PreviousPlacement};
pub use resource::{Resource, TimeOffBlock, Vacation, WorkingHoursEntry};
pub use time::{ClockTime, Minutes, TimeRange};
