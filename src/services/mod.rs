pub mod availability;
pub mod bookings;
pub mod calendar;
pub mod catalog;
pub mod constraints;
pub mod identity;
pub mod propagation;
pub mod reschedule;
pub mod resources;
pub mod scheduling;
