//! Appointment booking core.
//!
//! Slot-conflict checking, availability over the daily template, the
//! status lifecycle and the booking service that ties them to storage.
//! Every mutation goes through `service`; the other modules are pure or
//! read-only.

pub mod availability;
pub mod conflict;
pub mod error;
pub mod lifecycle;
pub mod service;
pub mod slot;

pub use availability::{available_slots, get_available_slots};
pub use conflict::{ensure_slot_free, is_slot_taken};
pub use error::BookingError;
pub use lifecycle::{allowed_transitions, authorize_transition, validate_transition};
pub use service::*;
pub use slot::DailyTemplate;
