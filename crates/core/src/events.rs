//! Event type names published on the event bus.
//!
//! Dot-separated `<entity>.<verb>` names, matched by the notification router.

pub const BOOKING_SUBMITTED: &str = "booking.submitted";
pub const BOOKING_APPROVED: &str = "booking.approved";
pub const BOOKING_REJECTED: &str = "booking.rejected";

/// Entity type recorded as the event source for booking events.
pub const ENTITY_BOOKING: &str = "booking";
