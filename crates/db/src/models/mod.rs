//! Entity models and DTOs, one module per table.

pub mod booking;
pub mod notification;
pub mod session;
pub mod user;
