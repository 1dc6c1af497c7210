//! Domain core for the venue booking portal.
//!
//! This crate has zero internal dependencies so the booking rules can be
//! shared by the repository layer, the HTTP API, and any future tooling.

pub mod booking;
pub mod catalog;
pub mod error;
pub mod events;
pub mod notification;
pub mod roles;
pub mod time_slot;
pub mod types;
