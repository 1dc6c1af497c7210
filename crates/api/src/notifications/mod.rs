//! Notification routing infrastructure.
//!
//! The [`NotificationRouter`] subscribes to the event bus and writes
//! in-app notifications for booking lifecycle events.

pub mod router;

pub use router::NotificationRouter;
