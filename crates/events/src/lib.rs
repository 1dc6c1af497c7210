//! Venue booking event bus.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PortalEvent`] -- the domain event envelope published on every booking
//!   transition.

pub mod bus;

pub use bus::{EventBus, PortalEvent};
