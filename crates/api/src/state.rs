use std::sync::Arc;

use tokio::sync::Mutex;
use venuebook_db::Store;
use venuebook_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Active persistence backend (Postgres or in-memory).
    pub store: Arc<dyn Store>,
    /// Server configuration (JWT settings are read by the auth extractor).
    pub config: Arc<ServerConfig>,
    /// Event bus for booking lifecycle events.
    pub event_bus: Arc<EventBus>,
    /// Serializes admin decisions within this process.
    pub decision_lock: Arc<Mutex<()>>,
}
