use std::sync::Arc;

use fleetflow_events::{CompletionNotifier, EventBus};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is a shared handle.
#[derive(Clone)]
pub struct AppState {
    /// Load-pallet store.
    pub pool: fleetflow_db::DbPool,
    /// Event bus the completion notifier publishes to.
    pub event_bus: Arc<EventBus>,
    /// Receives load completion notifications.
    pub notifier: Arc<dyn CompletionNotifier>,
}
