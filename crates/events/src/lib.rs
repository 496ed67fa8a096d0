//! FleetFlow event bus and completion notification infrastructure.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the canonical domain event envelope.
//! - [`CompletionNotifier`]: the collaborator told when a load's pallets
//!   are all scanned, with [`dispatch_completion`] for fire-and-forget calls.
//! - [`delivery`]: external delivery channels (webhook).

pub mod bus;
pub mod delivery;
pub mod notifier;

pub use bus::{EventBus, PlatformEvent};
pub use delivery::webhook::WebhookNotifier;
pub use notifier::{
    dispatch_completion, BusNotifier, CompletionNotifier, FanoutNotifier, LoadCompletion,
    NotifyError, EVENT_LOAD_COMPLETED,
};
