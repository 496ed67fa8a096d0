//! Load completion notifications.
//!
//! A [`CompletionNotifier`] is told when a load's scanned count reaches its
//! expected count. Notifications are best-effort: [`dispatch_completion`]
//! runs them on a detached task and only logs failures, so the update that
//! triggered them never waits on or fails because of the notifier.

use std::sync::Arc;

use async_trait::async_trait;
use fleetflow_core::types::LoadId;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::bus::{EventBus, PlatformEvent};
use crate::delivery::webhook::WebhookError;

/// Event type published when a load completes.
pub const EVENT_LOAD_COMPLETED: &str = "load.completed";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Payload of a completion notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadCompletion {
    pub load_id: LoadId,
    pub scanned_count: u32,
    pub expected_count: u32,
}

impl LoadCompletion {
    pub fn new(load_id: impl Into<LoadId>, scanned_count: u32, expected_count: u32) -> Self {
        Self {
            load_id: load_id.into(),
            scanned_count,
            expected_count,
        }
    }
}

/// Error type for notification failures.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Webhook delivery failed after all retries.
    #[error(transparent)]
    Webhook(#[from] WebhookError),

    /// The payload could not be encoded.
    #[error("Failed to encode notification payload: {0}")]
    Encode(#[from] serde_json::Error),

    /// Some notifiers in a fan-out failed.
    #[error("{failed} of {total} notifiers failed")]
    Partial { failed: usize, total: usize },
}

/// Receiver of load completion notifications.
#[async_trait]
pub trait CompletionNotifier: Send + Sync {
    /// Tell the collaborator that `completion.load_id` is fully scanned.
    async fn notify_load_complete(&self, completion: &LoadCompletion) -> Result<(), NotifyError>;
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Send a completion notification on a detached task.
///
/// Failures are logged, never returned. The handle is only useful to tests
/// that need to wait for delivery.
pub fn dispatch_completion(
    notifier: Arc<dyn CompletionNotifier>,
    completion: LoadCompletion,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match notifier.notify_load_complete(&completion).await {
            Ok(()) => tracing::debug!(
                load_id = %completion.load_id,
                scanned = completion.scanned_count,
                expected = completion.expected_count,
                "Load completion notification sent"
            ),
            Err(e) => tracing::warn!(
                load_id = %completion.load_id,
                error = %e,
                "Load completion notification failed"
            ),
        }
    })
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

/// Publishes completions on the in-process [`EventBus`].
pub struct BusNotifier {
    bus: Arc<EventBus>,
}

impl BusNotifier {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl CompletionNotifier for BusNotifier {
    async fn notify_load_complete(&self, completion: &LoadCompletion) -> Result<(), NotifyError> {
        let event = PlatformEvent::new(EVENT_LOAD_COMPLETED)
            .with_source("load", completion.load_id.clone())
            .with_payload(serde_json::to_value(completion)?);
        let receivers = self.bus.publish(event);
        tracing::debug!(receivers, load_id = %completion.load_id, "Published load completion");
        Ok(())
    }
}

/// Forwards each completion to several notifiers.
///
/// Every notifier is attempted even if an earlier one fails.
pub struct FanoutNotifier {
    notifiers: Vec<Arc<dyn CompletionNotifier>>,
}

impl FanoutNotifier {
    pub fn new(notifiers: Vec<Arc<dyn CompletionNotifier>>) -> Self {
        Self { notifiers }
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

#[async_trait]
impl CompletionNotifier for FanoutNotifier {
    async fn notify_load_complete(&self, completion: &LoadCompletion) -> Result<(), NotifyError> {
        let mut failed = 0;
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify_load_complete(completion).await {
                tracing::warn!(load_id = %completion.load_id, error = %e, "Notifier failed");
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(NotifyError::Partial {
                failed,
                total: self.notifiers.len(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
