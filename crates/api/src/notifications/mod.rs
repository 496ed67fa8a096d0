//! Event bus subscribers owned by the API process.
//!
//! [`CompletionLog`] records every `load.completed` event in the service log
//! so dispatch operators can see completions without a webhook configured.

use fleetflow_events::{PlatformEvent, EVENT_LOAD_COMPLETED};
use tokio::sync::broadcast;

/// Logs load completion events published on the bus.
#[derive(Debug, Default)]
pub struct CompletionLog {
    seen: u64,
}

impl CompletionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run until the bus is closed. Returns how many completions were logged.
    pub async fn run(mut self, mut receiver: broadcast::Receiver<PlatformEvent>) -> u64 {
        loop {
            match receiver.recv().await {
                Ok(event) => self.handle(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Completion log lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!(
                        logged = self.seen,
                        "Event bus closed, completion log shutting down"
                    );
                    break;
                }
            }
        }
        self.seen
    }

    fn handle(&mut self, event: &PlatformEvent) {
        if event.event_type != EVENT_LOAD_COMPLETED {
            return;
        }
        self.seen += 1;
        tracing::info!(
            event_id = %event.event_id,
            load_id = event.source_entity_id.as_deref().unwrap_or("unknown"),
            scanned = %event.payload["scannedCount"],
            expected = %event.payload["expectedCount"],
            "Load completed",
        );
    }
}
