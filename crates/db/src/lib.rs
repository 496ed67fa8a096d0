//! In-process storage for FleetFlow.
//!
//! The store is a process-local [`MemoryDb`] shared through a cloneable
//! [`DbPool`] handle. State does not survive a restart.

pub mod models;
pub mod repositories;
pub mod seed;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use fleetflow_core::error::CoreError;
use fleetflow_core::types::LoadId;
use tokio::sync::RwLock;

use crate::models::load_pallet::LoadPalletAssignment;

/// How long a health probe waits for the store lock.
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Cloneable handle to the shared store.
pub type DbPool = Arc<MemoryDb>;

/// Process-local collections, one lock per collection.
///
/// Every repository call takes the lock once for its whole
/// read-modify-write, so concurrent calls on the same key are serialized.
#[derive(Debug, Default)]
pub struct MemoryDb {
    pub(crate) load_pallets: RwLock<HashMap<LoadId, LoadPalletAssignment>>,
}

/// Create an empty store.
pub fn create_pool() -> DbPool {
    Arc::new(MemoryDb::default())
}

/// Verify the store lock can be acquired in reasonable time.
pub async fn health_check(pool: &MemoryDb) -> Result<(), CoreError> {
    let guard = tokio::time::timeout(HEALTH_CHECK_TIMEOUT, pool.load_pallets.read())
        .await
        .map_err(|_| CoreError::Internal("load-pallet store lock unavailable".into()))?;
    tracing::debug!(assignments = guard.len(), "Store health check passed");
    Ok(())
}
