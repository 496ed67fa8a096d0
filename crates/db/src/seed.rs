//! Demo rows for local development and dashboard previews.
//!
//! Loaded at startup when `SEED_DEMO_DATA` is enabled. Rows go through the
//! repository so they obey the same validation and status rules as live
//! traffic.

use fleetflow_core::error::CoreError;
use fleetflow_core::load_pallet::LoadStatus;

use crate::models::load_pallet::ProgressChange;
use crate::repositories::LoadPalletRepo;
use crate::MemoryDb;

/// `(load_id, pallet_ids, scanned_count, explicit_status)`
type DemoLoad = (&'static str, &'static [&'static str], u32, Option<LoadStatus>);

const DEMO_LOADS: &[DemoLoad] = &[
    ("MKT-001", &["PLT-DAL-001", "PLT-DAL-002", "PLT-DAL-003"], 0, None),
    ("MKT-002", &["PLT-HOU-001", "PLT-HOU-002", "PLT-HOU-003", "PLT-HOU-004"], 2, None),
    ("MKT-003", &["PLT-ATL-001", "PLT-ATL-002"], 2, None),
    ("MKT-004", &["PLT-PHX-001", "PLT-PHX-002", "PLT-PHX-003"], 1, Some(LoadStatus::Error)),
];

/// Insert the demo loads. Returns how many rows were written.
pub async fn seed_demo_data(pool: &MemoryDb) -> Result<usize, CoreError> {
    for (load_id, pallet_ids, scanned, status) in DEMO_LOADS {
        let pallet_ids = pallet_ids.iter().map(|p| p.to_string()).collect();
        LoadPalletRepo::upsert(pool, load_id, pallet_ids).await?;

        if *scanned > 0 || status.is_some() {
            let change = ProgressChange {
                scanned_count: Some(*scanned),
                status: *status,
            };
            LoadPalletRepo::record_progress(pool, load_id, change).await?;
        }
    }

    tracing::info!(count = DEMO_LOADS.len(), "Seeded demo load-pallet assignments");
    Ok(DEMO_LOADS.len())
}
