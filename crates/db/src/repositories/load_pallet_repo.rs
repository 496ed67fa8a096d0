//! Repository for the load-pallet assignment collection.
//!
//! Provides manifest upserts, progress updates with status derivation,
//! filtered listing with a dashboard summary, deletion, and per-pallet
//! detail views.

use chrono::Utc;
use fleetflow_core::error::CoreError;
use fleetflow_core::load_pallet::{
    completion_percentage, derive_status, normalize_load_id, remaining, validate_manifest,
    LoadStatus,
};

use crate::models::load_pallet::{
    LoadPalletAssignment, LoadPalletFilter, LoadPalletListing, PalletDetail, PalletDetailRow,
    PalletDetailSummary, PalletScanStatus, ProgressChange, ProgressUpdate, StatusSummary,
    UpsertOutcome,
};
use crate::MemoryDb;

/// Provides CRUD and progress operations for load-pallet assignments.
pub struct LoadPalletRepo;

impl LoadPalletRepo {
    /// List assignments matching `filter`, newest first.
    ///
    /// Ties on `last_updated` are broken by `load_id` so output is stable.
    /// The summary always covers every stored assignment; `total` counts the
    /// filtered rows.
    pub async fn list(pool: &MemoryDb, filter: &LoadPalletFilter) -> LoadPalletListing {
        let (mut assignments, summary): (Vec<LoadPalletAssignment>, StatusSummary) = {
            let map = pool.load_pallets.read().await;
            let summary = StatusSummary::from_assignments(map.values());
            let rows = map.values().filter(|a| filter.matches(a)).cloned().collect();
            (rows, summary)
        };

        assignments.sort_by(|a, b| {
            b.last_updated
                .cmp(&a.last_updated)
                .then_with(|| a.load_id.cmp(&b.load_id))
        });

        LoadPalletListing {
            total: assignments.len(),
            assignments,
            summary,
        }
    }

    /// Find an assignment by its load ID.
    pub async fn find_by_load_id(pool: &MemoryDb, load_id: &str) -> Option<LoadPalletAssignment> {
        let load_id = normalize_load_id(load_id);
        pool.load_pallets.read().await.get(load_id).cloned()
    }

    /// Create an assignment or replace an existing load's manifest.
    ///
    /// The manifest is validated before the store is touched, so a rejected
    /// call leaves no trace. Replacing a manifest keeps `scanned_count` and
    /// `status`; only progress updates move the status.
    pub async fn upsert(
        pool: &MemoryDb,
        load_id: &str,
        pallet_ids: Vec<String>,
    ) -> Result<UpsertOutcome, CoreError> {
        let load_id = normalize_load_id(load_id);
        validate_manifest(load_id, &pallet_ids)?;
        let expected_count = manifest_len(&pallet_ids)?;
        let now = Utc::now();

        let mut map = pool.load_pallets.write().await;

        if let Some(existing) = map.get_mut(load_id) {
            existing.pallet_ids = pallet_ids;
            existing.expected_count = expected_count;
            existing.last_updated = now;
            return Ok(UpsertOutcome {
                assignment: existing.clone(),
                created: false,
            });
        }

        let assignment = LoadPalletAssignment {
            load_id: load_id.to_string(),
            pallet_ids,
            expected_count,
            scanned_count: 0,
            status: LoadStatus::Pending,
            last_updated: now,
        };
        map.insert(assignment.load_id.clone(), assignment.clone());

        Ok(UpsertOutcome {
            assignment,
            created: true,
        })
    }

    /// Apply a partial progress update to an existing load.
    ///
    /// An explicit status always wins. Otherwise a new scan count re-derives
    /// the status from the completion ratio.
    pub async fn record_progress(
        pool: &MemoryDb,
        load_id: &str,
        change: ProgressChange,
    ) -> Result<ProgressUpdate, CoreError> {
        if change.scanned_count.is_none() && change.status.is_none() {
            return Err(CoreError::validation(
                "At least one of scannedCount or status is required",
            ));
        }

        let load_id = normalize_load_id(load_id);
        let mut map = pool.load_pallets.write().await;
        let assignment = map
            .get_mut(load_id)
            .ok_or_else(|| CoreError::load_not_found(load_id))?;

        let previous_status = assignment.status;

        if let Some(scanned) = change.scanned_count {
            assignment.scanned_count = scanned;
        }

        assignment.status = match change.status {
            Some(explicit) => explicit,
            None => derive_status(
                assignment.status,
                assignment.scanned_count,
                assignment.expected_count,
            ),
        };
        assignment.last_updated = Utc::now();

        Ok(ProgressUpdate {
            assignment: assignment.clone(),
            previous_status,
        })
    }

    /// Remove a load and return the removed record.
    ///
    /// Deleting an unknown (or already deleted) load is an error.
    pub async fn remove(
        pool: &MemoryDb,
        load_id: &str,
    ) -> Result<LoadPalletAssignment, CoreError> {
        let load_id = normalize_load_id(load_id);
        pool.load_pallets
            .write()
            .await
            .remove(load_id)
            .ok_or_else(|| CoreError::load_not_found(load_id))
    }

    /// Per-pallet breakdown of a load.
    ///
    /// There is no per-pallet scan ledger, so the first `scanned_count`
    /// manifest entries are reported as scanned. The summary reconciles the
    /// totals.
    pub async fn pallet_detail(
        pool: &MemoryDb,
        load_id: &str,
    ) -> Result<PalletDetail, CoreError> {
        let load_id = normalize_load_id(load_id);
        let assignment = Self::find_by_load_id(pool, load_id)
            .await
            .ok_or_else(|| CoreError::load_not_found(load_id))?;

        let scanned_rows = assignment.scanned_count.min(assignment.expected_count) as usize;
        let pallets = assignment
            .pallet_ids
            .iter()
            .enumerate()
            .map(|(index, pallet_id)| {
                let scanned = index < scanned_rows;
                PalletDetailRow {
                    pallet_id: pallet_id.clone(),
                    expected: true,
                    scanned,
                    status: if scanned {
                        PalletScanStatus::Scanned
                    } else {
                        PalletScanStatus::Pending
                    },
                }
            })
            .collect();

        let expected = assignment.expected_count;
        let scanned = assignment.scanned_count;

        Ok(PalletDetail {
            load_id: assignment.load_id,
            pallets,
            summary: PalletDetailSummary {
                expected,
                scanned,
                remaining: remaining(scanned, expected),
                completion_percentage: completion_percentage(scanned, expected),
            },
        })
    }
}

fn manifest_len(pallet_ids: &[String]) -> Result<u32, CoreError> {
    u32::try_from(pallet_ids.len())
        .map_err(|_| CoreError::validation("palletIds contains too many entries"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;
    use crate::create_pool;

    fn pallets(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn dallas() -> Vec<String> {
        pallets(&["PLT-DAL-001", "PLT-DAL-002", "PLT-DAL-003"])
    }

    fn scanned(count: u32) -> ProgressChange {
        ProgressChange {
            scanned_count: Some(count),
            status: None,
        }
    }

    fn by_load(load_id: &str) -> LoadPalletFilter {
        LoadPalletFilter {
            load_id: Some(load_id.to_string()),
            status: None,
        }
    }

    #[tokio::test]
    async fn upsert_creates_pending_assignment() {
        let pool = create_pool();
        let outcome = LoadPalletRepo::upsert(&pool, "MKT-001", dallas()).await.unwrap();

        assert!(outcome.created);
        assert_eq!(outcome.assignment.expected_count, 3);
        assert_eq!(outcome.assignment.scanned_count, 0);
        assert_eq!(outcome.assignment.status, LoadStatus::Pending);

        let listing = LoadPalletRepo::list(&pool, &by_load("MKT-001")).await;
        assert_eq!(listing.total, 1);
        assert_eq!(listing.assignments[0].expected_count, 3);
    }

    #[tokio::test]
    async fn invalid_pallets_leave_store_untouched() {
        let pool = create_pool();
        let err = LoadPalletRepo::upsert(&pool, "MKT-001", pallets(&["PLT-1", "BOX-2"]))
            .await
            .unwrap_err();

        assert_matches!(err, CoreError::Validation { .. });
        assert!(LoadPalletRepo::find_by_load_id(&pool, "MKT-001").await.is_none());
    }

    #[tokio::test]
    async fn invalid_replacement_keeps_previous_manifest() {
        let pool = create_pool();
        LoadPalletRepo::upsert(&pool, "MKT-001", dallas()).await.unwrap();

        let result = LoadPalletRepo::upsert(&pool, "MKT-001", pallets(&["CRATE-1"])).await;
        assert!(result.is_err());

        let stored = LoadPalletRepo::find_by_load_id(&pool, "MKT-001").await.unwrap();
        assert_eq!(stored.pallet_ids, dallas());
    }

    #[tokio::test]
    async fn upsert_replaces_manifest_and_keeps_progress() {
        let pool = create_pool();
        LoadPalletRepo::upsert(&pool, "MKT-001", dallas()).await.unwrap();
        LoadPalletRepo::record_progress(&pool, "MKT-001", scanned(2)).await.unwrap();

        let outcome = LoadPalletRepo::upsert(
            &pool,
            "MKT-001",
            pallets(&["PLT-DAL-001", "PLT-DAL-002", "PLT-DAL-003", "PLT-DAL-004"]),
        )
        .await
        .unwrap();

        assert!(!outcome.created);
        assert_eq!(outcome.assignment.expected_count, 4);
        assert_eq!(outcome.assignment.scanned_count, 2);
        assert_eq!(outcome.assignment.status, LoadStatus::InProgress);
    }

    #[tokio::test]
    async fn repeated_upsert_is_idempotent_on_counts() {
        let pool = create_pool();
        let first = LoadPalletRepo::upsert(&pool, "MKT-001", dallas()).await.unwrap();
        let second = LoadPalletRepo::upsert(&pool, "MKT-001", dallas()).await.unwrap();

        assert_eq!(first.assignment.expected_count, second.assignment.expected_count);
        assert_eq!(first.assignment.scanned_count, second.assignment.scanned_count);
        assert_eq!(LoadPalletRepo::list(&pool, &LoadPalletFilter::default()).await.total, 1);
    }

    #[tokio::test]
    async fn progress_walks_the_state_machine() {
        let pool = create_pool();
        LoadPalletRepo::upsert(&pool, "MKT-001", dallas()).await.unwrap();

        let update = LoadPalletRepo::record_progress(&pool, "MKT-001", scanned(2)).await.unwrap();
        assert_eq!(update.assignment.status, LoadStatus::InProgress);
        assert!(!update.completed_now());

        let update = LoadPalletRepo::record_progress(&pool, "MKT-001", scanned(3)).await.unwrap();
        assert_eq!(update.assignment.status, LoadStatus::Completed);
        assert!(update.completed_now());

        let again = LoadPalletRepo::record_progress(&pool, "MKT-001", scanned(3)).await.unwrap();
        assert_eq!(again.assignment.status, LoadStatus::Completed);
        assert!(!again.completed_now());
    }

    #[tokio::test]
    async fn explicit_status_overrides_ratio() {
        let pool = create_pool();
        LoadPalletRepo::upsert(&pool, "MKT-001", dallas()).await.unwrap();

        let change = ProgressChange {
            scanned_count: Some(1),
            status: Some(LoadStatus::Completed),
        };
        let update = LoadPalletRepo::record_progress(&pool, "MKT-001", change).await.unwrap();
        assert_eq!(update.assignment.scanned_count, 1);
        assert_eq!(update.assignment.status, LoadStatus::Completed);
        assert!(update.completed_now());
    }

    #[tokio::test]
    async fn status_only_update_keeps_scan_count() {
        let pool = create_pool();
        LoadPalletRepo::upsert(&pool, "MKT-001", dallas()).await.unwrap();
        LoadPalletRepo::record_progress(&pool, "MKT-001", scanned(2)).await.unwrap();

        let change = ProgressChange {
            scanned_count: None,
            status: Some(LoadStatus::Error),
        };
        let update = LoadPalletRepo::record_progress(&pool, "MKT-001", change).await.unwrap();
        assert_eq!(update.assignment.scanned_count, 2);
        assert_eq!(update.assignment.status, LoadStatus::Error);
        assert_eq!(update.previous_status, LoadStatus::InProgress);
    }

    #[tokio::test]
    async fn empty_progress_change_rejected() {
        let pool = create_pool();
        LoadPalletRepo::upsert(&pool, "MKT-001", dallas()).await.unwrap();

        let err = LoadPalletRepo::record_progress(&pool, "MKT-001", ProgressChange::default())
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation { .. });
    }

    #[tokio::test]
    async fn progress_on_unknown_load_is_not_found() {
        let pool = create_pool();
        LoadPalletRepo::upsert(&pool, "MKT-001", dallas()).await.unwrap();
        let before = LoadPalletRepo::list(&pool, &LoadPalletFilter::default()).await;

        let err = LoadPalletRepo::record_progress(&pool, "MKT-999", scanned(1))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::NotFound { id, .. } if id == "MKT-999");

        let after = LoadPalletRepo::list(&pool, &LoadPalletFilter::default()).await;
        assert_eq!(before.assignments, after.assignments);
    }

    #[tokio::test]
    async fn remove_then_remove_again_fails() {
        let pool = create_pool();
        LoadPalletRepo::upsert(&pool, "MKT-001", dallas()).await.unwrap();

        let removed = LoadPalletRepo::remove(&pool, "MKT-001").await.unwrap();
        assert_eq!(removed.load_id, "MKT-001");
        assert_eq!(LoadPalletRepo::list(&pool, &by_load("MKT-001")).await.total, 0);

        let err = LoadPalletRepo::remove(&pool, "MKT-001").await.unwrap_err();
        assert_matches!(err, CoreError::NotFound { .. });
    }

    #[tokio::test]
    async fn list_sorts_newest_first_and_filters_by_status() {
        let pool = create_pool();
        LoadPalletRepo::upsert(&pool, "MKT-001", dallas()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        LoadPalletRepo::upsert(&pool, "MKT-002", pallets(&["PLT-HOU-001"])).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        LoadPalletRepo::record_progress(&pool, "MKT-001", scanned(1)).await.unwrap();

        let all = LoadPalletRepo::list(&pool, &LoadPalletFilter::default()).await;
        let order: Vec<&str> = all.assignments.iter().map(|a| a.load_id.as_str()).collect();
        assert_eq!(order, ["MKT-001", "MKT-002"]);
        assert_eq!(all.summary.pending, 1);
        assert_eq!(all.summary.in_progress, 1);
        assert_eq!(all.summary.total_expected, 4);
        assert_eq!(all.summary.total_scanned, 1);

        let pending = LoadPalletRepo::list(
            &pool,
            &LoadPalletFilter {
                load_id: None,
                status: Some(LoadStatus::Pending),
            },
        )
        .await;
        assert_eq!(pending.total, 1);
        assert_eq!(pending.assignments[0].load_id, "MKT-002");
    }

    #[tokio::test]
    async fn pallet_detail_reconciles_totals() {
        let pool = create_pool();
        LoadPalletRepo::upsert(&pool, "MKT-001", dallas()).await.unwrap();
        LoadPalletRepo::record_progress(&pool, "MKT-001", scanned(2)).await.unwrap();

        let detail = LoadPalletRepo::pallet_detail(&pool, "MKT-001").await.unwrap();
        assert_eq!(detail.pallets.len(), 3);
        assert!(detail.pallets[0].scanned);
        assert!(detail.pallets[1].scanned);
        assert!(!detail.pallets[2].scanned);
        assert_eq!(detail.pallets[2].status, PalletScanStatus::Pending);
        assert_eq!(
            detail.summary,
            PalletDetailSummary {
                expected: 3,
                scanned: 2,
                remaining: 1,
                completion_percentage: 67,
            }
        );
    }

    #[tokio::test]
    async fn pallet_detail_over_scanned_load() {
        let pool = create_pool();
        LoadPalletRepo::upsert(&pool, "MKT-001", dallas()).await.unwrap();
        LoadPalletRepo::record_progress(&pool, "MKT-001", scanned(5)).await.unwrap();

        let detail = LoadPalletRepo::pallet_detail(&pool, "MKT-001").await.unwrap();
        assert!(detail.pallets.iter().all(|p| p.scanned));
        assert_eq!(detail.summary.remaining, 0);
        assert_eq!(detail.summary.completion_percentage, 167);
    }

    #[tokio::test]
    async fn summary_covers_every_load_under_a_filter() {
        let pool = create_pool();
        LoadPalletRepo::upsert(&pool, "MKT-001", pallets(&["PLT-A", "PLT-B"])).await.unwrap();
        LoadPalletRepo::upsert(&pool, "MKT-002", pallets(&["PLT-C", "PLT-D"])).await.unwrap();
        LoadPalletRepo::record_progress(&pool, "MKT-002", scanned(1)).await.unwrap();

        let pending = LoadPalletRepo::list(
            &pool,
            &LoadPalletFilter {
                load_id: None,
                status: Some(LoadStatus::Pending),
            },
        )
        .await;

        assert_eq!(pending.total, 1);
        assert_eq!(pending.assignments[0].load_id, "MKT-001");
        assert_eq!(
            pending.summary,
            StatusSummary {
                pending: 1,
                in_progress: 1,
                completed: 0,
                error: 0,
                total_expected: 4,
                total_scanned: 1,
            }
        );
    }

    #[tokio::test]
    async fn pallet_detail_percentage_for_huge_scan_count() {
        let pool = create_pool();
        LoadPalletRepo::upsert(&pool, "MKT-001", pallets(&["PLT-A"])).await.unwrap();
        LoadPalletRepo::record_progress(&pool, "MKT-001", scanned(u32::MAX)).await.unwrap();

        let detail = LoadPalletRepo::pallet_detail(&pool, "MKT-001").await.unwrap();
        assert_eq!(detail.summary.completion_percentage, 429_496_729_500);
        assert_eq!(detail.summary.remaining, 0);
    }

    #[tokio::test]
    async fn surrounding_whitespace_is_not_part_of_the_key() {
        let pool = create_pool();
        let first = LoadPalletRepo::upsert(&pool, " MKT-001 ", dallas()).await.unwrap();
        assert!(first.created);
        assert_eq!(first.assignment.load_id, "MKT-001");

        let second = LoadPalletRepo::upsert(&pool, "MKT-001", dallas()).await.unwrap();
        assert!(!second.created);
        assert_eq!(LoadPalletRepo::list(&pool, &LoadPalletFilter::default()).await.total, 1);

        LoadPalletRepo::record_progress(&pool, "MKT-001\t", scanned(1)).await.unwrap();
        assert!(LoadPalletRepo::pallet_detail(&pool, " MKT-001").await.is_ok());
        LoadPalletRepo::remove(&pool, "  MKT-001").await.unwrap();
        assert!(LoadPalletRepo::find_by_load_id(&pool, "MKT-001").await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_on_one_load_stay_consistent() {
        let pool = create_pool();
        LoadPalletRepo::upsert(&pool, "MKT-001", dallas()).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..32u32 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    let manifest = (0..=(i % 5))
                        .map(|n| format!("PLT-DAL-{n:03}"))
                        .collect();
                    LoadPalletRepo::upsert(&pool, "MKT-001", manifest).await.unwrap();
                    false
                } else {
                    LoadPalletRepo::record_progress(&pool, "MKT-001", scanned(10))
                        .await
                        .unwrap()
                        .completed_now()
                }
            }));
        }

        let mut edges = 0;
        for handle in handles {
            if handle.await.unwrap() {
                edges += 1;
            }
        }

        let stored = LoadPalletRepo::find_by_load_id(&pool, "MKT-001").await.unwrap();
        assert_eq!(stored.expected_count as usize, stored.pallet_ids.len());
        assert_eq!(stored.status, LoadStatus::Completed);
        assert_eq!(edges, 1);
    }

    #[tokio::test]
    async fn pallet_detail_unknown_load_is_not_found() {
        let pool = create_pool();
        let err = LoadPalletRepo::pallet_detail(&pool, "MKT-404").await.unwrap_err();
        assert_matches!(err, CoreError::NotFound { .. });
    }
}
