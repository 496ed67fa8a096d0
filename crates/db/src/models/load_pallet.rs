//! Load-pallet assignment model and DTOs.
//!
//! Wire names are camelCase to match the dashboard clients.

use fleetflow_core::load_pallet::LoadStatus;
use fleetflow_core::types::{LoadId, Timestamp};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Entity structs
// ---------------------------------------------------------------------------

/// Expected pallet manifest and scan progress for one load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadPalletAssignment {
    pub load_id: LoadId,
    pub pallet_ids: Vec<String>,
    /// Always `pallet_ids.len()`; recomputed on every write.
    pub expected_count: u32,
    pub scanned_count: u32,
    pub status: LoadStatus,
    pub last_updated: Timestamp,
}

/// Per-status counts and pallet totals for dashboard display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub error: usize,
    pub total_expected: u64,
    pub total_scanned: u64,
}

impl StatusSummary {
    /// Tally a set of assignments.
    pub fn from_assignments<'a>(
        assignments: impl IntoIterator<Item = &'a LoadPalletAssignment>,
    ) -> Self {
        let mut summary = Self::default();
        for a in assignments {
            match a.status {
                LoadStatus::Pending => summary.pending += 1,
                LoadStatus::InProgress => summary.in_progress += 1,
                LoadStatus::Completed => summary.completed += 1,
                LoadStatus::Error => summary.error += 1,
            }
            summary.total_expected += u64::from(a.expected_count);
            summary.total_scanned += u64::from(a.scanned_count);
        }
        summary
    }
}

/// Result of a filtered listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadPalletListing {
    /// Sorted by `last_updated`, newest first.
    pub assignments: Vec<LoadPalletAssignment>,
    pub total: usize,
    pub summary: StatusSummary,
}

/// Result of a manifest write.
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub assignment: LoadPalletAssignment,
    /// `true` when the load did not exist before the call.
    pub created: bool,
}

/// Result of a progress update.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub assignment: LoadPalletAssignment,
    pub previous_status: LoadStatus,
}

impl ProgressUpdate {
    /// Whether this update moved the load into `completed`.
    ///
    /// Repeated updates on an already-completed load return `false`, so the
    /// completion notification fires once per transition.
    pub fn completed_now(&self) -> bool {
        self.previous_status != LoadStatus::Completed
            && self.assignment.status == LoadStatus::Completed
    }
}

/// Scan state of a single pallet row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PalletScanStatus {
    Pending,
    Scanned,
}

/// One manifest entry in a pallet detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PalletDetailRow {
    pub pallet_id: String,
    pub expected: bool,
    pub scanned: bool,
    pub status: PalletScanStatus,
}

/// Total-count reconciliation for one load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PalletDetailSummary {
    pub expected: u32,
    pub scanned: u32,
    pub remaining: u32,
    pub completion_percentage: u64,
}

/// Per-pallet breakdown of a load.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PalletDetail {
    pub load_id: LoadId,
    pub pallets: Vec<PalletDetailRow>,
    pub summary: PalletDetailSummary,
}

// ---------------------------------------------------------------------------
// Filters and changes
// ---------------------------------------------------------------------------

/// Exact-match listing filter. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct LoadPalletFilter {
    pub load_id: Option<String>,
    pub status: Option<LoadStatus>,
}

impl LoadPalletFilter {
    pub fn matches(&self, assignment: &LoadPalletAssignment) -> bool {
        self.load_id
            .as_deref()
            .is_none_or(|id| id == assignment.load_id)
            && self.status.is_none_or(|s| s == assignment.status)
    }
}

/// Partial progress update. Omitted fields keep their prior value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressChange {
    pub scanned_count: Option<u32>,
    pub status: Option<LoadStatus>,
}

// ---------------------------------------------------------------------------
// DTOs (request payloads)
// ---------------------------------------------------------------------------

/// Query string for `GET /load-pallets`.
///
/// `status` stays a string here so an unknown value becomes a validation
/// error rather than an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadPalletListParams {
    pub load_id: Option<String>,
    pub status: Option<String>,
}

/// Body of `POST /load-pallets`.
///
/// Missing fields default to empty so they are reported by manifest
/// validation along with every other problem.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertLoadPallets {
    #[serde(default)]
    pub load_id: String,
    #[serde(default)]
    pub pallet_ids: Vec<String>,
}

/// Body of `PUT /load-pallets`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordProgress {
    #[serde(default)]
    pub load_id: String,
    pub scanned_count: Option<i64>,
    pub status: Option<String>,
}

/// Query string for `DELETE /load-pallets`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteLoadPalletParams {
    pub load_id: Option<String>,
}
