//! Load/pallet tracking rules.
//!
//! Pallet-ID validation, load status values and the derivation of a load's
//! status from its scan progress. Used by the storage layer when mutating
//! assignments and by the API layer when validating query parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Every pallet ID must begin with this literal prefix (case-sensitive).
pub const PALLET_ID_PREFIX: &str = "PLT-";

// ---------------------------------------------------------------------------
// LoadStatus
// ---------------------------------------------------------------------------

/// Scan state of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// No pallets scanned yet.
    Pending,
    /// Some, but not all, expected pallets scanned.
    InProgress,
    /// Scanned count reached the expected count.
    Completed,
    /// Set manually when a load needs attention.
    Error,
}

/// All valid status values, in state-machine order.
pub const VALID_STATUSES: &[LoadStatus] = &[
    LoadStatus::Pending,
    LoadStatus::InProgress,
    LoadStatus::Completed,
    LoadStatus::Error,
];

impl LoadStatus {
    /// Wire representation of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            LoadStatus::Pending => "pending",
            LoadStatus::InProgress => "in_progress",
            LoadStatus::Completed => "completed",
            LoadStatus::Error => "error",
        }
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VALID_STATUSES
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                let accepted: Vec<&str> = VALID_STATUSES.iter().map(|s| s.as_str()).collect();
                CoreError::validation(format!(
                    "Invalid status '{s}'. Must be one of: {}",
                    accepted.join(", ")
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Whether `id` is an acceptable pallet identifier.
pub fn is_valid_pallet_id(id: &str) -> bool {
    id.starts_with(PALLET_ID_PREFIX)
}

/// Validate a manifest write.
///
/// Collects every problem (missing load ID, empty manifest, each offending
/// pallet ID) into one `CoreError::Validation` so the caller can fix the
/// whole request in a single round trip.
/// Canonical form of a caller-supplied load ID: surrounding whitespace is
/// not part of the key.
pub fn normalize_load_id(load_id: &str) -> &str {
    load_id.trim()
}

pub fn validate_manifest(load_id: &str, pallet_ids: &[String]) -> Result<(), CoreError> {
    let mut details = Vec::new();

    if load_id.trim().is_empty() {
        details.push("loadId is required".to_string());
    }

    if pallet_ids.is_empty() {
        details.push("palletIds must contain at least one pallet ID".to_string());
    }

    let invalid: Vec<&str> = pallet_ids
        .iter()
        .map(String::as_str)
        .filter(|id| !is_valid_pallet_id(id))
        .collect();

    for id in &invalid {
        details.push(format!(
            "Invalid pallet ID '{id}': must start with '{PALLET_ID_PREFIX}'"
        ));
    }

    if details.is_empty() {
        return Ok(());
    }

    let message = if invalid.is_empty() {
        details.join("; ")
    } else {
        format!("Invalid pallet IDs: {}", invalid.join(", "))
    };

    Err(CoreError::Validation { message, details })
}

/// Convert a caller-supplied scan count into a store count.
pub fn validate_scanned_count(scanned: i64) -> Result<u32, CoreError> {
    if scanned < 0 {
        return Err(CoreError::validation(format!(
            "scannedCount must not be negative, got {scanned}"
        )));
    }
    u32::try_from(scanned).map_err(|_| {
        CoreError::validation(format!("scannedCount is too large, got {scanned}"))
    })
}

// ---------------------------------------------------------------------------
// Progress math
// ---------------------------------------------------------------------------

/// Derive a load's status from its scan progress.
///
/// A ratio of 1.0 or more completes the load, a ratio strictly between 0 and
/// 1 puts it in progress, and anything else leaves `current` unchanged. An
/// empty manifest never divides.
pub fn derive_status(current: LoadStatus, scanned: u32, expected: u32) -> LoadStatus {
    if expected == 0 {
        return current;
    }
    if scanned >= expected {
        LoadStatus::Completed
    } else if scanned > 0 {
        LoadStatus::InProgress
    } else {
        current
    }
}

/// `round(100 * scanned / expected)`, or 0 for an empty manifest.
///
/// Integer arithmetic in `u64` so over-scanned loads never saturate. Halves
/// round up.
pub fn completion_percentage(scanned: u32, expected: u32) -> u64 {
    if expected == 0 {
        return 0;
    }
    let (scanned, expected) = (u64::from(scanned), u64::from(expected));
    (200 * scanned + expected) / (2 * expected)
}

/// Pallets still to be scanned. Over-scanned loads report 0.
pub fn remaining(scanned: u32, expected: u32) -> u32 {
    expected.saturating_sub(scanned)
}

/// Whether an explicit status disagrees with what the ratio would derive.
///
/// `Error` is a manual flag with no ratio equivalent, so it never counts as
/// a contradiction.
pub fn override_contradicts_ratio(status: LoadStatus, scanned: u32, expected: u32) -> bool {
    if status == LoadStatus::Error {
        return false;
    }
    derive_status(LoadStatus::Pending, scanned, expected) != status
}
