/// Loads are keyed by the caller-supplied load identifier (e.g. `"MKT-001"`).
pub type LoadId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
