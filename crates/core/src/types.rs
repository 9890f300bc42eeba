//! Primitive aliases shared by every crate.

/// Row identifier; every table uses a `BIGSERIAL` key.
pub type DbId = i64;

/// Stored as `TIMESTAMPTZ`, always handled in UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
