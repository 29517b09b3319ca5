/// Experiments are identified by their number (1, 2, 3, ...).
pub type ExperimentNumber = i64;

/// Image records are keyed by a server-assigned UUID.
pub type ImageId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
