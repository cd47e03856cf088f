//! Monitor error taxonomy

use super::types::CategoryId;

/// Errors surfaced by the monitoring engine.
///
/// The engine's own computations (trend fitting, alert evaluation) are pure
/// and cannot fail; everything here is an intake or lookup failure, or a
/// storage failure in the snapshot sink.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Observation rejected at intake: bad confidence or timestamp
    #[error("invalid observation: {0}")]
    InvalidObservation(String),

    /// Ingestion or query referenced a category the registry does not know
    #[error("unknown category: {0}")]
    UnknownCategory(CategoryId),

    /// Lookup by id found nothing
    #[error("not found: {0}")]
    NotFound(String),

    /// Category definition rejected: threshold invariant or duplicate name
    #[error("invalid category: {0}")]
    InvalidCategory(String),

    /// Storage or transport failure outside the in-memory core
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for MonitorError {
    fn from(err: rusqlite::Error) -> Self {
        MonitorError::Unavailable(err.to_string())
    }
}
