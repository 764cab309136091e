use crate::{client::ChainError, decoder::DecodeError};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Failure of one unit of work (a blockchain transaction). Every variant
/// aborts the whole unit; nothing of it is committed.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to decode log: {0}")]
    Decode(#[from] DecodeError),
    #[error("missing referent: {0}")]
    MissingReferent(String),
    #[error("persistence conflict: {0}")]
    PersistenceConflict(String),
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] ChainError),
    #[error("district {0} is not configured")]
    UnknownDistrict(i32),
    #[error("db error: {0}")]
    Db(DbErr),
}

impl IngestError {
    /// Whether a later redelivery of the same unit may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PersistenceConflict(_) | Self::UpstreamUnavailable(_) | Self::Db(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::MissingReferent(_) => "missing_referent",
            Self::PersistenceConflict(_) => "persistence_conflict",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::UnknownDistrict(_) => "unknown_district",
            Self::Db(_) => "db",
        }
    }
}

impl From<DbErr> for IngestError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(details)) => Self::PersistenceConflict(details),
            _ => Self::Db(err),
        }
    }
}

/// Result of a successfully processed unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Every routed log was applied and committed.
    Applied { events: usize },
    /// Every routed log had already been applied by an earlier delivery.
    Duplicate,
    /// No log of the transaction belongs to a watched marketplace contract.
    Irrelevant,
}

impl IngestOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::Duplicate => "duplicate",
            Self::Irrelevant => "irrelevant",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(IngestError::PersistenceConflict("dup".into()).is_retryable());
        assert!(IngestError::UpstreamUnavailable(ChainError::Rpc("timeout".into())).is_retryable());
        assert!(!IngestError::MissingReferent("auction".into()).is_retryable());
        assert!(!IngestError::Decode(DecodeError::MissingSignature).is_retryable());
    }

    #[test]
    fn generic_db_errors_are_not_conflicts() {
        let err: IngestError = DbErr::Custom("boom".into()).into();
        assert!(matches!(err, IngestError::Db(_)));
    }
}
