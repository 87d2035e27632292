//! Kernel-wide error taxonomy.
//!
//! A single flat taxonomy (rather than one enum per subsystem) because the
//! kernel's components share one failure surface: callers dispatch on
//! `DomainError::kind()` regardless of which subsystem raised it.

use thiserror::Error;

/// Result alias used by every kernel operation.
pub type DomainResult<T> = Result<T, DomainError>;

/// Flat error taxonomy shared by all six subsystems.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("integrity error: {0}")]
    IntegrityError(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("plan failure: {0}")]
    PlanFailure(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("circuit open for {component}/{operation_id}")]
    CircuitOpen {
        component: String,
        operation_id: String,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("database error: {0}")]
    Database(String),
}

/// Taxonomy tag surfaced to callers in structured results (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AccessDenied,
    IntegrityError,
    Conflict,
    Transient,
    PlanFailure,
    RateLimited,
    CircuitOpen,
    Serialization,
    Io,
    Database,
}

impl DomainError {
    /// The taxonomy tag this error belongs to, for structured result reporting.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AccessDenied(_) => ErrorKind::AccessDenied,
            Self::IntegrityError(_) => ErrorKind::IntegrityError,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Transient(_) => ErrorKind::Transient,
            Self::PlanFailure(_) => ErrorKind::PlanFailure,
            Self::RateLimited(_) => ErrorKind::RateLimited,
            Self::CircuitOpen { .. } => ErrorKind::CircuitOpen,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Io(_) => ErrorKind::Io,
            Self::Database(_) => ErrorKind::Database,
        }
    }

    /// Transient errors are eligible for the retry + circuit breaker stack;
    /// everything else propagates straight to the caller (§7).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        !self.is_transient()
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        if is_busy_or_locked(&err) {
            Self::Transient(err.to_string())
        } else if matches!(err, sqlx::Error::RowNotFound) {
            Self::NotFound(err.to_string())
        } else {
            Self::Database(err.to_string())
        }
    }
}

fn is_busy_or_locked(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        let message = db_err.message().to_ascii_lowercase();
        return message.contains("busy") || message.contains("locked") || message.contains("timeout");
    }
    false
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_is_retryable_everything_else_is_not() {
        assert!(DomainError::Transient("busy".into()).is_transient());
        assert!(!DomainError::NotFound("x".into()).is_transient());
        assert!(DomainError::NotFound("x".into()).is_permanent());
    }

    #[test]
    fn kind_maps_each_variant() {
        assert_eq!(DomainError::AccessDenied("x".into()).kind(), ErrorKind::AccessDenied);
        assert_eq!(
            DomainError::CircuitOpen { component: "memory".into(), operation_id: "store".into() }.kind(),
            ErrorKind::CircuitOpen
        );
    }
}
