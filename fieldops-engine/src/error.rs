/// Engine error types
///
/// Every fallible engine operation returns `EngineError`. Precondition
/// failures (`Unauthorized`, `QuotaExceeded`) are raised before any write
/// and never leave partial state. Database constraint violations on the
/// conversion back-reference are translated to `DuplicateConversion` so
/// the losing side of a concurrent conversion gets a domain error, not a
/// raw driver error.

use fieldops_shared::models::license::ResourceKind;
use thiserror::Error;
use uuid::Uuid;

use crate::access::Capability;

/// Unique index guarding at-most-once conversion; Postgres reports its
/// name as the violated constraint.
const CONVERSION_UNIQUE_INDEX: &str = "work_orders_service_request_id_key";

/// Errors surfaced by engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// No authenticated user behind the call
    #[error("not authenticated")]
    Unauthenticated,

    /// Capability denied by role or license flag
    #[error("not authorized for {0:?}")]
    Unauthorized(Capability),

    /// Creating the resource would exceed the company's license quota
    #[error("quota exceeded for {kind:?}: {current} of {limit}")]
    QuotaExceeded {
        kind: ResourceKind,
        limit: i64,
        current: i64,
    },

    /// The entity's current status does not permit the event
    #[error("invalid transition: {entity} in state '{from}' cannot '{event}'")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        event: &'static str,
    },

    /// A work order already references this service request
    #[error("service request {0} is already converted")]
    DuplicateConversion(Uuid),

    /// Entity missing or outside the caller's company
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Persistence collaborator failed or timed out
    #[error("upstream failure: {0}")]
    Upstream(#[from] sqlx::Error),
}

impl EngineError {
    /// Translates a conversion insert failure
    ///
    /// A unique violation on the back-reference index means another
    /// caller converted the request first.
    pub fn from_conversion_insert(err: sqlx::Error, request_id: Uuid) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.constraint() == Some(CONVERSION_UNIQUE_INDEX) {
                return EngineError::DuplicateConversion(request_id);
            }
        }
        EngineError::Upstream(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::QuotaExceeded {
            kind: ResourceKind::Equipment,
            limit: 5,
            current: 5,
        };
        assert!(err.to_string().contains("5 of 5"));

        let id = Uuid::new_v4();
        let err = EngineError::DuplicateConversion(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_non_constraint_error_stays_upstream() {
        let err = EngineError::from_conversion_insert(sqlx::Error::RowNotFound, Uuid::new_v4());
        assert!(matches!(err, EngineError::Upstream(_)));
    }
}
