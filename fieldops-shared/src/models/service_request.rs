/// Service request model and database operations
///
/// A service request is a customer-raised need. It moves through a fixed
/// state machine; `converted` and `closed` are terminal.
///
/// # State Machine
///
/// ```text
/// open → reviewing → converted
///      ↘           ↗
///        → closed ←
/// ```
///
/// Conversion (the `converted` transition plus the work order insert) is
/// owned by the engine's lifecycle orchestrator; this model only provides
/// the state-guarded primitives it composes.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE request_status AS ENUM ('open', 'reviewing', 'converted', 'closed');
/// CREATE TYPE request_urgency AS ENUM ('low', 'medium', 'high', 'critical');
///
/// CREATE TABLE service_requests (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
///     equipment_id UUID REFERENCES equipment(id) ON DELETE SET NULL,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status request_status NOT NULL DEFAULT 'open',
///     urgency request_urgency NOT NULL DEFAULT 'medium',
///     contact_name VARCHAR(255),
///     contact_email VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgHasArrayType, PgTypeInfo};
use sqlx::PgPool;
use uuid::Uuid;

/// Service request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Newly raised, not yet looked at
    Open,

    /// Under review by the company
    Reviewing,

    /// Converted into a work order (terminal)
    Converted,

    /// Closed without conversion (terminal)
    Closed,
}

impl RequestStatus {
    /// Converts status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Open => "open",
            RequestStatus::Reviewing => "reviewing",
            RequestStatus::Converted => "converted",
            RequestStatus::Closed => "closed",
        }
    }

    /// Parses status from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(RequestStatus::Open),
            "reviewing" => Some(RequestStatus::Reviewing),
            "converted" => Some(RequestStatus::Converted),
            "closed" => Some(RequestStatus::Closed),
            _ => None,
        }
    }

    /// Checks if status is terminal (no further transitions permitted)
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Converted | RequestStatus::Closed)
    }

    /// Checks if transition to target status is valid
    pub fn can_transition_to(&self, target: RequestStatus) -> bool {
        match (self, target) {
            (RequestStatus::Open, RequestStatus::Reviewing) => true,
            (RequestStatus::Open, RequestStatus::Converted) => true,
            (RequestStatus::Open, RequestStatus::Closed) => true,
            (RequestStatus::Reviewing, RequestStatus::Converted) => true,
            (RequestStatus::Reviewing, RequestStatus::Closed) => true,

            // Terminal states cannot transition
            _ => false,
        }
    }
}

// Needed to bind &[RequestStatus] as the ANY(..) guard in `transition`.
impl PgHasArrayType for RequestStatus {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_request_status")
    }
}

/// Customer-reported urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_urgency", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestUrgency {
    Low,
    Medium,
    High,
    Critical,
}

impl RequestUrgency {
    /// Converts urgency to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestUrgency::Low => "low",
            RequestUrgency::Medium => "medium",
            RequestUrgency::High => "high",
            RequestUrgency::Critical => "critical",
        }
    }
}

/// Service request model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ServiceRequest {
    /// Unique request ID
    pub id: Uuid,

    /// Company this request belongs to
    pub company_id: Uuid,

    /// Affected equipment, if known
    pub equipment_id: Option<Uuid>,

    /// Short summary
    pub title: String,

    /// Full description
    pub description: String,

    /// Current status
    pub status: RequestStatus,

    /// Customer-reported urgency
    pub urgency: RequestUrgency,

    /// Requester contact name
    pub contact_name: Option<String>,

    /// Requester contact email
    pub contact_email: Option<String>,

    /// When the request was created
    pub created_at: DateTime<Utc>,

    /// When the request was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a service request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServiceRequest {
    /// Company ID
    pub company_id: Uuid,

    /// Affected equipment, if known
    pub equipment_id: Option<Uuid>,

    /// Short summary
    pub title: String,

    /// Full description
    #[serde(default)]
    pub description: String,

    /// Urgency (defaults to Medium)
    #[serde(default = "default_urgency")]
    pub urgency: RequestUrgency,

    /// Requester contact name
    pub contact_name: Option<String>,

    /// Requester contact email
    pub contact_email: Option<String>,
}

fn default_urgency() -> RequestUrgency {
    RequestUrgency::Medium
}

impl ServiceRequest {
    /// Creates a new service request in open state
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn create(pool: &PgPool, data: CreateServiceRequest) -> Result<Self, sqlx::Error> {
        let request = sqlx::query_as::<_, ServiceRequest>(
            r#"
            INSERT INTO service_requests
                (company_id, equipment_id, title, description, urgency, contact_name, contact_email)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, company_id, equipment_id, title, description, status, urgency,
                      contact_name, contact_email, created_at, updated_at
            "#,
        )
        .bind(data.company_id)
        .bind(data.equipment_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.urgency)
        .bind(data.contact_name)
        .bind(data.contact_email)
        .fetch_one(pool)
        .await?;

        tracing::info!(request_id = %request.id, company_id = %request.company_id, "Service request created");
        Ok(request)
    }

    /// Finds a request by ID within a company
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn find_in_company(
        pool: &PgPool,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let request = sqlx::query_as::<_, ServiceRequest>(
            r#"
            SELECT id, company_id, equipment_id, title, description, status, urgency,
                   contact_name, contact_email, created_at, updated_at
            FROM service_requests
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(pool)
        .await?;

        Ok(request)
    }

    /// Locks and fetches a request inside a transaction
    ///
    /// `FOR UPDATE` serializes concurrent lifecycle transitions on the same
    /// row; the conversion protocol relies on this.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn lock_in_company(
        tx: &mut sqlx::PgConnection,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let request = sqlx::query_as::<_, ServiceRequest>(
            r#"
            SELECT id, company_id, equipment_id, title, description, status, urgency,
                   contact_name, contact_email, created_at, updated_at
            FROM service_requests
            WHERE id = $1 AND company_id = $2
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(tx)
        .await?;

        Ok(request)
    }

    /// Lists a company's requests, optionally filtered by status
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn list_by_company(
        pool: &PgPool,
        company_id: Uuid,
        status: Option<RequestStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let requests = match status {
            Some(status) => {
                sqlx::query_as::<_, ServiceRequest>(
                    r#"
                    SELECT id, company_id, equipment_id, title, description, status, urgency,
                           contact_name, contact_email, created_at, updated_at
                    FROM service_requests
                    WHERE company_id = $1 AND status = $2
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(company_id)
                .bind(status)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ServiceRequest>(
                    r#"
                    SELECT id, company_id, equipment_id, title, description, status, urgency,
                           contact_name, contact_email, created_at, updated_at
                    FROM service_requests
                    WHERE company_id = $1
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(company_id)
                .fetch_all(pool)
                .await?
            }
        };

        Ok(requests)
    }

    /// State-guarded status update
    ///
    /// Updates the status only if the current status is one of `from`,
    /// scoped to the company. Returns false when the guard did not match
    /// (row missing, wrong company, or already past the expected states).
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn transition(
        executor: impl sqlx::PgExecutor<'_>,
        company_id: Uuid,
        id: Uuid,
        from: &[RequestStatus],
        to: RequestStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE service_requests
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND company_id = $2 AND status = ANY($4)
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(to)
        .bind(from)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts a company's requests
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn count_by_company(pool: &PgPool, company_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM service_requests WHERE company_id = $1")
                .bind(company_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::TypeInfo;

    #[test]
    fn test_request_status_round_trip() {
        for status in [
            RequestStatus::Open,
            RequestStatus::Reviewing,
            RequestStatus::Converted,
            RequestStatus::Closed,
        ] {
            assert_eq!(RequestStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(RequestStatus::from_str("pending"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!RequestStatus::Open.is_terminal());
        assert!(!RequestStatus::Reviewing.is_terminal());
        assert!(RequestStatus::Converted.is_terminal());
        assert!(RequestStatus::Closed.is_terminal());
    }

    #[test]
    fn test_valid_transitions() {
        assert!(RequestStatus::Open.can_transition_to(RequestStatus::Reviewing));
        assert!(RequestStatus::Open.can_transition_to(RequestStatus::Converted));
        assert!(RequestStatus::Open.can_transition_to(RequestStatus::Closed));
        assert!(RequestStatus::Reviewing.can_transition_to(RequestStatus::Converted));
        assert!(RequestStatus::Reviewing.can_transition_to(RequestStatus::Closed));
    }

    #[test]
    fn test_terminal_states_reject_all_transitions() {
        for terminal in [RequestStatus::Converted, RequestStatus::Closed] {
            for target in [
                RequestStatus::Open,
                RequestStatus::Reviewing,
                RequestStatus::Converted,
                RequestStatus::Closed,
            ] {
                assert!(
                    !terminal.can_transition_to(target),
                    "{} -> {} should be rejected",
                    terminal.as_str(),
                    target.as_str()
                );
            }
        }
    }

    #[test]
    fn test_reviewing_cannot_reopen() {
        assert!(!RequestStatus::Reviewing.can_transition_to(RequestStatus::Open));
    }

    #[test]
    fn test_status_array_type_name() {
        assert_eq!(RequestStatus::array_type_info().name(), "_request_status");
    }

    // Integration tests for database operations are in tests/model_tests.rs
}
