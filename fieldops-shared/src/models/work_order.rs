/// Work order model and database operations
///
/// A work order is a unit of scheduled or performed labor. It is either
/// created directly or converted from a service request; in the converted
/// case it permanently stores the originating request's id, and a partial
/// unique index guarantees at most one work order per request:
///
/// ```sql
/// CREATE UNIQUE INDEX work_orders_service_request_id_key
///     ON work_orders (service_request_id)
///     WHERE service_request_id IS NOT NULL;
/// ```
///
/// # State Machine
///
/// ```text
/// pending → in_progress → completed
///         ↘             ↘
///           → cancelled ←
/// ```
///
/// Completion is owned by the engine's lifecycle orchestrator because it
/// also writes the equipment's maintenance record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgHasArrayType, PgTypeInfo};
use sqlx::PgPool;
use uuid::Uuid;

use super::service_request::{RequestUrgency, ServiceRequest};

/// Work order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "work_order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    /// Scheduled, not yet started
    Pending,

    /// Being worked
    InProgress,

    /// Finished (terminal)
    Completed,

    /// Abandoned (terminal)
    Cancelled,
}

impl WorkOrderStatus {
    /// Converts status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Pending => "pending",
            WorkOrderStatus::InProgress => "in_progress",
            WorkOrderStatus::Completed => "completed",
            WorkOrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parses status from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(WorkOrderStatus::Pending),
            "in_progress" => Some(WorkOrderStatus::InProgress),
            "completed" => Some(WorkOrderStatus::Completed),
            "cancelled" => Some(WorkOrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Checks if status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkOrderStatus::Completed | WorkOrderStatus::Cancelled)
    }

    /// Checks if transition to target status is valid
    pub fn can_transition_to(&self, target: WorkOrderStatus) -> bool {
        match (self, target) {
            (WorkOrderStatus::Pending, WorkOrderStatus::InProgress) => true,
            (WorkOrderStatus::Pending, WorkOrderStatus::Completed) => true,
            (WorkOrderStatus::Pending, WorkOrderStatus::Cancelled) => true,
            (WorkOrderStatus::InProgress, WorkOrderStatus::Completed) => true,
            (WorkOrderStatus::InProgress, WorkOrderStatus::Cancelled) => true,
            _ => false,
        }
    }
}

// Needed to bind &[WorkOrderStatus] as the ANY(..) guard in `transition`.
impl PgHasArrayType for WorkOrderStatus {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_work_order_status")
    }
}

/// Work order priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "work_order_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WorkOrderPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl WorkOrderPriority {
    /// Converts priority to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderPriority::Low => "low",
            WorkOrderPriority::Medium => "medium",
            WorkOrderPriority::High => "high",
            WorkOrderPriority::Critical => "critical",
        }
    }

    /// Maps a service request's urgency to the converted work order's priority
    pub fn from_urgency(urgency: RequestUrgency) -> Self {
        match urgency {
            RequestUrgency::Low => WorkOrderPriority::Low,
            RequestUrgency::Medium => WorkOrderPriority::Medium,
            RequestUrgency::High => WorkOrderPriority::High,
            RequestUrgency::Critical => WorkOrderPriority::Critical,
        }
    }
}

/// Work order model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkOrder {
    /// Unique work order ID
    pub id: Uuid,

    /// Company this work order belongs to
    pub company_id: Uuid,

    /// Originating service request, if converted; stored permanently
    pub service_request_id: Option<Uuid>,

    /// Equipment being worked, if any
    pub equipment_id: Option<Uuid>,

    /// Short summary
    pub title: String,

    /// Full description
    pub description: String,

    /// Current status
    pub status: WorkOrderStatus,

    /// Priority
    pub priority: WorkOrderPriority,

    /// Contact carried over from the request
    pub contact_name: Option<String>,

    /// Contact email carried over from the request
    pub contact_email: Option<String>,

    /// Estimated labor hours
    pub estimated_hours: Option<f64>,

    /// Actual labor hours
    pub actual_hours: Option<f64>,

    /// Estimated cost
    pub estimated_cost: Option<f64>,

    /// Actual cost
    pub actual_cost: Option<f64>,

    /// When the work order was completed
    pub completed_at: Option<DateTime<Utc>>,

    /// When the work order was created
    pub created_at: DateTime<Utc>,

    /// When the work order was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a work order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkOrder {
    /// Company ID
    pub company_id: Uuid,

    /// Originating service request, for conversions
    pub service_request_id: Option<Uuid>,

    /// Equipment being worked, if any
    pub equipment_id: Option<Uuid>,

    /// Short summary
    pub title: String,

    /// Full description
    #[serde(default)]
    pub description: String,

    /// Priority (defaults to Medium)
    #[serde(default = "default_priority")]
    pub priority: WorkOrderPriority,

    /// Contact name
    pub contact_name: Option<String>,

    /// Contact email
    pub contact_email: Option<String>,

    /// Estimated labor hours
    pub estimated_hours: Option<f64>,

    /// Estimated cost
    pub estimated_cost: Option<f64>,
}

fn default_priority() -> WorkOrderPriority {
    WorkOrderPriority::Medium
}

impl CreateWorkOrder {
    /// Pre-fills a work order from a service request being converted
    ///
    /// Carries over title, description, equipment, and contact; maps
    /// urgency to priority; sets the permanent back-reference.
    pub fn from_request(request: &ServiceRequest) -> Self {
        CreateWorkOrder {
            company_id: request.company_id,
            service_request_id: Some(request.id),
            equipment_id: request.equipment_id,
            title: request.title.clone(),
            description: request.description.clone(),
            priority: WorkOrderPriority::from_urgency(request.urgency),
            contact_name: request.contact_name.clone(),
            contact_email: request.contact_email.clone(),
            estimated_hours: None,
            estimated_cost: None,
        }
    }
}

impl WorkOrder {
    /// Inserts a work order in pending state
    ///
    /// Takes an executor so the conversion protocol can run it inside the
    /// same transaction as the request's status update.
    ///
    /// # Errors
    ///
    /// Returns an error on unique violation of the conversion
    /// back-reference (another work order already references the same
    /// request) or if the database connection fails.
    pub async fn insert(
        executor: impl sqlx::PgExecutor<'_>,
        data: CreateWorkOrder,
    ) -> Result<Self, sqlx::Error> {
        let work_order = sqlx::query_as::<_, WorkOrder>(
            r#"
            INSERT INTO work_orders
                (company_id, service_request_id, equipment_id, title, description,
                 priority, contact_name, contact_email, estimated_hours, estimated_cost)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, company_id, service_request_id, equipment_id, title, description,
                      status, priority, contact_name, contact_email,
                      estimated_hours, actual_hours, estimated_cost, actual_cost,
                      completed_at, created_at, updated_at
            "#,
        )
        .bind(data.company_id)
        .bind(data.service_request_id)
        .bind(data.equipment_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.priority)
        .bind(data.contact_name)
        .bind(data.contact_email)
        .bind(data.estimated_hours)
        .bind(data.estimated_cost)
        .fetch_one(executor)
        .await?;

        Ok(work_order)
    }

    /// Finds a work order by ID within a company
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn find_in_company(
        pool: &PgPool,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let work_order = sqlx::query_as::<_, WorkOrder>(
            r#"
            SELECT id, company_id, service_request_id, equipment_id, title, description,
                   status, priority, contact_name, contact_email,
                   estimated_hours, actual_hours, estimated_cost, actual_cost,
                   completed_at, created_at, updated_at
            FROM work_orders
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(pool)
        .await?;

        Ok(work_order)
    }

    /// Finds the work order referencing a service request, if any
    ///
    /// Fast-path duplicate-conversion check; the unique index remains the
    /// authoritative guard.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn find_by_service_request(
        executor: impl sqlx::PgExecutor<'_>,
        service_request_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let work_order = sqlx::query_as::<_, WorkOrder>(
            r#"
            SELECT id, company_id, service_request_id, equipment_id, title, description,
                   status, priority, contact_name, contact_email,
                   estimated_hours, actual_hours, estimated_cost, actual_cost,
                   completed_at, created_at, updated_at
            FROM work_orders
            WHERE service_request_id = $1
            "#,
        )
        .bind(service_request_id)
        .fetch_optional(executor)
        .await?;

        Ok(work_order)
    }

    /// Locks and fetches a work order inside a transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn lock_in_company(
        tx: &mut sqlx::PgConnection,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let work_order = sqlx::query_as::<_, WorkOrder>(
            r#"
            SELECT id, company_id, service_request_id, equipment_id, title, description,
                   status, priority, contact_name, contact_email,
                   estimated_hours, actual_hours, estimated_cost, actual_cost,
                   completed_at, created_at, updated_at
            FROM work_orders
            WHERE id = $1 AND company_id = $2
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(tx)
        .await?;

        Ok(work_order)
    }

    /// State-guarded status update
    ///
    /// Updates the status only if the current status is one of `from`,
    /// scoped to the company. Stamps `completed_at` when moving to
    /// completed. Returns false when the guard did not match.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn transition(
        executor: impl sqlx::PgExecutor<'_>,
        company_id: Uuid,
        id: Uuid,
        from: &[WorkOrderStatus],
        to: WorkOrderStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE work_orders
            SET status = $3,
                completed_at = CASE WHEN $3 = 'completed'::work_order_status THEN NOW() ELSE completed_at END,
                updated_at = NOW()
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

    /// Records actual hours and cost
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn record_actuals(
        pool: &PgPool,
        company_id: Uuid,
        id: Uuid,
        actual_hours: Option<f64>,
        actual_cost: Option<f64>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE work_orders
            SET actual_hours = COALESCE($3, actual_hours),
                actual_cost = COALESCE($4, actual_cost),
                updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(actual_hours)
        .bind(actual_cost)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts a company's work orders
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn count_by_company(pool: &PgPool, company_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM work_orders WHERE company_id = $1")
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

    fn sample_request() -> ServiceRequest {
        let now = Utc::now();
        ServiceRequest {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            equipment_id: Some(Uuid::new_v4()),
            title: "Compressor overheating".to_string(),
            description: "Trips thermal cutoff after ten minutes".to_string(),
            status: super::super::service_request::RequestStatus::Reviewing,
            urgency: RequestUrgency::High,
            contact_name: Some("Dana Reyes".to_string()),
            contact_email: Some("dana@example.com".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            WorkOrderStatus::Pending,
            WorkOrderStatus::InProgress,
            WorkOrderStatus::Completed,
            WorkOrderStatus::Cancelled,
        ] {
            assert_eq!(WorkOrderStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(WorkOrderStatus::from_str("open"), None);
    }

    #[test]
    fn test_status_array_type_name() {
        assert_eq!(
            WorkOrderStatus::array_type_info().name(),
            "_work_order_status"
        );
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&WorkOrderStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");

        let parsed: WorkOrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, WorkOrderStatus::Cancelled);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!WorkOrderStatus::Pending.is_terminal());
        assert!(!WorkOrderStatus::InProgress.is_terminal());
        assert!(WorkOrderStatus::Completed.is_terminal());
        assert!(WorkOrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_transitions() {
        assert!(WorkOrderStatus::Pending.can_transition_to(WorkOrderStatus::InProgress));
        assert!(WorkOrderStatus::Pending.can_transition_to(WorkOrderStatus::Completed));
        assert!(WorkOrderStatus::InProgress.can_transition_to(WorkOrderStatus::Completed));
        assert!(WorkOrderStatus::InProgress.can_transition_to(WorkOrderStatus::Cancelled));

        assert!(!WorkOrderStatus::Completed.can_transition_to(WorkOrderStatus::InProgress));
        assert!(!WorkOrderStatus::Cancelled.can_transition_to(WorkOrderStatus::Pending));
    }

    #[test]
    fn test_priority_from_urgency() {
        assert_eq!(
            WorkOrderPriority::from_urgency(RequestUrgency::Low),
            WorkOrderPriority::Low
        );
        assert_eq!(
            WorkOrderPriority::from_urgency(RequestUrgency::Medium),
            WorkOrderPriority::Medium
        );
        assert_eq!(
            WorkOrderPriority::from_urgency(RequestUrgency::High),
            WorkOrderPriority::High
        );
        assert_eq!(
            WorkOrderPriority::from_urgency(RequestUrgency::Critical),
            WorkOrderPriority::Critical
        );
    }

    #[test]
    fn test_prefill_from_request() {
        let request = sample_request();
        let input = CreateWorkOrder::from_request(&request);

        assert_eq!(input.company_id, request.company_id);
        assert_eq!(input.service_request_id, Some(request.id));
        assert_eq!(input.equipment_id, request.equipment_id);
        assert_eq!(input.title, request.title);
        assert_eq!(input.description, request.description);
        assert_eq!(input.priority, WorkOrderPriority::High);
        assert_eq!(input.contact_name, request.contact_name);
        assert_eq!(input.contact_email, request.contact_email);
    }

    // Integration tests for database operations are in tests/model_tests.rs
}
