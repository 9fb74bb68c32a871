/// Conversion diagnostics
///
/// A conversion is two writes in one transaction, so a committed
/// inconsistency should never exist. If one ever does (a request marked
/// converted with no work order referencing it, for example after a
/// manual data fix), this module makes it detectable and repairable.
/// Nothing here runs automatically; operators schedule the scan
/// externally and choose the repair per request.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use fieldops_shared::models::service_request::{RequestStatus, ServiceRequest};
use fieldops_shared::models::work_order::{CreateWorkOrder, WorkOrder};

use crate::error::EngineError;

/// How to repair an orphaned conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    /// Re-run the lost work order insert
    RetryWorkOrder,

    /// Put the request back into reviewing so it can be converted again
    RevertRequest,
}

/// Result of a reconciliation
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    /// The missing work order was created
    WorkOrderCreated(WorkOrder),

    /// The request was reverted to reviewing
    RequestReverted,

    /// A work order already references the request; nothing to repair
    AlreadyConsistent,
}

/// Lists converted requests that no work order references
///
/// Scans all companies when `company_id` is None.
///
/// # Errors
///
/// Returns `Upstream` if the database fails
pub async fn scan_orphaned_conversions(
    pool: &PgPool,
    company_id: Option<Uuid>,
) -> Result<Vec<ServiceRequest>, EngineError> {
    let orphans = sqlx::query_as::<_, ServiceRequest>(
        r#"
        SELECT id, company_id, equipment_id, title, description,
               status, urgency, contact_name, contact_email,
               created_at, updated_at
        FROM service_requests r
        WHERE r.status = 'converted'
          AND NOT EXISTS (
              SELECT 1 FROM work_orders w WHERE w.service_request_id = r.id
          )
          AND ($1::uuid IS NULL OR r.company_id = $1)
        ORDER BY r.updated_at ASC
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?;

    if !orphans.is_empty() {
        tracing::warn!(
            count = orphans.len(),
            company_id = ?company_id,
            "Orphaned conversions detected"
        );
    }

    Ok(orphans)
}

/// Repairs one orphaned conversion
///
/// Locks the request, re-checks that it is still orphaned, then applies
/// the chosen action in the same transaction. A request that gained a
/// work order since the scan comes back `AlreadyConsistent`.
///
/// # Errors
///
/// Returns `NotFound` if the request does not exist or is not in
/// converted state, `DuplicateConversion` if the retried insert loses a
/// race, or `Upstream` if the database fails
pub async fn reconcile(
    pool: &PgPool,
    request_id: Uuid,
    action: ReconcileAction,
) -> Result<ReconcileOutcome, EngineError> {
    let mut tx = pool.begin().await?;

    let request = sqlx::query_as::<_, ServiceRequest>(
        r#"
        SELECT id, company_id, equipment_id, title, description,
               status, urgency, contact_name, contact_email,
               created_at, updated_at
        FROM service_requests
        WHERE id = $1 AND status = 'converted'
        FOR UPDATE
        "#,
    )
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(EngineError::NotFound("orphaned conversion"))?;

    if WorkOrder::find_by_service_request(&mut *tx, request_id)
        .await?
        .is_some()
    {
        return Ok(ReconcileOutcome::AlreadyConsistent);
    }

    let outcome = match action {
        ReconcileAction::RetryWorkOrder => {
            let work_order =
                WorkOrder::insert(&mut *tx, CreateWorkOrder::from_request(&request))
                    .await
                    .map_err(|e| EngineError::from_conversion_insert(e, request_id))?;
            ReconcileOutcome::WorkOrderCreated(work_order)
        }
        ReconcileAction::RevertRequest => {
            ServiceRequest::transition(
                &mut *tx,
                request.company_id,
                request_id,
                &[RequestStatus::Converted],
                RequestStatus::Reviewing,
            )
            .await?;
            ReconcileOutcome::RequestReverted
        }
    };

    tx.commit().await?;

    tracing::info!(
        request_id = %request_id,
        action = ?action,
        "Orphaned conversion reconciled"
    );
    Ok(outcome)
}

// Both entry points need a database; they are covered by
// tests/engine_tests.rs.
