/// Request lifecycle orchestration
///
/// Coordinates the guarded transitions of a service request (open →
/// reviewing → converted/closed) and a work order (pending → in_progress
/// → completed/cancelled), plus the two multi-table writes in the
/// system: conversion (request update + work order insert) and
/// completion (work order update + maintenance record insert). Both run
/// as a single transaction so a failing second write rolls back the
/// first.
///
/// # Conversion
///
/// ```text
/// lock request FOR UPDATE (company-scoped)
///   └─ no row            → NotFound
/// existing work order?   → DuplicateConversion   (fast path)
/// status terminal?       → InvalidTransition
/// UPDATE status → converted  (state-guarded)
/// INSERT work order (back-reference set)
///   └─ unique violation  → DuplicateConversion   (authoritative)
/// COMMIT
/// ```
///
/// Capability and quota are checked before the transaction; they never
/// leave partial state.

use sqlx::PgPool;
use uuid::Uuid;

use fieldops_shared::models::license::ResourceKind;
use fieldops_shared::models::maintenance::MaintenanceRecord;
use fieldops_shared::models::service_request::{RequestStatus, ServiceRequest};
use fieldops_shared::models::work_order::{CreateWorkOrder, WorkOrder, WorkOrderStatus};

use crate::access::{has_access, Capability};
use crate::error::EngineError;
use crate::license::ResolvedLicense;
use crate::quota::QuotaEnforcer;
use crate::session::SessionContext;

/// Runs the request and work order state machines
#[derive(Debug, Clone)]
pub struct LifecycleOrchestrator {
    pool: PgPool,
    quotas: QuotaEnforcer,
}

impl LifecycleOrchestrator {
    pub fn new(pool: PgPool) -> Self {
        let quotas = QuotaEnforcer::new(pool.clone());
        LifecycleOrchestrator { pool, quotas }
    }

    /// Resolves the company an operation is scoped to
    ///
    /// Captured once per call; a company switch mid-flight never changes
    /// an operation already running.
    fn scoped_company(
        ctx: &SessionContext,
        capability: Capability,
    ) -> Result<Uuid, EngineError> {
        ctx.active_company()
            .ok_or(EngineError::Unauthorized(capability))
    }

    fn authorize(
        ctx: &SessionContext,
        license: &ResolvedLicense,
        capability: Capability,
    ) -> Result<Uuid, EngineError> {
        if !has_access(ctx, license, capability) {
            return Err(EngineError::Unauthorized(capability));
        }
        Self::scoped_company(ctx, capability)
    }

    /// Moves a request from open to reviewing
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotFound`, `InvalidTransition`, or `Upstream`
    pub async fn review_request(
        &self,
        ctx: &SessionContext,
        license: &ResolvedLicense,
        request_id: Uuid,
    ) -> Result<(), EngineError> {
        let company_id = Self::authorize(ctx, license, Capability::RequestReview)?;

        self.transition_request(
            company_id,
            request_id,
            &[RequestStatus::Open],
            RequestStatus::Reviewing,
            "review",
        )
        .await
    }

    /// Closes a request without converting it
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotFound`, `InvalidTransition`, or `Upstream`
    pub async fn close_request(
        &self,
        ctx: &SessionContext,
        license: &ResolvedLicense,
        request_id: Uuid,
    ) -> Result<(), EngineError> {
        let company_id = Self::authorize(ctx, license, Capability::RequestClose)?;

        self.transition_request(
            company_id,
            request_id,
            &[RequestStatus::Open, RequestStatus::Reviewing],
            RequestStatus::Closed,
            "close",
        )
        .await
    }

    async fn transition_request(
        &self,
        company_id: Uuid,
        request_id: Uuid,
        from: &[RequestStatus],
        to: RequestStatus,
        event: &'static str,
    ) -> Result<(), EngineError> {
        let request = ServiceRequest::find_in_company(&self.pool, company_id, request_id)
            .await?
            .ok_or(EngineError::NotFound("service request"))?;

        let moved =
            ServiceRequest::transition(&self.pool, company_id, request_id, from, to).await?;
        if !moved {
            return Err(EngineError::InvalidTransition {
                entity: "service request",
                from: request.status.as_str().to_string(),
                event,
            });
        }

        tracing::info!(
            company_id = %company_id,
            request_id = %request_id,
            to = to.as_str(),
            "Service request transitioned"
        );
        Ok(())
    }

    /// Converts a request into exactly one work order
    ///
    /// At-most-once: a request that already produced a work order raises
    /// `DuplicateConversion`, with the back-reference unique index
    /// settling any race the fast-path check misses.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `QuotaExceeded`, `NotFound`, `InvalidTransition`,
    /// `DuplicateConversion`, or `Upstream`
    pub async fn convert_request(
        &self,
        ctx: &SessionContext,
        license: &ResolvedLicense,
        request_id: Uuid,
    ) -> Result<WorkOrder, EngineError> {
        let company_id = Self::authorize(ctx, license, Capability::RequestConvert)?;
        self.quotas
            .enforce(company_id, ResourceKind::WorkOrders, license)
            .await?;

        let mut tx = self.pool.begin().await?;

        let request = ServiceRequest::lock_in_company(&mut *tx, company_id, request_id)
            .await?
            .ok_or(EngineError::NotFound("service request"))?;

        if WorkOrder::find_by_service_request(&mut *tx, request_id)
            .await?
            .is_some()
        {
            return Err(EngineError::DuplicateConversion(request_id));
        }

        if !request.status.can_transition_to(RequestStatus::Converted) {
            return Err(EngineError::InvalidTransition {
                entity: "service request",
                from: request.status.as_str().to_string(),
                event: "convert",
            });
        }

        let moved = ServiceRequest::transition(
            &mut *tx,
            company_id,
            request_id,
            &[RequestStatus::Open, RequestStatus::Reviewing],
            RequestStatus::Converted,
        )
        .await?;
        if !moved {
            return Err(EngineError::InvalidTransition {
                entity: "service request",
                from: request.status.as_str().to_string(),
                event: "convert",
            });
        }

        let work_order = WorkOrder::insert(&mut *tx, CreateWorkOrder::from_request(&request))
            .await
            .map_err(|e| EngineError::from_conversion_insert(e, request_id))?;

        tx.commit().await?;

        tracing::info!(
            company_id = %company_id,
            request_id = %request_id,
            work_order_id = %work_order.id,
            "Service request converted"
        );
        Ok(work_order)
    }

    /// Starts a pending work order
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotFound`, `InvalidTransition`, or `Upstream`
    pub async fn start_work_order(
        &self,
        ctx: &SessionContext,
        license: &ResolvedLicense,
        work_order_id: Uuid,
    ) -> Result<(), EngineError> {
        let company_id = Self::authorize(ctx, license, Capability::WorkOrderEdit)?;

        self.transition_work_order(
            company_id,
            work_order_id,
            &[WorkOrderStatus::Pending],
            WorkOrderStatus::InProgress,
            "start",
        )
        .await
    }

    /// Cancels a work order that has not completed
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotFound`, `InvalidTransition`, or `Upstream`
    pub async fn cancel_work_order(
        &self,
        ctx: &SessionContext,
        license: &ResolvedLicense,
        work_order_id: Uuid,
    ) -> Result<(), EngineError> {
        let company_id = Self::authorize(ctx, license, Capability::WorkOrderEdit)?;

        self.transition_work_order(
            company_id,
            work_order_id,
            &[WorkOrderStatus::Pending, WorkOrderStatus::InProgress],
            WorkOrderStatus::Cancelled,
            "cancel",
        )
        .await
    }

    async fn transition_work_order(
        &self,
        company_id: Uuid,
        work_order_id: Uuid,
        from: &[WorkOrderStatus],
        to: WorkOrderStatus,
        event: &'static str,
    ) -> Result<(), EngineError> {
        let work_order = WorkOrder::find_in_company(&self.pool, company_id, work_order_id)
            .await?
            .ok_or(EngineError::NotFound("work order"))?;

        let moved =
            WorkOrder::transition(&self.pool, company_id, work_order_id, from, to).await?;
        if !moved {
            return Err(EngineError::InvalidTransition {
                entity: "work order",
                from: work_order.status.as_str().to_string(),
                event,
            });
        }

        tracing::info!(
            company_id = %company_id,
            work_order_id = %work_order_id,
            to = to.as_str(),
            "Work order transitioned"
        );
        Ok(())
    }

    /// Completes a work order, writing the equipment's history entry
    ///
    /// When the work order references equipment, the maintenance record
    /// is inserted in the same transaction as the status update; this is
    /// the only path that creates maintenance records. A work order with
    /// no equipment completes without a record.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `QuotaExceeded`, `NotFound`, `InvalidTransition`,
    /// or `Upstream`
    pub async fn complete_work_order(
        &self,
        ctx: &SessionContext,
        license: &ResolvedLicense,
        work_order_id: Uuid,
    ) -> Result<Option<MaintenanceRecord>, EngineError> {
        let company_id = Self::authorize(ctx, license, Capability::WorkOrderComplete)?;

        // The record insert is a creating mutation, so the maintenance
        // quota applies when there is equipment to record against.
        let preview = WorkOrder::find_in_company(&self.pool, company_id, work_order_id)
            .await?
            .ok_or(EngineError::NotFound("work order"))?;
        if preview.equipment_id.is_some() {
            self.quotas
                .enforce(company_id, ResourceKind::Maintenances, license)
                .await?;
        }

        let mut tx = self.pool.begin().await?;

        let work_order = WorkOrder::lock_in_company(&mut *tx, company_id, work_order_id)
            .await?
            .ok_or(EngineError::NotFound("work order"))?;

        let moved = WorkOrder::transition(
            &mut *tx,
            company_id,
            work_order_id,
            &[WorkOrderStatus::Pending, WorkOrderStatus::InProgress],
            WorkOrderStatus::Completed,
        )
        .await?;
        if !moved {
            return Err(EngineError::InvalidTransition {
                entity: "work order",
                from: work_order.status.as_str().to_string(),
                event: "complete",
            });
        }

        let record = if work_order.equipment_id.is_some() {
            Some(MaintenanceRecord::insert_from_work_order(&mut *tx, &work_order).await?)
        } else {
            None
        };

        tx.commit().await?;

        tracing::info!(
            company_id = %company_id,
            work_order_id = %work_order_id,
            recorded = record.is_some(),
            "Work order completed"
        );
        Ok(record)
    }
}

// Pure state-machine logic is tested on the models; the orchestrator's
// behavior is covered by tests/engine_tests.rs against a database.
