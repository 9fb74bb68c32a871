/// Maintenance record model and database operations
///
/// A maintenance record is the durable history entry written against a
/// piece of equipment when a work order targeting that equipment is
/// completed. Records are append-only from the engine's point of view:
/// completing a work order is the only creation path, and records are
/// never updated afterward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::work_order::WorkOrder;

/// Maintenance record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "maintenance_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
    Rescheduled,
}

impl MaintenanceStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceStatus::Pending => "pending",
            MaintenanceStatus::InProgress => "in_progress",
            MaintenanceStatus::Completed => "completed",
            MaintenanceStatus::Cancelled => "cancelled",
            MaintenanceStatus::Rescheduled => "rescheduled",
        }
    }
}

/// Maintenance record model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MaintenanceRecord {
    /// Unique record ID
    pub id: Uuid,

    /// Company this record belongs to
    pub company_id: Uuid,

    /// Equipment the work was performed on
    pub equipment_id: Uuid,

    /// Work order whose completion produced this record
    pub work_order_id: Option<Uuid>,

    /// What was done
    pub description: String,

    /// Record status; completion always writes `completed`
    pub status: MaintenanceStatus,

    /// When the work was performed
    pub performed_at: DateTime<Utc>,

    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl MaintenanceRecord {
    /// Writes the history record for a completed work order
    ///
    /// Takes an executor so completion can write the record in the same
    /// transaction as the work order's status update. Callers must check
    /// that the work order targets equipment first; a work order with no
    /// equipment produces no record.
    ///
    /// # Errors
    ///
    /// Returns an error if the work order has no equipment or the
    /// database connection fails
    pub async fn insert_from_work_order(
        executor: impl sqlx::PgExecutor<'_>,
        work_order: &WorkOrder,
    ) -> Result<Self, sqlx::Error> {
        let equipment_id = work_order
            .equipment_id
            .ok_or_else(|| sqlx::Error::Protocol("work order has no equipment".into()))?;

        let record = sqlx::query_as::<_, MaintenanceRecord>(
            r#"
            INSERT INTO maintenance_records
                (company_id, equipment_id, work_order_id, description, status)
            VALUES ($1, $2, $3, $4, 'completed')
            RETURNING id, company_id, equipment_id, work_order_id, description,
                      status, performed_at, created_at
            "#,
        )
        .bind(work_order.company_id)
        .bind(equipment_id)
        .bind(work_order.id)
        .bind(&work_order.description)
        .fetch_one(executor)
        .await?;

        Ok(record)
    }

    /// Lists an equipment's maintenance history, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn list_by_equipment(
        pool: &PgPool,
        company_id: Uuid,
        equipment_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let records = sqlx::query_as::<_, MaintenanceRecord>(
            r#"
            SELECT id, company_id, equipment_id, work_order_id, description,
                   status, performed_at, created_at
            FROM maintenance_records
            WHERE company_id = $1 AND equipment_id = $2
            ORDER BY performed_at DESC
            "#,
        )
        .bind(company_id)
        .bind(equipment_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Counts a company's maintenance records
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn count_by_company(pool: &PgPool, company_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM maintenance_records WHERE company_id = $1")
                .bind(company_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(MaintenanceStatus::Pending.as_str(), "pending");
        assert_eq!(MaintenanceStatus::InProgress.as_str(), "in_progress");
        assert_eq!(MaintenanceStatus::Completed.as_str(), "completed");
        assert_eq!(MaintenanceStatus::Cancelled.as_str(), "cancelled");
        assert_eq!(MaintenanceStatus::Rescheduled.as_str(), "rescheduled");
    }

    // Integration tests for database operations are in tests/model_tests.rs
}
