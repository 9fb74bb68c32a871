/// Equipment model and database operations
///
/// Equipment rows are the maintained assets. An equipment owns zero or more
/// maintenance records and work orders over its lifetime; its history is the
/// ordered list of maintenance records referencing it.
///
/// All lookups are company-scoped: an equipment id from another tenant
/// resolves to no row, never to another tenant's data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Equipment model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Equipment {
    /// Unique equipment ID
    pub id: Uuid,

    /// Company this equipment belongs to
    pub company_id: Uuid,

    /// Display name
    pub name: String,

    /// Manufacturer serial number
    pub serial_number: Option<String>,

    /// Physical location
    pub location: Option<String>,

    /// When the equipment was created
    pub created_at: DateTime<Utc>,

    /// When the equipment was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating equipment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEquipment {
    /// Company ID
    pub company_id: Uuid,

    /// Display name
    pub name: String,

    /// Manufacturer serial number
    pub serial_number: Option<String>,

    /// Physical location
    pub location: Option<String>,
}

impl Equipment {
    /// Creates a new equipment row
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn create(pool: &PgPool, data: CreateEquipment) -> Result<Self, sqlx::Error> {
        let equipment = sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment (company_id, name, serial_number, location)
            VALUES ($1, $2, $3, $4)
            RETURNING id, company_id, name, serial_number, location, created_at, updated_at
            "#,
        )
        .bind(data.company_id)
        .bind(data.name)
        .bind(data.serial_number)
        .bind(data.location)
        .fetch_one(pool)
        .await?;

        Ok(equipment)
    }

    /// Finds an equipment by ID within a company
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn find_in_company(
        pool: &PgPool,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let equipment = sqlx::query_as::<_, Equipment>(
            r#"
            SELECT id, company_id, name, serial_number, location, created_at, updated_at
            FROM equipment
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(pool)
        .await?;

        Ok(equipment)
    }

    /// Lists a company's equipment
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn list_by_company(pool: &PgPool, company_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let equipment = sqlx::query_as::<_, Equipment>(
            r#"
            SELECT id, company_id, name, serial_number, location, created_at, updated_at
            FROM equipment
            WHERE company_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(pool)
        .await?;

        Ok(equipment)
    }

    /// Counts a company's equipment
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn count_by_company(pool: &PgPool, company_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM equipment WHERE company_id = $1")
                .bind(company_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Deletes an equipment within a company
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn delete_in_company(
        pool: &PgPool,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    // Equipment has no pure logic; integration tests are in tests/model_tests.rs
}
