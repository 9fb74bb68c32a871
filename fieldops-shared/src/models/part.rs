/// Part inventory model
///
/// Parts are plain inventory rows. The engine only creates and counts
/// them; stock management beyond that lives elsewhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Part model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Part {
    /// Unique part ID
    pub id: Uuid,

    /// Company this part belongs to
    pub company_id: Uuid,

    /// Part name
    pub name: String,

    /// Quantity on hand
    pub quantity: i64,

    /// When the part was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a part
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePart {
    /// Company ID
    pub company_id: Uuid,

    /// Part name
    pub name: String,

    /// Initial quantity
    #[serde(default)]
    pub quantity: i64,
}

impl Part {
    /// Creates a new part
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn create(pool: &PgPool, data: CreatePart) -> Result<Self, sqlx::Error> {
        let part = sqlx::query_as::<_, Part>(
            r#"
            INSERT INTO parts (company_id, name, quantity)
            VALUES ($1, $2, $3)
            RETURNING id, company_id, name, quantity, created_at
            "#,
        )
        .bind(data.company_id)
        .bind(data.name)
        .bind(data.quantity)
        .fetch_one(pool)
        .await?;

        Ok(part)
    }

    /// Counts a company's parts
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn count_by_company(pool: &PgPool, company_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM parts WHERE company_id = $1")
                .bind(company_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}
