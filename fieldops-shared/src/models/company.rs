/// Company model and database operations
///
/// Companies are the tenant boundary for multi-tenant isolation. Every
/// operational row (license, membership, equipment, request, work order,
/// maintenance record) belongs to exactly one company.
///
/// A company always has exactly one owner. Creating a company also creates
/// the owner's `company_admin` membership in the same transaction, so the
/// owner is never left without tenant access.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE companies (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use fieldops_shared::models::company::{Company, CreateCompany};
/// use fieldops_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(owner_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let company = Company::create(&pool, CreateCompany {
///     name: "Acme Maintenance".to_string(),
///     owner_id,
/// }).await?;
/// println!("Created company: {}", company.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Company model representing a tenant
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    /// Unique company ID
    pub id: Uuid,

    /// Company name
    pub name: String,

    /// Owning user; exactly one per company
    pub owner_id: Uuid,

    /// When the company was created
    pub created_at: DateTime<Utc>,

    /// When the company was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCompany {
    /// Company name
    pub name: String,

    /// Owning user
    pub owner_id: Uuid,
}

impl Company {
    /// Creates a new company and the owner's membership
    ///
    /// Both writes happen in one transaction: the company row and a
    /// `company_admin` membership for the owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner doesn't exist or the database
    /// connection fails.
    pub async fn create(pool: &PgPool, data: CreateCompany) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (name, owner_id)
            VALUES ($1, $2)
            RETURNING id, name, owner_id, created_at, updated_at
            "#,
        )
        .bind(&data.name)
        .bind(data.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO company_memberships (company_id, user_id, role)
            VALUES ($1, $2, 'company_admin')
            "#,
        )
        .bind(company.id)
        .bind(data.owner_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(company_id = %company.id, owner_id = %data.owner_id, "Company created");
        Ok(company)
    }

    /// Finds a company by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT id, name, owner_id, created_at, updated_at
            FROM companies
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(company)
    }

    /// Renames a company
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn rename(pool: &PgPool, id: Uuid, name: &str) -> Result<Option<Self>, sqlx::Error> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, owner_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(company)
    }

    /// Counts companies owned by a user
    ///
    /// This is the counting basis for the `companies` quota.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn count_owned_by(pool: &PgPool, owner_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM companies WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Deletes a company by ID
    ///
    /// All company-scoped rows (memberships, licenses, equipment, requests,
    /// work orders, maintenance records, parts) cascade.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::warn!(company_id = %id, "Company deleted with all scoped data");
        }

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    // Company has no pure logic; all operations hit the database.
    // Integration tests are in tests/model_tests.rs
}
