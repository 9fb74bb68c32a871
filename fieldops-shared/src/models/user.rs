/// User model and database operations
///
/// Users are created at registration through the external identity provider;
/// this model stores the profile attributes attached at signup plus the
/// persisted active-company pointer.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE global_role AS ENUM ('admin', 'technician', 'client');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     name VARCHAR(255) NOT NULL,
///     role global_role NOT NULL DEFAULT 'client',
///     active_company_id UUID REFERENCES companies(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use fieldops_shared::models::user::{User, CreateUser, GlobalRole};
/// use fieldops_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "tech@example.com".to_string(),
///     name: "Sam Ortiz".to_string(),
///     role: GlobalRole::Technician,
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Global (platform-wide) roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "global_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GlobalRole {
    /// Platform administrator; bypasses every company-scoped check
    Admin,

    /// Service provider; works inside one or more companies
    Technician,

    /// Customer; raises service requests
    Client,
}

impl GlobalRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalRole::Admin => "admin",
            GlobalRole::Technician => "technician",
            GlobalRole::Client => "client",
        }
    }

    /// Parses role from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(GlobalRole::Admin),
            "technician" => Some(GlobalRole::Technician),
            "client" => Some(GlobalRole::Client),
            _ => None,
        }
    }
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (matches the identity provider's stable id)
    pub id: Uuid,

    /// Email address (unique)
    pub email: String,

    /// Display name
    pub name: String,

    /// Global role
    pub role: GlobalRole,

    /// Persisted active company; validated against memberships on session load
    pub active_company_id: Option<Uuid>,

    /// When the user was created
    pub created_at: DateTime<Utc>,

    /// When the user was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// Display name
    pub name: String,

    /// Global role (defaults to Client)
    #[serde(default = "default_role")]
    pub role: GlobalRole,
}

fn default_role() -> GlobalRole {
    GlobalRole::Client
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists or the database
    /// connection fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, role)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, role, active_company_id, created_at, updated_at
            "#,
        )
        .bind(data.email)
        .bind(data.name)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, role, active_company_id, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Looks up a user id by email
    ///
    /// Used by membership invitations. An unknown email returns `None`
    /// rather than an error, so invitation flows can report "no such user"
    /// without special-casing database failures.
    ///
    /// # Errors
    ///
    /// Returns an error only if the database connection fails
    pub async fn find_id_by_email(pool: &PgPool, email: &str) -> Result<Option<Uuid>, sqlx::Error> {
        let id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM users WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(id)
    }

    /// Persists the user's active company choice
    ///
    /// Passing `None` clears the pointer.
    ///
    /// # Returns
    ///
    /// True if the user row was updated, false if the user doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn set_active_company(
        pool: &PgPool,
        user_id: Uuid,
        company_id: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET active_company_id = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(company_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user by ID
    ///
    /// Memberships cascade; owned companies block the delete (RESTRICT).
    ///
    /// # Errors
    ///
    /// Returns an error if the user still owns a company or the database
    /// connection fails
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_role_as_str() {
        assert_eq!(GlobalRole::Admin.as_str(), "admin");
        assert_eq!(GlobalRole::Technician.as_str(), "technician");
        assert_eq!(GlobalRole::Client.as_str(), "client");
    }

    #[test]
    fn test_global_role_from_str() {
        assert_eq!(GlobalRole::from_str("admin"), Some(GlobalRole::Admin));
        assert_eq!(GlobalRole::from_str("technician"), Some(GlobalRole::Technician));
        assert_eq!(GlobalRole::from_str("client"), Some(GlobalRole::Client));
        assert_eq!(GlobalRole::from_str("owner"), None);
    }

    #[test]
    fn test_create_user_default_role() {
        assert_eq!(default_role(), GlobalRole::Client);
    }

    // Integration tests for database operations are in tests/model_tests.rs
}
