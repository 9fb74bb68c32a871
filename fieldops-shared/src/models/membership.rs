/// Company membership model and database operations
///
/// This module provides the membership model for user-company relationships
/// with role-based access control: a many-to-many association carrying a
/// company-scoped role.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE company_role AS ENUM ('company_admin', 'company_technician', 'company_viewer');
///
/// CREATE TABLE company_memberships (
///     company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role company_role NOT NULL DEFAULT 'company_viewer',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (company_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **company_admin**: manage the company, members, licenses, all records
/// - **company_technician**: work equipment, requests, work orders
/// - **company_viewer**: read-only access
///
/// The company owner is treated as `company_admin` regardless of their
/// membership row; that override lives in the engine's session context.
///
/// # Example
///
/// ```no_run
/// use fieldops_shared::models::membership::{Membership, CreateMembership, CompanyRole};
/// use fieldops_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(company_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let membership = Membership::create(&pool, CreateMembership {
///     company_id,
///     user_id,
///     role: CompanyRole::Technician,
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Company-scoped roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "company_role")]
pub enum CompanyRole {
    /// Manage the company, members, licenses, and all records
    #[sqlx(rename = "company_admin")]
    #[serde(rename = "company_admin")]
    Admin,

    /// Work equipment, requests, and work orders
    #[sqlx(rename = "company_technician")]
    #[serde(rename = "company_technician")]
    Technician,

    /// Read-only access
    #[sqlx(rename = "company_viewer")]
    #[serde(rename = "company_viewer")]
    Viewer,
}

impl CompanyRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyRole::Admin => "company_admin",
            CompanyRole::Technician => "company_technician",
            CompanyRole::Viewer => "company_viewer",
        }
    }

    /// Parses role from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "company_admin" => Some(CompanyRole::Admin),
            "company_technician" => Some(CompanyRole::Technician),
            "company_viewer" => Some(CompanyRole::Viewer),
            _ => None,
        }
    }

    /// Checks if this role has permission level of the required role
    ///
    /// Hierarchy: Admin > Technician > Viewer
    pub fn has_permission(&self, required: &CompanyRole) -> bool {
        self.permission_level() >= required.permission_level()
    }

    fn permission_level(&self) -> u8 {
        match self {
            CompanyRole::Admin => 3,
            CompanyRole::Technician => 2,
            CompanyRole::Viewer => 1,
        }
    }
}

/// Membership model representing a user-company relationship with role
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Company ID
    pub company_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the company
    pub role: CompanyRole,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    /// Company ID
    pub company_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role to assign (defaults to Viewer)
    #[serde(default = "default_role")]
    pub role: CompanyRole,
}

fn default_role() -> CompanyRole {
    CompanyRole::Viewer
}

/// Input for inviting a user by email
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InviteMember {
    /// Company to invite into
    pub company_id: Uuid,

    /// Invitee email; resolved to a user id without leaking whether the
    /// address exists (unknown emails simply produce no membership)
    #[validate(email)]
    pub email: String,

    /// Role to assign
    #[serde(default = "default_role")]
    pub role: CompanyRole,
}

/// Member display details resolved through a tenant-scoped join
///
/// Exposes only the columns a member list needs; no other tenants' data
/// is reachable through this query.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberDetails {
    /// User ID
    pub user_id: Uuid,

    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Company-scoped role
    pub role: CompanyRole,
}

/// A user's membership joined with company name and ownership
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MembershipOverview {
    /// Company ID
    pub company_id: Uuid,

    /// Company display name
    pub company_name: String,

    /// Company-scoped role
    pub role: CompanyRole,

    /// Whether the user owns this company
    pub is_owner: bool,
}

impl Membership {
    /// Creates a new membership (adds user to company)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Membership already exists (unique constraint violation)
    /// - Company or user doesn't exist (foreign key violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateMembership) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO company_memberships (company_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING company_id, user_id, role, created_at
            "#,
        )
        .bind(data.company_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        tracing::info!(
            company_id = %membership.company_id,
            user_id = %membership.user_id,
            role = membership.role.as_str(),
            "Membership created"
        );
        Ok(membership)
    }

    /// Finds a specific membership by company and user
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn find(
        pool: &PgPool,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT company_id, user_id, role, created_at
            FROM company_memberships
            WHERE company_id = $1 AND user_id = $2
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Gets a user's role in a company
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn get_role(
        pool: &PgPool,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CompanyRole>, sqlx::Error> {
        let role: Option<CompanyRole> = sqlx::query_scalar(
            r#"
            SELECT role FROM company_memberships
            WHERE company_id = $1 AND user_id = $2
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Updates a user's role in a company
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn update_role(
        pool: &PgPool,
        company_id: Uuid,
        user_id: Uuid,
        role: CompanyRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            UPDATE company_memberships
            SET role = $3
            WHERE company_id = $1 AND user_id = $2
            RETURNING company_id, user_id, role, created_at
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Removes a user from a company
    ///
    /// The owner's membership cannot be removed while they remain owner;
    /// the DELETE is conditional on the user not owning the company, so a
    /// removal attempt against the owner returns false.
    ///
    /// # Returns
    ///
    /// True if the membership was deleted, false if it didn't exist or the
    /// user is the company owner
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn delete(pool: &PgPool, company_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM company_memberships
            WHERE company_id = $1 AND user_id = $2
              AND NOT EXISTS (
                  SELECT 1 FROM companies
                  WHERE id = $1 AND owner_id = $2
              )
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all memberships a user holds
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, Membership>(
            r#"
            SELECT company_id, user_id, role, created_at
            FROM company_memberships
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }

    /// Lists a user's memberships joined with company name and ownership
    ///
    /// This is the view a session is built from: one row per company the
    /// user belongs to, with the role and whether they own the company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn overview_by_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<MembershipOverview>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, MembershipOverview>(
            r#"
            SELECT m.company_id, c.name AS company_name, m.role,
                   (c.owner_id = m.user_id) AS is_owner
            FROM company_memberships m
            JOIN companies c ON c.id = m.company_id
            WHERE m.user_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }

    /// Resolves member display details for a company
    ///
    /// Tenant-scoped join of memberships and users; returns only id, name,
    /// email, and role.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn member_details(
        pool: &PgPool,
        company_id: Uuid,
    ) -> Result<Vec<MemberDetails>, sqlx::Error> {
        let members = sqlx::query_as::<_, MemberDetails>(
            r#"
            SELECT m.user_id, u.name, u.email, m.role
            FROM company_memberships m
            JOIN users u ON u.id = m.user_id
            WHERE m.company_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    /// Counts members in a company
    ///
    /// This is the counting basis for the `users` quota.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn count_by_company(pool: &PgPool, company_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM company_memberships WHERE company_id = $1")
                .bind(company_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_company_role_as_str() {
        assert_eq!(CompanyRole::Admin.as_str(), "company_admin");
        assert_eq!(CompanyRole::Technician.as_str(), "company_technician");
        assert_eq!(CompanyRole::Viewer.as_str(), "company_viewer");
    }

    #[test]
    fn test_company_role_from_str() {
        assert_eq!(CompanyRole::from_str("company_admin"), Some(CompanyRole::Admin));
        assert_eq!(
            CompanyRole::from_str("company_technician"),
            Some(CompanyRole::Technician)
        );
        assert_eq!(CompanyRole::from_str("company_viewer"), Some(CompanyRole::Viewer));
        assert_eq!(CompanyRole::from_str("owner"), None);
    }

    #[test]
    fn test_role_hierarchy() {
        assert!(CompanyRole::Admin.has_permission(&CompanyRole::Viewer));
        assert!(CompanyRole::Admin.has_permission(&CompanyRole::Technician));
        assert!(CompanyRole::Admin.has_permission(&CompanyRole::Admin));

        assert!(CompanyRole::Technician.has_permission(&CompanyRole::Viewer));
        assert!(!CompanyRole::Technician.has_permission(&CompanyRole::Admin));

        assert!(CompanyRole::Viewer.has_permission(&CompanyRole::Viewer));
        assert!(!CompanyRole::Viewer.has_permission(&CompanyRole::Technician));
    }

    #[test]
    fn test_create_membership_default_role() {
        assert_eq!(default_role(), CompanyRole::Viewer);
    }

    #[test]
    fn test_invite_member_email_validation() {
        let invite = InviteMember {
            company_id: Uuid::new_v4(),
            email: "not-an-email".to_string(),
            role: CompanyRole::Viewer,
        };
        assert!(invite.validate().is_err());

        let invite = InviteMember {
            company_id: Uuid::new_v4(),
            email: "tech@example.com".to_string(),
            role: CompanyRole::Viewer,
        };
        assert!(invite.validate().is_ok());
    }

    // Integration tests for database operations are in tests/model_tests.rs
}
