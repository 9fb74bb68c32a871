/// License and plan models
///
/// A company purchases a license referencing a `LicenseType` (the plan
/// definition). The license is the sole source of truth for the company's
/// quota limits and feature flags. At most one usable license exists per
/// company; the schema enforces this with a partial unique index over
/// status in (trialing, active).
///
/// # Schema
///
/// ```sql
/// CREATE TYPE license_status AS ENUM (
///     'trialing', 'active', 'past_due', 'canceled', 'expired', 'inactive'
/// );
///
/// CREATE TABLE license_types (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL UNIQUE,
///     max_companies BIGINT,       -- NULL = unbounded, same for the rest
///     max_users BIGINT,
///     max_equipment BIGINT,
///     max_requests BIGINT,
///     max_work_orders BIGINT,
///     max_maintenances BIGINT,
///     max_parts BIGINT,
///     work_orders_enabled BOOLEAN NOT NULL DEFAULT TRUE,
///     maintenance_enabled BOOLEAN NOT NULL DEFAULT TRUE,
///     parts_enabled BOOLEAN NOT NULL DEFAULT FALSE,
///     invitations_enabled BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE licenses (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
///     license_type_id UUID NOT NULL REFERENCES license_types(id) ON DELETE RESTRICT,
///     status license_status NOT NULL DEFAULT 'trialing',
///     valid_from TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     valid_until TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// License status
///
/// Only `trialing` and `active` grant access; every other status leaves the
/// company effectively unlicensed (default-deny).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "license_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    /// Trial period, full access
    Trialing,

    /// Paid and current
    Active,

    /// Payment failed; treated as unlicensed, no grace period
    PastDue,

    /// Canceled by the customer
    Canceled,

    /// Validity window elapsed
    Expired,

    /// Administratively disabled
    Inactive,
}

impl LicenseStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseStatus::Trialing => "trialing",
            LicenseStatus::Active => "active",
            LicenseStatus::PastDue => "past_due",
            LicenseStatus::Canceled => "canceled",
            LicenseStatus::Expired => "expired",
            LicenseStatus::Inactive => "inactive",
        }
    }

    /// Parses status from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "trialing" => Some(LicenseStatus::Trialing),
            "active" => Some(LicenseStatus::Active),
            "past_due" => Some(LicenseStatus::PastDue),
            "canceled" => Some(LicenseStatus::Canceled),
            "expired" => Some(LicenseStatus::Expired),
            "inactive" => Some(LicenseStatus::Inactive),
            _ => None,
        }
    }

    /// Whether this status grants access to licensed features
    pub fn is_usable(&self) -> bool {
        matches!(self, LicenseStatus::Trialing | LicenseStatus::Active)
    }
}

/// Quota-controlled resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Companies owned by the company's owner
    Companies,

    /// Members of the company
    Users,

    /// Equipment rows
    Equipment,

    /// Service requests
    Requests,

    /// Work orders
    WorkOrders,

    /// Maintenance records
    Maintenances,

    /// Parts
    Parts,
}

impl ResourceKind {
    /// Human-readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Companies => "companies",
            ResourceKind::Users => "users",
            ResourceKind::Equipment => "equipment",
            ResourceKind::Requests => "requests",
            ResourceKind::WorkOrders => "work_orders",
            ResourceKind::Maintenances => "maintenances",
            ResourceKind::Parts => "parts",
        }
    }

    /// All quota-controlled kinds
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Companies,
        ResourceKind::Users,
        ResourceKind::Equipment,
        ResourceKind::Requests,
        ResourceKind::WorkOrders,
        ResourceKind::Maintenances,
        ResourceKind::Parts,
    ];
}

/// A plan-defined quota for one resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quota {
    /// No limit
    Unbounded,

    /// At most this many live rows
    Limited(i64),
}

impl Quota {
    /// Builds a quota from a nullable database column (NULL = unbounded)
    pub fn from_column(value: Option<i64>) -> Self {
        match value {
            Some(limit) => Quota::Limited(limit),
            None => Quota::Unbounded,
        }
    }
}

/// Plan-limited feature flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureFlag {
    /// Work order management, including request conversion
    WorkOrders,

    /// Maintenance history
    Maintenance,

    /// Parts catalog
    Parts,

    /// Member invitations
    Invitations,
}

/// The feature flag set of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Work order management enabled
    pub work_orders: bool,

    /// Maintenance history enabled
    pub maintenance: bool,

    /// Parts catalog enabled
    pub parts: bool,

    /// Member invitations enabled
    pub invitations: bool,
}

impl FeatureFlags {
    /// Every flag off
    pub fn none() -> Self {
        FeatureFlags {
            work_orders: false,
            maintenance: false,
            parts: false,
            invitations: false,
        }
    }

    /// Every flag on
    pub fn all() -> Self {
        FeatureFlags {
            work_orders: true,
            maintenance: true,
            parts: true,
            invitations: true,
        }
    }

    /// Checks a single flag
    pub fn contains(&self, flag: FeatureFlag) -> bool {
        match flag {
            FeatureFlag::WorkOrders => self.work_orders,
            FeatureFlag::Maintenance => self.maintenance,
            FeatureFlag::Parts => self.parts,
            FeatureFlag::Invitations => self.invitations,
        }
    }
}

/// Plan definition: quotas per resource kind plus feature flags
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LicenseType {
    /// Unique plan ID
    pub id: Uuid,

    /// Plan name (unique)
    pub name: String,

    /// Quota columns; NULL = unbounded
    pub max_companies: Option<i64>,
    pub max_users: Option<i64>,
    pub max_equipment: Option<i64>,
    pub max_requests: Option<i64>,
    pub max_work_orders: Option<i64>,
    pub max_maintenances: Option<i64>,
    pub max_parts: Option<i64>,

    /// Feature flag columns
    pub work_orders_enabled: bool,
    pub maintenance_enabled: bool,
    pub parts_enabled: bool,
    pub invitations_enabled: bool,

    /// When the plan was created
    pub created_at: DateTime<Utc>,
}

impl LicenseType {
    /// Gets the quota for a resource kind
    pub fn quota(&self, kind: ResourceKind) -> Quota {
        let column = match kind {
            ResourceKind::Companies => self.max_companies,
            ResourceKind::Users => self.max_users,
            ResourceKind::Equipment => self.max_equipment,
            ResourceKind::Requests => self.max_requests,
            ResourceKind::WorkOrders => self.max_work_orders,
            ResourceKind::Maintenances => self.max_maintenances,
            ResourceKind::Parts => self.max_parts,
        };
        Quota::from_column(column)
    }

    /// Gets the plan's feature flags
    pub fn flags(&self) -> FeatureFlags {
        FeatureFlags {
            work_orders: self.work_orders_enabled,
            maintenance: self.maintenance_enabled,
            parts: self.parts_enabled,
            invitations: self.invitations_enabled,
        }
    }

    /// Finds a plan by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let license_type = sqlx::query_as::<_, LicenseType>(
            r#"
            SELECT id, name,
                   max_companies, max_users, max_equipment, max_requests,
                   max_work_orders, max_maintenances, max_parts,
                   work_orders_enabled, maintenance_enabled, parts_enabled,
                   invitations_enabled, created_at
            FROM license_types
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(license_type)
    }
}

/// License model: a company's purchased plan instance
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct License {
    /// Unique license ID
    pub id: Uuid,

    /// Company this license belongs to
    pub company_id: Uuid,

    /// The plan this license instantiates
    pub license_type_id: Uuid,

    /// Current status
    pub status: LicenseStatus,

    /// Start of the validity window
    pub valid_from: DateTime<Utc>,

    /// End of the validity window (NULL = open-ended)
    pub valid_until: Option<DateTime<Utc>>,

    /// When the license was created
    pub created_at: DateTime<Utc>,

    /// When the license was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a license
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLicense {
    /// Company ID
    pub company_id: Uuid,

    /// Plan to instantiate
    pub license_type_id: Uuid,

    /// Initial status (defaults to Trialing)
    #[serde(default = "default_status")]
    pub status: LicenseStatus,

    /// End of the validity window
    pub valid_until: Option<DateTime<Utc>>,
}

fn default_status() -> LicenseStatus {
    LicenseStatus::Trialing
}

impl License {
    /// Whether this license currently grants access
    ///
    /// Requires a usable status and `now` inside the validity window.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        if !self.status.is_usable() {
            return false;
        }
        if now < self.valid_from {
            return false;
        }
        match self.valid_until {
            Some(until) => now < until,
            None => true,
        }
    }

    /// Creates a license
    ///
    /// # Errors
    ///
    /// Returns an error if the company already has a usable license
    /// (partial unique index) or the database connection fails.
    pub async fn create(pool: &PgPool, data: CreateLicense) -> Result<Self, sqlx::Error> {
        let license = sqlx::query_as::<_, License>(
            r#"
            INSERT INTO licenses (company_id, license_type_id, status, valid_until)
            VALUES ($1, $2, $3, $4)
            RETURNING id, company_id, license_type_id, status,
                      valid_from, valid_until, created_at, updated_at
            "#,
        )
        .bind(data.company_id)
        .bind(data.license_type_id)
        .bind(data.status)
        .bind(data.valid_until)
        .fetch_one(pool)
        .await?;

        tracing::info!(
            company_id = %license.company_id,
            license_id = %license.id,
            status = license.status.as_str(),
            "License created"
        );
        Ok(license)
    }

    /// Finds the company's usable license, if any
    ///
    /// A usable license has status trialing or active and its validity
    /// window contains the current instant. The partial unique index
    /// guarantees at most one such row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn find_usable_by_company(
        pool: &PgPool,
        company_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let license = sqlx::query_as::<_, License>(
            r#"
            SELECT id, company_id, license_type_id, status,
                   valid_from, valid_until, created_at, updated_at
            FROM licenses
            WHERE company_id = $1
              AND status IN ('trialing', 'active')
              AND valid_from <= NOW()
              AND (valid_until IS NULL OR valid_until > NOW())
            "#,
        )
        .bind(company_id)
        .fetch_optional(pool)
        .await?;

        Ok(license)
    }

    /// Updates a license's status
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: LicenseStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let license = sqlx::query_as::<_, License>(
            r#"
            UPDATE licenses
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, company_id, license_type_id, status,
                      valid_from, valid_until, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        if let Some(ref l) = license {
            tracing::info!(license_id = %l.id, status = l.status.as_str(), "License status updated");
        }
        Ok(license)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn license_with(status: LicenseStatus, valid_until: Option<DateTime<Utc>>) -> License {
        let now = Utc::now();
        License {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            license_type_id: Uuid::new_v4(),
            status,
            valid_from: now - Duration::days(1),
            valid_until,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_license_status_as_str() {
        assert_eq!(LicenseStatus::Trialing.as_str(), "trialing");
        assert_eq!(LicenseStatus::PastDue.as_str(), "past_due");
        assert_eq!(LicenseStatus::Expired.as_str(), "expired");
    }

    #[test]
    fn test_license_status_round_trip() {
        for status in [
            LicenseStatus::Trialing,
            LicenseStatus::Active,
            LicenseStatus::PastDue,
            LicenseStatus::Canceled,
            LicenseStatus::Expired,
            LicenseStatus::Inactive,
        ] {
            assert_eq!(LicenseStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(LicenseStatus::from_str("bogus"), None);
    }

    #[test]
    fn test_usable_statuses() {
        assert!(LicenseStatus::Trialing.is_usable());
        assert!(LicenseStatus::Active.is_usable());
        assert!(!LicenseStatus::PastDue.is_usable());
        assert!(!LicenseStatus::Canceled.is_usable());
        assert!(!LicenseStatus::Expired.is_usable());
        assert!(!LicenseStatus::Inactive.is_usable());
    }

    #[test]
    fn test_is_usable_at_window() {
        let now = Utc::now();

        let open_ended = license_with(LicenseStatus::Active, None);
        assert!(open_ended.is_usable_at(now));

        let expiring = license_with(LicenseStatus::Active, Some(now + Duration::days(30)));
        assert!(expiring.is_usable_at(now));
        assert!(!expiring.is_usable_at(now + Duration::days(31)));

        let past_due = license_with(LicenseStatus::PastDue, None);
        assert!(!past_due.is_usable_at(now));
    }

    #[test]
    fn test_quota_from_column() {
        assert_eq!(Quota::from_column(None), Quota::Unbounded);
        assert_eq!(Quota::from_column(Some(5)), Quota::Limited(5));
    }

    #[test]
    fn test_license_type_quota_lookup() {
        let now = Utc::now();
        let plan = LicenseType {
            id: Uuid::new_v4(),
            name: "starter".to_string(),
            max_companies: Some(1),
            max_users: Some(5),
            max_equipment: Some(50),
            max_requests: None,
            max_work_orders: Some(100),
            max_maintenances: None,
            max_parts: Some(0),
            work_orders_enabled: true,
            maintenance_enabled: true,
            parts_enabled: false,
            invitations_enabled: true,
            created_at: now,
        };

        assert_eq!(plan.quota(ResourceKind::Users), Quota::Limited(5));
        assert_eq!(plan.quota(ResourceKind::Requests), Quota::Unbounded);
        assert_eq!(plan.quota(ResourceKind::Parts), Quota::Limited(0));

        let flags = plan.flags();
        assert!(flags.contains(FeatureFlag::WorkOrders));
        assert!(!flags.contains(FeatureFlag::Parts));
    }

    #[test]
    fn test_feature_flags_none_and_all() {
        let none = FeatureFlags::none();
        let all = FeatureFlags::all();
        for flag in [
            FeatureFlag::WorkOrders,
            FeatureFlag::Maintenance,
            FeatureFlag::Parts,
            FeatureFlag::Invitations,
        ] {
            assert!(!none.contains(flag));
            assert!(all.contains(flag));
        }
    }

    // Integration tests for database operations are in tests/model_tests.rs
}
