/// Quota enforcement
///
/// The pure decision is `can_create`: a quota and a live count in, allow
/// or deny out. `QuotaEnforcer` wraps it with the per-kind count queries
/// and is consulted immediately before every creating mutation. Display
/// layers may show the same result earlier, but the check that matters
/// is the one right before the insert.
///
/// The count and the insert are still two statements, so two callers
/// racing a quota boundary can both pass. Deployments wanting a hard
/// guarantee wrap count plus insert in a serializable transaction; this
/// check is the fast-path, user-facing error.

use sqlx::PgPool;
use uuid::Uuid;

use fieldops_shared::models::company::Company;
use fieldops_shared::models::equipment::Equipment;
use fieldops_shared::models::license::{Quota, ResourceKind};
use fieldops_shared::models::maintenance::MaintenanceRecord;
use fieldops_shared::models::membership::Membership;
use fieldops_shared::models::part::Part;
use fieldops_shared::models::service_request::ServiceRequest;
use fieldops_shared::models::work_order::WorkOrder;

use crate::error::EngineError;
use crate::license::ResolvedLicense;

/// Whether one more row of a kind may be created under a quota
pub fn can_create(quota: Quota, current_count: i64) -> bool {
    match quota {
        Quota::Unbounded => true,
        Quota::Limited(limit) => current_count < limit,
    }
}

/// Outcome of a quota check, suitable for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaCheckResult {
    /// The kind that was checked
    pub kind: ResourceKind,

    /// Whether one more row may be created
    pub allowed: bool,

    /// Live rows of the kind in the company
    pub current: i64,

    /// The quota limit; None when unbounded
    pub limit: Option<i64>,
}

impl QuotaCheckResult {
    /// Rows remaining under the quota; None when unbounded
    pub fn remaining(&self) -> Option<i64> {
        self.limit.map(|limit| (limit - self.current).max(0))
    }
}

/// Counts live rows and applies plan quotas
#[derive(Debug, Clone)]
pub struct QuotaEnforcer {
    pool: PgPool,
}

impl QuotaEnforcer {
    pub fn new(pool: PgPool) -> Self {
        QuotaEnforcer { pool }
    }

    /// Counts the live rows of a kind within a company
    ///
    /// The companies kind counts companies owned by this company's
    /// owner, since the plan belongs to the owner's account; users
    /// counts memberships.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the company is missing (companies kind
    /// only), or `Upstream` if the database fails
    pub async fn current_count(
        &self,
        company_id: Uuid,
        kind: ResourceKind,
    ) -> Result<i64, EngineError> {
        let count = match kind {
            ResourceKind::Companies => {
                let company = Company::find_by_id(&self.pool, company_id)
                    .await?
                    .ok_or(EngineError::NotFound("company"))?;
                Company::count_owned_by(&self.pool, company.owner_id).await?
            }
            ResourceKind::Users => Membership::count_by_company(&self.pool, company_id).await?,
            ResourceKind::Equipment => Equipment::count_by_company(&self.pool, company_id).await?,
            ResourceKind::Requests => {
                ServiceRequest::count_by_company(&self.pool, company_id).await?
            }
            ResourceKind::WorkOrders => WorkOrder::count_by_company(&self.pool, company_id).await?,
            ResourceKind::Maintenances => {
                MaintenanceRecord::count_by_company(&self.pool, company_id).await?
            }
            ResourceKind::Parts => Part::count_by_company(&self.pool, company_id).await?,
        };

        Ok(count)
    }

    /// Checks whether one more row of a kind may be created
    ///
    /// # Errors
    ///
    /// Returns `Upstream` if the database fails
    pub async fn check(
        &self,
        company_id: Uuid,
        kind: ResourceKind,
        license: &ResolvedLicense,
    ) -> Result<QuotaCheckResult, EngineError> {
        let quota = license.quota(kind);

        // Counted even when unbounded so `current` is always the live
        // count a display layer can show.
        let current = self.current_count(company_id, kind).await?;
        let allowed = can_create(quota, current);

        let limit = match quota {
            Quota::Limited(limit) => Some(limit),
            Quota::Unbounded => None,
        };

        if !allowed {
            tracing::debug!(
                company_id = %company_id,
                kind = kind.as_str(),
                current,
                limit = ?limit,
                "Quota check denied"
            );
        }

        Ok(QuotaCheckResult {
            kind,
            allowed,
            current,
            limit,
        })
    }

    /// Checks a quota and converts denial into an error
    ///
    /// # Errors
    ///
    /// Returns `QuotaExceeded` when the quota is full, or `Upstream` if
    /// the database fails
    pub async fn enforce(
        &self,
        company_id: Uuid,
        kind: ResourceKind,
        license: &ResolvedLicense,
    ) -> Result<(), EngineError> {
        let result = self.check(company_id, kind, license).await?;
        if result.allowed {
            Ok(())
        } else {
            Err(EngineError::QuotaExceeded {
                kind,
                limit: result.limit.unwrap_or(0),
                current: result.current,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_always_allows() {
        assert!(can_create(Quota::Unbounded, 0));
        assert!(can_create(Quota::Unbounded, i64::MAX));
    }

    #[test]
    fn test_limited_boundary() {
        let quota = Quota::Limited(5);
        assert!(can_create(quota, 4));
        assert!(!can_create(quota, 5));
        assert!(!can_create(quota, 6));
    }

    #[test]
    fn test_zero_quota_denies() {
        assert!(!can_create(Quota::Limited(0), 0));
    }

    #[test]
    fn test_remaining() {
        let result = QuotaCheckResult {
            kind: ResourceKind::Equipment,
            allowed: true,
            current: 3,
            limit: Some(5),
        };
        assert_eq!(result.remaining(), Some(2));

        let full = QuotaCheckResult {
            kind: ResourceKind::Equipment,
            allowed: false,
            current: 7,
            limit: Some(5),
        };
        assert_eq!(full.remaining(), Some(0));

        let unbounded = QuotaCheckResult {
            kind: ResourceKind::Equipment,
            allowed: true,
            current: 7,
            limit: None,
        };
        assert_eq!(unbounded.remaining(), None);
    }

    // Integration tests for QuotaEnforcer are in tests/engine_tests.rs
}
