/// License resolution
///
/// Joins a company's usable license with its plan's quotas and feature
/// flags into a `ResolvedLicense` snapshot. A company with no usable
/// license resolves to the unlicensed sentinel: every quota zero, every
/// flag off, so an unlicensed tenant is denied by default rather than
/// granted by omission.
///
/// The resolver never caches. Quotas and flags change whenever a license
/// row changes, so callers re-resolve after any license mutation instead
/// of holding a snapshot across writes.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use fieldops_shared::models::license::{
    FeatureFlag, FeatureFlags, License, LicenseStatus, LicenseType, Quota, ResourceKind,
};

use crate::error::EngineError;

/// A company's resolved license: plan quotas and flags joined with the
/// license's status
///
/// Plain snapshot, safe to hand to the presentation layer for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLicense {
    /// The license row, if one is usable
    pub license_id: Option<Uuid>,

    /// Status of the usable license, if any
    pub status: Option<LicenseStatus>,

    /// Plan name, if licensed
    pub plan_name: Option<String>,

    /// Per-resource-kind quotas
    quotas: [Quota; ResourceKind::ALL.len()],

    /// Plan feature flags
    pub flags: FeatureFlags,
}

impl ResolvedLicense {
    /// The default-deny sentinel for a company with no usable license
    pub fn unlicensed() -> Self {
        ResolvedLicense {
            license_id: None,
            status: None,
            plan_name: None,
            quotas: [Quota::Limited(0); ResourceKind::ALL.len()],
            flags: FeatureFlags::none(),
        }
    }

    /// Builds a snapshot from a usable license and its plan
    pub fn from_plan(license: &License, plan: &LicenseType) -> Self {
        let mut quotas = [Quota::Unbounded; ResourceKind::ALL.len()];
        for (slot, kind) in quotas.iter_mut().zip(ResourceKind::ALL) {
            *slot = plan.quota(kind);
        }

        ResolvedLicense {
            license_id: Some(license.id),
            status: Some(license.status),
            plan_name: Some(plan.name.clone()),
            quotas,
            flags: plan.flags(),
        }
    }

    /// Whether a usable license backs this snapshot
    pub fn is_licensed(&self) -> bool {
        self.license_id.is_some()
    }

    /// The quota for a resource kind
    pub fn quota(&self, kind: ResourceKind) -> Quota {
        let index = ResourceKind::ALL
            .iter()
            .position(|k| *k == kind)
            .unwrap_or(0);
        self.quotas[index]
    }

    /// Whether the plan enables a feature
    pub fn has_flag(&self, flag: FeatureFlag) -> bool {
        self.flags.contains(flag)
    }
}

/// Loads resolved licenses for companies
#[derive(Debug, Clone)]
pub struct LicenseResolver {
    pool: PgPool,
}

impl LicenseResolver {
    pub fn new(pool: PgPool) -> Self {
        LicenseResolver { pool }
    }

    /// Resolves a company's current license
    ///
    /// Fetches fresh on every call. A usable license whose plan row is
    /// missing resolves as unlicensed; the dangling reference is logged.
    ///
    /// # Errors
    ///
    /// Returns `Upstream` if the database fails
    pub async fn resolve(&self, company_id: Uuid) -> Result<ResolvedLicense, EngineError> {
        let license = match License::find_usable_by_company(&self.pool, company_id).await? {
            Some(license) => license,
            None => {
                tracing::debug!(company_id = %company_id, "No usable license, default-deny");
                return Ok(ResolvedLicense::unlicensed());
            }
        };

        // Window re-check against the clock at resolution time; the query
        // filters on NOW() but the row may age between fetch and use.
        if !license.is_usable_at(Utc::now()) {
            return Ok(ResolvedLicense::unlicensed());
        }

        match LicenseType::find_by_id(&self.pool, license.license_type_id).await? {
            Some(plan) => Ok(ResolvedLicense::from_plan(&license, &plan)),
            None => {
                tracing::warn!(
                    company_id = %company_id,
                    license_id = %license.id,
                    license_type_id = %license.license_type_id,
                    "License references a missing plan, treating as unlicensed"
                );
                Ok(ResolvedLicense::unlicensed())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_plan() -> LicenseType {
        LicenseType {
            id: Uuid::new_v4(),
            name: "Pro".to_string(),
            max_companies: Some(3),
            max_users: Some(10),
            max_equipment: Some(50),
            max_requests: None,
            max_work_orders: None,
            max_maintenances: None,
            max_parts: Some(100),
            work_orders_enabled: true,
            maintenance_enabled: true,
            parts_enabled: false,
            invitations_enabled: true,
            created_at: Utc::now(),
        }
    }

    fn sample_license(status: LicenseStatus) -> License {
        let now = Utc::now();
        License {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            license_type_id: Uuid::new_v4(),
            status,
            valid_from: now - Duration::days(1),
            valid_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_unlicensed_denies_everything() {
        let resolved = ResolvedLicense::unlicensed();

        assert!(!resolved.is_licensed());
        for kind in ResourceKind::ALL {
            assert_eq!(resolved.quota(kind), Quota::Limited(0));
        }
        assert!(!resolved.has_flag(FeatureFlag::WorkOrders));
        assert!(!resolved.has_flag(FeatureFlag::Invitations));
    }

    #[test]
    fn test_resolved_snapshot_mirrors_plan() {
        let plan = sample_plan();
        let license = sample_license(LicenseStatus::Active);
        let resolved = ResolvedLicense::from_plan(&license, &plan);

        assert!(resolved.is_licensed());
        assert_eq!(resolved.status, Some(LicenseStatus::Active));
        assert_eq!(resolved.quota(ResourceKind::Equipment), Quota::Limited(50));
        assert_eq!(resolved.quota(ResourceKind::Requests), Quota::Unbounded);
        assert!(resolved.has_flag(FeatureFlag::WorkOrders));
        assert!(!resolved.has_flag(FeatureFlag::Parts));
    }

    // Integration tests for LicenseResolver are in tests/engine_tests.rs
}
