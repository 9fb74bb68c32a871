/// Permission evaluation
///
/// `has_access` is the single authorization decision point: synchronous,
/// pure, no I/O. It consumes an already-loaded session context and an
/// already-resolved license, so every mutating operation can check it
/// immediately before writing without another round trip.
///
/// Capabilities form a closed enum. The role and flag tables are matches
/// over it, so adding a capability without classifying it is a compile
/// error rather than a silent deny.

use serde::{Deserialize, Serialize};

use fieldops_shared::models::license::FeatureFlag;
use fieldops_shared::models::membership::CompanyRole;
use fieldops_shared::models::user::GlobalRole;

use crate::license::ResolvedLicense;
use crate::session::SessionContext;

/// Everything a session can be allowed or denied to do within a company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Rename or delete the company, change member roles
    CompanyManage,

    /// Invite a member
    MemberInvite,

    /// Remove a member
    MemberRemove,

    /// View the company's license and quotas
    LicenseView,

    EquipmentView,
    EquipmentCreate,
    EquipmentEdit,
    EquipmentDelete,

    RequestView,
    RequestCreate,
    RequestReview,
    RequestConvert,
    RequestClose,

    WorkOrderView,
    WorkOrderCreate,
    WorkOrderEdit,
    WorkOrderComplete,

    MaintenanceView,

    PartView,
    PartManage,
}

impl Capability {
    /// The minimum company role that may exercise this capability
    ///
    /// The table is hierarchical: viewers read, technicians operate,
    /// admins administer.
    pub fn required_role(&self) -> CompanyRole {
        match self {
            Capability::CompanyManage
            | Capability::MemberInvite
            | Capability::MemberRemove
            | Capability::LicenseView
            | Capability::EquipmentDelete => CompanyRole::Admin,

            Capability::EquipmentCreate
            | Capability::EquipmentEdit
            | Capability::RequestCreate
            | Capability::RequestReview
            | Capability::RequestConvert
            | Capability::RequestClose
            | Capability::WorkOrderCreate
            | Capability::WorkOrderEdit
            | Capability::WorkOrderComplete
            | Capability::PartManage => CompanyRole::Technician,

            Capability::EquipmentView
            | Capability::RequestView
            | Capability::WorkOrderView
            | Capability::MaintenanceView
            | Capability::PartView => CompanyRole::Viewer,
        }
    }

    /// The license feature flag gating this capability, if any
    ///
    /// A gated capability is denied when the flag is off even for a role
    /// the table would allow.
    pub fn required_flag(&self) -> Option<FeatureFlag> {
        match self {
            Capability::MemberInvite => Some(FeatureFlag::Invitations),

            // Conversion creates a work order, so it rides the same flag
            Capability::RequestConvert
            | Capability::WorkOrderView
            | Capability::WorkOrderCreate
            | Capability::WorkOrderEdit
            | Capability::WorkOrderComplete => Some(FeatureFlag::WorkOrders),

            Capability::MaintenanceView => Some(FeatureFlag::Maintenance),

            Capability::PartView | Capability::PartManage => Some(FeatureFlag::Parts),

            Capability::CompanyManage
            | Capability::MemberRemove
            | Capability::LicenseView
            | Capability::EquipmentView
            | Capability::EquipmentCreate
            | Capability::EquipmentEdit
            | Capability::EquipmentDelete
            | Capability::RequestView
            | Capability::RequestCreate
            | Capability::RequestReview
            | Capability::RequestClose => None,
        }
    }
}

/// Decides whether the session may exercise a capability in its active
/// company
///
/// Global admins always pass. Otherwise: no active company denies, the
/// effective company role is checked against the capability table, an
/// unlicensed company denies everything, and finally the license flag
/// gate applies.
pub fn has_access(ctx: &SessionContext, license: &ResolvedLicense, capability: Capability) -> bool {
    if ctx.global_role() == GlobalRole::Admin {
        return true;
    }

    let role = match ctx.active_role() {
        Some(role) => role,
        None => return false,
    };

    if !role.has_permission(&capability.required_role()) {
        return false;
    }

    // Default-deny for unlicensed tenants covers every company-scoped
    // capability, not just the flag-gated ones.
    if !license.is_licensed() {
        return false;
    }

    match capability.required_flag() {
        Some(flag) => license.has_flag(flag),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::CompanySelection;
    use fieldops_shared::models::license::{License, LicenseStatus, LicenseType};
    use fieldops_shared::models::membership::MembershipOverview;
    use chrono::Utc;
    use uuid::Uuid;

    const ALL_CAPABILITIES: [Capability; 20] = [
        Capability::CompanyManage,
        Capability::MemberInvite,
        Capability::MemberRemove,
        Capability::LicenseView,
        Capability::EquipmentView,
        Capability::EquipmentCreate,
        Capability::EquipmentEdit,
        Capability::EquipmentDelete,
        Capability::RequestView,
        Capability::RequestCreate,
        Capability::RequestReview,
        Capability::RequestConvert,
        Capability::RequestClose,
        Capability::WorkOrderView,
        Capability::WorkOrderCreate,
        Capability::WorkOrderEdit,
        Capability::WorkOrderComplete,
        Capability::MaintenanceView,
        Capability::PartView,
        Capability::PartManage,
    ];

    fn ctx_with_role(role: CompanyRole, global: GlobalRole) -> SessionContext {
        let company = Uuid::new_v4();
        SessionContext::new(
            Uuid::new_v4(),
            global,
            vec![MembershipOverview {
                company_id: company,
                company_name: "Test Co".to_string(),
                role,
                is_owner: false,
            }],
            CompanySelection::Active(company),
        )
    }

    fn full_license() -> ResolvedLicense {
        let now = Utc::now();
        let plan = LicenseType {
            id: Uuid::new_v4(),
            name: "Enterprise".to_string(),
            max_companies: None,
            max_users: None,
            max_equipment: None,
            max_requests: None,
            max_work_orders: None,
            max_maintenances: None,
            max_parts: None,
            work_orders_enabled: true,
            maintenance_enabled: true,
            parts_enabled: true,
            invitations_enabled: true,
            created_at: now,
        };
        let license = License {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            license_type_id: plan.id,
            status: LicenseStatus::Active,
            valid_from: now,
            valid_until: None,
            created_at: now,
            updated_at: now,
        };
        ResolvedLicense::from_plan(&license, &plan)
    }

    #[test]
    fn test_capability_serialization() {
        let json = serde_json::to_string(&Capability::RequestConvert).unwrap();
        assert_eq!(json, "\"request_convert\"");

        let parsed: Capability = serde_json::from_str("\"equipment_edit\"").unwrap();
        assert_eq!(parsed, Capability::EquipmentEdit);
    }

    #[test]
    fn test_global_admin_always_passes() {
        let ctx = SessionContext::new(
            Uuid::new_v4(),
            GlobalRole::Admin,
            vec![],
            CompanySelection::SelectionPending,
        );
        let license = ResolvedLicense::unlicensed();

        for capability in ALL_CAPABILITIES {
            assert!(has_access(&ctx, &license, capability));
        }
    }

    #[test]
    fn test_no_active_company_denies_everything() {
        let ctx = SessionContext::new(
            Uuid::new_v4(),
            GlobalRole::Technician,
            vec![],
            CompanySelection::SelectionPending,
        );
        let license = full_license();

        for capability in ALL_CAPABILITIES {
            assert!(!has_access(&ctx, &license, capability));
        }
    }

    #[test]
    fn test_unlicensed_company_denies_every_capability() {
        let ctx = ctx_with_role(CompanyRole::Admin, GlobalRole::Technician);
        let license = ResolvedLicense::unlicensed();

        // Default-deny covers the non-gated capabilities too
        for capability in ALL_CAPABILITIES {
            assert!(
                !has_access(&ctx, &license, capability),
                "capability {:?}",
                capability
            );
        }
    }

    #[test]
    fn test_unlicensed_company_denies_equipment_create() {
        let ctx = ctx_with_role(CompanyRole::Admin, GlobalRole::Technician);
        let license = ResolvedLicense::unlicensed();

        assert!(!has_access(&ctx, &license, Capability::EquipmentCreate));
        assert!(!has_access(&ctx, &license, Capability::CompanyManage));
    }

    #[test]
    fn test_disabled_flag_denies_even_with_license() {
        let ctx = ctx_with_role(CompanyRole::Admin, GlobalRole::Technician);

        // Licensed plan with the parts flag off
        let now = Utc::now();
        let plan = LicenseType {
            id: Uuid::new_v4(),
            name: "Basic".to_string(),
            max_companies: None,
            max_users: None,
            max_equipment: None,
            max_requests: None,
            max_work_orders: None,
            max_maintenances: None,
            max_parts: None,
            work_orders_enabled: true,
            maintenance_enabled: true,
            parts_enabled: false,
            invitations_enabled: true,
            created_at: now,
        };
        let license = License {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            license_type_id: plan.id,
            status: LicenseStatus::Active,
            valid_from: now,
            valid_until: None,
            created_at: now,
            updated_at: now,
        };
        let resolved = ResolvedLicense::from_plan(&license, &plan);

        assert!(!has_access(&ctx, &resolved, Capability::PartManage));
        assert!(has_access(&ctx, &resolved, Capability::EquipmentCreate));
    }

    #[test]
    fn test_viewer_reads_only() {
        let ctx = ctx_with_role(CompanyRole::Viewer, GlobalRole::Technician);
        let license = full_license();

        assert!(has_access(&ctx, &license, Capability::EquipmentView));
        assert!(has_access(&ctx, &license, Capability::RequestView));
        assert!(has_access(&ctx, &license, Capability::MaintenanceView));

        assert!(!has_access(&ctx, &license, Capability::EquipmentEdit));
        assert!(!has_access(&ctx, &license, Capability::RequestConvert));
        assert!(!has_access(&ctx, &license, Capability::CompanyManage));
    }

    #[test]
    fn test_technician_operates_but_does_not_administer() {
        let ctx = ctx_with_role(CompanyRole::Technician, GlobalRole::Technician);
        let license = full_license();

        assert!(has_access(&ctx, &license, Capability::EquipmentEdit));
        assert!(has_access(&ctx, &license, Capability::RequestConvert));
        assert!(has_access(&ctx, &license, Capability::WorkOrderComplete));

        assert!(!has_access(&ctx, &license, Capability::EquipmentDelete));
        assert!(!has_access(&ctx, &license, Capability::MemberInvite));
        assert!(!has_access(&ctx, &license, Capability::CompanyManage));
    }

    #[test]
    fn test_company_admin_passes_everything_when_fully_licensed() {
        let ctx = ctx_with_role(CompanyRole::Admin, GlobalRole::Technician);
        let license = full_license();

        for capability in ALL_CAPABILITIES {
            assert!(has_access(&ctx, &license, capability), "capability {:?}", capability);
        }
    }

    #[test]
    fn test_owner_override_grants_admin_capabilities() {
        let company = Uuid::new_v4();
        let ctx = SessionContext::new(
            Uuid::new_v4(),
            GlobalRole::Technician,
            vec![MembershipOverview {
                company_id: company,
                company_name: "Owned Co".to_string(),
                role: CompanyRole::Viewer,
                is_owner: true,
            }],
            CompanySelection::Active(company),
        );
        let license = full_license();

        assert!(has_access(&ctx, &license, Capability::CompanyManage));
        assert!(has_access(&ctx, &license, Capability::EquipmentDelete));
    }
}
