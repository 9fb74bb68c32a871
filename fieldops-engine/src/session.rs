/// Session context
///
/// An immutable per-request snapshot of who the caller is and which
/// company their calls are scoped to. Every permission, quota, and
/// lifecycle call takes the company id from the context captured at
/// invocation time; an operation already in flight is never affected by
/// a later company switch.
///
/// # Example
///
/// ```no_run
/// use fieldops_engine::session::SessionContext;
/// use fieldops_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let ctx = SessionContext::load(&pool, user_id).await?;
/// if let Some(company_id) = ctx.active_company() {
///     println!("scoped to {}", company_id);
/// }
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use fieldops_shared::models::membership::{CompanyRole, Membership, MembershipOverview};
use fieldops_shared::models::user::{GlobalRole, User};

use crate::error::EngineError;

/// Which company the session's calls are scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanySelection {
    /// An authoritative active company
    Active(Uuid),

    /// A two-phase switch is in flight; reads may preview `target` but
    /// `active` (if any) remains authoritative until confirmation
    PendingConfirmation {
        active: Option<Uuid>,
        target: Uuid,
    },

    /// No company selected; every tenant-scoped capability denies
    SelectionPending,
}

/// Session context: identity, memberships, and company selection
#[derive(Debug, Clone)]
pub struct SessionContext {
    user_id: Uuid,
    global_role: GlobalRole,
    memberships: Vec<MembershipOverview>,
    selection: CompanySelection,
}

impl SessionContext {
    /// Loads a session for an authenticated user
    ///
    /// Seeds the selection from the user's persisted active company,
    /// validated against their current memberships; a stale persisted
    /// choice (membership since removed) degrades to `SelectionPending`.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` if the user does not exist, or
    /// `Upstream` if the database fails
    pub async fn load(pool: &PgPool, user_id: Uuid) -> Result<Self, EngineError> {
        let user = User::find_by_id(pool, user_id)
            .await?
            .ok_or(EngineError::Unauthenticated)?;

        let memberships = Membership::overview_by_user(pool, user_id).await?;

        let selection = match user.active_company_id {
            Some(company_id) if memberships.iter().any(|m| m.company_id == company_id) => {
                CompanySelection::Active(company_id)
            }
            _ => CompanySelection::SelectionPending,
        };

        tracing::debug!(
            user_id = %user_id,
            memberships = memberships.len(),
            active = ?user.active_company_id,
            "Session loaded"
        );

        Ok(SessionContext {
            user_id,
            global_role: user.role,
            memberships,
            selection,
        })
    }

    /// Builds a context directly from already-loaded parts
    ///
    /// Used by the switch coordinator and by tests; `load` is the normal
    /// entry point.
    pub fn new(
        user_id: Uuid,
        global_role: GlobalRole,
        memberships: Vec<MembershipOverview>,
        selection: CompanySelection,
    ) -> Self {
        SessionContext {
            user_id,
            global_role,
            memberships,
            selection,
        }
    }

    /// The authenticated user's id
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// The user's global role
    pub fn global_role(&self) -> GlobalRole {
        self.global_role
    }

    /// The user's memberships
    pub fn memberships(&self) -> &[MembershipOverview] {
        &self.memberships
    }

    /// The current selection
    pub fn selection(&self) -> CompanySelection {
        self.selection
    }

    /// The authoritative active company, if any
    ///
    /// During a pending switch this is still the previous company; the
    /// target only becomes active on confirmation.
    pub fn active_company(&self) -> Option<Uuid> {
        match self.selection {
            CompanySelection::Active(id) => Some(id),
            CompanySelection::PendingConfirmation { active, .. } => active,
            CompanySelection::SelectionPending => None,
        }
    }

    /// The company whose data may be previewed, if a switch is pending
    pub fn preview_company(&self) -> Option<Uuid> {
        match self.selection {
            CompanySelection::PendingConfirmation { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Looks up the user's membership in a company
    pub fn membership(&self, company_id: Uuid) -> Option<&MembershipOverview> {
        self.memberships.iter().find(|m| m.company_id == company_id)
    }

    /// The user's effective role in a company
    ///
    /// The owner holds the highest company role regardless of what their
    /// membership row says.
    pub fn role_for(&self, company_id: Uuid) -> Option<CompanyRole> {
        self.membership(company_id).map(|m| {
            if m.is_owner {
                CompanyRole::Admin
            } else {
                m.role
            }
        })
    }

    /// The user's effective role in the active company
    pub fn active_role(&self) -> Option<CompanyRole> {
        self.active_company().and_then(|id| self.role_for(id))
    }

    /// Whether the consumer must route the user into company creation
    ///
    /// True for technicians with zero memberships; clients and global
    /// admins are routed elsewhere by the consumer.
    pub fn needs_company_setup(&self) -> bool {
        self.memberships.is_empty() && self.global_role == GlobalRole::Technician
    }

    /// Whether no company selection exists yet
    pub fn is_selection_pending(&self) -> bool {
        matches!(self.selection, CompanySelection::SelectionPending)
    }

    /// Returns a copy with a different selection
    ///
    /// The context itself is immutable; selection changes produce a new
    /// context.
    pub fn with_selection(&self, selection: CompanySelection) -> Self {
        SessionContext {
            selection,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(company_id: Uuid, role: CompanyRole, is_owner: bool) -> MembershipOverview {
        MembershipOverview {
            company_id,
            company_name: "Test Co".to_string(),
            role,
            is_owner,
        }
    }

    #[test]
    fn test_owner_gets_admin_role() {
        let company = Uuid::new_v4();
        let ctx = SessionContext::new(
            Uuid::new_v4(),
            GlobalRole::Technician,
            vec![member(company, CompanyRole::Viewer, true)],
            CompanySelection::Active(company),
        );

        assert_eq!(ctx.role_for(company), Some(CompanyRole::Admin));
        assert_eq!(ctx.active_role(), Some(CompanyRole::Admin));
    }

    #[test]
    fn test_non_member_has_no_role() {
        let ctx = SessionContext::new(
            Uuid::new_v4(),
            GlobalRole::Technician,
            vec![],
            CompanySelection::SelectionPending,
        );

        assert_eq!(ctx.role_for(Uuid::new_v4()), None);
        assert_eq!(ctx.active_company(), None);
        assert!(ctx.is_selection_pending());
        assert!(ctx.needs_company_setup());
    }

    #[test]
    fn test_clients_skip_company_setup() {
        let ctx = SessionContext::new(
            Uuid::new_v4(),
            GlobalRole::Client,
            vec![],
            CompanySelection::SelectionPending,
        );

        assert!(!ctx.needs_company_setup());
    }

    #[test]
    fn test_pending_switch_keeps_previous_company_authoritative() {
        let previous = Uuid::new_v4();
        let target = Uuid::new_v4();
        let ctx = SessionContext::new(
            Uuid::new_v4(),
            GlobalRole::Technician,
            vec![
                member(previous, CompanyRole::Admin, false),
                member(target, CompanyRole::Viewer, false),
            ],
            CompanySelection::PendingConfirmation {
                active: Some(previous),
                target,
            },
        );

        assert_eq!(ctx.active_company(), Some(previous));
        assert_eq!(ctx.preview_company(), Some(target));
    }

    // Integration tests for SessionContext::load are in tests/engine_tests.rs
}
