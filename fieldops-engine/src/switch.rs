/// Company switch coordination
///
/// Switching the active company is two-phase. Phase 1 (`begin_switch`)
/// only marks the target in a new context; consumers may preview the
/// target company's data, but the previous company stays authoritative
/// and nothing is persisted. Phase 2 (`confirm_switch`) persists the
/// choice and reloads the session, so all subsequent authorization
/// decisions flip to the new company without re-login.
///
/// Contexts are immutable: each phase returns a new context, and any
/// operation already holding the old one keeps its original company
/// scope.

use sqlx::PgPool;
use uuid::Uuid;

use fieldops_shared::models::user::User;

use crate::error::EngineError;
use crate::session::{CompanySelection, SessionContext};

/// Phase 1: select a target company from the user's memberships
///
/// Returns a context in `PendingConfirmation`. Nothing is persisted.
///
/// # Errors
///
/// Returns `NotFound` if the user holds no membership in the target
/// company
pub fn begin_switch(ctx: &SessionContext, target: Uuid) -> Result<SessionContext, EngineError> {
    if ctx.membership(target).is_none() {
        return Err(EngineError::NotFound("membership"));
    }

    Ok(ctx.with_selection(CompanySelection::PendingConfirmation {
        active: ctx.active_company(),
        target,
    }))
}

/// Phase 2: persist the pending choice and reload the session
///
/// The returned context is freshly loaded, so memberships and the
/// selection reflect the database after the write.
///
/// # Errors
///
/// Returns `InvalidTransition` if no switch is pending, `NotFound` if
/// the user row is gone, or `Upstream` if the database fails
pub async fn confirm_switch(
    pool: &PgPool,
    ctx: &SessionContext,
) -> Result<SessionContext, EngineError> {
    let target = match ctx.selection() {
        CompanySelection::PendingConfirmation { target, .. } => target,
        other => {
            return Err(EngineError::InvalidTransition {
                entity: "session",
                from: match other {
                    CompanySelection::Active(_) => "active".to_string(),
                    CompanySelection::SelectionPending => "selection_pending".to_string(),
                    CompanySelection::PendingConfirmation { .. } => unreachable!(),
                },
                event: "confirm_switch",
            })
        }
    };

    let updated = User::set_active_company(pool, ctx.user_id(), Some(target)).await?;
    if !updated {
        return Err(EngineError::NotFound("user"));
    }

    tracing::info!(
        user_id = %ctx.user_id(),
        company_id = %target,
        "Active company switched"
    );

    SessionContext::load(pool, ctx.user_id()).await
}

/// Abandons a pending switch, restoring the previous selection
///
/// A context with no switch pending is returned unchanged.
pub fn cancel_switch(ctx: &SessionContext) -> SessionContext {
    match ctx.selection() {
        CompanySelection::PendingConfirmation { active, .. } => {
            let restored = match active {
                Some(id) => CompanySelection::Active(id),
                None => CompanySelection::SelectionPending,
            };
            ctx.with_selection(restored)
        }
        _ => ctx.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldops_shared::models::membership::{CompanyRole, MembershipOverview};
    use fieldops_shared::models::user::GlobalRole;

    fn two_company_ctx() -> (SessionContext, Uuid, Uuid) {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let ctx = SessionContext::new(
            Uuid::new_v4(),
            GlobalRole::Technician,
            vec![
                MembershipOverview {
                    company_id: a,
                    company_name: "Company A".to_string(),
                    role: CompanyRole::Admin,
                    is_owner: false,
                },
                MembershipOverview {
                    company_id: b,
                    company_name: "Company B".to_string(),
                    role: CompanyRole::Viewer,
                    is_owner: false,
                },
            ],
            CompanySelection::Active(a),
        );
        (ctx, a, b)
    }

    #[test]
    fn test_begin_switch_keeps_previous_active() {
        let (ctx, a, b) = two_company_ctx();

        let pending = begin_switch(&ctx, b).expect("Switch should begin");
        assert_eq!(pending.active_company(), Some(a));
        assert_eq!(pending.preview_company(), Some(b));

        // The original context is untouched
        assert_eq!(ctx.active_company(), Some(a));
        assert_eq!(ctx.preview_company(), None);
    }

    #[test]
    fn test_begin_switch_requires_membership() {
        let (ctx, _, _) = two_company_ctx();

        let result = begin_switch(&ctx, Uuid::new_v4());
        assert!(matches!(result, Err(EngineError::NotFound(_))));
    }

    #[test]
    fn test_cancel_restores_previous_selection() {
        let (ctx, a, b) = two_company_ctx();

        let pending = begin_switch(&ctx, b).expect("Switch should begin");
        let restored = cancel_switch(&pending);
        assert_eq!(restored.active_company(), Some(a));
        assert_eq!(restored.preview_company(), None);
    }

    #[test]
    fn test_cancel_without_previous_goes_back_to_selection_pending() {
        let (ctx, _, b) = two_company_ctx();
        let ctx = ctx.with_selection(CompanySelection::SelectionPending);

        let pending = begin_switch(&ctx, b).expect("Switch should begin");
        let restored = cancel_switch(&pending);
        assert!(restored.is_selection_pending());
    }

    // Integration tests for confirm_switch are in tests/engine_tests.rs
}
