//! # FieldOps Engine
//!
//! Tenant-scoped authorization and lifecycle engine for maintenance
//! operations. Decides which capabilities a user may exercise against a
//! company's data, constrained by the purchased license's feature flags
//! and quotas, and coordinates the guarded conversion of a service
//! request into a work order and, on completion, into the equipment's
//! maintenance history.
//!
//! ## Module Organization
//!
//! - `session`: Immutable per-request identity and company selection
//! - `license`: License resolution into quota/flag snapshots
//! - `access`: Capability evaluation (pure, synchronous)
//! - `quota`: Quota checks applied before creating mutations
//! - `lifecycle`: Request and work order state machines, conversion
//! - `switch`: Two-phase active company switching
//! - `diagnostics`: Orphaned-conversion scan and repair
//! - `error`: The engine's error type
//!
//! ## Example
//!
//! ```no_run
//! use fieldops_engine::access::{has_access, Capability};
//! use fieldops_engine::license::LicenseResolver;
//! use fieldops_engine::session::SessionContext;
//! use fieldops_shared::db::pool::{create_pool, DatabaseConfig};
//! use uuid::Uuid;
//!
//! # async fn example(user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig::from_env()?).await?;
//!
//! let ctx = SessionContext::load(&pool, user_id).await?;
//! let resolver = LicenseResolver::new(pool.clone());
//!
//! if let Some(company_id) = ctx.active_company() {
//!     let license = resolver.resolve(company_id).await?;
//!     if has_access(&ctx, &license, Capability::RequestConvert) {
//!         println!("may convert requests in {}", company_id);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod diagnostics;
pub mod error;
pub mod license;
pub mod lifecycle;
pub mod quota;
pub mod session;
pub mod switch;

pub use error::EngineError;
