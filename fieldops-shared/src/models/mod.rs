/// Database models for FieldOps
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts with a global role
/// - `company`: Tenant boundary, owned by exactly one user
/// - `membership`: User-company relationships with company-scoped roles
/// - `license`: Purchased licenses and plan definitions (quotas, feature flags)
/// - `equipment`: Maintained assets
/// - `service_request`: Customer-raised needs with a status state machine
/// - `work_order`: Scheduled/performed labor, optionally converted from a request
/// - `maintenance`: Equipment history entries created by completing work orders
/// - `part`: Inventory rows, counted for quota enforcement
///
/// # Example
///
/// ```no_run
/// use fieldops_shared::models::company::{Company, CreateCompany};
/// use fieldops_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let company = Company::create(&pool, CreateCompany {
///     name: "Acme Maintenance".to_string(),
///     owner_id: Uuid::new_v4(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod company;
pub mod equipment;
pub mod license;
pub mod maintenance;
pub mod membership;
pub mod part;
pub mod service_request;
pub mod user;
pub mod work_order;
