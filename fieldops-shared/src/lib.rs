//! # FieldOps Shared Library
//!
//! This crate contains the database layer and data models shared by the
//! FieldOps engine and any future runtime crates.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and migration runner
//! - `models`: Database models and their CRUD operations

pub mod db;
pub mod models;

/// Current version of the FieldOps shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
