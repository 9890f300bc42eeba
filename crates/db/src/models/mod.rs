//! Row models and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` struct matching the database row
//! - A create DTO for inserts
//! - An update DTO (all `Option` fields) for patches, where updates exist

pub mod json_data;
pub mod session;
pub mod tnc_acceptance;
pub mod user;
