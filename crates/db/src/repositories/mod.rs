//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod json_data_repo;
pub mod session_repo;
pub mod tnc_acceptance_repo;
pub mod user_repo;

pub use json_data_repo::JsonDataRepo;
pub use session_repo::SessionRepo;
pub use tnc_acceptance_repo::TncAcceptanceRepo;
pub use user_repo::UserRepo;
