//! Request extractors for authentication, authorization and client identity.
//!
//! - [`auth::AuthUser`] -- Requires a valid JWT Bearer token.
//! - [`auth::MaybeAuthUser`] -- Optional identity for endpoints open to anonymous callers.
//! - [`rbac::RequireStaff`] -- Requires a staff account.
//! - [`client_ip::ClientIp`] -- Originating client address.

pub mod auth;
pub mod client_ip;
pub mod rbac;
