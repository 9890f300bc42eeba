//! Domain building blocks shared by the database and API crates.
//!
//! Nothing in here performs I/O: errors, id/timestamp aliases, request
//! validation rules, search/ordering helpers, client-IP parsing and the
//! fixed-window rate limiter used by the upstream proxy.

pub mod client_ip;
pub mod error;
pub mod json_data;
pub mod ordering;
pub mod rate_limit;
pub mod search;
pub mod tnc;
pub mod types;
pub mod validation;
