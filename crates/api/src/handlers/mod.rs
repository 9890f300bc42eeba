//! Request handlers, one module per resource.

pub mod admin;
pub mod auth;
pub mod json_data;
pub mod proxy;
pub mod public;
pub mod tnc;
