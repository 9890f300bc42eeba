//! Widget backend server library.
//!
//! Exposes configuration, startup, routing and request handling so the
//! binary entrypoint and the integration tests share the same building
//! blocks.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod proxy;
pub mod response;
pub mod router;
pub mod routes;
pub mod server;
pub mod startup;
pub mod state;
pub mod telemetry;
