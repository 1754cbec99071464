//! urlist API server library.
//!
//! Exposes the building blocks (config, state, auth, error handling, routes,
//! secret reload) so integration tests and the binary entrypoint can both
//! access them.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod reload;
pub mod router;
pub mod routes;
pub mod state;
