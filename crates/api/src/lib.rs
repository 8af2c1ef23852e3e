//! Stockwatch API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! background notification routing) so integration tests and the binary
//! entrypoint can both access them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notifications;
pub mod query;
pub mod response;
pub mod routes;
pub mod state;
