//! API server implementation
//!
//! Provides the REST endpoints for forwarding requests and managing the pool.

pub mod handlers;
pub mod routes;
pub mod server;

pub use server::ApiServer;
