//! Hopper - Rotating-Proxy Request Forwarder
//!
//! Forwards client-issued HTTP requests to arbitrary upstream URLs through a
//! rotating pool of third-party proxies.
//!
//! ## Features
//!
//! - Random rotation with a per-proxy usage quota over a rolling 2-day window
//! - Per-request failure isolation: a proxy that fails is excluded for the
//!   rest of that forwarded request only
//! - Sequential retry across proxies until success or pool exhaustion
//! - Proxy lists from newline-delimited files or bulk updates over the API
//! - HTTP and HTTPS targets through authenticated HTTP proxies

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod proxy;

pub use config::Config;
pub use error::{HopperError, Result};
