//! Proxy pool and forwarding
//!
//! This module provides the forwarding core:
//! - Proxy address parsing (single lines and newline-delimited batches)
//! - Pool rotation with per-period usage quotas and per-cycle failure tracking
//! - The transport seam for performing one proxied attempt
//! - The retry orchestrator that drives attempts to a single result

pub mod forwarder;
pub mod parser;
pub mod rotation;
pub mod transport;

pub use forwarder::Forwarder;
pub use parser::{load_proxy_file, parse_proxy_line, parse_proxy_list, ParsedPool};
pub use rotation::Rotator;
pub use transport::{HttpTransport, Transport};
