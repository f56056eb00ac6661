//! Retry-driven request forwarding
//!
//! Drives repeated attempts through the transport using the rotator,
//! converting the first success or total exhaustion into a single result.
//! Attempts within one forwarded request are strictly sequential.

use std::sync::Arc;

use reqwest::Method;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{HopperError, Result};
use crate::models::{encode_body, ForwardReply, ForwardRequest, Proxy, UpstreamResponse};
use crate::proxy::rotation::Rotator;
use crate::proxy::transport::{build_request_headers, is_hop_by_hop_header, Transport};

/// Orchestrates forwarded requests over the shared rotator
pub struct Forwarder {
    rotator: Arc<Rotator>,
    transport: Arc<dyn Transport>,
}

impl Forwarder {
    pub fn new(rotator: Arc<Rotator>, transport: Arc<dyn Transport>) -> Self {
        Self { rotator, transport }
    }

    /// Forward a request through the pool, retrying across proxies until
    /// success or exhaustion
    #[instrument(
        skip(self, request),
        fields(
            request_id = %Uuid::new_v4(),
            method = %request.method,
            url = %request.url,
        )
    )]
    pub async fn forward(&self, request: ForwardRequest) -> Result<ForwardReply> {
        validate_request(&request)?;

        if self.rotator.is_empty() {
            return Err(HopperError::NoProxiesConfigured);
        }

        // Failures are scoped to this one forwarded request.
        self.rotator.reset_failures();

        let max_attempts = 2 * self.rotator.len() as u32;
        let mut attempts: u32 = 0;
        let mut last_error: Option<HopperError> = None;

        loop {
            attempts += 1;
            if attempts > max_attempts {
                return Err(HopperError::MaxAttemptsExceeded {
                    attempts: max_attempts,
                    last: last_message(&last_error),
                });
            }

            let Some(selection) = self.rotator.select() else {
                if self.rotator.all_failed_this_cycle() {
                    return Err(HopperError::AllProxiesFailed {
                        last: last_message(&last_error),
                    });
                }
                // Nothing offered but not everything failed; clear failures
                // and let the bounded loop try selection again.
                self.rotator.reset_failures();
                continue;
            };

            debug!(
                proxy = %selection.proxy.redacted(),
                attempt = attempts,
                max_attempts,
                "Forwarding through proxy"
            );

            match self.transport.send(&selection.proxy, &request).await {
                Ok(response) if response.is_success() => {
                    self.rotator.mark_used(selection.index);
                    info!(
                        proxy = %selection.proxy.redacted(),
                        status = response.status,
                        attempt = attempts,
                        "Forward succeeded"
                    );
                    return Ok(build_reply(response, &selection.proxy));
                }
                Ok(response) => {
                    // The proxy is implicated even though a response came back.
                    warn!(
                        proxy = %selection.proxy.redacted(),
                        status = response.status,
                        attempt = attempts,
                        "Upstream returned non-success status"
                    );
                    self.rotator.mark_failed(selection.index);
                    last_error = Some(HopperError::UpstreamStatus(response.status));
                }
                Err(e) => {
                    warn!(
                        proxy = %selection.proxy.redacted(),
                        error = %e,
                        attempt = attempts,
                        "Forward attempt failed"
                    );
                    self.rotator.mark_failed(selection.index);
                    last_error = Some(e);
                }
            }
        }
    }
}

fn validate_request(request: &ForwardRequest) -> Result<()> {
    if !request.url.starts_with("http://") && !request.url.starts_with("https://") {
        return Err(HopperError::InvalidRequest(format!(
            "target URL must start with http:// or https://: {}",
            request.url
        )));
    }

    Method::from_bytes(request.method.as_bytes()).map_err(|_| {
        HopperError::InvalidRequest(format!("invalid method: {}", request.method))
    })?;

    build_request_headers(&request.headers)?;

    Ok(())
}

fn build_reply(response: UpstreamResponse, proxy: &Proxy) -> ForwardReply {
    let headers = response
        .headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop_header(name))
        .cloned()
        .collect();
    let (body, body_encoding) = encode_body(&response.body);

    ForwardReply {
        status: response.status,
        headers,
        body,
        body_encoding,
        proxy: proxy.to_string(),
    }
}

fn last_message(last_error: &Option<HopperError>) -> String {
    last_error
        .as_ref()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "no attempts made".to_string())
}
