//! Proxied HTTP transport
//!
//! Performs a single forwarded attempt through one upstream proxy. The
//! per-attempt timeout lives here; exceeding it surfaces as a transport error
//! the retry loop absorbs.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use tracing::debug;

use crate::error::{HopperError, Result};
use crate::models::{ForwardRequest, Proxy, UpstreamResponse};

/// A capability that performs one proxied HTTP(S) call
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request to its target through the given proxy
    async fn send(&self, proxy: &Proxy, request: &ForwardRequest) -> Result<UpstreamResponse>;
}

/// Production transport backed by reqwest with rustls
pub struct HttpTransport {
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl HttpTransport {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            request_timeout,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, proxy: &Proxy, request: &ForwardRequest) -> Result<UpstreamResponse> {
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|_| {
            HopperError::InvalidRequest(format!("invalid method: {}", request.method))
        })?;

        let mut upstream = reqwest::Proxy::all(proxy.url())
            .map_err(|e| HopperError::Transport(format!("invalid proxy address: {}", e)))?;
        if let Some(auth) = &proxy.auth {
            upstream = upstream.basic_auth(&auth.username, &auth.password);
        }

        // The proxy differs per attempt, so the client is built per attempt.
        let client = reqwest::Client::builder()
            .proxy(upstream)
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| HopperError::Transport(format!("client build failed: {}", e)))?;

        let headers = build_request_headers(&request.headers)?;

        debug!(proxy = %proxy.redacted(), url = %request.url, "Dialing upstream through proxy");

        let mut builder = client.request(method, &request.url).headers(headers);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                HopperError::Transport(format!("attempt timed out: {}", e))
            } else {
                HopperError::Transport(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| HopperError::Transport(format!("failed to read response body: {}", e)))?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

/// Build the outgoing header map, dropping hop-by-hop headers
///
/// `Host` is dropped too; the client sets it from the target URL.
pub(crate) fn build_request_headers(headers: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        if is_hop_by_hop_header(name) {
            continue;
        }
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| HopperError::InvalidRequest(format!("invalid header name: {}", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| HopperError::InvalidRequest(format!("invalid header value for {}", name)))?;
        map.append(name, value);
    }
    Ok(map)
}

/// Check if a header is a hop-by-hop header that should not be forwarded
pub(crate) fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(
        name.to_lowercase().as_str(),
        "connection"
            | "host"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_hop_by_hop_header() {
        assert!(is_hop_by_hop_header("Connection"));
        assert!(is_hop_by_hop_header("host"));
        assert!(is_hop_by_hop_header("Proxy-Authorization"));
        assert!(is_hop_by_hop_header("TRANSFER-ENCODING"));

        assert!(!is_hop_by_hop_header("content-type"));
        assert!(!is_hop_by_hop_header("authorization"));
        assert!(!is_hop_by_hop_header("x-request-id"));
    }

    #[test]
    fn test_build_request_headers_strips_hop_by_hop() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Host".to_string(), "client-facing.example".to_string());
        headers.insert("Connection".to_string(), "keep-alive".to_string());

        let map = build_request_headers(&headers).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("content-type").unwrap(), "application/json");
    }

    #[test]
    fn test_build_request_headers_rejects_invalid_names() {
        let mut headers = HashMap::new();
        headers.insert("bad header".to_string(), "value".to_string());

        assert!(matches!(
            build_request_headers(&headers),
            Err(HopperError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_build_request_headers_rejects_invalid_values() {
        let mut headers = HashMap::new();
        headers.insert("x-broken".to_string(), "line\nbreak".to_string());

        assert!(matches!(
            build_request_headers(&headers),
            Err(HopperError::InvalidRequest(_))
        ));
    }
}
