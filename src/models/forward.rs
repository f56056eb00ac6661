use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A client request to forward through the proxy pool
#[derive(Debug, Clone, Deserialize)]
pub struct ForwardRequest {
    /// Target URL, must start with `http://` or `https://`
    pub url: String,
    /// HTTP method, defaults to GET
    #[serde(default = "default_method")]
    pub method: String,
    /// Headers to forward (hop-by-hop headers are stripped before sending)
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Optional request body
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Raw response from one upstream attempt, as seen by the transport
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl UpstreamResponse {
    /// Whether the upstream accepted the request (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Encoding of the reply body field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    Utf8,
    Base64,
}

/// The reply returned to the client after a successful forward
#[derive(Debug, Clone, Serialize)]
pub struct ForwardReply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub body_encoding: BodyEncoding,
    /// Descriptor of the proxy that served the response
    pub proxy: String,
}

/// Encode an upstream body for the JSON reply, preserving binary content
pub fn encode_body(body: &Bytes) -> (String, BodyEncoding) {
    match std::str::from_utf8(body) {
        Ok(text) => (text.to_string(), BodyEncoding::Utf8),
        Err(_) => (BASE64.encode(body), BodyEncoding::Base64),
    }
}

/// Read-only view of the rotation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub pool_size: usize,
    pub used_in_period: usize,
    pub remaining_in_period: usize,
    pub days_remaining: i64,
}

/// Outcome of a bulk pool replacement
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReplacePoolReport {
    pub loaded: usize,
    pub skipped: usize,
    pub replaced: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_request_defaults() {
        let req: ForwardRequest =
            serde_json::from_str(r#"{"url": "http://example.com"}"#).unwrap();
        assert_eq!(req.method, "GET");
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
    }

    #[test]
    fn test_upstream_response_is_success() {
        let mut resp = UpstreamResponse {
            status: 200,
            headers: Vec::new(),
            body: Bytes::new(),
        };
        assert!(resp.is_success());

        resp.status = 299;
        assert!(resp.is_success());

        resp.status = 300;
        assert!(!resp.is_success());

        resp.status = 404;
        assert!(!resp.is_success());
    }

    #[test]
    fn test_encode_body_utf8() {
        let body = Bytes::from_static(b"hello world");
        let (encoded, encoding) = encode_body(&body);
        assert_eq!(encoded, "hello world");
        assert_eq!(encoding, BodyEncoding::Utf8);
    }

    #[test]
    fn test_encode_body_binary_round_trips() {
        let body = Bytes::from_static(&[0xff, 0xfe, 0x00, 0x01]);
        let (encoded, encoding) = encode_body(&body);
        assert_eq!(encoding, BodyEncoding::Base64);
        assert_eq!(BASE64.decode(encoded).unwrap(), body.to_vec());
    }

    #[test]
    fn test_body_encoding_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&BodyEncoding::Utf8).unwrap(),
            r#""utf8""#
        );
        assert_eq!(
            serde_json::to_string(&BodyEncoding::Base64).unwrap(),
            r#""base64""#
        );
    }
}
