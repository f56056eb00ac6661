use serde::{Deserialize, Serialize};

/// Basic-auth credentials attached to an upstream proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

/// An upstream proxy entry in the rotation pool
///
/// Immutable once constructed; identified within the pool only by its index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<ProxyAuth>,
}

impl Proxy {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            auth: None,
        }
    }

    pub fn with_auth(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            auth: Some(ProxyAuth {
                username: username.into(),
                password: password.into(),
            }),
        }
    }

    /// Address without credentials, safe for client-facing output
    pub fn redacted(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Proxy URL used when dialing through this proxy
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

// Display renders the full `[user:pass@]host:port` descriptor; parsing it
// back yields an equivalent proxy.
impl std::fmt::Display for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.auth {
            Some(auth) => write!(
                f,
                "{}:{}@{}:{}",
                auth.username, auth.password, self.host, self.port
            ),
            None => write!(f, "{}:{}", self.host, self.port),
        }
    }
}

/// A proxy handed out by the rotator, tagged with its pool index
#[derive(Debug, Clone)]
pub struct Selection {
    pub proxy: Proxy,
    pub index: usize,
}
