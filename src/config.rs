//! Fetch configuration and proxy descriptors.

use crate::error::FetchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Default number of attempts before giving up on timeouts.
pub const DEFAULT_ATTEMPTS: u32 = 5;

/// Configuration for a [`Fetcher`](crate::Fetcher).
///
/// Replaces process-wide mutable defaults with an explicit value built once
/// and handed to the fetcher. Callers that want the classic behavior build
/// one at startup and share the fetcher.
///
/// # Example
///
/// ```
/// use refetch::FetchConfig;
/// use std::time::Duration;
///
/// let config = FetchConfig {
///     timeout: Duration::from_secs(30),
///     attempts: 3,
///     ..FetchConfig::default()
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-attempt timeout applied to the connect phase and to every body
    /// read (default: 10 seconds).
    pub timeout: Duration,
    /// Number of attempts before a run of timeouts becomes an error
    /// (default: 5).
    pub attempts: u32,
    /// Proxy to route connections through (default: direct).
    pub proxy: Option<ProxyConfig>,
    /// Extra request headers, applied after the built-in `User-Agent` and
    /// `Accept-Encoding` defaults. A colliding name overwrites the default.
    pub headers: Vec<(String, String)>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            attempts: DEFAULT_ATTEMPTS,
            proxy: None,
            headers: Vec::new(),
        }
    }
}

/// Supported proxy protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyKind {
    /// Plain HTTP CONNECT proxy.
    Http,
    /// SOCKS5 proxy.
    Socks5,
}

impl ProxyKind {
    fn scheme(self) -> &'static str {
        match self {
            ProxyKind::Http => "http",
            ProxyKind::Socks5 => "socks5",
        }
    }
}

/// A fully-resolved proxy descriptor.
///
/// External configuration loaders are expected to hand this over ready to
/// use; the crate never reads proxy settings from the environment or from
/// files on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy protocol.
    pub kind: ProxyKind,
    /// Proxy host name or address.
    pub host: String,
    /// Proxy port.
    pub port: u16,
}

impl ProxyConfig {
    /// Renders the descriptor as a proxy URL, e.g. `socks5://10.0.0.1:1080`.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.kind.scheme(), self.host, self.port)
    }
}

impl fmt::Display for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

impl FromStr for ProxyConfig {
    type Err = FetchError;

    /// Parses `http://host:port` or `socks5://host:port`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = url::Url::parse(s)
            .map_err(|e| FetchError::Config(format!("invalid proxy {s:?}: {e}")))?;
        let kind = match parsed.scheme() {
            "http" => ProxyKind::Http,
            "socks5" => ProxyKind::Socks5,
            other => {
                return Err(FetchError::Config(format!(
                    "unsupported proxy scheme {other:?} (expected http or socks5)"
                )))
            }
        };
        let host = parsed
            .host_str()
            .ok_or_else(|| FetchError::Config(format!("proxy {s:?} has no host")))?
            .to_string();
        // The url crate normalizes an explicit default port (http:80) away,
        // so fall back to the scheme default before giving up.
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| FetchError::Config(format!("proxy {s:?} has no port")))?;
        Ok(Self { kind, host, port })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_millis(10_000));
        assert_eq!(config.attempts, 5);
        assert!(config.proxy.is_none());
        assert!(config.headers.is_empty());
    }

    #[test]
    fn proxy_parses_http_and_socks5() {
        let http: ProxyConfig = "http://127.0.0.1:8080".parse().unwrap();
        assert_eq!(http.kind, ProxyKind::Http);
        assert_eq!(http.host, "127.0.0.1");
        assert_eq!(http.port, 8080);

        let socks: ProxyConfig = "socks5://proxy.local:1080".parse().unwrap();
        assert_eq!(socks.kind, ProxyKind::Socks5);
        assert_eq!(socks.url(), "socks5://proxy.local:1080");
    }

    #[test]
    fn proxy_falls_back_to_the_scheme_default_port() {
        let http: ProxyConfig = "http://proxy.local".parse().unwrap();
        assert_eq!(http.port, 80);
    }

    #[test]
    fn proxy_rejects_unsupported_forms() {
        assert!("ftp://proxy:21".parse::<ProxyConfig>().is_err());
        assert!("socks5://noport".parse::<ProxyConfig>().is_err());
        assert!("not a proxy".parse::<ProxyConfig>().is_err());
    }

    #[test]
    fn proxy_deserializes_from_resolved_config() {
        let proxy: ProxyConfig =
            serde_json::from_str(r#"{"kind":"socks5","host":"proxy.local","port":1080}"#).unwrap();
        assert_eq!(proxy.kind, ProxyKind::Socks5);
        assert_eq!(proxy.to_string(), "socks5://proxy.local:1080");
    }
}
