//! Proxy data models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Proxy protocol family, as far as the heuristics can tell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProxyType {
    Http,
    Https,
    Socks5,
    #[default]
    Unknown,
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyType::Http => write!(f, "HTTP"),
            ProxyType::Https => write!(f, "HTTPS"),
            ProxyType::Socks5 => write!(f, "SOCKS5"),
            ProxyType::Unknown => write!(f, "Unknown"),
        }
    }
}

impl ProxyType {
    /// Parse a type label from a proxy list column. Case-insensitive.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "http" => ProxyType::Http,
            "https" => ProxyType::Https,
            "socks5" => ProxyType::Socks5,
            _ => ProxyType::Unknown,
        }
    }
}

/// A proxy endpoint. Immutable once constructed; the loader guarantees a
/// non-empty host and a non-zero port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    pub host: String,
    pub port: u16,
}

impl Proxy {
    pub fn new(host: String, port: u16) -> Self {
        Self { host, port }
    }

    /// Proxy URL for the HTTP client, e.g. `http://1.2.3.4:8080`
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Previously measured metrics supplied alongside a proxy at load time.
/// Trusted as-is; a proxy carrying these is never re-probed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedMetrics {
    pub latency_secs: f64,
    pub speed_bps: f64,
    pub proxy_type: ProxyType,
    pub country: String,
}

/// Whether an outcome's metrics were measured live or copied from the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricsSource {
    Fresh,
    Cached,
}

/// Result of probing a single proxy. Created exactly once per input proxy
/// and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub proxy: Proxy,
    pub success: bool,
    pub latency_secs: f64,
    pub speed_bps: f64,
    pub proxy_type: ProxyType,
    pub country: String,
    pub source: MetricsSource,
    /// Cause of failure, when `success` is false
    pub error: Option<String>,
}

impl ProbeOutcome {
    /// A working proxy measured by a live probe
    pub fn fresh(
        proxy: Proxy,
        latency_secs: f64,
        speed_bps: f64,
        proxy_type: ProxyType,
        country: String,
    ) -> Self {
        Self {
            proxy,
            success: true,
            latency_secs,
            speed_bps,
            proxy_type,
            country,
            source: MetricsSource::Fresh,
            error: None,
        }
    }

    /// A working proxy taken on trust from cached metrics, verbatim
    pub fn cached(proxy: Proxy, metrics: &CachedMetrics) -> Self {
        Self {
            proxy,
            success: true,
            latency_secs: metrics.latency_secs,
            speed_bps: metrics.speed_bps,
            proxy_type: metrics.proxy_type,
            country: metrics.country.clone(),
            source: MetricsSource::Cached,
            error: None,
        }
    }

    /// A dead proxy: zeroed metrics, unknown type and country
    pub fn failed(proxy: Proxy, error: String) -> Self {
        Self {
            proxy,
            success: false,
            latency_secs: 0.0,
            speed_bps: 0.0,
            proxy_type: ProxyType::Unknown,
            country: "Unknown".to_string(),
            source: MetricsSource::Fresh,
            error: Some(error),
        }
    }

    pub fn is_working(&self) -> bool {
        self.success
    }

    pub fn is_cached(&self) -> bool {
        self.source == MetricsSource::Cached
    }
}
