//! Best-effort proxy protocol classification
//!
//! Classification is purely advisory: a well-known port implies a protocol,
//! and anything else gets one shot at a plaintext HTTP probe. HTTPS or SOCKS
//! proxies listening on non-standard ports do not answer a plaintext request,
//! so they are indistinguishable from dead proxies here and come back as
//! `Unknown`. This is a heuristic, not protocol negotiation.

use crate::proxy::models::{Proxy, ProxyType};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Timeout for the active handshake probe
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Ports conventionally used by plain HTTP proxies
const HTTP_PORTS: [u16; 3] = [80, 8080, 3128];

/// Classify a proxy's protocol family. Never fails; unresolvable cases
/// return `ProxyType::Unknown`.
pub async fn classify(proxy: &Proxy) -> ProxyType {
    if let Some(proxy_type) = classify_by_port(proxy.port) {
        return proxy_type;
    }

    match probe_http(proxy).await {
        Ok(true) => ProxyType::Http,
        _ => ProxyType::Unknown,
    }
}

/// Port-based heuristic; independent of reachability
pub fn classify_by_port(port: u16) -> Option<ProxyType> {
    if port == 1080 {
        Some(ProxyType::Socks5)
    } else if port == 443 {
        Some(ProxyType::Https)
    } else if HTTP_PORTS.contains(&port) {
        Some(ProxyType::Http)
    } else {
        None
    }
}

/// Open a raw connection, send a minimal HTTP request line and check whether
/// the first bytes of the reply carry an HTTP status line.
async fn probe_http(proxy: &Proxy) -> anyhow::Result<bool> {
    let addr = format!("{}:{}", proxy.host, proxy.port);
    let mut stream = timeout(PROBE_TIMEOUT, TcpStream::connect(&addr)).await??;

    let request = b"GET / HTTP/1.1\r\nHost: httpbin.org\r\n\r\n";
    timeout(PROBE_TIMEOUT, stream.write_all(request)).await??;

    let mut buf = [0u8; 1024];
    let n = timeout(PROBE_TIMEOUT, stream.read(&mut buf)).await??;

    Ok(buf[..n].windows(5).any(|w| w == b"HTTP/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_1080_is_socks5() {
        assert_eq!(classify_by_port(1080), Some(ProxyType::Socks5));
    }

    #[test]
    fn test_port_443_is_https() {
        assert_eq!(classify_by_port(443), Some(ProxyType::Https));
    }

    #[test]
    fn test_http_ports() {
        for port in [80, 8080, 3128] {
            assert_eq!(classify_by_port(port), Some(ProxyType::Http));
        }
    }

    #[test]
    fn test_unrecognized_port_defers_to_probe() {
        assert_eq!(classify_by_port(9999), None);
        assert_eq!(classify_by_port(1081), None);
    }

    #[tokio::test]
    async fn test_classify_well_known_port_skips_network() {
        // Unroutable host: classification must still succeed from the port alone
        let proxy = Proxy::new("192.0.2.1".to_string(), 1080);
        assert_eq!(classify(&proxy).await, ProxyType::Socks5);

        let proxy = Proxy::new("192.0.2.1".to_string(), 443);
        assert_eq!(classify(&proxy).await, ProxyType::Https);
    }

    #[tokio::test]
    async fn test_classify_unreachable_nonstandard_port_is_unknown() {
        // 127.0.0.1 refuses the connection immediately, so this stays fast
        let proxy = Proxy::new("127.0.0.1".to_string(), 9);
        assert_eq!(classify(&proxy).await, ProxyType::Unknown);
    }
}
