//! Proxy list loading from TXT, CSV and JSON sources
//!
//! The loader is the gatekeeper for the probing core: every entry it emits
//! carries a non-empty host and a valid non-zero port, and cached metrics are
//! attached only when the source supplied all four of latency, speed, type
//! and country. Malformed entries are silently filtered.

use crate::proxy::models::{CachedMetrics, Proxy, ProxyType};
use crate::Result;
use anyhow::anyhow;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

/// A loaded proxy and its optional trusted metrics
pub type LoadedProxy = (Proxy, Option<CachedMetrics>);

/// Matches `host:port` or `host,port` with a 1-5 digit port
static ADDRESS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^:,\s]+)[:,](\d{1,5})$").expect("Invalid address regex")
});

/// Proxy list parser
pub struct ProxyParser;

impl ProxyParser {
    /// Parse one `host:port` (or `host,port`) address. Returns `None` for
    /// anything without a valid port.
    pub fn parse_address(s: &str) -> Option<Proxy> {
        let caps = ADDRESS_REGEX.captures(s.trim())?;
        let host = caps[1].to_string();
        let port: u16 = caps[2].parse().ok()?;
        if port == 0 {
            return None;
        }
        Some(Proxy::new(host, port))
    }

    /// Load proxies from a file (dispatched on extension) or from every
    /// `.txt`/`.csv`/`.json` file inside a directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<LoadedProxy>> {
        let path = path.as_ref();
        if path.is_dir() {
            return Self::load_dir(path);
        }
        if !path.is_file() {
            return Err(anyhow!("Invalid input path: {}", path.display()));
        }

        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => Ok(Self::parse_csv(&content)),
            Some("json") => Self::parse_json(&content),
            Some("txt") => Ok(Self::parse_txt(&content)),
            _ => Err(anyhow!("Unsupported file format: {}", path.display())),
        }
    }

    fn load_dir(dir: &Path) -> Result<Vec<LoadedProxy>> {
        let mut proxies = Vec::new();
        let mut entries: Vec<_> = fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        entries.sort();

        for path in entries {
            match path.extension().and_then(|e| e.to_str()) {
                Some("txt") | Some("csv") | Some("json") => {
                    proxies.extend(Self::load(&path)?);
                }
                _ => {}
            }
        }
        Ok(proxies)
    }

    /// Parse plain-text content: one proxy per line, blank lines and `#`
    /// comments skipped.
    pub fn parse_txt(content: &str) -> Vec<LoadedProxy> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| Self::parse_address(line).map(|p| (p, None)))
            .collect()
    }

    /// Parse CSV content. With an `ip`/`port` header the named columns are
    /// used (the `ip` cell may already be `ip:port`), and `latency`, `speed`,
    /// `type` and `country` columns populate cached metrics when all four
    /// are present and parse. Headerless content falls back to positional
    /// `ip,port` rows or single-column `ip:port`.
    pub fn parse_csv(content: &str) -> Vec<LoadedProxy> {
        let mut lines = content.lines();
        let Some(first) = lines.next() else {
            return Vec::new();
        };

        let header: Vec<String> = Self::split_row(first)
            .iter()
            .map(|c| c.to_lowercase())
            .collect();
        let col = |name: &str| header.iter().position(|h| h == name);

        match (col("ip"), col("port")) {
            (Some(ip_idx), Some(port_idx)) => {
                let metric_cols = (col("latency"), col("speed"), col("type"), col("country"));
                lines
                    .filter_map(|line| Self::parse_csv_row(line, ip_idx, port_idx, metric_cols))
                    .collect()
            }
            // No header: the first line is data too
            _ => std::iter::once(first)
                .chain(lines)
                .filter_map(Self::parse_positional_row)
                .collect(),
        }
    }

    fn parse_csv_row(
        line: &str,
        ip_idx: usize,
        port_idx: usize,
        metric_cols: (Option<usize>, Option<usize>, Option<usize>, Option<usize>),
    ) -> Option<LoadedProxy> {
        let row = Self::split_row(line);
        let ip = row.get(ip_idx)?;

        let proxy = if ip.contains(':') {
            Self::parse_address(ip)?
        } else {
            Self::parse_address(&format!("{}:{}", ip, row.get(port_idx)?))?
        };

        let metrics = match metric_cols {
            (Some(lat), Some(spd), Some(typ), Some(ctry)) => {
                let latency_secs: f64 = row.get(lat)?.parse().ok()?;
                let speed_bps: f64 = row.get(spd)?.parse().ok()?;
                Some(CachedMetrics {
                    latency_secs,
                    speed_bps,
                    proxy_type: ProxyType::parse(row.get(typ)?),
                    country: row.get(ctry)?.to_string(),
                })
            }
            _ => None,
        };

        Some((proxy, metrics))
    }

    fn parse_positional_row(line: &str) -> Option<LoadedProxy> {
        let row = Self::split_row(line);
        match row.as_slice() {
            [addr] => Self::parse_address(addr).map(|p| (p, None)),
            [ip, rest @ ..] if !rest.is_empty() => {
                let proxy = if ip.contains(':') {
                    Self::parse_address(ip)?
                } else {
                    Self::parse_address(&format!("{}:{}", ip, rest[0]))?
                };
                Some((proxy, None))
            }
            _ => None,
        }
    }

    fn split_row(line: &str) -> Vec<String> {
        line.split(',').map(|c| c.trim().to_string()).collect()
    }

    /// Parse JSON content: a top-level array of address strings or
    /// `{ip, port, ...}` objects, or an object with a `proxies` array or a
    /// `hosts` array.
    pub fn parse_json(content: &str) -> Result<Vec<LoadedProxy>> {
        let value: serde_json::Value = serde_json::from_str(content)?;

        let entries = match &value {
            serde_json::Value::Array(items) => items.as_slice(),
            serde_json::Value::Object(map) => map
                .get("proxies")
                .or_else(|| map.get("hosts"))
                .and_then(|v| v.as_array())
                .map(|a| a.as_slice())
                .unwrap_or(&[]),
            _ => &[],
        };

        Ok(entries.iter().filter_map(Self::parse_json_entry).collect())
    }

    fn parse_json_entry(entry: &serde_json::Value) -> Option<LoadedProxy> {
        match entry {
            serde_json::Value::String(s) => Self::parse_address(s).map(|p| (p, None)),
            serde_json::Value::Object(map) => {
                let host = map.get("ip")?.as_str()?;
                let port = match map.get("port")? {
                    serde_json::Value::Number(n) => u16::try_from(n.as_u64()?).ok()?,
                    serde_json::Value::String(s) => s.parse().ok()?,
                    _ => return None,
                };
                let proxy = Self::parse_address(&format!("{}:{}", host, port))?;

                let metrics = match (
                    map.get("latency").and_then(|v| v.as_f64()),
                    map.get("speed").and_then(|v| v.as_f64()),
                    map.get("type").and_then(|v| v.as_str()),
                    map.get("country").and_then(|v| v.as_str()),
                ) {
                    (Some(latency_secs), Some(speed_bps), Some(typ), Some(country)) => {
                        Some(CachedMetrics {
                            latency_secs,
                            speed_bps,
                            proxy_type: ProxyType::parse(typ),
                            country: country.to_string(),
                        })
                    }
                    _ => None,
                };

                Some((proxy, metrics))
            }
            _ => None,
        }
    }
}
