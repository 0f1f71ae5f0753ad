//! Country lookup for proxy IPs via the ip-api.com JSON endpoint

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Endpoint base; the IP is appended as a path segment
const GEO_API_URL: &str = "http://ip-api.com/json";

/// Timeout for a single lookup
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct GeoResponse {
    country: Option<String>,
}

/// Resolver for IP-to-country lookups. Cheap to clone; the inner client is
/// shared across probe workers.
#[derive(Clone)]
pub struct GeoResolver {
    client: Client,
    api_base: String,
}

impl GeoResolver {
    pub fn new() -> Self {
        // Only a timeout is set here, so the builder has no TLS or resolver
        // override that could fail.
        let client = Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .expect("failed to build geo lookup client");
        Self {
            client,
            api_base: GEO_API_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.to_string();
        self
    }

    /// Look up the country for an IP address. Any failure (network error,
    /// non-2xx, malformed body, missing field) yields `"Unknown"`.
    pub async fn resolve_country(&self, ip: &str) -> String {
        match self.lookup(ip).await {
            Ok(country) => country,
            Err(_) => "Unknown".to_string(),
        }
    }

    async fn lookup(&self, ip: &str) -> crate::Result<String> {
        let url = format!("{}/{}", self.api_base, ip);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body: GeoResponse = response.json().await?;
        Ok(body.country.unwrap_or_else(|| "Unknown".to_string()))
    }
}

impl Default for GeoResolver {
    fn default() -> Self {
        Self::new()
    }
}
