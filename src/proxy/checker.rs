//! Concurrent proxy probing
//!
//! `Checker::probe` runs a single proxy check: the cache shortcut when
//! trusted metrics were supplied at load time, otherwise a live HEAD request
//! through the proxy followed by protocol classification and a country
//! lookup. `Checker::check_all` fans a whole batch out under a semaphore
//! bound and only returns once every check has produced an outcome.

use crate::proxy::classify::classify;
use crate::proxy::geo::GeoResolver;
use crate::proxy::models::{CachedMetrics, ProbeOutcome, Proxy};
use crate::Result;
use anyhow::anyhow;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Proxy as ReqwestProxy};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Default timeout for a single proxy check in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default number of concurrent checks
const DEFAULT_CONCURRENCY: usize = 20;

/// Default URL to test proxies against
const DEFAULT_TEST_URL: &str = "http://httpbin.org/ip";

/// Configuration for the proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout for each proxy check
    pub timeout: Duration,
    /// Number of concurrent checks
    pub concurrency: usize,
    /// URL to test proxies against
    pub test_url: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            test_url: DEFAULT_TEST_URL.to_string(),
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_test_url(mut self, url: String) -> Self {
        self.test_url = url;
        self
    }
}

/// Proxy checker: probes endpoints and collects outcomes
#[derive(Clone)]
pub struct Checker {
    config: CheckerConfig,
    geo: GeoResolver,
}

impl Checker {
    pub fn new() -> Self {
        Self::with_config(CheckerConfig::default())
    }

    pub fn with_config(config: CheckerConfig) -> Self {
        Self {
            config,
            geo: GeoResolver::new(),
        }
    }

    /// Check a single proxy and produce its outcome. Infallible: every
    /// failure mode is folded into a failed `ProbeOutcome`.
    pub async fn probe(&self, proxy: &Proxy, cached: Option<&CachedMetrics>) -> ProbeOutcome {
        // Complete cached metrics are trusted as-is; no network activity.
        if let Some(metrics) = cached {
            return ProbeOutcome::cached(proxy.clone(), metrics);
        }

        match self.live_probe(proxy).await {
            Ok(outcome) => outcome,
            Err(e) => ProbeOutcome::failed(proxy.clone(), e.to_string()),
        }
    }

    /// Check a whole batch with at most `config.concurrency` probes in
    /// flight. Every input pair yields exactly one outcome and a failure in
    /// one check never affects its siblings. The returned batch is restored
    /// to input order, so completion timing never leaks into report order.
    pub async fn check_all(&self, proxies: Vec<(Proxy, Option<CachedMetrics>)>) -> Vec<ProbeOutcome> {
        self.check_all_with(proxies, |_| {}).await
    }

    /// Like [`check_all`](Self::check_all), invoking `on_outcome` as each
    /// check finishes (progress reporting lives outside the core).
    pub async fn check_all_with(
        &self,
        proxies: Vec<(Proxy, Option<CachedMetrics>)>,
        on_outcome: impl Fn(&ProbeOutcome),
    ) -> Vec<ProbeOutcome> {
        let concurrency = self.config.concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let on_outcome = &on_outcome;

        let mut indexed: Vec<(usize, ProbeOutcome)> = stream::iter(proxies.into_iter().enumerate())
            .map(|(index, (proxy, cached))| {
                let sem = Arc::clone(&semaphore);
                async move {
                    // Semaphore acquire only fails if the semaphore is closed,
                    // which won't happen here since we own the Arc and keep it
                    // alive for the duration of the batch.
                    let _permit = sem
                        .acquire()
                        .await
                        .expect("Semaphore closed unexpectedly");
                    let outcome = self.probe(&proxy, cached.as_ref()).await;
                    on_outcome(&outcome);
                    (index, outcome)
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, outcome)| outcome).collect()
    }

    /// Perform the live probe: HEAD through the proxy, then classify and
    /// geo-resolve. Errors propagate to `probe` where they become a failed
    /// outcome.
    async fn live_probe(&self, proxy: &Proxy) -> Result<ProbeOutcome> {
        let client = self.build_client(proxy)?;
        let start = Instant::now();

        let response = tokio::time::timeout(
            self.config.timeout,
            client.head(&self.config.test_url).send(),
        )
        .await
        .map_err(|_| anyhow!("timed out after {:?}", self.config.timeout))??
        .error_for_status()?;

        let body = response.bytes().await?;
        let latency_secs = start.elapsed().as_secs_f64();
        // HEAD responses normally carry no body, so this is usually 0.
        let speed_bps = if latency_secs > 0.0 {
            body.len() as f64 / latency_secs
        } else {
            0.0
        };

        let proxy_type = classify(proxy).await;
        let country = self.geo.resolve_country(&proxy.host).await;

        Ok(ProbeOutcome::fresh(
            proxy.clone(),
            latency_secs,
            speed_bps,
            proxy_type,
            country,
        ))
    }

    /// Build a reqwest client routing through the proxy
    fn build_client(&self, proxy: &Proxy) -> Result<Client> {
        let client = Client::builder()
            .proxy(ReqwestProxy::all(proxy.url())?)
            .timeout(self.config.timeout)
            .build()?;
        Ok(client)
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::models::{MetricsSource, ProxyType};

    fn fast_checker() -> Checker {
        // Point at the local discard port so failed probes resolve quickly
        // without leaving the machine.
        Checker::with_config(
            CheckerConfig::new()
                .with_timeout(Duration::from_millis(500))
                .with_test_url("http://127.0.0.1:9/".to_string()),
        )
    }

    #[test]
    fn test_checker_config_default() {
        let config = CheckerConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.test_url, DEFAULT_TEST_URL);
    }

    #[test]
    fn test_checker_config_builder() {
        let config = CheckerConfig::new()
            .with_timeout(Duration::from_secs(30))
            .with_concurrency(50)
            .with_test_url("http://example.com".to_string());

        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.concurrency, 50);
        assert_eq!(config.test_url, "http://example.com");
    }

    #[test]
    fn test_concurrency_floor_is_one() {
        let config = CheckerConfig::new().with_concurrency(0);
        assert_eq!(config.concurrency, 1);
    }

    #[tokio::test]
    async fn test_cached_metrics_bypass_network() {
        let checker = fast_checker();
        let proxy = Proxy::new("5.6.7.8".to_string(), 8080);
        let metrics = CachedMetrics {
            latency_secs: 0.2,
            speed_bps: 500.0,
            proxy_type: ProxyType::Http,
            country: "US".to_string(),
        };

        let outcome = checker.probe(&proxy, Some(&metrics)).await;
        assert!(outcome.success);
        assert_eq!(outcome.source, MetricsSource::Cached);
        assert_eq!(outcome.latency_secs, 0.2);
        assert_eq!(outcome.speed_bps, 500.0);
        assert_eq!(outcome.proxy_type, ProxyType::Http);
        assert_eq!(outcome.country, "US");
    }

    #[tokio::test]
    async fn test_unreachable_proxy_yields_failed_outcome() {
        let checker = fast_checker();
        let proxy = Proxy::new("127.0.0.1".to_string(), 9);

        let outcome = checker.probe(&proxy, None).await;
        assert!(!outcome.success);
        assert_eq!(outcome.latency_secs, 0.0);
        assert_eq!(outcome.speed_bps, 0.0);
        assert_eq!(outcome.proxy_type, ProxyType::Unknown);
        assert_eq!(outcome.country, "Unknown");
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn test_check_all_one_outcome_per_input_in_input_order() {
        let checker = fast_checker();
        let cached = CachedMetrics {
            latency_secs: 0.1,
            speed_bps: 1000.0,
            proxy_type: ProxyType::Socks5,
            country: "DE".to_string(),
        };
        let batch = vec![
            (Proxy::new("127.0.0.1".to_string(), 9), None),
            (Proxy::new("10.0.0.1".to_string(), 1080), Some(cached)),
            (Proxy::new("127.0.0.1".to_string(), 19), None),
        ];

        let outcomes = checker.check_all(batch).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].proxy.to_string(), "127.0.0.1:9");
        assert_eq!(outcomes[1].proxy.to_string(), "10.0.0.1:1080");
        assert_eq!(outcomes[2].proxy.to_string(), "127.0.0.1:19");

        // The cached entry succeeds even though its siblings fail
        assert!(!outcomes[0].success);
        assert!(outcomes[1].success);
        assert_eq!(outcomes[1].source, MetricsSource::Cached);
        assert!(!outcomes[2].success);
    }

    #[tokio::test]
    async fn test_check_all_never_exceeds_concurrency_bound() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use tokio::net::TcpListener;

        // A local listener that holds every accepted connection open for a
        // while, tracking how many are open at once. Each in-flight check
        // keeps exactly one connection open against it.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let open = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        {
            let open = Arc::clone(&open);
            let peak = Arc::clone(&peak);
            tokio::spawn(async move {
                while let Ok((socket, _)) = listener.accept().await {
                    let open = Arc::clone(&open);
                    let peak = Arc::clone(&peak);
                    tokio::spawn(async move {
                        let now = open.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(300)).await;
                        open.fetch_sub(1, Ordering::SeqCst);
                        drop(socket);
                    });
                }
            });
        }

        let checker = Checker::with_config(
            CheckerConfig::new()
                .with_timeout(Duration::from_millis(500))
                .with_concurrency(2)
                .with_test_url("http://127.0.0.1:9/".to_string()),
        );
        let batch: Vec<_> = (0..6)
            .map(|_| (Proxy::new(addr.ip().to_string(), addr.port()), None))
            .collect();

        let outcomes = checker.check_all(batch).await;

        assert_eq!(outcomes.len(), 6);
        let peak = peak.load(Ordering::SeqCst);
        assert!(
            peak <= 2,
            "{} checks were in flight at once under a bound of 2",
            peak
        );
    }

    #[tokio::test]
    async fn test_check_all_progress_callback_sees_every_outcome() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let checker = fast_checker();
        let batch = vec![
            (Proxy::new("127.0.0.1".to_string(), 9), None),
            (Proxy::new("127.0.0.1".to_string(), 19), None),
        ];

        let seen = AtomicUsize::new(0);
        let outcomes = checker
            .check_all_with(batch, |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
