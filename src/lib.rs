//! Proxy Audit - Concurrent Proxy Validator
//!
//! Loads proxy lists from TXT/CSV/JSON sources, probes each endpoint
//! concurrently under a bounded concurrency cap, measures latency and speed,
//! classifies the protocol, resolves the country and writes sorted,
//! statistically summarized reports.

pub mod output;
pub mod proxy;

pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
