//! Proxy validation: models, loading, probing, classification and reporting

pub mod checker;
pub mod classify;
pub mod geo;
pub mod models;
pub mod parser;
pub mod report;

pub use checker::{Checker, CheckerConfig};
pub use classify::classify;
pub use geo::GeoResolver;
pub use models::{CachedMetrics, MetricsSource, ProbeOutcome, Proxy, ProxyType};
pub use parser::{LoadedProxy, ProxyParser};
pub use report::{AggregateReport, ReportWriter, SortPolicy};
