//! Result aggregation and report artifacts
//!
//! `AggregateReport` is a pure function of a completed batch of outcomes:
//! working/failed partition, summary statistics and the sorted working list.
//! `ReportWriter` lays the artifacts out in a timestamped directory.

use crate::proxy::models::ProbeOutcome;
use crate::Result;
use chrono::Local;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Ordering applied to the working list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortPolicy {
    /// Preserve input order
    #[default]
    Insertion,
    /// Ascending latency
    Latency,
    /// Descending speed
    Speed,
}

impl SortPolicy {
    /// Filename of the address list this policy produces
    fn list_filename(&self) -> &'static str {
        match self {
            SortPolicy::Insertion => "working_proxies.txt",
            SortPolicy::Latency => "latency_sorted.txt",
            SortPolicy::Speed => "speed_sorted.txt",
        }
    }
}

/// Read-only summary view over a completed batch
#[derive(Debug, Clone)]
pub struct AggregateReport {
    pub total_tested: usize,
    pub working_count: usize,
    pub failed_count: usize,
    /// Percentage of working proxies, 0-100
    pub success_rate: f64,
    /// Mean latency over the working set, seconds
    pub avg_latency_secs: f64,
    /// Mean speed over the working set, bytes per second
    pub avg_speed_bps: f64,
    pub sort_policy: SortPolicy,
    /// Working outcomes, ordered by the sort policy
    pub working: Vec<ProbeOutcome>,
    /// Failed outcomes, unordered among themselves
    pub failed: Vec<ProbeOutcome>,
}

impl AggregateReport {
    /// Aggregate a completed batch. Returns `None` when there are no working
    /// proxies ("no working proxies" condition); report generation is
    /// skipped in that case.
    pub fn from_outcomes(outcomes: &[ProbeOutcome], sort_policy: SortPolicy) -> Option<Self> {
        let total_tested = outcomes.len();
        let (mut working, failed): (Vec<_>, Vec<_>) =
            outcomes.iter().cloned().partition(|o| o.is_working());

        if working.is_empty() {
            return None;
        }

        let working_count = working.len();
        let failed_count = failed.len();
        let success_rate = working_count as f64 / total_tested as f64 * 100.0;
        let avg_latency_secs =
            working.iter().map(|o| o.latency_secs).sum::<f64>() / working_count as f64;
        let avg_speed_bps =
            working.iter().map(|o| o.speed_bps).sum::<f64>() / working_count as f64;

        // Stable sorts; ties keep input order
        match sort_policy {
            SortPolicy::Insertion => {}
            SortPolicy::Latency => {
                working.sort_by(|a, b| a.latency_secs.total_cmp(&b.latency_secs))
            }
            SortPolicy::Speed => working.sort_by(|a, b| b.speed_bps.total_cmp(&a.speed_bps)),
        }

        Some(Self {
            total_tested,
            working_count,
            failed_count,
            success_rate,
            avg_latency_secs,
            avg_speed_bps,
            sort_policy,
            working,
            failed,
        })
    }
}

impl fmt::Display for AggregateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Tested: {}", self.total_tested)?;
        writeln!(f, "Working Proxies: {}", self.working_count)?;
        writeln!(f, "Failed Proxies: {}", self.failed_count)?;
        writeln!(f, "Success Rate: {:.2}%", self.success_rate)?;
        writeln!(f, "Average Latency: {:.4}s", self.avg_latency_secs)?;
        write!(f, "Average Speed: {:.2} B/s", self.avg_speed_bps)
    }
}

/// Writes report artifacts into `<output_dir>/results_<timestamp>/`
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Write the combined CSV report, the summary and the address lists.
    /// Returns the directory the artifacts went into.
    pub fn save(&self, report: &AggregateReport) -> Result<PathBuf> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let dir = self.output_dir.join(format!("results_{}", timestamp));
        fs::create_dir_all(&dir)?;

        fs::write(dir.join("working_report.csv"), Self::render_csv(report))?;
        fs::write(
            dir.join("summary.txt"),
            Self::render_summary(report, &timestamp),
        )?;

        // The filename advertises the ordering the list carries
        Self::write_address_list(&dir, report.sort_policy, &report.working)?;

        Ok(dir)
    }

    fn render_csv(report: &AggregateReport) -> String {
        let mut out = String::from("Proxy,Type,Country,Latency (s),Speed (B/s),Status\n");
        for o in &report.working {
            out.push_str(&format!(
                "{},{},{},{:.4},{:.2},WORKING\n",
                o.proxy, o.proxy_type, o.country, o.latency_secs, o.speed_bps
            ));
        }
        for o in &report.failed {
            out.push_str(&format!("{},N/A,N/A,N/A,N/A,FAILED\n", o.proxy));
        }
        out
    }

    fn render_summary(report: &AggregateReport, timestamp: &str) -> String {
        format!(
            "=== Proxy Check Summary ===\nTimestamp: {}\n{}\n",
            timestamp, report
        )
    }

    fn write_address_list(dir: &Path, policy: SortPolicy, working: &[ProbeOutcome]) -> Result<()> {
        let content: String = working
            .iter()
            .map(|o| format!("{}\n", o.proxy))
            .collect();
        fs::write(dir.join(policy.list_filename()), content)?;
        Ok(())
    }
}
