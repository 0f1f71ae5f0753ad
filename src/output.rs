//! Console presentation for probe outcomes and reports
//!
//! All terminal coloring lives here; the probing core emits structured
//! values and stays format-agnostic.

use crate::proxy::models::ProbeOutcome;
use crate::proxy::report::AggregateReport;
use colored::Colorize;

/// Print the one-line status for a finished check
pub fn print_outcome(outcome: &ProbeOutcome) {
    let address = outcome.proxy.to_string().bold();

    if !outcome.success {
        let cause = outcome.error.as_deref().unwrap_or("unknown error");
        println!("{} - {} | {}", address, "FAILED".red(), cause);
        return;
    }

    let status = if outcome.is_cached() {
        "WORKING (CACHED)".green()
    } else {
        "WORKING".green()
    };
    println!(
        "{} - {} | Latency: {}, Speed: {}, Type: {}, Country: {}",
        address,
        status,
        format!("{:.4}s", outcome.latency_secs).cyan(),
        format!("{:.2} B/s", outcome.speed_bps).magenta(),
        outcome.proxy_type.to_string().yellow(),
        outcome.country.blue(),
    );
}

/// Print the batch summary after aggregation
pub fn print_summary(report: &AggregateReport) {
    println!();
    println!("{}", "=== Proxy Check Summary ===".bold());
    println!("{}", report);
}

/// Print the no-working-proxies condition
pub fn print_no_working() {
    println!("{}", "No working proxies found!".red());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::models::{Proxy, ProxyType};

    // Printing must not panic regardless of outcome shape; content is
    // checked through the Display impls these functions format.
    #[test]
    fn test_print_outcome_smoke() {
        print_outcome(&ProbeOutcome::fresh(
            Proxy::new("1.2.3.4".to_string(), 8080),
            0.1234,
            567.8,
            ProxyType::Http,
            "US".to_string(),
        ));
        print_outcome(&ProbeOutcome::failed(
            Proxy::new("5.6.7.8".to_string(), 1080),
            "connection refused".to_string(),
        ));
    }
}
