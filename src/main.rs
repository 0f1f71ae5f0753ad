use anyhow::{anyhow, Result};
use clap::Parser;
use proxy_audit::output;
use proxy_audit::proxy::{
    AggregateReport, Checker, CheckerConfig, ProxyParser, ReportWriter, SortPolicy,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// A concurrent proxy validator with latency, speed and geo reporting
#[derive(Parser)]
#[command(name = "proxy-audit")]
#[command(about = "Check proxy lists concurrently and rank the working ones")]
struct Cli {
    /// Input file (.txt, .csv, .json) or directory containing proxy lists
    #[arg(short, long, default_value = "proxies")]
    input: PathBuf,

    /// Output directory for results
    #[arg(short, long, default_value = "proxy_results")]
    output: PathBuf,

    /// Maximum number of concurrent checks
    #[arg(short = 'n', long, default_value = "20")]
    threads: usize,

    /// Timeout for each proxy check in seconds
    #[arg(long, default_value = "5")]
    timeout: u64,

    /// Sort working proxies by metric (latency, speed)
    #[arg(short, long)]
    sort: Option<String>,

    /// URL to test proxies against
    #[arg(long, default_value = "http://httpbin.org/ip")]
    test_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let sort_policy = parse_sort_policy(cli.sort.as_deref())?;

    println!("\n=== Proxy Checker ===");
    println!("Loading proxies from {:?}...", cli.input);

    let proxies = ProxyParser::load(&cli.input)?;
    if proxies.is_empty() {
        println!("No valid proxies found!");
        return Ok(());
    }

    println!("Loaded {} proxies", proxies.len());
    println!("Starting checks with {} concurrent probes...\n", cli.threads);

    let config = CheckerConfig::new()
        .with_concurrency(cli.threads)
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_test_url(cli.test_url);
    let checker = Checker::with_config(config);

    let start = Instant::now();
    let outcomes = checker.check_all_with(proxies, output::print_outcome).await;
    println!(
        "\nCompleted checks in {:.2} seconds",
        start.elapsed().as_secs_f64()
    );

    match AggregateReport::from_outcomes(&outcomes, sort_policy) {
        Some(report) => {
            output::print_summary(&report);
            let dir = ReportWriter::new(&cli.output).save(&report)?;
            println!("\nResults saved to: {}", dir.display());
        }
        // Terminal but non-fatal: nothing worked, so there is no report
        None => output::print_no_working(),
    }

    Ok(())
}

fn parse_sort_policy(s: Option<&str>) -> Result<SortPolicy> {
    match s {
        None => Ok(SortPolicy::Insertion),
        Some("latency") => Ok(SortPolicy::Latency),
        Some("speed") => Ok(SortPolicy::Speed),
        Some(other) => Err(anyhow!(
            "Invalid sort policy: {}. Use: latency, speed",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort_policy() {
        assert_eq!(parse_sort_policy(None).unwrap(), SortPolicy::Insertion);
        assert_eq!(
            parse_sort_policy(Some("latency")).unwrap(),
            SortPolicy::Latency
        );
        assert_eq!(parse_sort_policy(Some("speed")).unwrap(), SortPolicy::Speed);
        assert!(parse_sort_policy(Some("alphabetical")).is_err());
    }
}
