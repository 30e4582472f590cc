use comps_valuation::config::Settings;
use comps_valuation::error::Result;
use comps_valuation::models::{Property, ValuationReport};
use comps_valuation::Valuation;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "full".to_string());
    init_logging(&log_level, &log_format);

    if let Err(e) = run().await {
        error!("Valuation failed: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

async fn run() -> Result<()> {
    info!("Starting comparable-sales valuation...");

    // Load configuration
    let settings = Settings::load()?;

    info!("Configuration loaded successfully");

    let subject: Property = read_json(&settings.input.subject_path)?;
    let listings: Vec<Property> = read_json(&settings.input.listings_path)?;

    info!(
        "Loaded subject {} and {} market listings",
        subject.id,
        listings.len()
    );

    let valuation = Valuation::new(subject, settings.valuation);
    let report = valuation.appraise(&listings).await;

    info!(
        "Valuation {} used {} comparables ({} skipped)",
        report.run_id,
        report.comparables.len(),
        report.skipped
    );

    print_report(&report, &settings.output.format)
}

fn read_json<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn print_report(report: &ValuationReport, format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("Estimated Property Value: ${:.2}", report.estimated_value);
    }
    Ok(())
}
