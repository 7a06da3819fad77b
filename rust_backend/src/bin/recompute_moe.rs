use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use std::fs;

use tetres_tt::config::EngineConfig;
use tetres_tt::db::repositories::LocalRepository;
use tetres_tt::models::{MoeThresholds, Period, RouteId, TravelTimeRecord};
use tetres_tt::services::{update_moe_values_a_route, RecomputeSummary};
use tetres_tt::WriteLock;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_time(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .with_context(|| format!("Invalid time '{}', expected {}", value, TIME_FORMAT))
}

fn parse_f64(value: &str, name: &str) -> Result<f64> {
    value
        .parse()
        .with_context(|| format!("Invalid {} '{}'", name, value))
}

fn load_config() -> Result<EngineConfig> {
    match std::env::var("TETRES_CONFIG") {
        Ok(path) => EngineConfig::from_file(&path).with_context(|| format!("Failed to load {}", path)),
        Err(_) => match EngineConfig::from_default_location() {
            Ok(config) => Ok(config),
            Err(e) => {
                println!("Using default configuration ({})", e);
                Ok(EngineConfig::default())
            }
        },
    }
}

/// Recompute the records of `route_id` in `period` and return the whole dump.
async fn recompute_dump(
    records: Vec<TravelTimeRecord>,
    config: &EngineConfig,
    period: &Period,
    route_id: RouteId,
    thresholds: &MoeThresholds,
) -> Result<(Vec<TravelTimeRecord>, RecomputeSummary)> {
    let repo = LocalRepository::new();
    repo.import_records(records);
    let summary = update_moe_values_a_route(&repo, config, period, route_id, thresholds, &WriteLock::new())
        .await
        .context("Recompute failed")?;
    Ok((repo.export_records(), summary))
}

/// Recompute threshold-dependent MOE values of a travel-time dump.
///
/// Usage: recompute_moe <records.json> <route_id> <start> <end>
///        <critical_density> <lane_capacity> <congestion_threshold_speed> [output.json]
#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 8 {
        bail!(
            "usage: {} <records.json> <route_id> <start> <end> <critical_density> <lane_capacity> <congestion_threshold_speed> [output.json]",
            args.first().map(|s| s.as_str()).unwrap_or("recompute_moe")
        );
    }
    let records_path = &args[1];
    let route_id = RouteId(args[2].parse().with_context(|| format!("Invalid route id '{}'", args[2]))?);
    let thresholds = MoeThresholds::new(
        parse_f64(&args[5], "critical density")?,
        parse_f64(&args[6], "lane capacity")?,
        parse_f64(&args[7], "congestion threshold speed")?,
    );
    let output_path = args.get(8).unwrap_or(records_path);

    let config = load_config()?;
    config.validate().context("Invalid configuration")?;
    let period = Period::new(
        parse_time(&args[3])?,
        parse_time(&args[4])?,
        config.travel_time.data_interval,
    )
    .context("Invalid period")?;

    println!("=== MOE Recompute ===");
    println!("Records file: {}", records_path);
    println!("Route: {}", route_id);
    println!("Period: {}", period);
    println!(
        "Thresholds: critical density {}, lane capacity {}, congestion threshold speed {}",
        thresholds.critical_density, thresholds.lane_capacity, thresholds.congestion_threshold_speed
    );
    println!();

    let content = fs::read_to_string(records_path)
        .with_context(|| format!("Failed to read {}", records_path))?;
    let records: Vec<TravelTimeRecord> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", records_path))?;

    let (records, summary) = recompute_dump(records, &config, &period, route_id, &thresholds).await?;

    let output = serde_json::to_string_pretty(&records)?;
    fs::write(output_path, output).with_context(|| format!("Failed to write {}", output_path))?;

    println!("✓ Recompute completed");
    println!("  Examined: {}", summary.examined);
    println!("  Updated: {}", summary.updated.len());
    println!("  Skipped (unreadable meta data): {}", summary.skipped_unparsable);
    println!("  Output: {}", output_path);
    Ok(())
}
