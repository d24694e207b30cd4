mod bootstrap;

use anyhow::{Context, Result};
use period_core::formatting::{format_energy, format_minutes, percentage};
use period_core::settings::Settings;
use period_data::analysis::{run_batch, BatchConfig};

fn main() -> Result<()> {
    let settings = Settings::load()?;

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("Period View v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Boundary energy: {:?}, trailing: {:?}, labels: {}",
        settings.boundary_energy,
        settings.trailing,
        if settings.resolve_labels { "resolved" } else { "default" }
    );

    let config = BatchConfig::from_settings(&settings)?;
    let result = run_batch(&config).context("period view batch failed")?;

    let overall = &result.totals.overall;
    tracing::info!(
        "{} periods over {} endpoints: {}, {}",
        overall.periods,
        result.totals.by_endpoint.len(),
        format_minutes(overall.minutes),
        format_energy(overall.energy_kwh)
    );
    if overall.unattended > 0 {
        tracing::info!(
            "{} periods ({}%) had no operator on duty",
            overall.unattended,
            percentage(overall.unattended as f64, overall.periods as f64, 1)
        );
    }
    for (endpoint_id, stats) in &result.totals.by_endpoint {
        tracing::debug!(
            "Endpoint {}: {} periods, {}, avg {}",
            endpoint_id,
            stats.periods,
            format_minutes(stats.minutes),
            format_energy(stats.average_energy())
        );
    }
    tracing::debug!(
        "Load {:.3}s, segment {:.3}s",
        result.metadata.load_time_seconds,
        result.metadata.segment_time_seconds
    );

    Ok(())
}
