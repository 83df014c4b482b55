//! Generate a synthetic yearly panel and export the engineered feature table.
//!
//! Run with: cargo run --example build_panel

use energy_forecast::config::ForecastConfig;
use energy_forecast::data::PanelData;
use energy_forecast::features::PanelFeatureBuilder;
use energy_panel::utils::{default_profiles, generate_test_panel};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = ForecastConfig::default();

    // Deterministic synthetic history standing in for the real data store
    let records = generate_test_panel(&default_profiles(), 1990, 2024, 42)?;

    // Export the raw panel for the training and forecasting examples
    if let Some(parent) = config.panel_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(&config.panel_path)?;
    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    let panel = PanelData::from_records(records)?;
    let table = PanelFeatureBuilder::new(&config).build(&panel)?;
    table.write_csv(&config.feature_table_path)?;

    println!(
        "Saved panel to {} and feature table to {} ({} rows, {} countries)",
        config.panel_path.display(),
        config.feature_table_path.display(),
        table.len(),
        table.country_count()
    );

    Ok(())
}
