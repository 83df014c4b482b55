//! Train the per-target delta models and persist the bundle.
//!
//! Expects the panel produced by the build_panel example.
//! Run with: cargo run --example train_models

use energy_forecast::config::ForecastConfig;
use energy_forecast::data::PanelLoader;
use energy_forecast::features::PanelFeatureBuilder;
use energy_forecast::training::ModelTrainer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = ForecastConfig::default();

    let panel = PanelLoader::from_csv(&config.panel_path)?;
    let table = PanelFeatureBuilder::new(&config).build(&panel)?;
    println!(
        "Feature table: {} rows across {} countries",
        table.len(),
        table.country_count()
    );

    let outcome = ModelTrainer::new(config.clone()).train(&table)?;

    outcome.bundle.save(&config.models_dir)?;
    outcome.metrics.save(&config.models_dir)?;

    println!("{}", outcome.metrics);
    println!(
        "Selected models: {} for {}, {} for {}",
        outcome.bundle.manifest.best_lc_model_type,
        outcome.bundle.manifest.target_lc,
        outcome.bundle.manifest.best_gen_model_type,
        outcome.bundle.manifest.target_gen
    );
    println!("Saved bundle to {}", config.models_dir.display());

    Ok(())
}
