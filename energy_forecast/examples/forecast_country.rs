//! Serve a recursive multi-year forecast for one country.
//!
//! Expects the artifacts produced by the train_models example.
//! Run with: cargo run --example forecast_country -- DEU 10

use energy_forecast::bundle::TrainedModelBundle;
use energy_forecast::config::ForecastConfig;
use energy_forecast::data::PanelLoader;
use energy_forecast::forecast::ForecastService;
use energy_forecast::metrics::TrainingMetrics;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let iso3 = args.next().unwrap_or_else(|| "BRA".to_string());
    let horizon: usize = match args.next() {
        Some(raw) => raw.parse()?,
        None => ForecastConfig::default().default_horizon,
    };

    let config = ForecastConfig::default();

    let bundle = Arc::new(TrainedModelBundle::load(&config.models_dir)?);
    let panel = PanelLoader::from_csv(&config.panel_path)?;

    let service = ForecastService::new(bundle, panel, &config);
    let forecast = service.predict_horizon(&iso3, horizon)?;

    println!("Forecast for {}:", forecast.iso3);
    for point in &forecast.forecasts {
        println!(
            "  {}  low-carbon {:6.2} %   generation {:10.1} TWh",
            point.year, point.low_carbon_share_pct, point.electricity_generation_twh
        );
    }

    match TrainingMetrics::load(&config.models_dir)? {
        Some(metrics) => println!("\n{}", metrics),
        None => println!("\nNo metrics report found (bundle not trained yet?)"),
    }

    Ok(())
}
