//! # Energy Forecast
//!
//! A Rust library for forecasting country-level energy-transition
//! indicators (low-carbon electricity share, total generation) from a
//! historical yearly panel.
//!
//! ## Pipeline
//!
//! - Feature engineering: source-mix shares, one-to-three-year lags and
//!   year-over-year delta targets ([`PanelFeatureBuilder`])
//! - Training: time-split candidate models per target with per-target
//!   selection and a persisted artifact bundle ([`ModelTrainer`])
//! - Inference: recursive multi-year forecasts that feed each predicted
//!   year back in as history for the next ([`RecursiveForecaster`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use energy_forecast::config::ForecastConfig;
//! use energy_forecast::data::PanelLoader;
//! use energy_forecast::features::PanelFeatureBuilder;
//! use energy_forecast::forecast::ForecastService;
//! use energy_forecast::training::ModelTrainer;
//! use std::sync::Arc;
//!
//! # fn main() -> energy_forecast::error::Result<()> {
//! let config = ForecastConfig::default();
//!
//! // Load the panel and engineer the supervised table
//! let panel = PanelLoader::from_csv(&config.panel_path)?;
//! let table = PanelFeatureBuilder::new(&config).build(&panel)?;
//!
//! // Train, persist, then serve forecasts
//! let outcome = ModelTrainer::new(config.clone()).train(&table)?;
//! outcome.bundle.save(&config.models_dir)?;
//!
//! let service = ForecastService::new(Arc::new(outcome.bundle), panel, &config);
//! let forecast = service.predict_horizon("BRA", 5)?;
//! println!("{:?}", forecast.forecasts);
//! # Ok(())
//! # }
//! ```

pub mod bundle;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod forecast;
pub mod metrics;
pub mod models;
pub mod training;

// Re-export commonly used types
pub use crate::bundle::{FeatureManifest, TrainedModelBundle};
pub use crate::config::ForecastConfig;
pub use crate::data::{HistorySource, PanelData, PanelLoader};
pub use crate::error::ForecastError;
pub use crate::features::{FeatureRow, FeatureTable, PanelFeatureBuilder};
pub use crate::forecast::{CountryForecast, ForecastPoint, ForecastService, RecursiveForecaster};
pub use crate::metrics::TrainingMetrics;
pub use crate::models::ModelKind;
pub use crate::training::ModelTrainer;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
