//! Configuration for the forecasting pipeline
//!
//! All process-wide settings live in an explicit [`ForecastConfig`] value
//! that the caller constructs and passes into each component. The library
//! never reads environment variables or global state.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration shared by feature building, training and serving
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Path to the raw yearly panel CSV
    pub panel_path: PathBuf,
    /// Path the engineered feature table is exported to
    pub feature_table_path: PathBuf,
    /// Directory holding the persisted model bundle artifacts
    pub models_dir: PathBuf,
    /// Feature rows before this year are dropped (early sparse history)
    pub min_year: i32,
    /// Last year included in the training split
    pub train_year_max: i32,
    /// Last year included in the validation split; later years are test
    pub val_year_max: i32,
    /// Floor for share denominators, preventing division by zero
    pub share_epsilon: f64,
    /// Floor for log-transform inputs, preventing non-finite values
    pub log_floor: f64,
    /// Horizon used when the caller does not specify one
    pub default_horizon: usize,
    /// Largest accepted forecast horizon
    pub max_horizon: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            panel_path: PathBuf::from("data/energy_panel.csv"),
            feature_table_path: PathBuf::from("data/ml_panel.csv"),
            models_dir: PathBuf::from("models"),
            min_year: 2000,
            train_year_max: 2015,
            val_year_max: 2020,
            share_epsilon: 1e-9,
            log_floor: 1e-6,
            default_horizon: 5,
            max_horizon: 10,
        }
    }
}

impl ForecastConfig {
    /// First year of the test split
    pub fn test_year_min(&self) -> i32 {
        self.val_year_max + 1
    }
}
