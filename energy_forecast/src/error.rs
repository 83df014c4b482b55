//! Error types for the energy_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the energy_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Caller-supplied input was rejected (unknown country, bad horizon,
    /// insufficient seed history)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error during model fitting or evaluation
    #[error("Training error: {0}")]
    TrainingError(String),

    /// Error during forecast generation
    #[error("Forecasting error: {0}")]
    ForecastingError(String),

    /// A persisted artifact is absent; "no data yet" rather than a fault
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV operations
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from serializing or deserializing artifacts
    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}
