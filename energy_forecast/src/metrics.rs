//! Metrics for evaluating regression quality across training runs

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// File the training metrics report is persisted under
pub const METRICS_FILE: &str = "metrics.json";

/// Mean absolute error between actual and predicted values
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;

    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();

    Ok(sum / actual.len() as f64)
}

/// Root mean squared error between actual and predicted values
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;

    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    Ok((sum / actual.len() as f64).sqrt())
}

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "Actual and predicted values must have the same non-zero length".to_string(),
        ));
    }
    Ok(())
}

/// MAE and RMSE for one (model, target, split) combination
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
}

impl ModelScore {
    /// Score a prediction vector against the actual values
    pub fn from_predictions(actual: &[f64], predicted: &[f64]) -> Result<Self> {
        Ok(Self {
            mae: mean_absolute_error(actual, predicted)?,
            rmse: root_mean_squared_error(actual, predicted)?,
        })
    }
}

impl std::fmt::Display for ModelScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MAE {:.4}  RMSE {:.4}", self.mae, self.rmse)
    }
}

/// The persisted metrics report of one training run.
///
/// Keys follow `{model}_{target}_{split}`, e.g. `rf_delta_lc_val`. The map
/// is ordered so the report serializes stably.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainingMetrics {
    scores: BTreeMap<String, ModelScore>,
}

impl TrainingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, score: ModelScore) {
        self.scores.insert(key.into(), score);
    }

    pub fn get(&self, key: &str) -> Option<&ModelScore> {
        self.scores.get(key)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelScore)> {
        self.scores.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Persist the report into the bundle directory
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        crate::bundle::write_artifact(&dir.as_ref().join(METRICS_FILE), self)
    }

    /// Load a persisted report; `Ok(None)` when no report exists yet.
    ///
    /// A missing report means "not trained yet", which callers surface as a
    /// structured response rather than a failure.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Option<Self>> {
        let path = dir.as_ref().join(METRICS_FILE);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(crate::bundle::read_artifact(&path)?))
    }
}

impl std::fmt::Display for TrainingMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Training Metrics:")?;
        for (key, score) in self.iter() {
            writeln!(f, "  {:<28} {}", key, score)?;
        }
        Ok(())
    }
}
