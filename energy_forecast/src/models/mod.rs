//! Regression models for the per-target delta predictions
//!
//! The trainer fits a scale-sensitive ridge regressor and a bagged-tree
//! ensemble for every target, plus a gradient-boosted ensemble when the
//! crate is built with the `gradient-boosting` feature. Selection operates
//! over [`ModelKind`] so "the boosted library may be absent" is a variant,
//! not a nullable reference.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::ridge_regression::{RidgeRegression, RidgeRegressionParameters};
use std::fmt;

#[cfg(feature = "gradient-boosting")]
use gbdt::config::Config as BoostConfig;
#[cfg(feature = "gradient-boosting")]
use gbdt::decision_tree::{Data as BoostData, DataVec};
#[cfg(feature = "gradient-boosting")]
use gbdt::gradient_boost::GBDT;

pub mod scaler;

pub use scaler::StandardScaler;

/// The model families a target can be served by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Ridge,
    BaggedTrees,
    GradientBoosted,
}

impl ModelKind {
    /// Short name used in metric keys and artifact file names
    pub fn short_name(&self) -> &'static str {
        match self {
            ModelKind::Ridge => "ridge",
            ModelKind::BaggedTrees => "rf",
            ModelKind::GradientBoosted => "gbdt",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// A fitted regressor for one delta target
#[derive(Serialize, Deserialize)]
pub enum Regressor {
    Ridge(RidgeRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>),
    BaggedTrees(RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>),
    #[cfg(feature = "gradient-boosting")]
    GradientBoosted(GBDT),
}

impl Regressor {
    /// Fit the regularized linear candidate. Expects pre-scaled features.
    pub fn fit_ridge(x: &[Vec<f64>], y: &[f64]) -> Result<Self> {
        let matrix = dense_matrix(x)?;
        let model = RidgeRegression::fit(
            &matrix,
            &y.to_vec(),
            RidgeRegressionParameters::default().with_alpha(1.0),
        )
        .map_err(|e| ForecastError::TrainingError(e.to_string()))?;

        Ok(Regressor::Ridge(model))
    }

    /// Fit the bagged-tree ensemble on unscaled features.
    ///
    /// The seed is fixed so repeated training runs produce identical models.
    pub fn fit_bagged_trees(x: &[Vec<f64>], y: &[f64]) -> Result<Self> {
        let matrix = dense_matrix(x)?;
        let model = RandomForestRegressor::fit(
            &matrix,
            &y.to_vec(),
            RandomForestRegressorParameters::default()
                .with_n_trees(300)
                .with_max_depth(10)
                .with_seed(42),
        )
        .map_err(|e| ForecastError::TrainingError(e.to_string()))?;

        Ok(Regressor::BaggedTrees(model))
    }

    /// Fit the gradient-boosted ensemble on unscaled features.
    ///
    /// Sampling ratios stay at 1.0: the boosting library draws subsamples
    /// from a thread-local RNG, so full sampling is what keeps the fit
    /// deterministic.
    #[cfg(feature = "gradient-boosting")]
    pub fn fit_gradient_boosted(x: &[Vec<f64>], y: &[f64]) -> Result<Self> {
        let width = x
            .first()
            .map(|row| row.len())
            .ok_or_else(|| ForecastError::TrainingError("No training rows".to_string()))?;
        if x.len() != y.len() {
            return Err(ForecastError::TrainingError(format!(
                "Feature rows ({}) and targets ({}) differ in length",
                x.len(),
                y.len()
            )));
        }

        let mut config = BoostConfig::new();
        config.set_feature_size(width);
        config.set_max_depth(6);
        config.set_iterations(400);
        config.set_shrinkage(0.05);
        config.set_loss("SquaredError");
        config.set_data_sample_ratio(1.0);
        config.set_feature_sample_ratio(1.0);
        config.set_debug(false);

        let mut data: DataVec = x
            .iter()
            .zip(y.iter())
            .map(|(row, label)| {
                BoostData::new_training_data(
                    row.iter().map(|v| *v as f32).collect(),
                    1.0,
                    *label as f32,
                    None,
                )
            })
            .collect();

        let mut model = GBDT::new(&config);
        model.fit(&mut data);

        Ok(Regressor::GradientBoosted(model))
    }

    /// Which model family this regressor belongs to
    pub fn kind(&self) -> ModelKind {
        match self {
            Regressor::Ridge(_) => ModelKind::Ridge,
            Regressor::BaggedTrees(_) => ModelKind::BaggedTrees,
            #[cfg(feature = "gradient-boosting")]
            Regressor::GradientBoosted(_) => ModelKind::GradientBoosted,
        }
    }

    /// Whether this regressor expects scaler-transformed features
    pub fn requires_scaling(&self) -> bool {
        matches!(self, Regressor::Ridge(_))
    }

    /// Predict one value per feature row
    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        if x.is_empty() {
            return Ok(Vec::new());
        }

        match self {
            Regressor::Ridge(model) => {
                let matrix = dense_matrix(x)?;
                model
                    .predict(&matrix)
                    .map_err(|e| ForecastError::ForecastingError(e.to_string()))
            }
            Regressor::BaggedTrees(model) => {
                let matrix = dense_matrix(x)?;
                model
                    .predict(&matrix)
                    .map_err(|e| ForecastError::ForecastingError(e.to_string()))
            }
            #[cfg(feature = "gradient-boosting")]
            Regressor::GradientBoosted(model) => {
                let data: DataVec = x
                    .iter()
                    .map(|row| {
                        BoostData::new_test_data(row.iter().map(|v| *v as f32).collect(), None)
                    })
                    .collect();
                Ok(model.predict(&data).iter().map(|v| *v as f64).collect())
            }
        }
    }

    /// Predict a single feature vector
    pub fn predict_one(&self, row: &[f64]) -> Result<f64> {
        let predictions = self.predict(std::slice::from_ref(&row.to_vec()))?;
        predictions
            .first()
            .copied()
            .ok_or_else(|| ForecastError::ForecastingError("Model returned no prediction".to_string()))
    }
}

impl fmt::Debug for Regressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Regressor({})", self.kind().short_name())
    }
}

fn dense_matrix(rows: &[Vec<f64>]) -> Result<DenseMatrix<f64>> {
    DenseMatrix::from_2d_vec(&rows.to_vec())
        .map_err(|e| ForecastError::DataError(format!("Cannot build feature matrix: {}", e)))
}
