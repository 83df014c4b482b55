//! Model training, selection and evaluation
//!
//! Rows are split by calendar year (train / validation / test) so model
//! selection never sees information from later years than it is trained
//! on. Every candidate is scored on validation; test metrics are computed
//! for reporting only and play no part in selection.

use crate::bundle::{FeatureManifest, TrainedModelBundle};
use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::features::{feature_columns, FeatureRow, FeatureTable, TARGET_GEN, TARGET_LC};
use crate::metrics::{ModelScore, TrainingMetrics};
use crate::models::{Regressor, StandardScaler};
use chrono::Utc;
use tracing::info;

/// A finished training run: the reusable bundle plus its metrics report
#[derive(Debug)]
pub struct TrainingOutcome {
    pub bundle: TrainedModelBundle,
    pub metrics: TrainingMetrics,
}

/// Trains and selects the per-target delta regressors
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    config: ForecastConfig,
}

/// Imputed feature matrices for all three splits
struct DesignMatrices {
    x_train: Vec<Vec<f64>>,
    x_train_scaled: Vec<Vec<f64>>,
    x_val: Vec<Vec<f64>>,
    x_val_scaled: Vec<Vec<f64>>,
    x_test: Vec<Vec<f64>>,
}

impl ModelTrainer {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    /// Train candidate models for both targets and assemble the bundle
    pub fn train(&self, table: &FeatureTable) -> Result<TrainingOutcome> {
        let columns = feature_columns();

        let train_rows: Vec<&FeatureRow> = table
            .rows
            .iter()
            .filter(|r| r.year <= self.config.train_year_max)
            .collect();
        let val_rows: Vec<&FeatureRow> = table
            .rows
            .iter()
            .filter(|r| r.year > self.config.train_year_max && r.year <= self.config.val_year_max)
            .collect();
        let test_rows: Vec<&FeatureRow> = table
            .rows
            .iter()
            .filter(|r| r.year > self.config.val_year_max)
            .collect();

        if train_rows.is_empty() || val_rows.is_empty() {
            return Err(ForecastError::DataError(format!(
                "Time split produced {} train and {} validation rows; check the year boundaries",
                train_rows.len(),
                val_rows.len()
            )));
        }

        info!(
            train = train_rows.len(),
            validation = val_rows.len(),
            test = test_rows.len(),
            features = columns.len(),
            "training split prepared"
        );

        // Imputation means come from the training split only
        let train_raw = raw_matrix(&train_rows, &columns);
        let means = column_means(&train_raw);

        let x_train = impute(train_raw, &means);
        let x_val = impute(raw_matrix(&val_rows, &columns), &means);
        let x_test = impute(raw_matrix(&test_rows, &columns), &means);

        let scaler = StandardScaler::fit(&x_train)?;
        let design = DesignMatrices {
            x_train_scaled: scaler.transform(&x_train)?,
            x_val_scaled: scaler.transform(&x_val)?,
            x_train,
            x_val,
            x_test,
        };

        let mut metrics = TrainingMetrics::new();

        let y_train: Vec<f64> = train_rows.iter().map(|r| r.delta_lc).collect();
        let y_val: Vec<f64> = val_rows.iter().map(|r| r.delta_lc).collect();
        let y_test: Vec<f64> = test_rows.iter().map(|r| r.delta_lc).collect();
        let lc_model =
            self.train_target(TARGET_LC, &design, &y_train, &y_val, &y_test, &mut metrics)?;

        let y_train: Vec<f64> = train_rows.iter().map(|r| r.delta_log_gen).collect();
        let y_val: Vec<f64> = val_rows.iter().map(|r| r.delta_log_gen).collect();
        let y_test: Vec<f64> = test_rows.iter().map(|r| r.delta_log_gen).collect();
        let gen_model =
            self.train_target(TARGET_GEN, &design, &y_train, &y_val, &y_test, &mut metrics)?;

        let manifest = FeatureManifest {
            feature_cols: columns,
            imputation_means: means,
            target_lc: TARGET_LC.to_string(),
            target_gen: TARGET_GEN.to_string(),
            train_year_max: self.config.train_year_max,
            val_year_max: self.config.val_year_max,
            test_year_min: self.config.test_year_min(),
            best_lc_model_type: lc_model.kind(),
            best_gen_model_type: gen_model.kind(),
            trained_at: Utc::now(),
        };

        Ok(TrainingOutcome {
            bundle: TrainedModelBundle {
                manifest,
                scaler,
                lc_model,
                gen_model,
            },
            metrics,
        })
    }

    /// Fit every candidate for one target and pick the serving model.
    ///
    /// Preference order: gradient-boosted when it trained successfully,
    /// otherwise the bagged-tree ensemble. The ridge candidate is scored
    /// for comparison.
    fn train_target(
        &self,
        target: &str,
        design: &DesignMatrices,
        y_train: &[f64],
        y_val: &[f64],
        y_test: &[f64],
        metrics: &mut TrainingMetrics,
    ) -> Result<Regressor> {
        let ridge = Regressor::fit_ridge(&design.x_train_scaled, y_train)?;
        let ridge_val = evaluate(&ridge, &design.x_val_scaled, y_val)?;
        info!(target_column = target, model = "ridge", %ridge_val, "validation score");
        metrics.insert(format!("ridge_{}_val", target), ridge_val);

        let forest = Regressor::fit_bagged_trees(&design.x_train, y_train)?;
        let forest_val = evaluate(&forest, &design.x_val, y_val)?;
        info!(target_column = target, model = "rf", %forest_val, "validation score");
        metrics.insert(format!("rf_{}_val", target), forest_val);
        if !design.x_test.is_empty() {
            metrics.insert(
                format!("rf_{}_test", target),
                evaluate(&forest, &design.x_test, y_test)?,
            );
        }

        #[cfg(feature = "gradient-boosting")]
        match Regressor::fit_gradient_boosted(&design.x_train, y_train) {
            Ok(boosted) => {
                let boosted_val = evaluate(&boosted, &design.x_val, y_val)?;
                info!(target_column = target, model = "gbdt", %boosted_val, "validation score");
                metrics.insert(format!("gbdt_{}_val", target), boosted_val);
                if !design.x_test.is_empty() {
                    metrics.insert(
                        format!("gbdt_{}_test", target),
                        evaluate(&boosted, &design.x_test, y_test)?,
                    );
                }
                info!(target_column = target, selected = %boosted.kind(), "model selected");
                return Ok(boosted);
            }
            Err(e) => {
                tracing::warn!(
                    target_column = target,
                    error = %e,
                    "gradient boosting failed; falling back to bagged trees"
                );
            }
        }

        info!(target_column = target, selected = %forest.kind(), "model selected");
        Ok(forest)
    }
}

fn raw_matrix(rows: &[&FeatureRow], columns: &[String]) -> Vec<Vec<Option<f64>>> {
    rows.iter()
        .map(|row| columns.iter().map(|c| row.feature_value(c)).collect())
        .collect()
}

/// Per-column mean over the present values; a column with no values at all
/// imputes to zero
fn column_means(matrix: &[Vec<Option<f64>>]) -> Vec<f64> {
    let width = matrix.first().map(|row| row.len()).unwrap_or(0);
    let mut means = vec![0.0; width];

    for (j, mean) in means.iter_mut().enumerate() {
        let mut sum = 0.0;
        let mut count = 0usize;
        for row in matrix {
            if let Some(value) = row[j] {
                sum += value;
                count += 1;
            }
        }
        if count > 0 {
            *mean = sum / count as f64;
        }
    }

    means
}

fn impute(matrix: Vec<Vec<Option<f64>>>, means: &[f64]) -> Vec<Vec<f64>> {
    matrix
        .into_iter()
        .map(|row| {
            row.into_iter()
                .enumerate()
                .map(|(j, value)| value.unwrap_or(means[j]))
                .collect()
        })
        .collect()
}

fn evaluate(model: &Regressor, x: &[Vec<f64>], y: &[f64]) -> Result<ModelScore> {
    let predictions = model.predict(x)?;
    ModelScore::from_predictions(y, &predictions)
}
