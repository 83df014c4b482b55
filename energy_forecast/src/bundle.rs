//! Persisted model bundle: manifest, scaler and per-target models
//!
//! A training run writes independently named artifacts into one directory;
//! serving loads them once at startup and treats them as immutable for the
//! process lifetime.

use crate::error::{ForecastError, Result};
use crate::features::feature_columns;
use crate::models::{ModelKind, Regressor, StandardScaler};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File the feature manifest is persisted under
pub const MANIFEST_FILE: &str = "feature_manifest.json";
/// File the fitted scaler is persisted under
pub const SCALER_FILE: &str = "scaler.json";

/// The frozen schema of a training run.
///
/// Inference must reproduce `feature_cols` bit-for-bit; the imputation
/// means are aligned with that column order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureManifest {
    /// Ordered model feature columns
    pub feature_cols: Vec<String>,
    /// Per-column training-set means used for imputation
    pub imputation_means: Vec<f64>,
    /// Name of the low-carbon delta target
    pub target_lc: String,
    /// Name of the log-generation delta target
    pub target_gen: String,
    /// Last training year
    pub train_year_max: i32,
    /// Last validation year
    pub val_year_max: i32,
    /// First test year
    pub test_year_min: i32,
    /// Selected model family for the low-carbon target
    pub best_lc_model_type: ModelKind,
    /// Selected model family for the generation target
    pub best_gen_model_type: ModelKind,
    /// When the bundle was trained
    pub trained_at: DateTime<Utc>,
}

/// A complete, reusable training artifact set
#[derive(Debug)]
pub struct TrainedModelBundle {
    pub manifest: FeatureManifest,
    pub scaler: StandardScaler,
    pub lc_model: Regressor,
    pub gen_model: Regressor,
}

impl TrainedModelBundle {
    /// Artifact file name of the low-carbon model for a given family
    pub fn lc_model_file(kind: ModelKind) -> String {
        format!("{}_lc_model.json", kind.short_name())
    }

    /// Artifact file name of the generation model for a given family
    pub fn gen_model_file(kind: ModelKind) -> String {
        format!("{}_gen_model.json", kind.short_name())
    }

    /// Write every artifact into `dir`, creating it if needed
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        write_artifact(&dir.join(MANIFEST_FILE), &self.manifest)?;
        write_artifact(&dir.join(SCALER_FILE), &self.scaler)?;
        write_artifact(
            &dir.join(Self::lc_model_file(self.manifest.best_lc_model_type)),
            &self.lc_model,
        )?;
        write_artifact(
            &dir.join(Self::gen_model_file(self.manifest.best_gen_model_type)),
            &self.gen_model,
        )?;

        Ok(())
    }

    /// Load a bundle from `dir`, verifying its schema against this build.
    ///
    /// A missing artifact yields [`ForecastError::ArtifactNotFound`]; a
    /// manifest whose column list differs from [`feature_columns`] is
    /// rejected before any model is deserialized.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();

        let manifest: FeatureManifest = read_artifact(&dir.join(MANIFEST_FILE))?;

        let expected = feature_columns();
        if manifest.feature_cols != expected {
            return Err(ForecastError::DataError(format!(
                "Persisted manifest lists {} feature columns but this build expects {}; \
                 retrain before serving",
                manifest.feature_cols.len(),
                expected.len()
            )));
        }
        if manifest.imputation_means.len() != expected.len() {
            return Err(ForecastError::DataError(
                "Imputation means do not align with the feature columns".to_string(),
            ));
        }

        #[cfg(not(feature = "gradient-boosting"))]
        if manifest.best_lc_model_type == ModelKind::GradientBoosted
            || manifest.best_gen_model_type == ModelKind::GradientBoosted
        {
            return Err(ForecastError::DataError(
                "Bundle was trained with the gradient-boosting feature enabled; \
                 this build cannot load it"
                    .to_string(),
            ));
        }

        let scaler: StandardScaler = read_artifact(&dir.join(SCALER_FILE))?;
        let lc_model: Regressor =
            read_artifact(&dir.join(Self::lc_model_file(manifest.best_lc_model_type)))?;
        let gen_model: Regressor =
            read_artifact(&dir.join(Self::gen_model_file(manifest.best_gen_model_type)))?;

        Ok(Self {
            manifest,
            scaler,
            lc_model,
            gen_model,
        })
    }
}

/// Serialize a value as JSON, writing to a temp file first and renaming so
/// a serving process never observes a half-written artifact.
pub(crate) fn write_artifact<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;

    let mut tmp = path.to_path_buf();
    tmp.set_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;

    Ok(())
}

/// Deserialize a JSON artifact, mapping absence to a structured not-found
pub(crate) fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(ForecastError::ArtifactNotFound(
            path.display().to_string(),
        ));
    }

    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
