use energy_forecast::bundle::TrainedModelBundle;
use energy_forecast::config::ForecastConfig;
use energy_forecast::error::ForecastError;
use energy_forecast::features::{FeatureTable, PanelFeatureBuilder};
use energy_forecast::forecast::ForecastService;
use energy_forecast::models::ModelKind;
use energy_forecast::training::{ModelTrainer, TrainingOutcome};
use energy_forecast::PanelData;
use energy_panel::utils::{default_profiles, generate_test_panel};
use std::sync::Arc;

fn panel() -> PanelData {
    let records = generate_test_panel(&default_profiles(), 1990, 2024, 42).unwrap();
    PanelData::from_records(records).unwrap()
}

fn feature_table(config: &ForecastConfig) -> FeatureTable {
    PanelFeatureBuilder::new(config).build(&panel()).unwrap()
}

fn train(config: &ForecastConfig) -> TrainingOutcome {
    ModelTrainer::new(config.clone())
        .train(&feature_table(config))
        .unwrap()
}

#[cfg(not(feature = "gradient-boosting"))]
#[test]
fn test_selection_falls_back_to_bagged_trees() {
    let outcome = train(&ForecastConfig::default());

    // Without the boosted library both targets use the tree ensemble
    assert_eq!(
        outcome.bundle.manifest.best_lc_model_type,
        ModelKind::BaggedTrees
    );
    assert_eq!(
        outcome.bundle.manifest.best_gen_model_type,
        ModelKind::BaggedTrees
    );
}

#[cfg(feature = "gradient-boosting")]
#[test]
fn test_selection_prefers_gradient_boosted() {
    let outcome = train(&ForecastConfig::default());

    assert_eq!(
        outcome.bundle.manifest.best_lc_model_type,
        ModelKind::GradientBoosted
    );
    assert_eq!(
        outcome.bundle.manifest.best_gen_model_type,
        ModelKind::GradientBoosted
    );
}

#[test]
fn test_metrics_cover_all_candidates() {
    let outcome = train(&ForecastConfig::default());

    for key in [
        "ridge_delta_lc_val",
        "ridge_delta_log_gen_val",
        "rf_delta_lc_val",
        "rf_delta_log_gen_val",
        "rf_delta_lc_test",
        "rf_delta_log_gen_test",
    ] {
        let score = outcome
            .metrics
            .get(key)
            .unwrap_or_else(|| panic!("missing metrics key '{}'", key));
        assert!(score.mae.is_finite() && score.mae >= 0.0);
        assert!(score.rmse >= score.mae);
    }
}

#[test]
fn test_manifest_freezes_schema_and_split() {
    let config = ForecastConfig::default();
    let outcome = train(&config);
    let manifest = &outcome.bundle.manifest;

    assert_eq!(
        manifest.feature_cols,
        energy_forecast::features::feature_columns()
    );
    assert_eq!(manifest.imputation_means.len(), manifest.feature_cols.len());
    assert_eq!(manifest.train_year_max, config.train_year_max);
    assert_eq!(manifest.val_year_max, config.val_year_max);
    assert_eq!(manifest.test_year_min, config.val_year_max + 1);
    assert_eq!(manifest.target_lc, "delta_lc");
    assert_eq!(manifest.target_gen, "delta_log_gen");
}

#[test]
fn test_bundle_round_trip_preserves_forecasts() {
    let config = ForecastConfig::default();
    let outcome = train(&config);

    let dir = tempfile::tempdir().unwrap();
    outcome.bundle.save(dir.path()).unwrap();
    outcome.metrics.save(dir.path()).unwrap();

    let loaded = TrainedModelBundle::load(dir.path()).unwrap();
    assert_eq!(
        loaded.manifest.best_lc_model_type,
        outcome.bundle.manifest.best_lc_model_type
    );

    let source = panel();
    let before = ForecastService::new(Arc::new(outcome.bundle), source.clone(), &config)
        .predict_horizon("DEU", 5)
        .unwrap();
    let after = ForecastService::new(Arc::new(loaded), source, &config)
        .predict_horizon("DEU", 5)
        .unwrap();

    assert_eq!(before.forecasts, after.forecasts);
}

#[test]
fn test_training_is_deterministic() {
    let config = ForecastConfig::default();
    let first = train(&config);
    let second = train(&config);

    let source = panel();
    let a = ForecastService::new(Arc::new(first.bundle), source.clone(), &config)
        .predict_horizon("IND", 4)
        .unwrap();
    let b = ForecastService::new(Arc::new(second.bundle), source, &config)
        .predict_horizon("IND", 4)
        .unwrap();

    assert_eq!(a.forecasts, b.forecasts);
}

#[test]
fn test_loading_missing_bundle_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let result = TrainedModelBundle::load(dir.path());
    assert!(matches!(result, Err(ForecastError::ArtifactNotFound(_))));
}

#[test]
fn test_empty_split_is_rejected() {
    let mut config = ForecastConfig::default();
    // Boundaries far in the past leave the training split empty
    config.train_year_max = 1900;
    config.val_year_max = 1901;

    let table = feature_table(&ForecastConfig::default());
    let result = ModelTrainer::new(config).train(&table);
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}
