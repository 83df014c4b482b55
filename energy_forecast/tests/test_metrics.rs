use assert_approx_eq::assert_approx_eq;
use energy_forecast::metrics::{
    mean_absolute_error, root_mean_squared_error, ModelScore, TrainingMetrics,
};
use pretty_assertions::assert_eq;

#[test]
fn test_error_metrics_on_known_values() {
    let actual = vec![10.0, 20.0, 30.0, 40.0];
    let predicted = vec![12.0, 18.0, 30.0, 44.0];

    assert_approx_eq!(mean_absolute_error(&actual, &predicted).unwrap(), 2.0);
    assert_approx_eq!(
        root_mean_squared_error(&actual, &predicted).unwrap(),
        (24.0f64 / 4.0).sqrt()
    );
}

#[test]
fn test_perfect_prediction_scores_zero() {
    let values = vec![1.5, -2.5, 0.0];
    let score = ModelScore::from_predictions(&values, &values).unwrap();
    assert_eq!(score.mae, 0.0);
    assert_eq!(score.rmse, 0.0);
}

#[test]
fn test_report_insert_get_and_display() {
    let mut metrics = TrainingMetrics::new();
    metrics.insert("rf_delta_lc_val", ModelScore { mae: 0.5, rmse: 0.8 });
    metrics.insert(
        "ridge_delta_lc_val",
        ModelScore {
            mae: 0.9,
            rmse: 1.4,
        },
    );

    assert_eq!(metrics.len(), 2);
    assert_approx_eq!(metrics.get("rf_delta_lc_val").unwrap().mae, 0.5);

    let rendered = format!("{}", metrics);
    assert!(rendered.contains("rf_delta_lc_val"));
    assert!(rendered.contains("MAE 0.5000"));
}

#[test]
fn test_report_round_trips_through_disk() {
    let mut metrics = TrainingMetrics::new();
    metrics.insert(
        "gbdt_delta_log_gen_test",
        ModelScore {
            mae: 0.012,
            rmse: 0.034,
        },
    );

    let dir = tempfile::tempdir().unwrap();
    metrics.save(dir.path()).unwrap();

    let loaded = TrainingMetrics::load(dir.path()).unwrap().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_approx_eq!(loaded.get("gbdt_delta_log_gen_test").unwrap().rmse, 0.034);
}

#[test]
fn test_missing_report_is_none_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = TrainingMetrics::load(dir.path()).unwrap();
    assert!(loaded.is_none());
}
