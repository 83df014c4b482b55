use assert_approx_eq::assert_approx_eq;
use energy_forecast::config::ForecastConfig;
use energy_forecast::error::ForecastError;
use energy_forecast::features::PanelFeatureBuilder;
use energy_forecast::forecast::{ForecastService, RecursiveForecaster};
use energy_forecast::training::ModelTrainer;
use energy_forecast::{PanelData, TrainedModelBundle};
use energy_panel::CountryYearRecord;
use rstest::rstest;
use std::sync::Arc;

fn record(iso3: &str, year: i32, low_carbon_pct: f64, generation: f64) -> CountryYearRecord {
    let low_carbon_twh = generation * low_carbon_pct / 100.0;
    CountryYearRecord {
        iso3: iso3.to_string(),
        year,
        electricity_generation_twh: generation,
        coal_twh: generation - low_carbon_twh,
        oil_twh: 0.0,
        gas_twh: 0.0,
        nuclear_twh: 0.0,
        hydro_twh: low_carbon_twh * 0.6,
        solar_twh: low_carbon_twh * 0.15,
        wind_twh: low_carbon_twh * 0.25,
        other_renewables_twh: 0.0,
        low_carbon_share_pct: low_carbon_pct,
        fossil_share_pct: 100.0 - low_carbon_pct,
        population_millions: Some(25.0),
        gdp_billions_usd: Some(800.0),
    }
}

/// A panel where every country's low-carbon share moves by exactly
/// `lc_step` per year and generation grows by the factor `gen_growth`.
/// With constant targets every trained model predicts those constants,
/// which makes the recursive reconstruction exactly checkable.
fn constant_delta_panel(
    years: std::ops::RangeInclusive<i32>,
    lc_start: f64,
    lc_step: f64,
    gen_growth: f64,
) -> PanelData {
    let start = *years.start();
    let mut records = Vec::new();
    for (iso3, lc_offset, gen_base) in
        [("ABC", 0.0, 100.0), ("DEF", 5.0, 250.0), ("GHI", 12.0, 40.0)]
    {
        for year in years.clone() {
            let t = (year - start) as f64;
            records.push(record(
                iso3,
                year,
                lc_start + lc_offset + lc_step * t,
                gen_base * gen_growth.powf(t),
            ));
        }
    }
    PanelData::from_records(records).unwrap()
}

fn trained_bundle(panel: &PanelData, config: &ForecastConfig) -> TrainedModelBundle {
    let table = PanelFeatureBuilder::new(config).build(panel).unwrap();
    ModelTrainer::new(config.clone()).train(&table).unwrap().bundle
}

fn rising_service(config: &ForecastConfig) -> ForecastService<PanelData> {
    // delta_lc = +2.0 per year, delta_log_gen = ln(1.05)
    let panel = constant_delta_panel(2000..=2020, 0.0, 2.0, 1.05);
    let bundle = trained_bundle(&panel, config);
    ForecastService::new(Arc::new(bundle), panel, config)
}

/// Seed ending 2020 at low-carbon 40.0 % and 100 TWh, consistent with the
/// +2 % / +5 % per-year trajectory the models were trained on
fn example_seed() -> Vec<CountryYearRecord> {
    vec![
        record("ABC", 2018, 36.0, 100.0 / (1.05 * 1.05)),
        record("ABC", 2019, 38.0, 100.0 / 1.05),
        record("ABC", 2020, 40.0, 100.0),
    ]
}

#[test]
fn test_known_deltas_reconstruct_example_point() {
    let config = ForecastConfig::default();
    let panel = constant_delta_panel(2000..=2020, 0.0, 2.0, 1.05);
    let bundle = trained_bundle(&panel, &config);
    let forecaster = RecursiveForecaster::new(Arc::new(bundle), &config);

    // delta_lc predicts +2.0 and delta_log_gen predicts ln(1.05), so one
    // step ahead of (40.0 %, 100 TWh) must land on (42.0 %, 105 TWh)
    let points = forecaster.forecast(&example_seed(), 1).unwrap();

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].year, 2021);
    assert_approx_eq!(points[0].low_carbon_share_pct, 42.0, 1e-6);
    assert_approx_eq!(points[0].electricity_generation_twh, 105.0, 1e-6);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(5)]
#[case(10)]
fn test_forecast_length_and_contiguous_years(#[case] horizon: usize) {
    let config = ForecastConfig::default();
    let service = rising_service(&config);

    let forecast = service.predict_horizon("DEF", horizon).unwrap();
    assert_eq!(forecast.forecasts.len(), horizon);

    for (i, point) in forecast.forecasts.iter().enumerate() {
        assert_eq!(point.year, 2021 + i as i32);
    }
}

#[test]
fn test_recursive_steps_compound_the_deltas() {
    let config = ForecastConfig::default();
    let panel = constant_delta_panel(2000..=2020, 0.0, 2.0, 1.05);
    let bundle = trained_bundle(&panel, &config);
    let forecaster = RecursiveForecaster::new(Arc::new(bundle), &config);

    let points = forecaster.forecast(&example_seed(), 5).unwrap();

    // Later steps lag against synthesized points, yet the constant-target
    // models keep stepping by +2 % and +5 % per year
    for (i, point) in points.iter().enumerate() {
        let k = (i + 1) as f64;
        assert_approx_eq!(point.low_carbon_share_pct, 40.0 + 2.0 * k, 1e-6);
        assert_approx_eq!(
            point.electricity_generation_twh,
            100.0 * 1.05f64.powf(k),
            1e-4
        );
    }
}

#[test]
fn test_share_is_clamped_at_the_upper_bound() {
    let config = ForecastConfig::default();
    let panel = constant_delta_panel(2000..=2020, 0.0, 2.0, 1.05);
    let bundle = trained_bundle(&panel, &config);
    let forecaster = RecursiveForecaster::new(Arc::new(bundle), &config);

    // Seed near the ceiling; an unclamped +2 would overshoot 100
    let history = vec![
        record("XYZ", 2018, 95.5, 90.0),
        record("XYZ", 2019, 97.5, 95.0),
        record("XYZ", 2020, 99.5, 100.0),
    ];

    let points = forecaster.forecast(&history, 3).unwrap();
    assert_approx_eq!(points[0].low_carbon_share_pct, 100.0, 1e-9);
    for point in &points {
        assert!(point.low_carbon_share_pct <= 100.0);
        assert!(point.low_carbon_share_pct >= 0.0);
    }
}

#[test]
fn test_share_is_clamped_at_the_lower_bound() {
    let config = ForecastConfig::default();
    // delta_lc = -5.0 per year, mild generation decline
    let panel = constant_delta_panel(2004..=2018, 80.0, -5.0, 0.99);
    let bundle = trained_bundle(&panel, &config);
    let forecaster = RecursiveForecaster::new(Arc::new(bundle), &config);

    let history = vec![
        record("XYZ", 2016, 13.0, 80.0),
        record("XYZ", 2017, 8.0, 79.0),
        record("XYZ", 2018, 3.0, 78.0),
    ];

    let points = forecaster.forecast(&history, 4).unwrap();
    assert_approx_eq!(points[0].low_carbon_share_pct, 0.0, 1e-9);
    for point in &points {
        assert!(point.low_carbon_share_pct >= 0.0);
        assert!(point.electricity_generation_twh > 0.0);
    }
}

#[test]
fn test_same_request_twice_is_identical() {
    let config = ForecastConfig::default();
    let service = rising_service(&config);

    let first = service.predict_horizon("GHI", 7).unwrap();
    let second = service.predict_horizon("GHI", 7).unwrap();

    assert_eq!(first.forecasts, second.forecasts);
}

#[test]
fn test_unknown_country_is_invalid_input() {
    let config = ForecastConfig::default();
    let service = rising_service(&config);

    let result = service.predict_horizon("ZZZ", 5);
    assert!(matches!(result, Err(ForecastError::InvalidInput(_))));
}

#[rstest]
#[case(0)]
#[case(11)]
#[case(100)]
fn test_out_of_range_horizon_is_invalid_input(#[case] horizon: usize) {
    let config = ForecastConfig::default();
    let service = rising_service(&config);

    let result = service.predict_horizon("ABC", horizon);
    assert!(matches!(result, Err(ForecastError::InvalidInput(_))));
}

#[test]
fn test_default_horizon_is_five() {
    let config = ForecastConfig::default();
    let service = rising_service(&config);

    let forecast = service.predict_default("ABC").unwrap();
    assert_eq!(forecast.forecasts.len(), 5);
}

#[test]
fn test_insufficient_history_is_invalid_input() {
    let config = ForecastConfig::default();
    let panel = constant_delta_panel(2000..=2020, 0.0, 2.0, 1.05);
    let bundle = trained_bundle(&panel, &config);
    let forecaster = RecursiveForecaster::new(Arc::new(bundle), &config);

    // Too few years
    let short = vec![
        record("XYZ", 2019, 38.0, 95.0),
        record("XYZ", 2020, 40.0, 100.0),
    ];
    assert!(matches!(
        forecaster.forecast(&short, 1),
        Err(ForecastError::InvalidInput(_))
    ));

    // Enough rows, but a gap right before the last known year
    let gapped = vec![
        record("XYZ", 2016, 32.0, 85.0),
        record("XYZ", 2017, 34.0, 88.0),
        record("XYZ", 2019, 38.0, 95.0),
        record("XYZ", 2020, 40.0, 100.0),
    ];
    assert!(matches!(
        forecaster.forecast(&gapped, 1),
        Err(ForecastError::InvalidInput(_))
    ));
}
