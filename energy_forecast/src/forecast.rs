//! Recursive multi-year forecasting from a trained bundle
//!
//! Each request owns a growing history buffer seeded with the country's
//! known records. Every step rebuilds the frozen feature vector for the
//! next year, predicts the two deltas, reconstructs absolute levels and
//! appends the result as a synthetic history point, so later steps lag
//! against forecasted values exactly as they would against real ones.

use crate::bundle::TrainedModelBundle;
use crate::config::ForecastConfig;
use crate::data::HistorySource;
use crate::error::{ForecastError, Result};
use crate::features::{LagIndicator, LAG_DEPTHS};
use energy_panel::CountryYearRecord;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

/// Years of trailing contiguous history needed to seed a lag-3 vector
const MIN_SEED_YEARS: usize = 3;

/// One reconstructed absolute-level prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub year: i32,
    pub low_carbon_share_pct: f64,
    pub electricity_generation_twh: f64,
}

/// An ordered forecast trajectory for one country
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryForecast {
    pub iso3: String,
    pub forecasts: Vec<ForecastPoint>,
}

/// What the next-year feature vector can take from one manifest column
enum ColumnRole {
    /// Observed only on real records; structurally missing for forecast years
    CurrentYear,
    Lag { indicator: LagIndicator, depth: usize },
}

/// One entry of the request-local history buffer
#[derive(Debug, Clone)]
struct HistoryPoint {
    year: i32,
    low_carbon_share_pct: f64,
    electricity_generation_twh: f64,
    /// The real record, absent for synthesized points
    observed: Option<CountryYearRecord>,
}

impl HistoryPoint {
    fn indicator_value(&self, indicator: LagIndicator, eps: f64) -> Option<f64> {
        if let Some(record) = &self.observed {
            return Some(indicator.value_from_record(record, eps));
        }
        // Synthetic points only carry the two reconstructed levels
        match indicator {
            LagIndicator::LowCarbonSharePct => Some(self.low_carbon_share_pct),
            LagIndicator::GenerationTwh => Some(self.electricity_generation_twh),
            _ => None,
        }
    }
}

/// Turns one-step delta predictions into a multi-year trajectory
pub struct RecursiveForecaster {
    bundle: Arc<TrainedModelBundle>,
    roles: Vec<ColumnRole>,
    share_epsilon: f64,
    log_floor: f64,
    max_horizon: usize,
}

impl RecursiveForecaster {
    pub fn new(bundle: Arc<TrainedModelBundle>, config: &ForecastConfig) -> Self {
        let roles = bundle
            .manifest
            .feature_cols
            .iter()
            .map(|column| parse_role(column))
            .collect();

        Self {
            bundle,
            roles,
            share_epsilon: config.share_epsilon,
            log_floor: config.log_floor,
            max_horizon: config.max_horizon,
        }
    }

    /// Forecast `horizon` years past the end of `history`.
    ///
    /// The output has exactly `horizon` points with contiguous years
    /// starting the year after the last known record.
    pub fn forecast(
        &self,
        history: &[CountryYearRecord],
        horizon: usize,
    ) -> Result<Vec<ForecastPoint>> {
        if horizon < 1 || horizon > self.max_horizon {
            return Err(ForecastError::InvalidInput(format!(
                "Horizon must be between 1 and {}, got {}",
                self.max_horizon, horizon
            )));
        }

        let mut buffer = self.seed_buffer(history)?;
        let mut points = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            let next = self.step(&buffer)?;
            buffer.push_back(HistoryPoint {
                year: next.year,
                low_carbon_share_pct: next.low_carbon_share_pct,
                electricity_generation_twh: next.electricity_generation_twh,
                observed: None,
            });
            points.push(next);
        }

        Ok(points)
    }

    /// Validate the seed history and build the request-local buffer
    fn seed_buffer(&self, history: &[CountryYearRecord]) -> Result<VecDeque<HistoryPoint>> {
        if history.len() < MIN_SEED_YEARS {
            return Err(ForecastError::InvalidInput(format!(
                "Insufficient history: need at least {} years, got {}",
                MIN_SEED_YEARS,
                history.len()
            )));
        }

        let mut records: Vec<&CountryYearRecord> = history.iter().collect();
        records.sort_by_key(|r| r.year);

        // A lag-3 vector for the next year needs the last three years intact
        let tail = &records[records.len() - MIN_SEED_YEARS..];
        for pair in tail.windows(2) {
            if pair[1].year != pair[0].year + 1 {
                return Err(ForecastError::InvalidInput(format!(
                    "Insufficient history: gap between years {} and {}",
                    pair[0].year, pair[1].year
                )));
            }
        }

        Ok(records
            .iter()
            .map(|record| HistoryPoint {
                year: record.year,
                low_carbon_share_pct: record.low_carbon_share_pct,
                electricity_generation_twh: record.electricity_generation_twh,
                observed: Some((*record).clone()),
            })
            .collect())
    }

    /// Predict one year ahead of the buffer and reconstruct levels
    fn step(&self, buffer: &VecDeque<HistoryPoint>) -> Result<ForecastPoint> {
        let last = buffer
            .back()
            .ok_or_else(|| ForecastError::ForecastingError("Empty history buffer".to_string()))?;
        let next_year = last.year + 1;

        let features = self.next_year_features(buffer, next_year);

        let delta_lc = self.predict_target(&self.bundle.lc_model, &features)?;
        let delta_log_gen = self.predict_target(&self.bundle.gen_model, &features)?;

        let low_carbon_share_pct = (last.low_carbon_share_pct + delta_lc).clamp(0.0, 100.0);
        let log_gen = last.electricity_generation_twh.max(self.log_floor).ln();
        let electricity_generation_twh = (log_gen + delta_log_gen).exp();

        if !electricity_generation_twh.is_finite() {
            return Err(ForecastError::ForecastingError(format!(
                "Generation forecast for year {} is not finite",
                next_year
            )));
        }

        debug!(
            year = next_year,
            delta_lc,
            delta_log_gen,
            "reconstructed forecast step"
        );

        Ok(ForecastPoint {
            year: next_year,
            low_carbon_share_pct,
            electricity_generation_twh,
        })
    }

    /// Build the frozen-order feature vector for `next_year`, imputing every
    /// structurally missing slot with the stored training means
    fn next_year_features(&self, buffer: &VecDeque<HistoryPoint>, next_year: i32) -> Vec<f64> {
        self.roles
            .iter()
            .enumerate()
            .map(|(j, role)| {
                let value = match role {
                    ColumnRole::CurrentYear => None,
                    ColumnRole::Lag { indicator, depth } => {
                        let lag_year = next_year - *depth as i32;
                        buffer
                            .iter()
                            .rev()
                            .find(|point| point.year == lag_year)
                            .and_then(|point| {
                                point.indicator_value(*indicator, self.share_epsilon)
                            })
                    }
                };
                value.unwrap_or(self.bundle.manifest.imputation_means[j])
            })
            .collect()
    }

    /// Route the feature vector through the scaler only for the
    /// scale-sensitive model path
    fn predict_target(&self, model: &crate::models::Regressor, features: &[f64]) -> Result<f64> {
        if model.requires_scaling() {
            let scaled = self.bundle.scaler.transform_row(features)?;
            model.predict_one(&scaled)
        } else {
            model.predict_one(features)
        }
    }
}

fn parse_role(column: &str) -> ColumnRole {
    for indicator in LagIndicator::ALL {
        for depth in LAG_DEPTHS {
            if column == format!("{}_lag{}", indicator.column_name(), depth) {
                return ColumnRole::Lag { indicator, depth };
            }
        }
    }
    ColumnRole::CurrentYear
}

/// Serves forecast requests against one immutable bundle.
///
/// The bundle is shared read-only across requests; each request's buffer
/// lives inside [`RecursiveForecaster::forecast`] and is discarded with the
/// response.
pub struct ForecastService<S: HistorySource> {
    forecaster: RecursiveForecaster,
    source: S,
    default_horizon: usize,
}

impl<S: HistorySource> ForecastService<S> {
    pub fn new(bundle: Arc<TrainedModelBundle>, source: S, config: &ForecastConfig) -> Self {
        Self {
            forecaster: RecursiveForecaster::new(bundle, config),
            source,
            default_horizon: config.default_horizon,
        }
    }

    /// Forecast a country over the default horizon
    pub fn predict_default(&self, iso3: &str) -> Result<CountryForecast> {
        self.predict_horizon(iso3, self.default_horizon)
    }

    /// Forecast a country `horizon` years ahead.
    ///
    /// Unknown countries and out-of-range horizons are rejected as invalid
    /// input; they never take down the serving process.
    pub fn predict_horizon(&self, iso3: &str, horizon: usize) -> Result<CountryForecast> {
        let history = self.source.history(iso3)?;
        if history.is_empty() {
            return Err(ForecastError::InvalidInput(format!(
                "Unknown country code '{}'",
                iso3
            )));
        }

        let forecasts = self.forecaster.forecast(&history, horizon)?;

        info!(
            iso3,
            horizon,
            last_known_year = history.iter().map(|r| r.year).max().unwrap_or_default(),
            "forecast generated"
        );

        Ok(CountryForecast {
            iso3: iso3.to_string(),
            forecasts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_role_recognizes_lag_columns() {
        assert!(matches!(
            parse_role("low_carbon_share_pct_lag3"),
            ColumnRole::Lag {
                indicator: LagIndicator::LowCarbonSharePct,
                depth: 3
            }
        ));
        assert!(matches!(parse_role("coal_twh"), ColumnRole::CurrentYear));
        assert!(matches!(
            parse_role("solar_share"),
            ColumnRole::CurrentYear
        ));
    }
}
