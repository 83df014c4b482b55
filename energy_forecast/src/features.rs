//! Feature engineering for the supervised forecasting table
//!
//! Turns the raw per-country-year panel into lag-complete feature rows:
//! per-source share fractions, one-to-three-year lags of five indicator
//! columns, and the two delta targets (`delta_lc`, `delta_log_gen`).
//!
//! Lag lookups are year-based: the lag-d value of an indicator at year y is
//! its value at year (y - d), and is missing when that year has no record.
//! The same rule drives both training-table construction and the synthetic
//! feature vectors built during recursive inference, which is what keeps
//! the two temporally consistent.

use crate::config::ForecastConfig;
use crate::data::PanelData;
use crate::error::{ForecastError, Result};
use energy_panel::{CountryYearRecord, EnergySource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Lag depths attached to every designated indicator column
pub const LAG_DEPTHS: [usize; 3] = [1, 2, 3];

/// Name of the low-carbon delta target column
pub const TARGET_LC: &str = "delta_lc";
/// Name of the log-generation delta target column
pub const TARGET_GEN: &str = "delta_log_gen";

/// The five indicator columns that receive lag features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LagIndicator {
    LowCarbonSharePct,
    GenerationTwh,
    SolarShare,
    WindShare,
    FossilSharePct,
}

impl LagIndicator {
    pub const ALL: [LagIndicator; 5] = [
        LagIndicator::LowCarbonSharePct,
        LagIndicator::GenerationTwh,
        LagIndicator::SolarShare,
        LagIndicator::WindShare,
        LagIndicator::FossilSharePct,
    ];

    /// Column stem the lag features are named after
    pub fn column_name(&self) -> &'static str {
        match self {
            LagIndicator::LowCarbonSharePct => "low_carbon_share_pct",
            LagIndicator::GenerationTwh => "electricity_generation_twh",
            LagIndicator::SolarShare => "solar_share",
            LagIndicator::WindShare => "wind_share",
            LagIndicator::FossilSharePct => "fossil_share_pct",
        }
    }

    /// Indicator value as observed on a panel record
    pub fn value_from_record(&self, record: &CountryYearRecord, eps: f64) -> f64 {
        match self {
            LagIndicator::LowCarbonSharePct => record.low_carbon_share_pct,
            LagIndicator::GenerationTwh => record.electricity_generation_twh,
            LagIndicator::SolarShare => record.share_fraction(EnergySource::Solar, eps),
            LagIndicator::WindShare => record.share_fraction(EnergySource::Wind, eps),
            LagIndicator::FossilSharePct => record.fossil_share_pct,
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|i| i == self).unwrap_or(0)
    }
}

/// The frozen, ordered list of model feature columns.
///
/// Training freezes this order into the bundle manifest and inference must
/// reproduce it exactly; both sides call this single definition.
pub fn feature_columns() -> Vec<String> {
    let mut columns = vec![
        "population_millions".to_string(),
        "gdp_billions_usd".to_string(),
    ];
    for source in EnergySource::ALL {
        columns.push(format!("{}_twh", source.column_stem()));
    }
    columns.push("fossil_share_pct".to_string());
    for source in EnergySource::ALL {
        columns.push(format!("{}_share", source.column_stem()));
    }
    for indicator in LagIndicator::ALL {
        for depth in LAG_DEPTHS {
            columns.push(format!("{}_lag{}", indicator.column_name(), depth));
        }
    }
    columns
}

/// One lag-complete supervised row: engineered features plus delta targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRow {
    pub iso3: String,
    pub year: i32,
    pub population_millions: Option<f64>,
    pub gdp_billions_usd: Option<f64>,
    /// Per-source generation in TWh, ordered as [`EnergySource::ALL`]
    pub source_twh: [f64; 8],
    /// Per-source share fractions, ordered as [`EnergySource::ALL`]
    pub source_share: [f64; 8],
    pub low_carbon_share_pct: f64,
    pub fossil_share_pct: f64,
    pub electricity_generation_twh: f64,
    /// Lag values indexed by [`LagIndicator::ALL`] x depth-1; missing when
    /// the lagged year has no record
    pub lags: [[Option<f64>; 3]; 5],
    /// Natural log of floor-clamped total generation (helper, not a feature)
    pub log_gen: f64,
    /// Year-over-year change of the low-carbon share (target)
    pub delta_lc: f64,
    /// Year-over-year change of log generation (target)
    pub delta_log_gen: f64,
}

impl FeatureRow {
    /// Lag value of an indicator at the given depth (1 to 3)
    pub fn lag(&self, indicator: LagIndicator, depth: usize) -> Option<f64> {
        if !(1..=3).contains(&depth) {
            return None;
        }
        self.lags[indicator.index()][depth - 1]
    }

    /// Resolve a manifest column name against this row.
    ///
    /// Returns `None` for values that are missing (unknown covariates, lags
    /// without a record) as well as for names outside the manifest.
    pub fn feature_value(&self, column: &str) -> Option<f64> {
        match column {
            "population_millions" => return self.population_millions,
            "gdp_billions_usd" => return self.gdp_billions_usd,
            "fossil_share_pct" => return Some(self.fossil_share_pct),
            _ => {}
        }

        for indicator in LagIndicator::ALL {
            for depth in LAG_DEPTHS {
                if column == format!("{}_lag{}", indicator.column_name(), depth) {
                    return self.lag(indicator, depth);
                }
            }
        }

        for (i, source) in EnergySource::ALL.iter().enumerate() {
            if column == format!("{}_twh", source.column_stem()) {
                return Some(self.source_twh[i]);
            }
            if column == format!("{}_share", source.column_stem()) {
                return Some(self.source_share[i]);
            }
        }

        None
    }
}

/// Builds lag-complete feature rows from raw panel history
#[derive(Debug, Clone)]
pub struct PanelFeatureBuilder {
    share_epsilon: f64,
    log_floor: f64,
    min_year: i32,
}

impl PanelFeatureBuilder {
    pub fn new(config: &ForecastConfig) -> Self {
        Self {
            share_epsilon: config.share_epsilon,
            log_floor: config.log_floor,
            min_year: config.min_year,
        }
    }

    /// Build the feature table for an entire panel
    pub fn build(&self, panel: &PanelData) -> Result<FeatureTable> {
        let mut rows = Vec::new();
        for (_, history) in panel.iter() {
            rows.extend(self.build_country(history)?);
        }
        Ok(FeatureTable { rows })
    }

    /// Build feature rows for one country's time-ordered history.
    ///
    /// Rows that fail the completeness filter (missing deepest lag or either
    /// delta) or fall before the configured year floor are dropped.
    pub fn build_country(&self, history: &[CountryYearRecord]) -> Result<Vec<FeatureRow>> {
        if history.is_empty() {
            return Ok(Vec::new());
        }

        let iso3 = &history[0].iso3;
        if history.iter().any(|r| r.iso3 != *iso3) {
            return Err(ForecastError::DataError(
                "Feature builder received records from more than one country".to_string(),
            ));
        }

        let by_year: BTreeMap<i32, &CountryYearRecord> =
            history.iter().map(|r| (r.year, r)).collect();
        if by_year.len() != history.len() {
            return Err(ForecastError::DataError(format!(
                "Duplicate years in history for {}",
                iso3
            )));
        }

        let mut rows = Vec::with_capacity(history.len());

        for record in history {
            let previous = by_year.get(&(record.year - 1));

            let log_gen = record.electricity_generation_twh.max(self.log_floor).ln();
            let delta_lc =
                previous.map(|p| record.low_carbon_share_pct - p.low_carbon_share_pct);
            let delta_log_gen = previous
                .map(|p| log_gen - p.electricity_generation_twh.max(self.log_floor).ln());

            let mut lags = [[None; 3]; 5];
            for (i, indicator) in LagIndicator::ALL.iter().enumerate() {
                for (d, depth) in LAG_DEPTHS.iter().enumerate() {
                    lags[i][d] = by_year
                        .get(&(record.year - *depth as i32))
                        .map(|r| indicator.value_from_record(r, self.share_epsilon));
                }
            }

            // Completeness filter: deepest low-carbon lag and both deltas
            let deepest_lag = lags[LagIndicator::LowCarbonSharePct.index()][2];
            let (delta_lc, delta_log_gen) = match (deepest_lag, delta_lc, delta_log_gen) {
                (Some(_), Some(lc), Some(gen)) => (lc, gen),
                _ => continue,
            };

            if record.year < self.min_year {
                continue;
            }

            let mut source_twh = [0.0; 8];
            let mut source_share = [0.0; 8];
            for (i, source) in EnergySource::ALL.iter().enumerate() {
                source_twh[i] = record.generation(*source);
                source_share[i] = record.share_fraction(*source, self.share_epsilon);
            }

            rows.push(FeatureRow {
                iso3: record.iso3.clone(),
                year: record.year,
                population_millions: record.population_millions,
                gdp_billions_usd: record.gdp_billions_usd,
                source_twh,
                source_share,
                low_carbon_share_pct: record.low_carbon_share_pct,
                fossil_share_pct: record.fossil_share_pct,
                electricity_generation_twh: record.electricity_generation_twh,
                lags,
                log_gen,
                delta_lc,
                delta_log_gen,
            });
        }

        Ok(rows)
    }
}

/// The engineered feature table: one row per (country, year) that survived
/// the completeness filter
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of distinct countries in the table
    pub fn country_count(&self) -> usize {
        let mut countries: Vec<&str> = self.rows.iter().map(|r| r.iso3.as_str()).collect();
        countries.sort_unstable();
        countries.dedup();
        countries.len()
    }

    /// Export the table as CSV: identifiers, manifest features, then the
    /// log helper and both targets. Missing values become empty fields.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let columns = feature_columns();
        let mut writer = csv::Writer::from_path(path)?;

        let mut header = vec!["iso3".to_string(), "year".to_string()];
        header.extend(columns.iter().cloned());
        header.push("log_gen".to_string());
        header.push(TARGET_LC.to_string());
        header.push(TARGET_GEN.to_string());
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![row.iso3.clone(), row.year.to_string()];
            for column in &columns {
                record.push(
                    row.feature_value(column)
                        .map(|v| v.to_string())
                        .unwrap_or_default(),
                );
            }
            record.push(row.log_gen.to_string());
            record.push(row.delta_lc.to_string());
            record.push(row.delta_log_gen.to_string());
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_has_expected_width() {
        let columns = feature_columns();
        assert_eq!(columns.len(), 34);
        assert_eq!(columns[0], "population_millions");
        assert!(columns.contains(&"low_carbon_share_pct_lag3".to_string()));
        assert!(columns.contains(&"other_renewables_share".to_string()));
    }

    #[test]
    fn manifest_names_are_unique() {
        let mut columns = feature_columns();
        columns.sort();
        let before = columns.len();
        columns.dedup();
        assert_eq!(columns.len(), before);
    }
}
