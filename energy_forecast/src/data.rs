//! Panel data loading and per-country history access

use crate::error::{ForecastError, Result};
use energy_panel::CountryYearRecord;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Columns every raw panel file must provide
const REQUIRED_COLUMNS: [&str; 12] = [
    "iso3",
    "year",
    "electricity_generation_twh",
    "coal_twh",
    "oil_twh",
    "gas_twh",
    "nuclear_twh",
    "hydro_twh",
    "solar_twh",
    "wind_twh",
    "other_renewables_twh",
    "low_carbon_share_pct",
];

/// Supplies per-country history, ordered by year.
///
/// This is the seam to the historical data store: serving code depends on
/// the trait, so an in-memory panel and a real database client are
/// interchangeable.
pub trait HistorySource {
    /// Known history for a country, ordered by year; empty when unknown
    fn history(&self, iso3: &str) -> Result<Vec<CountryYearRecord>>;
}

/// Loader for raw yearly panel data
#[derive(Debug)]
pub struct PanelLoader;

impl PanelLoader {
    /// Load a yearly panel from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<PanelData> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(df)
    }

    /// Convert an existing DataFrame into typed panel data
    pub fn from_dataframe(df: DataFrame) -> Result<PanelData> {
        let column_names = df.get_column_names();
        for required in REQUIRED_COLUMNS {
            if !column_names.iter().any(|name| *name == required) {
                return Err(ForecastError::DataError(format!(
                    "Panel is missing required column '{}'",
                    required
                )));
            }
        }

        let iso3 = Self::column_as_str(&df, "iso3")?;
        let year = Self::column_as_i32(&df, "year")?;
        let generation = Self::column_as_f64(&df, "electricity_generation_twh")?;
        let coal = Self::column_as_f64(&df, "coal_twh")?;
        let oil = Self::column_as_f64(&df, "oil_twh")?;
        let gas = Self::column_as_f64(&df, "gas_twh")?;
        let nuclear = Self::column_as_f64(&df, "nuclear_twh")?;
        let hydro = Self::column_as_f64(&df, "hydro_twh")?;
        let solar = Self::column_as_f64(&df, "solar_twh")?;
        let wind = Self::column_as_f64(&df, "wind_twh")?;
        let other = Self::column_as_f64(&df, "other_renewables_twh")?;
        let low_carbon = Self::column_as_f64(&df, "low_carbon_share_pct")?;

        // fossil_share_pct is derivable, so accept files without it
        let fossil = if column_names.iter().any(|name| *name == "fossil_share_pct") {
            Self::column_as_f64(&df, "fossil_share_pct")?
        } else {
            low_carbon.iter().map(|lc| 100.0 - lc).collect()
        };

        let population = Self::column_as_opt_f64(&df, "population_millions")?;
        let gdp = Self::column_as_opt_f64(&df, "gdp_billions_usd")?;

        let height = df.height();
        let mut records = Vec::with_capacity(height);
        for i in 0..height {
            records.push(CountryYearRecord {
                iso3: iso3[i].clone(),
                year: year[i],
                electricity_generation_twh: generation[i],
                coal_twh: coal[i],
                oil_twh: oil[i],
                gas_twh: gas[i],
                nuclear_twh: nuclear[i],
                hydro_twh: hydro[i],
                solar_twh: solar[i],
                wind_twh: wind[i],
                other_renewables_twh: other[i],
                low_carbon_share_pct: low_carbon[i],
                fossil_share_pct: fossil[i],
                population_millions: population.as_ref().and_then(|col| col[i]),
                gdp_billions_usd: gdp.as_ref().and_then(|col| col[i]),
            });
        }

        PanelData::from_records(records)
    }

    fn column_as_str(df: &DataFrame, column_name: &str) -> Result<Vec<String>> {
        let col = df.column(column_name)?;
        let values: Vec<String> = col
            .utf8()
            .map_err(|_| {
                ForecastError::DataError(format!(
                    "Column '{}' cannot be read as strings",
                    column_name
                ))
            })?
            .into_iter()
            .map(|opt| opt.unwrap_or("").trim().to_string())
            .collect();

        if values.iter().any(|v| v.is_empty()) {
            return Err(ForecastError::DataError(format!(
                "Column '{}' contains empty values",
                column_name
            )));
        }

        Ok(values)
    }

    fn column_as_i32(df: &DataFrame, column_name: &str) -> Result<Vec<i32>> {
        let col = df.column(column_name)?;
        let values: Vec<i32> = match col.dtype() {
            DataType::Int32 => col.i32().unwrap().into_iter().flatten().collect(),
            DataType::Int64 => col
                .i64()
                .unwrap()
                .into_iter()
                .flatten()
                .map(|v| v as i32)
                .collect(),
            _ => {
                return Err(ForecastError::DataError(format!(
                    "Column '{}' cannot be converted to i32",
                    column_name
                )))
            }
        };

        Self::check_complete(column_name, values, df.height())
    }

    fn column_as_f64(df: &DataFrame, column_name: &str) -> Result<Vec<f64>> {
        let col = df.column(column_name)?;
        let values: Vec<f64> = match col.dtype() {
            DataType::Float64 => col.f64().unwrap().into_iter().flatten().collect(),
            DataType::Float32 => col
                .f32()
                .unwrap()
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect(),
            DataType::Int64 => col
                .i64()
                .unwrap()
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect(),
            DataType::Int32 => col
                .i32()
                .unwrap()
                .into_iter()
                .flatten()
                .map(|v| v as f64)
                .collect(),
            _ => {
                return Err(ForecastError::DataError(format!(
                    "Column '{}' cannot be converted to f64",
                    column_name
                )))
            }
        };

        Self::check_complete(column_name, values, df.height())
    }

    /// Required columns must not contain nulls; a dropped value would shift
    /// every later row
    fn check_complete<T>(column_name: &str, values: Vec<T>, expected: usize) -> Result<Vec<T>> {
        if values.len() != expected {
            return Err(ForecastError::DataError(format!(
                "Column '{}' contains {} missing values",
                column_name,
                expected - values.len()
            )));
        }
        Ok(values)
    }

    /// Nullable numeric column; `Ok(None)` when the column is absent
    fn column_as_opt_f64(df: &DataFrame, column_name: &str) -> Result<Option<Vec<Option<f64>>>> {
        if !df.get_column_names().iter().any(|name| *name == column_name) {
            return Ok(None);
        }

        let col = df.column(column_name)?;
        let values: Vec<Option<f64>> = match col.dtype() {
            DataType::Float64 => col.f64().unwrap().into_iter().collect(),
            DataType::Float32 => col
                .f32()
                .unwrap()
                .into_iter()
                .map(|opt| opt.map(|v| v as f64))
                .collect(),
            DataType::Int64 => col
                .i64()
                .unwrap()
                .into_iter()
                .map(|opt| opt.map(|v| v as f64))
                .collect(),
            _ => {
                return Err(ForecastError::DataError(format!(
                    "Column '{}' cannot be converted to f64",
                    column_name
                )))
            }
        };

        Ok(Some(values))
    }
}

/// A yearly panel grouped per country, ordered by year within each country
#[derive(Debug, Clone)]
pub struct PanelData {
    countries: BTreeMap<String, Vec<CountryYearRecord>>,
}

impl PanelData {
    /// Group raw records per country, enforcing (country, year) uniqueness
    pub fn from_records(records: Vec<CountryYearRecord>) -> Result<Self> {
        let mut countries: BTreeMap<String, Vec<CountryYearRecord>> = BTreeMap::new();
        for record in records {
            countries.entry(record.iso3.clone()).or_default().push(record);
        }

        for (iso3, rows) in countries.iter_mut() {
            rows.sort_by_key(|r| r.year);
            for pair in rows.windows(2) {
                if pair[0].year == pair[1].year {
                    return Err(ForecastError::DataError(format!(
                        "Duplicate record for {} year {}",
                        iso3, pair[0].year
                    )));
                }
            }
        }

        Ok(Self { countries })
    }

    /// Country codes present in the panel, sorted
    pub fn countries(&self) -> Vec<&str> {
        self.countries.keys().map(|k| k.as_str()).collect()
    }

    /// Number of rows across all countries
    pub fn len(&self) -> usize {
        self.countries.values().map(|rows| rows.len()).sum()
    }

    /// Whether the panel holds no rows
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// Borrow one country's history, ordered by year
    pub fn country_rows(&self, iso3: &str) -> Option<&[CountryYearRecord]> {
        self.countries.get(iso3).map(|rows| rows.as_slice())
    }

    /// Iterate over all (country, rows) groups
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CountryYearRecord])> {
        self.countries
            .iter()
            .map(|(iso3, rows)| (iso3.as_str(), rows.as_slice()))
    }
}

impl HistorySource for PanelData {
    fn history(&self, iso3: &str) -> Result<Vec<CountryYearRecord>> {
        Ok(self
            .country_rows(iso3)
            .map(|rows| rows.to_vec())
            .unwrap_or_default())
    }
}
