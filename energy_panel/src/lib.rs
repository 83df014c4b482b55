//! # Energy Panel
//!
//! `energy_panel` is a Rust library providing the typed domain records for
//! country-level energy-transition data. The unit of observation is one
//! country-year: total electricity generation, a breakdown across eight
//! generation sources, and the derived low-carbon / fossil share
//! percentages.
//!
//! ## Usage Example
//!
//! ```
//! use energy_panel::{CountryYearRecord, EnergySource};
//! use energy_panel::utils::{default_profiles, generate_test_panel};
//!
//! // Generate a deterministic synthetic panel for tests or demos
//! let panel = generate_test_panel(&default_profiles(), 2000, 2023, 42).unwrap();
//!
//! let row: &CountryYearRecord = &panel[0];
//! let solar = row.share_fraction(EnergySource::Solar, 1e-9);
//! assert!((0.0..=1.0).contains(&solar));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Synthetic panel generation for tests and demos
pub mod utils;

/// Errors that can occur when building or validating panel data
#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// The eight electricity generation sources tracked per country-year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergySource {
    Coal,
    Oil,
    Gas,
    Nuclear,
    Hydro,
    Solar,
    Wind,
    OtherRenewables,
}

impl EnergySource {
    /// All sources, in the canonical column order of the panel
    pub const ALL: [EnergySource; 8] = [
        EnergySource::Coal,
        EnergySource::Oil,
        EnergySource::Gas,
        EnergySource::Nuclear,
        EnergySource::Hydro,
        EnergySource::Solar,
        EnergySource::Wind,
        EnergySource::OtherRenewables,
    ];

    /// Snake-case column stem used for `<stem>_twh` and `<stem>_share` columns
    pub fn column_stem(&self) -> &'static str {
        match self {
            EnergySource::Coal => "coal",
            EnergySource::Oil => "oil",
            EnergySource::Gas => "gas",
            EnergySource::Nuclear => "nuclear",
            EnergySource::Hydro => "hydro",
            EnergySource::Solar => "solar",
            EnergySource::Wind => "wind",
            EnergySource::OtherRenewables => "other_renewables",
        }
    }

    /// Whether generation from this source counts toward the low-carbon share
    pub fn is_low_carbon(&self) -> bool {
        !matches!(
            self,
            EnergySource::Coal | EnergySource::Oil | EnergySource::Gas
        )
    }
}

/// One (country, year) observation of the energy panel.
///
/// Rows are immutable once ingested; the data source guarantees one row per
/// (country, year) pair. `population_millions` and `gdp_billions_usd` are
/// country-level covariates that ride along each row of the panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryYearRecord {
    /// ISO 3166-1 alpha-3 country code
    pub iso3: String,
    /// Calendar year of the observation
    pub year: i32,
    /// Total electricity generation in TWh
    pub electricity_generation_twh: f64,
    /// Coal generation in TWh
    pub coal_twh: f64,
    /// Oil generation in TWh
    pub oil_twh: f64,
    /// Gas generation in TWh
    pub gas_twh: f64,
    /// Nuclear generation in TWh
    pub nuclear_twh: f64,
    /// Hydro generation in TWh
    pub hydro_twh: f64,
    /// Solar generation in TWh
    pub solar_twh: f64,
    /// Wind generation in TWh
    pub wind_twh: f64,
    /// Other renewable generation in TWh
    pub other_renewables_twh: f64,
    /// Share of low-carbon generation, in percent of total
    pub low_carbon_share_pct: f64,
    /// Share of fossil generation, in percent of total
    pub fossil_share_pct: f64,
    /// Country population in millions, where known
    pub population_millions: Option<f64>,
    /// Country GDP in billions of USD, where known
    pub gdp_billions_usd: Option<f64>,
}

impl CountryYearRecord {
    /// Generation in TWh for a single source
    pub fn generation(&self, source: EnergySource) -> f64 {
        match source {
            EnergySource::Coal => self.coal_twh,
            EnergySource::Oil => self.oil_twh,
            EnergySource::Gas => self.gas_twh,
            EnergySource::Nuclear => self.nuclear_twh,
            EnergySource::Hydro => self.hydro_twh,
            EnergySource::Solar => self.solar_twh,
            EnergySource::Wind => self.wind_twh,
            EnergySource::OtherRenewables => self.other_renewables_twh,
        }
    }

    /// Share of total generation coming from `source`, as a fraction.
    ///
    /// The denominator is floor-clamped to `eps` so that a country with zero
    /// recorded generation yields a zero share instead of a division by zero.
    pub fn share_fraction(&self, source: EnergySource, eps: f64) -> f64 {
        self.generation(source) / self.electricity_generation_twh.max(eps)
    }

    /// Total low-carbon generation in TWh (nuclear, hydro, solar, wind, other renewables)
    pub fn low_carbon_twh(&self) -> f64 {
        EnergySource::ALL
            .iter()
            .filter(|s| s.is_low_carbon())
            .map(|s| self.generation(*s))
            .sum()
    }

    /// Low-carbon share in percent, derived from the source mix.
    ///
    /// The ingested `low_carbon_share_pct` field is authoritative; this
    /// derivation exists for generators and consistency checks.
    pub fn low_carbon_share_from_mix(&self, eps: f64) -> f64 {
        100.0 * self.low_carbon_twh() / self.electricity_generation_twh.max(eps)
    }
}
