//! Standard (z-score) feature scaling
//!
//! Fit on the training split only and reused verbatim everywhere else, so
//! validation, test and inference all see the training distribution.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Column-wise standard scaler: (x - mean) / population std-dev.
///
/// Zero-variance columns pass through centered but unscaled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    std_devs: Vec<f64>,
}

impl StandardScaler {
    /// Fit column statistics on a rectangular matrix of training rows
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let width = rows
            .first()
            .map(|row| row.len())
            .ok_or_else(|| ForecastError::DataError("Cannot fit scaler on no rows".to_string()))?;
        if rows.iter().any(|row| row.len() != width) {
            return Err(ForecastError::DataError(
                "Scaler input rows have inconsistent widths".to_string(),
            ));
        }

        let mut means = Vec::with_capacity(width);
        let mut std_devs = Vec::with_capacity(width);
        for j in 0..width {
            let column: Vec<f64> = rows.iter().map(|row| row[j]).collect();
            means.push((&column).mean());
            std_devs.push((&column).population_std_dev());
        }

        Ok(Self { means, std_devs })
    }

    /// Number of columns the scaler was fit on
    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    /// Scale a single feature vector
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.means.len() {
            return Err(ForecastError::DataError(format!(
                "Scaler fit on {} columns but received {}",
                self.means.len(),
                row.len()
            )));
        }

        Ok(row
            .iter()
            .enumerate()
            .map(|(j, value)| {
                let centered = value - self.means[j];
                if self.std_devs[j] > 0.0 {
                    centered / self.std_devs[j]
                } else {
                    centered
                }
            })
            .collect())
    }

    /// Scale a matrix of feature vectors
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }
}
