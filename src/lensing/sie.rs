//! Singular isothermal ellipsoid lens, two-image solution
//!
//! The magnifications and time delays of both images are tabulated against the
//! source-plane radius for a given lens configuration (opening angle and
//! velocity dispersion).
//! The table is a CSV file with the headers `source_x, mu_1, mu_2, td_1, td_2`.

use std::{f64::consts::PI, path::Path};

use num_complex::Complex64;
use serde::Deserialize;

use super::Amplification;
use crate::Result;

#[derive(thiserror::Error, Debug)]
pub enum SieTableError {
    #[error("failed to open the SIE table: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to read the SIE table: {0}")]
    Csv(#[from] csv::Error),
    #[error("the SIE table is empty")]
    Empty,
    #[error("source-plane radius {0} is not a number")]
    NotANumber(f64),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("source-plane radius {radius} not found in the SIE table")]
    Miss { radius: f64 },
    #[error("SIE lensing requires a SIE table")]
    NoTable,
}

/// SIE table row
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct SieRow {
    #[serde(rename = "source_x")]
    pub radius: f64,
    pub mu_1: f64,
    pub mu_2: f64,
    pub td_1: f64,
    pub td_2: f64,
}
impl SieRow {
    fn lerp(&self, other: &SieRow, radius: f64) -> SieRow {
        let s = (radius - self.radius) / (other.radius - self.radius);
        let lerp = |a: f64, b: f64| a + s * (b - a);
        SieRow {
            radius,
            mu_1: lerp(self.mu_1, other.mu_1),
            mu_2: lerp(self.mu_2, other.mu_2),
            td_1: lerp(self.td_1, other.td_1),
            td_2: lerp(self.td_2, other.td_2),
        }
    }
}

/// Table row lookup
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LookupPolicy {
    /// the radius must be one of the table radii
    #[default]
    Exact,
    /// the closest row, if within `tolerance` of the radius
    Nearest { tolerance: f64 },
    /// linear interpolation between the two rows around the radius
    Linear,
}

/// SIE solutions sorted by increasing source-plane radius
#[derive(Debug, Clone, Default)]
pub struct SieTable {
    rows: Vec<SieRow>,
}
impl SieTable {
    /// Loads the table from a CSV file
    pub fn from_path<P: AsRef<Path>>(path: P) -> std::result::Result<Self, SieTableError> {
        let path = path.as_ref();
        let mut rdr = csv::Reader::from_path(path)?;
        let rows = rdr
            .deserialize()
            .collect::<std::result::Result<Vec<SieRow>, csv::Error>>()?;
        log::info!("loaded {} SIE solutions from {:?}", rows.len(), path);
        Self::from_rows(rows)
    }
    pub fn from_rows(mut rows: Vec<SieRow>) -> std::result::Result<Self, SieTableError> {
        if rows.is_empty() {
            return Err(SieTableError::Empty);
        }
        if let Some(row) = rows.iter().find(|row| row.radius.is_nan()) {
            return Err(SieTableError::NotANumber(row.radius));
        }
        rows.sort_by(|a, b| a.radius.total_cmp(&b.radius));
        Ok(Self { rows })
    }
    pub fn rows(&self) -> &[SieRow] {
        &self.rows
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    /// Table radii, in increasing order
    pub fn radii(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|row| row.radius)
    }
    /// Row with exactly the given radius
    pub fn lookup_exact(&self, radius: f64) -> std::result::Result<SieRow, LookupError> {
        self.rows
            .binary_search_by(|row| row.radius.total_cmp(&radius))
            .map(|i| self.rows[i])
            .map_err(|_| LookupError::Miss { radius })
    }
    /// Row of the given radius according to the lookup policy
    ///
    /// Radii outside the table range are always a miss.
    pub fn lookup(
        &self,
        radius: f64,
        policy: LookupPolicy,
    ) -> std::result::Result<SieRow, LookupError> {
        let miss = LookupError::Miss { radius };
        match policy {
            LookupPolicy::Exact => self.lookup_exact(radius),
            LookupPolicy::Nearest { tolerance } => {
                let i = self.rows.partition_point(|row| row.radius < radius);
                [i.checked_sub(1), Some(i)]
                    .into_iter()
                    .flatten()
                    .filter_map(|i| self.rows.get(i))
                    .min_by(|a, b| {
                        (a.radius - radius)
                            .abs()
                            .total_cmp(&(b.radius - radius).abs())
                    })
                    .filter(|row| (row.radius - radius).abs() <= tolerance)
                    .copied()
                    .ok_or(miss)
            }
            LookupPolicy::Linear => {
                let i = self.rows.partition_point(|row| row.radius < radius);
                match (i.checked_sub(1).map(|j| &self.rows[j]), self.rows.get(i)) {
                    (_, Some(upper)) if upper.radius == radius => Ok(*upper),
                    (Some(lower), Some(upper)) => Ok(lower.lerp(upper, radius)),
                    _ => Err(miss),
                }
            }
        }
    }
}

/// Two-image SIE amplification F = √|μ1| - i√|μ2| exp(2πif td2)
///
/// The first image is the time reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SieImages {
    pub mu_1: f64,
    pub mu_2: f64,
    pub td_2: f64,
}
impl SieImages {
    pub fn from_row(row: &SieRow) -> Self {
        Self {
            mu_1: row.mu_1,
            mu_2: row.mu_2,
            td_2: row.td_2,
        }
    }
}
impl Amplification for SieImages {
    fn amplification(&self, f: f64) -> Result<Complex64> {
        let second_image = Complex64::from_polar(self.mu_2.abs().sqrt(), 2f64 * PI * f * self.td_2);
        Ok(self.mu_1.abs().sqrt() - Complex64::i() * second_image)
    }
}
