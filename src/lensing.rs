//! Lensing amplification factors
//!
//! A lens multiplies the frequency domain strain of the source by the complex
//! amplification factor F(f).
//! Two lens models are available:
//!  - [`point_mass`]: wave optics (exact) and geometric optics (approximate)
//!  - [`sie`]: two-image singular isothermal ellipsoid from a tabulated solution

use num_complex::Complex64;

use crate::{params::LensParameters, Result, SOLAR_MASS};

pub mod point_mass;
pub mod sie;

pub use point_mass::{GeometricOptics, LensShape, Magnifications, PointMassLens, WaveOptics};
pub use sie::{LookupError, LookupPolicy, SieImages, SieRow, SieTable, SieTableError};

/// Frequency dependent amplification factor
pub trait Amplification: Send + Sync {
    /// Amplification factor F(f) at frequency `f` [Hz]
    fn amplification(&self, f: f64) -> Result<Complex64>;
}

/// No lens, F(f)=1
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Unlensed;
impl Amplification for Unlensed {
    fn amplification(&self, _f: f64) -> Result<Complex64> {
        Ok(Complex64::new(1f64, 0f64))
    }
}

/// Lensing configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensingConfig {
    /// point mass lenses heavier than this mass [s] use geometric optics
    pub geometric_optics_threshold: f64,
    /// magnification and time delay formulas of geometric optics
    pub geometric_shape: LensShape,
    /// term budget of the wave optics hypergeometric series
    pub max_series_terms: usize,
    /// SIE table lookup
    pub lookup: LookupPolicy,
}
impl Default for LensingConfig {
    fn default() -> Self {
        Self {
            geometric_optics_threshold: 35f64 * SOLAR_MASS,
            geometric_shape: LensShape::PointMass,
            max_series_terms: crate::special::HYP1F1_MAX_TERMS,
            lookup: LookupPolicy::Exact,
        }
    }
}
impl LensingConfig {
    pub fn geometric_optics_threshold(self, mass: f64) -> Self {
        Self {
            geometric_optics_threshold: mass,
            ..self
        }
    }
    pub fn geometric_shape(self, geometric_shape: LensShape) -> Self {
        Self {
            geometric_shape,
            ..self
        }
    }
    pub fn max_series_terms(self, max_series_terms: usize) -> Self {
        Self {
            max_series_terms,
            ..self
        }
    }
    pub fn lookup(self, lookup: LookupPolicy) -> Self {
        Self { lookup, ..self }
    }
}

/// Lens of the source signal
#[derive(Debug, Clone, PartialEq)]
pub enum LensModel {
    Unlensed(Unlensed),
    PointMass(PointMassLens),
    Sie(SieImages),
}
impl Default for LensModel {
    fn default() -> Self {
        LensModel::Unlensed(Unlensed)
    }
}
impl LensModel {
    /// Builds the lens model of the lens parameters
    ///
    /// The SIE model requires the table of the SIE solutions
    pub fn new(
        lens: &LensParameters,
        config: &LensingConfig,
        table: Option<&SieTable>,
    ) -> Result<Self> {
        lens.validate()?;
        Ok(match *lens {
            LensParameters::Unlensed => LensModel::Unlensed(Unlensed),
            LensParameters::PointMass { mass, y } => {
                LensModel::PointMass(PointMassLens::new(mass, y, config)?)
            }
            LensParameters::Sie { radius } => {
                let table = table.ok_or(LookupError::NoTable)?;
                LensModel::Sie(SieImages::from_row(&table.lookup(radius, config.lookup)?))
            }
        })
    }
    pub fn is_unlensed(&self) -> bool {
        matches!(self, LensModel::Unlensed(_))
    }
}
impl Amplification for LensModel {
    fn amplification(&self, f: f64) -> Result<Complex64> {
        match self {
            LensModel::Unlensed(lens) => lens.amplification(f),
            LensModel::PointMass(lens) => lens.amplification(f),
            LensModel::Sie(lens) => lens.amplification(f),
        }
    }
}
