//! Point mass lens
//!
//! The lens mass `mass` is the redshifted lens mass [s] and `y` the impact
//! parameter in units of the Einstein radius.

use std::f64::consts::PI;

use num_complex::Complex64;
use strum_macros::{Display, EnumIter, EnumString};

use super::{Amplification, LensingConfig};
use crate::{params::DomainError, special, Result};

/// Lens profile of the geometric optics magnifications and time delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, EnumIter)]
pub enum LensShape {
    /// point mass
    #[default]
    #[strum(serialize = "pm")]
    PointMass,
    /// singular isothermal sphere
    #[strum(serialize = "sis")]
    Sis,
}

/// Magnifications of the two images
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Magnifications {
    pub mu_plus: f64,
    pub mu_minus: f64,
}
impl Magnifications {
    pub fn new(y: f64, shape: LensShape) -> Self {
        match shape {
            LensShape::PointMass => {
                let k = (y * y + 2f64) / (2f64 * y * (y * y + 4f64).sqrt());
                Self {
                    mu_plus: (0.5 + k).abs(),
                    mu_minus: (0.5 - k).abs(),
                }
            }
            LensShape::Sis => Self {
                mu_plus: (1f64 + 1f64 / y).abs(),
                mu_minus: (-1f64 + 1f64 / y).abs(),
            },
        }
    }
    /// Flux ratio μ₋/μ₊
    pub fn flux_ratio(&self) -> f64 {
        self.mu_minus / self.mu_plus
    }
}

/// Time delay between the two images [s]
pub fn time_delay(mass: f64, y: f64, shape: LensShape) -> f64 {
    match shape {
        LensShape::PointMass => {
            let root = (y * y + 4f64).sqrt();
            4f64 * mass * (0.5 * y * root + ((root + y) / (root - y)).ln())
        }
        LensShape::Sis => 8f64 * mass * y,
    }
}

/// Geometric optics amplification F = 1 - i√r exp(2πifΔt)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricOptics {
    pub flux_ratio: f64,
    pub time_delay: f64,
}
impl GeometricOptics {
    pub fn new(mass: f64, y: f64, shape: LensShape) -> Self {
        Self {
            flux_ratio: Magnifications::new(y, shape).flux_ratio(),
            time_delay: time_delay(mass, y, shape),
        }
    }
}
impl Amplification for GeometricOptics {
    fn amplification(&self, f: f64) -> Result<Complex64> {
        let second_image = Complex64::from_polar(self.flux_ratio.sqrt(), 2f64 * PI * f * self.time_delay);
        Ok(1f64 - Complex64::i() * second_image)
    }
}

/// Wave optics amplification
///
/// F = exp(πw/4 + i(w/2)(ln(w/2) - 2φm)) Γ(1 - iw/2) 1F1(iw/2; 1; iwy²/2)
/// with w = 8πMf.
/// The exponential and the gamma function are combined in logarithm as
/// they respectively overflow and underflow with w, and passed as the scale of
/// [`special::scaled_hyp1f1`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveOptics {
    pub mass: f64,
    pub y: f64,
    // φm
    phase_minimum: f64,
    max_terms: usize,
}
impl WaveOptics {
    pub fn new(mass: f64, y: f64, max_terms: usize) -> Self {
        let x_m = 0.5 * (y + (y * y + 4f64).sqrt());
        Self {
            mass,
            y,
            phase_minimum: 0.5 * (x_m - y).powi(2) - x_m.ln(),
            max_terms,
        }
    }
    /// Dimensionless frequency w = 8πMf
    pub fn dimensionless_frequency(&self, f: f64) -> f64 {
        8f64 * PI * self.mass * f
    }
}
impl Amplification for WaveOptics {
    fn amplification(&self, f: f64) -> Result<Complex64> {
        let half_w = 0.5 * self.dimensionless_frequency(f);
        if half_w == 0f64 {
            return Ok(Complex64::new(1f64, 0f64));
        }
        let i = Complex64::i();
        let ln_prefactor = Complex64::new(
            0.5 * PI * half_w,
            half_w * (half_w.ln() - 2f64 * self.phase_minimum),
        ) + special::ln_gamma(1f64 - i * half_w);
        Ok(special::scaled_hyp1f1(
            ln_prefactor,
            i * half_w,
            Complex64::new(1f64, 0f64),
            i * half_w * self.y * self.y,
            self.max_terms,
        )?)
    }
}

/// Point mass lens in the wave or geometric optics regime
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointMassLens {
    WaveOptics(WaveOptics),
    GeometricOptics(GeometricOptics),
}
impl PointMassLens {
    /// Point mass lens with the regime set by [`LensingConfig::geometric_optics_threshold`]
    pub fn new(mass: f64, y: f64, config: &LensingConfig) -> std::result::Result<Self, DomainError> {
        if !(mass > 0f64) {
            return Err(DomainError::LensMass(mass));
        }
        if !(y > 0f64) {
            return Err(DomainError::ImpactParameter(y));
        }
        Ok(if mass > config.geometric_optics_threshold {
            PointMassLens::GeometricOptics(GeometricOptics::new(mass, y, config.geometric_shape))
        } else {
            PointMassLens::WaveOptics(WaveOptics::new(mass, y, config.max_series_terms))
        })
    }
}
impl Amplification for PointMassLens {
    fn amplification(&self, f: f64) -> Result<Complex64> {
        match self {
            PointMassLens::WaveOptics(lens) => lens.amplification(f),
            PointMassLens::GeometricOptics(lens) => lens.amplification(f),
        }
    }
}
