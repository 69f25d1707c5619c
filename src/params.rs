//! Source and template parameter sets
//!
//! Every quantity is expressed in seconds (G = c = 1), see [`SOLAR_MASS`] and
//! [`GIGA_PARSEC`].
//! Parameter sets are plain values: the `with_*` setters consume `self` and return
//! a new set, so a sweep builds one parameter set per run.

use crate::{GIGA_PARSEC, SOLAR_MASS};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("symmetric mass ratio {0} is outside (0, 0.25]")]
    MassRatio(f64),
    #[error("chirp mass must be strictly positive, found {0}")]
    ChirpMass(f64),
    #[error("luminosity distance must be strictly positive, found {0}")]
    Distance(f64),
    #[error("lens mass must be strictly positive, found {0}")]
    LensMass(f64),
    #[error("impact parameter must be strictly positive, found {0}")]
    ImpactParameter(f64),
    #[error("{0} must be finite")]
    NotFinite(&'static str),
    #[error("empty frequency band [{low}, {high}]Hz")]
    EmptyBand { low: f64, high: f64 },
    #[error("search interval [{low}, {high}] must be finite with low < high")]
    Interval { low: f64, high: f64 },
}
type Result<T> = std::result::Result<T, DomainError>;

fn finite(value: f64, name: &'static str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DomainError::NotFinite(name))
    }
}

/// Compact binary intrinsic parameters and detector orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryParameters {
    /// sky location polar angle [rd]
    pub theta_s: f64,
    /// sky location azimuth angle [rd]
    pub phi_s: f64,
    /// orbital angular momentum polar angle [rd]
    pub theta_l: f64,
    /// orbital angular momentum azimuth angle [rd]
    pub phi_l: f64,
    /// redshifted chirp mass [s]
    pub chirp_mass: f64,
    /// luminosity distance [s]
    pub distance: f64,
    /// symmetric mass ratio
    pub eta: f64,
}
impl Default for BinaryParameters {
    fn default() -> Self {
        Self {
            theta_s: 0f64,
            phi_s: 0f64,
            theta_l: 0f64,
            phi_l: 0f64,
            chirp_mass: 18.79 * SOLAR_MASS,
            distance: 1.58 * GIGA_PARSEC,
            eta: 0.25,
        }
    }
}
impl BinaryParameters {
    pub fn validate(&self) -> Result<()> {
        finite(self.theta_s, "theta_s")?;
        finite(self.phi_s, "phi_s")?;
        finite(self.theta_l, "theta_l")?;
        finite(self.phi_l, "phi_l")?;
        if self.eta.is_nan() || self.eta <= 0f64 || self.eta > 0.25 {
            return Err(DomainError::MassRatio(self.eta));
        }
        if finite(self.chirp_mass, "chirp mass")? <= 0f64 {
            return Err(DomainError::ChirpMass(self.chirp_mass));
        }
        if finite(self.distance, "distance")? <= 0f64 {
            return Err(DomainError::Distance(self.distance));
        }
        Ok(())
    }
    /// Total mass M = Mc/η^(3/5) [s]
    pub fn total_mass(&self) -> f64 {
        crate::waveform::total_mass(self.chirp_mass, self.eta)
    }
    /// Innermost stable circular orbit frequency [Hz]
    pub fn isco_frequency(&self) -> f64 {
        crate::waveform::isco_frequency(self.chirp_mass, self.eta)
    }
    pub fn with_sky(self, theta_s: f64, phi_s: f64) -> Self {
        Self {
            theta_s,
            phi_s,
            ..self
        }
    }
    pub fn with_orbit(self, theta_l: f64, phi_l: f64) -> Self {
        Self {
            theta_l,
            phi_l,
            ..self
        }
    }
    pub fn with_chirp_mass(self, chirp_mass: f64) -> Self {
        Self { chirp_mass, ..self }
    }
    pub fn with_distance(self, distance: f64) -> Self {
        Self { distance, ..self }
    }
    pub fn with_eta(self, eta: f64) -> Self {
        Self { eta, ..self }
    }
}

/// Lens applied to the source signal
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LensParameters {
    #[default]
    Unlensed,
    /// Point mass lens
    PointMass {
        /// redshifted lens mass [s]
        mass: f64,
        /// dimensionless source-plane impact parameter
        y: f64,
    },
    /// Singular isothermal ellipsoid, tabulated two-image solution
    Sie {
        /// dimensionless source-plane radius, the SIE table key
        radius: f64,
    },
}
impl LensParameters {
    pub fn validate(&self) -> Result<()> {
        match *self {
            LensParameters::Unlensed => Ok(()),
            LensParameters::PointMass { mass, y } => {
                if finite(mass, "lens mass")? <= 0f64 {
                    return Err(DomainError::LensMass(mass));
                }
                if finite(y, "impact parameter")? <= 0f64 {
                    return Err(DomainError::ImpactParameter(y));
                }
                Ok(())
            }
            LensParameters::Sie { radius } => finite(radius, "source-plane radius").map(|_| ()),
        }
    }
}

/// Source signal parameters: the binary, its merger time and phase and the lens
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceParameters {
    pub binary: BinaryParameters,
    /// merger time [s]
    pub t0: f64,
    /// merger phase [rd]
    pub phi0: f64,
    pub lens: LensParameters,
}
impl Default for SourceParameters {
    fn default() -> Self {
        Self {
            binary: BinaryParameters::default(),
            t0: 0f64,
            phi0: 0f64,
            lens: LensParameters::PointMass {
                mass: 5e5 * SOLAR_MASS,
                y: 0.8,
            },
        }
    }
}
impl SourceParameters {
    pub fn new(binary: BinaryParameters) -> Self {
        Self {
            binary,
            t0: 0f64,
            phi0: 0f64,
            lens: LensParameters::Unlensed,
        }
    }
    pub fn validate(&self) -> Result<()> {
        self.binary.validate()?;
        finite(self.t0, "t0")?;
        finite(self.phi0, "phi0")?;
        self.lens.validate()
    }
    pub fn with_lens(self, lens: LensParameters) -> Self {
        Self { lens, ..self }
    }
    pub fn with_merger(self, t0: f64, phi0: f64) -> Self {
        Self { t0, phi0, ..self }
    }
    pub fn with_binary(self, binary: BinaryParameters) -> Self {
        Self { binary, ..self }
    }
    /// Replaces the point mass lens mass, keeping the impact parameter
    ///
    /// A source that is not point mass lensed gets a point mass lens with `y=1`
    pub fn with_lens_mass(self, mass: f64) -> Self {
        let y = match self.lens {
            LensParameters::PointMass { y, .. } => y,
            _ => 1f64,
        };
        self.with_lens(LensParameters::PointMass { mass, y })
    }
    pub fn with_impact_parameter(self, y: f64) -> Self {
        let mass = match self.lens {
            LensParameters::PointMass { mass, .. } => mass,
            _ => SOLAR_MASS,
        };
        self.with_lens(LensParameters::PointMass { mass, y })
    }
    pub fn with_radius(self, radius: f64) -> Self {
        self.with_lens(LensParameters::Sie { radius })
    }
}

/// Template parameters, the merger time and phase are left free
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TemplateParameters {
    pub binary: BinaryParameters,
}
impl TemplateParameters {
    pub fn new(binary: BinaryParameters) -> Self {
        Self { binary }
    }
    /// Template with the same binary as the source
    pub fn matching(source: &SourceParameters) -> Self {
        Self {
            binary: source.binary,
        }
    }
    pub fn validate(&self) -> Result<()> {
        self.binary.validate()
    }
    pub fn with_binary(self, binary: BinaryParameters) -> Self {
        Self { binary }
    }
}
