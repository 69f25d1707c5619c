//! # Gravitational wave lensing overlap
//!
//! Match between a compact binary inspiral signal, possibly distorted by a
//! gravitational lens, and an unlensed template, maximized over the template
//! merger time and phase.
//!
//! The signal is the restricted 1PN stationary phase strain of a single
//! interferometer ([waveform]), weighted by the Advanced LIGO noise ([noise]).
//! The lenses are point masses, in the wave or the geometric optics regimes, and
//! singular isothermal ellipsoids tabulated against the source position ([lensing]).
//!
//! ```no_run
//! use gw_lens_overlap::{
//!     maximize_overlap, AnnealingConfig, Bounds, OverlapIntegral, SourceParameters,
//!     TemplateParameters,
//! };
//!
//! # fn main() -> gw_lens_overlap::Result<()> {
//! let source = SourceParameters::default();
//! let template = TemplateParameters::matching(&source);
//! let integral = OverlapIntegral::new(&source, &template, Default::default(), None)?;
//! let best = maximize_overlap(&integral, &Bounds::default(), &AnnealingConfig::default().seed(42))?;
//! println!("overlap: {:.4} at t_c={:.4}s, phi_c={:.4}", best.overlap, best.t_c, best.phi_c);
//! # Ok(())
//! # }
//! ```
//!
//! All the physical quantities are in seconds (G=c=1).

pub mod error;
pub mod lensing;
pub mod noise;
pub mod optimizer;
pub mod overlap;
pub mod params;
#[cfg(feature = "plot")]
pub mod plot;
pub mod quadrature;
pub mod special;
pub mod sweep;
pub mod waveform;

pub use error::{Error, Result};
pub use optimizer::{maximize_overlap, AnnealingConfig, Bounds, Interval, OptimizationResult};
pub use overlap::{OverlapConfig, OverlapIntegral};
pub use params::{BinaryParameters, LensParameters, SourceParameters, TemplateParameters};
pub use sweep::{power_spaced, run_one, Sweep, SweepConfig, SweepKey, SweepRecord};

/// Solar mass [s]
pub const SOLAR_MASS: f64 = 4.92624076e-6;
/// Giga parsec [s]
pub const GIGA_PARSEC: f64 = 1.02927125e17;
/// Julian year [s]
pub const YEAR: f64 = 31557600f64;
/// Lower limit of the overlap integrals [Hz]
pub const LOW_FREQUENCY_CUTOFF: f64 = noise::SEISMIC_CUTOFF;
