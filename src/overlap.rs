//! Noise weighted overlap of a lensed source and an unlensed template
//!
//! The overlap of the source signal S and the template T is
//! ```text
//!         4 Re(I1)
//! ------------------------ , I1 = ∫ S T*/Sn df, I2 = ∫ |S|²/Sn df, I3 = ∫ |T|²/Sn df
//! √(4 Re(I2) · 4 Re(I3))
//! ```
//! Only I1 depends on the template merger time and phase (t_c,φ_c), so I2 and
//! I3 are integrated once when the [`OverlapIntegral`] is built.

use std::sync::atomic::{AtomicUsize, Ordering};

use num_complex::Complex64;
use strum_macros::{Display, EnumString};

use crate::{
    lensing::{Amplification, LensModel, LensingConfig, SieTable},
    noise,
    params::{DomainError, SourceParameters, TemplateParameters},
    quadrature::{self, Quadrature, QuadratureOptions},
    waveform::Waveform,
    Result, LOW_FREQUENCY_CUTOFF,
};

/// Integration band [Hz]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyBand {
    pub low: f64,
    pub high: f64,
}
impl FrequencyBand {
    pub fn new(low: f64, high: f64) -> std::result::Result<Self, DomainError> {
        if high > low {
            Ok(Self { low, high })
        } else {
            Err(DomainError::EmptyBand { low, high })
        }
    }
    pub fn width(&self) -> f64 {
        self.high - self.low
    }
}

/// Upper limit of the cross term integral I1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
pub enum CrossTermCutoff {
    /// template ISCO frequency
    #[default]
    #[strum(serialize = "template")]
    Template,
    /// smallest of the source and template ISCO frequencies
    #[strum(serialize = "min")]
    Minimum,
}

/// Integration bands of the three overlap integrals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyBands {
    /// I1
    pub cross: FrequencyBand,
    /// I2
    pub source: FrequencyBand,
    /// I3
    pub template: FrequencyBand,
}
impl FrequencyBands {
    pub fn new(
        low: f64,
        source_cutoff: f64,
        template_cutoff: f64,
        cross: CrossTermCutoff,
    ) -> std::result::Result<Self, DomainError> {
        let cross_cutoff = match cross {
            CrossTermCutoff::Template => template_cutoff,
            CrossTermCutoff::Minimum => source_cutoff.min(template_cutoff),
        };
        Ok(Self {
            cross: FrequencyBand::new(low, cross_cutoff)?,
            source: FrequencyBand::new(low, source_cutoff)?,
            template: FrequencyBand::new(low, template_cutoff)?,
        })
    }
}

/// Overlap computation settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapConfig {
    /// lower limit of the integrals [Hz]
    pub low_frequency: f64,
    pub quadrature: QuadratureOptions,
    /// quadrature errors larger than this relative tolerance are reported
    pub warn_tolerance: f64,
    pub cross_cutoff: CrossTermCutoff,
    pub lensing: LensingConfig,
}
impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            low_frequency: LOW_FREQUENCY_CUTOFF,
            quadrature: Default::default(),
            warn_tolerance: 1e-6,
            cross_cutoff: Default::default(),
            lensing: Default::default(),
        }
    }
}
impl OverlapConfig {
    pub fn low_frequency(self, low_frequency: f64) -> Self {
        Self {
            low_frequency,
            ..self
        }
    }
    pub fn quadrature(self, quadrature: QuadratureOptions) -> Self {
        Self { quadrature, ..self }
    }
    pub fn warn_tolerance(self, warn_tolerance: f64) -> Self {
        Self {
            warn_tolerance,
            ..self
        }
    }
    pub fn cross_cutoff(self, cross_cutoff: CrossTermCutoff) -> Self {
        Self {
            cross_cutoff,
            ..self
        }
    }
    pub fn lensing(self, lensing: LensingConfig) -> Self {
        Self { lensing, ..self }
    }
}

/// Overlap and its absolute error estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapValue {
    pub overlap: f64,
    pub abs_error: f64,
    /// whether the cross term quadrature met its tolerance
    pub converged: bool,
}

/// Overlap of a source and a template as a function of the template (t_c,φ_c)
#[derive(Debug)]
pub struct OverlapIntegral {
    source: Waveform,
    t0: f64,
    phi0: f64,
    lens: LensModel,
    template: Waveform,
    bands: FrequencyBands,
    config: OverlapConfig,
    source_norm: Quadrature,
    template_norm: Quadrature,
    // √(Re(I2)Re(I3))
    normalization: f64,
    warnings: AtomicUsize,
}
impl OverlapIntegral {
    /// Validates the parameters and integrates the source and template norms
    ///
    /// The lens is built from `source.lens`, `table` is only required for a SIE
    /// lensed source.
    pub fn new(
        source: &SourceParameters,
        template: &TemplateParameters,
        config: OverlapConfig,
        table: Option<&SieTable>,
    ) -> Result<Self> {
        let lens = LensModel::new(&source.lens, &config.lensing, table)?;
        Self::with_lens_model(source, template, lens, config)
    }
    /// Same as [`OverlapIntegral::new`] but the source is lensed by `lens`,
    /// whatever `source.lens` is
    pub fn with_lens_model(
        source: &SourceParameters,
        template: &TemplateParameters,
        lens: LensModel,
        config: OverlapConfig,
    ) -> Result<Self> {
        source.validate()?;
        template.validate()?;
        let source_waveform = Waveform::new(&source.binary)?;
        let template_waveform = Waveform::new(&template.binary)?;
        let bands = FrequencyBands::new(
            config.low_frequency,
            source_waveform.cutoff(),
            template_waveform.cutoff(),
            config.cross_cutoff,
        )?;
        let mut this = Self {
            source: source_waveform,
            t0: source.t0,
            phi0: source.phi0,
            lens,
            template: template_waveform,
            bands,
            config,
            source_norm: Quadrature::default(),
            template_norm: Quadrature::default(),
            normalization: 0f64,
            warnings: AtomicUsize::new(0),
        };
        let source_norm = quadrature::integrate(
            |f| {
                Ok::<_, crate::Error>(Complex64::from(
                    this.source_signal(f)?.norm_sqr() / noise::psd(f),
                ))
            },
            bands.source.low,
            bands.source.high,
            &config.quadrature,
        )?;
        this.check("I2", &source_norm, source_norm.rel_error());
        // |T|² does not depend on (t_c,φ_c)
        let template_norm = quadrature::integrate(
            |f| {
                Ok::<_, crate::Error>(Complex64::from(
                    this.template.strain(f, 0f64, 0f64).norm_sqr() / noise::psd(f),
                ))
            },
            bands.template.low,
            bands.template.high,
            &config.quadrature,
        )?;
        this.check("I3", &template_norm, template_norm.rel_error());
        this.normalization = (source_norm.value.re * template_norm.value.re).sqrt();
        log::debug!(
            "overlap norms: I2={:.6e} ({} subintervals), I3={:.6e} ({} subintervals)",
            source_norm.value.re,
            source_norm.subintervals,
            template_norm.value.re,
            template_norm.subintervals
        );
        this.source_norm = source_norm;
        this.template_norm = template_norm;
        Ok(this)
    }
    fn check(&self, name: &str, quadrature: &Quadrature, rel_error: f64) {
        if !quadrature.converged || rel_error > self.config.warn_tolerance {
            self.warnings.fetch_add(1, Ordering::Relaxed);
            log::warn!(
                "{name} integration error {rel_error:.3e} above {:.0e} ({} subintervals, converged: {})",
                self.config.warn_tolerance,
                quadrature.subintervals,
                quadrature.converged
            );
        }
    }
    /// Lensed source signal S(f)
    pub fn source_signal(&self, f: f64) -> Result<Complex64> {
        Ok(self.source.strain(f, self.t0, self.phi0) * self.lens.amplification(f)?)
    }
    /// Template signal T(f)
    pub fn template_signal(&self, f: f64, t_c: f64, phi_c: f64) -> Complex64 {
        self.template.strain(f, t_c, phi_c)
    }
    /// Overlap with its error estimate
    pub fn evaluate(&self, t_c: f64, phi_c: f64) -> Result<OverlapValue> {
        let options = self
            .config
            .quadrature
            .abs_tolerance(self.config.quadrature.rel_tolerance * self.normalization);
        let cross = quadrature::integrate(
            |f| {
                Ok::<_, crate::Error>(
                    self.source_signal(f)? * self.template_signal(f, t_c, phi_c).conj()
                        / noise::psd(f),
                )
            },
            self.bands.cross.low,
            self.bands.cross.high,
            &options,
        )?;
        let abs_error = cross.abs_error / self.normalization;
        self.check("I1", &cross, abs_error);
        Ok(OverlapValue {
            overlap: cross.value.re / self.normalization,
            abs_error,
            converged: cross.converged,
        })
    }
    /// Overlap at the template merger time `t_c` and phase `phi_c`
    pub fn overlap(&self, t_c: f64, phi_c: f64) -> Result<f64> {
        self.evaluate(t_c, phi_c).map(|value| value.overlap)
    }
    /// Negated overlap, the optimizer cost
    pub fn cost(&self, t_c: f64, phi_c: f64) -> Result<f64> {
        self.overlap(t_c, phi_c).map(|overlap| -overlap)
    }
    /// Number of integrals whose error exceeded the warning tolerance
    pub fn warnings(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }
    /// Source and template norms (I2,I3)
    pub fn norms(&self) -> (&Quadrature, &Quadrature) {
        (&self.source_norm, &self.template_norm)
    }
    /// Optimal signal to noise ratio of the lensed source √(4Re(I2))
    pub fn source_snr(&self) -> f64 {
        (4f64 * self.source_norm.value.re).sqrt()
    }
    /// Optimal signal to noise ratio of the template √(4Re(I3))
    pub fn template_snr(&self) -> f64 {
        (4f64 * self.template_norm.value.re).sqrt()
    }
    pub fn bands(&self) -> &FrequencyBands {
        &self.bands
    }
    pub fn lens(&self) -> &LensModel {
        &self.lens
    }
    pub fn config(&self) -> &OverlapConfig {
        &self.config
    }
    /// Source merger time and phase (t0,φ0)
    pub fn source_merger(&self) -> (f64, f64) {
        (self.t0, self.phi0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lensing::PointMassLens,
        params::{BinaryParameters, LensParameters},
        Error, SOLAR_MASS,
    };
    use std::f64::consts::PI;

    fn unlensed() -> OverlapIntegral {
        let source = SourceParameters::new(BinaryParameters::default());
        OverlapIntegral::new(
            &source,
            &TemplateParameters::matching(&source),
            Default::default(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn empty_band() {
        assert_eq!(
            FrequencyBand::new(20f64, 20f64),
            Err(DomainError::EmptyBand {
                low: 20f64,
                high: 20f64
            })
        );
        // ISCO below 20Hz
        let heavy = BinaryParameters::default().with_chirp_mass(200f64 * SOLAR_MASS);
        let source = SourceParameters::new(heavy);
        assert!(matches!(
            OverlapIntegral::new(
                &source,
                &TemplateParameters::matching(&source),
                Default::default(),
                None
            ),
            Err(Error::Domain(DomainError::EmptyBand { .. }))
        ));
    }

    #[test]
    fn cross_term_cutoff() {
        let bands = FrequencyBands::new(20f64, 90f64, 120f64, CrossTermCutoff::Template).unwrap();
        assert_eq!(bands.cross.high, 120f64);
        assert_eq!(bands.source.high, 90f64);
        let bands = FrequencyBands::new(20f64, 90f64, 120f64, CrossTermCutoff::Minimum).unwrap();
        assert_eq!(bands.cross.high, 90f64);
        assert_eq!("min".parse::<CrossTermCutoff>().unwrap(), CrossTermCutoff::Minimum);
    }

    #[test]
    fn identity_at_the_source_merger() {
        let integral = unlensed();
        let value = integral.evaluate(0f64, 0f64).unwrap();
        assert!((value.overlap - 1f64).abs() < 1e-12, "{value:?}");
        assert!(value.converged);
        assert_eq!(integral.warnings(), 0);
    }

    #[test]
    fn mismatched_merger_time_and_phase() {
        let integral = unlensed();
        let overlap = integral.overlap(0.05, 0.3).unwrap();
        assert!(overlap < 1f64 - 1e-3 && overlap > -1f64, "{overlap}");
        assert!((integral.overlap(0f64, PI).unwrap() + 1f64).abs() < 1e-9);
    }

    #[test]
    fn merger_phase_periodicity() {
        let integral = unlensed();
        for phi_c in [-2.5, 0.4, 1.9] {
            let a = integral.overlap(0.01, phi_c).unwrap();
            let b = integral.overlap(0.01, phi_c + 2f64 * PI).unwrap();
            assert!((a - b).abs() < 1e-7, "{a} vs {b}");
        }
    }

    #[test]
    fn cost_is_the_negated_overlap() {
        let integral = unlensed();
        assert_eq!(
            integral.cost(0.02, -1f64).unwrap(),
            -integral.overlap(0.02, -1f64).unwrap()
        );
    }

    #[test]
    fn lensing_degrades_the_overlap() {
        let source = SourceParameters::default().with_lens(LensParameters::PointMass {
            mass: 1e3 * SOLAR_MASS,
            y: 1f64,
        });
        let integral = OverlapIntegral::new(
            &source,
            &TemplateParameters::matching(&source),
            Default::default(),
            None,
        )
        .unwrap();
        assert!(matches!(
            integral.lens(),
            LensModel::PointMass(PointMassLens::GeometricOptics(_))
        ));
        let overlap = integral.overlap(0f64, 0f64).unwrap();
        assert!(overlap < 1f64 && overlap > 0f64, "{overlap}");
        let unlensed = unlensed();
        assert_ne!(integral.source_snr(), unlensed.source_snr());
        assert_eq!(integral.template_snr(), unlensed.template_snr());
    }

    #[test]
    fn lens_follows_the_source_parameters() {
        let source = SourceParameters::default();
        let template = TemplateParameters::matching(&source);
        let lensed = OverlapIntegral::new(&source, &template, Default::default(), None).unwrap();
        assert!(!lensed.lens().is_unlensed());
        assert!(lensed.overlap(0f64, 0f64).unwrap() < 1f64 - 1e-3);
        // an explicit lens model replaces the source lens
        let unlensed_model = OverlapIntegral::with_lens_model(
            &source,
            &template,
            LensModel::default(),
            Default::default(),
        )
        .unwrap();
        assert!(unlensed_model.lens().is_unlensed());
        assert_eq!(unlensed_model.source_snr(), unlensed().source_snr());
        // a SIE lensed source needs its table
        let sie = source.with_radius(0.5);
        assert!(matches!(
            OverlapIntegral::new(&sie, &template, Default::default(), None),
            Err(Error::Lookup(_))
        ));
    }

    #[test]
    fn snr_of_the_reference_binary() {
        let snr = unlensed().source_snr();
        assert!((snr - 16.09).abs() < 0.01, "{snr}");
    }
}
