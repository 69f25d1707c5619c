//! Frequency domain inspiral strain
//!
//! Restricted 1PN stationary phase approximation (Cutler & Flanagan 1994) seen by
//! a single interferometer, the antenna pattern modulates the amplitude and
//! shifts the phase of the signal.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::params::{BinaryParameters, DomainError};

/// Total mass M = Mc/η^(3/5) [s]
pub fn total_mass(chirp_mass: f64, eta: f64) -> f64 {
    chirp_mass / eta.powf(0.6)
}

/// Innermost stable circular orbit frequency 1/(6^(3/2)πM) [Hz]
///
/// The waveform is not physical above this frequency
pub fn isco_frequency(chirp_mass: f64, eta: f64) -> f64 {
    1f64 / (6f64.powf(1.5) * PI * total_mass(chirp_mass, eta))
}

/// Inner product of the line of sight with the orbital angular momentum
pub fn l_dot_n(theta_s: f64, phi_s: f64, theta_l: f64, phi_l: f64) -> f64 {
    theta_s.cos() * theta_l.cos() + theta_s.sin() * theta_l.sin() * (phi_s - phi_l).cos()
}

/// Polarization angle ψs in (-π, π]
pub fn polarization_angle(theta_s: f64, phi_s: f64, theta_l: f64, phi_l: f64) -> f64 {
    let numerator = theta_l.cos() - theta_s.cos() * l_dot_n(theta_s, phi_s, theta_l, phi_l);
    let denominator = theta_s.sin() * theta_l.sin() * (phi_l - phi_s).sin();
    numerator.atan2(denominator)
}

/// Newtonian amplitude √(5/96) π^(-2/3) Mc^(5/6) / D
pub fn amplitude(chirp_mass: f64, distance: f64) -> f64 {
    (5f64 / 96f64).sqrt() * PI.powf(-2f64 / 3f64) * chirp_mass.powf(5f64 / 6f64) / distance
}

/// 1PN stationary phase ψ(f) [rd]
pub fn spa_phase(f: f64, t_c: f64, phi_c: f64, chirp_mass: f64, eta: f64) -> f64 {
    let pi_m_f = PI * total_mass(chirp_mass, eta) * f;
    let newtonian = 0.75 * (8f64 * PI * chirp_mass * f).powf(-5f64 / 3f64);
    let post_newtonian = 1f64
        + 20f64 / 9f64 * (743f64 / 336f64 + 11f64 / 4f64 * eta) * pi_m_f.powf(2f64 / 3f64)
        - 16f64 * PI * pi_m_f;
    2f64 * PI * f * t_c - phi_c - PI / 4f64 + newtonian * post_newtonian
}

/// Detector response to a binary with a given sky location and orbit orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AntennaPattern {
    /// line of sight and angular momentum inner product
    pub l_dot_n: f64,
    /// polarization angle [rd]
    pub psi_s: f64,
    /// plus polarization pattern
    pub f_plus: f64,
    /// cross polarization pattern
    pub f_cross: f64,
}
impl AntennaPattern {
    pub fn new(theta_s: f64, phi_s: f64, theta_l: f64, phi_l: f64) -> Self {
        let psi_s = polarization_angle(theta_s, phi_s, theta_l, phi_l);
        let (sin_2psi, cos_2psi) = (2f64 * psi_s).sin_cos();
        let (sin_2phi, cos_2phi) = (2f64 * phi_s).sin_cos();
        let cos_theta = theta_s.cos();
        let half_one_cos2 = 0.5 * (1f64 + cos_theta * cos_theta);
        Self {
            l_dot_n: l_dot_n(theta_s, phi_s, theta_l, phi_l),
            psi_s,
            f_plus: half_one_cos2 * cos_2phi * cos_2psi - cos_theta * sin_2phi * sin_2psi,
            f_cross: half_one_cos2 * cos_2phi * sin_2psi + cos_theta * sin_2phi * cos_2psi,
        }
    }
    pub fn from_binary(binary: &BinaryParameters) -> Self {
        Self::new(binary.theta_s, binary.phi_s, binary.theta_l, binary.phi_l)
    }
    fn components(&self) -> (f64, f64) {
        (
            2f64 * self.l_dot_n * self.f_cross,
            (1f64 + self.l_dot_n * self.l_dot_n) * self.f_plus,
        )
    }
    /// Polarization amplitude Λ
    pub fn polarization_amplitude(&self) -> f64 {
        let (cross, plus) = self.components();
        cross.hypot(plus)
    }
    /// Polarization phase φp [rd]
    pub fn polarization_phase(&self) -> f64 {
        let (cross, plus) = self.components();
        cross.atan2(plus)
    }
}

/// Strain of a binary with merger time `t_c` and phase `phi_c` at frequency `f`
pub fn strain(f: f64, binary: &BinaryParameters, t_c: f64, phi_c: f64) -> Complex64 {
    Waveform::from_binary(binary).strain(f, t_c, phi_c)
}

/// Strain model of a given binary
///
/// Everything that does not depend on the frequency nor on the merger time and
/// phase is computed once.
#[derive(Debug, Clone)]
pub struct Waveform {
    binary: BinaryParameters,
    pattern: AntennaPattern,
    // Λ exp(-iφp) A
    prefactor: Complex64,
    // (3/4)(8πMc)^(-5/3)
    newtonian: f64,
    // πM
    pi_m: f64,
    // (20/9)(743/336 + 11η/4)
    pn_1: f64,
    cutoff: f64,
}
impl Waveform {
    /// Validates the binary and builds its waveform
    pub fn new(binary: &BinaryParameters) -> Result<Self, DomainError> {
        binary.validate()?;
        Ok(Self::from_binary(binary))
    }
    fn from_binary(binary: &BinaryParameters) -> Self {
        let pattern = AntennaPattern::from_binary(binary);
        let prefactor = Complex64::from_polar(
            pattern.polarization_amplitude() * amplitude(binary.chirp_mass, binary.distance),
            -pattern.polarization_phase(),
        );
        let m = total_mass(binary.chirp_mass, binary.eta);
        Self {
            binary: *binary,
            pattern,
            prefactor,
            newtonian: 0.75 * (8f64 * PI * binary.chirp_mass).powf(-5f64 / 3f64),
            pi_m: PI * m,
            pn_1: 20f64 / 9f64 * (743f64 / 336f64 + 11f64 / 4f64 * binary.eta),
            cutoff: isco_frequency(binary.chirp_mass, binary.eta),
        }
    }
    pub fn binary(&self) -> &BinaryParameters {
        &self.binary
    }
    pub fn antenna_pattern(&self) -> &AntennaPattern {
        &self.pattern
    }
    /// ISCO frequency [Hz]
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }
    /// Stationary phase ψ(f) [rd]
    pub fn phase(&self, f: f64, t_c: f64, phi_c: f64) -> f64 {
        let x = self.pi_m * f;
        let post_newtonian = 1f64 + self.pn_1 * x.powf(2f64 / 3f64) - 16f64 * PI * x;
        2f64 * PI * f * t_c - phi_c - PI / 4f64
            + self.newtonian * f.powf(-5f64 / 3f64) * post_newtonian
    }
    /// Strain amplitude |h(f)|
    pub fn amplitude(&self, f: f64) -> f64 {
        self.prefactor.norm() * f.powf(-7f64 / 6f64)
    }
    /// Complex strain h(f)
    pub fn strain(&self, f: f64, t_c: f64, phi_c: f64) -> Complex64 {
        self.prefactor * f.powf(-7f64 / 6f64) * Complex64::from_polar(1f64, self.phase(f, t_c, phi_c))
    }
}
