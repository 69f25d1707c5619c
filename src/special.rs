//! Complex special functions for the point mass wave optics amplification

use std::f64::consts::{FRAC_PI_2, PI};

use num_complex::Complex64;

/// Default term budget of the confluent hypergeometric series
pub const HYP1F1_MAX_TERMS: usize = 1_000_000;
/// Largest relative error of a series sum, from cancellation between its terms
pub const CANCELLATION_TOLERANCE: f64 = 1e-6;
/// Smallest |z| of the 1F1 large argument expansion
pub const ASYMPTOTIC_ARGUMENT: f64 = 10f64;
/// Relative error below which the 1F1 large argument expansion is used instead of the series
pub const ASYMPTOTIC_TOLERANCE: f64 = 1e-10;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SpecialFunctionError {
    #[error("1F1 series did not converge after {terms} terms (partial sum: {partial_sum})")]
    NumericDivergence { terms: usize, partial_sum: Complex64 },
    #[error(
        "1F1 series lost its precision to cancellation (sum: {partial_sum}, largest term: {max_term:e})"
    )]
    PrecisionLoss { partial_sum: Complex64, max_term: f64 },
    #[error("1F1 is not defined for b={0}")]
    Pole(Complex64),
}
type Result<T> = std::result::Result<T, SpecialFunctionError>;

// Lanczos approximation g=7, n=9
const LANCZOS_G: f64 = 7f64;
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_13,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

// ln(sin(πz)) up to a multiple of 2πi, sin(πz) overflows for large |Im(z)|
fn ln_sin_pi(z: Complex64) -> Complex64 {
    let i = Complex64::i();
    if z.im.abs() < 20f64 {
        (PI * z).sin().ln()
    } else if z.im > 0f64 {
        -i * PI * z + (((2f64 * i * PI * z).exp() - 1f64) / (2f64 * i)).ln()
    } else {
        i * PI * z + ((1f64 - (-2f64 * i * PI * z).exp()) / (2f64 * i)).ln()
    }
}

/// Logarithm of the gamma function, up to a multiple of 2πi
///
/// Lanczos approximation, with the reflection formula for Re(z)<1/2
pub fn ln_gamma(z: Complex64) -> Complex64 {
    if z.re < 0.5 {
        return PI.ln() - ln_sin_pi(z) - ln_gamma(1f64 - z);
    }
    let z = z - 1f64;
    let x = LANCZOS
        .iter()
        .enumerate()
        .skip(1)
        .fold(Complex64::from(LANCZOS[0]), |x, (i, &c)| x + c / (z + i as f64));
    let t = z + LANCZOS_G + 0.5;
    0.5 * (2f64 * PI).ln() + (z + 0.5) * t.ln() - t + x.ln()
}

/// Gamma function
pub fn gamma(z: Complex64) -> Complex64 {
    ln_gamma(z).exp()
}

/// Kummer confluent hypergeometric function 1F1(a;b;z)
///
/// See [`scaled_hyp1f1`].
pub fn hyp1f1(a: Complex64, b: Complex64, z: Complex64, max_terms: usize) -> Result<Complex64> {
    scaled_hyp1f1(Complex64::default(), a, b, z, max_terms)
}

/// Scaled Kummer confluent hypergeometric function exp(ln_scale) 1F1(a;b;z)
///
/// For |z| ≥ [`ASYMPTOTIC_ARGUMENT`], the large argument expansion (DLMF 13.7.2)
/// is used if its truncation error is below [`ASYMPTOTIC_TOLERANCE`].
/// Both parts of the expansion are combined with `ln_scale` in logarithm, so that
/// a scale and a function value that would overflow separately do not.
/// Otherwise the Kummer series is summed until the terms no longer contribute to
/// the sum, adding at most `max_terms` terms.
/// If the series loses its precision, the expansion is still used when its error
/// is below [`CANCELLATION_TOLERANCE`].
pub fn scaled_hyp1f1(
    ln_scale: Complex64,
    a: Complex64,
    b: Complex64,
    z: Complex64,
    max_terms: usize,
) -> Result<Complex64> {
    if b.im == 0f64 && b.re <= 0f64 && b.re.fract() == 0f64 {
        return Err(SpecialFunctionError::Pole(b));
    }
    let expansion = if z.norm() >= ASYMPTOTIC_ARGUMENT {
        Some(asymptotic(ln_scale, a, b, z, max_terms)).filter(|(value, _)| value.is_finite())
    } else {
        None
    };
    if let Some((value, error)) = expansion {
        if error <= ASYMPTOTIC_TOLERANCE * value.norm() {
            log::trace!("1F1({a};{b};{z}) from its large argument expansion (error: {error:.3e})");
            return Ok(value);
        }
    }
    match kummer_series(a, b, z, max_terms) {
        Ok(sum) if ln_scale == Complex64::default() || sum == Complex64::default() => Ok(sum),
        Ok(sum) => Ok((ln_scale + sum.ln()).exp()),
        Err(e) => match expansion {
            Some((value, error)) if error <= CANCELLATION_TOLERANCE * value.norm() => Ok(value),
            _ => Err(e),
        },
    }
}

fn kummer_series(a: Complex64, b: Complex64, z: Complex64, max_terms: usize) -> Result<Complex64> {
    let z_norm = z.norm();
    let mut term = Complex64::from(1f64);
    let mut sum = term;
    let mut max_term = 1f64;
    for n in 0..max_terms {
        let k = n as f64;
        term *= (a + k) / ((b + k) * (k + 1f64)) * z;
        sum += term;
        let term_norm = term.norm();
        max_term = max_term.max(term_norm);
        if !sum.is_finite() {
            return Err(SpecialFunctionError::NumericDivergence {
                terms: n + 1,
                partial_sum: sum,
            });
        }
        if term_norm <= f64::EPSILON * sum.norm() && k + 1f64 > z_norm {
            if max_term * f64::EPSILON > CANCELLATION_TOLERANCE * sum.norm() {
                return Err(SpecialFunctionError::PrecisionLoss {
                    partial_sum: sum,
                    max_term,
                });
            }
            log::trace!("1F1({a};{b};{z}) converged in {} terms", n + 1);
            return Ok(sum);
        }
    }
    Err(SpecialFunctionError::NumericDivergence {
        terms: max_terms,
        partial_sum: sum,
    })
}

/// Large |z| expansion of exp(ln_scale) 1F1(a;b;z) and its absolute error
///
/// Γ(b)⁻¹ 1F1(a;b;z) ~ exp(z) z^(a-b)/Γ(a) Σ (1-a)ₛ(b-a)ₛ/s! z⁻ˢ
///                   + exp(±iπa) z^(-a)/Γ(b-a) Σ (a)ₛ(a-b+1)ₛ/s! (-z)⁻ˢ
/// with + for -π/2 < arg(z) ≤ π.
fn asymptotic(
    ln_scale: Complex64,
    a: Complex64,
    b: Complex64,
    z: Complex64,
    max_terms: usize,
) -> (Complex64, f64) {
    let sign = if z.arg() > -FRAC_PI_2 { 1f64 } else { -1f64 };
    let ln_z = z.ln();
    let ln_scale = ln_scale + ln_gamma(b);
    let (first_sum, first_error) = truncated_sum(1f64 - a, b - a, 1f64 / z, max_terms);
    let (second_sum, second_error) = truncated_sum(a, a - b + 1f64, -1f64 / z, max_terms);
    let first = (ln_scale + z + (a - b) * ln_z - ln_gamma(a)).exp();
    let second =
        (ln_scale + sign * Complex64::i() * PI * a - a * ln_z - ln_gamma(b - a)).exp();
    (
        first * first_sum + second * second_sum,
        first.norm() * first_error + second.norm() * second_error,
    )
}

// Σ (p)ₛ(q)ₛ xˢ/s! truncated at its smallest term, with the magnitude of that term
fn truncated_sum(p: Complex64, q: Complex64, x: Complex64, max_terms: usize) -> (Complex64, f64) {
    let mut term = Complex64::from(1f64);
    let mut sum = term;
    let mut smallest = 1f64;
    for n in 0..max_terms {
        let k = n as f64;
        term *= (p + k) * (q + k) / (k + 1f64) * x;
        let term_norm = term.norm();
        if term_norm > smallest {
            break;
        }
        sum += term;
        smallest = term_norm;
        if term_norm <= f64::EPSILON * sum.norm() {
            break;
        }
    }
    (sum, smallest)
}
