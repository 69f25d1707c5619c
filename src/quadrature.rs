//! Adaptive Gauss-Kronrod quadrature of complex integrands
//!
//! The interval with the largest error estimate is bisected until the total
//! error estimate meets the requested tolerance or the subinterval budget is
//! spent (QUADPACK QAG with the 15 points rule).

use std::{cmp::Ordering, collections::BinaryHeap};

use num_complex::Complex64;

// Kronrod abscissae, the odd ones are the Gauss abscissae
const XGK: [f64; 8] = [
    0.991_455_371_120_812_639_206_854_697_526_329,
    0.949_107_912_342_758_524_526_189_684_047_851,
    0.864_864_423_359_769_072_789_712_788_640_926,
    0.741_531_185_599_394_439_863_864_773_280_788,
    0.586_087_235_467_691_130_294_144_845_693_013,
    0.405_845_151_377_397_166_906_606_412_076_961,
    0.207_784_955_007_898_467_600_689_403_773_245,
    0f64,
];
const WGK: [f64; 8] = [
    0.022_935_322_010_529_224_963_732_008_058_970,
    0.063_092_092_629_978_553_290_700_663_189_204,
    0.104_790_010_322_250_183_839_876_322_541_518,
    0.140_653_259_715_525_918_745_189_590_510_238,
    0.169_004_726_639_267_902_826_583_426_598_550,
    0.190_350_578_064_785_409_913_256_402_421_014,
    0.204_432_940_075_298_892_414_161_999_234_649,
    0.209_482_141_084_727_828_012_999_174_891_714,
];
const WG: [f64; 4] = [
    0.129_484_966_168_869_693_270_611_432_679_082,
    0.279_705_391_489_276_667_901_467_771_423_780,
    0.381_830_050_505_118_944_950_369_775_488_975,
    0.417_959_183_673_469_387_755_102_040_816_327,
];

/// Quadrature tolerances and subdivision budget
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadratureOptions {
    pub abs_tolerance: f64,
    pub rel_tolerance: f64,
    pub max_subintervals: usize,
}
impl Default for QuadratureOptions {
    fn default() -> Self {
        Self {
            abs_tolerance: 1.49e-8,
            rel_tolerance: 1.49e-8,
            max_subintervals: 4096,
        }
    }
}
impl QuadratureOptions {
    pub fn abs_tolerance(self, abs_tolerance: f64) -> Self {
        Self {
            abs_tolerance,
            ..self
        }
    }
    pub fn rel_tolerance(self, rel_tolerance: f64) -> Self {
        Self {
            rel_tolerance,
            ..self
        }
    }
    pub fn max_subintervals(self, max_subintervals: usize) -> Self {
        Self {
            max_subintervals: max_subintervals.max(1),
            ..self
        }
    }
}

/// Integral estimate
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quadrature {
    pub value: Complex64,
    /// absolute error estimate
    pub abs_error: f64,
    pub subintervals: usize,
    /// # of integrand evaluations
    pub evaluations: usize,
    /// whether the error estimate meets the tolerance
    pub converged: bool,
}
impl Quadrature {
    pub fn rel_error(&self) -> f64 {
        self.abs_error / self.value.norm()
    }
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: f64,
    b: f64,
    value: Complex64,
    error: f64,
}
impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.error.total_cmp(&other.error) == Ordering::Equal
    }
}
impl Eq for Segment {}
impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.error.total_cmp(&other.error)
    }
}

/// 15 points Gauss-Kronrod rule on [a,b]
fn kronrod<F, E>(f: &F, a: f64, b: f64) -> Result<Segment, E>
where
    F: Fn(f64) -> Result<Complex64, E>,
{
    let center = 0.5 * (a + b);
    let half_length = 0.5 * (b - a);
    let f_center = f(center)?;
    let mut res_kronrod = f_center * WGK[7];
    let mut res_gauss = f_center * WG[3];
    let mut f_values = [(Complex64::default(), Complex64::default()); 7];
    for (j, &x) in XGK.iter().take(7).enumerate() {
        let dx = half_length * x;
        let (f1, f2) = (f(center - dx)?, f(center + dx)?);
        res_kronrod += (f1 + f2) * WGK[j];
        if j % 2 == 1 {
            res_gauss += (f1 + f2) * WG[j / 2];
        }
        f_values[j] = (f1, f2);
    }
    let mean = res_kronrod * 0.5;
    let res_asc = f_values
        .iter()
        .zip(WGK.iter())
        .map(|((f1, f2), w)| w * ((f1 - mean).norm() + (f2 - mean).norm()))
        .sum::<f64>()
        + WGK[7] * (f_center - mean).norm();
    let res_abs = f_values
        .iter()
        .zip(WGK.iter())
        .map(|((f1, f2), w)| w * (f1.norm() + f2.norm()))
        .sum::<f64>()
        + WGK[7] * f_center.norm();
    let res_asc = res_asc * half_length.abs();
    let res_abs = res_abs * half_length.abs();
    let mut error = ((res_kronrod - res_gauss) * half_length).norm();
    if res_asc != 0f64 && error != 0f64 {
        error = res_asc * (200f64 * error / res_asc).powf(1.5).min(1f64);
    }
    if res_abs > f64::MIN_POSITIVE / (50f64 * f64::EPSILON) {
        error = error.max(50f64 * f64::EPSILON * res_abs);
    }
    Ok(Segment {
        a,
        b,
        value: res_kronrod * half_length,
        error,
    })
}

/// Integrates `f` over [a,b]
///
/// An integrand error aborts the integration and is returned as is.
/// An empty or reversed interval integrates to zero.
pub fn integrate<F, E>(f: F, a: f64, b: f64, options: &QuadratureOptions) -> Result<Quadrature, E>
where
    F: Fn(f64) -> Result<Complex64, E>,
{
    if !(b > a) {
        return Ok(Quadrature {
            value: Complex64::default(),
            abs_error: 0f64,
            subintervals: 0,
            evaluations: 0,
            converged: true,
        });
    }
    let first = kronrod(&f, a, b)?;
    let mut value = first.value;
    let mut error = first.error;
    let mut evaluations = 15;
    let mut heap = BinaryHeap::with_capacity(options.max_subintervals);
    heap.push(first);
    let tolerance = |value: Complex64| options.abs_tolerance.max(options.rel_tolerance * value.norm());
    while error > tolerance(value) && heap.len() < options.max_subintervals {
        let Some(worst) = heap.pop() else {
            break;
        };
        let middle = 0.5 * (worst.a + worst.b);
        if middle <= worst.a || middle >= worst.b {
            // no room left for bisection
            heap.push(worst);
            break;
        }
        let left = kronrod(&f, worst.a, middle)?;
        let right = kronrod(&f, middle, worst.b)?;
        evaluations += 30;
        value += left.value + right.value - worst.value;
        error += left.error + right.error - worst.error;
        heap.push(left);
        heap.push(right);
    }
    // re-sum to shed the round-off of the running updates
    let value = heap.iter().map(|s| s.value).sum::<Complex64>();
    let error = heap.iter().map(|s| s.error).sum::<f64>();
    Ok(Quadrature {
        value,
        abs_error: error,
        subintervals: heap.len(),
        evaluations,
        converged: error <= tolerance(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{convert::Infallible, f64::consts::PI};

    fn real<G: Fn(f64) -> f64>(g: G) -> impl Fn(f64) -> Result<Complex64, Infallible> {
        move |x| Ok(Complex64::from(g(x)))
    }

    #[test]
    fn polynomial_is_exact() {
        let q = integrate(real(|x| 3f64 * x * x - x + 2f64), -1f64, 2f64, &Default::default())
            .unwrap();
        assert!((q.value.re - 13.5).abs() < 1e-12);
        assert_eq!(q.subintervals, 1);
        assert!(q.converged);
    }

    #[test]
    fn oscillatory_complex_integrand() {
        // ∫_0^10 exp(i 2π 3.3 x) dx
        let k = 2f64 * PI * 3.3;
        let f = |x: f64| Ok::<_, Infallible>(Complex64::from_polar(1f64, k * x));
        let q = integrate(f, 0f64, 10f64, &Default::default()).unwrap();
        let expected = (Complex64::from_polar(1f64, k * 10f64) - 1f64) / Complex64::new(0f64, k);
        assert!((q.value - expected).norm() < 1e-9, "{} vs {}", q.value, expected);
        assert!(q.converged);
        assert!(q.subintervals > 1);
    }

    #[test]
    fn power_law_like_the_strain() {
        // ∫_20^100 f^(-7/3) df
        let options = QuadratureOptions::default()
            .abs_tolerance(0f64)
            .rel_tolerance(1e-12);
        let q = integrate(real(|f| f.powf(-7f64 / 3f64)), 20f64, 100f64, &options).unwrap();
        let expected = 0.75 * (20f64.powf(-4f64 / 3f64) - 100f64.powf(-4f64 / 3f64));
        assert!(((q.value.re - expected) / expected).abs() < 1e-10);
        assert!(q.converged);
    }

    #[test]
    fn empty_interval() {
        let q = integrate(real(|_| panic!("not evaluated")), 5f64, 5f64, &Default::default())
            .unwrap();
        assert_eq!(q.value, Complex64::default());
        let q = integrate(real(|_| panic!("not evaluated")), 5f64, 1f64, &Default::default())
            .unwrap();
        assert_eq!(q.evaluations, 0);
    }

    #[test]
    fn subinterval_budget() {
        let k = 2f64 * PI * 500f64;
        let f = |x: f64| Ok::<_, Infallible>(Complex64::from_polar(1f64, k * x));
        let options = QuadratureOptions::default().max_subintervals(4);
        let q = integrate(f, 0f64, 10f64, &options).unwrap();
        assert!(q.subintervals <= 4);
        assert!(!q.converged);
    }

    #[test]
    fn integrand_errors_propagate() {
        let f = |x: f64| {
            if x > 0.5 {
                Err("beyond")
            } else {
                Ok(Complex64::from(x))
            }
        };
        assert_eq!(integrate(f, 0f64, 1f64, &Default::default()), Err("beyond"));
    }
}
