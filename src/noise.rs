//! Advanced LIGO noise power spectral density (arXiv:0903.0338)

/// Seismic wall [Hz]: no sensitivity below
pub const SEISMIC_CUTOFF: f64 = 20f64;
/// PSD scale [1/Hz]
pub const S0: f64 = 1e-49;
/// PSD reference frequency [Hz]
pub const F0: f64 = 215f64;

/// One-sided noise power spectral density Sn(f) [1/Hz]
///
/// Returns `f64::INFINITY` below [`SEISMIC_CUTOFF`]; the overlap integrals never
/// reach below the cutoff as their lower limit is the cutoff itself.
pub fn psd(f: f64) -> f64 {
    if f < SEISMIC_CUTOFF {
        return f64::INFINITY;
    }
    let x = f / F0;
    let x2 = x * x;
    let shape = x.powf(-4.14) - 5f64 / x2 + 111f64 * (1f64 - x2 + 0.5 * x2 * x2) / (1f64 + 0.5 * x2);
    shape * S0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_seismic_wall() {
        assert_eq!(psd(0f64), f64::INFINITY);
        assert_eq!(psd(19.999), f64::INFINITY);
    }

    #[test]
    fn finite_and_positive() {
        for k in 0..2000 {
            let f = SEISMIC_CUTOFF + k as f64;
            let sn = psd(f);
            assert!(sn.is_finite() && sn > 0f64, "Sn({f})={sn}");
        }
    }

    #[test]
    fn bucket_near_f0() {
        let (f_min, _) = (200..=10_000)
            .map(|k| k as f64 * 0.1)
            .map(|f| (f, psd(f)))
            .fold((0f64, f64::INFINITY), |(fm, sm), (f, s)| {
                if s < sm {
                    (f, s)
                } else {
                    (fm, sm)
                }
            });
        assert!(f_min > 180f64 && f_min < 260f64, "minimum at {f_min}Hz");
    }
}
