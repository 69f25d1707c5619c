use std::{f64::consts::PI, io::Write};

use gw_lens_overlap::{
    lensing::{Amplification, LensModel, LookupPolicy, SieTable},
    maximize_overlap, run_one, AnnealingConfig, BinaryParameters, Bounds, LensParameters,
    OverlapConfig, OverlapIntegral, SourceParameters, SweepConfig, TemplateParameters,
    SOLAR_MASS,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn integral(source: &SourceParameters) -> OverlapIntegral {
    OverlapIntegral::new(
        source,
        &TemplateParameters::matching(source),
        OverlapConfig::default(),
        None,
    )
    .unwrap()
}

#[test]
fn reference_scenario() {
    // Mc=18.79M_sun, D=1.58Gpc, M_lz=5e5M_sun, y=0.8
    let source = SourceParameters::default();
    let config = SweepConfig::default().annealing(
        AnnealingConfig::default()
            .seed(42)
            .max_iters(150)
            .stall_best(100)
            .polish_iters(60),
    );
    let result = run_one(
        &source,
        &TemplateParameters::matching(&source),
        &Bounds::default(),
        &config,
        None,
    )
    .unwrap();
    assert!(result.overlap.is_finite());
    // the template matches the first image, the second image power is lost
    assert!(result.overlap > 0.85 && result.overlap < 1f64 - 1e-3, "{result:?}");
    assert!(Bounds::default().t_c.contains(result.t_c));
    assert!(Bounds::default().phi_c.contains(result.phi_c));
}

#[test]
fn unlensed_round_trip() {
    let mut rng = StdRng::seed_from_u64(1234);
    for _ in 0..10 {
        let binary = BinaryParameters::default()
            .with_sky(rng.gen_range(0.1..PI), rng.gen_range(0f64..2f64 * PI))
            .with_orbit(rng.gen_range(0.1..PI), rng.gen_range(0f64..2f64 * PI))
            .with_chirp_mass(rng.gen_range(5f64..25f64) * SOLAR_MASS)
            .with_eta(rng.gen_range(0.1..=0.25));
        let (t0, phi0) = (rng.gen_range(-0.1..0.1), rng.gen_range(-PI..PI));
        let source = SourceParameters::new(binary).with_merger(t0, phi0);
        let overlap = integral(&source).overlap(t0, phi0).unwrap();
        assert!((overlap - 1f64).abs() < 1e-6, "{binary:?}: {overlap}");
    }
}

#[test]
fn identical_parameters_are_matched() {
    let source = SourceParameters::new(BinaryParameters::default()).with_merger(-0.031, 2.4);
    let best = maximize_overlap(
        &integral(&source),
        &Bounds::default(),
        &AnnealingConfig::default().seed(11),
    )
    .unwrap();
    assert!((best.overlap - 1f64).abs() < 1e-3, "{best:?}");
}

#[test]
fn wave_optics_phase_periodicity() {
    let source = SourceParameters::default().with_lens(LensParameters::PointMass {
        mass: 20f64 * SOLAR_MASS,
        y: 0.5,
    });
    let integral = integral(&source);
    assert!(matches!(integral.lens(), LensModel::PointMass(_)));
    for (t_c, phi_c) in [(0f64, 0.3), (0.004, -2.9)] {
        let a = integral.overlap(t_c, phi_c).unwrap();
        let b = integral.overlap(t_c, phi_c + 2f64 * PI).unwrap();
        let c = integral.overlap(t_c, phi_c - 2f64 * PI).unwrap();
        assert!((a - b).abs() < 1e-7 && (a - c).abs() < 1e-7, "{a} {b} {c}");
        assert!(a.abs() <= 1f64);
    }
}

#[test]
fn sie_far_from_the_lens() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "source_x,mu_1,mu_2,td_1,td_2").unwrap();
    writeln!(file, "0.1,3.2,-1.9,0.0,0.004").unwrap();
    writeln!(file, "0.5,1.4,-0.3,0.0,0.012").unwrap();
    writeln!(file, "10.0,1.0,0.0,0.0,0.2").unwrap();
    file.flush().unwrap();
    let table = SieTable::from_path(file.path()).unwrap();

    let config = OverlapConfig::default();
    let far = SourceParameters::new(BinaryParameters::default()).with_radius(10f64);
    let integral =
        OverlapIntegral::new(&far, &TemplateParameters::matching(&far), config, Some(&table))
            .unwrap();
    assert_eq!(integral.lens().amplification(50f64).unwrap().norm(), 1f64);
    let overlap = integral.overlap(0f64, 0f64).unwrap();
    assert!((overlap - 1f64).abs() < 1e-9);

    let near = far.with_radius(0.3);
    assert!(LensModel::new(&near.lens, &config.lensing, Some(&table)).is_err());
    let config = config.lensing(config.lensing.lookup(LookupPolicy::Linear));
    let overlap =
        OverlapIntegral::new(&near, &TemplateParameters::matching(&near), config, Some(&table))
            .unwrap()
            .overlap(0f64, 0f64)
            .unwrap();
    assert!(overlap < 1f64 && overlap > 0f64, "{overlap}");
}
