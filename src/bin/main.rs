use std::{path::PathBuf, time::Duration};

use gw_lens_overlap::{
    lensing::{LensShape, LensingConfig, LookupPolicy, SieTable},
    maximize_overlap,
    overlap::CrossTermCutoff,
    AnnealingConfig, BinaryParameters, Bounds, LensParameters, OverlapConfig, OverlapIntegral,
    SourceParameters, TemplateParameters, GIGA_PARSEC, SOLAR_MASS,
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "lens-overlap",
    about = "Maximum overlap between a lensed gravitational wave signal and an unlensed template"
)]
struct Opt {
    /// Source redshifted chirp mass [M_sun]
    #[structopt(long, default_value = "18.79")]
    mcz: f64,
    /// Source luminosity distance [Gpc]
    #[structopt(long, default_value = "1.58")]
    distance: f64,
    /// Source symmetric mass ratio
    #[structopt(long, default_value = "0.25")]
    eta: f64,
    /// Sky location polar angle [rd]
    #[structopt(long, default_value = "0")]
    theta_s: f64,
    /// Sky location azimuth angle [rd]
    #[structopt(long, default_value = "0")]
    phi_s: f64,
    /// Orbital angular momentum polar angle [rd]
    #[structopt(long, default_value = "0")]
    theta_l: f64,
    /// Orbital angular momentum azimuth angle [rd]
    #[structopt(long, default_value = "0")]
    phi_l: f64,
    /// Source merger time [s]
    #[structopt(long, default_value = "0")]
    t0: f64,
    /// Source merger phase [rd]
    #[structopt(long, default_value = "0")]
    phi0: f64,
    /// Template chirp mass [M_sun], defaults to the source chirp mass
    #[structopt(long)]
    template_mcz: Option<f64>,
    /// Template symmetric mass ratio, defaults to the source mass ratio
    #[structopt(long)]
    template_eta: Option<f64>,
    /// Point mass lens redshifted mass [M_sun]
    #[structopt(short = "m", long, default_value = "5e5")]
    lens_mass: f64,
    /// Point mass lens impact parameter
    #[structopt(short, default_value = "0.8")]
    y: f64,
    /// Point mass lenses heavier than this mass [M_sun] use geometric optics
    #[structopt(long, default_value = "35")]
    threshold: f64,
    /// Geometric optics lens profile: pm or sis
    #[structopt(long, default_value = "pm")]
    shape: LensShape,
    /// SIE table, the source is then lensed by the SIE at `radius`
    #[structopt(long)]
    sie_table: Option<PathBuf>,
    /// SIE source-plane radius
    #[structopt(long)]
    radius: Option<f64>,
    /// Interpolates the SIE table instead of an exact lookup
    #[structopt(long)]
    interpolate: bool,
    /// No lensing
    #[structopt(long)]
    unlensed: bool,
    /// Cross term upper limit: template or min
    #[structopt(long, default_value = "template")]
    cross_cutoff: CrossTermCutoff,
    /// Merger time search half width [s]
    #[structopt(long, default_value = "0.2")]
    t_c_range: f64,
    /// Optimizer random generator seed
    #[structopt(long)]
    seed: Option<u64>,
    /// Simulated annealing iterations
    #[structopt(long, default_value = "2000")]
    max_iters: u64,
    /// Wall clock budget of each optimizer stage [s]
    #[structopt(long)]
    timeout: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let binary = BinaryParameters::default()
        .with_sky(opt.theta_s, opt.phi_s)
        .with_orbit(opt.theta_l, opt.phi_l)
        .with_chirp_mass(opt.mcz * SOLAR_MASS)
        .with_distance(opt.distance * GIGA_PARSEC)
        .with_eta(opt.eta);
    let table = opt.sie_table.as_ref().map(SieTable::from_path).transpose()?;
    let lens = match (opt.unlensed, &table, opt.radius) {
        (true, _, _) => LensParameters::Unlensed,
        (false, Some(_), Some(radius)) => LensParameters::Sie { radius },
        (false, Some(_), None) => anyhow::bail!("SIE lensing requires a source-plane radius"),
        (false, None, _) => LensParameters::PointMass {
            mass: opt.lens_mass * SOLAR_MASS,
            y: opt.y,
        },
    };
    let source = SourceParameters::new(binary)
        .with_merger(opt.t0, opt.phi0)
        .with_lens(lens);
    let template = TemplateParameters::new(
        binary
            .with_chirp_mass(opt.template_mcz.unwrap_or(opt.mcz) * SOLAR_MASS)
            .with_eta(opt.template_eta.unwrap_or(opt.eta)),
    );

    let lensing = LensingConfig::default()
        .geometric_optics_threshold(opt.threshold * SOLAR_MASS)
        .geometric_shape(opt.shape)
        .lookup(if opt.interpolate {
            LookupPolicy::Linear
        } else {
            LookupPolicy::Exact
        });
    let config = OverlapConfig::default()
        .cross_cutoff(opt.cross_cutoff)
        .lensing(lensing);
    let integral = OverlapIntegral::new(&source, &template, config, table.as_ref())?;
    println!("Lens: {:?}", integral.lens());
    println!(
        "SNR: source {:.3}, template {:.3}",
        integral.source_snr(),
        integral.template_snr()
    );

    let mut annealing = AnnealingConfig::default().max_iters(opt.max_iters);
    if let Some(seed) = opt.seed {
        annealing = annealing.seed(seed);
    }
    if let Some(timeout) = opt.timeout {
        annealing = annealing.timeout(Duration::from_secs(timeout));
    }
    let bounds = Bounds::default().t_c(-opt.t_c_range, opt.t_c_range);
    let now = std::time::Instant::now();
    let best = maximize_overlap(&integral, &bounds, &annealing)?;
    println!(
        "Overlap: {:.6} at t_c={:.6}s, phi_c={:.6}rd",
        best.overlap, best.t_c, best.phi_c
    );
    println!(
        " ... {} evaluations, {} iterations, {} integration warnings, converged: {} in {:.1}s",
        best.evaluations,
        best.iterations,
        best.integration_warnings,
        best.converged,
        now.elapsed().as_secs_f64()
    );
    Ok(())
}
