use std::time::{Duration, Instant};

use gw_lens_overlap::{
    lensing::{LensShape, LensingConfig},
    power_spaced, sweep, AnnealingConfig, BinaryParameters, OverlapConfig, SourceParameters,
    Sweep, SweepConfig, SweepKey, SOLAR_MASS,
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "pm-sweep",
    about = "Maximum overlap versus the mass of a point mass lens"
)]
struct Opt {
    /// Smallest lens mass [M_sun]
    #[structopt(long, default_value = "5")]
    lb: f64,
    /// Largest lens mass [M_sun]
    #[structopt(long, default_value = "1e4")]
    ub: f64,
    /// Number of lens masses
    #[structopt(short = "n", long, default_value = "20")]
    steps: usize,
    /// Exponent of the grid spacing, the masses gather toward `lb` as it grows
    #[structopt(long, default_value = "7.5")]
    spacing: f64,
    /// Impact parameter
    #[structopt(short, default_value = "0.8")]
    y: f64,
    /// Source redshifted chirp mass [M_sun]
    #[structopt(long, default_value = "18.79")]
    mcz: f64,
    /// Point mass lenses heavier than this mass [M_sun] use geometric optics
    #[structopt(long, default_value = "35")]
    threshold: f64,
    /// Geometric optics lens profile: pm or sis
    #[structopt(long, default_value = "pm")]
    shape: LensShape,
    /// Optimizer random generator seed
    #[structopt(long, default_value = "42")]
    seed: u64,
    /// Wall clock budget of each optimizer stage [s]
    #[structopt(long)]
    timeout: Option<u64>,
    /// CSV output file
    #[structopt(short, long)]
    output: Option<String>,
    /// SVG chart of the sweep
    #[cfg(feature = "plot")]
    #[structopt(long)]
    plot: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let binary = BinaryParameters::default().with_chirp_mass(opt.mcz * SOLAR_MASS);
    let source = SourceParameters::default()
        .with_binary(binary)
        .with_impact_parameter(opt.y);
    let masses = power_spaced(
        opt.lb * SOLAR_MASS,
        opt.ub * SOLAR_MASS,
        opt.steps,
        opt.spacing,
    );

    let lensing = LensingConfig::default()
        .geometric_optics_threshold(opt.threshold * SOLAR_MASS)
        .geometric_shape(opt.shape);
    let mut annealing = AnnealingConfig::default().seed(opt.seed);
    if let Some(timeout) = opt.timeout {
        annealing = annealing.timeout(Duration::from_secs(timeout));
    }
    let config = SweepConfig::default()
        .overlap(OverlapConfig::default().lensing(lensing))
        .annealing(annealing)
        .progress(true);

    let now = Instant::now();
    println!("Sweeping {} lens masses ...", masses.len());
    let records = Sweep::new(SweepKey::LensMass, masses)
        .source(source)
        .config(config)
        .run();
    println!(" ... done in {}s", now.elapsed().as_secs());
    for record in &records {
        match record.overlap {
            Some(overlap) => {
                println!("M_lz={:10.3}M_sun: {:.6}", record.key / SOLAR_MASS, overlap)
            }
            None => println!("M_lz={:10.3}M_sun: failed", record.key / SOLAR_MASS),
        }
    }

    let output = opt
        .output
        .unwrap_or_else(|| format!("overlap_lensing_ml_y={}_mcz={}.csv", opt.y, opt.mcz));
    sweep::write_csv(&output, SweepKey::LensMass, &records)?;

    #[cfg(feature = "plot")]
    if let Some(path) = opt.plot {
        gw_lens_overlap::plot::plot_sweep(path, &records, SOLAR_MASS, "M_lz [M_sun]")
            .map_err(|e| anyhow::anyhow!("{e}"))?;
    }
    Ok(())
}
