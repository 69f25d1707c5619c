use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use gw_lens_overlap::{
    lensing::{LensingConfig, LookupPolicy, SieTable},
    power_spaced, sweep, AnnealingConfig, BinaryParameters, OverlapConfig, SourceParameters,
    Sweep, SweepConfig, SweepKey,
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "sie-sweep",
    about = "Maximum overlap versus the source position of a SIE lensed source"
)]
struct Opt {
    /// SIE table with the columns: source_x, mu_1, mu_2, td_1, td_2
    table: PathBuf,
    /// Sweeps that many radii between the table end points, interpolating the
    /// table, instead of the table radii
    #[structopt(short = "n", long)]
    steps: Option<usize>,
    /// Exponent of the interpolated grid spacing
    #[structopt(long, default_value = "3")]
    spacing: f64,
    /// Optimizer random generator seed
    #[structopt(long, default_value = "42")]
    seed: u64,
    /// Simulated annealing iterations
    #[structopt(long, default_value = "2000")]
    max_iters: u64,
    /// Wall clock budget of each optimizer stage [s]
    #[structopt(long)]
    timeout: Option<u64>,
    /// CSV output file
    #[structopt(short, long, default_value = "overlap_lensing_sie.csv")]
    output: String,
    /// SVG chart of the sweep
    #[cfg(feature = "plot")]
    #[structopt(long)]
    plot: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let table = SieTable::from_path(&opt.table)?;
    let (radii, lookup) = match opt.steps {
        Some(steps) => {
            let rows = table.rows();
            let (lb, ub) = (rows[0].radius, rows[rows.len() - 1].radius);
            (power_spaced(lb, ub, steps, opt.spacing), LookupPolicy::Linear)
        }
        None => (table.radii().collect(), LookupPolicy::Exact),
    };

    let mut annealing = AnnealingConfig::default()
        .seed(opt.seed)
        .max_iters(opt.max_iters);
    if let Some(timeout) = opt.timeout {
        annealing = annealing.timeout(Duration::from_secs(timeout));
    }
    let config = SweepConfig::default()
        .overlap(OverlapConfig::default().lensing(LensingConfig::default().lookup(lookup)))
        .annealing(annealing)
        .progress(true);

    let now = Instant::now();
    println!("Sweeping {} source-plane radii ...", radii.len());
    let records = Sweep::new(SweepKey::Radius, radii)
        .source(SourceParameters::new(BinaryParameters::default()))
        .config(config)
        .table(&table)
        .run();
    println!(" ... done in {}s", now.elapsed().as_secs());
    let failed = records.iter().filter(|r| r.is_failed()).count();
    if failed > 0 {
        println!("{failed} radii failed, see the log (RUST_LOG=warn)");
    }
    sweep::write_csv(&opt.output, SweepKey::Radius, &records)?;

    #[cfg(feature = "plot")]
    if let Some(path) = opt.plot {
        gw_lens_overlap::plot::plot_sweep(path, &records, 1f64, "source_x")
            .map_err(|e| anyhow::anyhow!("{e}"))?;
    }
    Ok(())
}
