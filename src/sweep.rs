//! Overlap sweeps over a lens parameter
//!
//! Each swept value is an independent maximization, the sweep runs them in
//! parallel and records one row per value.
//! A failing value does not abort the sweep, its row is left without overlap.

use std::path::Path;

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    lensing::SieTable,
    optimizer::{maximize_overlap, AnnealingConfig, Bounds, OptimizationResult},
    overlap::{OverlapConfig, OverlapIntegral},
    params::{SourceParameters, TemplateParameters},
    Result,
};

/// Overlap and optimizer settings of a run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SweepConfig {
    pub overlap: OverlapConfig,
    pub annealing: AnnealingConfig,
    /// shows a progress bar
    pub progress: bool,
}
impl SweepConfig {
    pub fn overlap(self, overlap: OverlapConfig) -> Self {
        Self { overlap, ..self }
    }
    pub fn annealing(self, annealing: AnnealingConfig) -> Self {
        Self { annealing, ..self }
    }
    pub fn progress(self, progress: bool) -> Self {
        Self { progress, ..self }
    }
}

/// Maximum overlap of a source and a template
///
/// `table` is only required for a SIE lensed source.
pub fn run_one(
    source: &SourceParameters,
    template: &TemplateParameters,
    bounds: &Bounds,
    config: &SweepConfig,
    table: Option<&SieTable>,
) -> Result<OptimizationResult> {
    let integral = OverlapIntegral::new(source, template, config.overlap, table)?;
    maximize_overlap(&integral, bounds, &config.annealing)
}

/// Grid from `lb` to `ub` with the points gathered toward `lb`
///
/// lb + (i/(steps-1))^spacing (ub-lb), i=0,...,steps-1
pub fn power_spaced(lb: f64, ub: f64, steps: usize, spacing: f64) -> Vec<f64> {
    match steps {
        0 => vec![],
        1 => vec![lb],
        _ => {
            let dx = 1f64 / (steps - 1) as f64;
            (0..steps)
                .map(|i| lb + (i as f64 * dx).powf(spacing) * (ub - lb))
                .collect()
        }
    }
}

/// Swept source parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepKey {
    /// point mass lens mass [s]
    LensMass,
    /// SIE source-plane radius
    Radius,
}
impl SweepKey {
    /// Header of the key column
    pub fn column(&self) -> &'static str {
        match self {
            SweepKey::LensMass => "M_lz",
            SweepKey::Radius => "source_x",
        }
    }
    /// Source with the swept parameter set to `value`
    pub fn apply(&self, source: SourceParameters, value: f64) -> SourceParameters {
        match self {
            SweepKey::LensMass => source.with_lens_mass(value),
            SweepKey::Radius => source.with_radius(value),
        }
    }
}

/// Sweep result of one swept value, empty if the run failed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepRecord {
    pub key: f64,
    pub overlap: Option<f64>,
    #[serde(rename = "tc")]
    pub t_c: Option<f64>,
    pub phi_c: Option<f64>,
}
impl SweepRecord {
    pub fn new(key: f64, result: &OptimizationResult) -> Self {
        Self {
            key,
            overlap: Some(result.overlap),
            t_c: Some(result.t_c),
            phi_c: Some(result.phi_c),
        }
    }
    pub fn failed(key: f64) -> Self {
        Self {
            key,
            overlap: None,
            t_c: None,
            phi_c: None,
        }
    }
    pub fn is_failed(&self) -> bool {
        self.overlap.is_none()
    }
}

/// Parallel sweep of a source parameter
pub struct Sweep<'a> {
    key: SweepKey,
    values: Vec<f64>,
    source: SourceParameters,
    template: Option<TemplateParameters>,
    bounds: Bounds,
    config: SweepConfig,
    table: Option<&'a SieTable>,
}
impl<'a> Sweep<'a> {
    /// Sweep of the `key` parameter over `values` of the default source
    pub fn new(key: SweepKey, values: Vec<f64>) -> Self {
        Self {
            key,
            values,
            source: Default::default(),
            template: None,
            bounds: Default::default(),
            config: Default::default(),
            table: None,
        }
    }
    pub fn source(self, source: SourceParameters) -> Self {
        Self { source, ..self }
    }
    /// Template of every run, defaults to the template matching the source
    pub fn template(self, template: TemplateParameters) -> Self {
        Self {
            template: Some(template),
            ..self
        }
    }
    pub fn bounds(self, bounds: Bounds) -> Self {
        Self { bounds, ..self }
    }
    pub fn config(self, config: SweepConfig) -> Self {
        Self { config, ..self }
    }
    pub fn table(self, table: &'a SieTable) -> Self {
        Self {
            table: Some(table),
            ..self
        }
    }
    pub fn key(&self) -> SweepKey {
        self.key
    }
    pub fn values(&self) -> &[f64] {
        &self.values
    }
    /// Runs the sweep, the records are in the order of the swept values
    pub fn run(&self) -> Vec<SweepRecord> {
        let now = std::time::Instant::now();
        let pb = if self.config.progress {
            let pb = ProgressBar::new(self.values.len() as u64);
            if let Ok(style) = ProgressStyle::with_template(
                "{msg} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>4}/{len:4} ({eta})",
            ) {
                pb.set_style(style);
            }
            pb.set_message(self.key.column());
            pb
        } else {
            ProgressBar::hidden()
        };
        let template = self
            .template
            .unwrap_or_else(|| TemplateParameters::matching(&self.source));
        let records: Vec<_> = self
            .values
            .par_iter()
            .progress_with(pb)
            .map(|&value| {
                let source = self.key.apply(self.source, value);
                match run_one(&source, &template, &self.bounds, &self.config, self.table) {
                    Ok(result) => {
                        log::debug!("{}={value:e}: {result:?}", self.key.column());
                        SweepRecord::new(value, &result)
                    }
                    Err(e) => {
                        log::warn!("{}={value:e} failed: {e}", self.key.column());
                        SweepRecord::failed(value)
                    }
                }
            })
            .collect();
        log::info!(
            "{} sweep of {} values ({} failed) in {:.1}s",
            self.key.column(),
            records.len(),
            records.iter().filter(|r| r.is_failed()).count(),
            now.elapsed().as_secs_f64()
        );
        records
    }
}

/// Writes the records to a CSV file with the columns (key, overlap, tc, phi_c)
pub fn write_csv<P: AsRef<Path>>(path: P, key: SweepKey, records: &[SweepRecord]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path.as_ref())?;
    wtr.write_record([key.column(), "overlap", "tc", "phi_c"])?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    log::info!("sweep written to {:?}", path.as_ref());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lensing::{LookupPolicy, SieRow},
        params::{BinaryParameters, LensParameters},
        Error, SOLAR_MASS,
    };

    fn quick() -> SweepConfig {
        SweepConfig::default().annealing(
            AnnealingConfig::default()
                .seed(42)
                .max_iters(100)
                .stall_best(50)
                .polish_iters(40),
        )
    }

    #[test]
    fn power_spaced_grid() {
        let grid = power_spaced(1f64, 3f64, 5, 1f64);
        assert_eq!(grid, vec![1f64, 1.5, 2f64, 2.5, 3f64]);
        let grid = power_spaced(0f64, 1f64, 3, 3f64);
        assert_eq!(grid, vec![0f64, 0.125, 1f64]);
        let grid = power_spaced(5f64 * SOLAR_MASS, 1e4 * SOLAR_MASS, 20, 7.5);
        assert_eq!(grid.len(), 20);
        assert!(grid.windows(2).all(|w| w[1] > w[0]));
        assert!((grid[19] - 1e4 * SOLAR_MASS).abs() < 1e-12 * grid[19]);
        assert!(power_spaced(0f64, 1f64, 0, 2f64).is_empty());
        assert_eq!(power_spaced(2f64, 1f64, 1, 2f64), vec![2f64]);
    }

    #[test]
    fn sweep_keys() {
        let source = SourceParameters::default();
        assert_eq!(
            SweepKey::LensMass.apply(source, 7f64).lens,
            LensParameters::PointMass { mass: 7f64, y: 0.8 }
        );
        assert_eq!(
            SweepKey::Radius.apply(source, 0.1).lens,
            LensParameters::Sie { radius: 0.1 }
        );
        assert_eq!(SweepKey::Radius.column(), "source_x");
    }

    #[test]
    fn run_one_requires_a_table_for_sie() {
        let source = SourceParameters::default().with_radius(0.1);
        assert!(matches!(
            run_one(
                &source,
                &TemplateParameters::matching(&source),
                &Bounds::default(),
                &quick(),
                None
            ),
            Err(Error::Lookup(_))
        ));
    }

    #[test]
    fn failed_values_leave_empty_rows() {
        let source = SourceParameters::default();
        let records = Sweep::new(SweepKey::LensMass, vec![-SOLAR_MASS, 1e3 * SOLAR_MASS])
            .source(source)
            .config(quick())
            .run();
        assert_eq!(records.len(), 2);
        assert!(records[0].is_failed());
        assert_eq!(records[0].key, -SOLAR_MASS);
        assert!(!records[1].is_failed());
        let overlap = records[1].overlap.unwrap();
        assert!(overlap > 0f64 && overlap < 1f64, "{overlap}");
    }

    #[test]
    fn sie_sweep_over_the_table() {
        let table = SieTable::from_rows(vec![
            SieRow {
                radius: 0.05,
                mu_1: 4f64,
                mu_2: -2f64,
                td_1: 0f64,
                td_2: 2e-3,
            },
            SieRow {
                radius: 0.1,
                mu_1: 2f64,
                mu_2: -0.5,
                td_1: 0f64,
                td_2: 4e-3,
            },
        ])
        .unwrap();
        let source = SourceParameters::new(BinaryParameters::default());
        let config = quick();
        let config = config.overlap(
            config
                .overlap
                .lensing(config.overlap.lensing.lookup(LookupPolicy::Exact)),
        );
        let radii: Vec<_> = table.radii().chain(Some(0.2)).collect();
        let records = Sweep::new(SweepKey::Radius, radii)
            .source(source)
            .config(config)
            .table(&table)
            .run();
        assert!(records[..2].iter().all(|r| !r.is_failed()));
        assert!(records[2].is_failed());
    }

    #[test]
    fn csv_output() {
        let records = vec![
            SweepRecord {
                key: 0.5,
                overlap: Some(0.9),
                t_c: Some(0.01),
                phi_c: Some(-1f64),
            },
            SweepRecord::failed(0.75),
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.csv");
        write_csv(&path, SweepKey::Radius, &records).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "source_x,overlap,tc,phi_c\n0.5,0.9,0.01,-1.0\n0.75,,,\n"
        );
    }
}
