//! Sweep charts

use std::path::Path;

use plotters::prelude::*;

use crate::sweep::SweepRecord;

/// Plots the maximum overlap versus the swept parameter into a SVG file
///
/// The swept values are divided by `x_unit` and the failed runs are skipped.
pub fn plot_sweep<P: AsRef<Path>>(
    path: P,
    records: &[SweepRecord],
    x_unit: f64,
    x_desc: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let points: Vec<(f64, f64)> = records
        .iter()
        .filter_map(|r| r.overlap.map(|overlap| (r.key / x_unit, overlap)))
        .collect();
    if points.is_empty() {
        log::warn!("no overlap to plot");
        return Ok(());
    }
    let (x_min, x_max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), &(x, _)| {
            (a.min(x), b.max(x))
        });
    let y_min = points.iter().map(|(_, y)| *y).fold(f64::INFINITY, f64::min);
    let x_pad = 1e-2 * (x_max - x_min).max(f64::EPSILON);
    let y_pad = 1e-2 * (1f64 - y_min).max(1e-3);

    let plot = SVGBackend::new(path.as_ref(), (768, 512)).into_drawing_area();
    plot.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&plot)
        .set_label_area_size(LabelAreaPosition::Left, 50)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .margin(10)
        .build_cartesian_2d(
            x_min - x_pad..x_max + x_pad,
            y_min - y_pad..1f64 + y_pad,
        )?;
    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("Overlap")
        .draw()?;
    chart.draw_series(LineSeries::new(points.iter().cloned(), &BLUE))?;
    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 3, BLUE.filled())),
    )?;
    plot.present()?;
    log::info!("sweep chart written to {:?}", path.as_ref());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn svg_chart() {
        let records = vec![
            SweepRecord {
                key: 1f64,
                overlap: Some(0.99),
                t_c: Some(0f64),
                phi_c: Some(0f64),
            },
            SweepRecord::failed(2f64),
            SweepRecord {
                key: 3f64,
                overlap: Some(0.8),
                t_c: Some(0.01),
                phi_c: Some(1f64),
            },
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.svg");
        plot_sweep(&path, &records, 1f64, "M_lz [M_sun]").unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
    }
}
