use plotters::prelude::*;

use crate::sweep::SweepPoint;

// plot mean reduction time against worker count
pub fn plot_sweep(points: &[SweepPoint], location: &str) -> Result<(), Box<dyn std::error::Error>> {
    if points.is_empty() {
        return Err("no sweep points to plot".into());
    }

    let max_workers = points.iter().map(|p| p.workers).max().unwrap_or(1);
    let max_ms = points.iter().map(|p| p.mean_ms).fold(0.0, f64::max);

    let root = BitMapBackend::new(location, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Reduction Time by Worker Count", ("sans-serif", 40))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(1usize..max_workers.max(2), 0f64..max_ms * 1.1 + f64::EPSILON)?;

    chart
        .configure_mesh()
        .x_desc("workers")
        .y_desc("mean time (ms)")
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            points.iter().map(|p| (p.workers, p.mean_ms)),
            &BLUE,
        ))?
        .label("mean time")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    chart.configure_series_labels().border_style(&BLACK).draw()?;
    root.present()?;

    Ok(())
}
