//! Worker-count sweep: time the same reduction for `1..=max_workers` workers.

use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use crate::error::ReduceError;
use crate::matrix::Matrix;
use crate::reducer::Reducer;

/// Relative difference above which a sweep total is reported as diverging
/// from the single-worker total.
const TOTAL_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    pub workers: usize,
    pub mean_ms: f64,
    pub total: f64,
    // |total - single-worker total|
    pub deviation: f64,
}

pub fn run_sweep(
    matrix: &Matrix,
    max_workers: usize,
    repeats: usize,
) -> Result<Vec<SweepPoint>, ReduceError> {
    if max_workers == 0 || repeats == 0 {
        return Err(ReduceError::invalid(
            "sweep needs at least one worker count and one repeat",
        ));
    }

    let pb = ProgressBar::new((max_workers * repeats) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut reference = None;
    let mut points = Vec::with_capacity(max_workers);
    for workers in 1..=max_workers {
        let reducer = Reducer::new(workers)?;
        let mut elapsed_ms = 0.0;
        let mut total = 0.0;
        for _ in 0..repeats {
            let start = Instant::now();
            total = reducer.reduce(matrix)?;
            elapsed_ms += start.elapsed().as_secs_f64() * 1000.0;
            pb.inc(1);
        }

        let reference_total = *reference.get_or_insert(total);
        let deviation = (total - reference_total).abs();
        if deviation > TOTAL_TOLERANCE * reference_total.abs().max(1.0) {
            warn!(
                "{} workers: total {} deviates from single-worker total {}",
                workers, total, reference_total
            );
        }

        points.push(SweepPoint {
            workers,
            mean_ms: elapsed_ms / repeats as f64,
            total,
            deviation,
        });
    }
    pb.finish_and_clear();

    info!("sweep finished over {} worker counts", points.len());
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_worker_count_agrees_on_integer_data() {
        let rows: Vec<Vec<f64>> = (0..7)
            .map(|r| (0..5).map(|c| (r * 5 + c) as f64).collect())
            .collect();
        let m = Matrix::from_rows(&rows).unwrap();
        let points = run_sweep(&m, 8, 2).unwrap();

        assert_eq!(points.len(), 8);
        assert_eq!(points[0].workers, 1);
        assert_eq!(points[7].workers, 8);
        assert!(points.iter().all(|p| p.total == 595.0 && p.deviation == 0.0));
    }

    #[test]
    fn zero_bounds_are_rejected() {
        let m = Matrix::from_rows(&[vec![1.0]]).unwrap();
        assert!(run_sweep(&m, 0, 1).is_err());
        assert!(run_sweep(&m, 1, 0).is_err());
    }
}
