use std::process::ExitCode;
use std::time::{Duration, Instant};

use log::{error, info};

use matrix_workers::config::{RunConfig, RunMode};
use matrix_workers::counter::{Counter, Direction};
use matrix_workers::matrix_loader::MatrixLoader;
use matrix_workers::reducer::Reducer;
use matrix_workers::reduction_logs::log_reduction;
use matrix_workers::sweep::run_sweep;
use matrix_workers::sweep_plot::plot_sweep;

static DATA_PATH: &str = "./data/{1}/{2}";

fn main() -> ExitCode {
    env_logger::init();

    let project = std::env::args().nth(1).unwrap_or_else(|| "demo".to_string());
    let config_location = DATA_PATH.replace("{1}", &project).replace("{2}", "config.json");
    let config = match RunConfig::from_json(&config_location) {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading config {}: {}", config_location, e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = match config.mode {
        RunMode::Reduce => run_reduce(&config),
        RunMode::Sweep => run_sweep_mode(&config),
        RunMode::Counter => run_counter(&config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_reduce(config: &RunConfig) -> Result<(), Box<dyn std::error::Error>> {
    let matrix = MatrixLoader::new(config).load()?;
    let reducer = Reducer::new(config.worker_count)?;

    let start = Instant::now();
    let reduction = reducer.reduce_detailed(&matrix)?;
    let elapsed = start.elapsed();

    for partial in &reduction.partials {
        println!(
            "partition {:>3} [{}, {}) -> {}",
            partial.partition.index,
            partial.partition.start,
            partial.partition.end(),
            partial.value
        );
    }
    println!(
        "sum of {}x{} matrix with {} workers: {} ({:?})",
        matrix.rows(),
        matrix.cols(),
        reducer.worker_count(),
        reduction.total,
        elapsed
    );

    if let Some(location) = &config.log_location {
        log_reduction(location, reducer.worker_count(), &reduction)?;
        info!("appended reduction log to {}", location);
    }
    Ok(())
}

fn run_sweep_mode(config: &RunConfig) -> Result<(), Box<dyn std::error::Error>> {
    let matrix = MatrixLoader::new(config).load()?;
    let points = run_sweep(&matrix, config.max_workers, config.repeats)?;

    println!("workers, mean_ms, total, deviation");
    for point in &points {
        println!(
            "{}, {:.3}, {}, {:e}",
            point.workers, point.mean_ms, point.total, point.deviation
        );
    }

    if let Some(location) = &config.plot_location {
        plot_sweep(&points, location)?;
        info!("wrote sweep plot to {}", location);
    }
    Ok(())
}

// count up for half the run, down for the rest, then stop
fn run_counter(config: &RunConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut counter = Counter::new(Duration::from_millis(config.counter_tick_ms));
    let display = counter.start()?;

    let run_for = Duration::from_millis(config.counter_run_ms);
    let started = Instant::now();
    let mut reversed = false;
    while started.elapsed() < run_for {
        if !reversed && started.elapsed() >= run_for / 2 {
            counter.set_direction(Direction::Down)?;
            reversed = true;
        }
        if let Ok(value) = display.recv_timeout(Duration::from_millis(config.counter_tick_ms)) {
            println!("{}", value);
        }
    }

    let last = counter.stop()?;
    println!("stopped at {}", last);
    Ok(())
}
