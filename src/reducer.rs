//! # Partitioned Reducer
//!
//! Sums a [`Matrix`] on a fixed number of worker threads. The flattened
//! index space is split with [`partition`], each partition is summed on its
//! own scoped thread, and the coordinator joins every worker before adding
//! the partial sums in partition order. The result is all-or-nothing: if any
//! worker fails the whole reduction fails.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use log::{debug, info, warn};
use once_cell::sync::Lazy;

use crate::error::{ReduceError, WorkerError};
use crate::matrix::Matrix;
use crate::partition::{partition, Partition};

/// Workers poll their cancel token once per this many elements.
pub const CANCEL_POLL_INTERVAL: usize = 4096;

/// One worker per available core, falling back to a single worker.
pub static DEFAULT_WORKER_COUNT: Lazy<usize> = Lazy::new(|| {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
});

/// Shared flag used to interrupt the workers of a running reduction.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// The partial sum produced by one worker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialSum {
    pub partition: Partition,
    pub value: f64,
}

/// A completed reduction: the total and the partials it was built from,
/// in partition order.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    pub total: f64,
    pub partials: Vec<PartialSum>,
}

#[derive(Debug, Clone)]
pub struct Reducer {
    worker_count: usize,
    cancel: Option<CancelToken>,
}

impl Reducer {
    pub fn new(worker_count: usize) -> Result<Self, ReduceError> {
        if worker_count == 0 {
            return Err(ReduceError::invalid("worker count must be at least 1"));
        }
        Ok(Self {
            worker_count,
            cancel: None,
        })
    }

    /// Attach a token that interrupts the workers when cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Sum every element of `matrix`.
    pub fn reduce(&self, matrix: &Matrix) -> Result<f64, ReduceError> {
        self.reduce_detailed(matrix).map(|reduction| reduction.total)
    }

    /// Sum every element of `matrix`, keeping the per-partition results.
    pub fn reduce_detailed(&self, matrix: &Matrix) -> Result<Reduction, ReduceError> {
        self.reduce_map(matrix, |value| value)
    }

    /// Sum `map(x)` over every element `x` of `matrix`.
    ///
    /// A panic inside `map` fails the owning worker and therefore the whole
    /// reduction with [`ReduceError::WorkerFailure`].
    pub fn reduce_map<F>(&self, matrix: &Matrix, map: F) -> Result<Reduction, ReduceError>
    where
        F: Fn(f64) -> f64 + Sync,
    {
        let partitions = partition(matrix.len(), self.worker_count)?;
        let data = matrix.as_slice();
        let cancel = self.cancel.as_ref();
        let map = &map;

        let outcomes: Vec<Result<f64, WorkerError>> = thread::scope(|scope| {
            let handles: Vec<_> = partitions
                .iter()
                .map(|&part| {
                    thread::Builder::new()
                        .name(format!("reduce-worker-{}", part.index))
                        .spawn_scoped(scope, move || sum_partition(data, part, map, cancel))
                })
                .collect();

            // Join every worker, even after a failure, so none outlive the call.
            handles
                .into_iter()
                .map(|handle| match handle {
                    Ok(handle) => handle
                        .join()
                        .unwrap_or_else(|payload| Err(WorkerError::Panicked(panic_message(payload)))),
                    Err(e) => Err(WorkerError::Spawn(e.to_string())),
                })
                .collect()
        });

        let mut total = 0.0;
        let mut partials = Vec::with_capacity(partitions.len());
        for (part, outcome) in partitions.into_iter().zip(outcomes) {
            match outcome {
                Ok(value) => {
                    total += value;
                    partials.push(PartialSum {
                        partition: part,
                        value,
                    });
                }
                Err(source) => {
                    warn!("reduction failed in partition {}: {}", part.index, source);
                    return Err(ReduceError::WorkerFailure {
                        partition: part.index,
                        source,
                    });
                }
            }
        }

        info!(
            "reduced {}x{} matrix with {} workers: total={}",
            matrix.rows(),
            matrix.cols(),
            self.worker_count,
            total
        );
        Ok(Reduction { total, partials })
    }
}

/// Sum nested rows on `worker_count` workers.
///
/// Fails with [`ReduceError::InvalidArgument`] for an empty or ragged matrix
/// or a zero worker count, before any worker is started.
pub fn reduce(rows: &[Vec<f64>], worker_count: usize) -> Result<f64, ReduceError> {
    let reducer = Reducer::new(worker_count)?;
    let matrix = Matrix::from_rows(rows)?;
    reducer.reduce(&matrix)
}

fn sum_partition<F>(
    data: &[f64],
    part: Partition,
    map: &F,
    cancel: Option<&CancelToken>,
) -> Result<f64, WorkerError>
where
    F: Fn(f64) -> f64,
{
    let cancelled = || cancel.map_or(false, CancelToken::is_cancelled);

    if cancelled() {
        return Err(WorkerError::Interrupted);
    }
    if part.is_empty() {
        return Ok(0.0);
    }
    debug!(
        "worker {} summing positions {} to {}",
        part.index,
        part.start,
        part.end() - 1
    );

    let mut acc = 0.0;
    for (offset, &value) in data[part.range()].iter().enumerate() {
        if offset > 0 && offset % CANCEL_POLL_INTERVAL == 0 && cancelled() {
            return Err(WorkerError::Interrupted);
        }
        acc += map(value);
    }
    Ok(acc)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_by_two_with_two_workers() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let reduction = Reducer::new(2).unwrap().reduce_detailed(&m).unwrap();

        assert_eq!(reduction.total, 10.0);
        let values: Vec<f64> = reduction.partials.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![3.0, 7.0]);
        assert_eq!(reduction.partials[0].partition.range(), 0..2);
        assert_eq!(reduction.partials[1].partition.range(), 2..4);
    }

    #[test]
    fn single_element_with_spare_workers() {
        let reduction = Reducer::new(4)
            .unwrap()
            .reduce_detailed(&Matrix::from_rows(&[vec![5.0]]).unwrap())
            .unwrap();

        assert_eq!(reduction.total, 5.0);
        let counts: Vec<usize> = reduction.partials.iter().map(|p| p.partition.count).collect();
        assert_eq!(counts, vec![1, 0, 0, 0]);
        assert!(reduction.partials[1..].iter().all(|p| p.value == 0.0));
    }

    #[test]
    fn zero_workers_is_invalid() {
        assert!(matches!(Reducer::new(0), Err(ReduceError::InvalidArgument(_))));
        assert!(matches!(
            reduce(&[vec![1.0]], 0),
            Err(ReduceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn ragged_rows_are_invalid() {
        let rows = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0]];
        assert!(matches!(reduce(&rows, 2), Err(ReduceError::InvalidArgument(_))));
    }

    #[test]
    fn cancelled_token_fails_with_worker_failure() {
        let token = CancelToken::new();
        token.cancel();
        let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let err = Reducer::new(2).unwrap().with_cancel(token).reduce(&m).unwrap_err();

        assert_eq!(
            err,
            ReduceError::WorkerFailure {
                partition: 0,
                source: WorkerError::Interrupted,
            }
        );
    }

    #[test]
    fn cancelling_mid_partition_interrupts_the_worker() {
        let token = CancelToken::new();
        let m = Matrix::from_rows(&vec![vec![1.0; 100]; 100]).unwrap();
        let reducer = Reducer::new(1).unwrap().with_cancel(token.clone());

        // the worker starts normally and only sees the flag at its next poll
        let err = reducer
            .reduce_map(&m, |x| {
                token.cancel();
                x
            })
            .unwrap_err();

        assert!(m.len() > CANCEL_POLL_INTERVAL);
        assert_eq!(
            err,
            ReduceError::WorkerFailure {
                partition: 0,
                source: WorkerError::Interrupted,
            }
        );
    }

    #[test]
    fn panicking_worker_fails_the_reduction() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, -1.0]]).unwrap();
        let err = Reducer::new(2)
            .unwrap()
            .reduce_map(&m, |x| {
                if x < 0.0 {
                    panic!("negative input");
                }
                x
            })
            .unwrap_err();

        match err {
            ReduceError::WorkerFailure { partition, source } => {
                assert_eq!(partition, 1);
                assert_eq!(source, WorkerError::Panicked("negative input".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reduce_map_sums_squares() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let reduction = Reducer::new(3).unwrap().reduce_map(&m, |x| x * x).unwrap();
        assert_eq!(reduction.total, 30.0);
    }

    #[test]
    fn default_worker_count_is_positive() {
        assert!(*DEFAULT_WORKER_COUNT >= 1);
    }
}
