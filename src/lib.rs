//! Fixed-worker-count parallel reduction over a dense matrix, plus a
//! message-driven background counter.

pub mod config;
pub mod counter;
pub mod error;
pub mod matrix;
pub mod matrix_loader;
pub mod partition;
pub mod reducer;
pub mod reduction_logs;
pub mod sweep;
pub mod sweep_plot;

pub use error::{ReduceError, WorkerError};
pub use matrix::Matrix;
pub use partition::{partition, Partition};
pub use reducer::{reduce, CancelToken, Reducer, Reduction};
