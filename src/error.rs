use thiserror::Error;

/// Why a single worker did not produce its partial sum.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    #[error("worker was interrupted before completing")]
    Interrupted,
    #[error("worker panicked: {0}")]
    Panicked(String),
    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),
}

/// Errors returned by a partitioned reduction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReduceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("worker for partition {partition} failed: {source}")]
    WorkerFailure {
        partition: usize,
        #[source]
        source: WorkerError,
    },
}

impl ReduceError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ReduceError::InvalidArgument(message.into())
    }
}

/// Errors from the background counter's command interface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CounterError {
    #[error("counter is already running")]
    AlreadyRunning,
    #[error("counter is not running")]
    NotRunning,
    #[error("counter thread exited unexpectedly")]
    Disconnected,
}

/// Errors raised while loading a matrix from its configured source.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read matrix csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid number {value:?} at row {row}, column {col}")]
    Parse { row: usize, col: usize, value: String },
    #[error(transparent)]
    Matrix(#[from] ReduceError),
}

/// Errors raised while reading the run configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to open config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}
