use thiserror::Error;

/// Infrastructure failures of the worker pool.
///
/// Per-item calculation failures never surface here; they are logged and the
/// item is left out of the output.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Worker count must be greater than 0")]
    InvalidWorkerCount,

    #[error("Result queue closed after {stopped} of {expected} workers signalled shutdown")]
    QueueClosed { stopped: usize, expected: usize },

    #[error("Worker {0} panicked outside of a calculation")]
    WorkerPanicked(usize),
}
