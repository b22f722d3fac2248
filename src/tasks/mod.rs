//! Concurrent pipeline stages.
//!
//! [`fetching::Fetcher`] runs the I/O-bound fetches as tokio tasks behind a
//! semaphore; [`pool::WorkerPool`] runs CPU-bound calculations on OS threads.

pub mod fetching;
pub mod pool;
