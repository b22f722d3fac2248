//! Fixed-size pool of OS threads applying one calculation to every input.
//!
//! All work is queued up front, followed by one `Stop` per worker. Each worker
//! drains the shared queue until it takes a `Stop`, answers with a `Stopped`
//! outcome and exits, so the collector knows every worker is done once it has
//! counted `num_workers` of them.

use std::any::Any;
use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::fmt::Display;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, Once, PoisonError};
use std::thread;

use anyhow::Result;
use tracing::{Span, debug, error, warn};

use crate::error::PoolError;

pub const DEFAULT_NUM_WORKERS: usize = 4;

thread_local! {
    static IN_CALCULATION: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Turns one input value into an output.
///
/// `Ok(None)` means the input produced nothing usable; the pool drops such
/// items the same way it drops failures. Any `Fn(V) -> Result<Option<R>>`
/// is a calculation.
pub trait Calculation<V>: Send + Sync {
    type Output: Send;

    fn calculate(&self, value: V) -> Result<Option<Self::Output>>;
}

impl<V, R, F> Calculation<V> for F
where
    F: Fn(V) -> Result<Option<R>> + Send + Sync,
    R: Send,
{
    type Output = R;

    fn calculate(&self, value: V) -> Result<Option<R>> {
        self(value)
    }
}

enum Task<K, V> {
    Work(K, V),
    Stop,
}

enum Outcome<K, R> {
    Done(K, Option<R>),
    Stopped(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    num_workers: usize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_WORKERS)
    }
}

impl WorkerPool {
    pub fn new(num_workers: usize) -> Self {
        Self { num_workers }
    }

    /// Applies `calculation` to every value of `inputs` and blocks until all
    /// workers have exited.
    ///
    /// Keys whose calculation failed, panicked or produced nothing are absent
    /// from the returned map.
    ///
    /// # Errors
    ///
    /// Returns a [`PoolError`] when the pool has no workers or a worker dies
    /// without signalling shutdown.
    #[tracing::instrument(skip_all, fields(items = inputs.len(), workers = self.num_workers))]
    pub fn execute<K, V, C>(
        &self,
        inputs: HashMap<K, V>,
        calculation: C,
    ) -> Result<HashMap<K, C::Output>, PoolError>
    where
        K: Eq + Hash + Display + Send,
        V: Send,
        C: Calculation<V>,
    {
        if self.num_workers == 0 {
            return Err(PoolError::InvalidWorkerCount);
        }
        install_quiet_hook();

        let expected = self.num_workers;
        let total = inputs.len();
        let queue: Mutex<VecDeque<Task<K, V>>> = Mutex::new(
            inputs
                .into_iter()
                .map(|(key, value)| Task::Work(key, value))
                .chain((0..expected).map(|_| Task::Stop))
                .collect(),
        );
        let (result_tx, result_rx) = mpsc::channel();
        let calculation = &calculation;
        let queue = &queue;

        thread::scope(|scope| {
            let handles: Vec<_> = (0..expected)
                .map(|id| {
                    let results = result_tx.clone();
                    let span = Span::current();
                    scope.spawn(move || {
                        let _entered = span.enter();
                        run_worker(id, queue, calculation, results)
                    })
                })
                .collect();
            // Only workers hold senders now, so a dead pool closes the channel.
            drop(result_tx);

            let mut results = HashMap::with_capacity(total);
            let mut stopped = 0;
            while stopped < expected {
                match result_rx.recv() {
                    Ok(Outcome::Done(key, Some(value))) => {
                        results.insert(key, value);
                    }
                    Ok(Outcome::Done(key, None)) => {
                        warn!(key = %key, "No result calculated, dropping");
                    }
                    Ok(Outcome::Stopped(id)) => {
                        stopped += 1;
                        debug!(worker = id, stopped, "Worker signalled shutdown");
                    }
                    Err(_) => break,
                }
            }

            let mut panicked = None;
            for (id, handle) in handles.into_iter().enumerate() {
                if handle.join().is_err() {
                    panicked.get_or_insert(id);
                }
            }

            if let Some(id) = panicked {
                return Err(PoolError::WorkerPanicked(id));
            }
            if stopped < expected {
                return Err(PoolError::QueueClosed { stopped, expected });
            }

            debug!(calculated = results.len(), total, "Worker pool finished");
            Ok(results)
        })
    }
}

fn run_worker<K, V, C>(
    id: usize,
    queue: &Mutex<VecDeque<Task<K, V>>>,
    calculation: &C,
    results: Sender<Outcome<K, C::Output>>,
) where
    K: Display,
    C: Calculation<V>,
{
    loop {
        let task = queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match task {
            Some(Task::Work(key, value)) => {
                let value = match calculate_quietly(calculation, value) {
                    Ok(Ok(value)) => value,
                    Ok(Err(e)) => {
                        error!(worker = id, key = %key, error = %e, "Calculation failed");
                        None
                    }
                    Err(payload) => {
                        error!(
                            worker = id,
                            key = %key,
                            panic = panic_message(payload.as_ref()),
                            "Calculation panicked"
                        );
                        None
                    }
                };
                if results.send(Outcome::Done(key, value)).is_err() {
                    return;
                }
            }
            Some(Task::Stop) => {
                let _ = results.send(Outcome::Stopped(id));
                return;
            }
            None => {
                warn!(worker = id, "Task queue drained without a stop signal");
                return;
            }
        }
    }
}

/// Keeps the panic hook quiet for panics raised inside a calculation, which
/// the worker reports through `error!`. Other panics reach the previous hook.
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !IN_CALCULATION.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

fn calculate_quietly<V, C>(calculation: &C, value: V) -> thread::Result<Result<Option<C::Output>>>
where
    C: Calculation<V>,
{
    let outer = IN_CALCULATION.with(|flag| flag.replace(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| calculation.calculate(value)));
    IN_CALCULATION.with(|flag| flag.set(outer));
    outcome
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
