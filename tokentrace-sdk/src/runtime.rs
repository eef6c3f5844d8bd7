//! The background runtime that executes fire-and-forget export jobs.
//!
//! One dedicated OS thread drives one Tokio current-thread runtime. Producers on
//! any thread hand jobs over through an unbounded channel and return
//! immediately; the loop spawns every received job as its own task, so jobs
//! from one producer start in submission order and interleave only at their
//! await points.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::SdkError;

/// A unit of export work handed to the runtime.
pub type ExportJob = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

const THREAD_NAME: &str = "tokentrace-export";
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

static GLOBAL: OnceLock<ExportRuntime> = OnceLock::new();
static GLOBAL_INIT: Mutex<()> = parking_lot::const_mutex(());

/// Handle to a background export runtime.
///
/// Handles are cheap to clone and all clones drive the same thread. Use
/// [`ExportRuntime::global`] for the lazily created process-wide runtime, or
/// [`ExportRuntime::start`] to own one explicitly and pass it around.
///
/// # Example
///
/// ```rust
/// use tokentrace_sdk::ExportRuntime;
/// use std::time::Duration;
///
/// let runtime = ExportRuntime::start().unwrap();
/// runtime.submit(Box::pin(async {
///     // sink I/O happens here, on the background thread
/// }));
///
/// assert!(runtime.wait_idle(Duration::from_secs(1)));
/// runtime.shutdown();
/// ```
#[derive(Clone)]
pub struct ExportRuntime {
    inner: Arc<Inner>,
}

struct Inner {
    jobs: mpsc::UnboundedSender<ExportJob>,
    stop: watch::Sender<bool>,
    thread: Mutex<Option<JoinHandle<()>>>,
    in_flight: Arc<InFlight>,
}

/// Count of submitted jobs that have not yet finished or been dropped.
#[derive(Debug, Default)]
struct InFlight {
    count: Mutex<usize>,
    idle: Condvar,
}

impl InFlight {
    fn enter(self: &Arc<Self>) -> InFlightGuard {
        *self.count.lock() += 1;
        InFlightGuard(self.clone())
    }
}

/// Decrements the in-flight count when the job completes, panics, or is
/// dropped without running.
struct InFlightGuard(Arc<InFlight>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut count = self.0.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.0.idle.notify_all();
        }
    }
}

impl ExportRuntime {
    /// Return the process-wide runtime, starting it on first use.
    ///
    /// Concurrent first calls race on a mutex; exactly one thread and one
    /// runtime are ever created. A failure to start is returned to the
    /// caller that triggered initialization and the next call retries.
    ///
    /// The global runtime lives until the process exits. There is no exit
    /// hook: jobs still queued when `main` returns are dropped, which is the
    /// accepted cost of fire-and-forget export. Call
    /// [`wait_idle`](Self::wait_idle) before exiting a short-lived program.
    pub fn global() -> Result<ExportRuntime, SdkError> {
        if let Some(runtime) = GLOBAL.get() {
            return Ok(runtime.clone());
        }

        let _guard = GLOBAL_INIT.lock();
        if let Some(runtime) = GLOBAL.get() {
            return Ok(runtime.clone());
        }

        let runtime = ExportRuntime::start()?;
        let _ = GLOBAL.set(runtime.clone());
        Ok(runtime)
    }

    /// Start a new runtime on its own thread.
    ///
    /// The runtime shuts down when [`shutdown`](Self::shutdown) is called or
    /// the last handle is dropped.
    pub fn start() -> Result<ExportRuntime, SdkError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SdkError::RuntimeStart)?;

        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        let thread = std::thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run_loop(runtime, jobs_rx, stop_rx))
            .map_err(SdkError::RuntimeStart)?;

        debug!(thread = THREAD_NAME, "export runtime started");

        Ok(ExportRuntime {
            inner: Arc::new(Inner {
                jobs: jobs_tx,
                stop: stop_tx,
                thread: Mutex::new(Some(thread)),
                in_flight: Arc::new(InFlight::default()),
            }),
        })
    }

    /// Hand a job to the background loop without waiting for it.
    ///
    /// The job owns its own error handling: nothing it returns or raises is
    /// observed by the submitter. If the runtime has been shut down the job
    /// is dropped and a warning is logged.
    pub fn submit(&self, job: ExportJob) {
        let guard = self.inner.in_flight.enter();
        let job: ExportJob = Box::pin(async move {
            let _guard = guard;
            job.await;
        });

        if self.inner.jobs.send(job).is_err() {
            warn!("export runtime is shut down, dropping export job");
        }
    }

    /// Number of submitted jobs that have not finished yet.
    pub fn pending(&self) -> usize {
        *self.inner.in_flight.count.lock()
    }

    /// Block until every submitted job has finished or `timeout` elapses.
    ///
    /// Returns `true` if the runtime became idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let in_flight = &self.inner.in_flight;
        let mut count = in_flight.count.lock();
        while *count > 0 {
            if in_flight.idle.wait_until(&mut count, deadline).timed_out() {
                return *count == 0;
            }
        }
        true
    }

    /// Whether the background loop is still accepting jobs.
    pub fn is_running(&self) -> bool {
        !self.inner.jobs.is_closed()
    }

    /// Stop the loop and join its thread, waiting at most two seconds.
    ///
    /// Jobs that have not completed are dropped. Calling this more than once
    /// is harmless.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }
}

impl Inner {
    fn shutdown(&self) {
        let _ = self.stop.send(true);

        let Some(thread) = self.thread.lock().take() else {
            return;
        };

        // Waiting from the loop's own thread can never succeed.
        if std::thread::current().name() == Some(THREAD_NAME) {
            return;
        }

        let deadline = Instant::now() + SHUTDOWN_TIMEOUT;
        while !thread.is_finished() {
            if Instant::now() >= deadline {
                warn!(
                    timeout_ms = SHUTDOWN_TIMEOUT.as_millis() as u64,
                    "export runtime did not stop in time, detaching thread"
                );
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }

        let _ = thread.join();
        debug!(thread = THREAD_NAME, "export runtime stopped");
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for ExportRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportRuntime")
            .field("running", &self.is_running())
            .field("pending", &self.pending())
            .finish()
    }
}

fn run_loop(
    runtime: tokio::runtime::Runtime,
    mut jobs: mpsc::UnboundedReceiver<ExportJob>,
    mut stop: watch::Receiver<bool>,
) {
    runtime.block_on(async move {
        loop {
            tokio::select! {
                biased;
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
                job = jobs.recv() => match job {
                    Some(job) => {
                        tokio::spawn(job);
                    }
                    None => break,
                },
            }
        }
        jobs.close();
    });

    // Tasks still running are cancelled; their guards release the in-flight count.
    runtime.shutdown_timeout(Duration::from_millis(100));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc as std_mpsc;

    #[test]
    fn submitted_job_runs_on_background_thread() {
        let runtime = ExportRuntime::start().unwrap();
        let (tx, rx) = std_mpsc::channel();

        runtime.submit(Box::pin(async move {
            let name = std::thread::current().name().map(str::to_string);
            let _ = tx.send(name);
        }));

        let name = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(name.as_deref(), Some(THREAD_NAME));
        runtime.shutdown();
    }

    #[test]
    fn global_is_created_once_under_contention() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| ExportRuntime::global().unwrap()))
            .collect();
        let runtimes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let first = &runtimes[0];
        for runtime in &runtimes {
            assert!(Arc::ptr_eq(&first.inner, &runtime.inner));
        }
        assert!(Arc::ptr_eq(
            &first.inner,
            &ExportRuntime::global().unwrap().inner
        ));
    }

    #[test]
    fn jobs_from_one_thread_start_in_order() {
        let runtime = ExportRuntime::start().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..50 {
            let seen = seen.clone();
            runtime.submit(Box::pin(async move {
                seen.lock().push(i);
            }));
        }

        assert!(runtime.wait_idle(Duration::from_secs(2)));
        assert_eq!(*seen.lock(), (0..50).collect::<Vec<_>>());
        runtime.shutdown();
    }

    #[test]
    fn panicking_job_does_not_stop_the_loop() {
        let runtime = ExportRuntime::start().unwrap();
        let (tx, rx) = std_mpsc::channel();

        runtime.submit(Box::pin(async {
            panic!("sink blew up");
        }));
        runtime.submit(Box::pin(async move {
            let _ = tx.send(());
        }));

        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
        assert!(runtime.wait_idle(Duration::from_secs(2)));
        assert!(runtime.is_running());
        runtime.shutdown();
    }

    #[test]
    fn wait_idle_times_out_on_stuck_job() {
        let runtime = ExportRuntime::start().unwrap();
        runtime.submit(Box::pin(async {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }));

        assert!(!runtime.wait_idle(Duration::from_millis(50)));
        assert_eq!(runtime.pending(), 1);

        // Shutdown cancels the stuck job and releases its slot.
        runtime.shutdown();
        assert!(runtime.wait_idle(Duration::from_secs(1)));
    }

    #[test]
    fn submit_after_shutdown_drops_job() {
        let runtime = ExportRuntime::start().unwrap();
        runtime.shutdown();
        assert!(!runtime.is_running());

        let (tx, rx) = std_mpsc::channel::<()>();
        runtime.submit(Box::pin(async move {
            let _ = tx.send(());
        }));

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(runtime.pending(), 0);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let runtime = ExportRuntime::start().unwrap();
        runtime.shutdown();
        runtime.shutdown();
        drop(runtime);
    }

    #[test]
    fn empty_runtime_is_idle() {
        let runtime = ExportRuntime::start().unwrap();
        assert!(runtime.wait_idle(Duration::ZERO));
        assert_eq!(runtime.pending(), 0);
    }
}
