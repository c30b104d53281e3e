//! Fixed-size worker pool scoped to one race.
//!
//! The pool is created per call and never reused. Its lifecycle is:
//!
//! 1. [`WorkerPool::new`] spawns a fixed number of named threads
//! 2. [`submit`](WorkerPool::submit) queues jobs
//! 3. [`shutdown`](WorkerPool::shutdown) stops accepting jobs; queued jobs still run
//! 4. [`await_termination`](WorkerPool::await_termination) waits, bounded, for every worker to exit
//! 5. [`join`](WorkerPool::join) reaps the threads
//!
//! Dropping the pool on any path requests shutdown. Threads that are still
//! running at that point are detached, never killed.

use crate::error::RaceError;
use crate::tracing_compat::{debug, trace, warn};
use crate::types::PanicPayload;
use crossbeam_queue::SegQueue;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A unit of work run by the pool.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    shutdown: bool,
    /// Workers that have not exited their loop yet.
    live: usize,
}

struct PoolShared {
    /// Lock-free injection queue; workers pop without taking `state`.
    queue: SegQueue<Job>,
    state: Mutex<PoolState>,
    work_ready: Condvar,
    terminated: Condvar,
}

/// Per-race pool of worker threads.
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `size` worker threads.
    ///
    /// If a thread cannot be spawned, the ones already running are shut down
    /// and [`RaceError::Spawn`] is returned.
    pub fn new(size: usize) -> Result<Self, RaceError> {
        let shared = Arc::new(PoolShared {
            queue: SegQueue::new(),
            state: Mutex::new(PoolState {
                shutdown: false,
                live: 0,
            }),
            work_ready: Condvar::new(),
            terminated: Condvar::new(),
        });

        let mut pool = Self {
            shared,
            workers: Vec::with_capacity(size),
        };

        for index in 0..size {
            pool.shared.state.lock().live += 1;
            let shared = Arc::clone(&pool.shared);
            let spawned = thread::Builder::new()
                .name(format!("racecheck-worker-{index}"))
                .spawn(move || worker_loop(&shared));
            match spawned {
                Ok(handle) => pool.workers.push(handle),
                Err(err) => {
                    pool.shared.state.lock().live -= 1;
                    warn!(index, error = %err, "failed to spawn worker");
                    // Drop requests shutdown for the workers already running.
                    return Err(RaceError::Spawn(err));
                }
            }
        }

        debug!(workers = size, "worker pool started");
        Ok(pool)
    }

    /// Number of worker threads.
    #[must_use]
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queues a job. Returns `false` and drops the job if shutdown was requested.
    pub fn submit(&self, job: Job) -> bool {
        let state = self.shared.state.lock();
        if state.shutdown {
            return false;
        }
        self.shared.queue.push(job);
        self.shared.work_ready.notify_one();
        true
    }

    /// Stops accepting jobs. Queued and running jobs still complete.
    pub fn shutdown(&self) {
        let mut state = self.shared.state.lock();
        if !state.shutdown {
            state.shutdown = true;
            trace!(queued = self.shared.queue.len(), "worker pool shutdown requested");
        }
        self.shared.work_ready.notify_all();
    }

    /// Returns true once shutdown was requested.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shared.state.lock().shutdown
    }

    /// Number of workers that have not exited yet.
    #[must_use]
    pub fn live_workers(&self) -> usize {
        self.shared.state.lock().live
    }

    /// Waits up to `timeout` for every worker to exit.
    ///
    /// Returns `true` if the pool terminated. Only meaningful after
    /// [`shutdown`](Self::shutdown); before that, workers idle forever.
    pub fn await_termination(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.shared.state.lock();
        while state.live > 0 {
            match deadline {
                Some(deadline) => {
                    if self
                        .shared
                        .terminated
                        .wait_until(&mut state, deadline)
                        .timed_out()
                    {
                        return state.live == 0;
                    }
                }
                None => self.shared.terminated.wait(&mut state),
            }
        }
        true
    }

    /// Joins every worker thread. Call after a successful
    /// [`await_termination`](Self::await_termination).
    pub fn join(mut self) {
        self.shutdown();
        for handle in std::mem::take(&mut self.workers) {
            // Jobs are unwind-guarded, so a worker cannot die by panic.
            let _ = handle.join();
        }
        debug!("worker pool joined");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("WorkerPool")
            .field("size", &self.workers.len())
            .field("live", &state.live)
            .field("shutdown", &state.shutdown)
            .field("queued", &self.shared.queue.len())
            .finish()
    }
}

#[cfg_attr(not(feature = "tracing-integration"), allow(unused_variables))]
fn worker_loop(shared: &PoolShared) {
    loop {
        if let Some(job) = shared.queue.pop() {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(job)) {
                let payload = PanicPayload::from_panic(payload);
                warn!(panic = %payload, "job escaped its unwind guard");
            }
            continue;
        }

        let mut state = shared.state.lock();
        // Re-check under the lock: `submit` pushes while holding it.
        if !shared.queue.is_empty() {
            continue;
        }
        if state.shutdown {
            break;
        }
        shared.work_ready.wait(&mut state);
    }

    let mut state = shared.state.lock();
    state.live -= 1;
    trace!(live = state.live, "worker exited");
    if state.live == 0 {
        shared.terminated.notify_all();
    }
}
