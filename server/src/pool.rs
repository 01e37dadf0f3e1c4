//! Thread pool with a work-stealing scheduler.
//!
//! Each worker owns a local [`WorkStealingQueue`]; submissions are spread
//! round-robin across the queues, and a worker that runs dry steals from a
//! randomly chosen victim. Task bodies may resubmit themselves, which is how
//! the pipelined benchmark builds continuations on plain OS threads.

use crate::queue::WorkStealingQueue;
use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A unit of work. Runs exactly once on some worker thread.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Idle workers park on the pool's condition variable for at most this long.
/// The bound makes a missed wake-up cost one timeout instead of a hang when a
/// submit lands between a worker's empty-probe and its wait.
const PARK_TIMEOUT: Duration = Duration::from_micros(100);

/// State shared between the pool handle and its worker threads.
struct PoolShared {
    queues: Vec<WorkStealingQueue<Task>>,
    running: AtomicBool,
    /// Submitted-but-not-completed task count. Incremented inside `submit`,
    /// decremented by the executing worker after the task body returns, so a
    /// self-resubmitting task can never let the count touch zero early.
    pending_tasks: AtomicUsize,
    steal_count: AtomicUsize,
    next_queue: AtomicUsize,
    lock: Mutex<()>,
    work_available: Condvar,
    all_done: Condvar,
}

/// Pool of `N` worker threads with per-worker deques and random-victim
/// stealing.
///
/// Dropping the pool shuts it down; `shutdown` is also callable explicitly
/// and is idempotent. Workers exit on shutdown regardless of queued work, so
/// callers that care about completion must `wait_all` first.
pub struct ThreadPool {
    shared: Arc<PoolShared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    num_workers: usize,
}

impl ThreadPool {
    /// Creates a pool with `num_threads` workers. `0` is coerced to one
    /// worker so the pool can always make progress.
    pub fn new(num_threads: usize) -> Self {
        let num_workers = num_threads.max(1);

        let shared = Arc::new(PoolShared {
            queues: (0..num_workers).map(|_| WorkStealingQueue::new()).collect(),
            running: AtomicBool::new(true),
            pending_tasks: AtomicUsize::new(0),
            steal_count: AtomicUsize::new(0),
            next_queue: AtomicUsize::new(0),
            lock: Mutex::new(()),
            work_available: Condvar::new(),
            all_done: Condvar::new(),
        });

        let workers = (0..num_workers)
            .map(|worker_id| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || worker_loop(shared, worker_id))
            })
            .collect();

        debug!("thread pool started with {} workers", num_workers);

        Self {
            shared,
            workers: Mutex::new(workers),
            num_workers,
        }
    }

    /// Number of worker threads in the pool.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Submits a task, distributing round-robin across worker queues.
    /// Ignored if the pool is shutting down.
    pub fn submit<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.shared.running.load(Ordering::Relaxed) {
            return;
        }

        self.shared.pending_tasks.fetch_add(1, Ordering::Relaxed);
        let idx = self.shared.next_queue.fetch_add(1, Ordering::Relaxed) % self.num_workers;
        self.shared.queues[idx].push_back(Box::new(task));
        self.shared.work_available.notify_one();
    }

    /// Submits a task directly onto a specific worker's queue. Out-of-range
    /// worker ids are ignored.
    pub fn submit_to<F>(&self, worker_id: usize, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.shared.running.load(Ordering::Relaxed) || worker_id >= self.num_workers {
            return;
        }

        self.shared.pending_tasks.fetch_add(1, Ordering::Relaxed);
        self.shared.queues[worker_id].push_back(Box::new(task));
        self.shared.work_available.notify_one();
    }

    /// Blocks until every submitted task has completed.
    ///
    /// Sound for self-resubmitting tasks: a continuation is counted before
    /// its predecessor is uncounted, so `pending_tasks` reaching zero means
    /// the whole chain has quiesced.
    pub fn wait_all(&self) {
        let mut guard = self.shared.lock.lock().unwrap();
        while self.shared.pending_tasks.load(Ordering::Relaxed) != 0 {
            guard = self.shared.all_done.wait(guard).unwrap();
        }
    }

    /// Stops the workers and joins them. Idempotent; later `submit` calls
    /// become no-ops.
    pub fn shutdown(&self) {
        if self
            .shared
            .running
            .compare_exchange(true, false, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        {
            let _guard = self.shared.lock.lock().unwrap();
            self.shared.work_available.notify_all();
        }

        let mut workers = self.workers.lock().unwrap();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
        debug!("thread pool shut down");
    }

    /// Total successful steals across all workers. Monotone; purely a
    /// benchmark statistic.
    pub fn steal_count(&self) -> usize {
        self.shared.steal_count.load(Ordering::Relaxed)
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: Arc<PoolShared>, worker_id: usize) {
    // Per-worker RNG for victim selection, seeded by the worker id.
    let mut rng = SmallRng::seed_from_u64(worker_id as u64);
    let num_workers = shared.queues.len();

    while shared.running.load(Ordering::Relaxed) {
        // 1. Local work, newest first.
        let mut task = shared.queues[worker_id].try_pop_back();

        // 2. Steal the oldest task from a random victim.
        if task.is_none() && num_workers > 1 {
            for _ in 0..num_workers * 2 {
                let victim = rng.gen_range(0..num_workers);
                if victim == worker_id {
                    continue;
                }
                if let Some(stolen) = shared.queues[victim].try_pop_front() {
                    shared.steal_count.fetch_add(1, Ordering::Relaxed);
                    task = Some(stolen);
                    break;
                }
            }
        }

        match task {
            Some(task) => {
                task();

                if shared.pending_tasks.fetch_sub(1, Ordering::Relaxed) == 1 {
                    // Notify under the lock so a waiter cannot re-check the
                    // counter and park between our decrement and the notify.
                    let _guard = shared.lock.lock().unwrap();
                    shared.all_done.notify_all();
                }
            }
            None => {
                // 3. Nothing found anywhere; park with a bounded timeout.
                let guard = shared.lock.lock().unwrap();
                let _ = shared
                    .work_available
                    .wait_timeout_while(guard, PARK_TIMEOUT, |_| {
                        shared.running.load(Ordering::Relaxed)
                            && shared.pending_tasks.load(Ordering::Relaxed) == 0
                    })
                    .unwrap();
            }
        }
    }
}
