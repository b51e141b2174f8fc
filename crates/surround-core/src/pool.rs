use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use tracing::debug;

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct State {
    queue: VecDeque<Job>,
    active: usize,
    stop: bool,
}

struct Shared {
    state: Mutex<State>,
    /// Signalled when a job is queued or the pool is stopping.
    work: Condvar,
    /// Signalled when the last in-flight job finishes and the queue is empty.
    idle: Condvar,
}

/// A fixed-size worker pool with an unbounded FIFO queue.
///
/// Submission never blocks and never fails. Shutdown is idempotent: it
/// discards queued jobs, wakes every worker and joins them; dropping the
/// pool shuts it down implicitly.
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            work: Condvar::new(),
            idle: Condvar::new(),
        });
        let workers = (0..size)
            .map(|i| {
                let shared = Arc::clone(&shared);
                thread::Builder::new()
                    .name(format!("surround-worker-{i}"))
                    .spawn(move || worker_loop(&shared))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        debug!(size, "thread pool started");

        Self { shared, workers }
    }

    /// Sizes the pool from the number of logical CPUs, plus one so a worker
    /// is available even while another is blocked on a long line.
    pub fn with_default_size() -> Self {
        let cpus = thread::available_parallelism().map_or(1, |n| n.get());
        Self::new(cpus + 1)
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.shared.state.lock().expect("pool state poisoned");
        state.queue.push_back(Box::new(job));
        self.shared.work.notify_one();
    }

    /// Blocks until the queue is empty and no job is running.
    pub fn wait_idle(&self) {
        let mut state = self.shared.state.lock().expect("pool state poisoned");
        while !state.queue.is_empty() || state.active > 0 {
            state = self
                .shared
                .idle
                .wait(state)
                .expect("pool state poisoned");
        }
    }

    /// Stops the workers, discarding any jobs still queued. Safe to call
    /// more than once.
    pub fn shutdown(&mut self) {
        let workers = std::mem::take(&mut self.workers);
        if workers.is_empty() {
            return;
        }

        {
            let mut state = self.shared.state.lock().expect("pool state poisoned");
            state.stop = true;
            state.queue.clear();
        }
        self.shared.work.notify_all();

        for worker in workers {
            // a worker that panicked already unwound; nothing left to join
            let _ = worker.join();
        }

        debug!("thread pool stopped");
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let job = {
            let mut state = shared.state.lock().expect("pool state poisoned");
            loop {
                if state.stop {
                    return;
                }
                if let Some(job) = state.queue.pop_front() {
                    state.active += 1;
                    break job;
                }
                state = shared.work.wait(state).expect("pool state poisoned");
            }
        };

        job();

        let mut state = shared.state.lock().expect("pool state poisoned");
        state.active -= 1;
        if state.active == 0 && state.queue.is_empty() {
            shared.idle.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_all_submitted_jobs_run() {
        let pool = ThreadPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..100 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.wait_idle();

        assert_eq!(counter.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn test_wait_idle_on_empty_pool_returns() {
        let pool = ThreadPool::new(2);
        pool.wait_idle();
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut pool = ThreadPool::new(2);
        pool.shutdown();
        pool.shutdown();
    }

    #[test]
    fn test_shutdown_discards_queued_jobs() {
        let mut pool = ThreadPool::new(1);
        let (started_tx, started_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let counter = Arc::new(AtomicUsize::new(0));

        {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                started_tx.send(()).unwrap();
                release_rx.recv().ok();
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        started_rx.recv().unwrap();
        for _ in 0..50 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        // unblock the running job once shutdown has cleared the queue
        let releaser = thread::spawn(move || {
            thread::sleep(std::time::Duration::from_millis(50));
            release_tx.send(()).ok();
        });
        pool.shutdown();
        releaser.join().unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_size_is_at_least_two() {
        let pool = ThreadPool::with_default_size();
        assert!(pool.size() >= 2);
    }
}
