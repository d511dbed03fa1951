//! The bounded worker pool itself (§4.4).

use std::any::Any;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{oneshot, Notify, Semaphore};
use tracing::{error, info, warn};

use crate::error::WorkerError;
use crate::memory::{MemorySample, MemorySampler, ProcessMemorySampler};
use crate::priority::{Priority, QueueKey};

/// Tunables for a [`WorkerPool`], mirroring §4.4's contract.
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Floor on standing worker capacity. Kept for parity with the
    /// contract's `min`/`max` wording; see the crate-level docs for how it
    /// is realised on top of Tokio's managed blocking thread pool.
    pub min_workers: usize,
    /// Ceiling on concurrently executing tasks.
    pub max_workers: usize,
    /// A worker thread idle for longer than this may be torn down.
    pub idle_timeout: Duration,
    /// Per-task execution budget; overrun yields [`WorkerError::Timeout`].
    pub task_timeout: Duration,
    /// RSS ceiling in megabytes before the pool refuses new work.
    pub max_rss_mb: u64,
    /// Heap ceiling in megabytes before the pool refuses new work.
    pub max_heap_mb: u64,
    /// How often the background memory probe samples usage.
    pub memory_probe_interval: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            min_workers: 1,
            max_workers: 4,
            idle_timeout: Duration::from_secs(120),
            task_timeout: Duration::from_secs(60),
            max_rss_mb: 512,
            max_heap_mb: 512,
            memory_probe_interval: Duration::from_secs(5),
        }
    }
}

type AnyResult = Result<Box<dyn Any + Send>, ()>;

struct QueuedJob {
    key: QueueKey,
    run: Box<dyn FnOnce() -> AnyResult + Send>,
    deliver: Box<dyn FnOnce(Result<Box<dyn Any + Send>, WorkerError>) + Send>,
}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl Eq for QueuedJob {}
impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for QueuedJob {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

struct Inner {
    queue: Mutex<BinaryHeap<QueuedJob>>,
    notify: Notify,
    semaphore: Arc<Semaphore>,
    seq: AtomicU64,
    queued: AtomicUsize,
    active: AtomicUsize,
    shutting_down: AtomicBool,
    over_budget: AtomicBool,
    config: WorkerPoolConfig,
}

/// A bounded, priority-ordered pool of workers that run CPU-heavy parse
/// tasks off the request path.
///
/// Tasks execute on Tokio's managed blocking thread pool, guarded by a
/// semaphore sized to `max_workers`; idle-thread teardown is therefore
/// delegated to Tokio's own blocking-pool keep-alive rather than
/// reimplemented here. A background probe periodically samples process
/// memory and refuses new work with [`WorkerError::Oom`] while over budget.
pub struct WorkerPool {
    inner: Arc<Inner>,
}

impl WorkerPool {
    /// Build and start a pool, using the default [`ProcessMemorySampler`].
    #[must_use]
    pub fn new(config: WorkerPoolConfig) -> Self {
        Self::with_sampler(config, Arc::new(ProcessMemorySampler::new()))
    }

    /// Build and start a pool with a caller-supplied memory sampler, for
    /// tests or alternative measurement backends.
    #[must_use]
    pub fn with_sampler(config: WorkerPoolConfig, sampler: Arc<dyn MemorySampler>) -> Self {
        let inner = Arc::new(Inner {
            queue: Mutex::new(BinaryHeap::new()),
            notify: Notify::new(),
            semaphore: Arc::new(Semaphore::new(config.max_workers.max(1))),
            seq: AtomicU64::new(0),
            queued: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            shutting_down: AtomicBool::new(false),
            over_budget: AtomicBool::new(false),
            config,
        });

        tokio::spawn(dispatch_loop(Arc::clone(&inner)));
        tokio::spawn(memory_probe_loop(Arc::clone(&inner), sampler));

        Self { inner }
    }

    /// Submit a task at the given priority. The returned receiver resolves
    /// to the task's output, or a [`WorkerError`] if it timed out,
    /// panicked, was refused for being over the memory budget, or the pool
    /// was shutting down.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Closed`] immediately if the pool is draining.
    pub fn submit<F, T>(
        &self,
        priority: Priority,
        job: F,
    ) -> Result<oneshot::Receiver<Result<T, WorkerError>>, WorkerError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.inner.shutting_down.load(Ordering::SeqCst) {
            return Err(WorkerError::Closed);
        }

        let (tx, rx) = oneshot::channel::<Result<T, WorkerError>>();
        let run: Box<dyn FnOnce() -> AnyResult + Send> = Box::new(move || {
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(job))
                .map(|value| Box::new(value) as Box<dyn Any + Send>)
                .map_err(|_| ())
        });
        let deliver: Box<dyn FnOnce(Result<Box<dyn Any + Send>, WorkerError>) + Send> =
            Box::new(move |outcome| {
                let result = match outcome {
                    Err(err) => Err(err),
                    Ok(boxed) => match boxed.downcast::<T>() {
                        Ok(value) => Ok(*value),
                        Err(_) => Err(WorkerError::Panicked),
                    },
                };
                let _ = tx.send(result);
            });

        let seq = self.inner.seq.fetch_add(1, Ordering::SeqCst);
        let key = QueueKey { priority, seq };
        self.inner
            .queue
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(QueuedJob { key, run, deliver });
        self.inner.queued.fetch_add(1, Ordering::SeqCst);
        self.inner.notify.notify_one();

        Ok(rx)
    }

    /// Number of tasks waiting for a free slot.
    #[must_use]
    pub fn queue_depth(&self) -> usize {
        self.inner.queued.load(Ordering::SeqCst)
    }

    /// Number of tasks currently executing.
    #[must_use]
    pub fn active_workers(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Whether the memory guard currently considers the pool over budget.
    #[must_use]
    pub fn is_over_budget(&self) -> bool {
        self.inner.over_budget.load(Ordering::SeqCst)
    }

    /// Stop accepting new work and wait up to `grace` for in-flight tasks to
    /// finish. Tasks still running when `grace` elapses are abandoned; their
    /// result channels are simply never resolved.
    pub async fn shutdown(&self, grace: Duration) {
        self.inner.shutting_down.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();

        let deadline = tokio::time::Instant::now() + grace;
        while self.inner.active.load(Ordering::SeqCst) > 0
            || self.inner.queued.load(Ordering::SeqCst) > 0
        {
            if tokio::time::Instant::now() >= deadline {
                warn!("worker pool shutdown grace period elapsed with work still in flight");
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

async fn dispatch_loop(inner: Arc<Inner>) {
    loop {
        // Wait for at least one queued job before consuming a permit, so a
        // free permit is always handed to whatever currently ranks highest
        // rather than committed to a job popped before a higher-priority one
        // arrived.
        loop {
            let notified = inner.notify.notified();
            let has_job = !inner
                .queue
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .is_empty();
            if has_job {
                break;
            }
            if inner.shutting_down.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }

        let Ok(permit) = Arc::clone(&inner.semaphore).acquire_owned().await else {
            return;
        };

        let job = {
            let mut queue = inner
                .queue
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            queue.pop()
        };
        let Some(job) = job else {
            // Lost a race with another consumer; release the permit and
            // re-evaluate.
            drop(permit);
            continue;
        };
        inner.queued.fetch_sub(1, Ordering::SeqCst);

        if inner.over_budget.load(Ordering::SeqCst) {
            (job.deliver)(Err(WorkerError::Oom));
            drop(permit);
            continue;
        }

        let inner = Arc::clone(&inner);
        inner.active.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            run_job(&inner, job).await;
            inner.active.fetch_sub(1, Ordering::SeqCst);
            drop(permit);
        });
    }
}

async fn run_job(inner: &Arc<Inner>, job: QueuedJob) {
    let outcome = match tokio::time::timeout(
        inner.config.task_timeout,
        tokio::task::spawn_blocking(job.run),
    )
    .await
    {
        Ok(Ok(result)) => result.map_err(|()| WorkerError::Panicked),
        Ok(Err(_join_error)) => Err(WorkerError::Panicked),
        Err(_elapsed) => Err(WorkerError::Timeout),
    };
    (job.deliver)(outcome);
}

async fn memory_probe_loop(inner: Arc<Inner>, sampler: Arc<dyn MemorySampler>) {
    let mut ticker = tokio::time::interval(inner.config.memory_probe_interval);
    loop {
        ticker.tick().await;
        if inner.shutting_down.load(Ordering::SeqCst) {
            return;
        }

        let MemorySample { rss_mb, heap_mb } = sampler.sample();
        let over_budget =
            rss_mb > inner.config.max_rss_mb || heap_mb > inner.config.max_heap_mb;
        let was_over_budget = inner.over_budget.swap(over_budget, Ordering::SeqCst);

        if over_budget && !was_over_budget {
            error!(
                rss_mb,
                heap_mb,
                max_rss_mb = inner.config.max_rss_mb,
                max_heap_mb = inner.config.max_heap_mb,
                "worker pool exceeded its memory budget, refusing new work"
            );
        } else if !over_budget && was_over_budget {
            info!(rss_mb, heap_mb, "worker pool memory usage back within budget");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FixedMemorySampler;

    fn test_config() -> WorkerPoolConfig {
        WorkerPoolConfig {
            min_workers: 1,
            max_workers: 2,
            idle_timeout: Duration::from_secs(120),
            task_timeout: Duration::from_millis(200),
            max_rss_mb: 1_000_000,
            max_heap_mb: 1_000_000,
            memory_probe_interval: Duration::from_millis(20),
        }
    }

    #[tokio::test]
    async fn submitted_task_runs_and_returns_its_value() {
        let pool = WorkerPool::with_sampler(
            test_config(),
            Arc::new(FixedMemorySampler(MemorySample { rss_mb: 1, heap_mb: 1 })),
        );
        let rx = pool.submit(Priority::Normal, || 2 + 2).unwrap();
        assert_eq!(rx.await.unwrap(), Ok(4));
    }

    #[tokio::test]
    async fn panicking_task_resolves_to_panicked_error() {
        let pool = WorkerPool::with_sampler(
            test_config(),
            Arc::new(FixedMemorySampler(MemorySample { rss_mb: 1, heap_mb: 1 })),
        );
        let rx = pool
            .submit::<_, ()>(Priority::Normal, || panic!("boom"))
            .unwrap();
        assert_eq!(rx.await.unwrap(), Err(WorkerError::Panicked));
    }

    #[tokio::test]
    async fn overrunning_task_resolves_to_timeout_error() {
        let mut config = test_config();
        config.task_timeout = Duration::from_millis(10);
        let pool = WorkerPool::with_sampler(
            config,
            Arc::new(FixedMemorySampler(MemorySample { rss_mb: 1, heap_mb: 1 })),
        );
        let rx = pool
            .submit(Priority::Normal, || {
                std::thread::sleep(Duration::from_millis(200));
                1
            })
            .unwrap();
        assert_eq!(rx.await.unwrap(), Err(WorkerError::Timeout));
    }

    #[tokio::test]
    async fn over_budget_memory_refuses_new_work() {
        let mut config = test_config();
        config.max_rss_mb = 1;
        config.memory_probe_interval = Duration::from_millis(5);
        let pool = WorkerPool::with_sampler(
            config,
            Arc::new(FixedMemorySampler(MemorySample { rss_mb: 999, heap_mb: 999 })),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        let rx = pool.submit(Priority::Normal, || 1).unwrap();
        assert_eq!(rx.await.unwrap(), Err(WorkerError::Oom));
    }

    #[tokio::test]
    async fn high_priority_task_is_serviced_before_queued_normal_tasks() {
        let config = test_config();
        let pool = WorkerPool::with_sampler(
            config,
            Arc::new(FixedMemorySampler(MemorySample { rss_mb: 1, heap_mb: 1 })),
        );
        // occupy both permits so subsequent submissions queue up
        let _hold1 = pool
            .submit(Priority::Normal, || std::thread::sleep(Duration::from_millis(60)))
            .unwrap();
        let _hold2 = pool
            .submit(Priority::Normal, || std::thread::sleep(Duration::from_millis(60)))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let order = Arc::new(Mutex::new(Vec::new()));
        let order_low = Arc::clone(&order);
        let low_rx = pool
            .submit(Priority::Low, move || order_low.lock().unwrap().push("low"))
            .unwrap();
        let order_high = Arc::clone(&order);
        let high_rx = pool
            .submit(Priority::High, move || order_high.lock().unwrap().push("high"))
            .unwrap();

        low_rx.await.unwrap().unwrap();
        high_rx.await.unwrap().unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["high", "low"]);
    }

    #[tokio::test]
    async fn shutdown_drains_in_flight_work() {
        let pool = WorkerPool::with_sampler(
            test_config(),
            Arc::new(FixedMemorySampler(MemorySample { rss_mb: 1, heap_mb: 1 })),
        );
        let rx = pool.submit(Priority::Normal, || 5).unwrap();
        pool.shutdown(Duration::from_secs(1)).await;
        assert_eq!(rx.await.unwrap(), Ok(5));
        assert!(pool.submit(Priority::Normal, || 1).is_err());
    }
}
