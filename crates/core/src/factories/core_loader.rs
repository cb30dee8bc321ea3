//! CoreLoader is the artifetch module that dispatches cache-backed
//! background fetches.
//!
//! In particular it decides per request whether the cache already holds
//! the artifact, runs cache misses through a fixed-size worker pool with
//! a bounded retry policy, and issues exactly one terminal notification
//! per request.
//!
//! It consists of multiple parts:
//! - Dispatch gate that makes the check-cache/else-enqueue decision
//! - Worker tasks that run fetch jobs from a shared queue
//! - Retry loop around the artifact source, with a fixed inter-attempt
//!   delay
//! - Delivery step that hands a successful, non-stale result to the
//!   request's sink
//!
//! ### Dispatch gate
//!
//! A single async mutex, the dispatch lock, serializes the cache lookup
//! of the decide step and every cache write. The lock is released before
//! the decision is acted on: a cache hit is delivered synchronously on
//! the caller's task, a miss enqueues a job carrying the request. The
//! enqueue must not run under the lock, since a full queue would then
//! wedge the workers' cache writes behind it. A miss is the normal
//! trigger for background work, not an error.
//!
//! Note the lock serializes the decision globally, it does not deduplicate
//! in-flight fetches per key: two concurrent dispatches of the same
//! missing key may both enqueue a job. The second fetch overwrites the
//! cache entry with an identical artifact, so this stays correct and is
//! accepted in exchange for not tracking per-key in-flight state.
//!
//! ### Worker tasks
//!
//! A bounded channel acts as the job queue. Jobs are passed one by one
//! through the channel to the worker tasks running in parallel. The pool
//! is resizable at runtime: growing spawns workers for vacant slots,
//! shrinking retires surplus workers the next time they pick up a job,
//! which they first hand back to the queue so nothing is dropped. Queued
//! and running jobs survive any resize.
//!
//! ### Retry loop
//!
//! Attempts are counted from 1 up to a runtime-adjustable maximum. Each
//! attempt loads the artifact from the source and writes it to the cache
//! under the dispatch lock; a failure of either step logs a warning,
//! sleeps the configured delay and retries. Exhausting all attempts is
//! terminal and produces an outcome with no artifact, never an error.

use std::sync::{
    atomic::{AtomicU32, AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use artifetch_api::{
    builder, AfError, AfResult, Artifact, BoxFut, DynArtifactCache,
    DynArtifactSource, DynDeliverySink, DynLoader, DynLoaderFactory,
    FetchOutcome, FetchRequest, Loader, LoaderFactory, ResourceKey,
    TargetBinding,
};
use tokio::{
    sync::mpsc::{channel, error::TrySendError, Receiver, Sender},
    task::JoinHandle,
};

mod deliver;

const MOD_NAME: &str = "coreLoader";

/// CoreLoader configuration types.
pub mod config {
    /// Configuration parameters for [CoreLoaderFactory](super::CoreLoaderFactory).
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct CoreLoaderConfig {
        /// How many fetch jobs can run in parallel. Default: 2.
        pub parallel_request_count: u8,
        /// How many attempts a fetch may make before giving up.
        /// Default: 3.
        pub max_attempts: u32,
        /// Fixed delay between attempts in ms. Default: 2000.
        pub retry_delay_ms: u64,
        /// Capacity of the job queue channel. Default: 16384.
        pub channel_capacity: usize,
    }

    impl Default for CoreLoaderConfig {
        fn default() -> Self {
            Self {
                parallel_request_count: 2,
                max_attempts: 3,
                retry_delay_ms: 2000,
                channel_capacity: 16_384,
            }
        }
    }

    /// Module-level configuration for CoreLoader.
    #[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct CoreLoaderModConfig {
        /// CoreLoader configuration.
        pub core_loader: CoreLoaderConfig,
    }

    impl artifetch_api::config::ModConfig for CoreLoaderModConfig {}
}

use config::*;

/// A production-ready loader module.
#[derive(Debug)]
pub struct CoreLoaderFactory {}

impl CoreLoaderFactory {
    /// Construct a new CoreLoaderFactory.
    pub fn create() -> DynLoaderFactory {
        Arc::new(Self {})
    }
}

impl LoaderFactory for CoreLoaderFactory {
    fn default_config(
        &self,
        config: &mut artifetch_api::config::Config,
    ) -> AfResult<()> {
        config
            .add_default_module_config::<CoreLoaderModConfig>(MOD_NAME.into())
    }

    fn create(
        &self,
        builder: Arc<builder::Builder>,
        cache: DynArtifactCache,
        source: DynArtifactSource,
    ) -> BoxFut<'static, AfResult<DynLoader>> {
        Box::pin(async move {
            let config: CoreLoaderModConfig =
                builder.config.get_module_config(MOD_NAME)?;
            let out: DynLoader =
                Arc::new(CoreLoader::new(config.core_loader, cache, source));
            Ok(out)
        })
    }
}

#[derive(Debug)]
struct Job {
    request: FetchRequest,
}

/// Everything a worker task needs, cheap to clone per spawned worker.
#[derive(Debug, Clone)]
struct WorkerCtx {
    cache: DynArtifactCache,
    source: DynArtifactSource,
    dispatch_lock: Arc<tokio::sync::Mutex<()>>,
    job_tx: Sender<Job>,
    job_rx: Arc<tokio::sync::Mutex<Receiver<Job>>>,
    max_attempts: Arc<AtomicU32>,
    retry_delay: Duration,
    pool_size: Arc<AtomicUsize>,
}

#[derive(Debug)]
pub(crate) struct CoreLoader {
    ctx: WorkerCtx,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl CoreLoader {
    pub(crate) fn new(
        config: CoreLoaderConfig,
        cache: DynArtifactCache,
        source: DynArtifactSource,
    ) -> Self {
        let (job_tx, job_rx) = channel::<Job>(config.channel_capacity);

        let out = Self {
            ctx: WorkerCtx {
                cache,
                source,
                dispatch_lock: Arc::new(tokio::sync::Mutex::new(())),
                job_tx,
                job_rx: Arc::new(tokio::sync::Mutex::new(job_rx)),
                max_attempts: Arc::new(AtomicU32::new(config.max_attempts)),
                retry_delay: Duration::from_millis(config.retry_delay_ms),
                pool_size: Arc::new(AtomicUsize::new(0)),
            },
            workers: Mutex::new(Vec::new()),
        };
        out.resize_pool(config.parallel_request_count as usize);
        out
    }

    /// The dispatch gate: cache hit delivers synchronously, cache miss
    /// enqueues a fetch job. Only the cache lookup runs under the
    /// dispatch lock.
    async fn dispatch(&self, request: FetchRequest) -> AfResult<()> {
        let guard = self.ctx.dispatch_lock.lock().await;
        let hit = self.ctx.cache.get(request.key.clone()).await?;
        // Workers need this lock for their cache writes. Holding it
        // across a send on the bounded queue would deadlock the pool
        // whenever the queue fills, and the sink below is arbitrary
        // caller code that must not run under a subsystem lock either.
        drop(guard);

        if let Some(artifact) = hit {
            let key = request.key.clone();
            deliver::deliver(
                &request,
                FetchOutcome {
                    key,
                    artifact: Some(artifact),
                },
            );
            return Ok(());
        }

        self.ctx
            .job_tx
            .send(Job { request })
            .await
            .map_err(|_| AfError::other("loader job queue closed"))
    }

    /// Bring the worker set to the requested size. Growing spawns
    /// workers for vacant slots; shrinking happens cooperatively when a
    /// surplus worker next picks up a job. A size of zero would leave
    /// queued jobs stranded with nothing to drain them, so the pool is
    /// clamped to at least one worker.
    fn resize_pool(&self, pool_size: usize) {
        let pool_size = pool_size.max(1);
        let mut workers = self.workers.lock().unwrap();
        self.ctx.pool_size.store(pool_size, Ordering::Release);

        while workers.len() < pool_size {
            let slot = workers.len();
            workers.push(tokio::task::spawn(Self::worker_task(
                slot,
                self.ctx.clone(),
            )));
        }
        // Revive slots whose workers retired during an earlier shrink.
        for (slot, worker) in workers.iter_mut().enumerate().take(pool_size) {
            if worker.is_finished() {
                *worker =
                    tokio::task::spawn(Self::worker_task(slot, self.ctx.clone()));
            }
        }
    }

    async fn worker_task(slot: usize, ctx: WorkerCtx) {
        loop {
            let job = ctx.job_rx.lock().await.recv().await;
            let Some(job) = job else {
                break;
            };

            if slot >= ctx.pool_size.load(Ordering::Acquire) {
                // This slot was retired while waiting. Hand the job back
                // to the queue and exit; if the queue won't take it, run
                // it here rather than drop it.
                match ctx.job_tx.try_send(job) {
                    Ok(()) => {}
                    Err(TrySendError::Full(job))
                    | Err(TrySendError::Closed(job)) => {
                        Self::run_job(&ctx, job).await;
                    }
                }
                break;
            }

            Self::run_job(&ctx, job).await;
        }
    }

    /// The retryable fetcher: runs one job to its terminal notification.
    async fn run_job(ctx: &WorkerCtx, job: Job) {
        let key = job.request.key.clone();
        let mut artifact = None;
        let mut attempt: u32 = 1;

        while attempt <= ctx.max_attempts.load(Ordering::Acquire) {
            match Self::attempt(ctx, &key).await {
                Ok(fetched) => {
                    artifact = Some(fetched);
                    break;
                }
                Err(err) => {
                    tracing::warn!(
                        "fetch for {key} failed (attempt {attempt}): {err}"
                    );
                    tokio::time::sleep(ctx.retry_delay).await;
                    attempt += 1;
                }
            }
        }

        deliver::deliver(&job.request, FetchOutcome { key, artifact });
    }

    /// One fetch attempt: load from the source, then write the cache.
    /// The cache write shares the dispatch critical section, and a write
    /// failure counts as a failure of the whole attempt.
    async fn attempt(
        ctx: &WorkerCtx,
        key: &ResourceKey,
    ) -> AfResult<Artifact> {
        let artifact = ctx.source.load(key.clone()).await?;

        let _guard = ctx.dispatch_lock.lock().await;
        ctx.cache.put(key.clone(), artifact.clone()).await?;

        Ok(artifact)
    }
}

impl Loader for CoreLoader {
    fn request(
        &self,
        key: ResourceKey,
        sink: DynDeliverySink,
    ) -> BoxFut<'_, AfResult<()>> {
        Box::pin(async move {
            self.dispatch(FetchRequest::new(key, sink)).await
        })
    }

    fn request_for_target(
        &self,
        key: ResourceKey,
        binding: TargetBinding,
        sink: DynDeliverySink,
    ) -> BoxFut<'_, AfResult<()>> {
        Box::pin(async move {
            self.dispatch(FetchRequest::for_target(key, sink, binding))
                .await
        })
    }

    fn clear_cache(&self) -> BoxFut<'_, AfResult<()>> {
        Box::pin(async move {
            let _guard = self.ctx.dispatch_lock.lock().await;
            self.ctx.cache.clear().await
        })
    }

    fn set_max_attempts(&self, max_attempts: u32) {
        self.ctx
            .max_attempts
            .store(max_attempts, Ordering::Release);
    }

    fn set_pool_size(&self, pool_size: usize) {
        self.resize_pool(pool_size);
    }
}

impl Drop for CoreLoader {
    fn drop(&mut self) {
        for worker in self.workers.lock().unwrap().iter() {
            worker.abort();
        }
    }
}
