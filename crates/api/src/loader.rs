//! Artifetch loader types.

use crate::{
    builder, config, AfResult, BoxFut, DynArtifactCache, DynArtifactSource,
    DynDeliverySink, ResourceKey, TargetBinding,
};
use std::sync::Arc;

/// Trait for implementing a loader module that dispatches cache-backed
/// background fetches.
///
/// A loader either delivers a cached artifact immediately or schedules a
/// background fetch on its worker pool, retrying transient failures, and
/// issues exactly one terminal notification per request.
pub trait Loader: 'static + Send + Sync + std::fmt::Debug {
    /// Request a resource for an unscoped, one-off target. The sink is
    /// invoked if and when an artifact is available, with no staleness
    /// check applied.
    fn request(
        &self,
        key: ResourceKey,
        sink: DynDeliverySink,
    ) -> BoxFut<'_, AfResult<()>>;

    /// Request a resource on behalf of a reusable target. The binding
    /// carries the generation captured at request time; if the target
    /// has been reassigned by the time the fetch completes, the result
    /// is discarded instead of delivered.
    fn request_for_target(
        &self,
        key: ResourceKey,
        binding: TargetBinding,
        sink: DynDeliverySink,
    ) -> BoxFut<'_, AfResult<()>>;

    /// Clear all cached artifacts. Safe to call at any time; in-flight
    /// fetches are not cancelled and will still write their artifact
    /// back into the cache on completion.
    fn clear_cache(&self) -> BoxFut<'_, AfResult<()>>;

    /// Set how many attempts a fetch may make before giving up. Applies
    /// at the next retry-loop iteration, including for jobs already
    /// running.
    fn set_max_attempts(&self, max_attempts: u32);

    /// Set the number of worker-pool slots. Applies to subsequently
    /// scheduled jobs; queued and running jobs are never dropped. A
    /// size of zero is clamped to one so the queue always drains.
    fn set_pool_size(&self, pool_size: usize);
}

/// Trait object [Loader].
pub type DynLoader = Arc<dyn Loader>;

/// A factory for creating Loader instances.
pub trait LoaderFactory: 'static + Send + Sync + std::fmt::Debug {
    /// Help the builder construct a default config from the chosen
    /// module factories.
    fn default_config(&self, config: &mut config::Config) -> AfResult<()>;

    /// Construct a Loader instance.
    fn create(
        &self,
        builder: Arc<builder::Builder>,
        cache: DynArtifactCache,
        source: DynArtifactSource,
    ) -> BoxFut<'static, AfResult<DynLoader>>;
}

/// Trait object [LoaderFactory].
pub type DynLoaderFactory = Arc<dyn LoaderFactory>;
