//! Artifetch artifact cache types.
//!
//! The cache is an external collaborator of the loader: the loader only
//! consumes get/put/clear. Eviction policy, multi-tier persistence and
//! TTL expiry are entirely the cache implementation's business.

use crate::{AfResult, Artifact, BoxFut, ResourceKey};
use std::sync::Arc;

/// The artifact store backing a loader.
///
/// Implementations must be safe under concurrent multi-threaded use;
/// the loader calls them from arbitrary caller tasks and from pool
/// tasks. At most one artifact is stored per key, and artifacts are
/// immutable once stored.
pub trait ArtifactCache: 'static + Send + Sync + std::fmt::Debug {
    /// Get the cached artifact for a key, if present and not expired.
    fn get(
        &self,
        key: ResourceKey,
    ) -> BoxFut<'_, AfResult<Option<Artifact>>>;

    /// Store an artifact under a key, replacing any previous entry.
    fn put(
        &self,
        key: ResourceKey,
        artifact: Artifact,
    ) -> BoxFut<'_, AfResult<()>>;

    /// Remove all cached artifacts.
    fn clear(&self) -> BoxFut<'_, AfResult<()>>;

    /// The number of artifacts currently cached.
    fn size(&self) -> BoxFut<'_, AfResult<usize>>;
}

/// Trait object [ArtifactCache].
pub type DynArtifactCache = Arc<dyn ArtifactCache>;

/// A factory for creating ArtifactCache instances.
pub trait ArtifactCacheFactory:
    'static + Send + Sync + std::fmt::Debug
{
    /// Help the builder construct a default config from the chosen
    /// module factories.
    fn default_config(&self, config: &mut crate::config::Config)
        -> AfResult<()>;

    /// Construct an ArtifactCache instance.
    fn create(
        &self,
        builder: Arc<crate::builder::Builder>,
    ) -> BoxFut<'static, AfResult<DynArtifactCache>>;
}

/// Trait object [ArtifactCacheFactory].
pub type DynArtifactCacheFactory = Arc<dyn ArtifactCacheFactory>;
