//! An in-memory artifact cache tier.

use artifetch_api::{
    AfResult, Artifact, ArtifactCache, ArtifactCacheFactory, BoxFut,
    DynArtifactCache, DynArtifactCacheFactory, ResourceKey,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;


const MOD_NAME: &str = "memCache";

/// MemCache configuration types.
pub mod config {
    /// Configuration parameters for [MemCacheFactory](super::MemCacheFactory).
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct MemCacheConfig {
        /// The maximum number of artifacts held before the oldest entry
        /// is evicted. Default: 25.
        pub capacity: usize,
        /// Entries older than this many minutes are expired on lookup.
        /// Default: 1440 (one day).
        pub ttl_minutes: u32,
    }

    impl Default for MemCacheConfig {
        fn default() -> Self {
            Self {
                capacity: 25,
                ttl_minutes: 24 * 60,
            }
        }
    }

    /// Module-level configuration for MemCache.
    #[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct MemCacheModConfig {
        /// MemCache configuration.
        pub mem_cache: MemCacheConfig,
    }

    impl artifetch_api::config::ModConfig for MemCacheModConfig {}
}

use config::*;

#[derive(Debug)]
struct Entry {
    artifact: Artifact,
    stored_at: Instant,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<ResourceKey, Entry>,
    // Insertion order, for FIFO eviction. Only keys currently present
    // in `entries` appear here.
    order: VecDeque<ResourceKey>,
}

/// An in-memory implementation of the [ArtifactCache].
///
/// Holds up to `capacity` artifacts, evicting in FIFO order, and expires
/// entries lazily on lookup once they outlive the TTL.
#[derive(Debug)]
pub struct MemCache {
    inner: Arc<Mutex<Inner>>,
    capacity: usize,
    ttl: Duration,
}

impl MemCache {
    pub(crate) fn new(capacity: usize, ttl: Duration) -> DynArtifactCache {
        Arc::new(Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            capacity,
            ttl,
        })
    }

    /// Create a new [MemCache] from its config.
    pub fn create(config: MemCacheConfig) -> DynArtifactCache {
        Self::new(
            config.capacity,
            Duration::from_secs(config.ttl_minutes as u64 * 60),
        )
    }
}

impl ArtifactCache for MemCache {
    fn get(
        &self,
        key: ResourceKey,
    ) -> BoxFut<'_, AfResult<Option<Artifact>>> {
        let inner = self.inner.clone();
        let ttl = self.ttl;
        Box::pin(async move {
            let mut inner = inner.lock().await;
            match inner.entries.get(&key) {
                None => return Ok(None),
                Some(entry) if entry.stored_at.elapsed() <= ttl => {
                    return Ok(Some(entry.artifact.clone()));
                }
                Some(_) => {}
            }
            // outlived its ttl, expire it now
            inner.entries.remove(&key);
            inner.order.retain(|k| k != &key);
            Ok(None)
        })
    }

    fn put(
        &self,
        key: ResourceKey,
        artifact: Artifact,
    ) -> BoxFut<'_, AfResult<()>> {
        let inner = self.inner.clone();
        let capacity = self.capacity;
        Box::pin(async move {
            let mut inner = inner.lock().await;

            if !inner.entries.contains_key(&key) {
                while inner.entries.len() >= capacity {
                    let Some(oldest) = inner.order.pop_front() else {
                        break;
                    };
                    inner.entries.remove(&oldest);
                }
                inner.order.push_back(key.clone());
            }

            inner.entries.insert(
                key,
                Entry {
                    artifact,
                    stored_at: Instant::now(),
                },
            );
            Ok(())
        })
    }

    fn clear(&self) -> BoxFut<'_, AfResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut inner = inner.lock().await;
            inner.entries.clear();
            inner.order.clear();
            Ok(())
        })
    }

    fn size(&self) -> BoxFut<'_, AfResult<usize>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.lock().await.entries.len()) })
    }
}

/// A factory for creating [MemCache] instances.
#[derive(Debug)]
pub struct MemCacheFactory;

impl MemCacheFactory {
    /// Construct a new [MemCacheFactory].
    pub fn create() -> DynArtifactCacheFactory {
        Arc::new(MemCacheFactory)
    }
}

impl ArtifactCacheFactory for MemCacheFactory {
    fn default_config(
        &self,
        config: &mut artifetch_api::config::Config,
    ) -> AfResult<()> {
        config.add_default_module_config::<MemCacheModConfig>(MOD_NAME.into())
    }

    fn create(
        &self,
        builder: Arc<artifetch_api::builder::Builder>,
    ) -> BoxFut<'static, AfResult<DynArtifactCache>> {
        Box::pin(async move {
            let config: MemCacheModConfig =
                builder.config.get_module_config(MOD_NAME)?;
            Ok(MemCache::create(config.mem_cache))
        })
    }
}
