//! Builder-related types.

use crate::*;
use std::sync::Arc;

/// The general artifetch builder.
///
/// This contains both configuration and factory instances, allowing
/// construction of runtime module instances. Building produces the one
/// explicit subsystem handle ([DynLoader]) all further operations go
/// through; there is no global state, and independent builds are fully
/// isolated from each other. A handle's worker pool and cache identities
/// never change for its lifetime.
#[derive(Debug)]
pub struct Builder {
    /// The module configuration to be used when building modules.
    /// This can be loaded from disk or modified before building.
    pub config: config::Config,

    /// The [ArtifactSource] that fetches bytes for a key.
    pub source: DynArtifactSource,

    /// The [ArtifactCacheFactory] to be used for creating the
    /// [ArtifactCache] instance.
    pub cache: DynArtifactCacheFactory,

    /// The [LoaderFactory] to be used for creating the [Loader]
    /// instance.
    pub loader: DynLoaderFactory,
}

impl Builder {
    /// Construct a default config given the configured module factories.
    /// Note, this should be called before freezing the Builder instance
    /// by building it.
    pub fn set_default_config(&mut self) -> AfResult<()> {
        let Self {
            config,
            source: _,
            cache,
            loader,
        } = self;

        cache.default_config(config)?;
        loader.default_config(config)?;

        Ok(())
    }

    /// Convenience version of [Builder::set_default_config] that takes
    /// and returns the builder.
    pub fn with_default_config(mut self) -> AfResult<Self> {
        self.set_default_config()?;
        Ok(self)
    }

    /// Build the loader subsystem: create the cache, then the loader on
    /// top of it.
    pub async fn build(self) -> AfResult<DynLoader> {
        let builder = Arc::new(self);
        let cache = builder.cache.create(builder.clone()).await?;
        builder
            .loader
            .create(builder.clone(), cache, builder.source.clone())
            .await
    }
}
