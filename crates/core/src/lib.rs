#![deny(missing_docs)]
//! Artifetch cache-backed asynchronous fetch dispatch.
//!
//! Ask the loader for a resource key and it either delivers the cached
//! artifact immediately, or fetches it in the background on a fixed-size
//! worker pool, retrying transient failures with a fixed delay, and
//! delivers the result exactly once to the request's sink. Deliveries
//! whose target has since been reassigned to a different logical request
//! are detected and discarded.

use artifetch_api::{builder::Builder, config::Config};

/// Construct a production-ready default builder.
///
/// - `source` - The default source is [factories::HttpSource].
/// - `cache` - The default cache is [factories::MemCacheFactory].
/// - `loader` - The default loader is [factories::CoreLoaderFactory].
pub fn default_builder() -> Builder {
    Builder {
        config: Config::default(),
        source: factories::HttpSource::create(),
        cache: factories::MemCacheFactory::create(),
        loader: factories::CoreLoaderFactory::create(),
    }
}

pub mod factories;
