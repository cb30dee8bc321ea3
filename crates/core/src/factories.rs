//! Factories for generating instances of artifetch modules.

pub mod core_loader;
pub use core_loader::CoreLoaderFactory;

pub mod mem_cache;
pub use mem_cache::MemCacheFactory;

mod http_source;
pub use http_source::*;

mod channel_sink;
pub use channel_sink::*;
