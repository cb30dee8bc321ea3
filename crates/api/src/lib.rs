#![deny(missing_docs)]
//! Artifetch API contains the artifetch module traits and the basic types
//! required to define the api of those traits.
//!
//! If you want to use artifetch itself, please see the artifetch_core
//! crate, which provides production implementations of these traits.

/// Boxed future type.
pub type BoxFut<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

pub mod builder;
pub mod config;

mod error;
pub use error::*;

mod types;
pub use types::*;

pub mod cache;
pub use cache::*;

pub mod source;
pub use source::*;

pub mod sink;
pub use sink::*;

pub mod loader;
pub use loader::*;
