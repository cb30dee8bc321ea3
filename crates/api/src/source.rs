//! Artifetch artifact source types.

#[cfg(any(test, feature = "mockall"))]
use mockall::automock;

use crate::{AfResult, Artifact, BoxFut, ResourceKey};
use std::sync::Arc;

/// The collaborator that actually fetches the bytes for one resource and
/// decodes them into an artifact.
///
/// One call is one attempt. Any error return is treated by the loader as
/// a transient failure of that attempt; retry policy lives entirely on
/// the loader side.
#[cfg_attr(any(test, feature = "mockall"), automock)]
pub trait ArtifactSource: 'static + Send + Sync + std::fmt::Debug {
    /// Fetch and decode the artifact for a key.
    fn load(&self, key: ResourceKey) -> BoxFut<'_, AfResult<Artifact>>;
}

/// Trait object [ArtifactSource].
pub type DynArtifactSource = Arc<dyn ArtifactSource>;
