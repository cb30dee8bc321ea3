//! Artifetch delivery sink types.

use crate::{Artifact, ResourceKey};
use std::sync::Arc;

/// The caller-supplied completion callback for fetch requests.
///
/// The sink is invoked exactly once per request, and only on a
/// successful, non-stale delivery; it is never invoked for exhausted
/// retries or for results whose target has been reassigned.
///
/// Delivery happens on whichever execution context the sink
/// implementation designates. A sink that must run on a particular
/// context (e.g. a UI loop) should marshal the call there itself,
/// typically by forwarding into a channel drained on that context, as
/// `artifetch_core`'s channel sink does.
pub trait DeliverySink: 'static + Send + Sync + std::fmt::Debug {
    /// Deliver a fetched artifact for the given key.
    fn deliver(&self, key: ResourceKey, artifact: Artifact);
}

/// Trait object [DeliverySink].
pub type DynDeliverySink = Arc<dyn DeliverySink>;
