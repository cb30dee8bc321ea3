//! Basic artifetch data types: resource keys, artifacts, targets and
//! fetch requests.

use crate::sink::DynDeliverySink;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

macro_rules! imp_deref {
    ($i:ty, $t:ty) => {
        impl std::ops::Deref for $i {
            type Target = $t;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
    };
}

/// The key identifying one fetchable resource, i.e. its URL.
///
// Backed by Arc<str> instead of String so requests, pool jobs and cache
// entries can share the key without reallocating.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey(pub Arc<str>);

imp_deref!(ResourceKey, str);

impl From<&str> for ResourceKey {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl From<String> for ResourceKey {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl std::fmt::Debug for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The decoded payload associated with a resource key.
///
/// Artifacts are immutable once stored; cloning is cheap.
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact(pub bytes::Bytes);

imp_deref!(Artifact, bytes::Bytes);

impl From<bytes::Bytes> for Artifact {
    fn from(b: bytes::Bytes) -> Self {
        Self(b)
    }
}

impl std::fmt::Debug for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Artifact({} bytes)", self.0.len())
    }
}

/// A caller-owned, reusable delivery target (e.g. a recycled list row).
///
/// The target tracks which logical request currently owns it through a
/// generation counter. The caller bumps the generation with
/// [Target::advance] every time the target is reassigned to a new
/// logical request; the loader only ever reads it, at delivery time, to
/// decide whether a completed fetch is still wanted.
#[derive(Debug, Default)]
pub struct Target {
    generation: AtomicU64,
}

impl Target {
    /// Construct a new target with generation 0.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The generation of the logical request that currently owns this
    /// target.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Reassign this target to a new logical request, returning the new
    /// generation.
    pub fn advance(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// The association between a [Target] and the generation it had when a
/// request was created. A delivery is stale, and must be discarded, when
/// the target's current generation no longer matches the captured one.
#[derive(Debug, Clone)]
pub struct TargetBinding {
    /// The target this binding refers to.
    pub target: Arc<Target>,

    /// The generation captured at request-creation time.
    pub generation: u64,
}

impl TargetBinding {
    /// Capture a binding of a target at its current generation.
    pub fn capture(target: &Arc<Target>) -> Self {
        Self {
            target: target.clone(),
            generation: target.generation(),
        }
    }

    /// True if the target has been reassigned since this binding was
    /// captured.
    pub fn is_stale(&self) -> bool {
        self.target.generation() != self.generation
    }
}

/// One request to fetch and deliver a resource. Immutable once created;
/// a request is created per call to a loader entry point and lives until
/// its terminal delivery is issued.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// The resource to fetch.
    pub key: ResourceKey,

    /// Where a successful, non-stale result is delivered.
    pub sink: DynDeliverySink,

    /// Generation scope for staleness suppression. Requests without a
    /// binding always deliver when an artifact is present.
    pub binding: Option<TargetBinding>,
}

impl FetchRequest {
    /// Construct an unscoped request.
    pub fn new(key: ResourceKey, sink: DynDeliverySink) -> Self {
        Self {
            key,
            sink,
            binding: None,
        }
    }

    /// Construct a request scoped to a target binding.
    pub fn for_target(
        key: ResourceKey,
        sink: DynDeliverySink,
        binding: TargetBinding,
    ) -> Self {
        Self {
            key,
            sink,
            binding: Some(binding),
        }
    }
}

/// The terminal result of one fetch request.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// The resource key this outcome is for.
    pub key: ResourceKey,

    /// The fetched artifact. Absent when all attempts were exhausted.
    pub artifact: Option<Artifact>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn binding_captures_generation_at_creation() {
        let target = Target::new();
        assert_eq!(0, target.generation());

        let binding = TargetBinding::capture(&target);
        assert!(!binding.is_stale());

        assert_eq!(1, target.advance());
        assert!(binding.is_stale());

        // a fresh binding is current again
        assert!(!TargetBinding::capture(&target).is_stale());
    }

    #[test]
    fn resource_key_cheap_clone_eq() {
        let a = ResourceKey::from("http://images.test/1.png");
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!("http://images.test/1.png", &*a);
    }
}
