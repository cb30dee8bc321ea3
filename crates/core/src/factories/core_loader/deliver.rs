use artifetch_api::{FetchOutcome, FetchRequest};

/// Issue the terminal notification for a request, exactly once.
///
/// An outcome without an artifact is dropped silently, that is the
/// terminal state of exhausted retries. An outcome whose target binding
/// no longer matches the target's current generation is stale, the
/// original requester has been reassigned in the meantime, and is
/// discarded without side effects. Everything else goes to the sink.
pub(super) fn deliver(request: &FetchRequest, outcome: FetchOutcome) {
    let Some(artifact) = outcome.artifact else {
        tracing::debug!(
            "fetch for {} exhausted all attempts, nothing to deliver",
            outcome.key
        );
        return;
    };

    if let Some(binding) = &request.binding {
        if binding.is_stale() {
            tracing::debug!(
                "discarding stale delivery for {}: target reassigned \
                 (generation {} is now {})",
                outcome.key,
                binding.generation,
                binding.target.generation(),
            );
            return;
        }
    }

    request.sink.deliver(outcome.key, artifact);
}
