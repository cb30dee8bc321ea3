use artifetch_api::{Artifact, DeliverySink, DynDeliverySink, ResourceKey};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A [DeliverySink] that forwards deliveries into a channel.
///
/// This is the "deliver on the right execution context" building block:
/// the loader invokes the sink from whatever task completed the fetch,
/// and the caller drains the receiver on the context it designates (a UI
/// loop, a dedicated task, a test body).
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<(ResourceKey, Artifact)>,
}

/// Create a [ChannelSink] paired with the receiver to drain it from.
pub fn channel_sink() -> (
    DynDeliverySink,
    mpsc::UnboundedReceiver<(ResourceKey, Artifact)>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(ChannelSink { tx }), rx)
}

impl DeliverySink for ChannelSink {
    fn deliver(&self, key: ResourceKey, artifact: Artifact) {
        if let Err(err) = self.tx.send((key, artifact)) {
            let (key, _) = err.0;
            tracing::debug!("delivery for {key} dropped: receiver closed");
        }
    }
}
