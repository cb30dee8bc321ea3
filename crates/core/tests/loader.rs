use artifetch_api::{
    builder::Builder, config::Config, AfError, AfResult, Artifact,
    ArtifactSource, BoxFut, DynLoader, ResourceKey, Target, TargetBinding,
};
use artifetch_core::factories::{
    channel_sink, CoreLoaderFactory, MemCacheFactory,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

type Delivery = (ResourceKey, Artifact);

fn enable_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// A source scripted per key: fail the first N attempts, then succeed
/// with the key bytes as the artifact. Counts every attempt per key.
#[derive(Debug)]
struct ScriptedSource {
    fail_first: HashMap<&'static str, u32>,
    attempts: Mutex<HashMap<String, u32>>,
}

impl ScriptedSource {
    fn new(fail_first: HashMap<&'static str, u32>) -> Arc<Self> {
        Arc::new(Self {
            fail_first,
            attempts: Mutex::new(HashMap::new()),
        })
    }

    fn attempts_for(&self, key: &str) -> u32 {
        self.attempts
            .lock()
            .unwrap()
            .get(key)
            .copied()
            .unwrap_or(0)
    }
}

impl ArtifactSource for ScriptedSource {
    fn load(&self, key: ResourceKey) -> BoxFut<'_, AfResult<Artifact>> {
        Box::pin(async move {
            let attempt = {
                let mut attempts = self.attempts.lock().unwrap();
                let count = attempts.entry(key.to_string()).or_insert(0);
                *count += 1;
                *count
            };
            let fail_first =
                self.fail_first.get(&*key).copied().unwrap_or(0);
            if attempt <= fail_first {
                Err(AfError::other(format!("connection to {key} refused")))
            } else {
                Ok(Artifact::from(bytes::Bytes::copy_from_slice(
                    key.as_bytes(),
                )))
            }
        })
    }
}

async fn make_loader(source: Arc<ScriptedSource>) -> DynLoader {
    // fast retries for tests, everything else at defaults
    let config: Config = serde_json::from_str(
        r#"{
      "coreLoader": { "coreLoader": { "retryDelayMs": 10 } }
    }"#,
    )
    .unwrap();

    Builder {
        config,
        source,
        cache: MemCacheFactory::create(),
        loader: CoreLoaderFactory::create(),
    }
    .build()
    .await
    .unwrap()
}

async fn expect_delivery(rx: &mut UnboundedReceiver<Delivery>) -> Delivery {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for delivery")
        .expect("sink channel closed")
}

async fn expect_no_delivery(rx: &mut UnboundedReceiver<Delivery>) {
    // `Ok(None)` is the channel closing because the dropped request
    // released the last sink sender — a terminal no-delivery signal,
    // not a delivery.
    match tokio::time::timeout(Duration::from_millis(200), rx.recv()).await {
        Ok(Some(delivery)) => panic!("unexpected delivery: {delivery:?}"),
        Ok(None) | Err(_) => {}
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_success_on_second_attempt_then_cache_hit() {
    enable_tracing();

    let source = ScriptedSource::new([("img1", 1)].into_iter().collect());
    let loader = make_loader(source.clone()).await;

    let key = ResourceKey::from("img1");
    let (sink, mut rx) = channel_sink();
    loader.request(key.clone(), sink.clone()).await.unwrap();

    let (delivered_key, delivered) = expect_delivery(&mut rx).await;
    assert_eq!(key, delivered_key);
    assert_eq!(b"img1", &delivered[..]);
    assert_eq!(2, source.attempts_for("img1"));

    // a second request is served from the cache, synchronously and
    // without touching the source again
    loader.request(key.clone(), sink).await.unwrap();
    let (delivered_key, _) = rx.try_recv().unwrap();
    assert_eq!(key, delivered_key);
    assert_eq!(2, source.attempts_for("img1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn exhausted_attempts_never_deliver() {
    enable_tracing();

    let source =
        ScriptedSource::new([("img2", u32::MAX)].into_iter().collect());
    let loader = make_loader(source.clone()).await;

    let (sink, mut rx) = channel_sink();
    loader
        .request(ResourceKey::from("img2"), sink.clone())
        .await
        .unwrap();

    expect_no_delivery(&mut rx).await;
    assert_eq!(3, source.attempts_for("img2"));

    // nothing was cached, a later request fetches again
    loader
        .request(ResourceKey::from("img2"), sink)
        .await
        .unwrap();
    expect_no_delivery(&mut rx).await;
    assert_eq!(6, source.attempts_for("img2"));
}

#[tokio::test(flavor = "multi_thread")]
async fn reassigned_target_suppresses_delivery() {
    enable_tracing();

    // two failing attempts keep the fetch in flight long enough for the
    // target to be reassigned under it
    let source = ScriptedSource::new([("row", 2)].into_iter().collect());
    let loader = make_loader(source.clone()).await;

    let target = Target::new();
    for _ in 0..5 {
        target.advance();
    }
    assert_eq!(5, target.generation());
    let binding = TargetBinding::capture(&target);

    let (sink, mut rx) = channel_sink();
    loader
        .request_for_target(ResourceKey::from("row"), binding, sink)
        .await
        .unwrap();

    // the row is rebound to generation 6 before the fetch completes
    target.advance();

    expect_no_delivery(&mut rx).await;
    assert_eq!(3, source.attempts_for("row"));
}

#[tokio::test(flavor = "multi_thread")]
async fn clear_cache_forces_refetch() {
    enable_tracing();

    let source = ScriptedSource::new(HashMap::new());
    let loader = make_loader(source.clone()).await;

    let key = ResourceKey::from("img3");
    let (sink, mut rx) = channel_sink();

    loader.request(key.clone(), sink.clone()).await.unwrap();
    expect_delivery(&mut rx).await;
    assert_eq!(1, source.attempts_for("img3"));

    loader.clear_cache().await.unwrap();

    loader.request(key, sink).await.unwrap();
    expect_delivery(&mut rx).await;
    assert_eq!(2, source.attempts_for("img3"));
}
