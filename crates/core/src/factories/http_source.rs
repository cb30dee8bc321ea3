use artifetch_api::{
    AfError, AfResult, Artifact, ArtifactSource, BoxFut, DynArtifactSource,
    ResourceKey,
};
use std::sync::Arc;

/// An [ArtifactSource] that fetches artifact bytes over HTTP(S).
///
/// One call is one GET of the resource URL; a non-success status is an
/// error like any transport failure, leaving retries to the loader.
#[derive(Debug)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    /// Construct a new HttpSource with a default client.
    pub fn create() -> DynArtifactSource {
        Arc::new(Self {
            client: reqwest::Client::new(),
        })
    }
}

impl ArtifactSource for HttpSource {
    fn load(&self, key: ResourceKey) -> BoxFut<'_, AfResult<Artifact>> {
        Box::pin(async move {
            let response = self
                .client
                .get(&*key)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| {
                    AfError::other_src(format!("failed to fetch {key}"), e)
                })?;
            let bytes = response.bytes().await.map_err(|e| {
                AfError::other_src(
                    format!("failed to read response body for {key}"),
                    e,
                )
            })?;
            Ok(Artifact::from(bytes))
        })
    }
}
