//! Artifetch error types.

use std::sync::Arc;

/// A clonable trait-object inner error.
#[derive(Clone, Default)]
pub struct DynInnerError(
    pub Option<Arc<dyn std::error::Error + 'static + Send + Sync>>,
);

impl std::fmt::Debug for DynInnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Display for DynInnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.as_ref() {
            None => f.write_str("None"),
            Some(s) => s.fmt(f),
        }
    }
}

impl std::error::Error for DynInnerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.as_ref().map(|s| {
            let out: &(dyn std::error::Error + 'static) = &**s;
            out
        })
    }
}

impl DynInnerError {
    /// Construct a new DynInnerError from a source error.
    pub fn new<E: std::error::Error + 'static + Send + Sync>(e: E) -> Self {
        Self(Some(Arc::new(e)))
    }
}

/// The core artifetch error type. This type is used in all external
/// artifetch apis as well as internally in some modules.
///
/// This type is required to implement `Clone` to ease the use of
/// shared futures, which require the entire `Result` to be `Clone`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AfError {
    /// Generic artifetch internal error.
    #[error("{ctx} (src: {src})")]
    Other {
        /// Any context associated with this error.
        ctx: Arc<str>,

        /// The inner error (if any).
        #[source]
        src: DynInnerError,
    },
}

impl AfError {
    /// Construct an "other" error with an inner source error.
    pub fn other_src<
        C: std::fmt::Display,
        S: std::error::Error + 'static + Send + Sync,
    >(
        ctx: C,
        src: S,
    ) -> Self {
        Self::Other {
            ctx: ctx.to_string().into_boxed_str().into(),
            src: DynInnerError::new(src),
        }
    }

    /// Construct an "other" error.
    pub fn other<C: std::fmt::Display>(ctx: C) -> Self {
        Self::Other {
            ctx: ctx.to_string().into_boxed_str().into(),
            src: DynInnerError::default(),
        }
    }
}

/// The core artifetch result type.
pub type AfResult<T> = Result<T, AfError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            "cache unavailable (src: None)",
            AfError::other("cache unavailable").to_string().as_str(),
        );
        assert_eq!(
            "fetch failed (src: connection reset)",
            AfError::other_src(
                "fetch failed",
                std::io::Error::other("connection reset"),
            )
            .to_string()
            .as_str(),
        );
    }

    #[test]
    fn cloned_error_keeps_its_source_chain() {
        // Retry loops hand the same failure to logging and to shared
        // futures, so the clone must preserve the inner error.
        let err = AfError::other_src(
            "fetching http://images.test/a.png",
            std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "connect timed out",
            ),
        );
        let cloned = err.clone();

        let src = std::error::Error::source(&cloned)
            .expect("source chain dropped on clone");
        assert!(src.to_string().contains("connect timed out"));
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn ensure_error_type_is_send_and_sync() {
        fn ensure<T: std::fmt::Display + Send + Sync>(_t: T) {}
        ensure(AfError::other("cache unavailable"));
    }
}
