//! Error types for the engine and its image-source capability.

/// Errors raised by an [`ImageSource`](crate::source::ImageSource).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("URL sources are not supported: {0}")]
    UnsupportedUrl(String),

    #[error("image source error: {0}")]
    Backend(String),
}

/// Errors surfaced by the engine.
///
/// Argument errors only reach the caller under
/// [`ValidationPolicy::Strict`](crate::config::ValidationPolicy::Strict);
/// the permissive default logs and skips them instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid argument for {op}: {reason}")]
    InvalidArgument { op: &'static str, reason: String },

    #[error("missing argument for {op}: {name}")]
    MissingArgument {
        op: &'static str,
        name: &'static str,
    },

    #[error("pixel buffer holds {actual} samples, {width}x{height} RGBA needs {expected}")]
    BufferLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Whether this error comes from validating operation arguments.
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. } | Self::MissingArgument { .. }
        )
    }
}
