use std::error::Error;
use std::fmt;

/// Boxed error source from a pluggable implementation (codec, server, ...).
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Recoverable errors surfaced by the invocation core.
///
/// These cover the "call could not be completed" channel: resolution
/// failures, codec failures, server lifecycle failures. Application-level
/// failures travel as an [`Exception`](weft_types::Exception) attached to an
/// otherwise well-formed response instead, distinguishing "the service
/// reported a business error" from "the call never completed".
#[derive(Debug)]
pub enum CoreError {
    /// Lazy deserialization was attempted with no serialization attached.
    MissingSerialization,
    /// A serialization implementation failed to encode or decode a payload.
    Codec(BoxError),
    /// A server failed to open or bind.
    Server(String),
    /// A message handler rejected a provider registration.
    Handler(String),
    /// A registry operation failed.
    Registry(String),
}

impl CoreError {
    /// Wrap a codec-level failure.
    pub fn codec(err: impl Into<BoxError>) -> Self {
        CoreError::Codec(err.into())
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::MissingSerialization => {
                write!(f, "cannot deserialize: no serialization attached to value")
            }
            CoreError::Codec(e) => write!(f, "codec error: {e}"),
            CoreError::Server(msg) => write!(f, "server error: {msg}"),
            CoreError::Handler(msg) => write!(f, "message handler error: {msg}"),
            CoreError::Registry(msg) => write!(f, "registry error: {msg}"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CoreError::Codec(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_serialization_is_descriptive() {
        let msg = CoreError::MissingSerialization.to_string();
        assert!(msg.contains("no serialization"));
    }

    #[test]
    fn codec_error_keeps_source() {
        let err = CoreError::codec(std::io::Error::other("truncated payload"));
        assert!(err.to_string().contains("truncated payload"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
