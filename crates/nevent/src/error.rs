//! Error types for nevent
//!
//! Listener failures travel upwards: a listener returns [`ListenerError`],
//! `emit` wraps it in [`EmitError`], and the host boundary surfaces it as
//! [`HostError::Emit`].

use thiserror::Error;

use crate::handle::Handle;

/// Boxed error source carried by a listener failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error raised from inside a listener.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ListenerError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl ListenerError {
    /// Create a listener error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a listener error wrapping an underlying error.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

// Lets a listener forward a nested emit failure with `?`.
impl From<EmitError> for ListenerError {
    fn from(err: EmitError) -> Self {
        let message = format!("nested emit of '{}' failed", err.event());
        Self::with_source(message, err)
    }
}

/// Errors returned by `emit`.
#[derive(Error, Debug)]
pub enum EmitError {
    /// A listener failed; the rest of the dispatch was abandoned
    #[error("listener {index} for event '{event}' failed")]
    Listener {
        event: String,
        index: usize,
        #[source]
        source: ListenerError,
    },
}

impl EmitError {
    /// Name of the event whose dispatch failed.
    pub fn event(&self) -> &str {
        match self {
            Self::Listener { event, .. } => event,
        }
    }

    /// Position of the failing listener in the dispatch snapshot.
    pub fn index(&self) -> usize {
        match self {
            Self::Listener { index, .. } => *index,
        }
    }
}

/// Errors that can occur at the host boundary.
#[derive(Error, Debug)]
pub enum HostError {
    /// The handle was never created or has been finalized
    #[error("Invalid handle: {0}")]
    InvalidHandle(Handle),

    /// The object has no method with this name
    #[error("TypeError: {name} is not a function")]
    NotAFunction { name: String },

    /// No constructor was registered under this name
    #[error("Unknown constructor: {0}")]
    UnknownConstructor(String),

    /// A listener failed during `emit`
    #[error(transparent)]
    Emit(#[from] EmitError),

    /// Error thrown by a native method installed with `extend`
    #[error("{0}")]
    Native(String),
}

impl HostError {
    /// Create a native method error.
    pub fn native(message: impl Into<String>) -> Self {
        Self::Native(message.into())
    }
}

/// Result type alias for `emit`
pub type EmitResult<T> = Result<T, EmitError>;

/// Result type alias for host boundary calls
pub type HostResult<T> = Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_error_display() {
        let err = EmitError::Listener {
            event: "open".to_string(),
            index: 1,
            source: ListenerError::new("boom"),
        };
        assert_eq!(err.to_string(), "listener 1 for event 'open' failed");
        assert_eq!(
            std::error::Error::source(&err).map(ToString::to_string),
            Some("boom".to_string())
        );
        assert_eq!(err.event(), "open");
        assert_eq!(err.index(), 1);
    }

    #[test]
    fn test_listener_error_from_emit_error_keeps_source() {
        let inner = EmitError::Listener {
            event: "close".to_string(),
            index: 0,
            source: ListenerError::new("inner"),
        };
        let outer = ListenerError::from(inner);
        assert_eq!(outer.message(), "nested emit of 'close' failed");

        let chain: Vec<String> =
            std::iter::successors(Some(&outer as &dyn std::error::Error), |e| {
                std::error::Error::source(*e)
            })
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            chain,
            vec![
                "nested emit of 'close' failed",
                "listener 0 for event 'close' failed",
                "inner",
            ]
        );
    }

    #[test]
    fn test_host_error_display() {
        let err = HostError::NotAFunction {
            name: "fly".to_string(),
        };
        assert_eq!(err.to_string(), "TypeError: fly is not a function");
        assert_eq!(
            HostError::InvalidHandle(Handle::from_raw(3)).to_string(),
            "Invalid handle: #3"
        );
    }
}
