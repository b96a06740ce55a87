//! Error types for the relay core.
//!
//! Each component surfaces its own failure type:
//!
//! - [`DispatchError`] from [`DispatchHub::send_request`](crate::mediator::DispatchHub::send_request)
//! - [`NotifyError`] (an aggregate of [`ListenerFailure`]s) from
//!   [`NotificationBus::notify`](crate::observer::NotificationBus::notify)
//! - [`ValidationRejected`] from
//!   [`Intercepted::try_set`](crate::interception::Intercepted::try_set)
//! - [`ConfigError`] from [`RelayConfig`](crate::config::RelayConfig) loading

use std::fmt;

use thiserror::Error;

/// Failure while routing a request through the dispatch hub.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No live participant is registered under the recipient name.
    #[error("recipient not found: '{recipient}'")]
    RecipientNotFound { recipient: String },

    /// The request chain exceeded the depth guard or looped back to a
    /// participant that is already handling a request.
    #[error("reentrant dispatch at depth {depth}: {}", .chain.join(" -> "))]
    ReentrantDispatch { depth: usize, chain: Vec<String> },

    /// The receiving participant's handler reported an error.
    #[error("participant '{participant}' failed: {message}")]
    Handler { participant: String, message: String },
}

impl DispatchError {
    /// Convenience constructor for handler-side failures.
    pub fn handler(participant: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handler {
            participant: participant.into(),
            message: message.into(),
        }
    }
}

/// Error returned by a listener callback.
///
/// Listeners should not panic; they return `ListenerError` to signal
/// problems. The bus logs it and keeps notifying the remaining listeners.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ListenerError {
    pub message: String,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for ListenerError {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ListenerError {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One listener's failure during a `notify` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFailure {
    /// Name of the failing listener.
    pub listener: String,
    /// Position of the listener in the topic's subscription order.
    pub index: usize,
    /// What went wrong (error message or panic payload).
    pub message: String,
    /// Whether the listener panicked rather than returning an error.
    pub panicked: bool,
}

impl fmt::Display for ListenerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.panicked { "panicked" } else { "failed" };
        write!(
            f,
            "listener '{}' (#{}) {}: {}",
            self.listener, self.index, kind, self.message
        )
    }
}

/// Aggregate of listener failures from a single `notify` call.
///
/// Every listener still ran; `delivered` counts all invocations, including
/// the failed ones.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} of {delivered} listener(s) failed on topic '{topic}'", .failures.len())]
pub struct NotifyError {
    pub topic: String,
    pub delivered: usize,
    pub failures: Vec<ListenerFailure>,
}

/// A write refused by an interception policy.
///
/// Never raised as a panic: [`Intercepted::set`](crate::interception::Intercepted::set)
/// turns it into `false`, and the target keeps its prior value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("write to '{key}' rejected: {reason}")]
pub struct ValidationRejected {
    pub key: String,
    pub reason: String,
}

impl ValidationRejected {
    pub fn new(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Failure while loading a [`RelayConfig`](crate::config::RelayConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_display() {
        let err = DispatchError::RecipientNotFound {
            recipient: "service".into(),
        };
        assert_eq!(err.to_string(), "recipient not found: 'service'");

        let err = DispatchError::ReentrantDispatch {
            depth: 3,
            chain: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "reentrant dispatch at depth 3: a -> b -> a");
    }

    #[test]
    fn test_notify_error_display() {
        let err = NotifyError {
            topic: "invite".into(),
            delivered: 2,
            failures: vec![ListenerFailure {
                listener: "call".into(),
                index: 0,
                message: "line busy".into(),
                panicked: false,
            }],
        };
        assert_eq!(err.to_string(), "1 of 2 listener(s) failed on topic 'invite'");
        assert_eq!(
            err.failures[0].to_string(),
            "listener 'call' (#0) failed: line busy"
        );
    }

    #[test]
    fn test_validation_rejected_display() {
        let err = ValidationRejected::new("age", "must be >= 0");
        assert_eq!(err.to_string(), "write to 'age' rejected: must be >= 0");
    }
}
