//! Error types for mixin operations.

use thiserror::Error;

/// Errors that can occur while installing or driving the mixin.
#[derive(Debug, Error)]
pub enum MixinError {
    /// A host or plugin argument had the wrong shape
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The calling context carries no handler stack under the configured property
    #[error("Handler stack not found on host: {0}")]
    MissingStack(String),

    /// A `use` or `run` slot was dispatched while empty
    #[error("Method not defined on host: {0}")]
    MissingMethod(String),

    /// Unbound call after the installed host was dropped
    #[error("Host has been released")]
    HostReleased,

    /// Lock poisoned by a panicking plugin
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    /// Failure raised by a plugin, hook or handler
    #[error("Plugin failed: {0}")]
    Plugin(String),

    /// Foreign error raised by a plugin, hook or handler
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl MixinError {
    /// Host passed to `install` is neither an object nor a function.
    pub fn invalid_host() -> Self {
        Self::InvalidArgument("expect host to be an object or function".into())
    }

    /// Value passed to `use` is not callable.
    pub fn invalid_plugin() -> Self {
        Self::InvalidArgument("expects fn to be a function".into())
    }

    /// Convenience for plugin authors.
    pub fn plugin(message: impl Into<String>) -> Self {
        Self::Plugin(message.into())
    }
}

/// Result type for mixin operations
pub type Result<T> = std::result::Result<T, MixinError>;
