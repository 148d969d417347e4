//! Courier error types

use thiserror::Error;

use crate::lifecycle::ProtocolViolation;

/// Errors that can occur while serving or orchestrating capabilities
#[derive(Debug, Error)]
pub enum CourierError {
    /// Inbound message is missing required content
    #[error("invalid input: {0}")]
    Input(String),

    /// An external provider failed or returned something unusable
    #[error("{provider} provider failed: {reason}")]
    Provider { provider: String, reason: String },

    /// A downstream capability call produced no usable result
    #[error("{capability} call failed: {reason}")]
    RemoteCall { capability: String, reason: String },

    /// Downstream agents could not be resolved before planning
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// Task event contract breach
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    /// Network or encoding failure below the protocol
    #[error("transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl CourierError {
    pub fn input(reason: impl Into<String>) -> Self {
        Self::Input(reason.into())
    }

    pub fn provider(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn remote_call(capability: impl Into<String>, reason: impl ToString) -> Self {
        Self::RemoteCall {
            capability: capability.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for CourierError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for CourierError {
    fn from(err: serde_json::Error) -> Self {
        Self::Transport(format!("malformed payload: {err}"))
    }
}

impl From<config::ConfigError> for CourierError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<regex::Error> for CourierError {
    fn from(err: regex::Error) -> Self {
        Self::Config(format!("invalid extraction rule: {err}"))
    }
}

/// Result alias used across the crate
pub type Result<T, E = CourierError> = std::result::Result<T, E>;
