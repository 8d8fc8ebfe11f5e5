//! Per-city fetch lifecycle.
//!
//! Statuses are never persisted; every city starts out `Idle`.

use serde::Serialize;

/// Fetch state for one city.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error(String),
}

impl FetchStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchStatus::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchStatus::Success)
    }

    /// The provider's message for a failed fetch.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            FetchStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    /// State after a fetch has been issued. Any state may start a new fetch.
    pub fn on_request(&self) -> Self {
        FetchStatus::Loading
    }

    /// State after the provider returned a snapshot.
    pub fn on_success(&self) -> Self {
        FetchStatus::Success
    }

    /// State after the provider failed with `message`.
    pub fn on_failure(&self, message: impl Into<String>) -> Self {
        FetchStatus::Error(message.into())
    }

    pub fn label(&self) -> &'static str {
        match self {
            FetchStatus::Idle => "idle",
            FetchStatus::Loading => "loading",
            FetchStatus::Success => "success",
            FetchStatus::Error(_) => "error",
        }
    }
}
