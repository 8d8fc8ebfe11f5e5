//! Centralized error types for Skycast.
//!
//! This module provides a typed error hierarchy that:
//! - Separates provider failures (recorded per city) from local faults
//! - Provides user-friendly messages suitable for display
//! - Preserves full error context for debugging/logging

use thiserror::Error;

/// Errors that stop the process before any command runs.
///
/// Fetch failures are recorded per city and persistence faults degrade to
/// defaults, so neither reaches this type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Weather provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Provider(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
        }
    }
}

/// Failures reaching or interpreting the weather provider.
///
/// The `Display` output is what ends up in a city's error status, so the
/// `Api` variant renders the provider's own message untouched.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Could not reach the weather service: {0}")]
    Unreachable(String),

    #[error("Weather service did not respond in time")]
    Timeout,

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),

    #[error("Weather provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ProviderError::Unreachable(_) => "Unable to connect. Check your internet connection.",
            ProviderError::Timeout => "The weather service is slow to respond. Please try again.",
            ProviderError::Api { status: 400, .. } => {
                "City not found. Check the spelling and try again."
            }
            ProviderError::Api { status: 401 | 403, .. } => {
                "Weather API key is invalid. Check settings."
            }
            ProviderError::Api { status, .. } if *status >= 500 => {
                "The weather service is having trouble. Please try again later."
            }
            ProviderError::Api { .. } => "Weather service error. Please try again.",
            ProviderError::InvalidResponse(_) => "Weather data could not be read.",
            ProviderError::NotConfigured(_) => "Weather service is not configured. Check settings.",
        }
    }
}

/// Key-value storage faults.
///
/// Stores catch these locally and fall back to defaults or skip the write.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Storage open failed: {0}")]
    OpenFailed(String),

    #[error("Read failed for '{key}': {message}")]
    ReadFailed { key: String, message: String },

    #[error("Write failed for '{key}': {message}")]
    WriteFailed { key: String, message: String },

    #[error("Stored data corrupted: {0}")]
    Corruption(String),
}

impl PersistenceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            PersistenceError::OpenFailed(_) => {
                "Unable to access saved preferences. Defaults will be used."
            }
            PersistenceError::ReadFailed { .. } => "Saved preferences could not be read.",
            PersistenceError::WriteFailed { .. } => "Preferences could not be saved.",
            PersistenceError::Corruption(_) => {
                "Saved preferences look corrupted. Consider resetting app data."
            }
        }
    }
}

/// A value rejected by an enum-backed setting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a valid {field}")]
pub struct ValidationError {
    pub field: &'static str,
    pub value: String,
}

impl ValidationError {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration not found. Using defaults.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

/// Classifies transport failures from reqwest.
pub trait ReqwestErrorExt {
    fn into_provider_error(self) -> ProviderError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_provider_error(self) -> ProviderError {
        if self.is_timeout() {
            ProviderError::Timeout
        } else if let Some(status) = self.status() {
            ProviderError::Api {
                status: status.as_u16(),
                message: format!("HTTP error {}", status.as_u16()),
            }
        } else if self.is_decode() {
            ProviderError::InvalidResponse(self.to_string())
        } else {
            ProviderError::Unreachable(self.to_string())
        }
    }
}

/// Extension trait for converting rusqlite errors to our error types.
pub trait RusqliteErrorExt {
    fn into_read_error(self, key: &str) -> PersistenceError;
    fn into_write_error(self, key: &str) -> PersistenceError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_read_error(self, key: &str) -> PersistenceError {
        match &self {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("corrupt") => {
                PersistenceError::Corruption(self.to_string())
            }
            _ => PersistenceError::ReadFailed {
                key: key.to_string(),
                message: self.to_string(),
            },
        }
    }

    fn into_write_error(self, key: &str) -> PersistenceError {
        match &self {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("corrupt") => {
                PersistenceError::Corruption(self.to_string())
            }
            _ => PersistenceError::WriteFailed {
                key: key.to_string(),
                message: self.to_string(),
            },
        }
    }
}
