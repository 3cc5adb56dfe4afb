//! Error types for a sync run
//!
//! Every variant here is fatal: the run stops and nothing further is
//! compared or added. Per-item add failures are not errors; they are
//! recorded as [`crate::sync::SyncOutcome::AddFailed`].

use thiserror::Error;

/// Fatal sync errors
#[derive(Error, Debug)]
pub enum SyncError {
    /// The source listing could not be fetched or parsed
    #[error("Failed to scrape source catalog: {message}")]
    Scrape {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The credential exchange did not succeed
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The target catalog could not be fetched or was malformed
    #[error("Failed to fetch library modules: {message}")]
    CatalogFetch { message: String },

    /// Invalid or unreadable configuration
    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl SyncError {
    pub fn scrape(message: impl Into<String>) -> Self {
        SyncError::Scrape {
            message: message.into(),
            source: None,
        }
    }

    pub fn scrape_transport(message: impl Into<String>, source: reqwest::Error) -> Self {
        SyncError::Scrape {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        SyncError::Authentication {
            message: message.into(),
        }
    }

    pub fn catalog_fetch(message: impl Into<String>) -> Self {
        SyncError::CatalogFetch {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        SyncError::Config {
            message: message.into(),
        }
    }

    /// The bare message without the category prefix
    pub fn message(&self) -> &str {
        match self {
            SyncError::Scrape { message, .. }
            | SyncError::Authentication { message }
            | SyncError::CatalogFetch { message }
            | SyncError::Config { message } => message,
        }
    }
}
