//! Error types for the shop responder.

use std::path::PathBuf;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Response catalog loading errors. Both are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read response catalog {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed response catalog {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Marketplace API (and lookup service) errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Request to {endpoint} failed: {reason}")]
    Http { endpoint: String, reason: String },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("{endpoint} returned API error {error}: {message}")]
    Api {
        endpoint: String,
        error: String,
        message: String,
    },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

/// Per-message processing errors. None of these escape a cycle.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("No reply templates configured for category '{0}'")]
    CategoryNotFound(String),
}
