//! Error types for foliobot.

/// Top-level error type for the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Send error: {0}")]
    Send(#[from] SendError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Build error: {0}")]
    Build(#[from] BuildError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Outbound messaging errors.
///
/// A provider-side quota condition is *not* an error — `Messenger::send_text`
/// reports it as `SendOutcome::QuotaExceeded` so transition processing never
/// fails just because the user could not be notified.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Failed to send message to {to}: {reason}")]
    SendFailed { to: String, reason: String },

    #[error("Messenger not configured: {0}")]
    NotConfigured(String),
}

/// Project-source fetch errors.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid identifier or upstream error for {username}: {reason}")]
    Upstream { username: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Portfolio build errors.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("No draft data found for {participant}")]
    DraftMissing { participant: String },

    #[error("Store error during build: {0}")]
    Store(#[from] StoreError),

    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    #[error("Failed to publish artifact: {0}")]
    Publish(String),
}

/// Result type alias for the engine.
pub type Result<T> = std::result::Result<T, Error>;
