//! Error types for Suraksha Setu.
//!
//! The triage pipeline itself never returns an error; these types cover the
//! layers around it (configuration, inference transport, persistence, uploads).

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Report store errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Could not open report database: {0}")]
    Pool(String),

    #[error("Report query failed: {0}")]
    Query(String),

    #[error("No {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("Stored report is malformed: {0}")]
    Serialization(String),
}

/// Inference service errors. Every variant makes the calling stage fall back.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Inference via {provider} failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Inference via {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Unusable reply from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Inference credentials rejected by {provider}")]
    AuthFailed { provider: String },

    #[error("Inference via {provider} exceeded {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Malformed JSON from inference service: {0}")]
    Json(#[from] serde_json::Error),
}

/// Faults around a triage run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A required form field was missing or unreadable.
    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    /// Caught inside `TriagePipeline::run` and logged, never returned.
    #[error("Stage {stage} panicked: {reason}")]
    StagePanicked { stage: String, reason: String },
}

/// Attachment upload errors.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Attachment {filename} rejected: {reason}")]
    Rejected { filename: String, reason: String },

    #[error("Could not write attachment: {0}")]
    Io(#[from] std::io::Error),
}
