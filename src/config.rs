//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

/// Sampling limits for one kind of inference call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Triage pipeline configuration.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Upper bound on any single inference call.
    pub inference_timeout: Duration,
    /// Type/urgency/severity classification (kept near-deterministic).
    pub classification: CallSettings,
    /// Ranked authority list for complex incidents.
    pub authority_refinement: CallSettings,
    /// Situation-specific safety suggestions.
    pub creative_suggestions: CallSettings,
    /// Feedback-driven re-classification.
    pub feedback: CallSettings,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            inference_timeout: Duration::from_secs(20),
            classification: CallSettings {
                temperature: 0.1,
                max_tokens: 128,
            },
            authority_refinement: CallSettings {
                temperature: 0.1,
                max_tokens: 128,
            },
            creative_suggestions: CallSettings {
                temperature: 0.7,
                max_tokens: 512,
            },
            feedback: CallSettings {
                temperature: 0.2,
                max_tokens: 384,
            },
        }
    }
}

impl TriageConfig {
    /// Defaults overridden by `SURAKSHA_INFERENCE_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let inference_timeout = std::env::var("SURAKSHA_INFERENCE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.inference_timeout);

        Self {
            inference_timeout,
            ..defaults
        }
    }
}

/// HTTP server and storage configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    /// Directory for daily-rotated log files; stderr only when unset.
    pub log_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port: u16 = std::env::var("SURAKSHA_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8000);

        let db_path = std::env::var("SURAKSHA_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/suraksha.db"));

        let upload_dir = std::env::var("SURAKSHA_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/uploads"));

        let log_dir = std::env::var("SURAKSHA_LOG_DIR").ok().map(PathBuf::from);

        Self {
            port,
            db_path,
            upload_dir,
            log_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_cooler_than_suggestions() {
        let config = TriageConfig::default();
        assert!(config.classification.temperature < config.creative_suggestions.temperature);
        assert_eq!(config.inference_timeout, Duration::from_secs(20));
    }
}
