//! Time-bounded inference client shared by every triage stage.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::CallSettings;
use crate::error::LlmError;
use crate::llm::costs::estimate_cost;
use crate::llm::provider::{ChatMessage, CompletionRequest, FinishReason, LlmProvider};

/// The one inference client of a process.
///
/// Wraps a provider with a per-call timeout. A call either returns the raw
/// reply text or an error; it is never retried.
#[derive(Clone)]
pub struct InferenceClient {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl InferenceClient {
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Submit a single-turn prompt and return the trimmed reply text.
    ///
    /// `purpose` only labels log lines.
    pub async fn submit(
        &self,
        purpose: &str,
        prompt: impl Into<String>,
        settings: CallSettings,
    ) -> Result<String, LlmError> {
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(settings.temperature)
            .with_max_tokens(settings.max_tokens);

        let response = match tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    purpose,
                    model = self.provider.model_name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Inference call timed out"
                );
                return Err(LlmError::Timeout {
                    provider: self.provider.model_name().to_string(),
                    timeout: self.timeout,
                });
            }
        };

        let cost = estimate_cost(
            self.provider.cost_per_token(),
            response.input_tokens,
            response.output_tokens,
        );
        debug!(
            purpose,
            model = self.provider.model_name(),
            response_id = response.response_id.as_deref().unwrap_or("-"),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            cost_usd = %cost,
            "Inference call completed"
        );

        // A cut-off reply is still returned; the validator repairs missing fields.
        match response.finish_reason {
            FinishReason::Length => warn!(
                purpose,
                max_tokens = settings.max_tokens,
                "Inference reply truncated at the token limit"
            ),
            FinishReason::ContentFilter => {
                warn!(purpose, "Inference reply stopped by the provider's content filter")
            }
            FinishReason::Stop | FinishReason::Unknown => {}
        }

        Ok(response.content.trim().to_string())
    }
}
