//! Reporter feedback: asks for a revised classification.
//!
//! The reply is returned verbatim and never fed back into routing.

use tracing::warn;

use crate::config::CallSettings;
use crate::llm::InferenceClient;
use crate::pipeline::types::{Classification, IncidentType, RoutingDecision, Submission};

/// Build the feedback review prompt.
pub fn build_feedback_prompt(
    submission: &Submission,
    classification: &Classification,
    routing: &RoutingDecision,
    feedback: &str,
) -> String {
    let types: Vec<&str> = IncidentType::ALL.iter().map(|t| t.label()).collect();

    format!(
        "Review and improve the incident classification based on user feedback:

Original Incident: {description}
Original Classification: {classification}
Original Routing: {routing}
User Feedback: {feedback}

Available incident types: {types}

Provide an improved classification considering the user's input. Format as:
Type: [type]
Urgency: [level]
Severity: [number]
Reasoning: [brief explanation]",
        description = submission.description,
        classification = classification.to_text(),
        routing = routing,
        feedback = feedback,
        types = types.join(", "),
    )
}

pub struct FeedbackReviser {
    client: InferenceClient,
    settings: CallSettings,
}

impl FeedbackReviser {
    pub fn new(client: InferenceClient, settings: CallSettings) -> Self {
        Self { client, settings }
    }

    /// The service's reply, or `Error processing feedback: …` on failure.
    pub async fn revise(
        &self,
        submission: &Submission,
        classification: &Classification,
        routing: &RoutingDecision,
        feedback: &str,
    ) -> String {
        let prompt = build_feedback_prompt(submission, classification, routing, feedback);
        match self.client.submit("feedback", prompt, self.settings).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Feedback revision failed");
                format!("Error processing feedback: {e}")
            }
        }
    }
}
