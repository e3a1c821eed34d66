//! Triage pipeline: runs every stage over one submission.
//!
//! **Core invariant: a run always produces a complete record.**
//!
//! Flow:
//! 1. Normalize raw fields into a timestamped submission
//! 2. Classify (inference, repaired by keyword rules)
//! 3. Route to channels (pure rules)
//! 4. Resolve authorities when authority email is required
//! 5. Generate safety suggestions
//!
//! Stages 2, 4 and 5 absorb their own inference failures. Anything that
//! still escapes (a panic below a stage) is caught here and replaced by the
//! degraded record.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{error, info};

use crate::config::TriageConfig;
use crate::error::PipelineError;
use crate::llm::InferenceClient;
use crate::pipeline::authority::AuthorityResolver;
use crate::pipeline::classifier::Classifier;
use crate::pipeline::feedback::FeedbackReviser;
use crate::pipeline::normalizer;
use crate::pipeline::routing;
use crate::pipeline::suggestions::SuggestionGenerator;
use crate::pipeline::types::{Classification, IncidentRecord, RoutingDecision, Submission};

/// The incident triage pipeline.
///
/// Stages run strictly in order; a run issues at most three inference calls
/// (classification, authority refinement, tailored suggestions).
pub struct TriagePipeline {
    classifier: Classifier,
    authorities: AuthorityResolver,
    suggestions: SuggestionGenerator,
    feedback: FeedbackReviser,
}

impl TriagePipeline {
    /// Create a pipeline whose stages share one inference client.
    pub fn new(client: InferenceClient, config: &TriageConfig) -> Self {
        Self {
            classifier: Classifier::new(client.clone(), config.classification),
            authorities: AuthorityResolver::new(client.clone(), config.authority_refinement),
            suggestions: SuggestionGenerator::new(client.clone(), config.creative_suggestions),
            feedback: FeedbackReviser::new(client, config.feedback),
        }
    }

    /// Triage raw form fields. Never fails.
    pub async fn run(&self, category: &str, location: &str, description: &str) -> IncidentRecord {
        let submission = normalizer::normalize(category, location, description);
        self.run_submission(submission).await
    }

    /// Triage an already normalized submission. Never fails.
    pub async fn run_submission(&self, submission: Submission) -> IncidentRecord {
        info!(
            category = %submission.category,
            location = %submission.location,
            "Triaging incident"
        );

        let outcome = AssertUnwindSafe(self.run_stages(&submission))
            .catch_unwind()
            .await;

        match outcome {
            Ok(record) => {
                info!(
                    classification = %record.classification_text().replace('\n', ", "),
                    routing = %record.routing,
                    authorities = %record.authority_routing,
                    "Incident triaged"
                );
                record
            }
            Err(payload) => {
                let failure = PipelineError::StagePanicked {
                    stage: "triage".to_string(),
                    reason: panic_message(payload.as_ref()),
                };
                error!(error = %failure, "Pipeline faulted, returning degraded record");
                IncidentRecord::degraded(submission)
            }
        }
    }

    async fn run_stages(&self, submission: &Submission) -> IncidentRecord {
        let classification = self.classifier.classify(submission).await;
        let routing = routing::decide(&classification);
        let authority_routing = self
            .authorities
            .resolve(submission, &classification, &routing)
            .await;
        let suggestions = self.suggestions.suggest(submission, &classification).await;

        IncidentRecord {
            submission: submission.clone(),
            classification: Some(classification),
            routing,
            authority_routing,
            suggestions,
        }
    }

    /// Ask for a revised classification given reporter feedback. The result
    /// is informational and does not change any stored routing.
    pub async fn revise(
        &self,
        submission: &Submission,
        classification: &Classification,
        routing: &RoutingDecision,
        feedback: &str,
    ) -> String {
        self.feedback
            .revise(submission, classification, routing, feedback)
            .await
    }

    /// Rebuild a classification from stored text, repairing as needed.
    pub fn reparse_classification(&self, text: &str, submission: &Submission) -> Classification {
        crate::pipeline::validator::validate(text, submission, self.classifier.rules())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
