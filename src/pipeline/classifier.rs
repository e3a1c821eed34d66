//! Inference-backed classification with keyword fallback.

use tracing::{debug, warn};

use crate::config::CallSettings;
use crate::llm::InferenceClient;
use crate::pipeline::rules::HeuristicClassifier;
use crate::pipeline::types::{Classification, IncidentType, Submission};
use crate::pipeline::validator;

/// Classifies a submission into type, urgency and severity.
///
/// Never fails: an inference error yields the keyword classification, and a
/// reply is repaired field by field.
pub struct Classifier {
    client: InferenceClient,
    settings: CallSettings,
    rules: HeuristicClassifier,
}

impl Classifier {
    pub fn new(client: InferenceClient, settings: CallSettings) -> Self {
        Self {
            client,
            settings,
            rules: HeuristicClassifier::default_rules(),
        }
    }

    pub fn rules(&self) -> &HeuristicClassifier {
        &self.rules
    }

    pub async fn classify(&self, submission: &Submission) -> Classification {
        let prompt = build_classification_prompt(submission);

        match self.client.submit("classification", prompt, self.settings).await {
            Ok(reply) => {
                let classification = validator::validate(&reply, submission, &self.rules);
                debug!(
                    incident_type = %classification.incident_type,
                    urgency = %classification.urgency,
                    severity = %classification.severity,
                    "Classification complete"
                );
                classification
            }
            Err(e) => {
                warn!(error = %e, "Classification call failed, using keyword rules");
                self.rules.classify(submission)
            }
        }
    }
}

/// Build the classification prompt.
pub fn build_classification_prompt(submission: &Submission) -> String {
    let categories: String = IncidentType::ALL
        .iter()
        .map(|t| format!("- {}\n", t.label()))
        .collect();

    format!(
        "You are an incident classification system. Analyze the following incident and \
classify it into ONE of these exact categories:

INCIDENT CATEGORIES (choose exactly one):
{categories}
Incident Details:
Description: {description}
Category: {category}
Location: {location}

Classification Guidelines:
- Accident: Vehicle crashes, falls, injuries, collisions
- Crime: Theft, assault, vandalism, illegal activities
- Waterlogging: Flooding, water accumulation, drainage issues
- Construction Work in Progress: Road work, building construction, infrastructure development
- Fire: Fires, smoke, burning incidents
- Protest / March: Demonstrations, rallies, marches, crowds, stampedes
- Others: Anything that doesn't fit the above categories

Urgency Guidelines:
- low: Minor issues, no immediate danger
- medium: Moderate concern, some disruption
- high: Serious situation, immediate attention needed

Severity Guidelines:
- 1: Very minor, minimal impact
- 2: Minor, limited impact
- 3: Moderate, noticeable impact
- 4: Serious, significant impact
- 5: Critical, major impact or danger

Based on the incident description \"{description}\", provide your classification in this EXACT format:
Type: [choose one from the categories above]
Urgency: [low/medium/high]
Severity: [1/2/3/4/5]",
        description = submission.description,
        category = submission.category,
        location = submission.location,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::TriageConfig;
    use crate::llm::client::testing::{ScriptedLlm, SlowLlm, client};
    use crate::pipeline::normalizer::normalize;
    use crate::pipeline::types::Urgency;

    fn classifier(llm: Arc<dyn crate::llm::LlmProvider>) -> Classifier {
        Classifier::new(client(llm), TriageConfig::default().classification)
    }

    #[test]
    fn prompt_lists_categories_and_format() {
        let s = normalize("Fire", "Sector 5", "Smoke from a shop");
        let prompt = build_classification_prompt(&s);
        for t in IncidentType::ALL {
            assert!(prompt.contains(&format!("- {}\n", t.label())));
        }
        assert!(prompt.contains("Description: Smoke from a shop"));
        assert!(prompt.contains("Location: Sector 5"));
        assert!(prompt.contains("Urgency: [low/medium/high]"));
        assert!(prompt.contains("Severity: [1/2/3/4/5]"));
    }

    #[tokio::test]
    async fn uses_valid_reply() {
        let llm = Arc::new(ScriptedLlm::always("Type: Crime\nUrgency: medium\nSeverity: 2"));
        let s = normalize("Other", "Market", "Someone snatched a phone");
        let c = classifier(llm.clone()).classify(&s).await;
        assert_eq!(c.incident_type, IncidentType::Crime);
        assert_eq!(c.urgency, Urgency::Medium);
        assert_eq!(c.severity.level(), 2);
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn failure_falls_back_to_rules() {
        let s = normalize("Fire", "Sector 5", "Small fire near a dustbin, no injuries");
        let c = classifier(Arc::new(ScriptedLlm::failing())).classify(&s).await;
        assert_eq!(c, HeuristicClassifier::default_rules().classify(&s));
    }

    #[tokio::test]
    async fn timeout_falls_back_to_rules() {
        let s = normalize("Other", "Park", "Unusual noise reported near the park gate");
        let c = classifier(Arc::new(SlowLlm)).classify(&s).await;
        assert_eq!(c.incident_type, IncidentType::Others);
        assert_eq!(c.urgency, Urgency::Medium);
        assert_eq!(c.severity.level(), 3);
    }
}
