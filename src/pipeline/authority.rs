//! Authority resolution for incidents routed to authority email.
//!
//! A deterministic list is built first: the type's primary authorities,
//! then contextual additions from description keywords and severity. For
//! complex incidents an inference call may re-rank that list; its reply is
//! only accepted if at least one known authority can be recovered from it.

use tracing::{debug, info, warn};

use crate::config::CallSettings;
use crate::llm::InferenceClient;
use crate::pipeline::matching::{Signal, contains_any, fired_names, is_complex_case, match_label, word_count};
use crate::pipeline::types::{
    Authority, AuthorityRouting, AuthoritySet, Classification, IncidentType, RoutingDecision,
    Severity, Submission,
};

/// Contextual keyword groups and the authorities each one adds.
const CONTEXT_RULES: &[(&[&str], &[Authority])] = &[
    (
        &["injured", "hurt", "ambulance", "medical", "hospital", "unconscious", "bleeding"],
        &[Authority::MedicalEmergency],
    ),
    (
        &["blocked", "traffic", "road", "highway", "junction", "signal", "vehicle"],
        &[Authority::TrafficPolice],
    ),
    (
        &["explosion", "gas leak", "chemical", "toxic", "smoke", "burning"],
        &[Authority::FireAndEmergency],
    ),
    (
        &["collapse", "building", "infrastructure", "evacuation", "rescue", "trapped"],
        &[Authority::DisasterRelief],
    ),
    (
        &["100", "many", "crowd", "stampede", "mass", "multiple"],
        &[Authority::MedicalEmergency, Authority::DisasterRelief],
    ),
];

/// Authorities every incident of a type is routed to first.
pub fn primary_authorities(incident_type: IncidentType) -> &'static [Authority] {
    match incident_type {
        IncidentType::Accident => &[Authority::Police, Authority::MedicalEmergency],
        IncidentType::Crime => &[Authority::Police],
        IncidentType::Fire => &[Authority::FireAndEmergency, Authority::MedicalEmergency],
        IncidentType::Waterlogging => &[Authority::DisasterRelief],
        IncidentType::ConstructionWorkInProgress => &[Authority::TrafficPolice],
        IncidentType::ProtestMarch => &[Authority::Police, Authority::TrafficPolice],
        IncidentType::Others => &[Authority::Police],
    }
}

/// Additions implied by the description and severity, in rule order.
/// May contain duplicates.
pub fn contextual_authorities(description_lower: &str, severity: Severity) -> Vec<Authority> {
    let mut additions = Vec::new();
    for (keywords, authorities) in CONTEXT_RULES {
        if contains_any(description_lower, keywords) {
            additions.extend_from_slice(authorities);
        }
    }
    if severity.is_serious() {
        additions.extend_from_slice(&[Authority::MedicalEmergency, Authority::DisasterRelief]);
    }
    additions
}

/// Primary plus contextual authorities, deduplicated in first-seen order.
pub fn deterministic_authorities(submission: &Submission, classification: &Classification) -> Vec<Authority> {
    let description = submission.description_lower();
    let mut unique: Vec<Authority> = Vec::new();
    let candidates = primary_authorities(classification.incident_type)
        .iter()
        .copied()
        .chain(contextual_authorities(&description, classification.severity));
    for authority in candidates {
        if !unique.contains(&authority) {
            unique.push(authority);
        }
    }
    unique
}

/// Signals that mark an incident as complex enough for a refinement call.
pub fn refinement_signals(description_lower: &str, current: &[Authority]) -> Vec<Signal> {
    vec![
        Signal::new("many_authorities", current.len() >= 3),
        Signal::new(
            "multiple_parties",
            contains_any(description_lower, &["multiple", "various"]),
        ),
        Signal::new(
            "hazardous",
            contains_any(description_lower, &["chemical", "toxic", "explosion", "terror", "bomb"]),
        ),
        Signal::new(
            "sensitive_venue",
            contains_any(description_lower, &["hospital", "school", "stadium", "mall", "airport"]),
        ),
        Signal::new("stampede", description_lower.contains("stampede")),
        Signal::new("detailed", word_count(description_lower) > 20),
    ]
}

/// Build the refinement prompt.
pub fn build_refinement_prompt(
    submission: &Submission,
    classification: &Classification,
    current: &[Authority],
) -> String {
    let current_list: Vec<&str> = current.iter().map(|a| a.label()).collect();

    format!(
        "You are an emergency response coordinator. Analyze this incident and determine which \
specific authorities should be notified.

INCIDENT DETAILS:
Description: {description}
Location: {location}
Classification: {classification}
Currently Identified Authorities: {current}

AVAILABLE AUTHORITIES:
- Police Department: General law enforcement, crime, crowd control, security
- Department of Fire and Emergency Services: Fires, explosions, hazardous materials, technical rescue
- Department of Traffic Police: Traffic management, road accidents, vehicle-related incidents
- Department of Disaster Relief: Natural disasters, evacuations, large-scale emergencies, infrastructure collapse
- Department of Medical Emergency: Medical emergencies, injuries, ambulance services, health hazards

ANALYSIS REQUIREMENTS:
1. Consider the primary nature of the incident
2. Identify secondary risks and complications
3. Think about resource coordination needs
4. Consider public safety implications
5. Account for potential escalation

Based on this incident, which authorities should be notified? List them in order of priority.
Respond with ONLY the authority names, separated by commas. Maximum 4 authorities.",
        description = submission.description,
        location = submission.location,
        classification = classification.to_text(),
        current = current_list.join(", "),
    )
}

/// Recover known authorities from a comma/newline separated reply.
///
/// Each part maps to the first authority it matches (bidirectional
/// containment); duplicates are dropped and at most four are kept. Empty
/// parts are skipped.
pub fn parse_authority_reply(reply: &str) -> Vec<Authority> {
    let candidates: Vec<(&str, Authority)> =
        Authority::ALL.iter().map(|a| (a.label(), *a)).collect();

    let mut authorities = Vec::new();
    for part in reply.split([',', '\n']) {
        match match_label(part, &candidates) {
            Some(authority) if !authorities.contains(&authority) => authorities.push(authority),
            _ => {}
        }
    }
    authorities.truncate(AuthoritySet::MAX_LEN);
    authorities
}

/// Chooses which authorities to notify.
pub struct AuthorityResolver {
    client: InferenceClient,
    settings: CallSettings,
}

impl AuthorityResolver {
    pub fn new(client: InferenceClient, settings: CallSettings) -> Self {
        Self { client, settings }
    }

    /// `NotRequired` unless the routing decision includes authority email.
    pub async fn resolve(
        &self,
        submission: &Submission,
        classification: &Classification,
        routing: &RoutingDecision,
    ) -> AuthorityRouting {
        if !routing.notifies_authorities() {
            return AuthorityRouting::NotRequired;
        }

        let current = deterministic_authorities(submission, classification);
        let signals = refinement_signals(&submission.description_lower(), &current);

        let chosen = if is_complex_case(&signals) {
            info!(signals = ?fired_names(&signals), "Complex incident, refining authority list");
            self.refine(submission, classification, &current).await
        } else {
            current
        };

        let set = AuthoritySet::from_ordered(chosen);
        debug!(authorities = %set, "Authorities resolved");
        AuthorityRouting::Notify(set)
    }

    /// Ask the inference service to re-rank; keep `current` on any failure
    /// or when nothing usable comes back.
    async fn refine(
        &self,
        submission: &Submission,
        classification: &Classification,
        current: &[Authority],
    ) -> Vec<Authority> {
        let prompt = build_refinement_prompt(submission, classification, current);
        match self.client.submit("authority_refinement", prompt, self.settings).await {
            Ok(reply) => {
                let refined = parse_authority_reply(&reply);
                if refined.is_empty() {
                    warn!("Authority reply named no known authority, keeping rule-based list");
                    current.to_vec()
                } else {
                    refined
                }
            }
            Err(e) => {
                warn!(error = %e, "Authority refinement failed, keeping rule-based list");
                current.to_vec()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::TriageConfig;
    use crate::llm::client::testing::{ScriptedLlm, client};
    use crate::pipeline::normalizer::normalize;
    use crate::pipeline::types::Urgency;

    fn c(incident_type: IncidentType, urgency: Urgency, severity: u8) -> Classification {
        Classification {
            incident_type,
            urgency,
            severity: Severity::clamped(severity),
        }
    }

    fn resolver(llm: Arc<ScriptedLlm>) -> AuthorityResolver {
        AuthorityResolver::new(client(llm), TriageConfig::default().authority_refinement)
    }

    #[test]
    fn primary_then_context_deduplicated() {
        let s = normalize("Accident", "NH48", "Car crash, driver injured, traffic backed up");
        let list = deterministic_authorities(&s, &c(IncidentType::Accident, Urgency::High, 3));
        assert_eq!(
            list,
            vec![Authority::Police, Authority::MedicalEmergency, Authority::TrafficPolice]
        );
    }

    #[test]
    fn serious_severity_adds_medical_and_disaster() {
        let s = normalize("Waterlogging", "x", "Water everywhere");
        let list = deterministic_authorities(&s, &c(IncidentType::Waterlogging, Urgency::High, 4));
        assert_eq!(list, vec![Authority::DisasterRelief, Authority::MedicalEmergency]);
    }

    #[test]
    fn scale_keywords_add_two_authorities() {
        let extra = contextual_authorities("a crowd of people", Severity::MODERATE);
        assert_eq!(extra, vec![Authority::MedicalEmergency, Authority::DisasterRelief]);
        assert!(contextual_authorities("quiet street", Severity::MODERATE).is_empty());
    }

    #[test]
    fn parse_reply_matches_dedups_and_caps() {
        let reply = "Department of Medical Emergency, Police Department\nPolice, \
Department of Traffic Police, Department of Disaster Relief, Department of Fire and Emergency Services";
        assert_eq!(
            parse_authority_reply(reply),
            vec![
                Authority::MedicalEmergency,
                Authority::Police,
                Authority::TrafficPolice,
                Authority::DisasterRelief,
            ]
        );
    }

    #[test]
    fn parse_reply_ignores_empty_parts_and_noise() {
        assert_eq!(parse_authority_reply("Police Department,"), vec![Authority::Police]);
        assert!(parse_authority_reply("The army, the navy").is_empty());
        assert!(parse_authority_reply("").is_empty());
    }

    #[test]
    fn signals_need_two_hits() {
        let one = refinement_signals("stampede near gate", &[Authority::Police]);
        assert!(!is_complex_case(&one));
        let two = refinement_signals("stampede near the stadium gate", &[Authority::Police]);
        assert!(is_complex_case(&two));
    }

    #[tokio::test]
    async fn not_required_without_authority_email() {
        let llm = Arc::new(ScriptedLlm::always("Police Department"));
        let s = normalize("Other", "x", "Streetlight out");
        let routing = resolver(llm.clone())
            .resolve(&s, &c(IncidentType::Others, Urgency::Low, 2), &RoutingDecision::community_only())
            .await;
        assert_eq!(routing, AuthorityRouting::NotRequired);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn simple_case_skips_inference() {
        let llm = Arc::new(ScriptedLlm::always("Department of Disaster Relief"));
        let s = normalize("Fire", "Sector 5", "Small fire near a dustbin, no injuries");
        let routing = resolver(llm.clone())
            .resolve(
                &s,
                &c(IncidentType::Fire, Urgency::High, 3),
                &RoutingDecision::community_and_authorities(),
            )
            .await;
        assert_eq!(
            routing.to_string(),
            "Department of Fire and Emergency Services; Department of Medical Emergency"
        );
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn complex_case_uses_refined_list() {
        let llm = Arc::new(ScriptedLlm::always(
            "Police Department, Department of Medical Emergency",
        ));
        let s = normalize("Protest", "Stadium", "Stampede at the stadium exit");
        let routing = resolver(llm.clone())
            .resolve(
                &s,
                &c(IncidentType::ProtestMarch, Urgency::High, 4),
                &RoutingDecision::community_and_authorities(),
            )
            .await;
        assert_eq!(llm.calls(), 1);
        assert_eq!(
            routing.to_string(),
            "Police Department; Department of Medical Emergency"
        );
    }

    #[tokio::test]
    async fn failed_refinement_keeps_deterministic_list() {
        let llm = Arc::new(ScriptedLlm::failing());
        let s = normalize("Protest", "Stadium", "Stampede at the stadium exit");
        let classification = c(IncidentType::ProtestMarch, Urgency::High, 4);
        let routing = resolver(llm.clone())
            .resolve(&s, &classification, &RoutingDecision::community_and_authorities())
            .await;
        let expected = AuthoritySet::from_ordered(deterministic_authorities(&s, &classification));
        assert_eq!(routing, AuthorityRouting::Notify(expected));
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn unusable_reply_keeps_deterministic_list() {
        let llm = Arc::new(ScriptedLlm::always("Call everyone!"));
        let s = normalize("Protest", "Stadium", "Stampede at the stadium exit");
        let classification = c(IncidentType::ProtestMarch, Urgency::High, 4);
        let routing = resolver(llm)
            .resolve(&s, &classification, &RoutingDecision::community_and_authorities())
            .await;
        let set = routing.authorities().unwrap();
        assert_eq!(set.as_slice()[0], Authority::Police);
        assert!(set.len() <= AuthoritySet::MAX_LEN);
    }
}
