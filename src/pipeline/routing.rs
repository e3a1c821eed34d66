//! Channel routing: who hears about an incident.

use crate::pipeline::types::{Classification, IncidentType, RoutingDecision, Urgency};

/// Whether authorities must be emailed in addition to the community push.
///
/// True when severity is 4 or more, when an accident, crime or fire has at
/// least medium urgency, or when a protest is high urgency.
pub fn requires_authority_notification(classification: &Classification) -> bool {
    if classification.severity.is_serious() {
        return true;
    }

    let elevated = matches!(classification.urgency, Urgency::Medium | Urgency::High);
    match classification.incident_type {
        IncidentType::Accident | IncidentType::Crime | IncidentType::Fire => elevated,
        IncidentType::ProtestMarch => classification.urgency == Urgency::High,
        _ => false,
    }
}

/// Route a classified incident.
pub fn decide(classification: &Classification) -> RoutingDecision {
    if requires_authority_notification(classification) {
        RoutingDecision::community_and_authorities()
    } else {
        RoutingDecision::community_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::Severity;

    fn c(incident_type: IncidentType, urgency: Urgency, severity: u8) -> Classification {
        Classification {
            incident_type,
            urgency,
            severity: Severity::clamped(severity),
        }
    }

    #[test]
    fn serious_severity_always_notifies() {
        for t in IncidentType::ALL {
            assert!(decide(&c(t, Urgency::Low, 4)).notifies_authorities());
            assert!(decide(&c(t, Urgency::Low, 5)).notifies_authorities());
        }
    }

    #[test]
    fn critical_types_need_medium_urgency() {
        for t in [IncidentType::Accident, IncidentType::Crime, IncidentType::Fire] {
            assert!(requires_authority_notification(&c(t, Urgency::Medium, 2)));
            assert!(requires_authority_notification(&c(t, Urgency::High, 1)));
            assert!(!requires_authority_notification(&c(t, Urgency::Low, 3)));
        }
    }

    #[test]
    fn protest_needs_high_urgency() {
        assert!(requires_authority_notification(&c(IncidentType::ProtestMarch, Urgency::High, 2)));
        assert!(!requires_authority_notification(&c(IncidentType::ProtestMarch, Urgency::Medium, 3)));
    }

    #[test]
    fn other_types_stay_in_community() {
        let decision = decide(&c(IncidentType::Waterlogging, Urgency::High, 3));
        assert_eq!(decision.to_string(), "community push notification");
        assert!(!decide(&c(IncidentType::Others, Urgency::High, 3)).notifies_authorities());
    }

    #[test]
    fn fire_high_is_routed_to_both() {
        let decision = decide(&c(IncidentType::Fire, Urgency::High, 3));
        assert_eq!(
            decision.to_string(),
            "community push notification;authority email"
        );
    }
}
