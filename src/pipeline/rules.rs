//! Keyword rules engine for inference-free classification.
//!
//! Used whenever the classification reply is missing, unparseable, or lacks a
//! field. Each table is an ordered list of keyword rules; the first rule with
//! a keyword contained in the lower-cased description wins:
//! - type: protest, accident, fire, waterlogging, construction, crime, then
//!   a category check, then Others
//! - urgency: high, low, otherwise medium
//! - severity: 4, 3, 2, otherwise 3

use tracing::debug;

use crate::pipeline::matching::contains_any;
use crate::pipeline::types::{Classification, IncidentType, Severity, Submission, Urgency};

/// One ordered keyword rule.
#[derive(Debug, Clone)]
pub struct KeywordRule<T> {
    /// Lower-case substrings, any of which triggers the rule.
    pub keywords: &'static [&'static str],
    /// Value produced when the rule fires.
    pub outcome: T,
}

impl<T: Copy> KeywordRule<T> {
    fn evaluate(&self, text_lower: &str) -> Option<T> {
        contains_any(text_lower, self.keywords).then_some(self.outcome)
    }
}

/// Evaluate rules in order; first match wins.
fn first_match<T: Copy>(rules: &[KeywordRule<T>], text_lower: &str) -> Option<T> {
    rules.iter().find_map(|rule| rule.evaluate(text_lower))
}

/// Deterministic keyword classifier.
pub struct HeuristicClassifier {
    type_rules: Vec<KeywordRule<IncidentType>>,
    urgency_rules: Vec<KeywordRule<Urgency>>,
    severity_rules: Vec<KeywordRule<Severity>>,
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::default_rules()
    }
}

impl HeuristicClassifier {
    /// The standard keyword tables.
    pub fn default_rules() -> Self {
        let type_rules = vec![
            KeywordRule {
                keywords: &[
                    "march",
                    "protest",
                    "demonstration",
                    "rally",
                    "crowd",
                    "stampede",
                    "blockade",
                    "sit-in",
                ],
                outcome: IncidentType::ProtestMarch,
            },
            KeywordRule {
                keywords: &[
                    "accident",
                    "crash",
                    "collision",
                    "hit",
                    "injury",
                    "fall",
                    "roadblock",
                    "traffic jam",
                ],
                outcome: IncidentType::Accident,
            },
            KeywordRule {
                keywords: &[
                    "fire",
                    "burn",
                    "smoke",
                    "flame",
                    "explosion",
                    "blaze",
                    "gas leak",
                    "toxic",
                ],
                outcome: IncidentType::Fire,
            },
            KeywordRule {
                keywords: &[
                    "flood",
                    "water",
                    "rain",
                    "drainage",
                    "waterlog",
                    "standing water",
                    "overflow",
                ],
                outcome: IncidentType::Waterlogging,
            },
            KeywordRule {
                keywords: &[
                    "construction",
                    "work",
                    "building",
                    "road work",
                    "repair",
                    "infrastructure",
                    "pavement",
                    "digging",
                ],
                outcome: IncidentType::ConstructionWorkInProgress,
            },
            KeywordRule {
                keywords: &[
                    "theft", "crime", "steal", "assault", "vandal", "illegal", "robbery",
                    "burglary", "attack",
                ],
                outcome: IncidentType::Crime,
            },
        ];

        let urgency_rules = vec![
            KeywordRule {
                keywords: &[
                    "emergency",
                    "urgent",
                    "critical",
                    "danger",
                    "stampede",
                    "fire",
                    "accident",
                    "injured",
                    "many injured",
                    "crowd surge",
                    "blocked",
                    "panic",
                ],
                outcome: Urgency::High,
            },
            KeywordRule {
                keywords: &[
                    "minor",
                    "small",
                    "routine",
                    "scheduled",
                    "planned",
                    "normal",
                    "no immediate danger",
                    "not serious",
                    "not urgent",
                    "not critical",
                ],
                outcome: Urgency::Low,
            },
        ];

        let severity_rules = vec![
            KeywordRule {
                keywords: &[
                    "critical",
                    "major",
                    "stampede",
                    "emergency",
                    "hundreds",
                    "thousands",
                    "massive",
                    "severe",
                    "catastrophic",
                    "disaster",
                ],
                outcome: Severity::clamped(4),
            },
            KeywordRule {
                keywords: &[
                    "serious",
                    "significant",
                    "blocked",
                    "crowd",
                    "panic",
                    "dangerous",
                    "explosion",
                    "fire",
                    "injured",
                    "injuries",
                ],
                outcome: Severity::clamped(3),
            },
            KeywordRule {
                keywords: &[
                    "minor",
                    "small",
                    "few",
                    "limited",
                    "not serious",
                    "not critical",
                    "not urgent",
                    "not dangerous",
                ],
                outcome: Severity::clamped(2),
            },
        ];

        Self {
            type_rules,
            urgency_rules,
            severity_rules,
        }
    }

    /// Incident type from the description, then the reporter's category.
    pub fn infer_type(&self, description: &str, category: &str) -> IncidentType {
        let desc = description.to_lowercase();
        if let Some(t) = first_match(&self.type_rules, &desc) {
            debug!(incident_type = %t, "Type inferred from description keywords");
            return t;
        }

        let cat = category.to_lowercase();
        if cat.contains("protest") || cat.contains("march") {
            debug!("Type inferred from reporter category");
            return IncidentType::ProtestMarch;
        }

        IncidentType::Others
    }

    /// High if any high keyword occurs, else low if any low keyword, else
    /// medium. High wins even when both sets occur.
    pub fn infer_urgency(&self, description: &str) -> Urgency {
        first_match(&self.urgency_rules, &description.to_lowercase()).unwrap_or(Urgency::Medium)
    }

    /// 4, 3 or 2 by keyword tier; 3 when nothing matches.
    pub fn infer_severity(&self, description: &str) -> Severity {
        first_match(&self.severity_rules, &description.to_lowercase())
            .unwrap_or(Severity::MODERATE)
    }

    /// All three fields at once.
    pub fn classify(&self, submission: &Submission) -> Classification {
        Classification {
            incident_type: self.infer_type(&submission.description, &submission.category),
            urgency: self.infer_urgency(&submission.description),
            severity: self.infer_severity(&submission.description),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalizer::normalize;

    fn engine() -> HeuristicClassifier {
        HeuristicClassifier::default_rules()
    }

    #[test]
    fn small_fire_is_fire_high_moderate() {
        let s = normalize("Fire", "Sector 5", "Small fire near a dustbin, no injuries");
        let c = engine().classify(&s);
        assert_eq!(c.incident_type, IncidentType::Fire);
        // "fire" is a high-urgency keyword and is checked before "small".
        assert_eq!(c.urgency, Urgency::High);
        assert_eq!(c.severity.level(), 3);
    }

    #[test]
    fn protest_bucket_precedes_accident() {
        let t = engine().infer_type("Crowd gathered after a car crash", "Accident");
        assert_eq!(t, IncidentType::ProtestMarch);
    }

    #[test]
    fn bucket_order_accident_before_fire() {
        let t = engine().infer_type("Collision caused smoke from the engine", "");
        assert_eq!(t, IncidentType::Accident);
    }

    #[test]
    fn water_and_construction_and_crime() {
        let e = engine();
        assert_eq!(e.infer_type("Standing water near the bus stop", ""), IncidentType::Waterlogging);
        assert_eq!(e.infer_type("Digging on the main pavement", ""), IncidentType::ConstructionWorkInProgress);
        assert_eq!(e.infer_type("Bicycle theft outside the library", ""), IncidentType::Crime);
    }

    #[test]
    fn category_fallback_for_protest() {
        let e = engine();
        assert_eq!(e.infer_type("People with banners", "Protest"), IncidentType::ProtestMarch);
        assert_eq!(e.infer_type("People with banners", "Peace March"), IncidentType::ProtestMarch);
        assert_eq!(e.infer_type("People with banners", "Fire"), IncidentType::Others);
    }

    #[test]
    fn unmatched_description_is_others_medium_moderate() {
        let s = normalize("Other", "Park", "Unusual noise reported near the park gate");
        let c = engine().classify(&s);
        assert_eq!(c.incident_type, IncidentType::Others);
        assert_eq!(c.urgency, Urgency::Medium);
        assert_eq!(c.severity, Severity::MODERATE);
    }

    #[test]
    fn urgency_high_beats_low() {
        let e = engine();
        assert_eq!(e.infer_urgency("Minor scuffle but it is urgent"), Urgency::High);
        assert_eq!(e.infer_urgency("Routine maintenance"), Urgency::Low);
        assert_eq!(e.infer_urgency("Streetlight out"), Urgency::Medium);
    }

    #[test]
    fn severity_tiers() {
        let e = engine();
        assert_eq!(e.infer_severity("Massive traffic pileup").level(), 4);
        assert_eq!(e.infer_severity("Lane blocked").level(), 3);
        assert_eq!(e.infer_severity("A few potholes").level(), 2);
        assert_eq!(e.infer_severity("Streetlight out").level(), 3);
    }

    #[test]
    fn empty_submission_still_classifies() {
        let s = normalize("", "", "");
        let c = engine().classify(&s);
        assert_eq!(c.incident_type, IncidentType::Others);
        assert_eq!(c.urgency, Urgency::Medium);
        assert_eq!(c.severity, Severity::MODERATE);
    }

    #[test]
    fn same_input_gives_same_classification() {
        let cases = [
            ("Fire", "Small fire near a dustbin, no injuries"),
            ("Accident", "Two cars collided on the flyover"),
            ("Protest", "Crowd gathered near the collector's office"),
            ("Other", "Knee deep water outside the school"),
            ("", ""),
            ("Crime", "Chain snatching reported, suspect fled"),
        ];
        for (category, description) in cases {
            let first = engine().classify(&normalize(category, "Ward 7", description));
            let second = engine().classify(&normalize(category, "Ward 7", description));
            assert_eq!(first, second, "{category}: {description}");
            assert_eq!(
                engine().infer_type(description, category),
                first.incident_type,
                "{category}: {description}"
            );
        }
    }
}
