//! Repairs free-text classification replies into a valid [`Classification`].
//!
//! The reply is read line by line for `Type:`, `Urgency:` and `Severity:`
//! entries (keys are case-insensitive). A field is accepted only if it maps
//! into its closed vocabulary; a later accepted line overrides an earlier
//! one, while a later rejected line leaves the earlier value in place. Any
//! field still missing is filled from the keyword rules.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::pipeline::matching::match_label;
use crate::pipeline::rules::HeuristicClassifier;
use crate::pipeline::types::{Classification, IncidentType, Severity, Submission, Urgency};

static FIELD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(type|urgency|severity)\s*:(.*)$").expect("field line regex is valid")
});

/// Fields recovered from a reply before any repair.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParsedFields {
    pub incident_type: Option<IncidentType>,
    pub urgency: Option<Urgency>,
    pub severity: Option<Severity>,
}

impl ParsedFields {
    pub fn is_complete(&self) -> bool {
        self.incident_type.is_some() && self.urgency.is_some() && self.severity.is_some()
    }
}

/// Map a raw `Type:` value onto the canonical labels.
pub fn match_incident_type(value: &str) -> Option<IncidentType> {
    let candidates: Vec<(&str, IncidentType)> =
        IncidentType::ALL.iter().map(|t| (t.label(), *t)).collect();
    match_label(value, &candidates)
}

/// Extract whatever valid fields the reply contains.
pub fn parse_fields(reply: &str) -> ParsedFields {
    let mut fields = ParsedFields::default();

    for line in reply.lines() {
        let Some(caps) = FIELD_LINE.captures(line) else {
            continue;
        };
        let value = caps[2].trim();
        match caps[1].to_lowercase().as_str() {
            "type" => {
                if let Some(t) = match_incident_type(value) {
                    fields.incident_type = Some(t);
                }
            }
            "urgency" => {
                if let Some(u) = Urgency::from_label(value) {
                    fields.urgency = Some(u);
                }
            }
            "severity" => {
                if let Some(s) = Severity::from_label(value) {
                    fields.severity = Some(s);
                }
            }
            _ => {}
        }
    }

    fields
}

/// Repair a reply against the submission; always yields a full triple.
pub fn validate(reply: &str, submission: &Submission, rules: &HeuristicClassifier) -> Classification {
    let fields = parse_fields(reply);
    if !fields.is_complete() {
        debug!(
            has_type = fields.incident_type.is_some(),
            has_urgency = fields.urgency.is_some(),
            has_severity = fields.severity.is_some(),
            "Classification reply incomplete, filling from keyword rules"
        );
    }

    Classification {
        incident_type: fields.incident_type.unwrap_or_else(|| {
            rules.infer_type(&submission.description, &submission.category)
        }),
        urgency: fields
            .urgency
            .unwrap_or_else(|| rules.infer_urgency(&submission.description)),
        severity: fields
            .severity
            .unwrap_or_else(|| rules.infer_severity(&submission.description)),
    }
}
