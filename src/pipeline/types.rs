//! Shared types for the incident triage pipeline.

use std::fmt;

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize};

// ── Submission ──────────────────────────────────────────────────────

/// A raw incident report as entered by a reporter, stamped at intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Category picked by the reporter (free text, not trusted).
    pub category: String,
    /// Location text, optionally ending in `(lat, lng)`.
    pub location: String,
    /// Free-text description.
    pub description: String,
    /// Intake time in the fixed +05:30 offset.
    pub submitted_at: DateTime<FixedOffset>,
}

impl Submission {
    /// ISO-8601 timestamp with microsecond precision.
    pub fn timestamp(&self) -> String {
        self.submitted_at
            .to_rfc3339_opts(SecondsFormat::Micros, false)
    }

    /// Lower-cased description used by every keyword rule.
    pub fn description_lower(&self) -> String {
        self.description.to_lowercase()
    }
}

// ── Classification ──────────────────────────────────────────────────

/// Canonical incident categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentType {
    Accident,
    Crime,
    Waterlogging,
    #[serde(rename = "Construction Work in Progress")]
    ConstructionWorkInProgress,
    Fire,
    #[serde(rename = "Protest / March")]
    ProtestMarch,
    Others,
}

impl IncidentType {
    /// Every type, in canonical (first-match-wins) order.
    pub const ALL: [IncidentType; 7] = [
        Self::Accident,
        Self::Crime,
        Self::Waterlogging,
        Self::ConstructionWorkInProgress,
        Self::Fire,
        Self::ProtestMarch,
        Self::Others,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Accident => "Accident",
            Self::Crime => "Crime",
            Self::Waterlogging => "Waterlogging",
            Self::ConstructionWorkInProgress => "Construction Work in Progress",
            Self::Fire => "Fire",
            Self::ProtestMarch => "Protest / March",
            Self::Others => "Others",
        }
    }
}

impl fmt::Display for IncidentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How quickly the incident needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub const ALL: [Urgency; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Exact (case-insensitive) membership in {low, medium, high}.
    pub fn from_label(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|u| u.as_str() == value)
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Impact level on a 1–5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Severity(u8);

impl Severity {
    pub const MIN: Severity = Severity(1);
    pub const MODERATE: Severity = Severity(3);
    pub const MAX: Severity = Severity(5);

    /// `None` outside 1..=5.
    pub fn new(level: u8) -> Option<Self> {
        (1..=5).contains(&level).then_some(Self(level))
    }

    /// Clamp any level into 1..=5.
    pub const fn clamped(level: u8) -> Self {
        if level < 1 {
            Self(1)
        } else if level > 5 {
            Self(5)
        } else {
            Self(level)
        }
    }

    /// Exact textual membership in {"1".."5"}; "4.0", "high" and " 3 " do not
    /// qualify after trimming except for the surrounding whitespace.
    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim() {
            "1" => Some(Self(1)),
            "2" => Some(Self(2)),
            "3" => Some(Self(3)),
            "4" => Some(Self(4)),
            "5" => Some(Self(5)),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        self.0
    }

    /// Severity 4 or 5.
    pub fn is_serious(self) -> bool {
        self.0 >= 4
    }
}

impl TryFrom<u8> for Severity {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level).ok_or_else(|| format!("severity {level} outside 1..=5"))
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> u8 {
        severity.0
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fully populated type/urgency/severity triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Classification {
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    pub urgency: Urgency,
    pub severity: Severity,
}

impl Classification {
    /// Wire format: `Type: …\nUrgency: …\nSeverity: …`.
    pub fn to_text(&self) -> String {
        format!(
            "Type: {}\nUrgency: {}\nSeverity: {}",
            self.incident_type, self.urgency, self.severity
        )
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Classification text recorded when the pipeline itself faulted.
pub const CLASSIFICATION_FAILURE_MARKER: &str = "Error in classification";

// ── Routing ─────────────────────────────────────────────────────────

/// A notification channel an incident can be pushed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Community,
    Authority,
}

impl NotificationChannel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Community => "community push notification",
            Self::Authority => "authority email",
        }
    }
}

/// Ordered channel set; community notification is always first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    channels: Vec<NotificationChannel>,
}

impl RoutingDecision {
    pub fn community_only() -> Self {
        Self {
            channels: vec![NotificationChannel::Community],
        }
    }

    pub fn community_and_authorities() -> Self {
        Self {
            channels: vec![NotificationChannel::Community, NotificationChannel::Authority],
        }
    }

    pub fn notifies_authorities(&self) -> bool {
        self.channels.contains(&NotificationChannel::Authority)
    }

    /// Parse the stored `;`-joined form; unknown parts are ignored.
    pub fn from_text(text: &str) -> Self {
        if text
            .split(';')
            .any(|part| part.trim() == NotificationChannel::Authority.label())
        {
            Self::community_and_authorities()
        } else {
            Self::community_only()
        }
    }
}

impl fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.channels.iter().map(|c| c.label()).collect();
        f.write_str(&labels.join(";"))
    }
}

// ── Authorities ─────────────────────────────────────────────────────

/// Responder organisations an incident can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Authority {
    #[serde(rename = "Police Department")]
    Police,
    #[serde(rename = "Department of Fire and Emergency Services")]
    FireAndEmergency,
    #[serde(rename = "Department of Traffic Police")]
    TrafficPolice,
    #[serde(rename = "Department of Disaster Relief")]
    DisasterRelief,
    #[serde(rename = "Department of Medical Emergency")]
    MedicalEmergency,
}

impl Authority {
    /// The closed vocabulary, in first-match-wins order.
    pub const ALL: [Authority; 5] = [
        Self::Police,
        Self::FireAndEmergency,
        Self::TrafficPolice,
        Self::DisasterRelief,
        Self::MedicalEmergency,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Police => "Police Department",
            Self::FireAndEmergency => "Department of Fire and Emergency Services",
            Self::TrafficPolice => "Department of Traffic Police",
            Self::DisasterRelief => "Department of Disaster Relief",
            Self::MedicalEmergency => "Department of Medical Emergency",
        }
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Priority-ordered authorities: deduplicated, at most four, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Authority>", into = "Vec<Authority>")]
pub struct AuthoritySet(Vec<Authority>);

impl AuthoritySet {
    pub const MAX_LEN: usize = 4;

    /// Build from any ordering; first occurrence wins, extra entries are
    /// dropped, and an empty input becomes `[Police Department]`.
    pub fn from_ordered(authorities: impl IntoIterator<Item = Authority>) -> Self {
        let mut unique: Vec<Authority> = Vec::with_capacity(Self::MAX_LEN);
        for authority in authorities {
            if unique.len() == Self::MAX_LEN {
                break;
            }
            if !unique.contains(&authority) {
                unique.push(authority);
            }
        }
        if unique.is_empty() {
            unique.push(Authority::Police);
        }
        Self(unique)
    }

    /// `[Police Department]`.
    pub fn police_only() -> Self {
        Self(vec![Authority::Police])
    }

    pub fn as_slice(&self) -> &[Authority] {
        &self.0
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Strict counterpart of `from_ordered` for stored data: duplicates, empty
/// lists and lists longer than `MAX_LEN` are rejected rather than repaired.
impl TryFrom<Vec<Authority>> for AuthoritySet {
    type Error = String;

    fn try_from(authorities: Vec<Authority>) -> Result<Self, Self::Error> {
        if authorities.is_empty() {
            return Err("authority set is empty".to_string());
        }
        if authorities.len() > Self::MAX_LEN {
            return Err(format!(
                "authority set has {} entries, at most {} allowed",
                authorities.len(),
                Self::MAX_LEN
            ));
        }
        for (i, authority) in authorities.iter().enumerate() {
            if authorities[..i].contains(authority) {
                return Err(format!("{authority} listed twice"));
            }
        }
        Ok(Self(authorities))
    }
}

impl From<AuthoritySet> for Vec<Authority> {
    fn from(set: AuthoritySet) -> Self {
        set.0
    }
}

impl fmt::Display for AuthoritySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.0.iter().map(|a| a.label()).collect();
        f.write_str(&labels.join("; "))
    }
}

/// Outcome of the authority stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "authorities", rename_all = "snake_case")]
pub enum AuthorityRouting {
    /// The routing decision did not include authority notification, so the
    /// stage never ran. Distinct from any `AuthoritySet`.
    NotRequired,
    Notify(AuthoritySet),
}

impl AuthorityRouting {
    pub const NOT_REQUIRED_TEXT: &'static str = "No authority routing required";

    pub fn authorities(&self) -> Option<&AuthoritySet> {
        match self {
            Self::NotRequired => None,
            Self::Notify(set) => Some(set),
        }
    }
}

impl fmt::Display for AuthorityRouting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRequired => f.write_str(Self::NOT_REQUIRED_TEXT),
            Self::Notify(set) => set.fmt(f),
        }
    }
}

// ── Incident record ─────────────────────────────────────────────────

/// Suggestion text used when the pipeline itself faulted.
pub const FALLBACK_SUGGESTION: &str = "Please contact local authorities for assistance.";

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentRecord {
    pub submission: Submission,
    /// `None` only on the degraded path after an internal fault.
    pub classification: Option<Classification>,
    pub routing: RoutingDecision,
    pub authority_routing: AuthorityRouting,
    pub suggestions: String,
}

impl IncidentRecord {
    /// Minimal safe record for a run that faulted mid-pipeline.
    pub fn degraded(submission: Submission) -> Self {
        Self {
            submission,
            classification: None,
            routing: RoutingDecision::community_only(),
            authority_routing: AuthorityRouting::Notify(AuthoritySet::police_only()),
            suggestions: FALLBACK_SUGGESTION.to_string(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.classification.is_none()
    }

    /// Classification wire text, or the failure marker.
    pub fn classification_text(&self) -> String {
        self.classification
            .map(|c| c.to_text())
            .unwrap_or_else(|| CLASSIFICATION_FAILURE_MARKER.to_string())
    }
}

/// Flat, string-typed view of a record as returned to reporters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageReport {
    pub category: String,
    pub location: String,
    pub description: String,
    pub submitted_at: String,
    pub classification: String,
    pub routing: String,
    pub authority_routing: String,
    pub suggestions: String,
}

impl From<&IncidentRecord> for TriageReport {
    fn from(record: &IncidentRecord) -> Self {
        Self {
            category: record.submission.category.clone(),
            location: record.submission.location.clone(),
            description: record.submission.description.clone(),
            submitted_at: record.submission.timestamp(),
            classification: record.classification_text(),
            routing: record.routing.to_string(),
            authority_routing: record.authority_routing.to_string(),
            suggestions: record.suggestions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn submission() -> Submission {
        let ist = FixedOffset::east_opt(19_800).unwrap();
        Submission {
            category: "Fire".into(),
            location: "MG Road (12.97, 77.59)".into(),
            description: "Smoke from a shop".into(),
            submitted_at: ist.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn classification_text_format() {
        let c = Classification {
            incident_type: IncidentType::ProtestMarch,
            urgency: Urgency::High,
            severity: Severity::clamped(4),
        };
        assert_eq!(c.to_text(), "Type: Protest / March\nUrgency: high\nSeverity: 4");
    }

    #[test]
    fn severity_bounds() {
        assert!(Severity::new(0).is_none());
        assert!(Severity::new(6).is_none());
        assert_eq!(Severity::new(5), Some(Severity::MAX));
        assert_eq!(Severity::clamped(9), Severity::MAX);
        assert_eq!(Severity::clamped(0), Severity::MIN);
        assert!(Severity::clamped(4).is_serious());
        assert!(!Severity::MODERATE.is_serious());
    }

    #[test]
    fn severity_label_is_exact() {
        assert_eq!(Severity::from_label("3"), Some(Severity::MODERATE));
        assert_eq!(Severity::from_label(" 5 "), Some(Severity::MAX));
        assert!(Severity::from_label("high").is_none());
        assert!(Severity::from_label("4.0").is_none());
        assert!(Severity::from_label("6").is_none());
    }

    #[test]
    fn urgency_label_is_exact() {
        assert_eq!(Urgency::from_label("HIGH"), Some(Urgency::High));
        assert!(Urgency::from_label("extreme").is_none());
        assert!(Urgency::from_label("very high").is_none());
    }

    #[test]
    fn severity_serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<Severity>("7").is_err());
        assert_eq!(serde_json::from_str::<Severity>("2").unwrap().level(), 2);
    }

    #[test]
    fn routing_text_roundtrip() {
        let both = RoutingDecision::community_and_authorities();
        assert_eq!(both.to_string(), "community push notification;authority email");
        assert_eq!(RoutingDecision::from_text(&both.to_string()), both);
        assert_eq!(
            RoutingDecision::from_text("community push notification"),
            RoutingDecision::community_only()
        );
    }

    #[test]
    fn authority_set_dedups_caps_and_defaults() {
        let set = AuthoritySet::from_ordered([
            Authority::FireAndEmergency,
            Authority::MedicalEmergency,
            Authority::FireAndEmergency,
            Authority::TrafficPolice,
            Authority::DisasterRelief,
            Authority::Police,
        ]);
        assert_eq!(
            set.as_slice(),
            &[
                Authority::FireAndEmergency,
                Authority::MedicalEmergency,
                Authority::TrafficPolice,
                Authority::DisasterRelief,
            ]
        );

        let empty = AuthoritySet::from_ordered(std::iter::empty());
        assert_eq!(empty, AuthoritySet::police_only());
    }

    #[test]
    fn authority_set_deserialization_keeps_invariants() {
        let set: AuthoritySet =
            serde_json::from_str(r#"["Department of Medical Emergency","Police Department"]"#)
                .unwrap();
        assert_eq!(set.as_slice(), &[Authority::MedicalEmergency, Authority::Police]);
        assert_eq!(
            serde_json::to_string(&set).unwrap(),
            r#"["Department of Medical Emergency","Police Department"]"#
        );

        assert!(serde_json::from_str::<AuthoritySet>("[]").is_err());
        assert!(serde_json::from_str::<AuthoritySet>(
            r#"["Police Department","Police Department"]"#
        )
        .is_err());
        let five = serde_json::to_string(&Authority::ALL).unwrap();
        assert!(serde_json::from_str::<AuthoritySet>(&five).is_err());
    }

    #[test]
    fn authority_routing_text() {
        assert_eq!(
            AuthorityRouting::NotRequired.to_string(),
            "No authority routing required"
        );
        let set = AuthoritySet::from_ordered([Authority::Police, Authority::TrafficPolice]);
        assert_eq!(
            AuthorityRouting::Notify(set).to_string(),
            "Police Department; Department of Traffic Police"
        );
        assert_eq!(
            AuthorityRouting::Notify(AuthoritySet::police_only()).to_string(),
            "Police Department"
        );
    }

    #[test]
    fn degraded_record_is_complete() {
        let record = IncidentRecord::degraded(submission());
        assert!(record.is_degraded());
        let report = TriageReport::from(&record);
        assert_eq!(report.classification, "Error in classification");
        assert_eq!(report.routing, "community push notification");
        assert_eq!(report.authority_routing, "Police Department");
        assert_eq!(report.suggestions, FALLBACK_SUGGESTION);
        assert_eq!(report.submitted_at, "2026-03-01T09:30:00.000000+05:30");
    }

    #[test]
    fn incident_type_serializes_as_label() {
        let json = serde_json::to_string(&IncidentType::ConstructionWorkInProgress).unwrap();
        assert_eq!(json, "\"Construction Work in Progress\"");
        for t in IncidentType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.label()));
        }
    }
}
