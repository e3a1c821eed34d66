//! Safety suggestions for reporters and people nearby.
//!
//! Every incident type has a fixed catalog of eight sentences. Complex
//! incidents additionally get a situation-specific inference reply, extended
//! with keyword-driven context sentences; the catalog is the fallback.

use tracing::{debug, info, warn};

use crate::config::CallSettings;
use crate::llm::InferenceClient;
use crate::pipeline::matching::{
    Signal, contains_any, fired_names, is_complex_case, mentions_large_number,
    mentions_round_number, word_count,
};
use crate::pipeline::types::{Classification, IncidentType, Submission, Urgency};

const ACCIDENT: &[&str] = &[
    "Create a safe buffer zone around the accident by parking 100 meters away if you must stop.",
    "Turn on hazard lights and use your vehicle to protect emergency responders if directed by police.",
    "Document the scene only if safe to do so, as it may help with traffic management.",
    "Share traffic updates on community WhatsApp groups to help others plan alternate routes.",
    "If you are a witness, note down key details like time, vehicle descriptions, and license plates for police.",
    "If you are a driver involved, exchange contact and insurance details with other parties.",
    "If you are a pedestrian, stay clear of the accident site and follow police instructions.",
    "If you are a business owner, inform employees and customers to avoid the area until cleared.",
];

const CRIME: &[&str] = &[
    "If you witnessed the incident, note down key details like time, descriptions, and vehicle numbers for police.",
    "Inform nearby shop owners and security guards to increase vigilance in the area.",
    "Use buddy system when traveling through the area until police presence increases.",
    "Check on elderly neighbors who might be particularly vulnerable to similar incidents.",
    "Avoid sharing sensitive information on social media that could compromise ongoing investigations.",
    "If you feel unsafe, consider staying indoors until police have cleared the area.",
    "If you are a victim, do not confront the suspect; instead, seek safety and contact police immediately.",
    "If you are a business owner, review security camera footage and share it with police if requested.",
];

const WATERLOGGING: &[&str] = &[
    "Turn off electricity at the main switch if water enters your building to prevent electrocution.",
    "Use sandbags or plastic sheets to redirect water away from building entrances.",
    "Document water levels with photos and timestamps for insurance and municipal complaints.",
    "Coordinate with neighbors to share pumping equipment and monitor vulnerable residents.",
    "Avoid driving through waterlogged areas as it can damage your vehicle and create hazards.",
    "If you must walk through water, use waterproof boots and avoid submerged electrical hazards.",
    "Check local weather updates for further rain forecasts and prepare accordingly.",
    "If you are a resident, keep emergency supplies like food, water, and medicines ready in case of prolonged flooding.",
];

const CONSTRUCTION: &[&str] = &[
    "Download offline maps before traveling to navigate if GPS signals are disrupted by construction.",
    "Schedule important appointments for earlier in the day when construction activity is typically lower.",
    "Contact local businesses to confirm they're accessible before visiting the area.",
    "Report any unsafe construction practices or missing safety barriers to municipal authorities.",
    "If you are a worker, ensure all safety gear is worn and follow site protocols to avoid accidents.",
    "If you are a driver, follow detour signs carefully and allow extra travel time to avoid frustration.",
    "If you are a pedestrian, use designated walkways and follow construction signage to stay safe.",
    "If you are a resident, keep windows closed to avoid dust and noise pollution.",
];

const FIRE: &[&str] = &[
    "Close all windows and doors facing the fire to prevent smoke and ember entry.",
    "Wet down nearby structures and vegetation if you have water access and it's safe to do so.",
    "Move vehicles away from the fire area as fuel tanks can explode and create additional hazards.",
    "Monitor wind direction changes and be prepared to evacuate quickly if fire spreads toward you.",
    "If you are in a building, stay low to avoid smoke inhalation and use a wet cloth over your mouth.",
    "If trapped, signal for help from a window using a bright cloth or flashlight.",
    "If you are a resident, check on neighbors, especially the elderly or those with mobility issues.",
    "If you are a business owner, secure your premises and assist customers in evacuating safely.",
];

const PROTEST: &[&str] = &[
    "Monitor local news and social media for real-time updates on protest movement and road closures.",
    "If you must pass through the area, dress neutrally and avoid carrying bags that might be searched.",
    "Keep emergency contacts ready and share your location with family members before entering the vicinity.",
    "If trapped in a crowd surge, protect your chest with crossed arms and move diagonally toward barriers or walls.",
    "If you are a bystander, maintain a safe distance and avoid engaging with protesters to prevent escalation.",
    "If you are a protester, follow organizers' instructions and avoid confrontations with police or counter-protesters.",
    "If you are a resident, stay indoors and keep windows closed to avoid tear gas or other irritants.",
    "If you are a business owner, secure your premises and consider temporary closures if safety is a concern.",
];

const OTHERS: &[&str] = &[
    "Take photos or videos from a safe distance to help authorities understand the situation better.",
    "Check if anyone needs immediate assistance but ensure your own safety first.",
    "Share information with neighbors through community apps to keep everyone informed.",
    "Contact local media if the incident affects public services or transportation significantly.",
    "If you are a resident, stay indoors and avoid unnecessary travel until the situation is resolved.",
    "If you are a business owner, inform employees and customers about the situation and any necessary precautions.",
    "If you are a driver, follow detour signs and avoid the area until cleared.",
    "If you are a pedestrian, stay clear of the incident site and follow any police instructions.",
];

/// Venue sentences; only the first matching venue contributes.
const VENUE_GUIDANCE: &[(&[&str], &str)] = &[
    (
        &["stadium"],
        "Stadium visitors should coordinate with event security and use designated emergency exits.",
    ),
    (
        &["bridge", "road"],
        "Drivers should inform traffic apps like Google Maps to help others avoid the area.",
    ),
    (
        &["market", "shopping"],
        "Shop owners should secure their premises and assist customers in finding safe exits.",
    ),
    (
        &["hospital", "school"],
        "Hospital staff should prepare for potential patient influx and coordinate with emergency services.",
    ),
    (
        &["airport"],
        "Airport staff should follow emergency protocols and assist passengers in evacuating safely.",
    ),
    (
        &["public transport"],
        "Public transport operators should halt services in the affected area and inform passengers via announcements.",
    ),
    (
        &["mall"],
        "Mall management should activate emergency protocols and guide shoppers to safe exits.",
    ),
];

const DEFAULT_VENUE_GUIDANCE: &str =
    "Residents should stay indoors and avoid unnecessary travel until the situation is resolved.";

/// Independent keyword groups; every matching group contributes.
const SITUATION_GUIDANCE: &[(&[&str], &str)] = &[
    (
        &["stampede", "panic"],
        "Stay low, protect your chest and head, and move diagonally toward less crowded areas.",
    ),
    (
        &["blocked", "road"],
        "Use WhatsApp groups or local community apps to share real-time updates with neighbors.",
    ),
    (
        &["danger", "critical"],
        "If you are a bystander, maintain a safe distance and avoid engaging with protesters or emergency responders.",
    ),
    (
        &["emergency", "critical"],
        "If you are a driver, follow detour signs and avoid the area until cleared.",
    ),
];

const SCALE_GUIDANCE: &str =
    "If you see someone in distress, form small groups to help rather than acting alone.";

/// The eight catalog sentences for a type.
pub fn catalog(incident_type: IncidentType) -> &'static [&'static str] {
    match incident_type {
        IncidentType::Accident => ACCIDENT,
        IncidentType::Crime => CRIME,
        IncidentType::Waterlogging => WATERLOGGING,
        IncidentType::ConstructionWorkInProgress => CONSTRUCTION,
        IncidentType::Fire => FIRE,
        IncidentType::ProtestMarch => PROTEST,
        IncidentType::Others => OTHERS,
    }
}

/// Catalog sentences joined with single spaces.
pub fn catalog_suggestions(incident_type: IncidentType) -> String {
    catalog(incident_type).join(" ")
}

/// Signals that make an incident worth a tailored suggestion call.
pub fn creative_signals(submission: &Submission, classification: &Classification) -> Vec<Signal> {
    let description = submission.description_lower();
    vec![
        Signal::new("detailed", word_count(&description) > 15),
        Signal::new("high_urgency", classification.urgency == Urgency::High),
        Signal::new("serious", classification.severity.is_serious()),
        Signal::new(
            "escalation",
            contains_any(
                &description,
                &[
                    "turned into",
                    "stampede",
                    "blocked",
                    "many",
                    "crowd",
                    "emergency",
                    "panic",
                    "danger",
                    "critical",
                ],
            ),
        ),
        Signal::new(
            "venue",
            contains_any(
                &description,
                &[
                    "stadium",
                    "bridge",
                    "hospital",
                    "school",
                    "market",
                    "shopping",
                    "mall",
                    "airport",
                    "public transport",
                ],
            ),
        ),
        Signal::new("headcount", mentions_round_number(&description)),
    ]
}

/// Context sentences appended to a tailored reply: one venue sentence, then
/// scale and situation sentences in fixed order.
pub fn context_sentences(description_lower: &str) -> Vec<&'static str> {
    let mut sentences = Vec::new();

    let venue = VENUE_GUIDANCE
        .iter()
        .find(|(keywords, _)| contains_any(description_lower, keywords))
        .map(|(_, sentence)| *sentence)
        .unwrap_or(DEFAULT_VENUE_GUIDANCE);
    sentences.push(venue);

    if mentions_large_number(description_lower)
        || contains_any(description_lower, &["many", "crowd"])
    {
        sentences.push(SCALE_GUIDANCE);
    }

    for (keywords, sentence) in SITUATION_GUIDANCE {
        if contains_any(description_lower, keywords) {
            sentences.push(*sentence);
        }
    }

    sentences
}

/// Build the tailored-suggestion prompt.
pub fn build_creative_prompt(submission: &Submission, classification: &Classification) -> String {
    format!(
        "You are a safety expert providing specific, actionable advice for this incident.

INCIDENT DETAILS:
Description: {description}
Category: {category}
Location: {location}
Type: {incident_type}
Urgency: {urgency}
Severity: {severity}

Provide 3-4 specific, actionable suggestions tailored to THIS exact situation:
1. Consider the location, scale, and unique circumstances
2. Include both immediate safety actions and practical advice
3. Be creative but realistic
4. Consider different groups affected (drivers, pedestrians, residents, workers)
5. Include communication/coordination advice if relevant

Format as clear, actionable sentences separated by periods.",
        description = submission.description,
        category = submission.category,
        location = submission.location,
        incident_type = classification.incident_type,
        urgency = classification.urgency,
        severity = classification.severity,
    )
}

/// Produces the suggestion text for a classified incident.
pub struct SuggestionGenerator {
    client: InferenceClient,
    settings: CallSettings,
}

impl SuggestionGenerator {
    pub fn new(client: InferenceClient, settings: CallSettings) -> Self {
        Self { client, settings }
    }

    /// Always returns non-empty text.
    pub async fn suggest(&self, submission: &Submission, classification: &Classification) -> String {
        let signals = creative_signals(submission, classification);
        if !is_complex_case(&signals) {
            return catalog_suggestions(classification.incident_type);
        }

        info!(signals = ?fired_names(&signals), "Complex incident, requesting tailored suggestions");
        let prompt = build_creative_prompt(submission, classification);
        match self.client.submit("creative_suggestions", prompt, self.settings).await {
            Ok(reply) if !reply.is_empty() => {
                let extras = context_sentences(&submission.description_lower());
                debug!(extras = extras.len(), "Tailored suggestions received");
                format!("{} {}", reply, extras.join(" "))
            }
            Ok(_) => {
                warn!("Empty suggestion reply, using catalog");
                catalog_suggestions(classification.incident_type)
            }
            Err(e) => {
                warn!(error = %e, "Suggestion call failed, using catalog");
                catalog_suggestions(classification.incident_type)
            }
        }
    }
}
