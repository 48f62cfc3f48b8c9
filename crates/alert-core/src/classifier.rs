//! Maps raw feed records to recognized alert categories.
//!
//! Matching is by substring against the event name, in priority order.
//! Records that match nothing are dropped; that is filtering, not an error.

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::palette::default_colors;
use crate::types::{
    AlertParameters, Category, ClassifiedAlert, Escalation, FeedDocument, GroupedAlerts,
    RawAlertRecord,
};

const PDS_PHRASE: &str = "PARTICULARLY DANGEROUS SITUATION";
const EMERGENCY_PHRASE: &str = "TORNADO EMERGENCY";
const OBSERVED_TAG: &str = "TORNADO...OBSERVED";

/// Event substrings checked after "Tornado Warning".
const EVENT_RULES: [(&str, Category); 5] = [
    ("Severe Thunderstorm Warning", Category::Svr),
    ("Flash Flood Warning", Category::Ffw),
    ("Winter Storm Warning", Category::Wsw),
    ("Tornado Watch", Category::Toa),
    ("Severe Thunderstorm Watch", Category::Sva),
];

fn contains_upper(text: Option<&str>, needle: &str) -> bool {
    text.is_some_and(|t| t.to_uppercase().contains(needle))
}

/// Detect escalation markers on a tornado warning.
///
/// The structured parameter fields win when the feed provides them; text
/// matching is the fallback.
pub fn detect_escalation(record: &RawAlertRecord) -> Escalation {
    let empty = AlertParameters::default();
    let params = record.parameters.as_ref().unwrap_or(&empty);
    let description = record.description.as_deref();
    let headline = record.headline.as_deref();
    let event = record.event.as_deref();

    let observed = if params.tornado_detection.is_empty() {
        contains_upper(description, OBSERVED_TAG)
    } else {
        params.has_tornado_detection("OBSERVED")
    };

    let pds = params.has_tornado_damage_threat("CONSIDERABLE")
        || contains_upper(description, PDS_PHRASE);

    let emergency = params.has_tornado_damage_threat("CATASTROPHIC")
        || contains_upper(description, EMERGENCY_PHRASE)
        || contains_upper(event, EMERGENCY_PHRASE)
        || contains_upper(headline, EMERGENCY_PHRASE);

    Escalation {
        pds,
        observed,
        emergency,
    }
}

/// Determine the category for a record, without building the alert.
pub fn categorize(record: &RawAlertRecord) -> Option<(Category, Escalation)> {
    let event = record.event.as_deref()?;
    if event.contains("Tornado Warning") {
        let escalation = detect_escalation(record);
        let category = if escalation.emergency {
            Category::TorEmergency
        } else {
            Category::Tor
        };
        return Some((category, escalation));
    }
    EVENT_RULES
        .iter()
        .find(|(needle, _)| event.contains(needle))
        .map(|(_, category)| (*category, Escalation::default()))
}

fn parse_instant(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?;
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            debug!("Unparseable expiration '{}': {}", value, e);
            None
        }
    }
}

/// Classify a single record.
pub fn classify(record: &RawAlertRecord) -> Option<ClassifiedAlert> {
    let Some((category, escalation)) = categorize(record) else {
        trace!(event = ?record.event, "Dropping unrecognized event");
        return None;
    };

    Some(ClassifiedAlert {
        category,
        label: format!("{}{}", escalation.prefix(), category.label()),
        escalation,
        event: record.event.clone().unwrap_or_default(),
        headline: record.headline.clone().unwrap_or_default(),
        area: record.area_desc.clone().unwrap_or_default(),
        description: record.description.clone().unwrap_or_default(),
        expires: parse_instant(record.expiration()),
        geocode: record.geocode.clone().unwrap_or_default(),
        parameters: record.parameters.clone().unwrap_or_default(),
        color: default_colors(category).0.to_string(),
    })
}

/// Classify every feature in a document and group by category.
pub fn group_alerts(doc: &FeedDocument) -> GroupedAlerts {
    let grouped: GroupedAlerts = doc
        .features
        .iter()
        .filter_map(|f| classify(&f.properties))
        .collect();
    debug!(
        "Classified {} of {} features",
        grouped.len(),
        doc.features.len()
    );
    grouped
}
