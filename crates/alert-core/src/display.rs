//! Display strings derived from a classified alert.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Utc};
use regex::Regex;

use crate::geo::{get_counties, get_counties_with_states, get_states, is_zone_based};
use crate::types::{Category, ClassifiedAlert};

static TZ_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{2,4})\b").expect("valid timezone regex"));

static HAIL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]*\.[0-9]+|[0-9]+)").expect("valid hail regex"));

/// Timezone abbreviations seen in headlines, with UTC offsets in hours.
const TZ_OFFSETS: [(&str, i32); 14] = [
    ("CDT", -5),
    ("CST", -6),
    ("MDT", -6),
    ("MST", -7),
    ("EDT", -4),
    ("EST", -5),
    ("PDT", -7),
    ("PST", -8),
    ("AKDT", -8),
    ("AKST", -9),
    ("HST", -10),
    ("HAST", -10),
    ("HDT", -9),
    ("AST", -4),
];

/// Hail sizes in hundredths of an inch, with their common comparison.
const HAIL_SIZES: [(u32, &str); 14] = [
    (25, "PEA"),
    (50, "MARBLE"),
    (75, "PENNY"),
    (88, "NICKEL"),
    (100, "QUARTER"),
    (125, "HALF DOLLAR"),
    (150, "PING PONG BALL"),
    (175, "GOLF BALL"),
    (200, "HEN EGG"),
    (250, "TENNIS BALL"),
    (275, "BASEBALL"),
    (300, "TEACUP"),
    (400, "GRAPEFRUIT"),
    (450, "SOFTBALL"),
];

/// Time remaining until expiry, e.g. "1 HR 5 MIN" or "12 MIN".
pub fn expires_in(expires: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let total_mins = (expires - now).num_minutes().max(0);
    let hours = total_mins / 60;
    let mins = total_mins % 60;
    if hours > 0 {
        format!("{} HR {} MIN", hours, mins)
    } else {
        format!("{} MIN", mins)
    }
}

/// Find the headline's timezone abbreviation, if it is a known one.
pub fn headline_timezone(headline: &str) -> Option<(&'static str, FixedOffset)> {
    TZ_WORD
        .captures_iter(headline)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| TZ_OFFSETS.iter().find(|(abbr, _)| *abbr == m.as_str()))
        .and_then(|(abbr, hours)| FixedOffset::east_opt(hours * 3600).map(|o| (*abbr, o)))
}

/// Expiry in the headline's local zone, e.g. "Mon 3:05PM CDT".
pub fn format_expires_time(expires: DateTime<Utc>, headline: &str) -> String {
    match headline_timezone(headline) {
        Some((abbr, offset)) => format!(
            "{} {}",
            expires.with_timezone(&offset).format("%a %-I:%M%p"),
            abbr
        ),
        None => format!("{} UTC", expires.format("%a %-I:%M%p")),
    }
}

/// Resolved state names for the alert.
pub fn state_line(alert: &ClassifiedAlert) -> String {
    get_states(&alert.area, alert.ugc())
}

fn hail_description(size: &str) -> Option<&'static str> {
    let number = HAIL_NUMBER.captures(size)?.get(1)?.as_str();
    let inches: f64 = number.parse().ok()?;
    let hundredths = (inches * 100.0).round() as u32;
    HAIL_SIZES
        .iter()
        .find(|(h, _)| *h == hundredths)
        .map(|(_, name)| *name)
}

fn severe_prefix(alert: &ClassifiedAlert) -> String {
    let params = &alert.parameters;
    let mut prefix = String::new();
    if params.has_tornado_detection("POSSIBLE") {
        prefix.push_str("TORNADO: POSSIBLE | ");
    }
    if let Some(hail) = params.max_hail_size() {
        let desc = hail_description(hail)
            .map(|d| format!(" ({})", d))
            .unwrap_or_default();
        prefix.push_str(&format!("HAIL: {}\"{} | ", hail.to_uppercase(), desc));
    }
    if let Some(wind) = params.max_wind_gust() {
        prefix.push_str(&format!("WIND: {} | ", wind.to_uppercase()));
    }
    prefix
}

/// The scrolling area-bar text.
///
/// Zone-based alerts show the zone name. County lists get a COUNTIES or
/// PARISHES label, with `Name (XX)` entries when several states are involved.
/// Severe thunderstorm warnings lead with tornado, hail and wind details.
pub fn area_bar_text(alert: &ClassifiedAlert) -> String {
    let area = alert.area.as_str();
    if area.is_empty() {
        return String::new();
    }
    if is_zone_based(area, alert.ugc()) {
        return area.to_uppercase();
    }

    let states_line = state_line(alert).to_lowercase();
    let states: Vec<&str> = states_line
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let has_louisiana = states.contains(&"louisiana");
    let label = match (states.len(), has_louisiana) {
        (1, true) => "PARISHES",
        (n, true) if n > 1 => "COUNTIES/PARISHES",
        _ => "COUNTIES",
    };

    if alert.category == Category::Svr {
        let counties = get_counties_with_states(area).to_uppercase();
        return format!("{}{}: {}", severe_prefix(alert), label, counties);
    }

    match states.len() {
        0 => area.to_uppercase(),
        1 => format!("{}: {}", label, get_counties(area).to_uppercase()),
        _ => format!("{}: {}", label, get_counties_with_states(area).to_uppercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertParameters, Escalation, Geocode};

    fn alert(category: Category, area: &str, ugc: &[&str]) -> ClassifiedAlert {
        ClassifiedAlert {
            category,
            label: category.label().to_string(),
            escalation: Escalation::default(),
            event: String::new(),
            headline: String::new(),
            area: area.to_string(),
            description: String::new(),
            expires: None,
            geocode: Geocode {
                ugc: ugc.iter().map(|s| s.to_string()).collect(),
                same: Vec::new(),
            },
            parameters: AlertParameters::default(),
            color: String::new(),
        }
    }

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_expires_in() {
        let now = utc("2025-01-01T00:00:00Z");
        assert_eq!(expires_in(utc("2025-01-01T01:05:30Z"), now), "1 HR 5 MIN");
        assert_eq!(expires_in(utc("2025-01-01T00:12:00Z"), now), "12 MIN");
        assert_eq!(expires_in(utc("2024-12-31T23:00:00Z"), now), "0 MIN");
    }

    #[test]
    fn test_format_expires_time() {
        let expires = utc("2025-05-05T20:05:00Z");
        let headline = "Tornado Warning issued May 5 at 2:30PM CDT until 3:05PM CDT by NWS";
        assert_eq!(format_expires_time(expires, headline), "Mon 3:05PM CDT");
        assert_eq!(format_expires_time(expires, "no zone here"), "Mon 8:05PM UTC");
    }

    #[test]
    fn test_area_bar_single_state() {
        let a = alert(Category::Tor, "Smith, TX; Jones, TX", &[]);
        assert_eq!(area_bar_text(&a), "COUNTIES: SMITH, JONES");
    }

    #[test]
    fn test_area_bar_parishes() {
        let a = alert(Category::Ffw, "Caddo, LA; Bossier, LA", &[]);
        assert_eq!(area_bar_text(&a), "PARISHES: CADDO, BOSSIER");

        let b = alert(Category::Ffw, "Caddo, LA; Harrison, TX", &[]);
        assert_eq!(
            area_bar_text(&b),
            "COUNTIES/PARISHES: CADDO (LA), HARRISON (TX)"
        );
    }

    #[test]
    fn test_area_bar_zone_based() {
        let a = alert(Category::Wsw, "Northern Oklahoma Grasslands", &["OKZ004"]);
        assert_eq!(area_bar_text(&a), "NORTHERN OKLAHOMA GRASSLANDS");
    }

    #[test]
    fn test_area_bar_severe_details() {
        let mut a = alert(Category::Svr, "Smith, TX", &[]);
        a.parameters = AlertParameters {
            max_hail_size: vec!["1.00".to_string()],
            max_wind_gust: vec!["60 MPH".to_string()],
            tornado_detection: vec!["POSSIBLE".to_string()],
            ..Default::default()
        };
        assert_eq!(
            area_bar_text(&a),
            "TORNADO: POSSIBLE | HAIL: 1.00\" (QUARTER) | WIND: 60 MPH | COUNTIES: SMITH (TX)"
        );
    }

    #[test]
    fn test_hail_description() {
        assert_eq!(hail_description(".75"), Some("PENNY"));
        assert_eq!(hail_description("1.75"), Some("GOLF BALL"));
        assert_eq!(hail_description("1.10"), None);
        assert_eq!(hail_description("Up to"), None);
    }
}
