//! Alert record types, from the raw feed shape to classified, grouped alerts.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::error::CoreError;

/// Treat JSON `null` the same as a missing field.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Zone codes attached to an alert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geocode {
    /// UGC zone/county codes (e.g. "TXZ123", "OKC109").
    #[serde(rename = "UGC", default, deserialize_with = "null_default")]
    pub ugc: Vec<String>,

    /// SAME/FIPS codes.
    #[serde(rename = "SAME", default, deserialize_with = "null_default")]
    pub same: Vec<String>,
}

/// The structured parameter block of an alert.
///
/// Every value is a list in the feed, usually with a single entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertParameters {
    /// Product identifier, e.g. "TORFWD". The trailing three characters are the office.
    #[serde(rename = "AWIPSidentifier", default, deserialize_with = "null_default")]
    pub awips_identifier: Vec<String>,

    /// "OBSERVED", "RADAR INDICATED" or "POSSIBLE".
    #[serde(default, deserialize_with = "null_default")]
    pub tornado_detection: Vec<String>,

    /// "CONSIDERABLE" or "CATASTROPHIC" on escalated tornado warnings.
    #[serde(default, deserialize_with = "null_default")]
    pub tornado_damage_threat: Vec<String>,

    /// Hail size in inches, e.g. "1.00".
    #[serde(default, deserialize_with = "null_default")]
    pub max_hail_size: Vec<String>,

    /// Wind gust, e.g. "60 MPH".
    #[serde(default, deserialize_with = "null_default")]
    pub max_wind_gust: Vec<String>,

    #[serde(default, deserialize_with = "null_default")]
    pub thunderstorm_damage_threat: Vec<String>,

    #[serde(default, deserialize_with = "null_default")]
    pub flash_flood_damage_threat: Vec<String>,
}

impl AlertParameters {
    /// The three-letter forecast office this product came from.
    pub fn office_code(&self) -> Option<&str> {
        let id = self.awips_identifier.first()?.trim();
        if id.len() < 3 || !id.is_ascii() {
            return None;
        }
        Some(&id[id.len() - 3..])
    }

    pub fn max_hail_size(&self) -> Option<&str> {
        self.max_hail_size.first().map(String::as_str)
    }

    pub fn max_wind_gust(&self) -> Option<&str> {
        self.max_wind_gust.first().map(String::as_str)
    }

    /// Check whether `tornadoDetection` carries the given value.
    pub fn has_tornado_detection(&self, value: &str) -> bool {
        self.tornado_detection
            .iter()
            .any(|v| v.trim().eq_ignore_ascii_case(value))
    }

    /// Check whether `tornadoDamageThreat` carries the given value.
    pub fn has_tornado_damage_threat(&self, value: &str) -> bool {
        self.tornado_damage_threat
            .iter()
            .any(|v| v.trim().eq_ignore_ascii_case(value))
    }
}

/// One alert as published by the feed, with every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAlertRecord {
    #[serde(default, deserialize_with = "null_default")]
    pub event: Option<String>,

    #[serde(default, deserialize_with = "null_default")]
    pub headline: Option<String>,

    #[serde(default, deserialize_with = "null_default")]
    pub area_desc: Option<String>,

    /// End of the hazard. Often null on watches.
    #[serde(default, deserialize_with = "null_default")]
    pub ends: Option<String>,

    /// Expiration of this message, used when `ends` is absent.
    #[serde(default, deserialize_with = "null_default")]
    pub expires: Option<String>,

    #[serde(default, deserialize_with = "null_default")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "null_default")]
    pub geocode: Option<Geocode>,

    #[serde(default, deserialize_with = "null_default")]
    pub parameters: Option<AlertParameters>,
}

impl RawAlertRecord {
    /// The expiration timestamp string: `ends`, falling back to `expires`.
    pub fn expiration(&self) -> Option<&str> {
        self.ends
            .as_deref()
            .or(self.expires.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A feature record in the feed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Feed-assigned id. Not stable enough to use as identity.
    #[serde(default, deserialize_with = "null_default")]
    pub id: Option<String>,

    #[serde(default)]
    pub properties: RawAlertRecord,
}

/// The feed document: a list of feature records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedDocument {
    pub features: Vec<Feature>,
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default, deserialize_with = "null_default")]
    features: Vec<serde_json::Value>,
}

impl FeedDocument {
    /// Parse a feed document.
    ///
    /// A document that is not JSON (or not an object) is an error. Individual
    /// features that fail to deserialize are skipped.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let raw: RawDocument = serde_json::from_slice(bytes)?;
        Ok(Self::from_values(raw.features))
    }

    /// Parse a feed document from a string.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Self::from_slice(json.as_bytes())
    }

    fn from_values(values: Vec<serde_json::Value>) -> Self {
        let total = values.len();
        let features: Vec<Feature> = values
            .into_iter()
            .enumerate()
            .filter_map(|(i, value)| match serde_json::from_value::<Feature>(value) {
                Ok(feature) => Some(feature),
                Err(e) => {
                    warn!(index = i, "Skipping malformed feature: {}", e);
                    None
                }
            })
            .collect();
        debug!("Parsed {} of {} features", features.len(), total);
        Self { features }
    }

    /// Build a document directly from raw records.
    pub fn from_records(records: impl IntoIterator<Item = RawAlertRecord>) -> Self {
        Self {
            features: records
                .into_iter()
                .map(|properties| Feature {
                    id: None,
                    properties,
                })
                .collect(),
        }
    }
}

/// Recognized alert categories, in display priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "TOR")]
    Tor,
    #[serde(rename = "TOR_EMERGENCY")]
    TorEmergency,
    #[serde(rename = "SVR")]
    Svr,
    #[serde(rename = "FFW")]
    Ffw,
    #[serde(rename = "WSW")]
    Wsw,
    #[serde(rename = "TOA")]
    Toa,
    #[serde(rename = "SVA")]
    Sva,
}

impl Category {
    /// All categories in priority order.
    pub const ALL: [Category; 7] = [
        Category::Tor,
        Category::TorEmergency,
        Category::Svr,
        Category::Ffw,
        Category::Wsw,
        Category::Toa,
        Category::Sva,
    ];

    /// The key used in query strings and color overrides.
    pub fn key(self) -> &'static str {
        match self {
            Category::Tor => "TOR",
            Category::TorEmergency => "TOR_EMERGENCY",
            Category::Svr => "SVR",
            Category::Ffw => "FFW",
            Category::Wsw => "WSW",
            Category::Toa => "TOA",
            Category::Sva => "SVA",
        }
    }

    /// The base display label.
    pub fn label(self) -> &'static str {
        match self {
            Category::Tor => "TORNADO WARNING",
            Category::TorEmergency => "TORNADO EMERGENCY",
            Category::Svr => "SEVERE T-STORM WARNING",
            Category::Ffw => "FLASH FLOOD WARNING",
            Category::Wsw => "WINTER STORM WARNING",
            Category::Toa => "TORNADO WATCH",
            Category::Sva => "SEVERE T-STORM WATCH",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.key() == s)
            .ok_or_else(|| CoreError::UnknownCategory(s.to_string()))
    }
}

/// Escalation markers on a tornado warning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escalation {
    pub pds: bool,
    pub observed: bool,
    pub emergency: bool,
}

impl Escalation {
    /// Label prefix, e.g. "PDS OBSERVED ".
    pub fn prefix(&self) -> String {
        let mut prefix = String::new();
        if self.pds {
            prefix.push_str("PDS ");
        }
        if self.observed {
            prefix.push_str("OBSERVED ");
        }
        if self.emergency {
            prefix.push_str("EMERGENCY ");
        }
        prefix
    }
}

/// Identity of an alert across refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlertKey {
    pub headline: String,
    pub area: String,
    pub expires: Option<DateTime<Utc>>,
}

impl AlertKey {
    pub fn new(
        headline: impl Into<String>,
        area: impl Into<String>,
        expires: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            headline: headline.into(),
            area: area.into(),
            expires,
        }
    }
}

impl fmt::Display for AlertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expires = self
            .expires
            .map(|e| e.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
            .unwrap_or_default();
        write!(f, "{}|{}|{}", self.headline, self.area, expires)
    }
}

impl Serialize for AlertKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An alert that matched a recognized category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedAlert {
    pub category: Category,
    /// Category label with escalation prefixes.
    pub label: String,
    pub escalation: Escalation,
    pub event: String,
    pub headline: String,
    pub area: String,
    pub description: String,
    pub expires: Option<DateTime<Utc>>,
    pub geocode: Geocode,
    pub parameters: AlertParameters,
    /// Display color as `#rrggbb`.
    pub color: String,
}

impl ClassifiedAlert {
    pub fn key(&self) -> AlertKey {
        AlertKey::new(self.headline.clone(), self.area.clone(), self.expires)
    }

    pub fn ugc(&self) -> &[String] {
        &self.geocode.ugc
    }

    pub fn office_code(&self) -> Option<&str> {
        self.parameters.office_code()
    }
}

/// Alerts grouped by category, in feed order within each category.
///
/// Categories with no alerts are never present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedAlerts {
    groups: BTreeMap<Category, Vec<ClassifiedAlert>>,
}

impl GroupedAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, alert: ClassifiedAlert) {
        self.groups.entry(alert.category).or_default().push(alert);
    }

    pub fn get(&self, category: Category) -> Option<&[ClassifiedAlert]> {
        self.groups.get(&category).map(Vec::as_slice)
    }

    pub fn contains(&self, category: Category) -> bool {
        self.groups.contains_key(&category)
    }

    /// Present categories, in priority order.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.groups.keys().copied()
    }

    /// Iterate over (category, alerts) in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[ClassifiedAlert])> {
        self.groups.iter().map(|(c, a)| (*c, a.as_slice()))
    }

    /// Total number of alerts across all categories.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Per-category counts for every category, including zeros.
    pub fn counts(&self) -> BTreeMap<Category, usize> {
        Category::ALL
            .into_iter()
            .map(|c| (c, self.groups.get(&c).map_or(0, Vec::len)))
            .collect()
    }

    /// Keep only alerts matching the predicate, dropping emptied categories.
    pub fn retain<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(Category, &ClassifiedAlert) -> bool,
    {
        let groups = self
            .groups
            .iter()
            .filter_map(|(category, alerts)| {
                let kept: Vec<ClassifiedAlert> = alerts
                    .iter()
                    .filter(|a| keep(*category, a))
                    .cloned()
                    .collect();
                (!kept.is_empty()).then_some((*category, kept))
            })
            .collect();
        Self { groups }
    }
}

impl FromIterator<ClassifiedAlert> for GroupedAlerts {
    fn from_iter<I: IntoIterator<Item = ClassifiedAlert>>(iter: I) -> Self {
        let mut grouped = Self::new();
        for alert in iter {
            grouped.push(alert);
        }
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feed_with_nulls() {
        let json = r#"{
            "features": [
                {
                    "id": "urn:1",
                    "properties": {
                        "event": "Tornado Warning",
                        "headline": null,
                        "areaDesc": "Smith, TX",
                        "ends": null,
                        "expires": "2025-01-01T00:00:00Z",
                        "geocode": { "UGC": ["TXC001"], "SAME": null },
                        "parameters": { "AWIPSidentifier": ["TORFWD"], "tornadoDetection": null }
                    }
                }
            ]
        }"#;
        let doc = FeedDocument::from_json(json).unwrap();
        assert_eq!(doc.features.len(), 1);
        let record = &doc.features[0].properties;
        assert_eq!(record.headline, None);
        assert_eq!(record.expiration(), Some("2025-01-01T00:00:00Z"));
        assert!(record.geocode.as_ref().unwrap().same.is_empty());
        assert_eq!(record.parameters.as_ref().unwrap().office_code(), Some("FWD"));
    }

    #[test]
    fn test_malformed_feature_is_skipped() {
        let json = r#"{"features": [
            {"properties": {"event": 42}},
            {"properties": {"event": "Flash Flood Warning"}}
        ]}"#;
        let doc = FeedDocument::from_json(json).unwrap();
        assert_eq!(doc.features.len(), 1);
        assert_eq!(
            doc.features[0].properties.event.as_deref(),
            Some("Flash Flood Warning")
        );
    }

    #[test]
    fn test_missing_features_is_empty() {
        let doc = FeedDocument::from_json("{}").unwrap();
        assert!(doc.features.is_empty());
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(FeedDocument::from_json("<html>").is_err());
    }

    #[test]
    fn test_office_code_variable_prefix() {
        let params = AlertParameters {
            awips_identifier: vec!["SVSOUN".to_string()],
            ..Default::default()
        };
        assert_eq!(params.office_code(), Some("OUN"));

        let short = AlertParameters {
            awips_identifier: vec!["AB".to_string()],
            ..Default::default()
        };
        assert_eq!(short.office_code(), None);
    }

    #[test]
    fn test_category_keys_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.key().parse::<Category>().unwrap(), category);
        }
        assert!("tor".parse::<Category>().is_err());
    }

    #[test]
    fn test_escalation_prefix_order() {
        let esc = Escalation {
            pds: true,
            observed: true,
            emergency: true,
        };
        assert_eq!(esc.prefix(), "PDS OBSERVED EMERGENCY ");
        assert_eq!(Escalation::default().prefix(), "");
    }

    #[test]
    fn test_alert_key_display() {
        let expires = "2025-01-01T00:00:00Z".parse::<DateTime<Utc>>().ok();
        let key = AlertKey::new("Headline", "Smith, TX", expires);
        assert_eq!(key.to_string(), "Headline|Smith, TX|2025-01-01T00:00:00Z");
        assert_eq!(AlertKey::new("H", "A", None).to_string(), "H|A|");
    }
}
