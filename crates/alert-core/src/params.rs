//! Overlay parameters parsed from a URL query string.
//!
//! | Parameter | Format |
//! |-----------|--------|
//! | `state` | comma-separated codes or names, or `CONUS` |
//! | `wfo` | comma-separated three-letter office codes |
//! | `type` | comma-separated category keys |
//! | `zone` | comma-separated UGC codes (`TXZ123`) |
//! | `colors` | comma-separated `KEY:#hex` pairs |
//! | `passive` | `true`/`1`/`yes`, or present without a value |
//!
//! Malformed entries are dropped one by one; the rest of the list still applies.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::filter::FilterSpec;
use crate::palette::{normalize_hex, Palette};
use crate::types::Category;

static ZONE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}[A-Z]\d{3}$").expect("valid zone regex"));

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Parse the `state` parameter.
pub fn parse_state_param(value: &str) -> Vec<String> {
    split_list(value).map(str::to_string).collect()
}

/// Parse the `wfo` parameter, keeping only three-letter codes.
pub fn parse_wfo_param(value: &str) -> Vec<String> {
    split_list(value)
        .map(str::to_ascii_uppercase)
        .filter(|code| code.len() == 3)
        .collect()
}

/// Parse the `type` parameter.
pub fn parse_type_param(value: &str) -> Vec<String> {
    split_list(value).map(str::to_string).collect()
}

/// Parse the `zone` parameter, uppercasing and validating each code.
pub fn parse_zone_param(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|z| z.split_whitespace().collect::<String>().to_ascii_uppercase())
        .filter(|z| ZONE_CODE.is_match(z))
        .collect()
}

/// Parse the `colors` parameter into validated `#rrggbb` overrides.
pub fn parse_colors_param(value: &str) -> BTreeMap<Category, String> {
    let mut colors = BTreeMap::new();
    for pair in split_list(value) {
        let Some((key, hex)) = pair.split_once(':') else {
            debug!("Ignoring color entry without ':' ({})", pair);
            continue;
        };
        let Ok(category) = key.trim().parse::<Category>() else {
            debug!("Ignoring color for unknown type '{}'", key);
            continue;
        };
        match normalize_hex(hex) {
            Ok(color) => {
                colors.insert(category, color);
            }
            Err(e) => debug!("Ignoring color for {}: {}", category, e),
        }
    }
    colors
}

/// Render overrides back into `colors` parameter form.
pub fn serialize_colors_param(colors: &BTreeMap<Category, String>) -> String {
    colors
        .iter()
        .map(|(category, color)| format!("{}:{}", category.key(), color))
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "1" | "true" | "yes" | "on"
    )
}

/// Everything an overlay view is configured with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayParams {
    pub filter: FilterSpec,
    pub palette: Palette,
    /// Suppress the audible new-alert signal.
    pub passive: bool,
}

impl OverlayParams {
    /// Parse from a query string, with or without the leading `?`.
    ///
    /// Repeated list parameters accumulate.
    pub fn from_query(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        let mut filter = FilterSpec::default();
        let mut colors = BTreeMap::new();
        let mut passive = false;

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.to_ascii_lowercase().as_str() {
                "state" => filter.states.extend(parse_state_param(&value)),
                "wfo" => filter.offices.extend(parse_wfo_param(&value)),
                "type" => filter.types.extend(parse_type_param(&value)),
                "zone" => filter.zones.extend(parse_zone_param(&value)),
                "colors" => colors.extend(parse_colors_param(&value)),
                "passive" => passive = parse_flag(&value),
                other => debug!("Ignoring query parameter '{}'", other),
            }
        }

        Self {
            filter,
            palette: Palette::with_overrides(colors),
            passive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_query() {
        let params = OverlayParams::from_query(
            "?state=TX,oklahoma&wfo=fwd,toolong,OUN&type=TOR,SVR&zone=txz123,bad,OKC 109&passive",
        );
        assert_eq!(params.filter.states, vec!["TX", "oklahoma"]);
        assert_eq!(params.filter.offices, vec!["FWD", "OUN"]);
        assert_eq!(params.filter.types, vec!["TOR", "SVR"]);
        assert_eq!(params.filter.zones, vec!["TXZ123", "OKC109"]);
        assert!(params.passive);
    }

    #[test]
    fn test_passive_values() {
        assert!(!OverlayParams::from_query("").passive);
        assert!(OverlayParams::from_query("passive=true").passive);
        assert!(!OverlayParams::from_query("passive=false").passive);
    }

    #[test]
    fn test_colors_drop_invalid_entries() {
        let colors = parse_colors_param("TOR:#ff0000,SVR:#zzz,FFW:0f0,BOGUS:#123456,WSW");
        assert_eq!(colors.len(), 2);
        assert_eq!(colors[&Category::Tor], "#ff0000");
        assert_eq!(colors[&Category::Ffw], "#00ff00");
    }

    #[test]
    fn test_colors_round_trip() {
        let input = "TOR:#ff0000,SVR:#00aa11,SVA:#abc";
        let parsed = parse_colors_param(input);
        let serialized = serialize_colors_param(&parsed);
        assert_eq!(serialized, "TOR:#ff0000,SVR:#00aa11,SVA:#aabbcc");
        assert_eq!(parse_colors_param(&serialized), parsed);
    }

    #[test]
    fn test_colors_from_encoded_query() {
        let params = OverlayParams::from_query("colors=TOR:%23112233");
        assert_eq!(params.palette.color(Category::Tor), "#112233");
    }
}
