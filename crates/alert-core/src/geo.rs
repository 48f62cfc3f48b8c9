//! State, county and zone descriptions from an alert's area text and UGC codes.
//!
//! Area text is a `;`-separated list of locations, each optionally ending in
//! `, XX` with a two-letter state code. UGC codes start with the state code.

use std::sync::LazyLock;

use regex::Regex;

static STATE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?),\s*([A-Z]{2})$").expect("valid state suffix regex")
});

/// Two-letter code to full name.
pub const STATES: [(&str, &str); 55] = [
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AS", "American Samoa"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("GU", "Guam"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("PR", "Puerto Rico"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("VI", "U.S. Virgin Islands"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

/// Codes outside the contiguous United States.
const NON_CONTIGUOUS: [&str; 6] = ["AK", "HI", "PR", "GU", "VI", "AS"];

/// Full state name for a code, if the code is known.
pub fn state_name(code: &str) -> Option<&'static str> {
    STATES
        .iter()
        .find(|(abbr, _)| *abbr == code)
        .map(|(_, name)| *name)
}

/// Normalize a state name or abbreviation to its two-letter code.
pub fn normalize_state(input: &str) -> Option<&'static str> {
    let trimmed = input.trim();
    let upper = trimmed.to_ascii_uppercase();
    STATES
        .iter()
        .find(|(abbr, name)| *abbr == upper || name.eq_ignore_ascii_case(trimmed))
        .map(|(abbr, _)| *abbr)
}

/// The contiguous-US codes (48 states plus DC).
pub fn contiguous_states() -> impl Iterator<Item = &'static str> {
    STATES
        .iter()
        .map(|(abbr, _)| *abbr)
        .filter(|abbr| !NON_CONTIGUOUS.contains(abbr))
}

fn segments(area: &str) -> impl Iterator<Item = &str> {
    area.split(';').map(str::trim).filter(|s| !s.is_empty())
}

/// Split a segment into (name, state code) when it ends in `, XX`.
fn split_suffix(segment: &str) -> Option<(&str, &str)> {
    let caps = STATE_SUFFIX.captures(segment)?;
    let name = caps.get(1)?.as_str();
    let code = caps.get(2)?.as_str();
    Some((name, code))
}

/// State codes from `, XX` suffixes in the area text, in order of appearance.
pub fn area_state_codes(area: &str) -> Vec<String> {
    segments(area)
        .filter_map(split_suffix)
        .map(|(_, code)| code.to_string())
        .collect()
}

/// All state codes for an alert: area suffixes then UGC prefixes, deduplicated.
pub fn state_codes(area: &str, ugc: &[String]) -> Vec<String> {
    let mut codes: Vec<String> = Vec::new();
    let from_ugc = ugc
        .iter()
        .filter_map(|z| z.get(..2))
        .map(str::to_ascii_uppercase);
    for code in area_state_codes(area).into_iter().chain(from_ugc) {
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    codes
}

/// Human-readable states, joined with ", ".
///
/// Unknown codes (marine zone prefixes, for example) pass through verbatim.
pub fn get_states(area: &str, ugc: &[String]) -> String {
    state_codes(area, ugc)
        .iter()
        .map(|code| state_name(code).unwrap_or(code.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// True when the area text is a single zone name rather than a county list.
pub fn is_zone_based(area: &str, ugc: &[String]) -> bool {
    area_state_codes(area).is_empty() && !ugc.is_empty()
}

/// County names with state suffixes stripped, joined with ", ".
pub fn get_counties(area: &str) -> String {
    segments(area)
        .map(|segment| split_suffix(segment).map_or(segment, |(name, _)| name.trim_end()))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// County names rendered as `Name (XX)`, for alerts spanning several states.
pub fn get_counties_with_states(area: &str) -> String {
    segments(area)
        .map(|segment| match split_suffix(segment) {
            Some((name, code)) => format!("{} ({})", name.trim_end(), code),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ugc(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_single_state_area() {
        let area = "Smith, TX; Jones, TX";
        assert!(!is_zone_based(area, &[]));
        assert_eq!(get_states(area, &[]), "Texas");
        assert_eq!(get_counties(area), "Smith, Jones");
    }

    #[test]
    fn test_states_merge_ugc_prefixes() {
        let area = "Caddo, LA; Bowie, TX";
        let zones = ugc(&["LAC017", "TXC037", "ARC091"]);
        assert_eq!(state_codes(area, &zones), vec!["LA", "TX", "AR"]);
        assert_eq!(get_states(area, &zones), "Louisiana, Texas, Arkansas");
    }

    #[test]
    fn test_unknown_code_passes_through() {
        let zones = ugc(&["GMZ550"]);
        assert_eq!(get_states("Coastal waters from Port O'Connor", &zones), "GM");
    }

    #[test]
    fn test_zone_based() {
        let area = "Northern Oklahoma Grasslands";
        assert!(is_zone_based(area, &ugc(&["OKZ004"])));
        assert!(!is_zone_based(area, &[]));
    }

    #[test]
    fn test_no_semicolon_single_element() {
        assert_eq!(get_counties("Smith, TX"), "Smith");
        assert_eq!(get_counties("Lake Okeechobee"), "Lake Okeechobee");
        assert_eq!(get_counties_with_states("Smith, TX"), "Smith (TX)");
    }

    #[test]
    fn test_counties_with_states() {
        let area = "Washington, AR; Washington, OK; Adair";
        assert_eq!(
            get_counties_with_states(area),
            "Washington (AR), Washington (OK), Adair"
        );
    }

    #[test]
    fn test_normalize_state() {
        assert_eq!(normalize_state("tx"), Some("TX"));
        assert_eq!(normalize_state(" New Mexico "), Some("NM"));
        assert_eq!(normalize_state("north carolina"), Some("NC"));
        assert_eq!(normalize_state("Texass"), None);
        assert_eq!(normalize_state("ZZ"), None);
    }

    #[test]
    fn test_contiguous_states() {
        let conus: Vec<_> = contiguous_states().collect();
        assert_eq!(conus.len(), 49);
        assert!(conus.contains(&"DC"));
        assert!(!conus.contains(&"AK"));
        assert!(!conus.contains(&"PR"));
    }
}
