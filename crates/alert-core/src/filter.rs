//! State, office, type and zone filters over grouped alerts.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::geo::{contiguous_states, normalize_state, state_codes};
use crate::types::{Category, ClassifiedAlert, GroupedAlerts};

/// Token in the state filter selecting every contiguous-US state.
pub const CONTIGUOUS_TOKEN: &str = "CONUS";

/// User-supplied filter specification. Empty lists are no-ops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// State names or two-letter codes, or [`CONTIGUOUS_TOKEN`].
    #[serde(default)]
    pub states: Vec<String>,
    /// Three-letter forecast office codes.
    #[serde(default)]
    pub offices: Vec<String>,
    /// Category keys such as "TOR".
    #[serde(default)]
    pub types: Vec<String>,
    /// UGC zone codes.
    #[serde(default)]
    pub zones: Vec<String>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states = states.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_offices<I, S>(mut self, offices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.offices = offices.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_zones<I, S>(mut self, zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.zones = zones.into_iter().map(Into::into).collect();
        self
    }

    /// True when no filter would remove anything.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
            && self.offices.is_empty()
            && self.types.is_empty()
            && self.zones.is_empty()
    }

    /// Compile into predicates, dropping entries that cannot match.
    fn compile(&self) -> CompiledFilter {
        let mut states = HashSet::new();
        for input in &self.states {
            if input.trim().eq_ignore_ascii_case(CONTIGUOUS_TOKEN) {
                states.extend(contiguous_states());
            } else if let Some(code) = normalize_state(input) {
                states.insert(code);
            } else {
                warn!("Ignoring unrecognized state '{}'", input);
            }
        }

        let offices = self
            .offices
            .iter()
            .map(|o| o.trim().to_ascii_uppercase())
            .filter(|o| o.len() == 3)
            .collect();

        let types = self
            .types
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let zones = self
            .zones
            .iter()
            .map(|z| z.trim().to_ascii_uppercase())
            .filter(|z| !z.is_empty())
            .collect();

        CompiledFilter {
            states,
            offices,
            types,
            zones,
        }
    }
}

struct CompiledFilter {
    states: HashSet<&'static str>,
    offices: HashSet<String>,
    types: HashSet<String>,
    zones: HashSet<String>,
}

impl CompiledFilter {
    fn matches(&self, category: Category, alert: &ClassifiedAlert) -> bool {
        self.matches_type(category)
            && self.matches_state(alert)
            && self.matches_office(alert)
            && self.matches_zone(alert)
    }

    fn matches_type(&self, category: Category) -> bool {
        self.types.is_empty() || self.types.contains(category.key())
    }

    fn matches_state(&self, alert: &ClassifiedAlert) -> bool {
        if self.states.is_empty() {
            return true;
        }
        state_codes(&alert.area, alert.ugc())
            .iter()
            .any(|code| self.states.contains(code.as_str()))
    }

    fn matches_office(&self, alert: &ClassifiedAlert) -> bool {
        if self.offices.is_empty() {
            return true;
        }
        alert
            .office_code()
            .is_some_and(|office| self.offices.contains(office))
    }

    fn matches_zone(&self, alert: &ClassifiedAlert) -> bool {
        if self.zones.is_empty() {
            return true;
        }
        alert
            .ugc()
            .iter()
            .any(|z| self.zones.contains(&z.trim().to_ascii_uppercase()))
    }
}

/// Apply every active filter. Categories left empty are omitted.
pub fn apply_filters(alerts: &GroupedAlerts, spec: &FilterSpec) -> GroupedAlerts {
    if spec.is_empty() {
        return alerts.clone();
    }
    let compiled = spec.compile();
    let filtered = alerts.retain(|category, alert| compiled.matches(category, alert));
    debug!(
        before = alerts.len(),
        after = filtered.len(),
        "Applied alert filters"
    );
    filtered
}
