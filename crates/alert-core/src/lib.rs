//! Alert records, classification, geography and filtering for the Overwarn overlay.
//!
//! This crate holds the pure, synchronous half of the overlay:
//!
//! - [`FeedDocument`] / [`RawAlertRecord`] - the feed's record shape, validated at ingestion
//! - [`classifier`] - event name to [`Category`], with escalation markers
//! - [`geo`] - state, county and zone descriptions from area text and UGC codes
//! - [`filter`] - state/office/type/zone filters over [`GroupedAlerts`]
//! - [`params`] - the query-string filter specification and color overrides
//! - [`display`] - derived display strings (area bar, expiry)
//!
//! # Example
//!
//! ```rust
//! use alert_core::{apply_filters, group_alerts, FeedDocument, FilterSpec};
//!
//! let doc = FeedDocument::from_json(r#"{"features": [{"properties": {
//!     "event": "Tornado Warning",
//!     "headline": "Tornado Warning issued",
//!     "areaDesc": "Smith, TX; Jones, TX",
//!     "ends": "2025-01-01T00:00:00Z"
//! }}]}"#).unwrap();
//!
//! let grouped = group_alerts(&doc);
//! let filtered = apply_filters(&grouped, &FilterSpec::new().with_states(["TX"]));
//! assert_eq!(filtered.len(), 1);
//! ```

pub mod classifier;
pub mod display;
mod error;
pub mod filter;
pub mod geo;
pub mod palette;
pub mod params;
mod types;

pub use classifier::{classify, group_alerts};
pub use error::CoreError;
pub use filter::{apply_filters, FilterSpec, CONTIGUOUS_TOKEN};
pub use palette::Palette;
pub use params::OverlayParams;
pub use types::{
    AlertKey, AlertParameters, Category, ClassifiedAlert, Escalation, Feature, FeedDocument,
    Geocode, GroupedAlerts, RawAlertRecord,
};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
