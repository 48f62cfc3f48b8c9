//! Category display colors.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;
use crate::types::Category;

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#?([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid hex color regex")
});

/// Color used when nothing else applies.
pub const FALLBACK_COLOR: &str = "#404040";
const FALLBACK_LIGHT_COLOR: &str = "#737373";

/// Default (base, light) colors for a category.
pub fn default_colors(category: Category) -> (&'static str, &'static str) {
    match category {
        Category::Tor => ("#dc2626", "#f87171"),
        Category::TorEmergency => ("#9333ea", "#c084fc"),
        Category::Svr => ("#eab308", "#fde047"),
        Category::Ffw => ("#22c55e", "#86efac"),
        Category::Wsw => ("#3b82f6", "#93c5fd"),
        Category::Toa => ("#ec4899", "#f9a8d4"),
        Category::Sva => ("#f97316", "#fdba74"),
    }
}

/// Normalize a hex color to lowercase `#rrggbb`, expanding 3-digit form.
pub fn normalize_hex(input: &str) -> Result<String, CoreError> {
    let trimmed = input.trim();
    let caps = HEX_COLOR
        .captures(trimmed)
        .ok_or_else(|| CoreError::InvalidColor(trimmed.to_string()))?;
    let digits = caps[1].to_ascii_lowercase();
    if digits.len() == 3 {
        Ok(digits.chars().fold(String::from("#"), |mut out, c| {
            out.push(c);
            out.push(c);
            out
        }))
    } else {
        Ok(format!("#{}", digits))
    }
}

/// Lighten a `#rrggbb` color by `percent`, capping each channel at 255.
pub fn lighten_hex(hex: &str, percent: u8) -> String {
    let Ok(normalized) = normalize_hex(hex) else {
        return hex.to_string();
    };
    let amount = (2.55 * f64::from(percent)).round() as u16;
    let channel = |range: std::ops::Range<usize>| {
        let value = u16::from_str_radix(&normalized[range], 16).unwrap_or(0);
        (value + amount).min(255)
    };
    format!(
        "#{:02x}{:02x}{:02x}",
        channel(1..3),
        channel(3..5),
        channel(5..7)
    )
}

/// Light variant of a display color, used for the area bar.
///
/// Default category colors map to their paired light color; any other
/// color is lightened by 20%.
pub fn light_color(color: &str) -> String {
    let lowered = color.to_ascii_lowercase();
    if lowered == FALLBACK_COLOR {
        return FALLBACK_LIGHT_COLOR.to_string();
    }
    Category::ALL
        .into_iter()
        .map(default_colors)
        .find(|(base, _)| *base == lowered)
        .map(|(_, light)| light.to_string())
        .unwrap_or_else(|| lighten_hex(color, 20))
}

/// Per-category color assignment with user overrides applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Palette {
    overrides: BTreeMap<Category, String>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a palette from validated overrides.
    pub fn with_overrides(overrides: BTreeMap<Category, String>) -> Self {
        Self { overrides }
    }

    /// Display color for a category.
    pub fn color(&self, category: Category) -> &str {
        self.overrides
            .get(&category)
            .map(String::as_str)
            .unwrap_or_else(|| default_colors(category).0)
    }

    pub fn overrides(&self) -> &BTreeMap<Category, String> {
        &self.overrides
    }
}
