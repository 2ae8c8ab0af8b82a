//! px → vw unit conversion.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a pixel length anchored at the end of a line prefix: an optional
/// leading minus sign, digits, an optional decimal fraction, then `px`.
static PX_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(-?\d+(\.\d+)?)px$").expect("px suffix pattern is valid"));

/// Extract the numeric part of a trailing pixel length, e.g. `"width: 100px"`
/// yields `"100"`. The prefix must end exactly at the `px` unit.
pub fn px_suffix(prefix: &str) -> Option<&str> {
    PX_SUFFIX
        .captures(prefix)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Convert a pixel length to viewport-width units.
pub fn px_to_vw(px: f64, viewport_width: f64) -> f64 {
    px / viewport_width * 100.0
}

/// Format a vw value with a fixed number of fractional digits.
///
/// Rounding is whatever `format!("{:.N}")` does; precision 0 produces no
/// decimal point.
pub fn format_vw(value: f64, precision: u32) -> String {
    format!("{:.*}", precision as usize, value)
}
