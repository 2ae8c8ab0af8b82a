use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Fully resolved conversion settings for one document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveConfig {
    /// Design viewport width in pixels. Always positive: the default layer
    /// supplies a positive value and zero layer values are treated as unset.
    pub viewport_width: f64,

    /// Number of fractional digits emitted when formatting a vw value.
    pub unit_precision: u32,
}

fn default_viewport_width() -> f64 {
    1440.0
}

fn default_unit_precision() -> u32 {
    3
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            viewport_width: default_viewport_width(),
            unit_precision: default_unit_precision(),
        }
    }
}

/// One configuration layer's explicitly-set fields.
///
/// `None` means "unset at this layer"; an unset field never overrides a
/// lower-precedence layer. The on-disk format cannot distinguish "absent"
/// from "zero" (see [`CssremConfig::into_partial`]), so the sentinel is made
/// explicit here and composition code only ever deals in `Option`s.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartialConfig {
    pub viewport_width: Option<f64>,
    pub unit_precision: Option<u32>,
}

impl PartialConfig {
    /// Fill fields this layer leaves unset from a lower-precedence layer.
    ///
    /// Merge direction follows resolution order: start from the
    /// highest-precedence layer and call `merge_from` with each lower layer
    /// in turn, then `resolve` to apply the application defaults.
    pub fn merge_from(&mut self, lower: &PartialConfig) {
        if self.viewport_width.is_none() {
            self.viewport_width = lower.viewport_width;
        }
        if self.unit_precision.is_none() {
            self.unit_precision = lower.unit_precision;
        }
    }

    /// Resolve to a concrete config, applying application defaults for any
    /// field unset at every layer.
    pub fn resolve(&self) -> EffectiveConfig {
        EffectiveConfig {
            viewport_width: self.viewport_width.unwrap_or_else(default_viewport_width),
            unit_precision: self.unit_precision.unwrap_or_else(default_unit_precision),
        }
    }
}

impl From<EffectiveConfig> for PartialConfig {
    fn from(config: EffectiveConfig) -> Self {
        Self {
            viewport_width: Some(config.viewport_width),
            unit_precision: Some(config.unit_precision),
        }
    }
}

/// Bindings for the `.cssrem` configuration schema.
///
/// Both the user-global `config.json` and per-workspace `.cssrem` files use
/// this format. The schema carries its own defaults (750 / 6), which are
/// distinct from the application defaults in [`EffectiveConfig`]: they apply
/// only when a file exists and parses. Unrecognized keys are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CssremConfig {
    /// Design draft viewport width in pixels.
    #[serde(default = "default_vw_design")]
    pub vw_design: f64,

    /// Number of fractional digits retained after conversion.
    #[serde(default = "default_fixed_digits")]
    pub fixed_digits: f64,
}

fn default_vw_design() -> f64 {
    750.0
}

fn default_fixed_digits() -> f64 {
    6.0
}

impl CssremConfig {
    /// Convert schema values into a configuration layer.
    ///
    /// A value of exactly zero is treated as unset. This convention is
    /// inherited from the format's override semantics: it means precision 0
    /// cannot be expressed at the global or project layer, only through the
    /// application default.
    pub fn into_partial(self) -> PartialConfig {
        PartialConfig {
            viewport_width: (self.vw_design != 0.0).then_some(self.vw_design),
            unit_precision: (self.fixed_digits != 0.0).then_some(self.fixed_digits.max(0.0) as u32),
        }
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(msg) => write!(f, "IO error: {msg}"),
            ConfigError::ParseError(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EffectiveConfig::default();
        assert_eq!(config.viewport_width, 1440.0);
        assert_eq!(config.unit_precision, 3);
    }

    #[test]
    fn test_schema_defaults_differ_from_application_defaults() {
        let schema: CssremConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(schema.vw_design, 750.0);
        assert_eq!(schema.fixed_digits, 6.0);

        let partial = schema.into_partial();
        assert_eq!(partial.viewport_width, Some(750.0));
        assert_eq!(partial.unit_precision, Some(6));
    }

    #[test]
    fn test_partial_schema_file() {
        let schema: CssremConfig = serde_json::from_str(r#"{"vwDesign": 1440}"#).unwrap();
        assert_eq!(schema.vw_design, 1440.0);
        assert_eq!(schema.fixed_digits, 6.0);

        let schema: CssremConfig = serde_json::from_str(r#"{"fixedDigits": 2}"#).unwrap();
        assert_eq!(schema.vw_design, 750.0);
        assert_eq!(schema.fixed_digits, 2.0);
    }

    #[test]
    fn test_unrecognized_keys_ignored() {
        let schema: CssremConfig = serde_json::from_str(
            r#"{
                "$schema": "https://raw.githubusercontent.com/cipchk/vscode-cssrem/master/schema.json",
                "rootFontSize": 16,
                "vwDesign": 1920,
                "fixedDigits": 3
            }"#,
        )
        .unwrap();
        assert_eq!(schema.vw_design, 1920.0);
        assert_eq!(schema.fixed_digits, 3.0);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(serde_json::from_str::<CssremConfig>(r#"{"vwDesign": 1920 "fixedDigits": 3}"#).is_err());
        assert!(serde_json::from_str::<CssremConfig>(r#""vwDesign": 1920"#).is_err());
    }

    #[test]
    fn test_zero_maps_to_unset() {
        let schema: CssremConfig =
            serde_json::from_str(r#"{"vwDesign": 0, "fixedDigits": 0}"#).unwrap();
        let partial = schema.into_partial();
        assert_eq!(partial.viewport_width, None);
        assert_eq!(partial.unit_precision, None);
    }

    #[test]
    fn test_merge_global_over_default() {
        // Global {1920, 2}, project unset -> {1920, 2}
        let mut merged = PartialConfig::default();
        merged.merge_from(&PartialConfig {
            viewport_width: Some(1920.0),
            unit_precision: Some(2),
        });
        let config = merged.resolve();
        assert_eq!(config.viewport_width, 1920.0);
        assert_eq!(config.unit_precision, 2);
    }

    #[test]
    fn test_merge_project_over_global_partial() {
        // Project sets only the viewport; precision is inherited from global.
        let mut merged = PartialConfig {
            viewport_width: Some(2560.0),
            unit_precision: None,
        };
        merged.merge_from(&PartialConfig {
            viewport_width: Some(1920.0),
            unit_precision: Some(2),
        });
        let config = merged.resolve();
        assert_eq!(config.viewport_width, 2560.0);
        assert_eq!(config.unit_precision, 2);
    }

    #[test]
    fn test_all_layers_unset_yields_defaults() {
        let mut merged = PartialConfig::default();
        merged.merge_from(&PartialConfig::default());
        assert_eq!(merged.resolve(), EffectiveConfig::default());
    }
}
