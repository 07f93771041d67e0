//! Layout configuration.
//!
//! Every field has a default, so a partial JSON document (or none at all)
//! produces a usable configuration.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::layout::band_packer::SymbolCategory;
use crate::layout::constants::*;

/// Tunable layout parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Standard-notation staff space
    pub line_spacing: f64,
    /// Distance between tablature strings
    pub tab_line_spacing: f64,
    /// Default distance between consecutive positions
    pub position_spacing: f64,
    /// Lower bound when positions are squeezed to fit the system width
    pub min_position_spacing: f64,
    /// Height of one annotation band
    pub band_height: f64,
    /// Vertical gap between staves of a system
    pub staff_spacing: f64,
    /// Vertical gap between systems
    pub system_spacing: f64,
    pub margin_left: f64,
    pub margin_top: f64,
    /// Font size for fret numbers and staff labels
    pub text_size: f64,
    /// Font size for chord names, tempo markers and directions
    pub system_text_size: f64,
    /// Tie-break order for symbols starting at the same x; categories not
    /// listed rank after every listed one
    pub symbol_priority: Vec<SymbolCategory>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_spacing: LINE_SPACING,
            tab_line_spacing: TAB_LINE_SPACING,
            position_spacing: POSITION_SPACING,
            min_position_spacing: MIN_POSITION_SPACING,
            band_height: BAND_HEIGHT,
            staff_spacing: STAFF_SPACING,
            system_spacing: SYSTEM_SPACING,
            margin_left: MARGIN_LEFT,
            margin_top: MARGIN_TOP,
            text_size: TEXT_SIZE,
            system_text_size: SYSTEM_TEXT_SIZE,
            symbol_priority: SymbolCategory::DEFAULT_PRIORITY.to_vec(),
        }
    }
}

impl LayoutConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        let config: LayoutConfig =
            serde_json::from_str(json).map_err(|e| LayoutError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every dimension is positive and the priority list has no
    /// duplicates.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let dimensions = [
            ("line_spacing", self.line_spacing),
            ("tab_line_spacing", self.tab_line_spacing),
            ("position_spacing", self.position_spacing),
            ("min_position_spacing", self.min_position_spacing),
            ("band_height", self.band_height),
            ("text_size", self.text_size),
            ("system_text_size", self.system_text_size),
        ];
        for (name, value) in dimensions {
            if !(value.is_finite() && value > 0.0) {
                return Err(LayoutError::Config(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        let gaps = [
            ("staff_spacing", self.staff_spacing),
            ("system_spacing", self.system_spacing),
            ("margin_left", self.margin_left),
            ("margin_top", self.margin_top),
        ];
        for (name, value) in gaps {
            if !(value.is_finite() && value >= 0.0) {
                return Err(LayoutError::Config(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }

        if self.min_position_spacing > self.position_spacing {
            return Err(LayoutError::Config(
                "min_position_spacing exceeds position_spacing".to_string(),
            ));
        }

        for (i, category) in self.symbol_priority.iter().enumerate() {
            if self.symbol_priority[..i].contains(category) {
                return Err(LayoutError::Config(format!(
                    "symbol_priority lists {category:?} twice"
                )));
            }
        }
        Ok(())
    }
}
