//! scorelayout — layout engine for standard notation and guitar tablature.
//!
//! Turns a [`Score`] (systems of standard and tablature staves, barlines and
//! annotations) into positioned drawables, grouped per system and staff so a
//! single system can be relaid out and replaced on its own.
//!
//! # Example
//! ```no_run
//! use scorelayout::{LayoutConfig, ScoreLayoutEngine, SvgSurface, score_from_json};
//!
//! let score = score_from_json(r#"{ "systems": [] }"#).unwrap();
//! let mut engine = ScoreLayoutEngine::new(LayoutConfig::default());
//! let result = engine.render_document(&score).unwrap();
//! let mut surface = SvgSurface::new(result.width, result.height);
//! engine.present(&mut surface);
//! println!("{}", surface.to_svg());
//! ```

pub mod config;
pub mod error;
pub mod font;
pub mod geometry;
pub mod items;
pub mod layout;
pub mod model;
pub mod surface;
pub mod svg;

pub use config::LayoutConfig;
pub use error::LayoutError;
pub use font::{Glyph, GlyphMetrics, StaffMetrics};
pub use geometry::{Point, Rect, Size};
pub use items::{Drawable, PlacedItem};
pub use layout::{
    layout_to_json, LayoutChange, LayoutResult, RedrawHandle, ScoreLayoutEngine, StaffLayout,
    SystemLayout,
};
pub use model::*;
pub use surface::{GroupKey, RenderSurface};
pub use svg::SvgSurface;

/// Parse a score document from JSON.
pub fn score_from_json(json: &str) -> Result<Score, LayoutError> {
    Ok(serde_json::from_str(json)?)
}

/// Convert a score to a JSON string.
pub fn score_to_json(score: &Score) -> Result<String, LayoutError> {
    Ok(serde_json::to_string_pretty(score)?)
}

/// Lay out `score` and render it to a standalone SVG document.
pub fn render_document_to_svg(score: &Score, config: &LayoutConfig) -> Result<String, LayoutError> {
    let mut engine = ScoreLayoutEngine::new(config.clone());
    let (width, height) = {
        let result = engine.render_document(score)?;
        (result.width, result.height)
    };
    let mut surface = SvgSurface::new(width, height);
    engine.present(&mut surface);
    Ok(surface.to_svg())
}
