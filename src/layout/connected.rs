//! Building wide symbols that span an exact horizontal distance.
//!
//! Each kind follows one fill policy:
//!
//! * tiled kinds repeat a font glyph a whole number of times and close the
//!   remaining gap with a hairline;
//! * wedges scale two line segments to the width;
//! * the zig-zag divides the width into equal segments;
//! * labelled kinds draw their text and fill the rest with dashes ending in
//!   a vertical tick, except the trill which continues as a tiled wave.

use serde::Serialize;

use super::constants::*;
use crate::font::{Glyph, GlyphMetrics};
use crate::geometry::{Point, Rect};
use crate::items::{bounds_of, PlacedItem, TextAnchor};

/// Tolerance on the produced width.
pub const WIDTH_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectedKind {
    Vibrato,
    WideVibrato,
    TrillWave,
    PickStrokeUp,
    PickStrokeDown,
    SwellIncreasing,
    SwellDecreasing,
    TremoloBar,
    LetRing,
    PalmMute,
    Trill,
}

impl ConnectedKind {
    pub const ALL: [ConnectedKind; 11] = [
        ConnectedKind::Vibrato,
        ConnectedKind::WideVibrato,
        ConnectedKind::TrillWave,
        ConnectedKind::PickStrokeUp,
        ConnectedKind::PickStrokeDown,
        ConnectedKind::SwellIncreasing,
        ConnectedKind::SwellDecreasing,
        ConnectedKind::TremoloBar,
        ConnectedKind::LetRing,
        ConnectedKind::PalmMute,
        ConnectedKind::Trill,
    ];

    fn tile(self) -> Option<Glyph> {
        match self {
            ConnectedKind::Vibrato => Some(Glyph::Vibrato),
            ConnectedKind::WideVibrato => Some(Glyph::WideVibrato),
            ConnectedKind::TrillWave => Some(Glyph::TrillWave),
            ConnectedKind::PickStrokeUp => Some(Glyph::PickStrokeUp),
            ConnectedKind::PickStrokeDown => Some(Glyph::PickStrokeDown),
            _ => None,
        }
    }

    fn label(self) -> Option<&'static str> {
        match self {
            ConnectedKind::LetRing => Some("let ring"),
            ConnectedKind::PalmMute => Some("P.M."),
            ConnectedKind::Trill => Some("tr"),
            _ => None,
        }
    }
}

/// A connected symbol: its parts plus their union bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectedGlyph {
    pub kind: ConnectedKind,
    pub items: Vec<PlacedItem>,
    pub bounds: Rect,
}

/// Builds connected symbols centred on a horizontal axis.
pub struct ConnectedGlyphBuilder<'a> {
    metrics: &'a dyn GlyphMetrics,
    /// Vertical extent available to the symbol
    height: f64,
    text_size: f64,
}

impl<'a> ConnectedGlyphBuilder<'a> {
    pub fn new(metrics: &'a dyn GlyphMetrics, height: f64, text_size: f64) -> Self {
        Self {
            metrics,
            height,
            text_size,
        }
    }

    /// Build `kind` from `x` to `x + width`, centred on `center_y`.
    ///
    /// Non-positive widths produce an empty symbol.
    pub fn build(&self, kind: ConnectedKind, x: f64, center_y: f64, width: f64) -> ConnectedGlyph {
        let items = if width <= 0.0 {
            Vec::new()
        } else if let Some(glyph) = kind.tile() {
            self.tiled(glyph, x, center_y, width)
        } else if let Some(label) = kind.label() {
            self.labelled(kind, label, x, center_y, width)
        } else {
            match kind {
                ConnectedKind::SwellIncreasing => self.wedge(true, x, center_y, width),
                ConnectedKind::SwellDecreasing => self.wedge(false, x, center_y, width),
                _ => self.zigzag(x, center_y, width),
            }
        };
        let bounds = bounds_of(&items).unwrap_or_else(|| Rect::new(x, center_y, 0.0, 0.0));
        ConnectedGlyph {
            kind,
            items,
            bounds,
        }
    }

    fn tiled(&self, glyph: Glyph, x: f64, center_y: f64, width: f64) -> Vec<PlacedItem> {
        let unit = self.metrics.glyph_size(glyph).width;
        let count = if unit > 0.0 {
            (width / unit).floor() as usize
        } else {
            0
        };
        let mut items: Vec<PlacedItem> = (0..count)
            .map(|i| {
                let cx = x + (i as f64 + 0.5) * unit;
                PlacedItem::glyph(glyph, Point::new(cx, center_y), self.metrics, Z_SYMBOL)
            })
            .collect();
        let covered = count as f64 * unit;
        if width - covered > WIDTH_EPSILON {
            items.push(PlacedItem::line(
                Point::new(x + covered, center_y),
                Point::new(x + width, center_y),
                HAIRLINE_WIDTH,
                Z_SYMBOL,
            ));
        }
        items
    }

    fn wedge(&self, increasing: bool, x: f64, center_y: f64, width: f64) -> Vec<PlacedItem> {
        let half = self.height * WEDGE_OPENING / 2.0;
        let (apex_x, open_x) = if increasing { (x, x + width) } else { (x + width, x) };
        let apex = Point::new(apex_x, center_y);
        vec![
            PlacedItem::line(apex, Point::new(open_x, center_y - half), SYMBOL_LINE_WIDTH, Z_SYMBOL),
            PlacedItem::line(apex, Point::new(open_x, center_y + half), SYMBOL_LINE_WIDTH, Z_SYMBOL),
        ]
    }

    fn zigzag(&self, x: f64, center_y: f64, width: f64) -> Vec<PlacedItem> {
        let segments = ((width / ZIGZAG_UNIT).round() as usize).max(1);
        let step = width / segments as f64;
        let half = self.height * WEDGE_OPENING / 2.0;
        let points = (0..=segments)
            .map(|i| {
                // Pin the last point so rounding never drifts off the width.
                let px = if i == segments { x + width } else { x + i as f64 * step };
                let py = if i % 2 == 0 { center_y + half } else { center_y - half };
                Point::new(px, py)
            })
            .collect();
        vec![PlacedItem::polyline(points, SYMBOL_LINE_WIDTH, Z_SYMBOL)]
    }

    fn labelled(
        &self,
        kind: ConnectedKind,
        label: &str,
        x: f64,
        center_y: f64,
        width: f64,
    ) -> Vec<PlacedItem> {
        let natural = self.metrics.text_width(label, self.text_size);
        // Shrink the label rather than overrun a short span.
        let size = if natural > width {
            self.text_size * width / natural
        } else {
            self.text_size
        };
        let mut items = vec![PlacedItem::text(
            label,
            Point::new(x, center_y),
            size,
            TextAnchor::Start,
            self.metrics,
            Z_SYMBOL,
        )];

        let end = x + width;
        let mut dash_x = x + self.metrics.text_width(label, size) + LABEL_GAP;
        if kind == ConnectedKind::Trill {
            let text_end = dash_x - LABEL_GAP;
            if dash_x < end {
                items.extend(self.tiled(Glyph::TrillWave, dash_x, center_y, end - dash_x));
            } else if end - text_end > WIDTH_EPSILON {
                items.push(PlacedItem::line(
                    Point::new(text_end, center_y),
                    Point::new(end, center_y),
                    HAIRLINE_WIDTH,
                    Z_SYMBOL,
                ));
            }
            return items;
        }
        while dash_x < end {
            let dash_end = (dash_x + DASH_LENGTH).min(end);
            items.push(PlacedItem::line(
                Point::new(dash_x, center_y),
                Point::new(dash_end, center_y),
                HAIRLINE_WIDTH,
                Z_SYMBOL,
            ));
            dash_x += DASH_LENGTH + DASH_GAP;
        }

        // The tick's stroke sits inside the span.
        let tick = self.height * WEDGE_OPENING / 2.0;
        let stroke = HAIRLINE_WIDTH.min(width);
        let tick_x = end - stroke / 2.0;
        items.push(PlacedItem::line(
            Point::new(tick_x, center_y - tick),
            Point::new(tick_x, center_y + tick),
            stroke,
            Z_SYMBOL,
        ));
        items
    }
}
