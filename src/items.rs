//! Positioned drawable primitives produced by layout.

use serde::Serialize;

use crate::font::{Glyph, GlyphMetrics};
use crate::geometry::{Point, Rect};

/// Horizontal anchoring of a text run relative to its `at` point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

/// Fill style of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RectStyle {
    Filled,
    Outline,
    /// Background-coloured fill masking whatever lies underneath
    Knockout,
}

/// A drawable primitive in layout coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Drawable {
    Line {
        from: Point,
        to: Point,
        width: f64,
        dashed: bool,
    },
    Rect {
        rect: Rect,
        style: RectStyle,
    },
    /// A font glyph centred on `at`
    Glyph { glyph: Glyph, at: Point },
    /// Text vertically centred on `at.y`
    Text {
        text: String,
        at: Point,
        size: f64,
        anchor: TextAnchor,
    },
    Polyline { points: Vec<Point>, width: f64 },
    /// Quadratic arc through `control`
    Curve {
        from: Point,
        control: Point,
        to: Point,
        width: f64,
    },
}

impl Drawable {
    fn translate(&mut self, dx: f64, dy: f64) {
        match self {
            Drawable::Line { from, to, .. } => {
                *from = from.offset(dx, dy);
                *to = to.offset(dx, dy);
            }
            Drawable::Rect { rect, .. } => *rect = rect.translate(dx, dy),
            Drawable::Glyph { at, .. } | Drawable::Text { at, .. } => *at = at.offset(dx, dy),
            Drawable::Polyline { points, .. } => {
                for p in points.iter_mut() {
                    *p = p.offset(dx, dy);
                }
            }
            Drawable::Curve {
                from, control, to, ..
            } => {
                *from = from.offset(dx, dy);
                *control = control.offset(dx, dy);
                *to = to.offset(dx, dy);
            }
        }
    }
}

/// A drawable with its bounding box and paint layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedItem {
    pub drawable: Drawable,
    pub bounds: Rect,
    /// Paint layer; higher values draw on top
    pub z: i32,
}

impl PlacedItem {
    pub fn line(from: Point, to: Point, width: f64, z: i32) -> Self {
        Self::stroke(from, to, width, false, z)
    }

    pub fn dashed_line(from: Point, to: Point, width: f64, z: i32) -> Self {
        Self::stroke(from, to, width, true, z)
    }

    fn stroke(from: Point, to: Point, width: f64, dashed: bool, z: i32) -> Self {
        // Stroke width only thickens the box across the line's direction so
        // horizontal runs keep their exact length.
        let r = Rect::from_points(from, to);
        let half = width / 2.0;
        let bounds = if r.height() == 0.0 {
            Rect::from_points(Point::new(r.min_x(), r.min_y() - half), Point::new(r.max_x(), r.max_y() + half))
        } else if r.width() == 0.0 {
            Rect::from_points(Point::new(r.min_x() - half, r.min_y()), Point::new(r.max_x() + half, r.max_y()))
        } else {
            r
        };
        Self {
            drawable: Drawable::Line {
                from,
                to,
                width,
                dashed,
            },
            bounds,
            z,
        }
    }

    pub fn rect(rect: Rect, style: RectStyle, z: i32) -> Self {
        Self {
            drawable: Drawable::Rect { rect, style },
            bounds: rect,
            z,
        }
    }

    pub fn glyph(glyph: Glyph, at: Point, metrics: &dyn GlyphMetrics, z: i32) -> Self {
        Self {
            drawable: Drawable::Glyph { glyph, at },
            bounds: Rect::from_center(at, metrics.glyph_size(glyph)),
            z,
        }
    }

    pub fn text(
        text: impl Into<String>,
        at: Point,
        size: f64,
        anchor: TextAnchor,
        metrics: &dyn GlyphMetrics,
        z: i32,
    ) -> Self {
        let text = text.into();
        let width = metrics.text_width(&text, size);
        let height = metrics.text_height(size);
        let left = match anchor {
            TextAnchor::Start => at.x,
            TextAnchor::Middle => at.x - width / 2.0,
            TextAnchor::End => at.x - width,
        };
        Self {
            bounds: Rect::new(left, at.y - height / 2.0, width, height),
            drawable: Drawable::Text {
                text,
                at,
                size,
                anchor,
            },
            z,
        }
    }

    pub fn polyline(points: Vec<Point>, width: f64, z: i32) -> Self {
        let bounds = points
            .iter()
            .map(|&p| Rect::from_points(p, p))
            .reduce(Rect::merge)
            .unwrap_or_default();
        Self {
            drawable: Drawable::Polyline { points, width },
            bounds,
            z,
        }
    }

    pub fn curve(from: Point, control: Point, to: Point, width: f64, z: i32) -> Self {
        // The apex of a quadratic arc lies halfway between the chord and
        // the control point.
        let apex = Point::new(
            (from.x + to.x) / 4.0 + control.x / 2.0,
            (from.y + to.y) / 4.0 + control.y / 2.0,
        );
        let bounds = Rect::from_points(from, to).merge(Rect::from_points(apex, apex));
        Self {
            drawable: Drawable::Curve {
                from,
                control,
                to,
                width,
            },
            bounds,
            z,
        }
    }

    /// Returns the item moved by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        let mut item = self.clone();
        item.translate(dx, dy);
        item
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.drawable.translate(dx, dy);
        self.bounds = self.bounds.translate(dx, dy);
    }
}

/// Union of the bounds of `items`, if any.
pub fn bounds_of<'a>(items: impl IntoIterator<Item = &'a PlacedItem>) -> Option<Rect> {
    items.into_iter().map(|i| i.bounds).reduce(Rect::merge)
}
