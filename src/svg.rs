//! SVG preview surface — collects placed items per group and produces a
//! standalone SVG document.

use std::collections::BTreeMap;

use crate::geometry::Point;
use crate::items::{Drawable, PlacedItem, RectStyle, TextAnchor};
use crate::layout::constants::{Z_BARLINE, Z_STAFF, Z_SYMBOL};
use crate::surface::{GroupKey, RenderSurface};

const NOTE_COLOR: &str = "#1a1a1a";
const STAFF_COLOR: &str = "#555555";
const BARLINE_COLOR: &str = "#333333";
const SYMBOL_COLOR: &str = "#4a4a9a";
const BACKGROUND: &str = "#ffffff";

fn escape(content: &str) -> String {
    content
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn color(z: i32) -> &'static str {
    match z {
        Z_STAFF => STAFF_COLOR,
        Z_BARLINE => BARLINE_COLOR,
        Z_SYMBOL => SYMBOL_COLOR,
        _ => NOTE_COLOR,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SvgSurface
// ═══════════════════════════════════════════════════════════════════════

/// In-memory surface; groups are kept in paint order (systems top to
/// bottom, each system's own group before its staves).
#[derive(Debug, Clone, Default)]
pub struct SvgSurface {
    groups: BTreeMap<(usize, Option<usize>), (GroupKey, Vec<PlacedItem>)>,
    width: f64,
    height: f64,
}

impl SvgSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            groups: BTreeMap::new(),
            width,
            height,
        }
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Items of `group`, in insertion order.
    pub fn items(&self, group: GroupKey) -> &[PlacedItem] {
        self.groups
            .get(&group.paint_order())
            .map(|(_, items)| items.as_slice())
            .unwrap_or(&[])
    }

    pub fn groups(&self) -> impl Iterator<Item = GroupKey> + '_ {
        self.groups.values().map(|(key, _)| *key)
    }

    pub fn item_count(&self) -> usize {
        self.groups.values().map(|(_, items)| items.len()).sum()
    }

    /// Serialise the surface. Items are painted by layer, keeping group
    /// order within a layer.
    pub fn to_svg(&self) -> String {
        let mut items: Vec<&PlacedItem> = self
            .groups
            .values()
            .flat_map(|(_, items)| items.iter())
            .collect();
        items.sort_by_key(|item| item.z);

        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {:.1} {:.1}" width="{:.1}" height="{:.1}" style="font-family: 'Georgia', 'Times New Roman', serif;">"#,
            self.width, self.height, self.width, self.height
        );
        svg.push('\n');
        for item in items {
            svg.push_str("  ");
            svg.push_str(&element(item));
            svg.push('\n');
        }
        svg.push_str("</svg>\n");
        svg
    }
}

impl RenderSurface for SvgSurface {
    fn clear(&mut self) {
        self.groups.clear();
    }

    fn remove_group(&mut self, group: GroupKey) {
        self.groups.remove(&group.paint_order());
    }

    fn add_item(&mut self, group: GroupKey, item: &PlacedItem) {
        self.groups
            .entry(group.paint_order())
            .or_insert_with(|| (group, Vec::new()))
            .1
            .push(item.clone());
    }

    fn hit_test(&self, point: Point) -> Vec<GroupKey> {
        self.groups
            .values()
            .rev()
            .filter(|(_, items)| items.iter().any(|item| item.bounds.contains(point)))
            .map(|(key, _)| *key)
            .collect()
    }
}

fn element(item: &PlacedItem) -> String {
    let stroke = color(item.z);
    match &item.drawable {
        Drawable::Line {
            from,
            to,
            width,
            dashed,
        } => {
            let dash = if *dashed { r#" stroke-dasharray="3,2""# } else { "" };
            format!(
                r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="{:.1}"{}/>"#,
                from.x, from.y, to.x, to.y, stroke, width, dash
            )
        }
        Drawable::Rect { rect, style } => {
            let (fill, outline) = match style {
                RectStyle::Filled => (stroke, "none"),
                RectStyle::Outline => ("none", stroke),
                RectStyle::Knockout => (BACKGROUND, "none"),
            };
            format!(
                r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" stroke="{}"/>"#,
                rect.min_x(),
                rect.min_y(),
                rect.width(),
                rect.height(),
                fill,
                outline
            )
        }
        Drawable::Glyph { glyph, at } => format!(
            r#"<text x="{:.1}" y="{:.1}" font-family="Bravura" font-size="{:.1}" fill="{}" text-anchor="middle" dominant-baseline="central">&#x{:04X};</text>"#,
            at.x,
            at.y,
            item.bounds.height(),
            stroke,
            glyph.codepoint() as u32
        ),
        Drawable::Text {
            text,
            at,
            size,
            anchor,
        } => {
            let anchor = match anchor {
                TextAnchor::Start => "start",
                TextAnchor::Middle => "middle",
                TextAnchor::End => "end",
            };
            format!(
                r#"<text x="{:.1}" y="{:.1}" font-size="{:.1}" fill="{}" text-anchor="{}" dominant-baseline="central">{}</text>"#,
                at.x,
                at.y,
                size,
                stroke,
                anchor,
                escape(text)
            )
        }
        Drawable::Polyline { points, width } => {
            let points: Vec<String> = points
                .iter()
                .map(|p| format!("{:.1},{:.1}", p.x, p.y))
                .collect();
            format!(
                r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="{:.1}"/>"#,
                points.join(" "),
                stroke,
                width
            )
        }
        Drawable::Curve {
            from,
            control,
            to,
            width,
        } => format!(
            r#"<path d="M{:.1},{:.1} Q{:.1},{:.1} {:.1},{:.1}" fill="none" stroke="{}" stroke-width="{:.1}"/>"#,
            from.x, from.y, control.x, control.y, to.x, to.y, stroke, width
        ),
    }
}
