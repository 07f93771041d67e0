//! Layout of one system: the shared position grid, its staves and the
//! system symbol area above the first staff.

use log::debug;
use serde::Serialize;

use super::band_packer::{place_bands, BandPacker, BandSide};
use super::constants::*;
use super::grid::{GridInput, PositionGrid};
use super::staff::{
    key_signature_width, plan_staff, time_signature_width, StaffLayout, StaffPlan, StaffRenderer,
};
use super::symbols::SymbolCollector;
use super::LayoutContext;
use crate::geometry::{Point, Rect};
use crate::items::PlacedItem;
use crate::model::{Barline, BarlineStyle, StaffKind, System};

/// Resolved x of one barline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarlinePlacement {
    pub position: u32,
    pub x: f64,
    pub style: BarlineStyle,
}

/// A laid out system. Items are in system-local coordinates; `left` and
/// `top` place the system on the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemLayout {
    pub index: usize,
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    /// Bracket, divider and system symbols
    pub items: Vec<PlacedItem>,
    pub symbol_bands: usize,
    pub staves: Vec<StaffLayout>,
    pub barlines: Vec<BarlinePlacement>,
    pub grid: PositionGrid,
}

impl SystemLayout {
    /// Page rectangle covered by the system.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.left, self.top, self.width, self.height)
    }

    pub fn to_page(&self, point: Point) -> Point {
        point.offset(self.left, self.top)
    }
}

pub(crate) struct SystemRenderer<'a> {
    ctx: &'a LayoutContext<'a>,
}

impl<'a> SystemRenderer<'a> {
    pub(crate) fn new(ctx: &'a LayoutContext<'a>) -> Self {
        Self { ctx }
    }

    pub(crate) fn render(&self, index: usize, system: &System) -> SystemLayout {
        let ctx = self.ctx;
        let plans: Vec<StaffPlan> = system
            .staves
            .iter()
            .map(|staff| plan_staff(ctx, system, staff))
            .collect();

        let clef_width = plans.iter().map(|p| p.data.clef_width).fold(0.0, f64::max);
        let clef_end = CLEF_PADDING + clef_width + CLEF_PADDING;
        let has_standard = plans.iter().any(|p| p.data.kind == StaffKind::Standard);
        let signature_width = |bar: &Barline| {
            if !has_standard {
                return 0.0;
            }
            bar.key_signature.map_or(0.0, |k| key_signature_width(ctx, k))
                + bar.time_signature.map_or(0.0, |t| time_signature_width(ctx, t))
        };

        let count = system.position_count();
        let input = GridInput {
            header: clef_end + system.barline_at(0).map_or(0.0, signature_width),
            extra: (0..count)
                .map(|i| plans.iter().map(|p| p.accidental_room(i)).fold(0.0, f64::max))
                .collect(),
            barline_extra: system
                .barlines
                .iter()
                .map(|b| if b.position > 0 { signature_width(b) } else { 0.0 })
                .collect(),
        };
        let grid = PositionGrid::compute(
            system,
            &input,
            ctx.position_spacing(system),
            ctx.min_position_spacing(),
        );

        // System symbols stack upwards from the top of the first staff.
        let band_height = ctx.band_height();
        let collector = SymbolCollector::new(
            ctx.metrics,
            &grid,
            band_height,
            ctx.text_size(),
            ctx.system_text_size(),
        );
        let symbols = collector.system_symbols(system);
        let packing = BandPacker::new(&ctx.config.symbol_priority).pack(&symbols);
        let symbol_height = packing.height(band_height);
        let mut items = place_bands(symbols, &packing, BandSide::Above, symbol_height, band_height);

        let mut y = symbol_height;
        if packing.band_count > 0 {
            let divider_y = y + DIVIDER_GAP / 2.0;
            items.push(PlacedItem::line(
                Point::new(0.0, divider_y),
                Point::new(grid.end_x, divider_y),
                DIVIDER_WIDTH,
                Z_STAFF,
            ));
            y += DIVIDER_GAP;
        }

        let renderer = StaffRenderer::new(ctx, system, &grid, clef_end);
        let staff_spacing = ctx.staff_spacing();
        let mut staves = Vec::with_capacity(plans.len());
        for (j, (staff, plan)) in system.staves.iter().zip(plans).enumerate() {
            if j > 0 {
                y += staff_spacing;
            }
            let layout = renderer.render(j, staff, plan, y);
            y += layout.height();
            staves.push(layout);
        }

        if let (Some(first), Some(last)) = (staves.first(), staves.last()) {
            let bottom_line = last.data.line_count.saturating_sub(1);
            items.push(PlacedItem::line(
                Point::new(0.0, first.line_y(0)),
                Point::new(0.0, last.line_y(bottom_line)),
                BRACKET_WIDTH,
                Z_BARLINE,
            ));
        }

        let barlines = system
            .barlines
            .iter()
            .zip(&grid.barlines)
            .map(|(bar, &x)| BarlinePlacement {
                position: bar.position,
                x,
                style: bar.style,
            })
            .collect();

        debug!(
            system = index, staves = staves.len(), positions = count,
            spacing = grid.spacing, width = grid.end_x, height = y,
            symbol_bands = packing.band_count;
            "Laid out system",
        );

        SystemLayout {
            index,
            top: 0.0,
            left: 0.0,
            width: grid.end_x,
            height: y,
            items,
            symbol_bands: packing.band_count,
            staves,
            barlines,
            grid,
        }
    }
}
