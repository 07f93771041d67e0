//! Layout of a single staff: lines, clef, barlines, notes and its bands.

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use super::accidentals::{AccidentalRequest, AccidentalStack, AccidentalStacker, AccidentalTracker};
use super::band_packer::{place_bands, BandPacker, BandSide};
use super::constants::*;
use super::grid::PositionGrid;
use super::multi_rest::{hidden_barlines, merge_rests, MultiRest};
use super::staff_geometry::StaffData;
use super::symbols::{multi_rest_extent, SymbolCollector};
use super::LayoutContext;
use crate::font::Glyph;
use crate::geometry::{Point, Rect};
use crate::items::{PlacedItem, RectStyle, TextAnchor};
use crate::model::{
    ArpeggioDirection, BarlineStyle, Clef, Duration, KeySignature, MeasureSpan, Note, Position,
    SlideIn, SlideOut, Staff, StaffKind, System, TimeSignature,
};

/// Staff steps of the key signature accidentals on a treble staff.
const SHARP_STEPS: [i32; 7] = [8, 5, 9, 6, 3, 7, 4];
const FLAT_STEPS: [i32; 7] = [4, 7, 3, 6, 2, 5, 1];

/// The laid out staff, in system-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaffLayout {
    pub index: usize,
    /// Top of the staff block within the system
    pub top: f64,
    pub data: StaffData,
    pub items: Vec<PlacedItem>,
    pub above_bands: usize,
    pub below_bands: usize,
    pub multi_rests: Vec<MultiRest>,
    /// Indices into `System::barlines` swallowed by a multi-measure rest
    pub hidden_barlines: Vec<usize>,
    /// Stacked accidentals by position index, relative to the notehead anchor
    pub accidentals: BTreeMap<u32, AccidentalStack>,
}

impl StaffLayout {
    /// y of `line` within the system.
    pub fn line_y(&self, line: usize) -> f64 {
        self.top + self.data.line_y(line)
    }

    pub fn height(&self) -> f64 {
        self.data.height()
    }
}

/// Per-staff work done before horizontal layout.
pub(crate) struct StaffPlan {
    pub(crate) data: StaffData,
    pub(crate) accidentals: BTreeMap<u32, AccidentalStack>,
    pub(crate) multi_rests: Vec<MultiRest>,
}

impl StaffPlan {
    /// Room needed left of the noteheads at `index`.
    pub(crate) fn accidental_room(&self, index: u32) -> f64 {
        self.accidentals
            .get(&index)
            .filter(|s| !s.is_empty())
            .map_or(0.0, |s| s.width + ACCIDENTAL_GAP)
    }
}

pub(crate) fn plan_staff(ctx: &LayoutContext<'_>, system: &System, staff: &Staff) -> StaffPlan {
    let data = StaffData::compute(
        staff.kind,
        staff.clef,
        staff.line_count as usize,
        ctx.metrics,
        ctx.line_spacing,
        ctx.tab_line_spacing(),
    );
    let accidentals = match staff.kind {
        StaffKind::Standard => plan_accidentals(ctx, system, staff, &data),
        StaffKind::Tablature => BTreeMap::new(),
    };
    StaffPlan {
        data,
        accidentals,
        multi_rests: merge_rests(system, staff),
    }
}

fn plan_accidentals(
    ctx: &LayoutContext<'_>,
    system: &System,
    staff: &Staff,
    data: &StaffData,
) -> BTreeMap<u32, AccidentalStack> {
    let stacker = AccidentalStacker::new(ctx.metrics, data.line_spacing / 2.0);
    let mut tracker = AccidentalTracker::default();
    let mut stacks = BTreeMap::new();
    for span in system.measures() {
        let key = span
            .opening_barline
            .and_then(|i| system.barlines.get(i))
            .and_then(|b| b.key_signature);
        tracker.reset(key);
        for position in staff.positions_in(&span) {
            let requests: Vec<AccidentalRequest> = position
                .notes
                .iter()
                .filter_map(|n| n.pitch)
                .filter_map(|pitch| {
                    tracker.require(pitch).map(|accidental| AccidentalRequest {
                        step: data.staff_step(pitch),
                        accidental,
                    })
                })
                .collect();
            if !requests.is_empty() {
                stacks.insert(position.index, stacker.stack(&requests));
            }
        }
    }
    stacks
}

pub(crate) fn key_signature_width(ctx: &LayoutContext<'_>, key: KeySignature) -> f64 {
    let count = key.fifths.unsigned_abs().min(7);
    if count == 0 {
        return 0.0;
    }
    let glyph = if key.fifths > 0 { Glyph::Sharp } else { Glyph::Flat };
    f64::from(count) * (ctx.metrics.glyph_size(glyph).width + KEY_SIG_GAP) + CLEF_PADDING
}

pub(crate) fn time_signature_width(ctx: &LayoutContext<'_>, time: TimeSignature) -> f64 {
    let digits = time.beats.to_string().len().max(time.beat_type.to_string().len());
    digits as f64 * ctx.metrics.glyph_size(Glyph::TimeSigDigit(0)).width + CLEF_PADDING
}

fn fret_label(note: &Note) -> String {
    if note.muted {
        "x".to_string()
    } else if note.ghost {
        format!("({})", note.fret)
    } else if note.natural_harmonic {
        format!("<{}>", note.fret)
    } else {
        note.fret.to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// StaffRenderer
// ═══════════════════════════════════════════════════════════════════════

pub(crate) struct StaffRenderer<'a> {
    ctx: &'a LayoutContext<'a>,
    system: &'a System,
    grid: &'a PositionGrid,
    measures: Vec<MeasureSpan>,
    /// Right edge of the clef area, where opening signatures start
    clef_end: f64,
}

impl<'a> StaffRenderer<'a> {
    pub(crate) fn new(
        ctx: &'a LayoutContext<'a>,
        system: &'a System,
        grid: &'a PositionGrid,
        clef_end: f64,
    ) -> Self {
        Self {
            ctx,
            system,
            grid,
            measures: system.measures(),
            clef_end,
        }
    }

    fn glyph(&self, glyph: Glyph, x: f64, y: f64, z: i32) -> PlacedItem {
        PlacedItem::glyph(glyph, Point::new(x, y), self.ctx.metrics, z)
    }

    fn glyph_width(&self, glyph: Glyph) -> f64 {
        self.ctx.metrics.glyph_size(glyph).width
    }

    /// Lay out `staff` with its block starting at `top`.
    pub(crate) fn render(&self, index: usize, staff: &Staff, plan: StaffPlan, top: f64) -> StaffLayout {
        let band_height = self.ctx.band_height();
        let collector = SymbolCollector::new(
            self.ctx.metrics,
            self.grid,
            band_height,
            self.ctx.text_size(),
            self.ctx.system_text_size(),
        );
        let hidden = hidden_barlines(self.system, &plan.multi_rests);
        let packer = BandPacker::new(&self.ctx.config.symbol_priority);
        let mut above = collector.above_staff(staff);
        above.extend(collector.bar_labels(self.system, &hidden, &plan.multi_rests));
        let below = collector.below_staff(staff);
        let above_packing = packer.pack(&above);
        let below_packing = packer.pack(&below);
        let data = plan
            .data
            .with_bands(above_packing.height(band_height), below_packing.height(band_height));

        let mut items = Vec::new();
        self.staff_lines(&data, &mut items);
        self.clef(&data, &mut items);
        if let Some(bar) = self.system.barline_at(0) {
            self.signatures(&data, self.clef_end, bar.key_signature, bar.time_signature, &mut items);
        }
        self.barlines(&data, &hidden, &mut items);
        self.multi_rests(&data, &plan.multi_rests, &mut items);

        let merged = |index: u32| plan.multi_rests.iter().any(|r| index >= r.start && index < r.end);
        for position in staff.positions.iter().filter(|p| !merged(p.index)) {
            if position.rest {
                self.rest(&data, position, &mut items);
                continue;
            }
            match staff.kind {
                StaffKind::Tablature => self.tab_notes(&data, position, &mut items),
                StaffKind::Standard => self.standard_notes(
                    &data,
                    position,
                    plan.accidentals.get(&position.index),
                    &mut items,
                ),
            }
            if let Some(direction) = position.arpeggio {
                let room = plan.accidental_room(position.index);
                self.arpeggio(&data, position, direction, room, &mut items);
            }
        }
        match staff.kind {
            StaffKind::Tablature => self.tab_connections(&data, staff, &mut items),
            StaffKind::Standard => self.standard_ties(&data, staff, &mut items),
        }

        items.extend(place_bands(
            above,
            &above_packing,
            BandSide::Above,
            data.above_band_start(),
            band_height,
        ));
        items.extend(place_bands(
            below,
            &below_packing,
            BandSide::Below,
            data.below_band_start(),
            band_height,
        ));
        for item in &mut items {
            item.translate(0.0, top);
        }

        debug!(
            staff = index, kind:? = staff.kind, top, height = data.height(),
            above_bands = above_packing.band_count, below_bands = below_packing.band_count,
            multi_rests = plan.multi_rests.len(), items = items.len();
            "Laid out staff",
        );

        StaffLayout {
            index,
            top,
            data,
            items,
            above_bands: above_packing.band_count,
            below_bands: below_packing.band_count,
            multi_rests: plan.multi_rests,
            hidden_barlines: hidden,
            accidentals: plan.accidentals,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Staff furniture
    // ═══════════════════════════════════════════════════════════════════

    fn staff_lines(&self, data: &StaffData, items: &mut Vec<PlacedItem>) {
        for line in 0..data.line_count {
            let y = data.line_y(line);
            items.push(PlacedItem::line(
                Point::new(0.0, y),
                Point::new(self.grid.end_x, y),
                STAFF_LINE_WIDTH,
                Z_STAFF,
            ));
        }
    }

    fn clef(&self, data: &StaffData, items: &mut Vec<PlacedItem>) {
        let glyph = match (data.kind, data.clef) {
            (StaffKind::Tablature, _) => Glyph::TabClef,
            (StaffKind::Standard, Clef::Treble) => Glyph::TrebleClef,
            (StaffKind::Standard, Clef::Bass) => Glyph::BassClef,
        };
        let x = CLEF_PADDING + data.clef_width / 2.0;
        items.push(self.glyph(glyph, x, data.middle_y(), Z_NOTE));
    }

    /// Key and time signature starting at `x`. Room is reserved on every
    /// staff so positions line up, but only standard staves draw them.
    fn signatures(
        &self,
        data: &StaffData,
        x: f64,
        key: Option<KeySignature>,
        time: Option<TimeSignature>,
        items: &mut Vec<PlacedItem>,
    ) {
        if data.kind != StaffKind::Standard {
            return;
        }
        let mut x = x;
        if let Some(key) = key {
            if key.fifths != 0 {
                let (glyph, steps) = if key.fifths > 0 {
                    (Glyph::Sharp, SHARP_STEPS)
                } else {
                    (Glyph::Flat, FLAT_STEPS)
                };
                let shift = if data.clef == Clef::Bass { 2 } else { 0 };
                let w = self.glyph_width(glyph);
                let count = key.fifths.unsigned_abs().min(7) as usize;
                for (i, step) in steps.iter().take(count).enumerate() {
                    let gx = x + i as f64 * (w + KEY_SIG_GAP) + w / 2.0;
                    items.push(self.glyph(glyph, gx, data.step_y(step - shift), Z_NOTE));
                }
            }
            x += key_signature_width(self.ctx, key);
        }

        if let Some(time) = time {
            let digit_width = self.glyph_width(Glyph::TimeSigDigit(0));
            let top = data.top_line_y();
            let h = data.staff_height();
            let width = time_signature_width(self.ctx, time) - CLEF_PADDING;
            for (number, y) in [(time.beats, top + h / 4.0), (time.beat_type, top + h * 0.75)] {
                let text = number.to_string();
                let start = x + (width - text.len() as f64 * digit_width) / 2.0;
                for (k, digit) in text.bytes().enumerate() {
                    let gx = start + (k as f64 + 0.5) * digit_width;
                    items.push(self.glyph(Glyph::TimeSigDigit(digit - b'0'), gx, y, Z_NOTE));
                }
            }
        }
    }

    fn barlines(&self, data: &StaffData, hidden: &[usize], items: &mut Vec<PlacedItem>) {
        for (i, bar) in self.system.barlines.iter().enumerate() {
            if hidden.contains(&i) {
                continue;
            }
            let x = self.grid.barlines.get(i).copied().unwrap_or(0.0);
            self.barline(bar.style, x, data, items);
            if bar.position > 0 && bar.has_signature_change() {
                self.signatures(
                    data,
                    x + BARLINE_GAP / 2.0,
                    bar.key_signature,
                    bar.time_signature,
                    items,
                );
            }
        }
        self.barline(self.system.end_bar, self.grid.end_x, data, items);
    }

    fn barline(&self, style: BarlineStyle, x: f64, data: &StaffData, items: &mut Vec<PlacedItem>) {
        let (top, bottom) = (data.top_line_y(), data.bottom_line_y());
        let vertical = |x: f64, width: f64| {
            PlacedItem::line(Point::new(x, top), Point::new(x, bottom), width, Z_BARLINE)
        };
        let dots = |x: f64, items: &mut Vec<PlacedItem>| {
            let mid = data.middle_y();
            for y in [mid - data.line_spacing / 2.0, mid + data.line_spacing / 2.0] {
                items.push(self.glyph(Glyph::RepeatDot, x, y, Z_BARLINE));
            }
        };
        let inner = DOUBLE_BARLINE_GAP + THICK_BARLINE_WIDTH / 2.0;
        match style {
            BarlineStyle::Single => items.push(vertical(x, BARLINE_WIDTH)),
            BarlineStyle::Double => {
                items.push(vertical(x - DOUBLE_BARLINE_GAP / 2.0, BARLINE_WIDTH));
                items.push(vertical(x + DOUBLE_BARLINE_GAP / 2.0, BARLINE_WIDTH));
            }
            BarlineStyle::Final => {
                items.push(vertical(x - inner, BARLINE_WIDTH));
                items.push(vertical(x, THICK_BARLINE_WIDTH));
            }
            BarlineStyle::FreeTime => items.push(PlacedItem::dashed_line(
                Point::new(x, top),
                Point::new(x, bottom),
                BARLINE_WIDTH,
                Z_BARLINE,
            )),
            BarlineStyle::RepeatStart => {
                items.push(vertical(x, THICK_BARLINE_WIDTH));
                items.push(vertical(x + inner, BARLINE_WIDTH));
                dots(x + inner + REPEAT_DOT_GAP, items);
            }
            BarlineStyle::RepeatEnd => {
                items.push(vertical(x, THICK_BARLINE_WIDTH));
                items.push(vertical(x - inner, BARLINE_WIDTH));
                dots(x - inner - REPEAT_DOT_GAP, items);
            }
        }
    }

    fn multi_rests(&self, data: &StaffData, rests: &[MultiRest], items: &mut Vec<PlacedItem>) {
        let ls = data.line_spacing;
        let y = data.middle_y();
        for rest in rests {
            let (left, right) = multi_rest_extent(self.grid, rest);
            let thickness = MULTI_REST_THICKNESS * ls;
            items.push(PlacedItem::rect(
                Rect::new(left, y - thickness / 2.0, right - left, thickness),
                RectStyle::Filled,
                Z_NOTE,
            ));
            for x in [left, right] {
                items.push(PlacedItem::line(
                    Point::new(x, y - ls),
                    Point::new(x, y + ls),
                    BARLINE_WIDTH,
                    Z_NOTE,
                ));
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Positions
    // ═══════════════════════════════════════════════════════════════════

    fn rest(&self, data: &StaffData, position: &Position, items: &mut Vec<PlacedItem>) {
        let standard = data.kind == StaffKind::Standard;
        if position.measure_rest {
            if let Some(span) = self.measures.iter().find(|m| m.contains(position.index)) {
                let glyph = Glyph::Rest(Duration::Whole);
                let (start, end) = self.grid.span(span.start, span.end);
                let y = if standard {
                    data.line_y(1) + self.ctx.metrics.glyph_size(glyph).height / 2.0
                } else {
                    data.middle_y()
                };
                items.push(self.glyph(glyph, (start + end) / 2.0, y, Z_NOTE));
                return;
            }
        }

        let glyph = Glyph::Rest(position.duration);
        let h = self.ctx.metrics.glyph_size(glyph).height;
        let y = match (standard, position.duration) {
            (true, Duration::Whole) => data.line_y(1) + h / 2.0,
            (true, Duration::Half) => data.line_y(2) - h / 2.0,
            _ => data.middle_y(),
        };
        let x = self.grid.x(position.index);
        items.push(self.glyph(glyph, x, y, Z_NOTE));
        if position.dotted {
            let dot = Glyph::AugmentationDot;
            let dx = self.glyph_width(glyph) / 2.0 + DOT_GAP + self.glyph_width(dot) / 2.0;
            items.push(self.glyph(dot, x + dx, y - data.line_spacing / 2.0, Z_NOTE));
        }
    }

    fn tab_notes(&self, data: &StaffData, position: &Position, items: &mut Vec<PlacedItem>) {
        let x = self.grid.x(position.index);
        for note in &position.notes {
            let text = PlacedItem::text(
                fret_label(note),
                Point::new(x, data.string_y(note.string)),
                self.ctx.text_size(),
                TextAnchor::Middle,
                self.ctx.metrics,
                Z_NOTE,
            );
            items.push(PlacedItem::rect(text.bounds.inflate(1.0), RectStyle::Knockout, Z_KNOCKOUT));
            items.push(text);
        }

        // Trilled-with fret, in parentheses after the first note.
        if let (Some(fret), Some(note)) = (position.trill, position.notes.first()) {
            let size = self.ctx.text_size();
            let half = self.ctx.metrics.text_width(&fret_label(note), size) / 2.0;
            let text = PlacedItem::text(
                format!("({fret})"),
                Point::new(x + half + LABEL_GAP, data.string_y(note.string)),
                size * 0.8,
                TextAnchor::Start,
                self.ctx.metrics,
                Z_NOTE,
            );
            items.push(PlacedItem::rect(text.bounds.inflate(1.0), RectStyle::Knockout, Z_KNOCKOUT));
            items.push(text);
        }
    }

    fn standard_notes(
        &self,
        data: &StaffData,
        position: &Position,
        accidentals: Option<&AccidentalStack>,
        items: &mut Vec<PlacedItem>,
    ) {
        let mut steps: Vec<(i32, &Note)> = position
            .notes
            .iter()
            .filter_map(|n| n.pitch.map(|p| (data.staff_step(p), n)))
            .collect();
        let (Some(&(low, _)), Some(&(high, _))) = (
            steps.iter().min_by_key(|(s, _)| *s),
            steps.iter().max_by_key(|(s, _)| *s),
        ) else {
            return;
        };
        steps.sort_by_key(|(s, _)| *s);

        let x = self.grid.x(position.index);
        let ls = data.line_spacing;
        let head_width = self.glyph_width(Glyph::NoteheadBlack);

        // The upper note of a second moves to the other side of the stem.
        let mut previous: Option<(i32, bool)> = None;
        for &(step, note) in &steps {
            let shifted = matches!(previous, Some((p, false)) if step - p == 1);
            let hx = if shifted { x + head_width } else { x };
            let y = data.step_y(step);
            let head = if note.muted {
                Glyph::NoteheadX
            } else {
                match position.duration {
                    Duration::Whole => Glyph::NoteheadWhole,
                    Duration::Half => Glyph::NoteheadHalf,
                    _ => Glyph::NoteheadBlack,
                }
            };
            items.push(self.glyph(head, hx, y, Z_NOTE));
            if position.dotted {
                let dot = Glyph::AugmentationDot;
                let dx = self.glyph_width(head) / 2.0 + DOT_GAP + self.glyph_width(dot) / 2.0;
                let dy = if step % 2 == 0 { -ls / 2.0 } else { 0.0 };
                items.push(self.glyph(dot, hx + dx, y + dy, Z_NOTE));
            }
            previous = Some((step, shifted));
        }

        let extend = LEDGER_LINE_EXTEND * ls;
        let ledger_steps = (low..=-2).chain(10..=high).filter(|s| s % 2 == 0);
        for step in ledger_steps {
            let y = data.step_y(step);
            items.push(PlacedItem::line(
                Point::new(x - head_width / 2.0 - extend, y),
                Point::new(x + head_width / 2.0 + extend, y),
                STAFF_LINE_WIDTH,
                Z_STAFF,
            ));
        }

        if position.duration != Duration::Whole {
            let mean = steps.iter().map(|(s, _)| *s).sum::<i32>() as f64 / steps.len() as f64;
            let up = mean < 4.0;
            let length = STEM_LENGTH * ls;
            let (sx, from, to) = if up {
                (x + head_width / 2.0 - STEM_WIDTH / 2.0, data.step_y(low), data.step_y(high) - length)
            } else {
                (x - head_width / 2.0 + STEM_WIDTH / 2.0, data.step_y(high), data.step_y(low) + length)
            };
            items.push(PlacedItem::line(Point::new(sx, from), Point::new(sx, to), STEM_WIDTH, Z_NOTE));
            if position.duration.flag_count() > 0 {
                let flag = Glyph::Flag(position.duration);
                let size = self.ctx.metrics.glyph_size(flag);
                let fy = if up { to + size.height / 2.0 } else { to - size.height / 2.0 };
                items.push(self.glyph(flag, sx + size.width / 2.0, fy, Z_NOTE));
            }
        }

        if let Some(stack) = accidentals {
            let anchor_x = x - head_width / 2.0 - ACCIDENTAL_GAP;
            let anchor_y = data.bottom_line_y();
            for placed in &stack.placed {
                let center = placed.rect.center().offset(anchor_x, anchor_y);
                items.push(self.glyph(placed.accidental.glyph(), center.x, center.y, Z_NOTE));
            }
        }
    }

    fn arpeggio(
        &self,
        data: &StaffData,
        position: &Position,
        direction: ArpeggioDirection,
        accidental_room: f64,
        items: &mut Vec<PlacedItem>,
    ) {
        let ys: Vec<f64> = match data.kind {
            StaffKind::Tablature => position.notes.iter().map(|n| data.string_y(n.string)).collect(),
            StaffKind::Standard => position
                .notes
                .iter()
                .filter_map(|n| n.pitch)
                .map(|p| data.step_y(data.staff_step(p)))
                .collect(),
        };
        let (Some(min), Some(max)) = (
            ys.iter().copied().reduce(f64::min),
            ys.iter().copied().reduce(f64::max),
        ) else {
            return;
        };

        let ls = data.line_spacing;
        let (top, bottom) = (min - ls / 2.0, max + ls / 2.0);
        let note_half = self.glyph_width(Glyph::NoteheadBlack) / 2.0;
        let ax = self.grid.x(position.index) - note_half - accidental_room - ARPEGGIO_GAP;
        let amplitude = ls / 4.0;
        let segments = ((bottom - top) / (ls / 2.0)).ceil().max(1.0) as usize;
        let step = (bottom - top) / segments as f64;
        let points = (0..=segments)
            .map(|i| {
                let dx = if i % 2 == 0 { -amplitude } else { amplitude };
                Point::new(ax + dx, top + i as f64 * step)
            })
            .collect();
        items.push(PlacedItem::polyline(points, SYMBOL_LINE_WIDTH, Z_NOTE));

        let (arrow, ay) = match direction {
            ArpeggioDirection::Up => (Glyph::ArpeggioArrowUp, top),
            ArpeggioDirection::Down => (Glyph::ArpeggioArrowDown, bottom),
        };
        items.push(self.glyph(arrow, ax, ay, Z_NOTE));
    }

    // ═══════════════════════════════════════════════════════════════════
    // Connections between positions
    // ═══════════════════════════════════════════════════════════════════

    fn arc(&self, x1: f64, x2: f64, y: f64, above: bool) -> PlacedItem {
        let dir = if above { -1.0 } else { 1.0 };
        PlacedItem::curve(
            Point::new(x1, y),
            Point::new((x1 + x2) / 2.0, y + dir * 2.0 * ARC_HEIGHT),
            Point::new(x2, y),
            ARC_WIDTH,
            Z_NOTE,
        )
    }

    fn slide(&self, from: Point, to: Point) -> PlacedItem {
        PlacedItem::line(from, to, SLIDE_WIDTH, Z_NOTE)
    }

    /// Ties, legato arcs and slides on a tablature staff.
    fn tab_connections(&self, data: &StaffData, staff: &Staff, items: &mut Vec<PlacedItem>) {
        let positions = &staff.positions;
        let gap = self.ctx.text_size() * TEXT_WIDTH_RATIO;
        let rise = data.line_spacing / 4.0;

        for (k, position) in positions.iter().enumerate() {
            let x = self.grid.x(position.index);
            for note in &position.notes {
                let y = data.string_y(note.string);
                let arc_y = y - data.line_spacing / 2.0;
                let next = positions[k + 1..]
                    .iter()
                    .find_map(|p| p.note_on_string(note.string).map(|n| (p, n)));

                if note.tied {
                    let previous = k
                        .checked_sub(1)
                        .map(|j| &positions[j])
                        .filter(|p| p.has_note_on_string(note.string));
                    if let Some(previous) = previous {
                        items.push(self.arc(self.grid.x(previous.index), x, arc_y, true));
                    }
                }

                if note.is_legato() {
                    if let Some((next_position, _)) = next {
                        items.push(self.arc(x, self.grid.x(next_position.index), arc_y, true));
                    }
                }

                match note.slide_out {
                    Some(SlideOut::Shift) | Some(SlideOut::Legato) => match next {
                        Some((next_position, next_note)) => {
                            let next_x = self.grid.x(next_position.index);
                            let dir = if next_note.fret >= note.fret { 1.0 } else { -1.0 };
                            items.push(self.slide(
                                Point::new(x + gap, y + dir * rise),
                                Point::new(next_x - gap, y - dir * rise),
                            ));
                            if note.slide_out == Some(SlideOut::Legato) {
                                items.push(self.arc(x, next_x, arc_y, true));
                            }
                        }
                        None => items.push(self.slide(
                            Point::new(x + gap, y + rise),
                            Point::new(x + gap + SLIDE_LENGTH, y - rise),
                        )),
                    },
                    Some(SlideOut::OutUpwards) => items.push(self.slide(
                        Point::new(x + gap, y + rise),
                        Point::new(x + gap + SLIDE_LENGTH, y - rise),
                    )),
                    Some(SlideOut::OutDownwards) => items.push(self.slide(
                        Point::new(x + gap, y - rise),
                        Point::new(x + gap + SLIDE_LENGTH, y + rise),
                    )),
                    None => {}
                }

                match note.slide_in {
                    Some(SlideIn::FromBelow) => items.push(self.slide(
                        Point::new(x - gap - SLIDE_LENGTH, y + rise),
                        Point::new(x - gap, y - rise),
                    )),
                    Some(SlideIn::FromAbove) => items.push(self.slide(
                        Point::new(x - gap - SLIDE_LENGTH, y - rise),
                        Point::new(x - gap, y + rise),
                    )),
                    None => {}
                }
            }
        }
    }

    /// Ties between equal pitches of neighbouring positions on a standard staff.
    fn standard_ties(&self, data: &StaffData, staff: &Staff, items: &mut Vec<PlacedItem>) {
        let half = self.glyph_width(Glyph::NoteheadBlack) / 2.0;
        for pair in staff.positions.windows(2) {
            let (previous, position) = (&pair[0], &pair[1]);
            for note in position.notes.iter().filter(|n| n.tied) {
                let Some(pitch) = note.pitch else { continue };
                if previous.notes.iter().any(|n| n.pitch == Some(pitch)) {
                    let y = data.step_y(data.staff_step(pitch)) + data.line_spacing * 0.7;
                    items.push(self.arc(
                        self.grid.x(previous.index) + half,
                        self.grid.x(position.index) - half,
                        y,
                        false,
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fret_labels() {
        let mut note = Note::new(0, 7);
        assert_eq!(fret_label(&note), "7");
        note.ghost = true;
        assert_eq!(fret_label(&note), "(7)");
        note.ghost = false;
        note.natural_harmonic = true;
        assert_eq!(fret_label(&note), "<7>");
        note.muted = true;
        assert_eq!(fret_label(&note), "x");
    }
}
