//! Collecting annotation symbols for band packing.
//!
//! Position flags (let ring, vibrato, ...) become runs of connected glyphs
//! above a staff, as do repeat play counts and multi-measure rest counts.
//! Dynamics go below it. Tablature staves also carry picking, tapping,
//! harmonic and legato marks below, while standard staves show picking and
//! harmonics above. The system-level annotations (tempo, endings,
//! directions, chord names, rehearsal signs) go above the first staff.
//! Every symbol is built in band-local coordinates.

use super::band_packer::{SymbolCategory, SymbolInfo};
use super::connected::{ConnectedGlyphBuilder, ConnectedKind};
use super::constants::*;
use super::grid::PositionGrid;
use super::multi_rest::MultiRest;
use crate::font::{Glyph, GlyphMetrics};
use crate::geometry::Point;
use crate::items::{PlacedItem, RectStyle, TextAnchor};
use crate::model::{
    ArtificialHarmonic, BarlineStyle, DirectionSymbol, PickStroke, Position, SlideOut, Staff,
    StaffKind, System, TremoloBar,
};

/// Builds the band symbols of one system.
pub struct SymbolCollector<'a> {
    metrics: &'a dyn GlyphMetrics,
    grid: &'a PositionGrid,
    band_height: f64,
    text_size: f64,
    system_text_size: f64,
}

impl<'a> SymbolCollector<'a> {
    pub fn new(
        metrics: &'a dyn GlyphMetrics,
        grid: &'a PositionGrid,
        band_height: f64,
        text_size: f64,
        system_text_size: f64,
    ) -> Self {
        Self {
            metrics,
            grid,
            band_height,
            text_size,
            system_text_size,
        }
    }

    fn mid(&self) -> f64 {
        self.band_height / 2.0
    }

    fn connected(&self, kind: ConnectedKind, first: u32, last: u32) -> SymbolInfo {
        let builder = ConnectedGlyphBuilder::new(self.metrics, self.band_height, self.text_size);
        let start = self.grid.left(first);
        let end = self.grid.right(last);
        let glyph = builder.build(kind, start, self.mid(), end - start);
        SymbolInfo::from_items(SymbolCategory::StaffSymbol, glyph.items)
    }

    fn text(&self, text: impl Into<String>, x: f64, anchor: TextAnchor, size: f64) -> PlacedItem {
        PlacedItem::text(text, Point::new(x, self.mid()), size, anchor, self.metrics, Z_SYMBOL)
    }

    fn glyph(&self, glyph: Glyph, x: f64) -> PlacedItem {
        PlacedItem::glyph(glyph, Point::new(x, self.mid()), self.metrics, Z_SYMBOL)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Staff symbols
    // ═══════════════════════════════════════════════════════════════════

    /// Technique symbols drawn above `staff`.
    pub fn above_staff(&self, staff: &Staff) -> Vec<SymbolInfo> {
        let mut symbols = Vec::new();
        let flagged: [(fn(&Position) -> bool, ConnectedKind); 5] = [
            (|p| p.let_ring, ConnectedKind::LetRing),
            (|p| p.palm_muting, ConnectedKind::PalmMute),
            (|p| p.vibrato, ConnectedKind::Vibrato),
            (|p| p.wide_vibrato, ConnectedKind::WideVibrato),
            (|p| p.trill.is_some(), ConnectedKind::Trill),
        ];
        for (flag, kind) in flagged {
            for (first, last) in runs(&staff.positions, flag) {
                symbols.push(self.connected(kind, first, last));
            }
        }

        for position in &staff.positions {
            let x = self.grid.x(position.index);
            if position.tremolo_picking {
                symbols.push(SymbolInfo::from_items(
                    SymbolCategory::StaffSymbol,
                    vec![self.glyph(Glyph::TremoloPicking, x)],
                ));
            }
            if let Some(bar) = &position.tremolo_bar {
                symbols.push(self.tremolo_bar(position.index, bar));
            }
            if let Some(swell) = &position.volume_swell {
                let kind = if swell.is_increasing() {
                    ConnectedKind::SwellIncreasing
                } else {
                    ConnectedKind::SwellDecreasing
                };
                let last = position.index + u32::from(swell.duration.max(1)) - 1;
                symbols.push(self.connected(kind, position.index, last));
            }
        }
        if staff.kind == StaffKind::Standard {
            symbols.extend(self.picking_symbols(staff));
        }
        symbols
    }

    /// Pick strokes, taps and harmonic labels.
    fn picking_symbols(&self, staff: &Staff) -> Vec<SymbolInfo> {
        let mut symbols = Vec::new();
        for stroke in [PickStroke::Up, PickStroke::Down] {
            let kind = match stroke {
                PickStroke::Up => ConnectedKind::PickStrokeUp,
                PickStroke::Down => ConnectedKind::PickStrokeDown,
            };
            for (first, last) in runs(&staff.positions, |p| p.pick_stroke == Some(stroke)) {
                symbols.push(self.connected(kind, first, last));
            }
        }

        for position in &staff.positions {
            let x = self.grid.x(position.index);
            if position.tap {
                symbols.push(SymbolInfo::from_items(
                    SymbolCategory::StaffSymbol,
                    vec![self.text("T", x, TextAnchor::Middle, self.text_size)],
                ));
            }
            if position.notes.iter().any(|n| n.natural_harmonic) {
                symbols.push(SymbolInfo::from_items(
                    SymbolCategory::StaffSymbol,
                    vec![self.text("N.H.", x, TextAnchor::Middle, self.text_size)],
                ));
            }
            if let Some(harmonic) = position.notes.iter().find_map(|n| n.artificial_harmonic) {
                symbols.push(SymbolInfo::from_items(
                    SymbolCategory::StaffSymbol,
                    vec![self.text(
                        artificial_harmonic_label(&harmonic),
                        x,
                        TextAnchor::Middle,
                        self.text_size,
                    )],
                ));
            }
        }
        symbols
    }

    fn tremolo_bar(&self, index: u32, bar: &TremoloBar) -> SymbolInfo {
        let last = index + u32::from(bar.duration.max(1)) - 1;
        let builder = ConnectedGlyphBuilder::new(self.metrics, self.band_height, self.text_size);
        let start = self.grid.left(index);
        let end = self.grid.right(last);
        let mut items = builder
            .build(ConnectedKind::TremoloBar, start, self.mid(), end - start)
            .items;
        items.push(self.text(
            bend_label(bar.pitch),
            end + LABEL_GAP,
            TextAnchor::Start,
            self.text_size,
        ));
        SymbolInfo::from_items(SymbolCategory::StaffSymbol, items)
    }

    /// Symbols drawn below `staff`: dynamics, plus the picking and legato
    /// marks of a tablature staff.
    pub fn below_staff(&self, staff: &Staff) -> Vec<SymbolInfo> {
        let mut symbols: Vec<SymbolInfo> = staff
            .dynamics
            .iter()
            .map(|d| {
                let x = self.grid.x(d.position);
                SymbolInfo::from_items(
                    SymbolCategory::Dynamic,
                    vec![self.text(d.volume.label(), x, TextAnchor::Middle, self.text_size)],
                )
            })
            .collect();
        if staff.kind == StaffKind::Tablature {
            symbols.extend(self.picking_symbols(staff));
            symbols.extend(self.legato_labels(staff));
        }
        symbols
    }

    /// "H", "P" and "sl." centred between a note and the next note on its
    /// string.
    fn legato_labels(&self, staff: &Staff) -> Vec<SymbolInfo> {
        let positions = &staff.positions;
        let mut placed: Vec<(&str, u32, u32)> = Vec::new();
        for (k, position) in positions.iter().enumerate() {
            for note in &position.notes {
                let label = if note.hammer_on {
                    "H"
                } else if note.pull_off {
                    "P"
                } else if matches!(note.slide_out, Some(SlideOut::Shift | SlideOut::Legato)) {
                    "sl."
                } else {
                    continue;
                };
                let next = positions[k + 1..]
                    .iter()
                    .find(|p| p.has_note_on_string(note.string));
                if let Some(next) = next {
                    let key = (label, position.index, next.index);
                    if !placed.contains(&key) {
                        placed.push(key);
                    }
                }
            }
        }
        placed
            .into_iter()
            .map(|(label, from, to)| {
                let x = (self.grid.x(from) + self.grid.x(to)) / 2.0;
                SymbolInfo::from_items(
                    SymbolCategory::StaffSymbol,
                    vec![self.text(label, x, TextAnchor::Middle, self.text_size)],
                )
            })
            .collect()
    }

    /// Repeat play counts and multi-measure rest counts, over the barlines
    /// and rests a staff draws.
    pub fn bar_labels(&self, system: &System, hidden: &[usize], rests: &[MultiRest]) -> Vec<SymbolInfo> {
        let mut symbols = Vec::new();
        for (i, bar) in system.barlines.iter().enumerate() {
            if hidden.contains(&i) || bar.style != BarlineStyle::RepeatEnd || bar.repeat_count <= 2 {
                continue;
            }
            let x = self.grid.barlines.get(i).copied().unwrap_or(0.0);
            let label = format!("x{}", bar.repeat_count);
            symbols.push(SymbolInfo::from_items(
                SymbolCategory::StaffSymbol,
                vec![self.text(label, x, TextAnchor::End, self.text_size)],
            ));
        }
        for rest in rests {
            let (left, right) = multi_rest_extent(self.grid, rest);
            symbols.push(SymbolInfo::from_items(
                SymbolCategory::StaffSymbol,
                vec![self.text(
                    rest.count.to_string(),
                    (left + right) / 2.0,
                    TextAnchor::Middle,
                    self.system_text_size,
                )],
            ));
        }
        symbols
    }

    // ═══════════════════════════════════════════════════════════════════
    // System symbols
    // ═══════════════════════════════════════════════════════════════════

    /// Symbols shared by every staff of `system`.
    pub fn system_symbols(&self, system: &System) -> Vec<SymbolInfo> {
        let mut symbols = Vec::new();
        let size = self.system_text_size;

        for (i, bar) in system.barlines.iter().enumerate() {
            if let Some(sign) = &bar.rehearsal_sign {
                let x = self.grid.barlines.get(i).copied().unwrap_or(0.0);
                symbols.push(self.rehearsal_sign(x, sign.letter, &sign.description));
            }
        }

        for marker in &system.tempo_markers {
            let mut x = self.grid.left(marker.position);
            let mut items = Vec::new();
            if !marker.description.is_empty() {
                let text = self.text(marker.description.as_str(), x, TextAnchor::Start, size);
                x = text.bounds.max_x() + LABEL_GAP;
                items.push(text);
            }
            let note = Glyph::MetronomeNote(marker.beat);
            let note_width = self.metrics.glyph_size(note).width;
            items.push(self.glyph(note, x + note_width / 2.0));
            items.push(self.text(
                format!(" = {}", marker.beats_per_minute),
                x + note_width,
                TextAnchor::Start,
                size,
            ));
            symbols.push(SymbolInfo::from_items(SymbolCategory::TempoMarker, items));
        }

        for ending in &system.alternate_endings {
            symbols.push(self.alternate_ending(system, ending.position, &ending.label()));
        }

        for direction in &system.directions {
            let x = self.grid.x(direction.position);
            for &symbol in &direction.symbols {
                let items = match symbol {
                    DirectionSymbol::Segno => vec![self.glyph(Glyph::Segno, x)],
                    DirectionSymbol::Coda => vec![self.glyph(Glyph::Coda, x)],
                    DirectionSymbol::SegnoSegno | DirectionSymbol::DoubleCoda => {
                        let glyph = if symbol == DirectionSymbol::SegnoSegno {
                            Glyph::Segno
                        } else {
                            Glyph::Coda
                        };
                        let half = self.metrics.glyph_size(glyph).width / 2.0;
                        vec![self.glyph(glyph, x - half), self.glyph(glyph, x + half)]
                    }
                    _ => vec![self.text(symbol.label(), x, TextAnchor::Middle, size)],
                };
                symbols.push(SymbolInfo::from_items(SymbolCategory::Direction, items));
            }
        }

        for chord in &system.chord_text {
            let x = self.grid.x(chord.position);
            symbols.push(SymbolInfo::from_items(
                SymbolCategory::ChordText,
                vec![self.text(chord.name.as_str(), x, TextAnchor::Middle, size)],
            ));
        }
        symbols
    }

    fn rehearsal_sign(&self, x: f64, letter: char, description: &str) -> SymbolInfo {
        let size = self.system_text_size;
        let letter_item = self.text(letter.to_string(), x, TextAnchor::Start, size);
        let frame = letter_item.bounds.inflate(REHEARSAL_BOX_PADDING);
        let mut items = vec![PlacedItem::rect(frame, RectStyle::Outline, Z_SYMBOL), letter_item];
        if !description.is_empty() {
            items.push(self.text(description, frame.max_x() + LABEL_GAP, TextAnchor::Start, size));
        }
        SymbolInfo::from_items(SymbolCategory::RehearsalSign, items)
    }

    fn alternate_ending(&self, system: &System, position: u32, label: &str) -> SymbolInfo {
        let start = system
            .barlines
            .iter()
            .position(|b| b.position == position)
            .and_then(|i| self.grid.barlines.get(i).copied())
            .unwrap_or_else(|| self.grid.left(position));
        // An ending runs to the next barline, or to the end of the system.
        let end = system
            .barlines
            .iter()
            .enumerate()
            .filter(|(_, b)| b.position > position)
            .min_by_key(|(_, b)| b.position)
            .and_then(|(i, _)| self.grid.barlines.get(i).copied())
            .unwrap_or(self.grid.end_x);

        let top = LABEL_GAP;
        let bottom = self.band_height;
        let text = self.text(label, start + LABEL_GAP, TextAnchor::Start, self.text_size);
        let end = end.max(text.bounds.max_x());
        let items = vec![
            PlacedItem::line(Point::new(start, bottom), Point::new(start, top), SYMBOL_LINE_WIDTH, Z_SYMBOL),
            PlacedItem::line(Point::new(start, top), Point::new(end, top), SYMBOL_LINE_WIDTH, Z_SYMBOL),
            text,
        ];
        let mut info = SymbolInfo::from_items(SymbolCategory::AlternateEnding, items);
        info.start = start;
        info.end = end;
        info
    }
}

/// Horizontal extent of the bar drawn for `rest`.
pub(crate) fn multi_rest_extent(grid: &PositionGrid, rest: &MultiRest) -> (f64, f64) {
    let (start, end) = grid.span(rest.start, rest.end);
    let left = start + MULTI_REST_INSET;
    (left, (end - MULTI_REST_INSET).max(left))
}

/// Consecutive positions satisfying `flag`, as `(first, last)` indices.
pub fn runs(positions: &[Position], flag: impl Fn(&Position) -> bool) -> Vec<(u32, u32)> {
    let mut runs = Vec::new();
    let mut current: Option<(u32, u32)> = None;
    for position in positions {
        if flag(position) {
            current = Some(match current {
                Some((first, _)) => (first, position.index),
                None => (position.index, position.index),
            });
        } else if let Some(run) = current.take() {
            runs.push(run);
        }
    }
    runs.extend(current);
    runs
}

/// Bend amount in quarter steps written as a mixed fraction of whole steps.
fn bend_label(quarters: i8) -> String {
    let sign = if quarters < 0 { "-" } else { "" };
    let q = quarters.unsigned_abs();
    let (whole, rest) = (q / 4, q % 4);
    let fraction = match rest {
        1 => "1/4",
        2 => "1/2",
        3 => "3/4",
        _ => "",
    };
    match (whole, fraction) {
        (0, "") => "0".to_string(),
        (0, f) => format!("{sign}{f}"),
        (w, "") => format!("{sign}{w}"),
        (w, f) => format!("{sign}{w} {f}"),
    }
}

fn artificial_harmonic_label(harmonic: &ArtificialHarmonic) -> String {
    let accidental = match harmonic.alter {
        a if a > 0 => "#".repeat(a as usize),
        a if a < 0 => "b".repeat(a.unsigned_abs() as usize),
        _ => String::new(),
    };
    let octave = match harmonic.octave_offset {
        0 => "",
        1 => " 8va",
        _ => " 15ma",
    };
    format!("A.H. {}{accidental}{octave}", harmonic.step.name())
}
