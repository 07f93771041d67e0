//! Accidental selection and collision stacking on standard staves.

use std::collections::HashMap;

use log::trace;
use serde::Serialize;

use crate::font::{Glyph, GlyphMetrics};
use crate::geometry::Rect;
use crate::model::{KeySignature, Pitch};

/// An accidental sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Accidental {
    DoubleFlat,
    Flat,
    Natural,
    Sharp,
    DoubleSharp,
}

impl Accidental {
    /// Sign showing an alteration of `alter` semitones.
    pub fn for_alteration(alter: i8) -> Self {
        match alter {
            i8::MIN..=-2 => Accidental::DoubleFlat,
            -1 => Accidental::Flat,
            0 => Accidental::Natural,
            1 => Accidental::Sharp,
            _ => Accidental::DoubleSharp,
        }
    }

    pub fn glyph(self) -> Glyph {
        match self {
            Accidental::DoubleFlat => Glyph::DoubleFlat,
            Accidental::Flat => Glyph::Flat,
            Accidental::Natural => Glyph::Natural,
            Accidental::Sharp => Glyph::Sharp,
            Accidental::DoubleSharp => Glyph::DoubleSharp,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Carried state
// ═══════════════════════════════════════════════════════════════════════

/// Alterations in force within one measure of one staff.
///
/// Keyed by diatonic number (a specific line or space), seeded from the key
/// signature and reset at every barline.
#[derive(Debug, Clone, Default)]
pub struct AccidentalTracker {
    key: KeySignature,
    carried: HashMap<i32, i8>,
}

impl AccidentalTracker {
    pub fn new(key: KeySignature) -> Self {
        Self {
            key,
            carried: HashMap::new(),
        }
    }

    /// Start a new measure, optionally under a new key.
    pub fn reset(&mut self, key: Option<KeySignature>) {
        if let Some(key) = key {
            self.key = key;
        }
        self.carried.clear();
    }

    pub fn key(&self) -> KeySignature {
        self.key
    }

    /// Alteration currently in force for the line/space of `pitch`.
    pub fn carried_alteration(&self, pitch: Pitch) -> i8 {
        self.carried
            .get(&pitch.diatonic())
            .copied()
            .unwrap_or_else(|| self.key.alteration(pitch.step))
    }

    /// Accidental to draw for `pitch`, if any, recording it for the rest of
    /// the measure.
    pub fn require(&mut self, pitch: Pitch) -> Option<Accidental> {
        if self.carried_alteration(pitch) == pitch.alter {
            return None;
        }
        self.carried.insert(pitch.diatonic(), pitch.alter);
        Some(Accidental::for_alteration(pitch.alter))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Stacking
// ═══════════════════════════════════════════════════════════════════════

/// An accidental needed at one horizontal position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccidentalRequest {
    /// Staff step of the note (0 = bottom line)
    pub step: i32,
    pub accidental: Accidental,
}

/// An accidental after stacking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlacedAccidental {
    pub step: i32,
    pub accidental: Accidental,
    /// 0 is nearest the notehead; each further column sits one column
    /// width to the left
    pub column: usize,
    /// Relative to an anchor whose x is the right edge of column 0 and whose
    /// y is the bottom staff line
    pub rect: Rect,
}

/// The stacked accidentals of one position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccidentalStack {
    pub placed: Vec<PlacedAccidental>,
    pub column_width: f64,
    /// Horizontal room taken by all columns
    pub width: f64,
}

impl AccidentalStack {
    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.placed.iter().map(|p| p.column + 1).max().unwrap_or(0)
    }
}

/// Arranges the accidentals of one position in non-overlapping columns.
pub struct AccidentalStacker<'a> {
    metrics: &'a dyn GlyphMetrics,
    step_height: f64,
}

impl<'a> AccidentalStacker<'a> {
    /// `step_height` is the vertical distance between adjacent staff steps
    /// (half a staff space).
    pub fn new(metrics: &'a dyn GlyphMetrics, step_height: f64) -> Self {
        Self {
            metrics,
            step_height,
        }
    }

    /// Place each accidental, lowest pitch first, in the first column where
    /// it does not overlap an already placed accidental vertically.
    pub fn stack(&self, requests: &[AccidentalRequest]) -> AccidentalStack {
        let mut sorted = requests.to_vec();
        sorted.sort_by_key(|r| (r.step, r.accidental));
        sorted.dedup();

        let column_width = sorted
            .iter()
            .map(|r| self.metrics.glyph_size(r.accidental.glyph()).width)
            .fold(0.0, f64::max);

        let mut placed: Vec<PlacedAccidental> = Vec::with_capacity(sorted.len());
        for request in sorted {
            let size = self.metrics.glyph_size(request.accidental.glyph());
            let center_y = -(request.step as f64) * self.step_height;
            let column = (0..)
                .find(|&col| {
                    placed.iter().filter(|p| p.column == col).all(|p| {
                        let reach = (p.rect.height() + size.height) / 2.0;
                        (p.rect.center().y - center_y).abs() >= reach
                    })
                })
                .unwrap_or(0);
            let right = -(column as f64) * column_width;
            let rect = Rect::new(
                right - size.width,
                center_y - size.height / 2.0,
                size.width,
                size.height,
            );
            trace!(step = request.step, accidental:? = request.accidental, column; "Stacked accidental");
            placed.push(PlacedAccidental {
                step: request.step,
                accidental: request.accidental,
                column,
                rect,
            });
        }

        let columns = placed.iter().map(|p| p.column + 1).max().unwrap_or(0);
        AccidentalStack {
            placed,
            column_width,
            width: columns as f64 * column_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::StaffMetrics;
    use crate::model::Step;
    use pretty_assertions::assert_eq;

    fn request(step: i32, accidental: Accidental) -> AccidentalRequest {
        AccidentalRequest { step, accidental }
    }

    #[test]
    fn tracker_follows_key_and_measure() {
        let mut tracker = AccidentalTracker::new(KeySignature { fifths: 1 });
        // F# is in the key.
        assert_eq!(tracker.require(Pitch::new(Step::F, 4, 1)), None);
        assert_eq!(tracker.require(Pitch::new(Step::F, 4, 0)), Some(Accidental::Natural));
        // The natural carries through the measure on that line only.
        assert_eq!(tracker.require(Pitch::new(Step::F, 4, 0)), None);
        assert_eq!(tracker.require(Pitch::new(Step::F, 5, 1)), None);
        tracker.reset(None);
        assert_eq!(tracker.require(Pitch::new(Step::F, 4, 0)), Some(Accidental::Natural));
        tracker.reset(Some(KeySignature { fifths: -1 }));
        assert_eq!(tracker.require(Pitch::new(Step::B, 4, 0)), Some(Accidental::Natural));
        assert_eq!(tracker.require(Pitch::new(Step::C, 5, 1)), Some(Accidental::Sharp));
    }

    #[test]
    fn distant_accidentals_share_column_zero() {
        let m = StaffMetrics::new(10.0);
        let stack = AccidentalStacker::new(&m, 5.0).stack(&[
            request(0, Accidental::Sharp),
            request(8, Accidental::Sharp),
        ]);
        assert!(stack.placed.iter().all(|p| p.column == 0));
        assert_eq!(stack.width, 10.0);
    }

    #[test]
    fn close_accidentals_step_left() {
        let m = StaffMetrics::new(10.0);
        let stack = AccidentalStacker::new(&m, 5.0).stack(&[
            request(3, Accidental::Sharp),
            request(2, Accidental::Sharp),
        ]);
        assert_eq!(stack.placed[0].step, 2);
        assert_eq!(stack.placed[0].column, 0);
        assert_eq!(stack.placed[1].column, 1);
        assert_eq!(stack.placed[0].rect.max_x() - stack.placed[1].rect.max_x(), 10.0);
        assert_eq!(stack.placed[1].rect.center().y, -15.0);
        assert_eq!(stack.width, 20.0);
    }

    #[test]
    fn staircase_reuses_free_columns() {
        let m = StaffMetrics::new(10.0);
        // Steps 0, 2 and 6: 0 and 6 are far enough apart to share column 0.
        let stack = AccidentalStacker::new(&m, 5.0).stack(&[
            request(6, Accidental::Flat),
            request(2, Accidental::Flat),
            request(0, Accidental::Flat),
        ]);
        let columns: Vec<usize> = stack.placed.iter().map(|p| p.column).collect();
        assert_eq!(columns, vec![0, 1, 0]);
        assert_eq!(stack.column_count(), 2);
    }

    #[test]
    fn same_pitch_is_drawn_once() {
        let m = StaffMetrics::new(10.0);
        let stack = AccidentalStacker::new(&m, 5.0).stack(&[
            request(4, Accidental::Flat),
            request(4, Accidental::Flat),
        ]);
        assert_eq!(stack.placed.len(), 1);
    }

    #[test]
    fn empty_request_has_no_width() {
        let m = StaffMetrics::new(10.0);
        let stack = AccidentalStacker::new(&m, 5.0).stack(&[]);
        assert!(stack.is_empty());
        assert_eq!(stack.width, 0.0);
    }
}
