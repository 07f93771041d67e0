//! Per-staff vertical metrics.

use serde::Serialize;

use super::constants::*;
use crate::font::{Glyph, GlyphMetrics};
use crate::model::{Clef, Pitch, StaffKind};

/// Diatonic number of the bottom line of a treble staff (E4).
const TREBLE_BOTTOM_LINE: i32 = 30;
/// Diatonic number of the bottom line of a bass staff (G2).
const BASS_BOTTOM_LINE: i32 = 18;

/// Vertical layout of one staff, in staff-local coordinates.
///
/// From top to bottom a staff block consists of the above-staff bands, a
/// padding zone, the lines themselves, another padding zone and the
/// below-staff bands. `y = 0` is the top of the block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StaffData {
    pub kind: StaffKind,
    pub clef: Clef,
    pub line_count: usize,
    /// Distance between adjacent lines
    pub line_spacing: f64,
    /// Width reserved for the clef (standard) or tab clef
    pub clef_width: f64,
    /// Zone between the band area and the first line
    pub top_padding: f64,
    pub bottom_padding: f64,
    /// Total height of the above-staff bands
    pub above_height: f64,
    /// Total height of the below-staff bands
    pub below_height: f64,
}

impl StaffData {
    /// Compute the metrics of a staff without any annotation bands.
    pub fn compute(
        kind: StaffKind,
        clef: Clef,
        line_count: usize,
        metrics: &dyn GlyphMetrics,
        line_spacing: f64,
        tab_line_spacing: f64,
    ) -> Self {
        let (spacing, padding, clef_glyph) = match kind {
            StaffKind::Standard => (
                line_spacing,
                STANDARD_STAFF_PADDING * line_spacing,
                match clef {
                    Clef::Treble => Glyph::TrebleClef,
                    Clef::Bass => Glyph::BassClef,
                },
            ),
            StaffKind::Tablature => (
                tab_line_spacing,
                TAB_STAFF_PADDING * tab_line_spacing,
                Glyph::TabClef,
            ),
        };
        Self {
            kind,
            clef,
            line_count,
            line_spacing: spacing,
            clef_width: metrics.glyph_size(clef_glyph).width,
            top_padding: padding,
            bottom_padding: padding,
            above_height: 0.0,
            below_height: 0.0,
        }
    }

    /// Fix the band heights once packing is known.
    pub fn with_bands(self, above_height: f64, below_height: f64) -> Self {
        Self {
            above_height,
            below_height,
            ..self
        }
    }

    /// Distance from the first to the last line, excluding bands.
    pub fn staff_height(&self) -> f64 {
        self.line_count.saturating_sub(1) as f64 * self.line_spacing
    }

    pub fn line_y(&self, line: usize) -> f64 {
        self.top_line_y() + line as f64 * self.line_spacing
    }

    pub fn top_line_y(&self) -> f64 {
        self.above_height + self.top_padding
    }

    pub fn bottom_line_y(&self) -> f64 {
        self.top_line_y() + self.staff_height()
    }

    pub fn middle_y(&self) -> f64 {
        self.top_line_y() + self.staff_height() / 2.0
    }

    /// Bottom edge of the above-staff band area; bands stack upwards from here.
    pub fn above_band_start(&self) -> f64 {
        self.above_height
    }

    /// Top edge of the below-staff band area; bands stack downwards from here.
    pub fn below_band_start(&self) -> f64 {
        self.bottom_line_y() + self.bottom_padding
    }

    /// Height of the whole block including bands.
    pub fn height(&self) -> f64 {
        self.below_band_start() + self.below_height
    }

    /// Diatonic number of the bottom line for the staff's clef.
    pub fn bottom_line_diatonic(&self) -> i32 {
        match self.clef {
            Clef::Treble => TREBLE_BOTTOM_LINE,
            Clef::Bass => BASS_BOTTOM_LINE,
        }
    }

    /// Staff step of a pitch: 0 is the bottom line, each step is a line or
    /// space upwards.
    pub fn staff_step(&self, pitch: Pitch) -> i32 {
        pitch.diatonic() - self.bottom_line_diatonic()
    }

    /// Vertical centre of staff step `step`.
    pub fn step_y(&self, step: i32) -> f64 {
        self.bottom_line_y() - step as f64 * self.line_spacing / 2.0
    }

    /// Tab string line; strings past the last line clamp to it.
    pub fn string_y(&self, string: u8) -> f64 {
        let last = self.line_count.saturating_sub(1);
        self.line_y((string as usize).min(last))
    }
}
