//! Glyph identifiers and the metrics interface of the font source.
//!
//! The layout engine never rasterizes anything; it only asks a
//! [`GlyphMetrics`] implementation how large a glyph or text run is.

use serde::Serialize;

use crate::geometry::Size;
use crate::layout::constants::TEXT_WIDTH_RATIO;
use crate::model::Duration;

/// A music font symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Glyph {
    TrebleClef,
    BassClef,
    TabClef,
    Sharp,
    Flat,
    Natural,
    DoubleSharp,
    DoubleFlat,
    NoteheadWhole,
    NoteheadHalf,
    NoteheadBlack,
    NoteheadX,
    Rest(Duration),
    Flag(Duration),
    AugmentationDot,
    TimeSigDigit(u8),
    RepeatDot,
    Segno,
    Coda,
    TrillWave,
    Vibrato,
    WideVibrato,
    PickStrokeUp,
    PickStrokeDown,
    ArpeggioArrowUp,
    ArpeggioArrowDown,
    TremoloPicking,
    MetronomeNote(Duration),
}

impl Glyph {
    /// SMuFL code point for the glyph.
    pub fn codepoint(self) -> char {
        let cp: u32 = match self {
            Glyph::TrebleClef => 0xE050,
            Glyph::BassClef => 0xE062,
            Glyph::TabClef => 0xE06D,
            Glyph::Flat => 0xE260,
            Glyph::Natural => 0xE261,
            Glyph::Sharp => 0xE262,
            Glyph::DoubleSharp => 0xE263,
            Glyph::DoubleFlat => 0xE264,
            Glyph::NoteheadWhole => 0xE0A2,
            Glyph::NoteheadHalf => 0xE0A3,
            Glyph::NoteheadBlack => 0xE0A4,
            Glyph::NoteheadX => 0xE0A9,
            Glyph::Rest(d) => 0xE4E3 + duration_offset(d),
            Glyph::Flag(d) => match d {
                Duration::Sixteenth => 0xE242,
                Duration::ThirtySecond => 0xE244,
                Duration::SixtyFourth => 0xE246,
                _ => 0xE240,
            },
            Glyph::AugmentationDot => 0xE1E7,
            Glyph::TimeSigDigit(n) => 0xE080 + u32::from(n.min(9)),
            Glyph::RepeatDot => 0xE044,
            Glyph::Segno => 0xE047,
            Glyph::Coda => 0xE048,
            Glyph::TrillWave => 0xEAA4,
            Glyph::Vibrato => 0xEAB2,
            Glyph::WideVibrato => 0xEAB6,
            Glyph::PickStrokeDown => 0xE610,
            Glyph::PickStrokeUp => 0xE612,
            Glyph::ArpeggioArrowUp => 0xE634,
            Glyph::ArpeggioArrowDown => 0xE635,
            Glyph::TremoloPicking => 0xE222,
            Glyph::MetronomeNote(d) => 0xECA2 + 2 * duration_offset(d) - u32::from(d != Duration::Whole),
        };
        char::from_u32(cp).unwrap_or('\u{FFFD}')
    }

    /// Size of the glyph in staff spaces.
    fn size_in_spaces(self) -> (f64, f64) {
        match self {
            Glyph::TrebleClef => (2.7, 7.0),
            Glyph::BassClef => (2.7, 3.4),
            Glyph::TabClef => (1.9, 4.0),
            Glyph::Sharp => (1.0, 2.8),
            Glyph::Flat => (0.9, 2.4),
            Glyph::Natural => (0.7, 2.7),
            Glyph::DoubleSharp => (1.0, 1.0),
            Glyph::DoubleFlat => (1.6, 2.4),
            Glyph::NoteheadWhole => (1.7, 1.0),
            Glyph::NoteheadHalf | Glyph::NoteheadBlack => (1.2, 1.0),
            Glyph::NoteheadX => (1.2, 1.0),
            Glyph::Rest(d) => match d {
                Duration::Whole | Duration::Half => (1.1, 0.5),
                Duration::Quarter => (1.1, 2.8),
                Duration::Eighth => (1.0, 1.7),
                Duration::Sixteenth => (1.3, 2.7),
                Duration::ThirtySecond => (1.5, 3.7),
                Duration::SixtyFourth => (1.7, 4.7),
            },
            Glyph::Flag(_) => (1.1, 3.2),
            Glyph::AugmentationDot | Glyph::RepeatDot => (0.4, 0.4),
            Glyph::TimeSigDigit(_) => (1.8, 2.0),
            Glyph::Segno => (1.9, 2.6),
            Glyph::Coda => (2.5, 3.0),
            Glyph::TrillWave => (1.0, 0.7),
            Glyph::Vibrato => (0.9, 0.6),
            Glyph::WideVibrato => (1.4, 1.1),
            Glyph::PickStrokeUp | Glyph::PickStrokeDown => (1.0, 1.2),
            Glyph::ArpeggioArrowUp | Glyph::ArpeggioArrowDown => (1.0, 0.8),
            Glyph::TremoloPicking => (1.2, 2.0),
            Glyph::MetronomeNote(_) => (1.2, 2.8),
        }
    }
}

fn duration_offset(d: Duration) -> u32 {
    match d {
        Duration::Whole => 0,
        Duration::Half => 1,
        Duration::Quarter => 2,
        Duration::Eighth => 3,
        Duration::Sixteenth => 4,
        Duration::ThirtySecond => 5,
        Duration::SixtyFourth => 6,
    }
}

/// Source of glyph and text dimensions.
pub trait GlyphMetrics {
    /// Intrinsic size of `glyph` in layout units.
    fn glyph_size(&self, glyph: Glyph) -> Size;

    /// Advance width of `text` set at font `size`.
    fn text_width(&self, text: &str, size: f64) -> f64;

    /// Line height of text set at font `size`.
    fn text_height(&self, size: f64) -> f64;
}

/// Default metrics: glyphs are tabulated in staff spaces and scaled by the
/// staff space the metrics were created with; text uses an average advance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaffMetrics {
    space: f64,
}

impl StaffMetrics {
    pub fn new(space: f64) -> Self {
        Self { space }
    }

    pub fn space(&self) -> f64 {
        self.space
    }
}

impl GlyphMetrics for StaffMetrics {
    fn glyph_size(&self, glyph: Glyph) -> Size {
        let (w, h) = glyph.size_in_spaces();
        Size::new(w, h).scale(self.space)
    }

    fn text_width(&self, text: &str, size: f64) -> f64 {
        text.chars().count() as f64 * size * TEXT_WIDTH_RATIO
    }

    fn text_height(&self, size: f64) -> f64 {
        size
    }
}

/// Adapter scaling every glyph of another metrics source by a constant
/// factor. Text is left alone since callers pass already scaled sizes.
pub(crate) struct ScaledMetrics<'a> {
    inner: &'a dyn GlyphMetrics,
    factor: f64,
}

impl<'a> ScaledMetrics<'a> {
    pub(crate) fn new(inner: &'a dyn GlyphMetrics, factor: f64) -> Self {
        Self { inner, factor }
    }
}

impl GlyphMetrics for ScaledMetrics<'_> {
    fn glyph_size(&self, glyph: Glyph) -> Size {
        self.inner.glyph_size(glyph).scale(self.factor)
    }

    fn text_width(&self, text: &str, size: f64) -> f64 {
        self.inner.text_width(text, size)
    }

    fn text_height(&self, size: f64) -> f64 {
        self.inner.text_height(size)
    }
}
