//! Shared layout constants (all in layout units unless noted).

// ── Page & margins ──────────────────────────────────────────────────
pub(crate) const MARGIN_LEFT: f64 = 20.0;
pub(crate) const MARGIN_TOP: f64 = 20.0;
pub(crate) const SYSTEM_SPACING: f64 = 40.0; // vertical gap between systems
pub(crate) const STAFF_SPACING: f64 = 24.0; // vertical gap between staves of a system

// ── Staff dimensions ────────────────────────────────────────────────
pub(crate) const LINE_SPACING: f64 = 8.0; // standard notation staff space
pub(crate) const TAB_LINE_SPACING: f64 = 9.0; // distance between tab strings
pub(crate) const STANDARD_STAFF_PADDING: f64 = 3.0; // in staff spaces, above and below
pub(crate) const TAB_STAFF_PADDING: f64 = 1.0; // in tab line spaces, above and below
pub(crate) const STAFF_LINE_WIDTH: f64 = 0.8;
pub(crate) const LEDGER_LINE_EXTEND: f64 = 0.4; // in staff spaces, beyond the notehead

// ── Horizontal spacing ──────────────────────────────────────────────
pub(crate) const POSITION_SPACING: f64 = 20.0;
pub(crate) const MIN_POSITION_SPACING: f64 = 10.0;
pub(crate) const CLEF_PADDING: f64 = 6.0; // gap after clef / signatures
pub(crate) const BARLINE_GAP: f64 = 8.0; // horizontal room consumed by a barline
pub(crate) const ACCIDENTAL_GAP: f64 = 1.5; // between accidental column 0 and notehead
pub(crate) const KEY_SIG_GAP: f64 = 1.0; // between key signature accidentals

// ── Barlines ────────────────────────────────────────────────────────
pub(crate) const BARLINE_WIDTH: f64 = 1.0;
pub(crate) const THICK_BARLINE_WIDTH: f64 = 3.0;
pub(crate) const DOUBLE_BARLINE_GAP: f64 = 3.0;
pub(crate) const REPEAT_DOT_GAP: f64 = 4.0;
pub(crate) const FREE_TIME_DASH: f64 = 3.0;

// ── Notes ───────────────────────────────────────────────────────────
pub(crate) const STEM_LENGTH: f64 = 3.5; // in staff spaces
pub(crate) const STEM_WIDTH: f64 = 1.0;
pub(crate) const DOT_GAP: f64 = 2.0;
pub(crate) const ARC_HEIGHT: f64 = 4.0;
pub(crate) const ARC_WIDTH: f64 = 0.8;
pub(crate) const SLIDE_LENGTH: f64 = 7.0;
pub(crate) const SLIDE_WIDTH: f64 = 0.9;
pub(crate) const ARPEGGIO_GAP: f64 = 4.0;
pub(crate) const MULTI_REST_INSET: f64 = 4.0;
pub(crate) const MULTI_REST_THICKNESS: f64 = 0.8; // in staff spaces

// ── Symbols & bands ─────────────────────────────────────────────────
pub(crate) const BAND_HEIGHT: f64 = 14.0;
pub(crate) const TEXT_SIZE: f64 = 9.0; // fret numbers, labels
pub(crate) const SYSTEM_TEXT_SIZE: f64 = 10.0; // chord names, tempo, directions
pub(crate) const TEXT_WIDTH_RATIO: f64 = 0.55; // average glyph advance / font size
pub(crate) const DASH_LENGTH: f64 = 3.0;
pub(crate) const DASH_GAP: f64 = 2.0;
pub(crate) const LABEL_GAP: f64 = 2.0;
pub(crate) const HAIRLINE_WIDTH: f64 = 0.5;
pub(crate) const SYMBOL_LINE_WIDTH: f64 = 1.0;
pub(crate) const ZIGZAG_UNIT: f64 = 6.0;
pub(crate) const WEDGE_OPENING: f64 = 0.6; // fraction of band height
pub(crate) const BRACKET_WIDTH: f64 = 2.0;
pub(crate) const DIVIDER_WIDTH: f64 = 0.5;
pub(crate) const DIVIDER_GAP: f64 = 6.0;
pub(crate) const CARET_PADDING: f64 = 4.0; // caret overhang beyond the outer lines
pub(crate) const REHEARSAL_BOX_PADDING: f64 = 2.0;

// ── Paint order ─────────────────────────────────────────────────────
pub(crate) const Z_STAFF: i32 = 0;
pub(crate) const Z_BARLINE: i32 = 1;
pub(crate) const Z_KNOCKOUT: i32 = 2;
pub(crate) const Z_NOTE: i32 = 3;
pub(crate) const Z_SYMBOL: i32 = 4;
