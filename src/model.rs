//! Document model consumed by the layout engine.
//!
//! The document is owned and edited elsewhere; the layout engine only ever
//! reads it. These structures capture what is needed to place symbols:
//! systems, staves, time-slot positions, notes and the annotations that
//! hang off them.

use serde::{Deserialize, Serialize};

/// A complete score: an ordered list of systems.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Score {
    /// Systems in reading order
    pub systems: Vec<System>,
    /// Overrides the configured standard-notation line spacing
    pub line_spacing: Option<f64>,
}

/// One line of music: staves sharing barlines and a horizontal span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct System {
    /// Horizontal width of the system in layout units
    pub width: f64,
    /// Distance between consecutive position slots (config default if None)
    pub position_spacing: Option<f64>,
    /// Staves, top to bottom
    pub staves: Vec<Staff>,
    /// Barlines ordered by position; a barline at position 0 is the start bar
    pub barlines: Vec<Barline>,
    /// Style of the closing barline at the right edge of the system
    pub end_bar: BarlineStyle,
    pub tempo_markers: Vec<TempoMarker>,
    pub alternate_endings: Vec<AlternateEnding>,
    pub chord_text: Vec<ChordText>,
    pub directions: Vec<Direction>,
}

impl Default for System {
    fn default() -> Self {
        Self {
            width: 750.0,
            position_spacing: None,
            staves: Vec::new(),
            barlines: Vec::new(),
            end_bar: BarlineStyle::Single,
            tempo_markers: Vec::new(),
            alternate_endings: Vec::new(),
            chord_text: Vec::new(),
            directions: Vec::new(),
        }
    }
}

/// The slice of positions belonging to one barline-delimited measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasureSpan {
    /// Index of the measure within the system
    pub index: usize,
    /// Index into `System::barlines` of the barline opening this measure
    pub opening_barline: Option<usize>,
    /// First position index (inclusive)
    pub start: u32,
    /// Last position index (exclusive)
    pub end: u32,
}

impl MeasureSpan {
    pub fn contains(&self, position: u32) -> bool {
        position >= self.start && position < self.end
    }
}

impl System {
    /// Number of position slots in the system, covering every staff's
    /// positions and every barline.
    pub fn position_count(&self) -> u32 {
        let from_staves = self
            .staves
            .iter()
            .filter_map(|s| s.positions.iter().map(|p| p.index + 1).max())
            .max()
            .unwrap_or(0);
        let from_bars = self.barlines.iter().map(|b| b.position).max().unwrap_or(0);
        from_staves.max(from_bars)
    }

    /// Split the system into measures at its barlines.
    ///
    /// A barline at position `p` opens the measure starting at `p`. Trailing
    /// barlines with no positions after them do not open a measure.
    pub fn measures(&self) -> Vec<MeasureSpan> {
        let count = self.position_count();
        let mut starts: Vec<(u32, Option<usize>)> = Vec::new();
        if !self.barlines.iter().any(|b| b.position == 0) {
            starts.push((0, None));
        }
        for (i, bar) in self.barlines.iter().enumerate() {
            match starts.last_mut() {
                Some(last) if last.0 == bar.position => last.1 = Some(i),
                _ => starts.push((bar.position, Some(i))),
            }
        }
        starts.sort_by_key(|&(p, _)| p);

        let mut spans = Vec::new();
        for (i, &(start, barline)) in starts.iter().enumerate() {
            let end = starts.get(i + 1).map_or(count, |&(p, _)| p);
            if start < end {
                spans.push(MeasureSpan {
                    index: spans.len(),
                    opening_barline: barline,
                    start,
                    end,
                });
            }
        }
        spans
    }

    /// Barline at exactly `position`, if any.
    pub fn barline_at(&self, position: u32) -> Option<&Barline> {
        self.barlines.iter().find(|b| b.position == position)
    }
}

/// Kind of staff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StaffKind {
    /// Five-line standard notation
    Standard,
    /// Guitar/bass tablature, one line per string
    #[default]
    Tablature,
}

/// Clef of a standard-notation staff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Clef {
    #[default]
    Treble,
    Bass,
}

/// A staff within a system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Staff {
    pub kind: StaffKind,
    pub clef: Clef,
    /// Number of lines (standard) or strings (tablature)
    pub line_count: u8,
    /// Time slots, ordered by `index`
    pub positions: Vec<Position>,
    pub dynamics: Vec<Dynamic>,
}

impl Default for Staff {
    fn default() -> Self {
        Self {
            kind: StaffKind::Tablature,
            clef: Clef::Treble,
            line_count: 6,
            positions: Vec::new(),
            dynamics: Vec::new(),
        }
    }
}

impl Staff {
    /// A tablature staff with `strings` strings.
    pub fn tablature(strings: u8) -> Self {
        Self {
            kind: StaffKind::Tablature,
            line_count: strings,
            ..Self::default()
        }
    }

    /// A five-line standard-notation staff.
    pub fn standard(clef: Clef) -> Self {
        Self {
            kind: StaffKind::Standard,
            clef,
            line_count: 5,
            ..Self::default()
        }
    }

    /// Positions whose index falls inside `span`.
    pub fn positions_in(&self, span: &MeasureSpan) -> impl Iterator<Item = &Position> {
        let span = *span;
        self.positions.iter().filter(move |p| span.contains(p.index))
    }
}

/// Rhythmic value of a position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Duration {
    Whole,
    Half,
    #[default]
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    SixtyFourth,
}

impl Duration {
    /// Number of flags drawn on a stem of this value.
    pub fn flag_count(self) -> usize {
        match self {
            Duration::Whole | Duration::Half | Duration::Quarter => 0,
            Duration::Eighth => 1,
            Duration::Sixteenth => 2,
            Duration::ThirtySecond => 3,
            Duration::SixtyFourth => 4,
        }
    }
}

/// A time slot within a staff.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    /// Slot index shared by every staff of the system
    pub index: u32,
    pub duration: Duration,
    pub dotted: bool,
    /// Whether this position is a rest
    pub rest: bool,
    /// Whether the rest fills the entire measure
    pub measure_rest: bool,
    pub notes: Vec<Note>,
    pub arpeggio: Option<ArpeggioDirection>,
    pub pick_stroke: Option<PickStroke>,
    pub let_ring: bool,
    pub vibrato: bool,
    pub wide_vibrato: bool,
    pub palm_muting: bool,
    pub tremolo_picking: bool,
    pub tap: bool,
    /// Fret trilled with, if this position carries a trill
    pub trill: Option<u8>,
    pub tremolo_bar: Option<TremoloBar>,
    pub volume_swell: Option<VolumeSwell>,
}

impl Position {
    /// A whole-measure rest at `index`.
    pub fn measure_rest(index: u32) -> Self {
        Self {
            index,
            duration: Duration::Whole,
            rest: true,
            measure_rest: true,
            ..Self::default()
        }
    }

    pub fn has_note_on_string(&self, string: u8) -> bool {
        self.notes.iter().any(|n| n.string == string)
    }

    pub fn note_on_string(&self, string: u8) -> Option<&Note> {
        self.notes.iter().find(|n| n.string == string)
    }
}

/// A single note of a position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
    /// String index, 0 = highest string
    pub string: u8,
    pub fret: u8,
    /// Written pitch, needed for standard notation
    pub pitch: Option<Pitch>,
    pub tied: bool,
    pub hammer_on: bool,
    pub pull_off: bool,
    pub slide_out: Option<SlideOut>,
    pub slide_in: Option<SlideIn>,
    pub muted: bool,
    pub ghost: bool,
    pub natural_harmonic: bool,
    pub artificial_harmonic: Option<ArtificialHarmonic>,
}

impl Note {
    pub fn new(string: u8, fret: u8) -> Self {
        Self {
            string,
            fret,
            ..Self::default()
        }
    }

    pub fn with_pitch(mut self, pitch: Pitch) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn is_legato(&self) -> bool {
        self.hammer_on || self.pull_off
    }
}

/// Diatonic step name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    #[default]
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Step {
    /// Zero-based diatonic index, C = 0.
    pub fn index(self) -> i32 {
        match self {
            Step::C => 0,
            Step::D => 1,
            Step::E => 2,
            Step::F => 3,
            Step::G => 4,
            Step::A => 5,
            Step::B => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Step::C => "C",
            Step::D => "D",
            Step::E => "E",
            Step::F => "F",
            Step::G => "G",
            Step::A => "A",
            Step::B => "B",
        }
    }
}

/// Written pitch of a note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Pitch {
    pub step: Step,
    /// Octave number (middle C = C4)
    pub octave: i8,
    /// Chromatic alteration in semitones, -2..=2
    pub alter: i8,
}

impl Pitch {
    pub fn new(step: Step, octave: i8, alter: i8) -> Self {
        Self { step, octave, alter }
    }

    /// Diatonic number counting steps from C0.
    pub fn diatonic(self) -> i32 {
        self.octave as i32 * 7 + self.step.index()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlideOut {
    /// Shift slide to the next note on the same string
    Shift,
    /// Legato slide to the next note on the same string
    Legato,
    OutDownwards,
    OutUpwards,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlideIn {
    FromBelow,
    FromAbove,
}

/// Artificial harmonic, labelled with the harmonic's note name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtificialHarmonic {
    pub step: Step,
    pub alter: i8,
    /// 0 = loco, 1 = 8va, 2 = 15ma
    pub octave_offset: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PickStroke {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArpeggioDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TremoloBarKind {
    #[default]
    Dip,
    DiveAndRelease,
    DiveAndHold,
    Release,
    ReturnAndRelease,
    ReturnAndHold,
    InvertedDip,
}

/// Whammy-bar event spanning `duration` positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TremoloBar {
    pub kind: TremoloBarKind,
    /// Number of positions covered; 0 means the position itself
    pub duration: u8,
    /// Pitch change in quarter steps
    pub pitch: i8,
}

/// Crescendo/decrescendo swell spanning `duration` positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeSwell {
    pub start_volume: u8,
    pub end_volume: u8,
    pub duration: u8,
}

impl VolumeSwell {
    pub fn is_increasing(&self) -> bool {
        self.end_volume >= self.start_volume
    }
}

/// Visual style of a barline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BarlineStyle {
    #[default]
    Single,
    Double,
    Final,
    FreeTime,
    RepeatStart,
    RepeatEnd,
}

/// A measure boundary inside a system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Barline {
    /// Position index the barline precedes
    pub position: u32,
    pub style: BarlineStyle,
    /// Play count shown on a repeat end (0 or 2 hide the label)
    pub repeat_count: u8,
    pub key_signature: Option<KeySignature>,
    pub time_signature: Option<TimeSignature>,
    pub rehearsal_sign: Option<RehearsalSign>,
}

impl Barline {
    pub fn at(position: u32) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Whether this barline changes the key or time signature.
    pub fn has_signature_change(&self) -> bool {
        self.key_signature.is_some() || self.time_signature.is_some()
    }
}

/// Key signature as a count of sharps (positive) or flats (negative).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeySignature {
    pub fifths: i8,
}

impl KeySignature {
    /// Alteration the key applies to `step`.
    pub fn alteration(&self, step: Step) -> i8 {
        const SHARP_ORDER: [Step; 7] = [Step::F, Step::C, Step::G, Step::D, Step::A, Step::E, Step::B];
        const FLAT_ORDER: [Step; 7] = [Step::B, Step::E, Step::A, Step::D, Step::G, Step::C, Step::F];
        let count = self.fifths.unsigned_abs().min(7) as usize;
        if self.fifths > 0 && SHARP_ORDER[..count].contains(&step) {
            1
        } else if self.fifths < 0 && FLAT_ORDER[..count].contains(&step) {
            -1
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub beats: u8,
    pub beat_type: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self { beats: 4, beat_type: 4 }
    }
}

/// Section marker shown above a barline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RehearsalSign {
    pub letter: char,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Volume {
    Off,
    Ppp,
    Pp,
    P,
    Mp,
    #[default]
    Mf,
    F,
    Ff,
    Fff,
}

impl Volume {
    pub fn label(self) -> &'static str {
        match self {
            Volume::Off => "off",
            Volume::Ppp => "ppp",
            Volume::Pp => "pp",
            Volume::P => "p",
            Volume::Mp => "mp",
            Volume::Mf => "mf",
            Volume::F => "f",
            Volume::Ff => "ff",
            Volume::Fff => "fff",
        }
    }
}

/// Dynamic marking drawn below a staff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dynamic {
    pub position: u32,
    pub volume: Volume,
}

/// Metronome marking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoMarker {
    pub position: u32,
    pub beats_per_minute: u16,
    pub beat: Duration,
    /// Free text such as "Moderately"
    pub description: String,
}

impl Default for TempoMarker {
    fn default() -> Self {
        Self {
            position: 0,
            beats_per_minute: 120,
            beat: Duration::Quarter,
            description: String::new(),
        }
    }
}

/// Volta bracket starting at `position`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlternateEnding {
    pub position: u32,
    /// Repeat numbers this ending applies to
    pub numbers: Vec<u8>,
}

impl AlternateEnding {
    pub fn label(&self) -> String {
        let nums: Vec<String> = self.numbers.iter().map(|n| format!("{n}.")).collect();
        nums.join(" ")
    }
}

/// Chord name shown above the system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChordText {
    pub position: u32,
    pub name: String,
}

/// Musical direction anchored at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DirectionSymbol {
    Coda,
    DoubleCoda,
    Segno,
    SegnoSegno,
    Fine,
    DaCapo,
    DalSegno,
    DalSegnoSegno,
    ToCoda,
    ToDoubleCoda,
    DaCapoAlCoda,
    DaCapoAlFine,
    DalSegnoAlCoda,
    DalSegnoAlFine,
}

impl DirectionSymbol {
    pub fn label(self) -> &'static str {
        match self {
            DirectionSymbol::Coda => "Coda",
            DirectionSymbol::DoubleCoda => "Double Coda",
            DirectionSymbol::Segno => "Segno",
            DirectionSymbol::SegnoSegno => "Segno Segno",
            DirectionSymbol::Fine => "Fine",
            DirectionSymbol::DaCapo => "D.C.",
            DirectionSymbol::DalSegno => "D.S.",
            DirectionSymbol::DalSegnoSegno => "D.S.S.",
            DirectionSymbol::ToCoda => "To Coda",
            DirectionSymbol::ToDoubleCoda => "To Double Coda",
            DirectionSymbol::DaCapoAlCoda => "D.C. al Coda",
            DirectionSymbol::DaCapoAlFine => "D.C. al Fine",
            DirectionSymbol::DalSegnoAlCoda => "D.S. al Coda",
            DirectionSymbol::DalSegnoAlFine => "D.S. al Fine",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Direction {
    pub position: u32,
    pub symbols: Vec<DirectionSymbol>,
}

/// Current edit location, owned by the interaction layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caret {
    pub system: usize,
    pub staff: usize,
    pub position: u32,
    pub string: u8,
}
