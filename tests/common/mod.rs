//! Document builders shared by the integration tests.

#![allow(dead_code)]

use scorelayout::*;

pub fn position(index: u32) -> Position {
    Position {
        index,
        ..Position::default()
    }
}

pub fn tab_position(index: u32, frets: &[(u8, u8)]) -> Position {
    Position {
        index,
        notes: frets.iter().map(|&(string, fret)| Note::new(string, fret)).collect(),
        ..Position::default()
    }
}

pub fn pitched_position(index: u32, pitches: &[Pitch]) -> Position {
    Position {
        index,
        notes: pitches
            .iter()
            .map(|&pitch| Note::new(0, 0).with_pitch(pitch))
            .collect(),
        ..Position::default()
    }
}

pub fn tab_staff(positions: Vec<Position>) -> Staff {
    Staff {
        positions,
        ..Staff::tablature(6)
    }
}

pub fn treble_staff(positions: Vec<Position>) -> Staff {
    Staff {
        positions,
        ..Staff::standard(Clef::Treble)
    }
}

pub fn system(staves: Vec<Staff>, barlines: Vec<Barline>) -> System {
    System {
        staves,
        barlines,
        ..System::default()
    }
}

/// A tab staff of `measures` whole-measure rests, one barline per measure.
pub fn rest_system(measures: u32) -> System {
    system(
        vec![tab_staff((0..measures).map(Position::measure_rest).collect())],
        (0..measures).map(Barline::at).collect(),
    )
}

/// Standard + tab system exercising most symbols.
pub fn busy_system() -> System {
    let mut standard: Vec<Position> = (0..8)
        .map(|i| pitched_position(i, &[Pitch::new(Step::E, 4, 0), Pitch::new(Step::G, 4, 0)]))
        .collect();
    standard[2] = pitched_position(2, &[Pitch::new(Step::F, 4, 1), Pitch::new(Step::G, 4, 1)]);
    standard[5].notes[0].tied = true;
    standard[6].duration = Duration::Eighth;
    standard[6].dotted = true;

    let mut tab: Vec<Position> = (0..8).map(|i| tab_position(i, &[(0, i as u8), (2, 2)])).collect();
    tab[0].let_ring = true;
    tab[1].let_ring = true;
    tab[2].palm_muting = true;
    tab[1].notes[0].hammer_on = true;
    tab[3].notes[1].slide_out = Some(SlideOut::Shift);
    tab[4].arpeggio = Some(ArpeggioDirection::Down);
    tab[5].vibrato = true;
    tab[6].vibrato = true;
    tab[6].pick_stroke = Some(PickStroke::Down);
    tab[7].notes[0].muted = true;
    tab[7].tremolo_bar = Some(TremoloBar {
        kind: TremoloBarKind::Dip,
        duration: 1,
        pitch: -4,
    });

    let mut guitar = tab_staff(tab);
    guitar.dynamics = vec![Dynamic {
        position: 0,
        volume: Volume::Mf,
    }];

    let mut opening = Barline::at(0);
    opening.key_signature = Some(KeySignature { fifths: 1 });
    opening.time_signature = Some(TimeSignature::default());
    opening.rehearsal_sign = Some(RehearsalSign {
        letter: 'A',
        description: "Intro".into(),
    });
    let mut repeat = Barline::at(4);
    repeat.style = BarlineStyle::RepeatEnd;
    repeat.repeat_count = 3;

    System {
        tempo_markers: vec![TempoMarker {
            position: 0,
            beats_per_minute: 96,
            beat: Duration::Quarter,
            description: "Moderato".into(),
        }],
        chord_text: vec![
            ChordText {
                position: 0,
                name: "Em".into(),
            },
            ChordText {
                position: 4,
                name: "C&G".into(),
            },
        ],
        alternate_endings: vec![AlternateEnding {
            position: 4,
            numbers: vec![1, 2],
        }],
        directions: vec![Direction {
            position: 7,
            symbols: vec![DirectionSymbol::DalSegnoAlCoda],
        }],
        end_bar: BarlineStyle::Final,
        ..system(vec![treble_staff(standard), guitar], vec![opening, repeat])
    }
}

pub fn plain_tab_system(positions: u32) -> System {
    system(
        vec![tab_staff(
            (0..positions).map(|i| tab_position(i, &[(1, 3)])).collect(),
        )],
        vec![Barline::at(0)],
    )
}

pub fn sample_score() -> Score {
    Score {
        systems: vec![busy_system(), rest_system(4), plain_tab_system(6)],
        line_spacing: None,
    }
}
