//! Merging runs of whole-measure rests into multi-measure rests.

use serde::Serialize;

use crate::model::{Barline, BarlineStyle, MeasureSpan, Staff, System};

/// A run of two or more whole-measure rests drawn as one glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MultiRest {
    /// Index of the first measure of the run
    pub first_measure: usize,
    /// Number of measures summarised (always >= 2)
    pub count: usize,
    /// First position index covered
    pub start: u32,
    /// Position index after the run
    pub end: u32,
}

impl MultiRest {
    pub fn measures(&self) -> std::ops::Range<usize> {
        self.first_measure..self.first_measure + self.count
    }
}

/// Whether a barline ends any rest run passing through it.
pub fn breaks_rest_run(barline: &Barline) -> bool {
    barline.has_signature_change()
        || barline.rehearsal_sign.is_some()
        || matches!(barline.style, BarlineStyle::RepeatStart | BarlineStyle::RepeatEnd)
}

fn is_rest_measure(staff: &Staff, span: &MeasureSpan) -> bool {
    let mut positions = staff.positions_in(span);
    match (positions.next(), positions.next()) {
        (Some(only), None) => only.rest && only.measure_rest && only.notes.is_empty(),
        _ => false,
    }
}

/// Find the multi-measure rests of `staff` within `system`.
pub fn merge_rests(system: &System, staff: &Staff) -> Vec<MultiRest> {
    let measures = system.measures();
    let mut merged = Vec::new();
    let mut run: Vec<&MeasureSpan> = Vec::new();

    for span in &measures {
        let breaks = span
            .opening_barline
            .and_then(|i| system.barlines.get(i))
            .is_some_and(breaks_rest_run);
        if breaks {
            close_run(&mut run, &mut merged);
        }
        if is_rest_measure(staff, span) {
            run.push(span);
        } else {
            close_run(&mut run, &mut merged);
        }
    }
    close_run(&mut run, &mut merged);
    merged
}

fn close_run(run: &mut Vec<&MeasureSpan>, merged: &mut Vec<MultiRest>) {
    if let (Some(first), Some(last)) = (run.first(), run.last()) {
        if run.len() >= 2 {
            merged.push(MultiRest {
                first_measure: first.index,
                count: run.len(),
                start: first.start,
                end: last.end,
            });
        }
    }
    run.clear();
}

/// Indices into `system.barlines` hidden inside the given runs.
pub fn hidden_barlines(system: &System, rests: &[MultiRest]) -> Vec<usize> {
    let measures = system.measures();
    let mut hidden = Vec::new();
    for rest in rests {
        for span in &measures[rest.first_measure + 1..rest.first_measure + rest.count] {
            if let Some(bar) = span.opening_barline {
                hidden.push(bar);
            }
        }
    }
    hidden
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{KeySignature, Note, Position, RehearsalSign, TimeSignature};
    use pretty_assertions::assert_eq;

    fn rest_system(measures: u32) -> System {
        let mut staff = Staff::tablature(6);
        staff.positions = (0..measures).map(Position::measure_rest).collect();
        System {
            staves: vec![staff],
            barlines: (0..measures).map(Barline::at).collect(),
            ..System::default()
        }
    }

    fn counts(system: &System) -> Vec<usize> {
        merge_rests(system, &system.staves[0])
            .iter()
            .map(|r| r.count)
            .collect()
    }

    #[test]
    fn run_of_four_merges() {
        let system = rest_system(4);
        let rests = merge_rests(&system, &system.staves[0]);
        assert_eq!(
            rests,
            vec![MultiRest {
                first_measure: 0,
                count: 4,
                start: 0,
                end: 4
            }]
        );
        assert_eq!(hidden_barlines(&system, &rests), vec![1, 2, 3]);
    }

    #[test]
    fn single_rest_is_not_merged() {
        let mut system = rest_system(3);
        system.staves[0].positions[1] = Position {
            index: 1,
            notes: vec![Note::new(0, 3)],
            ..Position::default()
        };
        assert!(merge_rests(&system, &system.staves[0]).is_empty());
    }

    #[test]
    fn time_change_splits_run() {
        let mut system = rest_system(6);
        system.barlines[4].time_signature = Some(TimeSignature { beats: 3, beat_type: 4 });
        assert_eq!(counts(&system), vec![4, 2]);
    }

    #[test]
    fn repeat_start_splits_run() {
        let mut system = rest_system(5);
        system.barlines[2].style = BarlineStyle::RepeatStart;
        assert_eq!(counts(&system), vec![2, 3]);
    }

    #[test]
    fn repeat_end_splits_run() {
        let mut system = rest_system(5);
        system.barlines[3].style = BarlineStyle::RepeatEnd;
        assert_eq!(counts(&system), vec![3, 2]);
    }

    #[test]
    fn key_change_splits_run() {
        let mut system = rest_system(5);
        system.barlines[2].key_signature = Some(KeySignature { fifths: -2 });
        assert_eq!(counts(&system), vec![2, 3]);
    }

    #[test]
    fn rehearsal_sign_splits_run() {
        let mut system = rest_system(4);
        system.barlines[1].rehearsal_sign = Some(RehearsalSign {
            letter: 'B',
            description: String::new(),
        });
        // The first measure is left on its own and stays a plain rest.
        assert_eq!(counts(&system), vec![3]);
        let rests = merge_rests(&system, &system.staves[0]);
        assert_eq!(rests[0].first_measure, 1);
        assert_eq!(hidden_barlines(&system, &rests), vec![2, 3]);
    }

    #[test]
    fn measure_with_extra_position_breaks_run() {
        let mut system = rest_system(4);
        system.staves[0].positions.push(Position {
            index: 2,
            ..Position::default()
        });
        system.staves[0].positions.sort_by_key(|p| p.index);
        // Measure 2 now holds two positions.
        let rests = merge_rests(&system, &system.staves[0]);
        assert_eq!(rests.len(), 1);
        assert_eq!(rests[0].count, 2);
    }
}
