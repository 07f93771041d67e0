//! Property tests for the layout components.

mod common;

use common::*;
use float_cmp::approx_eq;
use proptest::prelude::*;
use scorelayout::geometry::Point;
use scorelayout::items::PlacedItem;
use scorelayout::layout::accidentals::{Accidental, AccidentalRequest, AccidentalStacker};
use scorelayout::layout::band_packer::{BandPacker, SymbolCategory, SymbolInfo};
use scorelayout::layout::connected::{ConnectedGlyphBuilder, ConnectedKind, WIDTH_EPSILON};
use scorelayout::layout::multi_rest::merge_rests;
use scorelayout::*;

fn symbol(category: SymbolCategory, start: f64, width: f64) -> SymbolInfo {
    let item = PlacedItem::line(Point::new(start, 0.0), Point::new(start + width, 0.0), 0.0, 0);
    SymbolInfo {
        category,
        start,
        end: start + width,
        items: vec![item],
    }
}

fn category() -> impl Strategy<Value = SymbolCategory> {
    prop::sample::select(SymbolCategory::DEFAULT_PRIORITY.to_vec())
}

fn accidental() -> impl Strategy<Value = Accidental> {
    prop::sample::select(vec![
        Accidental::DoubleFlat,
        Accidental::Flat,
        Accidental::Natural,
        Accidental::Sharp,
        Accidental::DoubleSharp,
    ])
}

proptest! {
    #[test]
    fn symbols_sharing_a_band_never_overlap(
        specs in prop::collection::vec((category(), 0.0..500.0f64, 0.0..80.0f64), 0..40)
    ) {
        let symbols: Vec<SymbolInfo> = specs
            .iter()
            .map(|&(c, start, width)| symbol(c, start, width))
            .collect();
        let priority = SymbolCategory::DEFAULT_PRIORITY;
        let packing = BandPacker::new(&priority).pack(&symbols);

        for i in 0..symbols.len() {
            for j in i + 1..symbols.len() {
                if packing.bands[i] == packing.bands[j] {
                    let (a, b) = (&symbols[i], &symbols[j]);
                    prop_assert!(a.end < b.start || b.end < a.start);
                }
            }
        }

        // First fit over start-sorted intervals needs exactly the deepest overlap.
        let depth = symbols
            .iter()
            .map(|s| symbols.iter().filter(|o| o.start <= s.start && s.start <= o.end).count())
            .max()
            .unwrap_or(0);
        prop_assert_eq!(packing.band_count, depth);
    }

    #[test]
    fn accidental_stacking_ignores_input_order(
        requests in prop::collection::vec((-6..16i32, accidental()), 1..8),
        seed in any::<u64>(),
    ) {
        let metrics = StaffMetrics::new(8.0);
        let stacker = AccidentalStacker::new(&metrics, 4.0);
        let requests: Vec<AccidentalRequest> = requests
            .into_iter()
            .map(|(step, accidental)| AccidentalRequest { step, accidental })
            .collect();
        let mut shuffled = requests.clone();
        let len = shuffled.len();
        shuffled.rotate_left((seed as usize) % len);
        shuffled.reverse();

        let a = stacker.stack(&requests);
        let b = stacker.stack(&shuffled);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.width, a.column_count() as f64 * a.column_width);

        // Accidentals sharing a column never overlap vertically.
        for (i, p) in a.placed.iter().enumerate() {
            for q in &a.placed[i + 1..] {
                if p.column == q.column {
                    let reach = (p.rect.height() + q.rect.height()) / 2.0;
                    prop_assert!((p.rect.center().y - q.rect.center().y).abs() >= reach - 1e-9);
                }
            }
        }
    }

    #[test]
    fn rest_runs_cover_every_rest_measure(
        measures in 1..12u32,
        breaks in prop::collection::vec(any::<bool>(), 12),
    ) {
        let mut rests = rest_system(measures);
        for (bar, &split) in rests.barlines.iter_mut().zip(&breaks).skip(1) {
            if split {
                bar.time_signature = Some(TimeSignature { beats: 3, beat_type: 4 });
            }
        }
        let merged = merge_rests(&rests, &rests.staves[0]);

        // Lengths of the runs between breaks.
        let mut runs = vec![1usize];
        for m in 1..measures as usize {
            if breaks[m] {
                runs.push(1);
            } else if let Some(last) = runs.last_mut() {
                *last += 1;
            }
        }
        let expected: Vec<usize> = runs.iter().copied().filter(|&n| n >= 2).collect();
        let counts: Vec<usize> = merged.iter().map(|r| r.count).collect();
        prop_assert_eq!(&counts, &expected);

        let singles = runs.iter().filter(|&&n| n == 1).count();
        prop_assert_eq!(counts.iter().sum::<usize>() + singles, measures as usize);
    }

    #[test]
    fn connected_glyphs_span_their_width(
        kind in prop::sample::select(ConnectedKind::ALL.to_vec()),
        x in -100.0..100.0f64,
        width in 0.1..400.0f64,
    ) {
        let metrics = StaffMetrics::new(8.0);
        let builder = ConnectedGlyphBuilder::new(&metrics, 14.0, 9.0);
        let glyph = builder.build(kind, x, 7.0, width);
        prop_assert!(approx_eq!(f64, glyph.bounds.width(), width, epsilon = WIDTH_EPSILON));
        prop_assert!(approx_eq!(f64, glyph.bounds.min_x(), x, epsilon = WIDTH_EPSILON));
        prop_assert_eq!(glyph, builder.build(kind, x, 7.0, width));
    }
}
