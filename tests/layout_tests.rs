//! Layout tests — full and partial passes over small documents.

mod common;

use common::*;
use float_cmp::approx_eq;
use pretty_assertions::assert_eq;
use scorelayout::*;

fn engine() -> ScoreLayoutEngine {
    ScoreLayoutEngine::new(LayoutConfig::default())
}

fn text_bounds(items: &[PlacedItem], label: &str) -> Option<Rect> {
    items.iter().find_map(|item| match &item.drawable {
        Drawable::Text { text, .. } if text == label => Some(item.bounds),
        _ => None,
    })
}

fn curve_count(items: &[PlacedItem]) -> usize {
    items
        .iter()
        .filter(|item| matches!(item.drawable, Drawable::Curve { .. }))
        .count()
}

fn texts(items: &[PlacedItem]) -> Vec<&str> {
    items
        .iter()
        .filter_map(|item| match &item.drawable {
            Drawable::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════
// Scenarios
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn overlapping_accidentals_step_one_width_left() {
    let pitches = [Pitch::new(Step::F, 4, 1), Pitch::new(Step::G, 4, 1)];
    let score = Score {
        systems: vec![system(
            vec![
                treble_staff(vec![pitched_position(0, &pitches)]),
                tab_staff(vec![tab_position(0, &[(0, 2), (1, 4)])]),
            ],
            vec![Barline::at(0)],
        )],
        line_spacing: None,
    };
    let mut engine = engine();
    let result = engine.render_document(&score).unwrap();
    let staff = &result.systems[0].staves[0];
    let stack = &staff.accidentals[&0];
    let sharp = StaffMetrics::new(LayoutConfig::default().line_spacing).glyph_size(Glyph::Sharp);

    assert_eq!(stack.placed.len(), 2);
    let (low, high) = (&stack.placed[0], &stack.placed[1]);
    assert_eq!((low.column, high.column), (0, 1));
    assert!(approx_eq!(
        f64,
        low.rect.max_x() - high.rect.max_x(),
        sharp.width,
        epsilon = 1e-9
    ));

    // Vertical centres stay on their staff steps.
    let step_height = staff.data.line_spacing / 2.0;
    for placed in [low, high] {
        assert!(approx_eq!(
            f64,
            placed.rect.center().y,
            -(placed.step as f64) * step_height,
            epsilon = 1e-9
        ));
    }
    assert!((low.rect.center().y - high.rect.center().y).abs() >= step_height - 1e-9);

    // The drawn glyphs follow the stack, and the grid made room for it.
    let xs: Vec<f64> = staff
        .items
        .iter()
        .filter_map(|item| match &item.drawable {
            Drawable::Glyph {
                glyph: Glyph::Sharp,
                at,
            } => Some(at.x),
            _ => None,
        })
        .collect();
    assert_eq!(xs.len(), 2);
    assert!(approx_eq!(f64, (xs[0] - xs[1]).abs(), sharp.width, epsilon = 1e-9));
    let grid = &result.systems[0].grid;
    assert!(grid.x(0) - grid.slot_start(0) > stack.width + grid.spacing / 2.0);
}

#[test]
fn rest_runs_split_at_time_change() {
    let mut rests = rest_system(6);
    rests.barlines[4].time_signature = Some(TimeSignature {
        beats: 3,
        beat_type: 4,
    });
    let score = Score {
        systems: vec![rests],
        line_spacing: None,
    };
    let mut engine = engine();
    let result = engine.render_document(&score).unwrap();
    let staff = &result.systems[0].staves[0];

    let counts: Vec<usize> = staff.multi_rests.iter().map(|r| r.count).collect();
    assert_eq!(counts, vec![4, 2]);
    assert_eq!(staff.hidden_barlines, vec![1, 2, 3, 5]);
    let labels = texts(&staff.items);
    assert!(labels.contains(&"4") && labels.contains(&"2"), "{labels:?}");
    // No ordinary rest glyph is left behind.
    assert!(!staff.items.iter().any(|item| matches!(
        item.drawable,
        Drawable::Glyph {
            glyph: Glyph::Rest(_),
            ..
        }
    )));
}

#[test]
fn single_measure_rest_stays_a_rest() {
    let score = Score {
        systems: vec![rest_system(1)],
        line_spacing: None,
    };
    let mut engine = engine();
    let staff = &engine.render_document(&score).unwrap().systems[0].staves[0];
    assert!(staff.multi_rests.is_empty());
    assert!(staff.items.iter().any(|item| matches!(
        item.drawable,
        Drawable::Glyph {
            glyph: Glyph::Rest(Duration::Whole),
            ..
        }
    )));
}

#[test]
fn repeat_end_shows_play_count() {
    let score = Score {
        systems: vec![busy_system()],
        line_spacing: None,
    };
    let mut engine = engine();
    let result = engine.render_document(&score).unwrap();
    for staff in &result.systems[0].staves {
        assert!(texts(&staff.items).contains(&"x3"));
    }
}

#[test]
fn annotations_open_bands() {
    let score = Score {
        systems: vec![busy_system()],
        line_spacing: None,
    };
    let mut engine = engine();
    let system = &engine.render_document(&score).unwrap().systems[0];
    let tab = &system.staves[1];
    assert!(tab.above_bands >= 1);
    assert!(tab.below_bands >= 1);
    assert!(system.symbol_bands >= 2);
    // Staves are stacked below the symbol area.
    assert!(system.staves[0].top > 0.0);
    assert!(tab.top >= system.staves[0].top + system.staves[0].height());
}

#[test]
fn repeat_count_clears_let_ring() {
    let mut positions: Vec<Position> = (0..8).map(|i| tab_position(i, &[(1, 3)])).collect();
    for position in &mut positions[3..=5] {
        position.let_ring = true;
    }
    let mut repeat = Barline::at(4);
    repeat.style = BarlineStyle::RepeatEnd;
    repeat.repeat_count = 3;
    let score = Score {
        systems: vec![system(vec![tab_staff(positions)], vec![Barline::at(0), repeat])],
        line_spacing: None,
    };
    let mut engine = engine();
    let staff = &engine.render_document(&score).unwrap().systems[0].staves[0];

    let count = text_bounds(&staff.items, "x3").unwrap();
    let let_ring = text_bounds(&staff.items, "let ring").unwrap();
    assert!(!count.intersects(let_ring), "{count:?} overlaps {let_ring:?}");
    assert_eq!(staff.above_bands, 2);
    // Both sit above the top string.
    assert!(count.max_y() <= staff.line_y(0));
    assert!(let_ring.max_y() <= staff.line_y(0));
}

#[test]
fn rest_count_sits_in_a_band() {
    let score = Score {
        systems: vec![rest_system(3)],
        line_spacing: None,
    };
    let mut engine = engine();
    let staff = &engine.render_document(&score).unwrap().systems[0].staves[0];
    assert_eq!(staff.above_bands, 1);
    let count = text_bounds(&staff.items, "3").unwrap();
    assert!(count.max_y() <= staff.line_y(0));
}

#[test]
fn ties_only_join_neighbouring_positions() {
    let e4 = Pitch::new(Step::E, 4, 0);
    let g4 = Pitch::new(Step::G, 4, 0);
    let ties = |pitches: [Pitch; 3]| {
        let mut positions: Vec<Position> = (0..3)
            .map(|i| pitched_position(i, &[pitches[i as usize]]))
            .collect();
        positions[2].notes[0].tied = true;
        let score = Score {
            systems: vec![system(vec![treble_staff(positions)], vec![Barline::at(0)])],
            line_spacing: None,
        };
        let mut engine = engine();
        let result = engine.render_document(&score).unwrap();
        curve_count(&result.systems[0].staves[0].items)
    };
    assert_eq!(ties([e4, g4, e4]), 0);
    assert_eq!(ties([g4, e4, e4]), 1);
}

#[test]
fn tab_picking_and_legato_marks_go_below() {
    let mut positions: Vec<Position> = (0..4).map(|i| tab_position(i, &[(2, 5)])).collect();
    positions[0].notes[0].hammer_on = true;
    positions[2].pick_stroke = Some(PickStroke::Up);
    positions[3].tap = true;
    let mut guitar = tab_staff(positions);
    guitar.dynamics = vec![Dynamic {
        position: 3,
        volume: Volume::Ff,
    }];
    let score = Score {
        systems: vec![system(vec![guitar], vec![Barline::at(0)])],
        line_spacing: None,
    };
    let mut engine = engine();
    let result = engine.render_document(&score).unwrap();
    let staff = &result.systems[0].staves[0];
    let bottom = staff.line_y(staff.data.line_count - 1);

    assert_eq!(staff.above_bands, 0);
    // The tap and the dynamic share position 3, so they take two bands.
    assert_eq!(staff.below_bands, 2);
    for label in ["H", "T", "ff"] {
        let bounds = text_bounds(&staff.items, label).unwrap();
        assert!(bounds.min_y() >= bottom, "{label} at {bounds:?}");
    }
    // The hammer-on label is centred between the notes it joins.
    let grid = &result.systems[0].grid;
    let h = text_bounds(&staff.items, "H").unwrap();
    assert!(approx_eq!(f64, h.center().x, (grid.x(0) + grid.x(1)) / 2.0, epsilon = 1e-9));
    assert_eq!(curve_count(&staff.items), 1);
}

#[test]
fn trill_shows_wave_and_trilled_fret() {
    let mut positions: Vec<Position> = (0..3).map(|i| tab_position(i, &[(0, 5)])).collect();
    positions[1].trill = Some(7);
    let score = Score {
        systems: vec![system(vec![tab_staff(positions)], vec![Barline::at(0)])],
        line_spacing: None,
    };
    let mut engine = engine();
    let staff = &engine.render_document(&score).unwrap().systems[0].staves[0];
    let labels = texts(&staff.items);
    assert!(labels.contains(&"tr") && labels.contains(&"(7)"), "{labels:?}");
    let fret = text_bounds(&staff.items, "(7)").unwrap();
    assert!(approx_eq!(f64, fret.center().y, staff.line_y(0), epsilon = 1e-9));
}

// ═══════════════════════════════════════════════════════════════════════
// Engine behaviour
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn full_layout_is_idempotent() {
    let score = sample_score();
    let mut engine = engine();
    let first = engine.render_document(&score).unwrap().clone();
    let second = engine.render_document(&score).unwrap();
    assert_eq!(&first, second);
}

#[test]
fn partial_layout_matches_full_layout() {
    let score = sample_score();
    let mut engine = engine();
    engine.render_document(&score).unwrap();

    let mut edited = score.clone();
    edited.systems[1] = busy_system();
    let change = engine.update_system(&edited, 1).unwrap();
    assert_eq!(
        change,
        LayoutChange::System {
            index: 1,
            previous_staff_count: 1,
            moved: vec![2],
        }
    );

    let mut fresh = ScoreLayoutEngine::new(LayoutConfig::default());
    let expected = fresh.render_document(&edited).unwrap();
    assert_eq!(engine.layout(), Some(expected));
}

#[test]
fn invalid_index_changes_nothing() {
    let score = sample_score();
    let mut engine = engine();
    engine.render_document(&score).unwrap();
    let before = engine.layout().cloned();

    let err = engine.update_system(&score, 3).unwrap_err();
    assert!(matches!(err, LayoutError::InvalidIndex { index: 3, count: 3 }));
    assert_eq!(engine.layout().cloned(), before);
}

#[test]
fn inconsistent_staff_is_rejected_before_layout() {
    let score = sample_score();
    let mut engine = engine();
    engine.render_document(&score).unwrap();
    let before = engine.layout().cloned();

    let mut broken = score.clone();
    broken.systems[2].staves[0].line_count = 2;
    let err = engine.update_system(&broken, 2).unwrap_err();
    assert!(matches!(
        err,
        LayoutError::InconsistentGeometry {
            system: 2,
            staff: 0,
            ..
        }
    ));
    assert!(engine.render_document(&broken).is_err());
    assert_eq!(engine.layout().cloned(), before);
}

#[test]
fn empty_staves_and_systems_lay_out() {
    let score = Score {
        systems: vec![System::default(), system(vec![tab_staff(Vec::new())], Vec::new())],
        line_spacing: None,
    };
    let mut engine = engine();
    let result = engine.render_document(&score).unwrap();
    assert!(result.systems[0].staves.is_empty());
    assert_eq!(result.systems[0].height, 0.0);

    let staff = &result.systems[1].staves[0];
    let lines = staff
        .items
        .iter()
        .filter(|item| matches!(item.drawable, Drawable::Line { .. }))
        .count();
    // Six strings plus the closing barline.
    assert_eq!(lines, 7);
    assert_eq!(staff.above_bands + staff.below_bands, 0);
}

#[test]
fn score_line_spacing_scales_staves() {
    let mut score = Score {
        systems: vec![busy_system()],
        line_spacing: None,
    };
    let mut engine = engine();
    let normal = engine.render_document(&score).unwrap().systems[0].height;

    score.line_spacing = Some(16.0);
    let result = engine.render_document(&score).unwrap();
    let system = &result.systems[0];
    assert_eq!(system.staves[0].data.line_spacing, 16.0);
    assert_eq!(system.staves[1].data.line_spacing, 18.0);
    assert!(system.height > normal);
}

#[test]
fn redraw_requests_from_another_thread_coalesce() {
    let score = sample_score();
    let mut engine = engine();
    let handle = engine.redraw_handle();
    std::thread::spawn(move || {
        for _ in 0..5 {
            handle.request();
        }
    })
    .join()
    .unwrap();

    assert!(engine.refresh(&score).unwrap());
    assert!(engine.layout().is_some());
    assert!(!engine.refresh(&score).unwrap());
}

#[test]
fn config_loads_from_partial_json() {
    let config = LayoutConfig::from_json(r#"{ "band_height": 20.0 }"#).unwrap();
    assert_eq!(config.band_height, 20.0);
    assert_eq!(config.line_spacing, LayoutConfig::default().line_spacing);
    assert!(matches!(
        LayoutConfig::from_json(r#"{ "line_spacing": -1.0 }"#),
        Err(LayoutError::Config(_))
    ));
}

#[test]
fn documents_round_trip_through_json() {
    let score = sample_score();
    let json = score_to_json(&score).unwrap();
    assert_eq!(score_from_json(&json).unwrap(), score);
}
