//! Surface tests — pushing layouts to the SVG preview surface.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use scorelayout::*;

/// Every group on the surface holds exactly the result's items for it.
fn assert_mirrors(surface: &SvgSurface, result: &LayoutResult) {
    let mut expected = Vec::new();
    for index in 0..result.systems.len() {
        expected.extend(result.groups_of(index));
    }
    let groups: Vec<GroupKey> = surface.groups().collect();
    assert_eq!(groups, expected);
    for group in expected {
        assert_eq!(surface.items(group), result.group_items(group).as_slice());
    }
}

#[test]
fn render_document_to_svg_produces_a_document() {
    let svg = render_document_to_svg(&sample_score(), &LayoutConfig::default()).unwrap();
    assert!(svg.starts_with("<svg"), "Output should be SVG");
    assert!(svg.trim_end().ends_with("</svg>"), "SVG should be closed");
    assert!(svg.contains("<line"), "SVG should contain staff lines");
    assert!(svg.contains("C&amp;G"), "Chord names should be escaped");
    assert!(svg.contains("Moderato"));
    assert!(!svg.contains("C&G"));
}

#[test]
fn present_pushes_every_group() {
    let score = sample_score();
    let mut engine = ScoreLayoutEngine::new(LayoutConfig::default());
    engine.render_document(&score).unwrap();
    let mut surface = SvgSurface::default();
    engine.present(&mut surface);
    assert_mirrors(&surface, engine.layout().unwrap());
}

#[test]
fn present_change_matches_full_present() {
    let score = sample_score();
    let mut engine = ScoreLayoutEngine::new(LayoutConfig::default());
    engine.render_document(&score).unwrap();
    let mut surface = SvgSurface::default();
    engine.present(&mut surface);

    // Replace a one-staff system with a two-staff one.
    let mut edited = score.clone();
    edited.systems[1] = busy_system();
    let change = engine.update_system(&edited, 1).unwrap();
    engine.present_change(&change, &mut surface);
    assert_mirrors(&surface, engine.layout().unwrap());

    // And back again, dropping the extra staff group.
    let change = engine.update_system(&score, 1).unwrap();
    engine.present_change(&change, &mut surface);
    assert_mirrors(&surface, engine.layout().unwrap());
    assert!(surface.items(GroupKey::Staff(1, 1)).is_empty());
}

#[test]
fn hit_test_finds_the_staff_under_a_line() {
    let score = sample_score();
    let mut engine = ScoreLayoutEngine::new(LayoutConfig::default());
    let result = engine.render_document(&score).unwrap().clone();
    let mut surface = SvgSurface::new(result.width, result.height);
    engine.present(&mut surface);

    let system = &result.systems[2];
    let staff = &system.staves[0];
    let point = system.to_page(Point::new(system.width - 1.0, staff.line_y(2)));
    assert_eq!(surface.hit_test(point), vec![GroupKey::Staff(2, 0)]);
}
