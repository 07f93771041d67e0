//! Score layout engine.
//!
//! Computes the geometry of every system of a score and pushes the result
//! to a [`RenderSurface`]. Layout works in two passes per system: a
//! planning pass (staff metrics, accidental stacks, multi-measure rests)
//! whose widths feed the shared [`PositionGrid`](grid::PositionGrid), then
//! a drawing pass per staff and for the system symbol area.

pub mod accidentals;
pub mod band_packer;
pub mod connected;
pub(crate) mod constants;
pub mod grid;
pub mod multi_rest;
pub mod staff;
pub mod staff_geometry;
pub mod symbols;
pub mod system;
pub mod validate;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;

use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::font::{GlyphMetrics, ScaledMetrics, StaffMetrics};
use crate::geometry::Rect;
use crate::items::PlacedItem;
use crate::model::{Caret, Score, System};
use crate::surface::{GroupKey, RenderSurface};
use constants::CARET_PADDING;
use system::SystemRenderer;
use validate::{validate_line_spacing, validate_score, validate_system};

pub use staff::StaffLayout;
pub use system::{BarlinePlacement, SystemLayout};

// ═══════════════════════════════════════════════════════════════════════
// Result types
// ═══════════════════════════════════════════════════════════════════════

/// Geometry of a whole score.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutResult {
    pub systems: Vec<SystemLayout>,
    /// Page extent including margins
    pub width: f64,
    pub height: f64,
}

impl LayoutResult {
    pub fn system(&self, index: usize) -> Option<&SystemLayout> {
        self.systems.get(index)
    }

    /// Items owned by `group`, in page coordinates.
    pub fn group_items(&self, group: GroupKey) -> Vec<PlacedItem> {
        let Some(system) = self.systems.get(group.system()) else {
            return Vec::new();
        };
        let items = match group {
            GroupKey::System(_) => Some(&system.items),
            GroupKey::Staff(_, j) => system.staves.get(j).map(|s| &s.items),
        };
        items
            .into_iter()
            .flatten()
            .map(|item| item.translated(system.left, system.top))
            .collect()
    }

    /// Every group of `index`, system group first.
    pub fn groups_of(&self, index: usize) -> Vec<GroupKey> {
        let staves = self.systems.get(index).map_or(0, |s| s.staves.len());
        std::iter::once(GroupKey::System(index))
            .chain((0..staves).map(|j| GroupKey::Staff(index, j)))
            .collect()
    }
}

/// Serialise a layout result as pretty-printed JSON.
pub fn layout_to_json(result: &LayoutResult) -> Result<String, LayoutError> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// What a layout call changed, for incremental surface updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutChange {
    /// Every system was replaced.
    Full,
    /// Only system `index` was recomputed; `moved` systems kept their
    /// geometry but changed page offset.
    System {
        index: usize,
        /// Staff count of the replaced system, for removing its groups
        previous_staff_count: usize,
        moved: Vec<usize>,
    },
}

// ═══════════════════════════════════════════════════════════════════════
// Per-pass context
// ═══════════════════════════════════════════════════════════════════════

/// Ratio of the score's line spacing to the configured one.
fn scale_factor(config: &LayoutConfig, line_spacing: f64) -> f64 {
    if config.line_spacing > 0.0 {
        line_spacing / config.line_spacing
    } else {
        1.0
    }
}

/// Metrics and sizes of one layout pass, scaled to the score's line spacing.
pub(crate) struct LayoutContext<'a> {
    pub(crate) metrics: &'a dyn GlyphMetrics,
    pub(crate) config: &'a LayoutConfig,
    pub(crate) line_spacing: f64,
    scale: f64,
}

impl<'a> LayoutContext<'a> {
    pub(crate) fn new(
        metrics: &'a dyn GlyphMetrics,
        config: &'a LayoutConfig,
        line_spacing: f64,
    ) -> Self {
        let scale = scale_factor(config, line_spacing);
        Self {
            metrics,
            config,
            line_spacing,
            scale,
        }
    }

    pub(crate) fn tab_line_spacing(&self) -> f64 {
        self.config.tab_line_spacing * self.scale
    }

    pub(crate) fn band_height(&self) -> f64 {
        self.config.band_height * self.scale
    }

    pub(crate) fn text_size(&self) -> f64 {
        self.config.text_size * self.scale
    }

    pub(crate) fn system_text_size(&self) -> f64 {
        self.config.system_text_size * self.scale
    }

    pub(crate) fn staff_spacing(&self) -> f64 {
        self.config.staff_spacing * self.scale
    }

    /// A system's own spacing is taken as is.
    pub(crate) fn position_spacing(&self, system: &System) -> f64 {
        system
            .position_spacing
            .unwrap_or(self.config.position_spacing * self.scale)
    }

    pub(crate) fn min_position_spacing(&self) -> f64 {
        self.config.min_position_spacing * self.scale
    }
}

// ═══════════════════════════════════════════════════════════════════════
// ScoreLayoutEngine
// ═══════════════════════════════════════════════════════════════════════

/// Handle for requesting a full relayout from elsewhere. Requests made
/// before the next [`ScoreLayoutEngine::refresh`] collapse into one pass.
#[derive(Debug, Clone)]
pub struct RedrawHandle(Arc<AtomicBool>);

impl RedrawHandle {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Owns the current layout of a score and keeps it up to date.
pub struct ScoreLayoutEngine {
    config: LayoutConfig,
    metrics: Box<dyn GlyphMetrics>,
    result: Option<LayoutResult>,
    caret: Caret,
    redraw: Arc<AtomicBool>,
}

impl ScoreLayoutEngine {
    /// Engine using the built-in staff-space metrics.
    pub fn new(config: LayoutConfig) -> Self {
        let metrics = Box::new(StaffMetrics::new(config.line_spacing));
        Self::with_metrics(config, metrics)
    }

    /// Engine measuring glyphs with `metrics`, which should be expressed at
    /// the configured line spacing.
    pub fn with_metrics(config: LayoutConfig, metrics: Box<dyn GlyphMetrics>) -> Self {
        Self {
            config,
            metrics,
            result: None,
            caret: Caret::default(),
            redraw: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// The most recent layout, if any pass has run.
    pub fn layout(&self) -> Option<&LayoutResult> {
        self.result.as_ref()
    }

    /// Lay out every system of `score`, replacing the previous result.
    pub fn render_document(&mut self, score: &Score) -> Result<&LayoutResult, LayoutError> {
        self.config.validate()?;
        validate_score(score)?;

        let mut systems: Vec<SystemLayout> = score
            .systems
            .iter()
            .enumerate()
            .map(|(i, system)| self.layout_system(score, i, system))
            .collect();
        let (width, height) = stack_systems(&self.config, &mut systems);
        info!(systems = systems.len(), width, height; "Laid out score");

        Ok(self.result.insert(LayoutResult {
            systems,
            width,
            height,
        }))
    }

    /// Recompute system `index` only. Falls back to a full pass when there
    /// is no previous layout or the number of systems changed.
    pub fn update_system(&mut self, score: &Score, index: usize) -> Result<LayoutChange, LayoutError> {
        let count = score.systems.len();
        if index >= count {
            return Err(LayoutError::InvalidIndex { index, count });
        }
        let matches = self
            .result
            .as_ref()
            .is_some_and(|r| r.systems.len() == count);
        if !matches {
            debug!(index; "No compatible layout, running a full pass");
            self.render_document(score)?;
            return Ok(LayoutChange::Full);
        }

        self.config.validate()?;
        validate_line_spacing(score.line_spacing)?;
        validate_system(index, &score.systems[index])?;

        let layout = self.layout_system(score, index, &score.systems[index]);
        let Some(result) = self.result.as_mut() else {
            return Ok(LayoutChange::Full);
        };
        let previous_tops: Vec<f64> = result.systems.iter().map(|s| s.top).collect();
        let previous_staff_count = std::mem::replace(&mut result.systems[index], layout)
            .staves
            .len();
        let (width, height) = stack_systems(&self.config, &mut result.systems);
        result.width = width;
        result.height = height;

        let moved = result
            .systems
            .iter()
            .zip(&previous_tops)
            .enumerate()
            .skip(index + 1)
            .filter(|(_, (s, top))| s.top != **top)
            .map(|(i, _)| i)
            .collect();
        debug!(index, previous_staff_count, moved:? = moved; "Updated system");

        Ok(LayoutChange::System {
            index,
            previous_staff_count,
            moved,
        })
    }

    fn layout_system(&self, score: &Score, index: usize, system: &System) -> SystemLayout {
        let line_spacing = score.line_spacing.unwrap_or(self.config.line_spacing);
        let metrics = ScaledMetrics::new(
            self.metrics.as_ref(),
            scale_factor(&self.config, line_spacing),
        );
        let ctx = LayoutContext::new(&metrics, &self.config, line_spacing);
        SystemRenderer::new(&ctx).render(index, system)
    }

    // ── Redraw requests ──────────────────────────────────────────────

    /// Mark the layout stale; the next [`refresh`](Self::refresh) runs one
    /// full pass however many requests arrived.
    pub fn request_full_redraw(&self) {
        self.redraw.store(true, Ordering::SeqCst);
    }

    pub fn redraw_handle(&self) -> RedrawHandle {
        RedrawHandle(Arc::clone(&self.redraw))
    }

    /// Run a full pass if one was requested. Returns whether it ran.
    pub fn refresh(&mut self, score: &Score) -> Result<bool, LayoutError> {
        if !self.redraw.swap(false, Ordering::SeqCst) {
            return Ok(false);
        }
        self.render_document(score)?;
        Ok(true)
    }

    // ── Caret ────────────────────────────────────────────────────────

    pub fn caret(&self) -> Caret {
        self.caret
    }

    pub fn set_caret(&mut self, caret: Caret) {
        self.caret = caret;
    }

    /// Page rectangle highlighting the caret's position on its staff.
    pub fn caret_highlight(&self) -> Option<Rect> {
        let caret = self.caret;
        let system = self.result.as_ref()?.systems.get(caret.system)?;
        let staff = system.staves.get(caret.staff)?;
        let x = system.grid.x(caret.position);
        let half = system.grid.spacing / 2.0;
        let top = staff.line_y(0) - CARET_PADDING;
        let bottom = staff.line_y(staff.data.line_count.saturating_sub(1)) + CARET_PADDING;
        Some(
            Rect::new(x - half, top, system.grid.spacing, bottom - top)
                .translate(system.left, system.top),
        )
    }

    // ── Surface ──────────────────────────────────────────────────────

    /// Replace everything on `surface` with the current layout.
    pub fn present(&self, surface: &mut impl RenderSurface) {
        surface.clear();
        if let Some(result) = &self.result {
            for index in 0..result.systems.len() {
                push_system(result, index, surface);
            }
        }
    }

    /// Push only what `change` touched.
    pub fn present_change(&self, change: &LayoutChange, surface: &mut impl RenderSurface) {
        let Some(result) = &self.result else {
            return;
        };
        match change {
            LayoutChange::Full => self.present(surface),
            LayoutChange::System {
                index,
                previous_staff_count,
                moved,
            } => {
                surface.remove_group(GroupKey::System(*index));
                for j in 0..*previous_staff_count {
                    surface.remove_group(GroupKey::Staff(*index, j));
                }
                push_system(result, *index, surface);
                for &i in moved {
                    for group in result.groups_of(i) {
                        surface.remove_group(group);
                    }
                    push_system(result, i, surface);
                }
            }
        }
    }
}

fn push_system(result: &LayoutResult, index: usize, surface: &mut impl RenderSurface) {
    for group in result.groups_of(index) {
        for item in result.group_items(group) {
            surface.add_item(group, &item);
        }
    }
}

/// Assign page offsets top to bottom and return the page extent. Full and
/// partial passes both go through here so their offsets agree exactly.
fn stack_systems(config: &LayoutConfig, systems: &mut [SystemLayout]) -> (f64, f64) {
    let mut top = config.margin_top;
    let mut width: f64 = 0.0;
    for (i, system) in systems.iter_mut().enumerate() {
        if i > 0 {
            top += config.system_spacing;
        }
        system.top = top;
        system.left = config.margin_left;
        top += system.height;
        width = width.max(config.margin_left * 2.0 + system.width);
    }
    (width, top + config.margin_top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Position, Staff};
    use pretty_assertions::assert_eq;

    fn score(systems: usize) -> Score {
        let system = |width: f64| {
            let mut staff = Staff::tablature(6);
            staff.positions = (0..4)
                .map(|index| Position {
                    index,
                    ..Position::default()
                })
                .collect();
            System {
                width,
                staves: vec![staff],
                ..System::default()
            }
        };
        Score {
            systems: (0..systems).map(|i| system(400.0 + i as f64)).collect(),
            line_spacing: None,
        }
    }

    #[test]
    fn systems_stack_with_spacing() {
        let config = LayoutConfig::default();
        let mut engine = ScoreLayoutEngine::new(config.clone());
        let result = engine.render_document(&score(3)).unwrap();
        assert_eq!(result.systems[0].top, config.margin_top);
        let second = &result.systems[1];
        assert_eq!(
            second.top,
            config.margin_top + result.systems[0].height + config.system_spacing
        );
    }

    #[test]
    fn update_without_layout_runs_full_pass() {
        let mut engine = ScoreLayoutEngine::new(LayoutConfig::default());
        let change = engine.update_system(&score(2), 1).unwrap();
        assert_eq!(change, LayoutChange::Full);
        assert_eq!(engine.layout().map(|r| r.systems.len()), Some(2));
    }

    #[test]
    fn redraw_requests_coalesce() {
        let doc = score(1);
        let mut engine = ScoreLayoutEngine::new(LayoutConfig::default());
        let handle = engine.redraw_handle();
        handle.request();
        engine.request_full_redraw();
        assert!(handle.is_pending());
        assert!(engine.refresh(&doc).unwrap());
        assert!(!engine.refresh(&doc).unwrap());
        assert!(!handle.is_pending());
    }

    #[test]
    fn caret_highlight_follows_position() {
        let mut engine = ScoreLayoutEngine::new(LayoutConfig::default());
        assert_eq!(engine.caret_highlight(), None);
        engine.render_document(&score(1)).unwrap();
        engine.set_caret(Caret {
            position: 2,
            ..Caret::default()
        });
        let rect = engine.caret_highlight().unwrap();
        let system = &engine.layout().unwrap().systems[0];
        assert!((rect.center().x - (system.left + system.grid.x(2))).abs() < 1e-9);
        assert!(rect.height() > 0.0);
    }

    #[test]
    fn json_export_names_systems() {
        let mut engine = ScoreLayoutEngine::new(LayoutConfig::default());
        let result = engine.render_document(&score(1)).unwrap();
        let json = layout_to_json(result).unwrap();
        assert!(json.contains("\"systems\""));
    }
}
