//! The rendering surface the layout result is pushed to.

use serde::Serialize;

use crate::geometry::Point;
use crate::items::PlacedItem;

/// Parent node owning a set of drawables on the surface.
///
/// System-level items (brackets, system symbols) live under `System(i)`;
/// each staff's items live under `Staff(i, j)`, so one system can be
/// replaced as a unit after a partial relayout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum GroupKey {
    System(usize),
    Staff(usize, usize),
}

impl GroupKey {
    pub fn system(self) -> usize {
        match self {
            GroupKey::System(i) | GroupKey::Staff(i, _) => i,
        }
    }

    /// Paint-order key: systems in score order, then staves in system order.
    pub fn paint_order(self) -> (usize, Option<usize>) {
        match self {
            GroupKey::System(i) => (i, None),
            GroupKey::Staff(i, j) => (i, Some(j)),
        }
    }
}

/// An external 2-D scene accepting positioned items.
pub trait RenderSurface {
    /// Remove every item.
    fn clear(&mut self);

    /// Remove every item owned by `group`.
    fn remove_group(&mut self, group: GroupKey);

    /// Add an item (in page coordinates) under `group`.
    fn add_item(&mut self, group: GroupKey, item: &PlacedItem);

    /// Groups owning an item whose bounds contain `point`, topmost first.
    fn hit_test(&self, point: Point) -> Vec<GroupKey>;
}
