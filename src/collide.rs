//! Post-drop collision resolution.
//!
//! When the host finishes moving an item it hands the drop to
//! [`CollisionResolver::resolve`], which pushes every overlapped
//! neighbor out of the way and cascades until the canvas is clean. The
//! dropped item itself is pinned where the user put it; displaced items
//! go right, or down when that is clearly the shorter push and the item
//! already sits below the one displacing it. Every resolved position is
//! snapped up to the layout grid and kept on-canvas (non-negative).
//!
//! Resolution is pure bookkeeping: the resolver reads item positions
//! and measured boxes, returns the map of required moves, and emits
//! [`CanvasEvent::PositionsResolved`] so the host can persist them.

use std::collections::VecDeque;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::canvas::Canvas;
use crate::events::CanvasEvent;
use crate::geometry::{snap_up, Point, Rect};
use crate::state::{bounding_box_for, measured_box, CanvasItem, ItemId};

/// True when two boxes overlap with positive area. Boxes that only share
/// an edge or a corner do not collide.
pub fn has_collision(a: &Rect, b: &Rect) -> bool {
    a.overlaps(b)
}

/// Resolves item overlap after a drop by displacing neighbors.
pub struct CollisionResolver {
    canvas: Rc<Canvas>,
}

impl CollisionResolver {
    pub fn new(canvas: Rc<Canvas>) -> Self {
        Self { canvas }
    }

    /// Current box of an item: measured size when the renderer has one,
    /// default footprint otherwise.
    pub fn bounding_box_for(&self, item: &CanvasItem) -> Rect {
        bounding_box_for(item, self.canvas.layout())
    }

    /// Ids of every other item whose box overlaps `item`'s.
    pub fn find_collisions(&self, item: &CanvasItem, items: &[CanvasItem]) -> Vec<ItemId> {
        let own = self.bounding_box_for(item);
        items
            .iter()
            .filter(|other| other.id != item.id)
            .filter(|other| has_collision(&own, &self.bounding_box_for(other)))
            .map(|other| other.id)
            .collect()
    }

    /// Resolve overlap after `dropped` lands among `items`.
    ///
    /// Walks outward from the dropped item, displacing each collider and
    /// re-checking displaced items in turn until no pair overlaps. The
    /// dropped item never moves; when a displaced item runs back into
    /// it, the displaced item yields again.
    ///
    /// Returns the positions items must move to (the dropped item never
    /// appears). A non-empty result is also emitted as
    /// [`CanvasEvent::PositionsResolved`].
    pub fn resolve(&self, dropped: ItemId, items: &[CanvasItem]) -> IndexMap<ItemId, Point> {
        let mut moves: IndexMap<ItemId, Point> = IndexMap::new();
        if !items.iter().any(|item| item.id == dropped) {
            debug!(%dropped, "dropped item not in item set; nothing to resolve");
            return moves;
        }

        let mut queue: VecDeque<ItemId> = VecDeque::new();
        queue.push_back(dropped);

        while let Some(pivot_id) = queue.pop_front() {
            loop {
                let Some(pivot) = items.iter().find(|item| item.id == pivot_id) else {
                    break;
                };
                let pivot_box = self.working_box(pivot, &moves);
                let Some(collider) = items.iter().find(|other| {
                    other.id != pivot_id
                        && has_collision(&pivot_box, &self.working_box(other, &moves))
                }) else {
                    break;
                };

                // The dropped item is pinned: when a displaced item runs
                // into it, the displaced item moves again instead.
                let (mover, fixed_box) = if collider.id == dropped {
                    (pivot, self.working_box(collider, &moves))
                } else {
                    (collider, pivot_box)
                };
                let mover_box = self.working_box(mover, &moves);
                let moved_to = displaced_position(&mover_box, &fixed_box);
                moves.insert(mover.id, moved_to);
                queue.push_back(mover.id);
            }
        }

        if !moves.is_empty() {
            self.canvas.events().emit(&CanvasEvent::PositionsResolved {
                moves: moves.clone(),
            });
        }
        moves
    }

    /// Box of `item` with any already-resolved move applied.
    fn working_box(&self, item: &CanvasItem, moves: &IndexMap<ItemId, Point>) -> Rect {
        let position = moves.get(&item.id).copied().unwrap_or(item.position);
        let size = match measured_box(self.canvas.layout(), item.id.0) {
            Some(rect) => rect.size(),
            None => item.default_size(),
        };
        Rect::from_position(position, size)
    }
}

/// Where `mover` lands when pushed off `fixed`.
///
/// The push goes right by default. It goes down only when that
/// displacement is strictly shorter and `mover`'s center already sits
/// below `fixed`'s, so items are never pushed up over the thing that
/// displaced them. The pushed edge clears the fixed box exactly to the
/// next grid line; the retained coordinate is likewise snapped up so
/// resolved items always land on the grid, on-canvas.
fn displaced_position(mover: &Rect, fixed: &Rect) -> Point {
    let pushed_left = snap_up(fixed.right().max(0.0));
    let pushed_top = snap_up(fixed.bottom().max(0.0));
    let right_disp = pushed_left - mover.left;
    let down_disp = pushed_top - mover.top;

    if down_disp < right_disp && mover.center().y > fixed.center().y {
        Point::new(snap_up(mover.left.max(0.0)), pushed_top)
    } else {
        Point::new(pushed_left, snap_up(mover.top.max(0.0)))
    }
}
