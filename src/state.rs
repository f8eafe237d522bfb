//! Canvas item model and layout measurement.
//!
//! The engine never queries a live scene graph. Hosts hand it two things:
//! the current item set (ids, kinds, positions) and a [`LayoutProvider`]
//! that answers "what is the measured box of element X right now, if
//! any". [`LayoutCache`] is the bundled provider: a plain store the host
//! feeds from whatever renders the canvas.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{
    Point, Rect, Size, NODE_HEIGHT, NODE_WIDTH, STICKY_FALLBACK_HEIGHT, STICKY_WIDTH,
};

/// Identifier of a canvas item (node or sticky).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ItemId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// Identifier of an exit point on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExitId(pub Uuid);

impl ExitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ExitId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ExitId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// What kind of item occupies the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Node,
    Sticky,
}

/// One positioned item, as the host sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasItem {
    pub id: ItemId,
    pub kind: ItemKind,
    /// Top-left corner in canvas space.
    pub position: Point,
    /// Rendered content height for stickies; nodes leave this unset.
    #[serde(default)]
    pub content_height: Option<f32>,
}

impl CanvasItem {
    pub fn node(id: ItemId, position: Point) -> Self {
        Self {
            id,
            kind: ItemKind::Node,
            position,
            content_height: None,
        }
    }

    pub fn sticky(id: ItemId, position: Point, content_height: f32) -> Self {
        Self {
            id,
            kind: ItemKind::Sticky,
            position,
            content_height: Some(content_height),
        }
    }

    /// Footprint used when no measurement is available: nodes are a fixed
    /// 200 x 80, stickies 200 wide by their content height.
    pub fn default_size(&self) -> Size {
        match self.kind {
            ItemKind::Node => Size::new(NODE_WIDTH, NODE_HEIGHT),
            ItemKind::Sticky => Size::new(
                STICKY_WIDTH,
                self.content_height.unwrap_or(STICKY_FALLBACK_HEIGHT),
            ),
        }
    }
}

/// Exit descriptor as persisted by the host: an exit either dangles or
/// names the node it feeds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitDescriptor {
    pub id: ExitId,
    #[serde(default)]
    pub destination: Option<ItemId>,
}

/// Measurement seam between the engine and whatever renders the canvas.
///
/// `None` means "this element is not rendered (yet)"; callers that need a
/// usable anchor additionally treat zero-sized boxes as unmeasured via
/// [`measured_box`].
pub trait LayoutProvider {
    fn bounding_box(&self, id: Uuid) -> Option<Rect>;
}

/// Measured box of `id`, only when it has a usable extent.
pub fn measured_box(layout: &dyn LayoutProvider, id: Uuid) -> Option<Rect> {
    layout.bounding_box(id).filter(|rect| !rect.is_degenerate())
}

/// Box for an item at its current position: measured size when available,
/// default footprint otherwise.
pub fn bounding_box_for(item: &CanvasItem, layout: &dyn LayoutProvider) -> Rect {
    match measured_box(layout, item.id.0) {
        Some(rect) => Rect::from_position(item.position, rect.size()),
        None => Rect::from_position(item.position, item.default_size()),
    }
}

/// Topmost item under `point`, later items winning ties (paint order).
pub fn item_at<'a>(
    items: &'a [CanvasItem],
    layout: &dyn LayoutProvider,
    point: Point,
) -> Option<&'a CanvasItem> {
    items
        .iter()
        .rev()
        .find(|item| bounding_box_for(item, layout).contains(point))
}

/// Store of reported element boxes, usable directly as a
/// [`LayoutProvider`].
///
/// The host reports boxes as its renderer lays elements out and forgets
/// them on teardown; the engine only reads. Interior mutability keeps
/// reporting ergonomic through the shared handle the
/// [`Canvas`](crate::canvas::Canvas) holds; the crate is single-threaded
/// throughout.
#[derive(Debug, Default)]
pub struct LayoutCache {
    boxes: RefCell<HashMap<Uuid, Rect>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) the measured box for an element.
    pub fn report(&self, id: Uuid, rect: Rect) {
        self.boxes.borrow_mut().insert(id, rect);
    }

    /// Drop the measurement for an element that left the scene.
    pub fn forget(&self, id: Uuid) {
        self.boxes.borrow_mut().remove(&id);
    }

    /// Drop every measurement (canvas teardown).
    pub fn clear(&self) {
        self.boxes.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.boxes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.borrow().is_empty()
    }
}

impl LayoutProvider for LayoutCache {
    fn bounding_box(&self, id: Uuid) -> Option<Rect> {
        self.boxes.borrow().get(&id).copied()
    }
}
