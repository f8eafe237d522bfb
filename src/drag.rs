//! Drag-to-connect pointer protocol.
//!
//! [`DragController`] turns raw pointer events into connection drags. It
//! sits on top of a shared [`ConnectionManager`]: a press on a free exit
//! arms a pending drag, movement past the threshold promotes it to a
//! live session with a ghost connector, and release hands the outcome to
//! the host. The controller never persists anything: on release it
//! emits [`CanvasEvent::DragAborted`] and the host decides, from
//! whatever sits under the pointer, whether to call `connect` back.
//!
//! # Example
//!
//! ```ignore
//! use flow_canvas::{Canvas, ConnectionManager, DragController};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let connections = Rc::new(RefCell::new(ConnectionManager::new(canvas.clone())));
//! let mut drag = DragController::new(canvas.clone(), connections.clone());
//!
//! // Pointer wiring (host event loop):
//! drag.press(exit_id, pointer);
//! drag.motion(pointer);            // once per pointer-move
//! if let Some(session) = drag.release(pointer) {
//!     // Host-side: hit-test the pointer and finalize if it landed on a node.
//!     if let Some(target) = item_under_pointer {
//!         connections.borrow_mut().connect(session.scope, session.source_exit, target);
//!     }
//! }
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::canvas::{Canvas, CanvasConfig};
use crate::connections::ConnectionManager;
use crate::events::CanvasEvent;
use crate::geometry::Point;
use crate::path::{route, ArrowDirection, Face, PathGeometry};
use crate::state::{measured_box, ExitId, ItemId};

/// One in-flight connection drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub source_exit: ExitId,
    /// Node owning the source exit.
    pub scope: ItemId,
    /// Prior target when the drag re-routes an existing connection;
    /// `None` for a fresh drag from a free exit.
    pub original_target: Option<ItemId>,
    /// Last reported pointer position.
    pub pointer: Point,
}

/// Where the pointer protocol currently stands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    /// Pressed on a free exit but still under the movement threshold; a
    /// release from here is a plain click.
    Pending {
        exit: ExitId,
        scope: ItemId,
        pressed_at: Point,
    },
    Dragging(DragSession),
}

/// Pointer-event state machine for creating and re-routing connections.
///
/// All methods are synchronous and re-entrancy free: they are meant to
/// be called from the host's pointer callbacks, one event at a time.
pub struct DragController {
    canvas: Rc<Canvas>,
    connections: Rc<RefCell<ConnectionManager>>,
    state: DragState,
    /// Center of the source exit's measured box, refreshed while
    /// dragging so the ghost stays pinned to the live element.
    anchor: Option<Point>,
    ghost: Option<PathGeometry>,
}

impl DragController {
    pub fn new(canvas: Rc<Canvas>, connections: Rc<RefCell<ConnectionManager>>) -> Self {
        Self {
            canvas,
            connections,
            state: DragState::Idle,
            anchor: None,
            ghost: None,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, DragState::Idle)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// The live session while in `Dragging`.
    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Dragging(session) => Some(session),
            _ => None,
        }
    }

    /// Temporary connector from the source exit to the pointer, present
    /// only while dragging (and only while the exit is measurable).
    pub fn ghost(&self) -> Option<&PathGeometry> {
        self.ghost.as_ref()
    }

    // ------------------------------------------------------------------
    // Pointer events
    // ------------------------------------------------------------------

    /// Pointer-down on a free exit: arm a pending drag.
    ///
    /// Returns false (and stays put) when the exit is not registered as
    /// a source, already carries a connection (re-routes go through
    /// [`press_arrow`](Self::press_arrow)), or a drag is already under
    /// way.
    pub fn press(&mut self, exit: ExitId, at: Point) -> bool {
        if !self.is_idle() {
            return false;
        }
        let connections = self.connections.borrow();
        let Some(scope) = connections.source_scope(exit) else {
            debug!(%exit, "press on unregistered exit ignored");
            return false;
        };
        if connections.is_connected(exit) {
            debug!(%exit, "press on connected exit ignored; expected press_arrow");
            return false;
        }
        drop(connections);
        self.state = DragState::Pending {
            exit,
            scope,
            pressed_at: at,
        };
        true
    }

    /// Pointer-down on an existing connection's arrowhead: re-route.
    ///
    /// The connection's visual is removed immediately (its former
    /// siblings spread back out over the freed face) and a session opens
    /// with `original_target` set to the prior target; no movement
    /// threshold applies. Returns false when `exit` has no connection or
    /// a drag is already under way.
    pub fn press_arrow(&mut self, exit: ExitId, at: Point) -> bool {
        if !self.is_idle() {
            return false;
        }
        let mut connections = self.connections.borrow_mut();
        let Some(connection) = connections.connection(exit).cloned() else {
            debug!(%exit, "press_arrow without a connection ignored");
            return false;
        };
        connections.remove_connection(exit);
        drop(connections);
        self.begin_drag(exit, connection.scope, Some(connection.target), at);
        true
    }

    /// Pointer moved. Promotes `Pending` to `Dragging` once the pointer
    /// travels past the configured threshold; while dragging, tracks the
    /// pointer and recomputes the ghost. Safe to call on every move.
    pub fn motion(&mut self, at: Point) {
        match self.state {
            DragState::Idle => {}
            DragState::Pending {
                exit,
                scope,
                pressed_at,
            } => {
                let threshold = self.canvas.config().drag_threshold;
                if pressed_at.dist_sq(at) > threshold * threshold {
                    self.begin_drag(exit, scope, None, at);
                }
            }
            DragState::Dragging(mut session) => {
                session.pointer = at;
                self.state = DragState::Dragging(session);
                self.refresh_ghost();
            }
        }
    }

    /// Pointer released.
    ///
    /// A pending press collapses to a no-op click (nothing emitted; the
    /// host interprets the click). A live drag tears its ghost down,
    /// emits [`CanvasEvent::DragAborted`], and returns the final session
    /// so the host can finalize against whatever the pointer landed on.
    pub fn release(&mut self, at: Point) -> Option<DragSession> {
        match self.state {
            DragState::Idle => None,
            DragState::Pending { .. } => {
                self.state = DragState::Idle;
                None
            }
            DragState::Dragging(mut session) => {
                session.pointer = at;
                self.state = DragState::Idle;
                self.anchor = None;
                self.ghost = None;
                self.canvas.events().emit(&CanvasEvent::DragAborted {
                    source_exit: session.source_exit,
                    scope: session.scope,
                    original_target: session.original_target,
                });
                Some(session)
            }
        }
    }

    /// Silent teardown of any pending or live drag. No event fires; the
    /// ghost and session are simply discarded.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
        self.anchor = None;
        self.ghost = None;
    }

    /// Full teardown: abort any drag silently, then reset the shared
    /// connection manager (connections, registrations, queued work).
    pub fn reset(&mut self) {
        self.cancel();
        self.connections.borrow_mut().reset();
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn begin_drag(
        &mut self,
        exit: ExitId,
        scope: ItemId,
        original_target: Option<ItemId>,
        pointer: Point,
    ) {
        self.anchor = measured_box(self.canvas.layout(), exit.0).map(|rect| rect.center());
        self.state = DragState::Dragging(DragSession {
            source_exit: exit,
            scope,
            original_target,
            pointer,
        });
        self.refresh_ghost();
        self.canvas.events().emit(&CanvasEvent::DragStarted {
            source_exit: exit,
            scope,
            original_target,
        });
    }

    fn refresh_ghost(&mut self) {
        let DragState::Dragging(session) = self.state else {
            self.ghost = None;
            return;
        };
        // Re-measure so the ghost follows the exit if layout shifts
        // mid-drag; an exit that vanished keeps its last anchor.
        if let Some(rect) = measured_box(self.canvas.layout(), session.source_exit.0) {
            self.anchor = Some(rect.center());
        }
        self.ghost = self
            .anchor
            .map(|anchor| ghost_path(anchor, session.pointer, self.canvas.config()));
    }
}

/// Route the ghost connector from `anchor` to `pointer`.
///
/// A pointer at or below the anchor gets the ordinary top-face route
/// (arrow pointing down at the pointer). Above the anchor the same
/// shape is routed in reverse, pointer down to anchor, and presented
/// with the arrow flipped up, so the arrowhead never renders upside
/// down.
pub fn ghost_path(anchor: Point, pointer: Point, config: &CanvasConfig) -> PathGeometry {
    if pointer.y >= anchor.y {
        route(
            anchor,
            pointer,
            config.source_stub,
            config.target_stub,
            config.corner_radius,
            Face::Top,
        )
    } else {
        let reversed = route(
            pointer,
            anchor,
            config.source_stub,
            config.target_stub,
            config.corner_radius,
            Face::Top,
        );
        PathGeometry {
            commands: reversed.commands,
            end: pointer,
            arrow: ArrowDirection::Up,
        }
    }
}
