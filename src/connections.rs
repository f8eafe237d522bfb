//! Connection management.
//!
//! This module provides [`ConnectionManager`], which owns every live
//! connection on a canvas: it batches creation requests, distributes
//! anchors along shared target faces, recomputes path geometry when
//! items move, and keeps the one-connection-per-exit invariant.
//!
//! # Example
//!
//! ```ignore
//! use flow_canvas::{Canvas, ConnectionManager, LayoutCache, ManualScheduler};
//! use std::rc::Rc;
//!
//! let layout = Rc::new(LayoutCache::new());
//! let canvas = Rc::new(Canvas::new(layout.clone(), Rc::new(ManualScheduler)));
//! let mut connections = ConnectionManager::new(canvas.clone());
//!
//! // Host-side: report element boxes as they render, then wire exits.
//! connections.register_source(exit_id, node_id);
//! connections.connect(node_id, exit_id, other_node_id);
//!
//! // End of tick (the scheduler asked for it): create whatever measures.
//! connections.flush();
//!
//! // Render: one routed path per connection.
//! for conn in connections.connections() {
//!     draw_path(&conn.geometry.commands);
//! }
//! ```

use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::canvas::Canvas;
use crate::events::CanvasEvent;
use crate::path::{choose_face, route, Face, PathGeometry};
use crate::schedule::FlushGate;
use crate::state::{measured_box, ExitDescriptor, ExitId, ItemId};

/// A connect request is retried across this many flushes before it is
/// dropped (endpoints may legitimately render a tick or two late).
pub const MAX_CONNECT_ATTEMPTS: u8 = 3;

/// Fraction of a face left unused at each end.
const ANCHOR_MARGIN_FRACTION: f32 = 0.2;

/// Fraction of a face that anchors spread across (the middle band).
const ANCHOR_SPAN_FRACTION: f32 = 0.6;

/// Why a queued connect request could not be satisfied this flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    #[error("source exit {0} has no measurable layout")]
    SourceUnmeasured(ExitId),
    #[error("target item {0} has no measurable layout")]
    TargetUnmeasured(ItemId),
}

/// A live connection from an exit to a target node, with its routed
/// visual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub source_exit: ExitId,
    /// Node owning the source exit.
    pub scope: ItemId,
    pub target: ItemId,
    /// Face of the target the connector currently enters.
    pub face: Face,
    pub geometry: PathGeometry,
    /// Render-with-removal-styling flag, set while the host hovers a
    /// detach affordance.
    pub removing: bool,
}

#[derive(Debug, Clone, Copy)]
struct RegisteredExit {
    scope: ItemId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingConnect {
    scope: ItemId,
    from: ExitId,
    to: ItemId,
    attempts: u8,
}

/// Owns connections and their visuals for one canvas.
///
/// [`connect`](Self::connect) only queues; the queue drains on
/// [`flush`](Self::flush), after the host's layout has settled for the
/// tick, so endpoint measurement sees current boxes. Everything else
/// mutates synchronously.
pub struct ConnectionManager {
    canvas: Rc<Canvas>,
    sources: IndexMap<ExitId, RegisteredExit>,
    connections: IndexMap<ExitId, Connection>,
    pending: Vec<PendingConnect>,
    gate: FlushGate,
}

impl ConnectionManager {
    pub fn new(canvas: Rc<Canvas>) -> Self {
        Self {
            canvas,
            sources: IndexMap::new(),
            connections: IndexMap::new(),
            pending: Vec::new(),
            gate: FlushGate::new(),
        }
    }

    // ------------------------------------------------------------------
    // Source registration
    // ------------------------------------------------------------------

    /// Register an exit as a drag source.
    ///
    /// No-op when the exit has no measurable layout yet; the host
    /// re-registers once the element renders. Re-registering a known id
    /// replaces the stale entry.
    pub fn register_source(&mut self, exit: ExitId, scope: ItemId) {
        if measured_box(self.canvas.layout(), exit.0).is_none() {
            debug!(%exit, "exit absent from layout; source registration skipped");
            return;
        }
        self.sources.insert(exit, RegisteredExit { scope });
    }

    /// Remove a registration. Returns false when the exit was unknown.
    pub fn unregister_source(&mut self, exit: ExitId) -> bool {
        self.sources.shift_remove(&exit).is_some()
    }

    pub fn is_registered(&self, exit: ExitId) -> bool {
        self.sources.contains_key(&exit)
    }

    /// Owning node of a registered exit.
    pub fn source_scope(&self, exit: ExitId) -> Option<ItemId> {
        self.sources.get(&exit).map(|entry| entry.scope)
    }

    // ------------------------------------------------------------------
    // Connection creation
    // ------------------------------------------------------------------

    /// Queue a connection from `from` (owned by `scope`) to `to`.
    ///
    /// Requests coalesce: queueing the same triple twice within one tick
    /// yields a single connection. The actual creation happens in
    /// [`flush`](Self::flush).
    pub fn connect(&mut self, scope: ItemId, from: ExitId, to: ItemId) {
        let duplicate = self
            .pending
            .iter()
            .any(|req| req.scope == scope && req.from == from && req.to == to);
        if duplicate {
            return;
        }
        self.pending.push(PendingConnect {
            scope,
            from,
            to,
            attempts: 0,
        });
        if self.gate.arm() {
            self.canvas.scheduler().request_flush();
        }
    }

    /// Queue a connect for every exit descriptor that names a
    /// destination (snapshot load).
    pub fn sync_from_exits(&mut self, scope: ItemId, exits: &[ExitDescriptor]) {
        for exit in exits {
            if let Some(destination) = exit.destination {
                self.connect(scope, exit.id, destination);
            }
        }
    }

    /// Drain the pending queue, creating whatever can be measured.
    ///
    /// Requests whose endpoints are still unmeasurable go back on the
    /// queue for a later flush; after [`MAX_CONNECT_ATTEMPTS`] tries they
    /// are dropped with a diagnostic log. Nothing propagates to the
    /// caller.
    pub fn flush(&mut self) {
        self.gate.disarm();
        let batch: Vec<PendingConnect> = self.pending.drain(..).collect();
        for mut request in batch {
            request.attempts += 1;
            match self.try_create(&request) {
                Ok(()) => {}
                Err(error) if request.attempts < MAX_CONNECT_ATTEMPTS => {
                    debug!(
                        exit = %request.from,
                        target = %request.to,
                        attempt = request.attempts,
                        %error,
                        "connection endpoints not measurable yet; retrying"
                    );
                    self.pending.push(request);
                }
                Err(error) => {
                    debug!(
                        exit = %request.from,
                        target = %request.to,
                        %error,
                        "connection request dropped after retries"
                    );
                }
            }
        }
        if !self.pending.is_empty() && self.gate.arm() {
            self.canvas.scheduler().request_flush();
        }
    }

    /// Number of requests still waiting for a flush.
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    fn try_create(&mut self, request: &PendingConnect) -> Result<(), ConnectError> {
        let canvas = Rc::clone(&self.canvas);
        let layout = canvas.layout();
        measured_box(layout, request.from.0)
            .ok_or(ConnectError::SourceUnmeasured(request.from))?;
        let target_box = measured_box(layout, request.to.0)
            .ok_or(ConnectError::TargetUnmeasured(request.to))?;

        // One connection per exit: a re-route replaces the old record,
        // and the old target's siblings spread back out.
        let mut stale_target = None;
        if let Some(old) = self.connections.shift_remove(&request.from) {
            if old.target != request.to {
                stale_target = Some(old.target);
            }
        }

        let config = *canvas.config();
        let placeholder = route(
            target_box.center(),
            target_box.center(),
            config.source_stub,
            config.target_stub,
            config.corner_radius,
            Face::Top,
        );
        self.connections.insert(
            request.from,
            Connection {
                source_exit: request.from,
                scope: request.scope,
                target: request.to,
                face: Face::Top,
                geometry: placeholder,
                removing: false,
            },
        );

        // Routing the whole target assigns the real face, the anchor
        // slot, and the geometry in one pass.
        self.reroute_target(request.to);
        if let Some(target) = stale_target {
            self.reroute_target(target);
        }

        canvas.events().emit(&CanvasEvent::ConnectionCreated {
            scope: request.scope,
            from: request.from,
            to: request.to,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Geometry maintenance
    // ------------------------------------------------------------------

    /// Recompute geometry for every connection touching `ids` (as scope,
    /// target, or source exit), plus every sibling sharing a target with
    /// one of those; anchor distribution must stay consistent across a
    /// whole face.
    ///
    /// Idempotent: re-running without layout changes recomputes the same
    /// geometry.
    pub fn revalidate(&mut self, ids: &[Uuid]) {
        let mut targets: Vec<ItemId> = Vec::new();
        for connection in self.connections.values() {
            let affected = ids.contains(&connection.scope.0)
                || ids.contains(&connection.target.0)
                || ids.contains(&connection.source_exit.0);
            if affected && !targets.contains(&connection.target) {
                targets.push(connection.target);
            }
        }
        for target in targets {
            self.reroute_target(target);
        }
    }

    /// Recompute every connection on the canvas.
    pub fn repaint_all(&mut self) {
        let mut targets: Vec<ItemId> = Vec::new();
        for connection in self.connections.values() {
            if !targets.contains(&connection.target) {
                targets.push(connection.target);
            }
        }
        for target in targets {
            self.reroute_target(target);
        }
    }

    /// Re-anchor and re-route every connection into `target`.
    ///
    /// Connections whose endpoints cannot be measured right now keep
    /// their last geometry; a later revalidation catches them up.
    fn reroute_target(&mut self, target: ItemId) {
        let canvas = Rc::clone(&self.canvas);
        let layout = canvas.layout();
        let target_box = match measured_box(layout, target.0) {
            Some(rect) => rect,
            None => {
                debug!(%target, "target not measurable; keeping stale connector geometry");
                return;
            }
        };
        let config = *canvas.config();

        // Gather measurable members, bucketed by entry face.
        let mut groups: IndexMap<Face, Vec<(ExitId, crate::geometry::Point)>> = IndexMap::new();
        for (exit, connection) in &self.connections {
            if connection.target != target {
                continue;
            }
            if let Some(exit_box) = measured_box(layout, exit.0) {
                let source = exit_box.center();
                let face = choose_face(source, &target_box, config.face_top_min_gap);
                groups.entry(face).or_default().push((*exit, source));
            }
        }

        for (face, mut members) in groups {
            // Anchor order follows the sources' spatial order along the
            // face axis, so connectors never cross at the boundary.
            members.sort_by(|a, b| face.spatial_key(a.1).total_cmp(&face.spatial_key(b.1)));
            let length = face.length_on(&target_box);
            let count = members.len();
            for (slot, (exit, source)) in members.into_iter().enumerate() {
                let along = length * ANCHOR_MARGIN_FRACTION
                    + length * ANCHOR_SPAN_FRACTION * ((slot as f32 + 0.5) / count as f32);
                let anchor = face.point_on(&target_box, along);
                let geometry = route(
                    source,
                    anchor,
                    config.source_stub,
                    config.target_stub,
                    config.corner_radius,
                    face,
                );
                if let Some(connection) = self.connections.get_mut(&exit) {
                    connection.face = face;
                    connection.geometry = geometry;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    /// Remove the connection leaving `exit`, if any. Siblings that shared
    /// its target spread back across the freed face.
    pub fn remove_connection(&mut self, exit: ExitId) -> bool {
        match self.connections.shift_remove(&exit) {
            Some(old) => {
                self.reroute_target(old.target);
                true
            }
            None => false,
        }
    }

    /// Remove every connection whose source exit belongs to `node`.
    /// Returns how many were removed.
    pub fn remove_outbound(&mut self, node: ItemId) -> usize {
        let exits: Vec<ExitId> = self
            .connections
            .values()
            .filter(|connection| connection.scope == node)
            .map(|connection| connection.source_exit)
            .collect();
        for exit in &exits {
            self.remove_connection(*exit);
        }
        exits.len()
    }

    /// Remove every connection into `node` (node teardown). Returns how
    /// many were removed.
    pub fn remove_inbound(&mut self, node: ItemId) -> usize {
        let before = self.connections.len();
        self.connections
            .retain(|_, connection| connection.target != node);
        before - self.connections.len()
    }

    /// Toggle removal styling on a connection's visual.
    pub fn set_removing_visual(&mut self, exit: ExitId, removing: bool) -> bool {
        match self.connections.get_mut(&exit) {
            Some(connection) => {
                connection.removing = removing;
                true
            }
            None => false,
        }
    }

    /// Tear down all connections, registrations, and queued work.
    pub fn reset(&mut self) {
        self.connections.clear();
        self.sources.clear();
        self.pending.clear();
        self.gate.disarm();
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn connection(&self, exit: ExitId) -> Option<&Connection> {
        self.connections.get(&exit)
    }

    /// Whether `exit` currently has an outbound connection.
    pub fn is_connected(&self, exit: ExitId) -> bool {
        self.connections.contains_key(&exit)
    }

    /// Live connections in creation order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
