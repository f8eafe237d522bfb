//! # Flow Canvas
//!
//! A renderer-agnostic engine for node-graph canvases: orthogonal
//! connector routing, batched connection management, drag-to-connect
//! pointer handling, and post-drop collision resolution.
//!
//! ## Features
//!
//! - **Pure Routing** - Deterministic SVG-style path strings from plain
//!   geometry, no scene-graph access
//! - **Host-Driven Layout** - The engine reads measured boxes through a
//!   [`LayoutProvider`]; any renderer can feed it
//! - **Batched Connections** - Connect requests coalesce per frame and
//!   retry while layout settles
//! - **Pointer Protocol** - Press / motion / release state machine with a
//!   live ghost connector
//! - **Cascading Collisions** - Drops displace neighbors onto the grid
//!   until nothing overlaps
//!
//! ## Quick Start
//!
//! ```rust
//! use flow_canvas::{Canvas, ConnectionManager, LayoutCache, ManualScheduler};
//! use std::rc::Rc;
//!
//! let layout = Rc::new(LayoutCache::new());
//! let canvas = Rc::new(Canvas::new(layout.clone(), Rc::new(ManualScheduler)));
//! let connections = ConnectionManager::new(canvas.clone());
//! assert!(connections.is_empty());
//! // Report element boxes as the renderer lays them out, then connect,
//! // flush once per frame, and react to the emitted events.
//! ```
//!
//! ## Core Components
//!
//! - [`Canvas`] - Shared context: layout access, config, events, scheduling
//! - [`ConnectionManager`] - Registered exits, batched creation, anchor
//!   distribution, rerouting
//! - [`DragController`] - Pointer state machine for drag-to-connect
//! - [`CollisionResolver`] - Post-drop displacement cascade
//! - [`route`] / [`choose_face`] - The pure routing layer underneath it all

pub mod canvas;
pub mod collide;
pub mod connections;
pub mod drag;
pub mod events;
pub mod geometry;
pub mod path;
pub mod schedule;
pub mod state;

// Re-export the engine surface
pub use canvas::{Canvas, CanvasConfig};
pub use collide::{has_collision, CollisionResolver};
pub use connections::{Connection, ConnectionManager, ConnectError, MAX_CONNECT_ATTEMPTS};
pub use drag::{ghost_path, DragController, DragSession, DragState};
pub use events::{CanvasEvent, EventBus, SubscriptionId};
pub use geometry::{snap_round, snap_up, Point, Rect, Size, GRID_SIZE};
pub use path::{choose_face, route, ArrowDirection, Face, PathGeometry};
pub use schedule::{CallbackScheduler, FlushGate, FlushScheduler, ManualScheduler};
pub use state::{
    bounding_box_for, item_at, measured_box, CanvasItem, ExitDescriptor, ExitId, ItemId, ItemKind,
    LayoutCache, LayoutProvider,
};
