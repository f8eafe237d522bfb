//! Typed event channel between the engine and its host.
//!
//! Every outward signal is one variant of [`CanvasEvent`]; hosts
//! subscribe closures on the shared [`EventBus`]. Emission is synchronous
//! and single-threaded, matching the rest of the crate: by the time an
//! `emit` call returns, every subscriber has run.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::geometry::Point;
use crate::state::{ExitId, ItemId};

/// Everything the engine reports back to its host.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    /// A batched connect request succeeded; the host persists the wiring.
    ConnectionCreated {
        scope: ItemId,
        from: ExitId,
        to: ItemId,
    },
    /// A pointer drag crossed the movement threshold and became a live
    /// connection drag.
    DragStarted {
        source_exit: ExitId,
        scope: ItemId,
        original_target: Option<ItemId>,
    },
    /// A connection drag ended. The engine has already dropped the ghost;
    /// the host decides whether the pointer landed somewhere connectable
    /// and calls `connect` back if so.
    DragAborted {
        source_exit: ExitId,
        scope: ItemId,
        original_target: Option<ItemId>,
    },
    /// A drop was resolved against the other items; every entry is an
    /// item the host must move.
    PositionsResolved { moves: IndexMap<ItemId, Point> },
}

type Listener = Rc<dyn Fn(&CanvasEvent)>;

/// Handle for removing a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

/// Shared, clonable event channel.
///
/// Clones share one listener registry (`Rc` interior). Subscribers may
/// subscribe or unsubscribe from inside a callback; emission works from a
/// snapshot, so such changes take effect from the next event on.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every subsequent event.
    pub fn subscribe(&self, listener: impl Fn(&CanvasEvent) + 'static) -> SubscriptionId {
        let mut registry = self.inner.borrow_mut();
        registry.next_id += 1;
        let id = SubscriptionId(registry.next_id);
        registry.listeners.push((id, Rc::new(listener)));
        id
    }

    /// Remove a listener. Returns false when the id was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.inner.borrow_mut();
        let before = registry.listeners.len();
        registry.listeners.retain(|(sub, _)| *sub != id);
        registry.listeners.len() != before
    }

    /// Deliver an event to every current subscriber, in subscription
    /// order.
    pub fn emit(&self, event: &CanvasEvent) {
        let snapshot: Vec<Listener> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}
