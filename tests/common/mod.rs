//! Common test utilities for integration tests.

#![allow(dead_code)]

pub mod harness;

use std::cell::RefCell;
use std::rc::Rc;

use flow_canvas::{CanvasEvent, EventBus, ExitId, ItemId, Point};
use indexmap::IndexMap;

/// Records engine events for assertions.
///
/// Each field keeps the payloads of the corresponding [`CanvasEvent`]
/// variant in emission order. Clones share the same logs.
#[derive(Default, Clone)]
pub struct EventRecorder {
    /// (scope, from, to)
    pub created: Rc<RefCell<Vec<(ItemId, ExitId, ItemId)>>>,
    /// (source_exit, scope, original_target)
    pub drag_started: Rc<RefCell<Vec<(ExitId, ItemId, Option<ItemId>)>>>,
    /// (source_exit, scope, original_target)
    pub drag_aborted: Rc<RefCell<Vec<(ExitId, ItemId, Option<ItemId>)>>>,
    /// One move map per resolution
    pub positions_resolved: Rc<RefCell<Vec<IndexMap<ItemId, Point>>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe this recorder to an event bus.
    pub fn attach(&self, events: &EventBus) {
        let recorder = self.clone();
        events.subscribe(move |event| match event {
            CanvasEvent::ConnectionCreated { scope, from, to } => {
                recorder.created.borrow_mut().push((*scope, *from, *to));
            }
            CanvasEvent::DragStarted {
                source_exit,
                scope,
                original_target,
            } => {
                recorder
                    .drag_started
                    .borrow_mut()
                    .push((*source_exit, *scope, *original_target));
            }
            CanvasEvent::DragAborted {
                source_exit,
                scope,
                original_target,
            } => {
                recorder
                    .drag_aborted
                    .borrow_mut()
                    .push((*source_exit, *scope, *original_target));
            }
            CanvasEvent::PositionsResolved { moves } => {
                recorder.positions_resolved.borrow_mut().push(moves.clone());
            }
        });
    }

    /// Clear all recorded events.
    pub fn clear(&self) {
        self.created.borrow_mut().clear();
        self.drag_started.borrow_mut().clear();
        self.drag_aborted.borrow_mut().clear();
        self.positions_resolved.borrow_mut().clear();
    }
}
