//! Test harness wiring the full engine together.
//!
//! Plays the host application's part: owns the item model, feeds the
//! layout cache as elements "render", applies resolved moves back to
//! the model, and finalizes drags by hit-testing the drop point.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use flow_canvas::{
    bounding_box_for, item_at, CallbackScheduler, Canvas, CanvasItem, CollisionResolver,
    ConnectionManager, DragController, ExitId, ItemId, LayoutCache, LayoutProvider, Point, Rect,
    Size,
};

use super::EventRecorder;

/// Exit element bound to its owning item, so moving the item re-reports
/// the exit's box in the right spot.
struct ExitBinding {
    exit: ExitId,
    owner: ItemId,
    /// Top-left offset inside the owner's box.
    offset: Point,
    size: Size,
}

/// Full-engine harness: canvas, connections, drag, and collisions over a
/// host-owned item model, with every emitted event recorded.
pub struct CanvasHarness {
    pub layout: Rc<LayoutCache>,
    pub canvas: Rc<Canvas>,
    pub connections: Rc<RefCell<ConnectionManager>>,
    pub drag: RefCell<DragController>,
    pub resolver: CollisionResolver,
    pub recorder: EventRecorder,
    /// How many times the engine asked the host for a flush.
    pub flush_requests: Rc<Cell<u32>>,
    pub items: RefCell<Vec<CanvasItem>>,
    exits: RefCell<Vec<ExitBinding>>,
}

impl CanvasHarness {
    pub fn new() -> Self {
        let layout = Rc::new(LayoutCache::new());
        let flush_requests = Rc::new(Cell::new(0u32));
        let counter = flush_requests.clone();
        let scheduler = Rc::new(CallbackScheduler::new(move || {
            counter.set(counter.get() + 1);
        }));
        let canvas = Rc::new(Canvas::new(layout.clone(), scheduler));
        let connections = Rc::new(RefCell::new(ConnectionManager::new(canvas.clone())));
        let drag = RefCell::new(DragController::new(canvas.clone(), connections.clone()));
        let resolver = CollisionResolver::new(canvas.clone());
        let recorder = EventRecorder::new();
        recorder.attach(&canvas.events());

        Self {
            layout,
            canvas,
            connections,
            drag,
            resolver,
            recorder,
            flush_requests,
            items: RefCell::new(Vec::new()),
            exits: RefCell::new(Vec::new()),
        }
    }

    // === Item model ===

    /// Add a node and report its rendered box (default 200 x 80).
    pub fn add_node(&self, x: f32, y: f32) -> ItemId {
        let item = CanvasItem::node(ItemId::new(), Point::new(x, y));
        let id = item.id;
        self.report_item_box(&item);
        self.items.borrow_mut().push(item);
        id
    }

    /// Add a sticky note with the given content height.
    pub fn add_sticky(&self, x: f32, y: f32, content_height: f32) -> ItemId {
        let item = CanvasItem::sticky(ItemId::new(), Point::new(x, y), content_height);
        let id = item.id;
        self.report_item_box(&item);
        self.items.borrow_mut().push(item);
        id
    }

    /// Add a 16 x 16 exit element on `owner`'s bottom edge and register
    /// it as a connection source.
    pub fn add_exit(&self, owner: ItemId) -> ExitId {
        let exit = ExitId::new();
        self.bind_exit(exit, owner);
        exit
    }

    /// Insert a pre-built item (snapshot load) and report its box.
    pub fn insert_item(&self, item: CanvasItem) {
        self.report_item_box(&item);
        self.items.borrow_mut().push(item);
    }

    /// Bind a persisted exit id to `owner` at the standard spot and
    /// register it as a connection source.
    pub fn bind_exit(&self, exit: ExitId, owner: ItemId) {
        let binding = ExitBinding {
            exit,
            owner,
            offset: Point::new(92.0, 72.0),
            size: Size::new(16.0, 16.0),
        };
        self.report_exit_box(&binding);
        self.exits.borrow_mut().push(binding);
        self.connections.borrow_mut().register_source(exit, owner);
    }

    pub fn item(&self, id: ItemId) -> CanvasItem {
        self.items
            .borrow()
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .expect("item exists")
    }

    pub fn item_box(&self, id: ItemId) -> Rect {
        bounding_box_for(&self.item(id), self.canvas.layout())
    }

    /// Center of an item's box, handy as a drop or hover point.
    pub fn item_center(&self, id: ItemId) -> Point {
        self.item_box(id).center()
    }

    /// Center of an exit's reported box.
    pub fn exit_center(&self, exit: ExitId) -> Point {
        self.layout
            .bounding_box(exit.0)
            .expect("exit box reported")
            .center()
    }

    // === Host actions ===

    /// Move an item, re-report its (and its exits') boxes, and
    /// revalidate the connections the move touched.
    pub fn move_item(&self, id: ItemId, to: Point) {
        {
            let mut items = self.items.borrow_mut();
            let item = items
                .iter_mut()
                .find(|item| item.id == id)
                .expect("item exists");
            item.position = to;
        }
        let item = self.item(id);
        self.report_item_box(&item);

        let mut changed = vec![id.0];
        for binding in self.exits.borrow().iter() {
            if binding.owner == id {
                self.report_exit_box(binding);
                changed.push(binding.exit.0);
            }
        }
        self.connections.borrow_mut().revalidate(&changed);
    }

    /// Queue a connect request.
    pub fn connect(&self, scope: ItemId, from: ExitId, to: ItemId) {
        self.connections.borrow_mut().connect(scope, from, to);
    }

    /// Run the batched connect queue (the host's frame callback).
    pub fn flush(&self) {
        self.connections.borrow_mut().flush();
    }

    /// Finish a host move of `id`: resolve collisions and apply every
    /// resolved position back to the model.
    pub fn drop_item(&self, id: ItemId) {
        let moves = {
            let items = self.items.borrow();
            self.resolver.resolve(id, &items)
        };
        for (moved, to) in &moves {
            self.move_item(*moved, *to);
        }
    }

    // === Pointer protocol ===

    /// Press on an exit at its center.
    pub fn press_exit(&self, exit: ExitId) -> bool {
        let at = self.exit_center(exit);
        self.drag.borrow_mut().press(exit, at)
    }

    /// Press on a connection's arrowhead to re-route it.
    pub fn press_arrow(&self, exit: ExitId, at: Point) -> bool {
        self.drag.borrow_mut().press_arrow(exit, at)
    }

    pub fn motion(&self, to: Point) {
        self.drag.borrow_mut().motion(to);
    }

    /// Release at `at` and finalize like a host: when the pointer landed
    /// on an item, request the connection (flushing stays the host's
    /// call). Returns the hit item, if any.
    pub fn release(&self, at: Point) -> Option<ItemId> {
        let session = self.drag.borrow_mut().release(at)?;
        let target_id = {
            let items = self.items.borrow();
            item_at(&items, self.canvas.layout(), at)?.id
        };
        self.connect(session.scope, session.source_exit, target_id);
        Some(target_id)
    }

    // === Internals ===

    fn report_item_box(&self, item: &CanvasItem) {
        let rect = Rect::from_position(item.position, item.default_size());
        self.layout.report(item.id.0, rect);
    }

    fn report_exit_box(&self, binding: &ExitBinding) {
        let owner = self.item(binding.owner);
        let rect = Rect::new(
            owner.position.x + binding.offset.x,
            owner.position.y + binding.offset.y,
            binding.size.width,
            binding.size.height,
        );
        self.layout.report(binding.exit.0, rect);
    }
}

impl Default for CanvasHarness {
    fn default() -> Self {
        Self::new()
    }
}
