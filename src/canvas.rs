//! The shared canvas context.
//!
//! Every component (connection manager, drag controller, collision
//! resolver) is constructed against one [`Canvas`]: the injected
//! [`LayoutProvider`], the typed [`EventBus`], the host's
//! [`FlushScheduler`], and the tuning knobs in [`CanvasConfig`]. Nothing
//! in the crate reaches for globals; hosts can run several canvases side
//! by side.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::events::EventBus;
use crate::geometry::GRID_SIZE;
use crate::path::FACE_TOP_MIN_GAP;
use crate::schedule::FlushScheduler;
use crate::state::LayoutProvider;

/// Tuning knobs for routing and interaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Item placement grid step.
    pub grid_size: f32,
    /// Length of the downward stub a connector exits with.
    pub source_stub: f32,
    /// Straight approach reserved outside the target face for the
    /// arrowhead.
    pub target_stub: f32,
    /// Requested corner radius for connector bends.
    pub corner_radius: f32,
    /// Pointer travel (in layout units) before a press becomes a drag.
    pub drag_threshold: f32,
    /// Minimum vertical gap for a connector to enter the top face.
    pub face_top_min_gap: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            source_stub: 20.0,
            target_stub: 12.0,
            corner_radius: 8.0,
            drag_threshold: 5.0,
            face_top_min_gap: FACE_TOP_MIN_GAP,
        }
    }
}

/// Explicitly owned context passed into every component constructor.
pub struct Canvas {
    layout: Rc<dyn LayoutProvider>,
    scheduler: Rc<dyn FlushScheduler>,
    events: EventBus,
    config: CanvasConfig,
}

impl Canvas {
    pub fn new(layout: Rc<dyn LayoutProvider>, scheduler: Rc<dyn FlushScheduler>) -> Self {
        Self::with_config(layout, scheduler, CanvasConfig::default())
    }

    pub fn with_config(
        layout: Rc<dyn LayoutProvider>,
        scheduler: Rc<dyn FlushScheduler>,
        config: CanvasConfig,
    ) -> Self {
        Self {
            layout,
            scheduler,
            events: EventBus::new(),
            config,
        }
    }

    pub fn layout(&self) -> &dyn LayoutProvider {
        self.layout.as_ref()
    }

    /// Shared handle to the layout provider, for components that keep
    /// their own reference.
    pub fn layout_handle(&self) -> Rc<dyn LayoutProvider> {
        Rc::clone(&self.layout)
    }

    pub fn scheduler(&self) -> &dyn FlushScheduler {
        self.scheduler.as_ref()
    }

    /// The canvas-wide event channel (clonable handle).
    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }
}
