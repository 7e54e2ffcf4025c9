//! Gesture handlers.
//!
//! Each handler is a pure function from the current state and one event to
//! the next state. Gesture handlers (drag, transform, connect) always
//! receive the state at gesture start, so every tick is derived from the
//! same base.

pub mod add;
pub mod connect;
pub mod delete;
pub mod drag;
pub mod group;
pub mod order;
pub mod paste;
pub mod select;
pub mod style;
pub mod transform;

pub use add::AddEvent;
pub use connect::{ConnectEvent, ConnectShapesEvent, ConnectTarget};
pub use delete::DeleteEvent;
pub use drag::DragEvent;
pub use group::{GroupEvent, UngroupEvent};
pub use order::{ReorderEvent, StackOrder};
pub use paste::{PasteEvent, PastePayload};
pub use select::{SelectAreaEvent, SelectEvent};
pub use style::{StyleEvent, ToggleAutoRoutingEvent};
pub use transform::TransformEvent;

use crate::config::EditorConfig;
use crate::connect::RouteOptions;
use crate::error::EditorResult;
use crate::geometry::Frame;
use crate::registry::TypeRegistry;
use crate::shapes::{Diagram, DiagramId};
use kurbo::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier shared by every event of one gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Position of an event within its gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPhase {
    Started,
    InProgress,
    Ended,
}

/// Kinds of multi-event gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    Drag,
    Transform,
    Connect,
}

/// Transform frame spanning a multi-selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiSelectGroup {
    pub frame: Frame,
    pub source_ids: Vec<DiagramId>,
}

/// Everything a handler reads and produces.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EditorState {
    pub items: Vec<Diagram>,
    #[serde(default)]
    pub multi_select: Option<MultiSelectGroup>,
}

impl EditorState {
    pub fn new(items: Vec<Diagram>) -> Self {
        Self {
            items,
            multi_select: None,
        }
    }

    pub fn with_items(&self, items: Vec<Diagram>) -> Self {
        Self {
            items,
            multi_select: self.multi_select.clone(),
        }
    }
}

/// Read-only collaborators passed into every handler call.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    pub registry: &'a TypeRegistry,
    pub config: &'a EditorConfig,
    /// World distance auto-scrolled during the current drag.
    pub scroll_offset: Vec2,
}

impl<'a> HandlerContext<'a> {
    pub fn new(registry: &'a TypeRegistry, config: &'a EditorConfig) -> Self {
        Self {
            registry,
            config,
            scroll_offset: Vec2::ZERO,
        }
    }

    pub fn route_options(&self) -> RouteOptions {
        RouteOptions {
            margin: self.config.connect_margin,
            bend_penalty: self.config.bend_penalty,
        }
    }
}

/// Result of a handler.
pub type HandlerResult = EditorResult<EditorState>;

/// Every event the editor accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CanvasEvent {
    Drag(DragEvent),
    Transform(TransformEvent),
    Connect(ConnectEvent),
    ConnectShapes(ConnectShapesEvent),
    Group(GroupEvent),
    Ungroup(UngroupEvent),
    Delete(DeleteEvent),
    Paste(PasteEvent),
    Reorder(ReorderEvent),
    Select(SelectEvent),
    SelectArea(SelectAreaEvent),
    SelectAll { event_id: EventId },
    ClearSelection { event_id: EventId },
    Add(AddEvent),
    SetStyle(StyleEvent),
    ToggleAutoRouting(ToggleAutoRoutingEvent),
}

impl CanvasEvent {
    pub fn event_id(&self) -> EventId {
        match self {
            CanvasEvent::Drag(e) => e.event_id,
            CanvasEvent::Transform(e) => e.event_id,
            CanvasEvent::Connect(e) => e.event_id,
            CanvasEvent::ConnectShapes(e) => e.event_id,
            CanvasEvent::Group(e) => e.event_id,
            CanvasEvent::Ungroup(e) => e.event_id,
            CanvasEvent::Delete(e) => e.event_id,
            CanvasEvent::Paste(e) => e.event_id,
            CanvasEvent::Reorder(e) => e.event_id,
            CanvasEvent::Select(e) => e.event_id,
            CanvasEvent::SelectArea(e) => e.event_id,
            CanvasEvent::SelectAll { event_id } => *event_id,
            CanvasEvent::ClearSelection { event_id } => *event_id,
            CanvasEvent::Add(e) => e.event_id,
            CanvasEvent::SetStyle(e) => e.event_id,
            CanvasEvent::ToggleAutoRouting(e) => e.event_id,
        }
    }

    /// Phase of the event; discrete events are complete gestures.
    pub fn phase(&self) -> EventPhase {
        match self {
            CanvasEvent::Drag(e) => e.phase,
            CanvasEvent::Transform(e) => e.phase,
            CanvasEvent::Connect(e) => e.phase,
            _ => EventPhase::Ended,
        }
    }

    pub fn gesture_kind(&self) -> Option<GestureKind> {
        match self {
            CanvasEvent::Drag(_) => Some(GestureKind::Drag),
            CanvasEvent::Transform(_) => Some(GestureKind::Transform),
            CanvasEvent::Connect(_) => Some(GestureKind::Connect),
            _ => None,
        }
    }

    /// Copy of the event with a different phase. Discrete events are unchanged.
    pub fn with_phase(&self, phase: EventPhase) -> Self {
        let mut event = self.clone();
        match &mut event {
            CanvasEvent::Drag(e) => e.phase = phase,
            CanvasEvent::Transform(e) => e.phase = phase,
            CanvasEvent::Connect(e) => e.phase = phase,
            _ => {}
        }
        event
    }
}

/// Route an event to its handler.
pub fn apply(state: &EditorState, event: &CanvasEvent, ctx: &HandlerContext) -> HandlerResult {
    match event {
        CanvasEvent::Drag(e) => drag::handle(state, e, ctx),
        CanvasEvent::Transform(e) => transform::handle(state, e, ctx),
        CanvasEvent::Connect(e) => connect::handle(state, e, ctx),
        CanvasEvent::ConnectShapes(e) => connect::handle_connect_shapes(state, e, ctx),
        CanvasEvent::Group(e) => group::handle_group(state, e, ctx),
        CanvasEvent::Ungroup(e) => group::handle_ungroup(state, e, ctx),
        CanvasEvent::Delete(e) => delete::handle(state, e, ctx),
        CanvasEvent::Paste(e) => paste::handle(state, e, ctx),
        CanvasEvent::Reorder(e) => order::handle(state, e, ctx),
        CanvasEvent::Select(e) => select::handle_select(state, e, ctx),
        CanvasEvent::SelectArea(e) => select::handle_select_area(state, e, ctx),
        CanvasEvent::SelectAll { .. } => Ok(select::select_all(state)),
        CanvasEvent::ClearSelection { .. } => Ok(select::clear(state)),
        CanvasEvent::Add(e) => add::handle(state, e, ctx),
        CanvasEvent::SetStyle(e) => style::handle_set_style(state, e, ctx),
        CanvasEvent::ToggleAutoRouting(e) => style::handle_toggle_auto_routing(state, e, ctx),
    }
}
