//! Create a node from the type registry.

use super::select::select_ids;
use super::{EditorState, EventId, HandlerContext, HandlerResult};
use crate::shapes::DiagramType;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddEvent {
    pub event_id: EventId,
    pub diagram_type: DiagramType,
    /// Center of the new node.
    pub position: Point,
    /// Falls back to the configured default size.
    #[serde(default)]
    pub size: Option<Size>,
}

/// Append a new node on top and select it alone.
pub fn handle(state: &EditorState, event: &AddEvent, ctx: &HandlerContext) -> HandlerResult {
    let size = event.size.unwrap_or(ctx.config.default_shape_size);
    let Some(node) = ctx.registry.create(event.diagram_type, event.position, size)? else {
        log::warn!("{} cannot be created directly", event.diagram_type);
        return Ok(state.clone());
    };
    let node = ctx.registry.refresh_connect_points(&node);
    let id = node.id();
    let mut items = state.items.clone();
    items.push(node);
    log::debug!("Added {} {id}", event.diagram_type);
    Ok(select_ids(&items, &[id]))
}
