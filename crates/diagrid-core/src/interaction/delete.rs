//! Delete nodes and everything that depended on them.

use super::{EditorState, EventId, HandlerContext, HandlerResult};
use crate::error::EditorError;
use crate::shapes::DiagramId;
use crate::tree::{cleanup_groups, find, remove_dangling_lines, remove_where};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteEvent {
    pub event_id: EventId,
    /// Node to delete; `None` deletes the selection.
    #[serde(default)]
    pub target: Option<DiagramId>,
}

/// Remove the target (or every selected node), then the lines attached to
/// removed shapes, then collapse groups left with fewer than two children.
pub fn handle(state: &EditorState, event: &DeleteEvent, _ctx: &HandlerContext) -> HandlerResult {
    let removed = match event.target {
        Some(id) => {
            find(&state.items, id).ok_or(EditorError::DiagramNotFound(id))?;
            remove_where(&state.items, |node| node.id() == id)
        }
        None => remove_where(&state.items, |node| node.is_selected()),
    };
    if removed == state.items {
        return Ok(state.clone());
    }
    let items = cleanup_groups(&remove_dangling_lines(&removed));
    Ok(EditorState::new(items))
}
