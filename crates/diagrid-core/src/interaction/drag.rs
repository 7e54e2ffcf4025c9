//! Drag gesture: translate the selection by the cursor delta.

use super::select::{multi_select_for, select_ids};
use super::{EditorState, EventId, EventPhase, HandlerContext, HandlerResult};
use crate::connect::refresh_lines;
use crate::error::EditorError;
use crate::shapes::{Diagram, DiagramId, is_connect_line};
use crate::tree::{collect_ids, top_level_ancestor};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragEvent {
    pub event_id: EventId,
    pub phase: EventPhase,
    /// Node under the cursor when the drag started.
    #[serde(default)]
    pub target: Option<DiagramId>,
    /// World cursor position at gesture start.
    pub start: Point,
    /// Current world cursor position.
    pub current: Point,
    /// Screen cursor position, used for auto edge scroll.
    #[serde(default)]
    pub pointer: Option<Point>,
}

impl DragEvent {
    pub fn delta(&self) -> Vec2 {
        self.current - self.start
    }
}

/// Ids of the top-level nodes a drag moves.
///
/// Dragging an unselected target moves only that target; otherwise the
/// whole selection moves. Connect lines follow their owners instead.
fn drag_targets(
    state: &EditorState,
    target: Option<DiagramId>,
) -> Result<(EditorState, Vec<DiagramId>), EditorError> {
    let target = match target {
        Some(id) => {
            let index =
                top_level_ancestor(&state.items, id).ok_or(EditorError::DiagramNotFound(id))?;
            Some(&state.items[index])
        }
        None => None,
    };
    let base = match target {
        Some(node) if !node.is_selected() => select_ids(&state.items, &[node.id()]),
        _ => state.clone(),
    };
    let ids = base
        .items
        .iter()
        .filter(|i| i.is_selected() && !is_connect_line(i))
        .map(Diagram::id)
        .collect();
    Ok((base, ids))
}

/// Derive the tick from the gesture start state.
pub fn handle(start: &EditorState, event: &DragEvent, ctx: &HandlerContext) -> HandlerResult {
    let (base, ids) = drag_targets(start, event.target)?;
    let delta = event.delta() + ctx.scroll_offset;
    if ids.is_empty() || delta == Vec2::ZERO {
        return Ok(base);
    }
    let mut moved = HashSet::new();
    let items: Vec<Diagram> = base
        .items
        .iter()
        .map(|item| {
            if ids.contains(&item.id()) {
                moved.extend(collect_ids(std::slice::from_ref(item)));
                item.clone().translated(delta)
            } else {
                item.clone()
            }
        })
        .collect();
    let items = refresh_lines(&items, &start.items, &moved, &ctx.route_options());
    let multi_select = multi_select_for(&items);
    Ok(EditorState { items, multi_select })
}
