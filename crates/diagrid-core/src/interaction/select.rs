//! Selection handlers and helpers shared by the other handlers.

use super::{EditorState, EventId, HandlerContext, HandlerResult, MultiSelectGroup};
use crate::error::EditorError;
use crate::geometry::selection_frame;
use crate::shapes::{Diagram, DiagramId, SelectionState};
use crate::tree::{clear_selection, top_level_ancestor};
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Click selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectEvent {
    pub event_id: EventId,
    pub target: DiagramId,
    /// Toggle the target instead of replacing the selection.
    #[serde(default)]
    pub additive: bool,
}

/// Rubber-band selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectAreaEvent {
    pub event_id: EventId,
    pub rect: Rect,
}

/// Multi-select frame for the selected top-level items, if two or more.
pub fn multi_select_for(items: &[Diagram]) -> Option<MultiSelectGroup> {
    let sources: Vec<&Diagram> = items.iter().filter(|i| i.is_selected()).collect();
    if sources.len() < 2 {
        return None;
    }
    let frame = selection_frame(sources.iter().copied())?;
    Some(MultiSelectGroup {
        frame,
        source_ids: sources.iter().map(|s| s.id()).collect(),
    })
}

/// Select exactly the top-level items in `ids`.
///
/// One item gets single selection; two or more are all marked as
/// multi-select sources and framed by a multi-select group.
pub fn select_ids(items: &[Diagram], ids: &[DiagramId]) -> EditorState {
    let multi = ids.len() >= 2;
    let mut items = clear_selection(items);
    for item in &mut items {
        if ids.contains(&item.id()) {
            item.set_selection(SelectionState {
                is_selected: true,
                is_multi_select_source: multi,
            });
        }
    }
    let multi_select = multi_select_for(&items);
    EditorState { items, multi_select }
}

pub fn clear(state: &EditorState) -> EditorState {
    EditorState::new(clear_selection(&state.items))
}

pub fn select_all(state: &EditorState) -> EditorState {
    let ids: Vec<DiagramId> = state.items.iter().map(Diagram::id).collect();
    select_ids(&state.items, &ids)
}

pub fn handle_select(
    state: &EditorState,
    event: &SelectEvent,
    _ctx: &HandlerContext,
) -> HandlerResult {
    let index = top_level_ancestor(&state.items, event.target)
        .ok_or(EditorError::DiagramNotFound(event.target))?;
    let id = state.items[index].id();
    let mut ids: Vec<DiagramId> = if event.additive {
        state.items.iter().filter(|i| i.is_selected()).map(Diagram::id).collect()
    } else {
        Vec::new()
    };
    match ids.iter().position(|&s| s == id) {
        Some(pos) if event.additive => {
            ids.remove(pos);
        }
        _ => ids.push(id),
    }
    Ok(select_ids(&state.items, &ids))
}

pub fn handle_select_area(
    state: &EditorState,
    event: &SelectAreaEvent,
    _ctx: &HandlerContext,
) -> HandlerResult {
    let rect = Rect::from_points(event.rect.origin(), (event.rect.x1, event.rect.y1));
    let ids: Vec<DiagramId> = state
        .items
        .iter()
        .filter(|item| item.intersects_rect(rect))
        .map(Diagram::id)
        .collect();
    Ok(select_ids(&state.items, &ids))
}
