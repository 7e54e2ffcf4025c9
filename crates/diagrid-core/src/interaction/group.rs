//! Group and ungroup.

use super::select::select_ids;
use super::{EditorState, EventId, HandlerContext, HandlerResult};
use crate::error::EditorError;
use crate::geometry::selection_frame;
use crate::shapes::{Diagram, DiagramId, Group, SelectionState};
use crate::tree::{cleanup_groups, clear_selection, selected_indices};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupEvent {
    pub event_id: EventId,
    /// Top-level ids to group; empty groups the current selection.
    #[serde(default)]
    pub ids: Vec<DiagramId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UngroupEvent {
    pub event_id: EventId,
    /// Group to dissolve; `None` dissolves every selected group.
    #[serde(default)]
    pub target: Option<DiagramId>,
}

/// Wrap the selected top-level items in a new group.
///
/// The group takes the slot of the frontmost selected item and keeps the
/// children's absolute geometry. It ends up singly selected.
pub fn handle_group(
    state: &EditorState,
    event: &GroupEvent,
    _ctx: &HandlerContext,
) -> HandlerResult {
    let state = if event.ids.is_empty() {
        state.clone()
    } else {
        select_ids(&state.items, &event.ids)
    };
    let indices = selected_indices(&state.items);
    if indices.len() < 2 {
        return Err(EditorError::NotEnoughSelected {
            required: 2,
            actual: indices.len(),
        });
    }
    let chosen: Vec<Diagram> = indices.iter().map(|&i| state.items[i].clone()).collect();
    let frame = selection_frame(chosen.iter()).ok_or(EditorError::NotEnoughSelected {
        required: 2,
        actual: 0,
    })?;
    let mut group = Group::new(frame, clear_selection(&chosen));
    group.selection = SelectionState::selected();

    let frontmost = indices[indices.len() - 1];
    let insert_at = frontmost + 1 - indices.len();
    let mut items: Vec<Diagram> = state
        .items
        .iter()
        .enumerate()
        .filter(|(i, _)| !indices.contains(i))
        .map(|(_, item)| item.clone())
        .collect();
    items.insert(insert_at, Diagram::Group(group));
    log::debug!("Grouped {} items", indices.len());
    Ok(EditorState::new(cleanup_groups(&items)))
}

/// Splice the target groups' children into their slots.
pub fn handle_ungroup(
    state: &EditorState,
    event: &UngroupEvent,
    _ctx: &HandlerContext,
) -> HandlerResult {
    let targets: Vec<DiagramId> = match event.target {
        Some(id) => {
            let node = state
                .items
                .iter()
                .find(|i| i.id() == id)
                .ok_or(EditorError::DiagramNotFound(id))?;
            if node.as_group().is_none() {
                return Err(EditorError::NothingToUngroup);
            }
            vec![id]
        }
        None => state
            .items
            .iter()
            .filter(|i| i.is_selected() && i.as_group().is_some())
            .map(Diagram::id)
            .collect(),
    };
    if targets.is_empty() {
        return Err(EditorError::NothingToUngroup);
    }
    let mut items = Vec::with_capacity(state.items.len());
    let mut released = Vec::new();
    for item in &state.items {
        match item {
            Diagram::Group(group) if targets.contains(&group.id) => {
                released.extend(group.items.iter().map(Diagram::id));
                items.extend(group.clone().ungroup());
            }
            other => items.push(other.clone()),
        }
    }
    let items = cleanup_groups(&items);
    Ok(select_ids(&items, &released))
}
