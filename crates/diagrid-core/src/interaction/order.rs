//! Stack order changes within a node's immediate parent.

use super::{EditorState, EventId, HandlerContext, HandlerResult};
use crate::error::EditorError;
use crate::shapes::{Diagram, DiagramId};
use crate::tree::{TreeIndex, walk};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackOrder {
    BringToFront,
    SendToBack,
    BringForward,
    SendBackward,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderEvent {
    pub event_id: EventId,
    pub target: DiagramId,
    pub order: StackOrder,
}

/// Copy of `items` with `id` moved. `None` if it is not a direct child.
pub fn reordered(items: &[Diagram], id: DiagramId, order: StackOrder) -> Option<Vec<Diagram>> {
    let pos = items.iter().position(|item| item.id() == id)?;
    let mut items = items.to_vec();
    match order {
        StackOrder::BringToFront => {
            let item = items.remove(pos);
            items.push(item);
        }
        StackOrder::SendToBack => {
            let item = items.remove(pos);
            items.insert(0, item);
        }
        StackOrder::BringForward => {
            if pos + 1 < items.len() {
                items.swap(pos, pos + 1);
            }
        }
        StackOrder::SendBackward => {
            if pos > 0 {
                items.swap(pos, pos - 1);
            }
        }
    }
    Some(items)
}

/// Reorder a top-level node, or a direct child of a top-level group.
pub fn handle(state: &EditorState, event: &ReorderEvent, _ctx: &HandlerContext) -> HandlerResult {
    let not_found = || EditorError::DiagramNotFound(event.target);
    let index = TreeIndex::build(&state.items);
    let depth = index.path(event.target).ok_or_else(not_found)?.len();
    match depth {
        1 => {
            let items = reordered(&state.items, event.target, event.order).ok_or_else(not_found)?;
            Ok(state.with_items(items))
        }
        2 => {
            let parent = index.parent_id(&state.items, event.target).ok_or_else(not_found)?;
            let items = walk(
                &state.items,
                |node| node.id() == parent,
                |node| match node.as_group() {
                    Some(group) => match reordered(&group.items, event.target, event.order) {
                        Some(children) => Diagram::Group(group.with_items(children)),
                        None => node.clone(),
                    },
                    None => node.clone(),
                },
            );
            Ok(state.with_items(items))
        }
        _ => {
            log::debug!("{} is nested too deep to reorder", event.target);
            Err(not_found())
        }
    }
}
