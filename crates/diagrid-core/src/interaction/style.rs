//! Style edits and connect line routing mode.

use super::{EditorState, EventId, HandlerContext, HandlerResult};
use crate::connect::refresh_line;
use crate::error::EditorError;
use crate::shapes::{Diagram, DiagramId, ShapeStyle};
use crate::tree::{TreeIndex, find, replace_by_id, walk};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleEvent {
    pub event_id: EventId,
    pub ids: Vec<DiagramId>,
    pub style: ShapeStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleAutoRoutingEvent {
    pub event_id: EventId,
    pub line_id: DiagramId,
}

fn restyle(node: &Diagram, style: &ShapeStyle) -> Diagram {
    let mut node = node.clone();
    if let Some(current) = node.style_mut() {
        *current = style.clone();
    }
    if let Diagram::Group(group) = &mut node {
        group.items = group.items.iter().map(|child| restyle(child, style)).collect();
    }
    node
}

/// Apply a style to the listed nodes. Groups pass it on to their children.
pub fn handle_set_style(
    state: &EditorState,
    event: &StyleEvent,
    _ctx: &HandlerContext,
) -> HandlerResult {
    let present: Vec<DiagramId> = event
        .ids
        .iter()
        .copied()
        .filter(|&id| {
            let found = find(&state.items, id).is_some();
            if !found {
                log::warn!("Skipping style for missing diagram {id}");
            }
            found
        })
        .collect();
    if present.is_empty() {
        let missing = event.ids.first().copied().unwrap_or_default();
        return Err(EditorError::DiagramNotFound(missing));
    }
    let items = walk(
        &state.items,
        |node| present.contains(&node.id()),
        |node| restyle(node, &event.style),
    );
    Ok(state.with_items(items))
}

/// Switch a line between automatic and manual routing.
///
/// Turning routing on re-routes the line immediately.
pub fn handle_toggle_auto_routing(
    state: &EditorState,
    event: &ToggleAutoRoutingEvent,
    ctx: &HandlerContext,
) -> HandlerResult {
    let line = find(&state.items, event.line_id)
        .and_then(Diagram::as_connect_line)
        .ok_or(EditorError::DiagramNotFound(event.line_id))?;
    let mut toggled = line.clone();
    toggled.auto_routing = !line.auto_routing;
    if toggled.auto_routing {
        let index = TreeIndex::build(&state.items);
        toggled = refresh_line(&state.items, &index, &toggled, line, &ctx.route_options());
    }
    log::debug!("Connect line {} auto routing: {}", line.id, toggled.auto_routing);
    let items = replace_by_id(&state.items, event.line_id, |_| {
        Diagram::ConnectLine(toggled.clone())
    });
    Ok(state.with_items(items))
}
