//! Paste clipboard nodes with fresh ids.

use super::select::select_ids;
use super::{EditorState, EventId, HandlerContext, HandlerResult};
use crate::shapes::{ConnectPoint, Diagram, DiagramId, PathPoint, is_connect_line};
use crate::tree::{cleanup_groups, remove_where, walk};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Clipboard content handed in by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PastePayload {
    Items(Vec<Diagram>),
    /// A JSON array of nodes, parsed before anything is applied.
    Json(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasteEvent {
    pub event_id: EventId,
    pub payload: PastePayload,
}

/// Clone of `node` with new ids for it and every node and leaf it owns.
///
/// Old-to-new pairs are recorded in `ids`. Connect line owners are not
/// rewritten here.
fn with_fresh_ids(node: &Diagram, ids: &mut HashMap<DiagramId, DiagramId>) -> Diagram {
    let mut node = node.clone();
    let old = node.id();
    node.regenerate_id();
    ids.insert(old, node.id());
    if let Some(points) = node.connect_points_mut() {
        for point in points.iter_mut() {
            let fresh = ConnectPoint::with_id(Uuid::new_v4(), point.name, point.position);
            ids.insert(point.id, fresh.id);
            *point = fresh;
        }
    }
    match &mut node {
        Diagram::Group(group) => {
            group.items = group.items.iter().map(|child| with_fresh_ids(child, ids)).collect();
        }
        Diagram::ConnectLine(line) => {
            line.items = line.items.iter().map(|p| PathPoint::new(p.position)).collect();
        }
        _ => {}
    }
    node
}

/// Prepare clipboard nodes for insertion.
///
/// Ids are regenerated, positions offset, and line references rewritten
/// through the id map. Lines whose endpoints were not copied are dropped.
pub fn prepare(nodes: &[Diagram], ctx: &HandlerContext) -> Vec<Diagram> {
    let mut ids = HashMap::new();
    let offset = ctx.config.paste_offset;
    let fresh: Vec<Diagram> = nodes
        .iter()
        .map(|node| with_fresh_ids(node, &mut ids).translated(offset))
        .collect();
    let resolved = |id: &DiagramId| ids.get(id).copied();
    let kept = remove_where(&fresh, |node| match node {
        Diagram::ConnectLine(line) => {
            let ends = [
                line.start_owner_id,
                line.start_point_id,
                line.end_owner_id,
                line.end_point_id,
            ];
            let complete = ends.iter().all(|id| resolved(id).is_some());
            if !complete {
                log::debug!(
                    "Dropping pasted line {} with an endpoint outside the clipboard",
                    line.id
                );
            }
            !complete
        }
        _ => false,
    });
    let rewired = walk(
        &kept,
        is_connect_line,
        |node| {
            let mut node = node.clone();
            if let Diagram::ConnectLine(line) = &mut node {
                for id in [
                    &mut line.start_owner_id,
                    &mut line.start_point_id,
                    &mut line.end_owner_id,
                    &mut line.end_point_id,
                ] {
                    if let Some(fresh) = resolved(&*id) {
                        *id = fresh;
                    }
                }
            }
            node
        },
    );
    cleanup_groups(&rewired)
}

/// Append the clipboard content as the new selection.
///
/// A payload that fails to parse is rejected whole.
pub fn handle(state: &EditorState, event: &PasteEvent, ctx: &HandlerContext) -> HandlerResult {
    let parsed;
    let nodes: &[Diagram] = match &event.payload {
        PastePayload::Items(items) => items,
        PastePayload::Json(json) => {
            parsed = serde_json::from_str::<Vec<Diagram>>(json)?;
            &parsed
        }
    };
    if nodes.is_empty() {
        return Ok(state.clone());
    }
    let pasted = prepare(nodes, ctx);
    let pasted_ids: Vec<DiagramId> = pasted.iter().map(Diagram::id).collect();
    let mut items = state.items.clone();
    items.extend(pasted);
    log::debug!("Pasted {} items", pasted_ids.len());
    Ok(select_ids(&items, &pasted_ids))
}
