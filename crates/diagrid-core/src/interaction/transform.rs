//! Resize, rotate and flip gesture.

use super::{EditorState, EventId, EventPhase, HandlerContext, HandlerResult};
use crate::connect::refresh_lines;
use crate::error::EditorError;
use crate::geometry::{EPSILON, Frame, FrameChange};
use crate::shapes::{Diagram, DiagramId, frame_connect_points};
use crate::tree::{collect_ids, find, replace_by_id};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformEvent {
    pub event_id: EventId,
    pub phase: EventPhase,
    /// Node being transformed; `None` targets the multi-select group.
    #[serde(default)]
    pub target: Option<DiagramId>,
    /// Requested frame for the target.
    pub frame: Frame,
}

/// Map a node and everything it owns through `change`.
///
/// Descendants are mapped from their own frames in the node passed in, so
/// callers always pass the node as it was at gesture start.
pub fn transform_node(change: &FrameChange, node: &Diagram) -> Diagram {
    let mut node = node.clone();
    if change.is_identity() {
        return node;
    }
    match &mut node {
        Diagram::Group(group) => {
            group.frame = change.map_frame(&group.frame);
            group.items = group.items.iter().map(|child| transform_node(change, child)).collect();
        }
        Diagram::ConnectLine(line) => {
            let points: Vec<_> = line.points().into_iter().map(|p| change.map_point(p)).collect();
            line.set_points(&points);
        }
        other => {
            if let Some(frame) = other.frame_mut() {
                *frame = change.map_frame(frame);
            }
            let frame = other.frame().copied();
            if let (Some(frame), Some(points)) = (frame, other.connect_points_mut()) {
                *points = frame_connect_points(&frame, points);
            }
        }
    }
    node
}

/// Clamp the requested frame to the start frame's aspect ratio.
fn constrain(from: &Frame, requested: &Frame) -> Frame {
    if !from.keep_proportion || from.height.abs() < EPSILON {
        return *requested;
    }
    let mut to = *requested;
    to.height = to.width / from.aspect_ratio();
    to.keep_proportion = true;
    to
}

/// Apply `change` to `node` through the registry definition of its type.
fn transform_with(
    ctx: &HandlerContext,
    change: &FrameChange,
    node: &Diagram,
) -> Result<Diagram, EditorError> {
    let definition = ctx.registry.get(node.diagram_type())?;
    let mut out = node.clone();
    if let Some(frame) = out.frame_mut() {
        *frame = change.map_frame(frame);
    }
    if let Diagram::Group(group) = &mut out {
        group.items = (definition.transform_children)(change, &group.items);
    }
    Ok(ctx.registry.refresh_connect_points(&out))
}

/// Derive the tick from the gesture start state.
pub fn handle(start: &EditorState, event: &TransformEvent, ctx: &HandlerContext) -> HandlerResult {
    let mut moved = HashSet::new();
    let mut next = start.clone();
    match event.target {
        Some(id) => {
            let node = find(&start.items, id).ok_or(EditorError::DiagramNotFound(id))?;
            let from = *node.frame().ok_or(EditorError::DiagramNotFound(id))?;
            let change = FrameChange::new(from, constrain(&from, &event.frame));
            let transformed = transform_with(ctx, &change, node)?;
            moved.extend(collect_ids(std::slice::from_ref(node)));
            next.items = replace_by_id(&start.items, id, |_| transformed.clone());
        }
        None => {
            let Some(group) = &start.multi_select else {
                log::warn!("Transform without target or multi-selection");
                return Ok(start.clone());
            };
            let to = constrain(&group.frame, &event.frame);
            let change = FrameChange::new(group.frame, to);
            let mut items = start.items.clone();
            for slot in &mut items {
                if group.source_ids.contains(&slot.id()) && slot.frame().is_some() {
                    moved.extend(collect_ids(std::slice::from_ref(slot)));
                    *slot = transform_with(ctx, &change, slot)?;
                }
            }
            next.items = items;
            if let Some(multi) = &mut next.multi_select {
                multi.frame = to;
            }
        }
    }
    next.items = refresh_lines(&next.items, &start.items, &moved, &ctx.route_options());
    Ok(next)
}
