//! Connect gesture: drag from one connect point onto another.

use super::{EditorState, EventId, EventPhase, HandlerContext, HandlerResult};
use crate::connect::{connect_shapes, preview, route_end};
use crate::error::EditorError;
use crate::shapes::{Diagram, DiagramId, is_connectable};
use crate::tree::{TreeIndex, walk};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Connect point under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectTarget {
    pub owner: DiagramId,
    pub point: DiagramId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectEvent {
    pub event_id: EventId,
    pub phase: EventPhase,
    pub source_owner: DiagramId,
    pub source_point: DiagramId,
    pub cursor: Point,
    #[serde(default)]
    pub target: Option<ConnectTarget>,
}

/// Direct connection between two known connect points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectShapesEvent {
    pub event_id: EventId,
    pub start_owner: DiagramId,
    pub start_point: DiagramId,
    pub end_owner: DiagramId,
    pub end_point: DiagramId,
}

fn with_connect_points_shown(items: &[Diagram], show: bool) -> Vec<Diagram> {
    walk(
        items,
        |node| is_connectable(node) && node.show_connect_points() != show,
        |node| {
            let mut node = node.clone();
            node.set_show_connect_points(show);
            node
        },
    )
}

/// Derive the tick from the gesture start state.
///
/// While the gesture is open every connect point is shown. Releasing over
/// a point on another shape adds an auto-routed line; releasing anywhere
/// else leaves the start state.
pub fn handle(start: &EditorState, event: &ConnectEvent, ctx: &HandlerContext) -> HandlerResult {
    let index = TreeIndex::build(&start.items);
    if route_end(&start.items, &index, event.source_owner, event.source_point).is_none() {
        return Err(EditorError::ConnectPointNotFound {
            owner: event.source_owner,
            point: event.source_point,
        });
    }
    match event.phase {
        EventPhase::Started | EventPhase::InProgress => {
            Ok(start.with_items(with_connect_points_shown(&start.items, true)))
        }
        EventPhase::Ended => match event.target {
            Some(target) if target.owner != event.source_owner => {
                let line = connect_shapes(
                    &start.items,
                    event.source_owner,
                    event.source_point,
                    target.owner,
                    target.point,
                    &ctx.route_options(),
                )?;
                log::debug!("Connected {} to {}", event.source_owner, target.owner);
                let mut items = with_connect_points_shown(&start.items, false);
                items.push(Diagram::ConnectLine(line));
                Ok(start.with_items(items))
            }
            _ => Ok(start.clone()),
        },
    }
}

/// Path drawn under the cursor while the gesture is open.
pub fn preview_path(
    state: &EditorState,
    event: &ConnectEvent,
    ctx: &HandlerContext,
) -> Option<Vec<Point>> {
    if event.phase == EventPhase::Ended {
        return None;
    }
    let index = TreeIndex::build(&state.items);
    let start = route_end(&state.items, &index, event.source_owner, event.source_point)?;
    if let Some(target) = event.target.filter(|t| t.owner != event.source_owner) {
        if let Ok(line) = connect_shapes(
            &state.items,
            event.source_owner,
            event.source_point,
            target.owner,
            target.point,
            &ctx.route_options(),
        ) {
            return Some(line.points());
        }
    }
    Some(preview(&start, event.cursor, ctx.config.connect_margin))
}

pub fn handle_connect_shapes(
    state: &EditorState,
    event: &ConnectShapesEvent,
    ctx: &HandlerContext,
) -> HandlerResult {
    let line = connect_shapes(
        &state.items,
        event.start_owner,
        event.start_point,
        event.end_owner,
        event.end_point,
        &ctx.route_options(),
    )?;
    let mut items = state.items.clone();
    items.push(Diagram::ConnectLine(line));
    Ok(state.with_items(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::test_support::{ctx_parts, point_id, rect};
    use crate::shapes::ConnectPointName;

    fn gesture(
        items: &[Diagram],
        phase: EventPhase,
        target: Option<ConnectTarget>,
    ) -> ConnectEvent {
        ConnectEvent {
            event_id: EventId::new(),
            phase,
            source_owner: items[0].id(),
            source_point: point_id(&items[0], ConnectPointName::Right),
            cursor: Point::new(200.0, 40.0),
            target,
        }
    }

    fn left_of(node: &Diagram) -> Option<ConnectTarget> {
        Some(ConnectTarget {
            owner: node.id(),
            point: point_id(node, ConnectPointName::Left),
        })
    }

    #[test]
    fn test_open_gesture_shows_connect_points() {
        let (registry, config) = ctx_parts();
        let ctx = HandlerContext::new(&registry, &config);
        let start = EditorState::new(vec![rect(0.0, 0.0), rect(400.0, 0.0)]);
        let event = gesture(&start.items, EventPhase::InProgress, None);
        let next = handle(&start, &event, &ctx).unwrap();
        assert!(next.items.iter().all(Diagram::show_connect_points));
        assert_eq!(next.items.len(), 2);
    }

    #[test]
    fn test_release_on_target_adds_line() {
        let (registry, config) = ctx_parts();
        let ctx = HandlerContext::new(&registry, &config);
        let start = EditorState::new(vec![rect(0.0, 0.0), rect(400.0, 0.0)]);
        let target = left_of(&start.items[1]);
        let event = gesture(&start.items, EventPhase::Ended, target);
        let next = handle(&start, &event, &ctx).unwrap();
        assert_eq!(next.items.len(), 3);
        let line = next.items[2].as_connect_line().unwrap();
        assert_eq!(line.points(), vec![Point::new(50.0, 0.0), Point::new(350.0, 0.0)]);
        assert!(next.items.iter().all(|i| !i.show_connect_points()));
    }

    #[test]
    fn test_release_elsewhere_keeps_start() {
        let (registry, config) = ctx_parts();
        let ctx = HandlerContext::new(&registry, &config);
        let start = EditorState::new(vec![rect(0.0, 0.0), rect(400.0, 0.0)]);
        let event = gesture(&start.items, EventPhase::Ended, None);
        let next = handle(&start, &event, &ctx).unwrap();
        assert_eq!(next, start);

        let self_target = left_of(&start.items[0]);
        let event = gesture(&start.items, EventPhase::Ended, self_target);
        let next = handle(&start, &event, &ctx).unwrap();
        assert_eq!(next, start);
    }

    #[test]
    fn test_unknown_source_point() {
        let (registry, config) = ctx_parts();
        let ctx = HandlerContext::new(&registry, &config);
        let start = EditorState::new(vec![rect(0.0, 0.0)]);
        let mut event = gesture(&start.items, EventPhase::Started, None);
        event.source_point = uuid::Uuid::new_v4();
        assert!(matches!(
            handle(&start, &event, &ctx),
            Err(EditorError::ConnectPointNotFound { .. })
        ));
    }

    #[test]
    fn test_preview_follows_cursor() {
        let (registry, config) = ctx_parts();
        let ctx = HandlerContext::new(&registry, &config);
        let start = EditorState::new(vec![rect(0.0, 0.0), rect(400.0, 0.0)]);
        let event = gesture(&start.items, EventPhase::InProgress, None);
        let path = preview_path(&start, &event, &ctx).unwrap();
        assert_eq!(path.first(), Some(&Point::new(50.0, 0.0)));
        assert_eq!(path.last(), Some(&Point::new(200.0, 40.0)));

        let snapped = gesture(&start.items, EventPhase::InProgress, left_of(&start.items[1]));
        let path = preview_path(&start, &snapped, &ctx).unwrap();
        assert_eq!(path.last(), Some(&Point::new(350.0, 0.0)));
    }

    #[test]
    fn test_connect_shapes_event() {
        let (registry, config) = ctx_parts();
        let ctx = HandlerContext::new(&registry, &config);
        let state = EditorState::new(vec![rect(0.0, 0.0), rect(400.0, 0.0)]);
        let event = ConnectShapesEvent {
            event_id: EventId::new(),
            start_owner: state.items[0].id(),
            start_point: point_id(&state.items[0], ConnectPointName::Right),
            end_owner: state.items[1].id(),
            end_point: point_id(&state.items[1], ConnectPointName::Left),
        };
        let next = handle_connect_shapes(&state, &event, &ctx).unwrap();
        assert!(next.items[2].as_connect_line().is_some());
    }
}
