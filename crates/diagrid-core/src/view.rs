//! Derived data handed to the rendering surface each tick.

use crate::geometry::Frame;
use crate::interaction::EditorState;
use crate::shapes::{ConnectPoint, Diagram, DiagramId, DiagramType};
use crate::tree::visit;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Selection outline of one top-level node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub id: DiagramId,
    pub diagram_type: DiagramType,
    /// Frame corners, or the path for connect lines.
    pub points: Vec<Point>,
    pub multi_select_source: bool,
}

/// What the transform handles attach to.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActiveTransform {
    #[default]
    None,
    Single {
        id: DiagramId,
        frame: Frame,
    },
    Multi { frame: Frame },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewData {
    pub outlines: Vec<Outline>,
    pub active_transform: ActiveTransform,
    /// Whether any shape currently shows its connect points.
    pub show_connect_points: bool,
    pub connect_points: Vec<ConnectPoint>,
    /// Provisional path of an open connect gesture.
    pub connect_preview: Option<Vec<Point>>,
    /// World distance auto-scrolled during the current drag.
    pub scroll_offset: Vec2,
}

impl ViewData {
    pub fn build(
        state: &EditorState,
        connect_preview: Option<Vec<Point>>,
        scroll_offset: Vec2,
    ) -> Self {
        let outlines: Vec<Outline> =
            state.items.iter().filter(|i| i.is_selected()).map(outline).collect();
        let mut connect_points = Vec::new();
        visit(&state.items, &mut |node: &Diagram| {
            if node.show_connect_points() {
                connect_points.extend_from_slice(node.connect_points());
            }
        });
        Self {
            active_transform: active_transform(state),
            outlines,
            show_connect_points: !connect_points.is_empty(),
            connect_points,
            connect_preview,
            scroll_offset,
        }
    }
}

fn outline(node: &Diagram) -> Outline {
    let points = match (node.frame(), node.as_connect_line()) {
        (Some(frame), _) => frame.corners().to_vec(),
        (None, Some(line)) => line.points(),
        (None, None) => Vec::new(),
    };
    Outline {
        id: node.id(),
        diagram_type: node.diagram_type(),
        points,
        multi_select_source: node.selection().is_multi_select_source,
    }
}

fn active_transform(state: &EditorState) -> ActiveTransform {
    if let Some(multi) = &state.multi_select {
        return ActiveTransform::Multi { frame: multi.frame };
    }
    let mut selected = state.items.iter().filter(|i| i.is_selected());
    match (selected.next(), selected.next()) {
        (Some(node), None) => match node.frame() {
            Some(frame) => ActiveTransform::Single {
                id: node.id(),
                frame: *frame,
            },
            None => ActiveTransform::None,
        },
        _ => ActiveTransform::None,
    }
}
