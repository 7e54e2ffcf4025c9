//! Rectangle shape.

use super::{
    ConnectPoint, DiagramId, SelectionState, ShapeStyle, TextAttributes, frame_connect_points,
};
use crate::geometry::Frame;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A rectangle with optional rounded corners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub(crate) id: DiagramId,
    pub frame: Frame,
    #[serde(default)]
    pub selection: SelectionState,
    #[serde(default)]
    pub connect_points: Vec<ConnectPoint>,
    #[serde(default)]
    pub show_connect_points: bool,
    #[serde(default)]
    pub text: TextAttributes,
    #[serde(default)]
    pub style: ShapeStyle,
    /// Corner radius (0 = sharp corners).
    #[serde(default)]
    pub corner_radius: f64,
}

impl Rectangle {
    /// Create a new rectangle with edge-midpoint connect points.
    pub fn new(frame: Frame) -> Self {
        Self {
            id: Uuid::new_v4(),
            frame,
            selection: SelectionState::default(),
            connect_points: frame_connect_points(&frame, &[]),
            show_connect_points: false,
            text: TextAttributes::default(),
            style: ShapeStyle::default(),
            corner_radius: 0.0,
        }
    }

    /// Check if a point (in world coordinates) hits this rectangle.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.frame.contains(point, tolerance)
    }
}

super::connectable_shape!(Rectangle, super::DiagramType::Rectangle);
