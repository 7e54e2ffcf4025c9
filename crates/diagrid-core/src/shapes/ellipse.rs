//! Ellipse shape.

use super::{
    ConnectPoint, DiagramId, SelectionState, ShapeStyle, TextAttributes, frame_connect_points,
};
use crate::geometry::Frame;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An ellipse inscribed in its frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
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
}

impl Ellipse {
    pub fn new(frame: Frame) -> Self {
        Self {
            id: Uuid::new_v4(),
            frame,
            selection: SelectionState::default(),
            connect_points: frame_connect_points(&frame, &[]),
            show_connect_points: false,
            text: TextAttributes::default(),
            style: ShapeStyle::default(),
        }
    }

    pub fn radius_x(&self) -> f64 {
        self.frame.width / 2.0
    }

    pub fn radius_y(&self) -> f64 {
        self.frame.height / 2.0
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let local = self.frame.to_local(point);
        let rx = self.radius_x() + tolerance;
        let ry = self.radius_y() + tolerance;
        if rx <= 0.0 || ry <= 0.0 {
            return false;
        }
        (local.x / rx).powi(2) + (local.y / ry).powi(2) <= 1.0
    }
}

super::connectable_shape!(Ellipse, super::DiagramType::Ellipse);
