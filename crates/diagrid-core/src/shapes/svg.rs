//! Inline SVG shape.

use super::{
    ConnectPoint, DiagramId, SelectionState, ShapeStyle, TextAttributes, frame_connect_points,
};
use crate::geometry::Frame;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A shape whose content is SVG markup scaled into its frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Svg {
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
    /// Raw SVG document.
    #[serde(default)]
    pub markup: String,
}

impl Svg {
    pub fn new(frame: Frame, markup: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            frame,
            selection: SelectionState::default(),
            connect_points: frame_connect_points(&frame, &[]),
            show_connect_points: false,
            text: TextAttributes::default(),
            style: ShapeStyle::default(),
            markup: markup.into(),
        }
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.frame.contains(point, tolerance)
    }
}

super::connectable_shape!(Svg, super::DiagramType::Svg);
