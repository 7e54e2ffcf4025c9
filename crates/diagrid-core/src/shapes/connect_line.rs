//! Connect line between two connectable shapes.

use super::{ArrowHead, DiagramId, PathPoint, SelectionState, ShapeStyle};
use crate::geometry::{point_to_polyline_dist, rect_from_points};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A polyline attached to connect points of two shapes.
///
/// The path always runs from the start owner's connect point to the end
/// owner's connect point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectLine {
    pub(crate) id: DiagramId,
    /// Center of the path's bounding box.
    pub center: Point,
    #[serde(default)]
    pub selection: SelectionState,
    /// Path vertices, first to last.
    #[serde(default)]
    pub items: Vec<PathPoint>,
    pub start_owner_id: DiagramId,
    pub start_point_id: DiagramId,
    pub end_owner_id: DiagramId,
    pub end_point_id: DiagramId,
    /// Whether the path is recomputed by the router whenever an endpoint moves.
    #[serde(default = "default_auto_routing")]
    pub auto_routing: bool,
    #[serde(default)]
    pub start_arrow: ArrowHead,
    #[serde(default = "default_end_arrow")]
    pub end_arrow: ArrowHead,
    #[serde(default)]
    pub style: ShapeStyle,
}

fn default_auto_routing() -> bool {
    true
}

fn default_end_arrow() -> ArrowHead {
    ArrowHead::Triangle
}

impl ConnectLine {
    pub fn new(
        start_owner_id: DiagramId,
        start_point_id: DiagramId,
        end_owner_id: DiagramId,
        end_point_id: DiagramId,
        points: &[Point],
    ) -> Self {
        let mut line = Self {
            id: Uuid::new_v4(),
            center: Point::ZERO,
            selection: SelectionState::default(),
            items: Vec::new(),
            start_owner_id,
            start_point_id,
            end_owner_id,
            end_point_id,
            auto_routing: true,
            start_arrow: ArrowHead::None,
            end_arrow: ArrowHead::Triangle,
            style: ShapeStyle {
                fill_color: None,
                ..ShapeStyle::default()
            },
        };
        line.set_points(points);
        line
    }

    /// Path vertices in order.
    pub fn points(&self) -> Vec<Point> {
        self.items.iter().map(|p| p.position).collect()
    }

    /// Replace the path, keeping existing vertex ids by index.
    pub fn set_points(&mut self, points: &[Point]) {
        let mut items = Vec::with_capacity(points.len());
        for (i, &position) in points.iter().enumerate() {
            match self.items.get(i) {
                Some(existing) => items.push(PathPoint {
                    id: existing.id,
                    position,
                }),
                None => items.push(PathPoint::new(position)),
            }
        }
        self.items = items;
        self.update_center();
    }

    fn update_center(&mut self) {
        self.center = rect_from_points(&self.points())
            .map(|r| r.center())
            .unwrap_or(self.center);
    }

    pub fn start(&self) -> Option<Point> {
        self.items.first().map(|p| p.position)
    }

    pub fn end(&self) -> Option<Point> {
        self.items.last().map(|p| p.position)
    }

    pub fn translate(&mut self, delta: Vec2) {
        for point in &mut self.items {
            point.translate(delta);
        }
        self.center += delta;
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let hit_tolerance = tolerance + self.style.stroke_width / 2.0;
        point_to_polyline_dist(point, &self.points()) <= hit_tolerance
    }
}
