//! Position-only leaves owned by shapes and connect lines.

use super::{DiagramId, DiagramNode, DiagramType};
use crate::geometry::Frame;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which edge midpoint of its owner a connect point sits on (in local space).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectPointName {
    Top,
    Right,
    Bottom,
    Left,
}

impl ConnectPointName {
    pub fn all() -> [ConnectPointName; 4] {
        [
            ConnectPointName::Top,
            ConnectPointName::Right,
            ConnectPointName::Bottom,
            ConnectPointName::Left,
        ]
    }

    /// Offset from the owner's center in local space.
    pub fn local_offset(&self, width: f64, height: f64) -> Point {
        match self {
            ConnectPointName::Top => Point::new(0.0, -height / 2.0),
            ConnectPointName::Right => Point::new(width / 2.0, 0.0),
            ConnectPointName::Bottom => Point::new(0.0, height / 2.0),
            ConnectPointName::Left => Point::new(-width / 2.0, 0.0),
        }
    }
}

/// An anchor on a connectable shape that connect lines attach to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectPoint {
    pub(crate) id: DiagramId,
    pub name: ConnectPointName,
    pub position: Point,
}

impl ConnectPoint {
    pub fn new(name: ConnectPointName, position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            position,
        }
    }

    pub fn with_id(id: DiagramId, name: ConnectPointName, position: Point) -> Self {
        Self { id, name, position }
    }
}

impl DiagramNode for ConnectPoint {
    fn id(&self) -> DiagramId {
        self.id
    }

    fn diagram_type(&self) -> DiagramType {
        DiagramType::ConnectPoint
    }

    fn position(&self) -> Point {
        self.position
    }
}

/// A vertex of a connect line path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub(crate) id: DiagramId,
    pub position: Point,
}

impl PathPoint {
    pub fn new(position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }
}

impl DiagramNode for PathPoint {
    fn id(&self) -> DiagramId {
        self.id
    }

    fn diagram_type(&self) -> DiagramType {
        DiagramType::PathPoint
    }

    fn position(&self) -> Point {
        self.position
    }
}

/// Edge-midpoint connect points for a frame.
///
/// Ids of `existing` points are kept by name so connect lines stay attached
/// across recalculation.
pub fn frame_connect_points(frame: &Frame, existing: &[ConnectPoint]) -> Vec<ConnectPoint> {
    ConnectPointName::all()
        .into_iter()
        .map(|name| {
            let position = frame.to_world(name.local_offset(frame.width, frame.height));
            match existing.iter().find(|p| p.name == name) {
                Some(previous) => ConnectPoint::with_id(previous.id, name, position),
                None => ConnectPoint::new(name, position),
            }
        })
        .collect()
}
