//! Exit directions of connect points.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Axis-aligned direction in screen space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Direction of the dominant axis of `center -> point`.
    ///
    /// Ties favour the horizontal axis; a zero vector exits right.
    pub fn infer(center: Point, point: Point) -> Self {
        let v = point - center;
        if v.x.abs() >= v.y.abs() {
            if v.x < 0.0 { Direction::Left } else { Direction::Right }
        } else if v.y < 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    pub fn unit(&self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}
