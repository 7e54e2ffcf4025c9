//! Affine math, oriented frames and bounding boxes.
//!
//! Every position computation in the engine goes through [`affine`]: a point
//! in a node's local space is scaled (flip signs), rotated, then translated to
//! the node's center.

use crate::shapes::Diagram;
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Tolerance for coordinate comparisons.
pub const EPSILON: f64 = 1e-6;

/// Compare two coordinates with [`EPSILON`].
pub fn nearly_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

/// Compare two points with [`EPSILON`] on both axes.
pub fn points_eq(a: Point, b: Point) -> bool {
    nearly_eq(a.x, b.x) && nearly_eq(a.y, b.y)
}

/// Scale a local point, rotate it by `theta`, then translate by `translation`.
pub fn affine(point: Point, scale: Vec2, theta: f64, translation: Vec2) -> Point {
    let transform = Affine::translate(translation)
        * Affine::rotate(theta)
        * Affine::scale_non_uniform(scale.x, scale.y);
    transform * point
}

/// Rotate `point` about `center` by `theta` radians.
pub fn rotate_point(point: Point, center: Point, theta: f64) -> Point {
    if theta == 0.0 {
        return point;
    }
    affine(point - center.to_vec2(), Vec2::new(1.0, 1.0), theta, center.to_vec2())
}

/// Normalize an angle into `(-PI, PI]`.
pub fn normalize_angle(theta: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    let mut t = theta % TAU;
    if t <= -PI {
        t += TAU;
    } else if t > PI {
        t -= TAU;
    }
    t
}

fn sign_of(scale: f64) -> f64 {
    if scale < 0.0 { -1.0 } else { 1.0 }
}

fn one() -> f64 {
    1.0
}

/// Position, size, rotation and flip of a transformative node.
///
/// `scale_x`/`scale_y` are flip signs (+1 or -1); the extent of the node
/// always lives in `width`/`height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Center in world coordinates.
    pub center: Point,
    pub width: f64,
    pub height: f64,
    /// Rotation in radians around the center.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "one")]
    pub scale_x: f64,
    #[serde(default = "one")]
    pub scale_y: f64,
    /// Whether resizing keeps the width/height ratio.
    #[serde(default)]
    pub keep_proportion: bool,
}

impl Frame {
    pub fn new(center: Point, width: f64, height: f64) -> Self {
        Self {
            center,
            width,
            height,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            keep_proportion: false,
        }
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Map a point from frame-local space (origin at the center) to world space.
    pub fn to_world(&self, local: Point) -> Point {
        affine(
            local,
            Vec2::new(sign_of(self.scale_x), sign_of(self.scale_y)),
            self.rotation,
            self.center.to_vec2(),
        )
    }

    /// Map a world point into frame-local space.
    pub fn to_local(&self, world: Point) -> Point {
        let unrotated = rotate_point(world, self.center, -self.rotation) - self.center.to_vec2();
        Point::new(
            unrotated.x * sign_of(self.scale_x),
            unrotated.y * sign_of(self.scale_y),
        )
    }

    /// Corners in world space: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point; 4] {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        [
            self.to_world(Point::new(-hw, -hh)),
            self.to_world(Point::new(hw, -hh)),
            self.to_world(Point::new(hw, hh)),
            self.to_world(Point::new(-hw, hh)),
        ]
    }

    /// Axis-aligned bounding box.
    pub fn bounding_box(&self) -> Rect {
        if self.rotation == 0.0 {
            return Rect::from_center_size(self.center, (self.width.abs(), self.height.abs()));
        }
        rect_from_points(&self.corners())
            .unwrap_or_else(|| Rect::from_origin_size(self.center, (0.0, 0.0)))
    }

    /// Check if a world point lies inside the frame (inflated by `tolerance`).
    pub fn contains(&self, point: Point, tolerance: f64) -> bool {
        let local = self.to_local(point);
        local.x.abs() <= self.width / 2.0 + tolerance
            && local.y.abs() <= self.height / 2.0 + tolerance
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.center += delta;
    }

    pub fn translated(mut self, delta: Vec2) -> Self {
        self.translate(delta);
        self
    }

    /// Width over height, or 1 for a degenerate frame.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height.abs() < EPSILON || self.width.abs() < EPSILON {
            1.0
        } else {
            self.width / self.height
        }
    }

    pub fn is_finite(&self) -> bool {
        self.center.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.rotation.is_finite()
    }
}

/// Axis-aligned rectangle enclosing `points`, `None` when empty or non-finite.
pub fn rect_from_points(points: &[Point]) -> Option<Rect> {
    let first = *points.first()?;
    let mut rect = Rect::from_points(first, first);
    for p in &points[1..] {
        rect = rect.union_pt(*p);
    }
    rect.is_finite().then_some(rect)
}

/// Box aligned to `rotation` that encloses `points`.
///
/// The points are rotated by `-rotation` around the origin, their extents
/// measured, and the two extreme corners rotated back to find the center.
pub fn oriented_box(points: &[Point], rotation: f64) -> Option<Frame> {
    let unrotated: Vec<Point> = points
        .iter()
        .map(|&p| rotate_point(p, Point::ORIGIN, -rotation))
        .collect();
    let extents = rect_from_points(&unrotated)?;
    let min = rotate_point(Point::new(extents.x0, extents.y0), Point::ORIGIN, rotation);
    let max = rotate_point(Point::new(extents.x1, extents.y1), Point::ORIGIN, rotation);
    Some(Frame::new(min.midpoint(max), extents.width(), extents.height()).with_rotation(rotation))
}

/// World-space outline points of a node, descending through groups to the leaves.
pub fn collect_corners(node: &Diagram, out: &mut Vec<Point>) {
    match node {
        Diagram::Group(group) => {
            for child in &group.items {
                collect_corners(child, out);
            }
        }
        Diagram::ConnectLine(line) => out.extend(line.points()),
        other => {
            if let Some(frame) = other.frame() {
                out.extend(frame.corners());
            }
        }
    }
}

/// Oriented box of a group, aligned to the group's own rotation.
///
/// A group without leaves collapses to a zero-size frame at its center.
pub fn group_frame(items: &[Diagram], current: &Frame) -> Frame {
    let mut corners = Vec::new();
    for item in items {
        collect_corners(item, &mut corners);
    }
    match oriented_box(&corners, current.rotation) {
        Some(frame) if frame.is_finite() => Frame {
            scale_x: current.scale_x,
            scale_y: current.scale_y,
            keep_proportion: current.keep_proportion,
            ..frame
        },
        _ => Frame {
            width: 0.0,
            height: 0.0,
            ..*current
        },
    }
}

/// Oriented box of a selection.
///
/// Aligned to the shared rotation when every transformative node has the
/// same one, axis-aligned otherwise.
pub fn selection_frame<'a>(nodes: impl IntoIterator<Item = &'a Diagram>) -> Option<Frame> {
    let nodes: Vec<&Diagram> = nodes.into_iter().collect();
    let rotations: Vec<f64> = nodes
        .iter()
        .filter_map(|n| n.frame().map(|f| f.rotation))
        .collect();
    let shared = |first: f64| {
        rotations
            .iter()
            .all(|&r| nearly_eq(normalize_angle(r - first), 0.0))
    };
    let rotation = match rotations.first() {
        Some(&first) if shared(first) => first,
        _ => 0.0,
    };
    let mut corners = Vec::new();
    for node in &nodes {
        collect_corners(node, &mut corners);
    }
    oriented_box(&corners, rotation)
}

/// Axis-aligned bounding box of any node.
pub fn bounding_box(node: &Diagram) -> Rect {
    match node {
        Diagram::Group(group) => group_frame(&group.items, &group.frame).bounding_box(),
        Diagram::ConnectLine(line) => {
            rect_from_points(&line.points())
                .unwrap_or_else(|| Rect::from_origin_size(line.center, (0.0, 0.0)))
        }
        other => other
            .frame()
            .map(Frame::bounding_box)
            .unwrap_or_else(|| Rect::from_origin_size(other.position(), (0.0, 0.0))),
    }
}

/// Affine delta between a frame at gesture start and the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameChange {
    pub from: Frame,
    pub to: Frame,
}

impl FrameChange {
    pub fn new(from: Frame, to: Frame) -> Self {
        Self { from, to }
    }

    fn ratio(to: f64, from: f64) -> f64 {
        if from.abs() < EPSILON { 1.0 } else { to / from }
    }

    /// Horizontal and vertical scale ratios.
    pub fn scale(&self) -> Vec2 {
        Vec2::new(
            Self::ratio(self.to.width, self.from.width),
            Self::ratio(self.to.height, self.from.height),
        )
    }

    /// Flip applied by the change on each local axis (+1 or -1).
    pub fn flip(&self) -> Vec2 {
        Vec2::new(
            sign_of(self.to.scale_x) * sign_of(self.from.scale_x),
            sign_of(self.to.scale_y) * sign_of(self.from.scale_y),
        )
    }

    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }

    /// Map a world point anchored to `from` onto `to`.
    pub fn map_point(&self, point: Point) -> Point {
        let local = self.from.to_local(point);
        let scale = self.scale();
        self.to.to_world(Point::new(local.x * scale.x, local.y * scale.y))
    }

    /// Map a descendant frame anchored to `from` onto `to`.
    pub fn map_frame(&self, child: &Frame) -> Frame {
        let scale = self.scale();
        let flip = self.flip();
        let relative = child.rotation - self.from.rotation;
        let (sin, cos) = relative.sin_cos();
        let width = child.width * ((scale.x * cos).powi(2) + (scale.y * sin).powi(2)).sqrt();
        let height = child.height * ((scale.x * sin).powi(2) + (scale.y * cos).powi(2)).sqrt();
        let mirrored = flip.x * flip.y < 0.0;
        let relative = if mirrored { -relative } else { relative };
        Frame {
            center: self.map_point(child.center),
            width,
            height,
            rotation: normalize_angle(self.to.rotation + relative),
            scale_x: child.scale_x * flip.x,
            scale_y: child.scale_y * flip.y,
            keep_proportion: child.keep_proportion,
        }
    }
}

/// Check if a segment is exactly horizontal or vertical.
pub fn is_axis_aligned(a: Point, b: Point) -> bool {
    nearly_eq(a.x, b.x) || nearly_eq(a.y, b.y)
}

/// Distance from a point to a line segment (a to b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    point.distance(a + seg * t)
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    if points.len() == 1 {
        return point.distance(points[0]);
    }
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Check whether a segment passes through the open interior of `rect`.
///
/// Segments that only touch the boundary do not cross. Uses Liang-Barsky
/// clipping against the rectangle shrunk by [`EPSILON`].
pub fn segment_crosses_rect(a: Point, b: Point, rect: Rect) -> bool {
    let rect = rect.inflate(-EPSILON, -EPSILON);
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return false;
    }
    let d = b - a;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    let clips = [
        (-d.x, a.x - rect.x0),
        (d.x, rect.x1 - a.x),
        (-d.y, a.y - rect.y0),
        (d.y, rect.y1 - a.y),
    ];
    for (p, q) in clips {
        if p == 0.0 {
            if q < 0.0 {
                return false;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return false;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return false;
            }
            t1 = t1.min(r);
        }
    }
    t0 <= t1
}

/// Total length of a polyline.
pub fn polyline_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}
