//! Orthogonal route search between two shapes.
//!
//! Each end leaves its shape along the exit direction to a secondary
//! point one margin outside the box. A small lattice of candidate centers
//! is built from the two secondary points and a heuristic midpoint; each
//! center yields one elbowed path, which is scored and the cleanest kept.

use super::Direction;
use crate::geometry::{
    EPSILON, nearly_eq, point_to_polyline_dist, points_eq, polyline_length, segment_crosses_rect,
};
use kurbo::{Point, Rect};

/// Router tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteOptions {
    /// Clearance between the path and each shape's box.
    pub margin: f64,
    /// Length-equivalent cost of one bend.
    pub bend_penalty: f64,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            margin: 20.0,
            bend_penalty: 1.0,
        }
    }
}

/// One end of a route: the shape's box and the connect point it leaves from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteEnd {
    pub bounds: Rect,
    pub point: Point,
    pub direction: Direction,
}

impl RouteEnd {
    /// End whose exit direction is inferred from the shape center.
    pub fn new(bounds: Rect, point: Point) -> Self {
        Self {
            bounds,
            point,
            direction: Direction::infer(bounds.center(), point),
        }
    }

    /// Connect point pushed out of the shape by `margin`.
    pub fn secondary(&self, margin: f64) -> Point {
        self.point + self.direction.unit() * margin
    }

    fn margin_box(&self, margin: f64) -> Rect {
        self.bounds.inflate(margin, margin)
    }
}

/// A scored candidate path.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub center: Point,
    /// Simplified path from the first end to the second.
    pub points: Vec<Point>,
    /// Interior segments crossing a margin box.
    pub crossings: usize,
    pub score: f64,
    /// Distance of the center from `secondary A -> mid -> secondary B`.
    pub proximity: f64,
}

impl Candidate {
    pub fn is_clean(&self) -> bool {
        self.crossings == 0
    }

    fn beats(&self, other: &Candidate) -> bool {
        if self.crossings != other.crossings {
            return self.crossings < other.crossings;
        }
        if (self.score - other.score).abs() > EPSILON {
            return self.score < other.score;
        }
        self.proximity < other.proximity - EPSILON
    }
}

/// Coordinate between the facing edges of two boxes along one axis, or the
/// average of the secondary coordinates when the boxes overlap on it.
fn facing_mid(a_min: f64, a_max: f64, b_min: f64, b_max: f64, sa: f64, sb: f64) -> f64 {
    if a_max <= b_min {
        (a_max + b_min) / 2.0
    } else if b_max <= a_min {
        (b_max + a_min) / 2.0
    } else {
        (sa + sb) / 2.0
    }
}

/// Midpoint between the closest edges of the two shapes.
pub fn heuristic_mid(a: &RouteEnd, b: &RouteEnd, margin: f64) -> Point {
    let sa = a.secondary(margin);
    let sb = b.secondary(margin);
    Point::new(
        facing_mid(a.bounds.x0, a.bounds.x1, b.bounds.x0, b.bounds.x1, sa.x, sb.x),
        facing_mid(a.bounds.y0, a.bounds.y1, b.bounds.y0, b.bounds.y1, sa.y, sb.y),
    )
}

fn push_unique(points: &mut Vec<Point>, point: Point) -> bool {
    if points.iter().any(|&p| points_eq(p, point)) {
        return false;
    }
    points.push(point);
    true
}

/// Candidate centers: the seeds closed under axis-aligned intersection.
///
/// Every point added pairs with every point already present to add the two
/// elbow corners `(p.x, q.y)` and `(q.x, p.y)`.
pub fn candidate_lattice(seeds: &[Point]) -> Vec<Point> {
    let mut lattice: Vec<Point> = Vec::new();
    let mut pending: Vec<Point> = seeds.to_vec();
    while let Some(p) = pending.pop() {
        if !push_unique(&mut lattice, p) {
            continue;
        }
        let existing = lattice.clone();
        for q in existing {
            for corner in [Point::new(p.x, q.y), Point::new(q.x, p.y)] {
                if !lattice.iter().any(|&l| points_eq(l, corner)) {
                    pending.push(corner);
                }
            }
        }
    }
    lattice
}

/// Elbow from a secondary point toward `center`, leaving along the exit axis.
fn elbow(secondary: Point, direction: Direction, center: Point) -> Point {
    if direction.is_horizontal() {
        Point::new(center.x, secondary.y)
    } else {
        Point::new(secondary.x, center.y)
    }
}

/// Unsimplified path through `center`.
fn raw_path(a: &RouteEnd, b: &RouteEnd, center: Point, margin: f64) -> Vec<Point> {
    let sa = a.secondary(margin);
    let sb = b.secondary(margin);
    let mut path = vec![a.point, sa, elbow(sa, a.direction, center), center];
    let tail = [b.point, sb, elbow(sb, b.direction, center), center];
    path.extend(tail.iter().rev().skip(1));
    path
}

/// Drop duplicate and collinear points.
pub fn simplify(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last().is_some_and(|&last| points_eq(last, p)) {
            continue;
        }
        if out.len() >= 2 {
            let a = out[out.len() - 2];
            let b = out[out.len() - 1];
            let collinear_x = nearly_eq(a.x, b.x) && nearly_eq(b.x, p.x);
            let collinear_y = nearly_eq(a.y, b.y) && nearly_eq(b.y, p.y);
            if collinear_x || collinear_y {
                out.pop();
            }
        }
        if out.last().is_some_and(|&last| points_eq(last, p)) {
            continue;
        }
        out.push(p);
    }
    out
}

/// Count interior segments of `path` crossing any of `boxes`.
///
/// The first and last segments leave and enter the shapes and are skipped.
fn count_crossings(path: &[Point], boxes: &[Rect]) -> usize {
    if path.len() < 4 {
        return 0;
    }
    path[1..path.len() - 1]
        .windows(2)
        .filter(|w| boxes.iter().any(|&r| segment_crosses_rect(w[0], w[1], r)))
        .count()
}

/// Build and score the path through `center`.
pub fn evaluate_candidate(
    a: &RouteEnd,
    b: &RouteEnd,
    center: Point,
    mid: Point,
    options: &RouteOptions,
) -> Candidate {
    let raw = raw_path(a, b, center, options.margin);
    let boxes = [a.margin_box(options.margin), b.margin_box(options.margin)];
    let crossings = count_crossings(&raw, &boxes);
    let points = simplify(&raw);
    let bends = points.len().saturating_sub(2);
    let score = polyline_length(&points) + bends as f64 * options.bend_penalty;
    let guide = [a.secondary(options.margin), mid, b.secondary(options.margin)];
    Candidate {
        center,
        points,
        crossings,
        score,
        proximity: point_to_polyline_dist(center, &guide),
    }
}

/// All candidates for a route, in lattice order.
pub fn candidates(a: &RouteEnd, b: &RouteEnd, options: &RouteOptions) -> Vec<Candidate> {
    let mid = heuristic_mid(a, b, options.margin);
    let seeds = [a.secondary(options.margin), b.secondary(options.margin), mid];
    candidate_lattice(&seeds)
        .into_iter()
        .map(|center| evaluate_candidate(a, b, center, mid, options))
        .collect()
}

/// Best orthogonal path from `a.point` to `b.point`.
///
/// Clean candidates win over crossing ones; within a bucket the lowest
/// score wins, then the center closest to the guide line.
pub fn route(a: &RouteEnd, b: &RouteEnd, options: &RouteOptions) -> Vec<Point> {
    let mut best: Option<Candidate> = None;
    for candidate in candidates(a, b, options) {
        if best.as_ref().is_none_or(|current| candidate.beats(current)) {
            best = Some(candidate);
        }
    }
    match best {
        Some(candidate) => {
            if !candidate.is_clean() {
                log::debug!("No clean route, using one with {} crossings", candidate.crossings);
            }
            candidate.points
        }
        None => vec![a.point, b.point],
    }
}

/// Whether any interior segment of `path` crosses either shape's margin box.
pub fn crosses_margin_boxes(path: &[Point], a: Rect, b: Rect, margin: f64) -> bool {
    count_crossings(path, &[a.inflate(margin, margin), b.inflate(margin, margin)]) > 0
}

/// Provisional path from a connect point to a free cursor position.
pub fn preview(start: &RouteEnd, cursor: Point, margin: f64) -> Vec<Point> {
    let secondary = start.secondary(margin);
    simplify(&[start.point, secondary, elbow(secondary, start.direction, cursor), cursor])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::is_axis_aligned;

    fn end(center: Point, point: Point) -> RouteEnd {
        RouteEnd::new(Rect::from_center_size(center, (100.0, 100.0)), point)
    }

    fn assert_orthogonal(points: &[Point]) {
        assert!(
            points.windows(2).all(|w| is_axis_aligned(w[0], w[1])),
            "path not orthogonal: {points:?}"
        );
    }

    #[test]
    fn test_facing_shapes_route_straight() {
        let a = end(Point::new(0.0, 0.0), Point::new(50.0, 0.0));
        let b = end(Point::new(400.0, 0.0), Point::new(350.0, 0.0));
        let path = route(&a, &b, &RouteOptions::default());
        assert_eq!(path, vec![Point::new(50.0, 0.0), Point::new(350.0, 0.0)]);
    }

    #[test]
    fn test_offset_shapes_route_through_middle() {
        let a = end(Point::new(0.0, 0.0), Point::new(50.0, 0.0));
        let b = end(Point::new(400.0, 300.0), Point::new(350.0, 300.0));
        let path = route(&a, &b, &RouteOptions::default());
        assert_eq!(
            path,
            vec![
                Point::new(50.0, 0.0),
                Point::new(200.0, 0.0),
                Point::new(200.0, 300.0),
                Point::new(350.0, 300.0),
            ]
        );
    }

    #[test]
    fn test_clear_shapes_never_cross_margin_boxes() {
        let options = RouteOptions::default();
        let a_center = Point::new(0.0, 0.0);
        let a_bounds = Rect::from_center_size(a_center, (100.0, 100.0));
        // Right exit toward shapes on the right.
        for dy in [-300.0, -150.0, -60.0, 0.0, 60.0, 150.0, 300.0] {
            let b_center = Point::new(400.0, dy);
            let a = end(a_center, Point::new(50.0, 0.0));
            let b = end(b_center, Point::new(350.0, dy));
            let path = route(&a, &b, &options);
            assert_orthogonal(&path);
            let crossed = crosses_margin_boxes(&path, a_bounds, b.bounds, options.margin);
            assert!(!crossed, "dy={dy}: {path:?}");
        }
        // Bottom exit toward shapes below.
        for dx in [-200.0, 0.0, 200.0] {
            let b_center = Point::new(dx, 400.0);
            let a = end(a_center, Point::new(0.0, 50.0));
            let b = end(b_center, Point::new(dx, 350.0));
            let path = route(&a, &b, &options);
            assert_orthogonal(&path);
            let crossed = crosses_margin_boxes(&path, a_bounds, b.bounds, options.margin);
            assert!(!crossed, "dx={dx}: {path:?}");
        }
        // Right exit into a top entry.
        let a = end(a_center, Point::new(50.0, 0.0));
        let b = end(Point::new(400.0, 300.0), Point::new(400.0, 250.0));
        let path = route(&a, &b, &options);
        assert_orthogonal(&path);
        assert!(!crosses_margin_boxes(&path, a_bounds, b.bounds, options.margin));
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_path_starts_and_ends_at_connect_points() {
        let a = end(Point::new(0.0, 0.0), Point::new(0.0, -50.0));
        let b = end(Point::new(300.0, 200.0), Point::new(250.0, 200.0));
        let path = route(&a, &b, &RouteOptions::default());
        assert_eq!(path.first(), Some(&a.point));
        assert_eq!(path.last(), Some(&b.point));
        assert_orthogonal(&path);
    }

    #[test]
    fn test_lattice_contains_elbow_corners() {
        let seeds = [Point::new(0.0, 0.0), Point::new(10.0, 20.0), Point::new(5.0, 5.0)];
        let lattice = candidate_lattice(&seeds);
        assert_eq!(lattice.len(), 9);
        assert!(lattice.iter().any(|&p| points_eq(p, Point::new(0.0, 20.0))));
        assert!(lattice.iter().any(|&p| points_eq(p, Point::new(10.0, 5.0))));
    }

    #[test]
    fn test_simplify_drops_duplicates_and_collinear() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 20.0),
        ];
        assert_eq!(
            simplify(&pts),
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 20.0)]
        );
    }

    #[test]
    fn test_crossing_candidate_used_when_nothing_clean() {
        // Both exits face away from each other on one row; every lattice
        // center lies on that row.
        let a = end(Point::new(0.0, 0.0), Point::new(-50.0, 0.0));
        let b = end(Point::new(400.0, 0.0), Point::new(450.0, 0.0));
        let options = RouteOptions::default();
        assert!(candidates(&a, &b, &options).iter().all(|c| !c.is_clean()));
        let path = route(&a, &b, &options);
        assert_eq!(path.first(), Some(&a.point));
        assert_eq!(path.last(), Some(&b.point));
    }

    #[test]
    fn test_preview_is_elbowed() {
        let start = end(Point::new(0.0, 0.0), Point::new(50.0, 0.0));
        let path = preview(&start, Point::new(200.0, 100.0), 20.0);
        assert_eq!(
            path,
            vec![Point::new(50.0, 0.0), Point::new(200.0, 0.0), Point::new(200.0, 100.0)]
        );
    }
}
