//! Keep connect lines attached while their owners move.

use super::router::{RouteEnd, RouteOptions, route};
use crate::geometry::{bounding_box, is_axis_aligned, nearly_eq, points_eq};
use crate::shapes::{ConnectLine, Diagram, DiagramId};
use crate::tree::{TreeIndex, walk};
use kurbo::{Point, Vec2};
use std::collections::HashSet;

/// Route end for a connect point of a shape in `items`.
pub fn route_end(
    items: &[Diagram],
    index: &TreeIndex,
    owner: DiagramId,
    point: DiagramId,
) -> Option<RouteEnd> {
    let node = index.get(items, owner)?;
    let connect_point = node.connect_point(point)?;
    Some(RouteEnd::new(bounding_box(node), connect_point.position))
}

/// Recompute the lines attached to any id in `moved`.
///
/// `before` is the tree at gesture start; manual lines are edited relative
/// to their path there so repeated ticks never compound.
pub fn refresh_lines(
    items: &[Diagram],
    before: &[Diagram],
    moved: &HashSet<DiagramId>,
    options: &RouteOptions,
) -> Vec<Diagram> {
    if moved.is_empty() {
        return items.to_vec();
    }
    let index = TreeIndex::build(items);
    let before_index = TreeIndex::build(before);
    walk(
        items,
        |node| match node {
            Diagram::ConnectLine(line) => {
                moved.contains(&line.start_owner_id) || moved.contains(&line.end_owner_id)
            }
            _ => false,
        },
        |node| {
            let Diagram::ConnectLine(line) = node else {
                return node.clone();
            };
            let original = before_index
                .get(before, line.id)
                .and_then(Diagram::as_connect_line)
                .unwrap_or(line);
            Diagram::ConnectLine(refresh_line(items, &index, line, original, options))
        },
    )
}

/// Re-derive one line from the current owners.
pub fn refresh_line(
    items: &[Diagram],
    index: &TreeIndex,
    line: &ConnectLine,
    original: &ConnectLine,
    options: &RouteOptions,
) -> ConnectLine {
    let start = route_end(items, index, line.start_owner_id, line.start_point_id);
    let end = route_end(items, index, line.end_owner_id, line.end_point_id);
    let (Some(start), Some(end)) = (start, end) else {
        log::warn!("Connect line {} lost an endpoint, leaving it in place", line.id);
        return line.clone();
    };
    let mut refreshed = line.clone();
    if line.auto_routing {
        refreshed.set_points(&route(&start, &end, options));
    } else {
        refreshed.set_points(&adjust_manual_path(&original.points(), start.point, end.point));
    }
    refreshed
}

/// Local edit of a manually laid-out path after its endpoints moved.
///
/// Equal endpoint deltas translate the whole path. Otherwise only moved
/// endpoints change, and for an all-orthogonal path the neighbouring point
/// slides along the one axis that keeps the right angle.
pub fn adjust_manual_path(original: &[Point], start: Point, end: Point) -> Vec<Point> {
    let (Some(&first), Some(&last)) = (original.first(), original.last()) else {
        return vec![start, end];
    };
    let start_delta = start - first;
    let end_delta = end - last;
    let start_moved = !points_eq(first, start);
    let end_moved = !points_eq(last, end);
    let mut points = original.to_vec();
    if !start_moved && !end_moved {
        return points;
    }
    if start_moved && end_moved && vec_eq(start_delta, end_delta) {
        return points.iter().map(|&p| p + start_delta).collect();
    }

    let orthogonal = original.windows(2).all(|w| is_axis_aligned(w[0], w[1]));
    let n = points.len();
    if start_moved {
        points[0] = start;
        if orthogonal && n >= 3 {
            slide_neighbour(&mut points[1], original[0], original[1], start);
        }
    }
    if end_moved {
        points[n - 1] = end;
        if orthogonal && n >= 3 {
            slide_neighbour(&mut points[n - 2], original[n - 1], original[n - 2], end);
        }
    }
    points
}

fn vec_eq(a: Vec2, b: Vec2) -> bool {
    nearly_eq(a.x, b.x) && nearly_eq(a.y, b.y)
}

/// Keep the segment `endpoint -> neighbour` on its original axis.
fn slide_neighbour(neighbour: &mut Point, old_end: Point, old_neighbour: Point, new_end: Point) {
    if nearly_eq(old_end.y, old_neighbour.y) {
        neighbour.y = new_end.y;
    } else {
        neighbour.x = new_end.x;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Frame;
    use crate::shapes::{ConnectPointName, Rectangle};

    fn rect(x: f64, y: f64) -> Diagram {
        Diagram::Rectangle(Rectangle::new(Frame::new(Point::new(x, y), 100.0, 100.0)))
    }

    fn point_id(node: &Diagram, name: ConnectPointName) -> DiagramId {
        node.connect_points().iter().find(|p| p.name == name).map(|p| p.id).unwrap()
    }

    fn connected(auto: bool) -> Vec<Diagram> {
        let a = rect(0.0, 0.0);
        let b = rect(400.0, 0.0);
        let mut line = ConnectLine::new(
            a.id(),
            point_id(&a, ConnectPointName::Right),
            b.id(),
            point_id(&b, ConnectPointName::Left),
            &[
                Point::new(50.0, 0.0),
                Point::new(200.0, 0.0),
                Point::new(200.0, 0.0),
                Point::new(350.0, 0.0),
            ],
        );
        line.auto_routing = auto;
        vec![a, b, Diagram::ConnectLine(line)]
    }

    fn moved(items: &[Diagram], delta: Vec2) -> Vec<Diagram> {
        let id = items[1].id();
        walk(items, |n| n.id() == id, |n| n.clone().translated(delta))
    }

    #[test]
    fn test_auto_line_reroutes() {
        let before = connected(true);
        let after = moved(&before, Vec2::new(0.0, 300.0));
        let ids: HashSet<_> = [after[1].id()].into();
        let refreshed = refresh_lines(&after, &before, &ids, &RouteOptions::default());
        let line = refreshed[2].as_connect_line().unwrap();
        assert_eq!(line.points().len(), 4);
        assert_eq!(line.end(), Some(Point::new(350.0, 300.0)));
    }

    #[test]
    fn test_unrelated_move_leaves_lines() {
        let before = connected(true);
        let ids: HashSet<_> = [uuid::Uuid::new_v4()].into();
        assert_eq!(refresh_lines(&before, &before, &ids, &RouteOptions::default()), before);
    }

    #[test]
    fn test_manual_line_slides_neighbour() {
        let original = [
            Point::new(50.0, 0.0),
            Point::new(200.0, 0.0),
            Point::new(200.0, 100.0),
            Point::new(350.0, 100.0),
        ];
        let adjusted = adjust_manual_path(&original, original[0], Point::new(350.0, 130.0));
        assert_eq!(adjusted[0], original[0]);
        assert_eq!(adjusted[1], original[1]);
        assert_eq!(adjusted[2], Point::new(200.0, 130.0));
        assert_eq!(adjusted[3], Point::new(350.0, 130.0));
    }

    #[test]
    fn test_manual_non_orthogonal_only_moves_endpoint() {
        let original = [Point::new(0.0, 0.0), Point::new(30.0, 40.0), Point::new(100.0, 100.0)];
        let adjusted = adjust_manual_path(&original, original[0], Point::new(110.0, 100.0));
        assert_eq!(adjusted[1], original[1]);
        assert_eq!(adjusted[2], Point::new(110.0, 100.0));
    }

    #[test]
    fn test_manual_rigid_translation() {
        let original = [Point::new(0.0, 0.0), Point::new(30.0, 40.0), Point::new(100.0, 100.0)];
        let d = Vec2::new(5.0, -5.0);
        let adjusted = adjust_manual_path(&original, original[0] + d, original[2] + d);
        assert_eq!(adjusted, original.iter().map(|&p| p + d).collect::<Vec<_>>());
    }

    #[test]
    fn test_manual_refresh_uses_gesture_start() {
        let before = connected(false);
        let ids: HashSet<_> = [before[1].id()].into();
        // Two ticks of the same gesture, each derived from the start snapshot.
        let options = RouteOptions::default();
        let tick1 = refresh_lines(&moved(&before, Vec2::new(0.0, 10.0)), &before, &ids, &options);
        let tick2 = refresh_lines(&moved(&before, Vec2::new(0.0, 20.0)), &before, &ids, &options);
        let line1 = tick1[2].as_connect_line().unwrap();
        let line2 = tick2[2].as_connect_line().unwrap();
        assert_eq!(line1.end(), Some(Point::new(350.0, 10.0)));
        assert_eq!(line2.end(), Some(Point::new(350.0, 20.0)));
        assert_eq!(line2.items.len(), 4);
    }
}
