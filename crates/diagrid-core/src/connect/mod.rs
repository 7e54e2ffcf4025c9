//! Orthogonal connect lines between connectable shapes.

mod direction;
mod refresh;
mod router;

pub use direction::Direction;
pub use refresh::{adjust_manual_path, refresh_line, refresh_lines, route_end};
pub use router::{
    Candidate, RouteEnd, RouteOptions, candidate_lattice, candidates, crosses_margin_boxes,
    heuristic_mid, preview, route, simplify,
};

use crate::error::EditorError;
use crate::shapes::{ConnectLine, Diagram, DiagramId, is_connectable};
use crate::tree::TreeIndex;

/// Build an auto-routed line between two connect points in `items`.
///
/// Both owners must exist and be connectable, and each point must belong
/// to its owner.
pub fn connect_shapes(
    items: &[Diagram],
    start_owner: DiagramId,
    start_point: DiagramId,
    end_owner: DiagramId,
    end_point: DiagramId,
    options: &RouteOptions,
) -> Result<ConnectLine, EditorError> {
    let index = TreeIndex::build(items);
    let start = resolve_end(items, &index, start_owner, start_point)?;
    let end = resolve_end(items, &index, end_owner, end_point)?;
    let points = route(&start, &end, options);
    Ok(ConnectLine::new(start_owner, start_point, end_owner, end_point, &points))
}

fn resolve_end(
    items: &[Diagram],
    index: &TreeIndex,
    owner: DiagramId,
    point: DiagramId,
) -> Result<RouteEnd, EditorError> {
    let node = index.get(items, owner).ok_or(EditorError::DiagramNotFound(owner))?;
    if !is_connectable(node) {
        return Err(EditorError::NotConnectable(owner));
    }
    route_end(items, index, owner, point).ok_or(EditorError::ConnectPointNotFound { owner, point })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Frame;
    use crate::shapes::{Group, Rectangle};
    use kurbo::Point;

    fn rect(x: f64) -> Diagram {
        Diagram::Rectangle(Rectangle::new(Frame::new(Point::new(x, 0.0), 100.0, 100.0)))
    }

    #[test]
    fn test_connect_shapes_routes_line() {
        let items = vec![rect(0.0), rect(400.0)];
        let right = items[0].connect_points()[1].id;
        let left = items[1].connect_points()[3].id;
        let options = RouteOptions::default();
        let line =
            connect_shapes(&items, items[0].id(), right, items[1].id(), left, &options).unwrap();
        assert_eq!(line.points(), vec![Point::new(50.0, 0.0), Point::new(350.0, 0.0)]);
        assert!(line.auto_routing);
    }

    #[test]
    fn test_connect_rejects_bad_references() {
        let group = Diagram::Group(Group::from_items(vec![rect(0.0), rect(200.0)]));
        let items = vec![rect(400.0), group];
        let options = RouteOptions::default();
        let owner = items[0].id();
        let point = items[0].connect_points()[0].id;

        let missing = uuid::Uuid::new_v4();
        assert!(matches!(
            connect_shapes(&items, missing, point, owner, point, &options),
            Err(EditorError::DiagramNotFound(_))
        ));
        assert!(matches!(
            connect_shapes(&items, items[1].id(), point, owner, point, &options),
            Err(EditorError::NotConnectable(_))
        ));
        assert!(matches!(
            connect_shapes(&items, owner, missing, owner, point, &options),
            Err(EditorError::ConnectPointNotFound { .. })
        ));
    }
}
