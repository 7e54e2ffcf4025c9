//! Group container holding child diagrams.

use super::{Diagram, DiagramId, ItemableType, SelectionState};
use crate::geometry::{Frame, group_frame, selection_frame};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A group of diagrams that transform together.
///
/// The frame is always the oriented box of the leaves, aligned to the
/// group's own rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub(crate) id: DiagramId,
    pub frame: Frame,
    #[serde(default)]
    pub selection: SelectionState,
    #[serde(default)]
    pub items: Vec<Diagram>,
    #[serde(default)]
    pub itemable_type: ItemableType,
}

impl Group {
    pub fn new(frame: Frame, items: Vec<Diagram>) -> Self {
        Self {
            id: Uuid::new_v4(),
            frame,
            selection: SelectionState::default(),
            items,
            itemable_type: ItemableType::Abstract,
        }
    }

    /// Create a group framed tightly around `items`.
    pub fn from_items(items: Vec<Diagram>) -> Self {
        let frame =
            selection_frame(items.iter()).unwrap_or_else(|| Frame::new(Point::ZERO, 0.0, 0.0));
        Self::new(frame, items)
    }

    /// Copy of this group with its children replaced and the frame refit.
    pub fn with_items(&self, items: Vec<Diagram>) -> Self {
        let mut group = Self {
            id: self.id,
            frame: self.frame,
            selection: self.selection,
            items,
            itemable_type: self.itemable_type,
        };
        group.fit_to_children();
        group
    }

    /// Recompute the frame from the current children.
    pub fn fit_to_children(&mut self) {
        self.frame = group_frame(&self.items, &self.frame);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Dissolve the group into its children.
    pub fn ungroup(self) -> Vec<Diagram> {
        self.items
    }

    /// Check if a point hits any child.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.items.iter().any(|child| child.hit_test(point, tolerance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{DiagramNode, Rectangle};

    fn rect_at(x: f64, y: f64) -> Diagram {
        Diagram::Rectangle(Rectangle::new(Frame::new(Point::new(x, y), 10.0, 10.0)))
    }

    #[test]
    fn test_from_items_bounds_children() {
        let group = Group::from_items(vec![rect_at(0.0, 0.0), rect_at(40.0, 0.0)]);
        assert_eq!(group.frame.center, Point::new(20.0, 0.0));
        assert!((group.frame.width - 50.0).abs() < 1e-9);
        assert!((group.frame.height - 10.0).abs() < 1e-9);
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn test_with_items_keeps_identity() {
        let group = Group::from_items(vec![rect_at(0.0, 0.0), rect_at(40.0, 0.0)]);
        let smaller = group.with_items(vec![rect_at(0.0, 0.0)]);
        assert_eq!(smaller.id(), group.id());
        assert!((smaller.frame.width - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_test_uses_children() {
        let group = Group::from_items(vec![rect_at(0.0, 0.0), rect_at(40.0, 0.0)]);
        assert!(group.hit_test(Point::new(40.0, 0.0), 0.0));
        // Gap between the children is inside the frame but not a hit.
        assert!(!group.hit_test(Point::new(20.0, 0.0), 0.0));
    }
}
