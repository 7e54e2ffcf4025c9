//! Diagram node definitions.

/// Implements the shape capability traits for a framed connectable variant.
///
/// The struct must carry `id`, `frame`, `selection`, `connect_points`,
/// `show_connect_points`, `text` and `style` fields.
macro_rules! connectable_shape {
    ($ty:ty, $tag:expr) => {
        impl $crate::shapes::DiagramNode for $ty {
            fn id(&self) -> $crate::shapes::DiagramId {
                self.id
            }

            fn diagram_type(&self) -> $crate::shapes::DiagramType {
                $tag
            }

            fn position(&self) -> ::kurbo::Point {
                self.frame.center
            }
        }

        impl $crate::shapes::Selectable for $ty {
            fn selection(&self) -> $crate::shapes::SelectionState {
                self.selection
            }

            fn selection_mut(&mut self) -> &mut $crate::shapes::SelectionState {
                &mut self.selection
            }
        }

        impl $crate::shapes::Transformative for $ty {
            fn frame(&self) -> &$crate::geometry::Frame {
                &self.frame
            }

            fn frame_mut(&mut self) -> &mut $crate::geometry::Frame {
                &mut self.frame
            }
        }

        impl $crate::shapes::Connectable for $ty {
            fn connect_points(&self) -> &[$crate::shapes::ConnectPoint] {
                &self.connect_points
            }

            fn connect_points_mut(&mut self) -> &mut Vec<$crate::shapes::ConnectPoint> {
                &mut self.connect_points
            }

            fn show_connect_points(&self) -> bool {
                self.show_connect_points
            }

            fn set_show_connect_points(&mut self, show: bool) {
                self.show_connect_points = show;
            }
        }

        impl $crate::shapes::Textable for $ty {
            fn text(&self) -> &$crate::shapes::TextAttributes {
                &self.text
            }

            fn text_mut(&mut self) -> &mut $crate::shapes::TextAttributes {
                &mut self.text
            }
        }
    };
}

pub(crate) use connectable_shape;

mod connect_line;
mod ellipse;
mod group;
mod image;
mod points;
mod rectangle;
mod style;
mod svg;
mod text;

pub use connect_line::ConnectLine;
pub use ellipse::Ellipse;
pub use group::Group;
pub use image::{Image, ImageFormat};
pub use points::{ConnectPoint, ConnectPointName, PathPoint, frame_connect_points};
pub use rectangle::Rectangle;
pub use style::{ArrowHead, SerializableColor, ShapeStyle, StrokeStyle};
pub use svg::Svg;
pub use text::{FontFamily, FontWeight, TextAlign, TextAttributes};

use crate::geometry::{Frame, bounding_box, segment_crosses_rect};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for every node in the tree, leaves included.
pub type DiagramId = Uuid;

/// Type tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramType {
    Rectangle,
    Ellipse,
    Image,
    Svg,
    Group,
    ConnectLine,
    ConnectPoint,
    PathPoint,
}

impl DiagramType {
    pub fn name(&self) -> &'static str {
        match self {
            DiagramType::Rectangle => "rectangle",
            DiagramType::Ellipse => "ellipse",
            DiagramType::Image => "image",
            DiagramType::Svg => "svg",
            DiagramType::Group => "group",
            DiagramType::ConnectLine => "connect_line",
            DiagramType::ConnectPoint => "connect_point",
            DiagramType::PathPoint => "path_point",
        }
    }
}

impl fmt::Display for DiagramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Selection flags carried by every selectable node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionState {
    #[serde(default)]
    pub is_selected: bool,
    /// Set on each member of a multi-selection.
    #[serde(default)]
    pub is_multi_select_source: bool,
}

impl SelectionState {
    pub fn selected() -> Self {
        Self {
            is_selected: true,
            is_multi_select_source: false,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// How a container's children relate to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemableType {
    /// A pure coordinate frame around its children.
    #[default]
    Abstract,
    /// A container that is itself drawn.
    Canvas,
}

/// Common surface of every node.
pub trait DiagramNode {
    fn id(&self) -> DiagramId;
    fn diagram_type(&self) -> DiagramType;
    /// Center in world coordinates.
    fn position(&self) -> Point;
}

pub trait Selectable: DiagramNode {
    fn selection(&self) -> SelectionState;
    fn selection_mut(&mut self) -> &mut SelectionState;

    fn is_selected(&self) -> bool {
        self.selection().is_selected
    }
}

/// Nodes with a resizable, rotatable frame.
pub trait Transformative: Selectable {
    fn frame(&self) -> &Frame;
    fn frame_mut(&mut self) -> &mut Frame;
}

/// Nodes that own an ordered list of children.
pub trait Itemable {
    type Item;

    fn items(&self) -> &[Self::Item];
    fn items_mut(&mut self) -> &mut Vec<Self::Item>;
}

/// Nodes that expose connect points for connect lines.
pub trait Connectable: Transformative {
    fn connect_points(&self) -> &[ConnectPoint];
    fn connect_points_mut(&mut self) -> &mut Vec<ConnectPoint>;
    fn show_connect_points(&self) -> bool;
    fn set_show_connect_points(&mut self, show: bool);

    fn connect_point(&self, id: DiagramId) -> Option<&ConnectPoint> {
        self.connect_points().iter().find(|p| p.id == id)
    }
}

pub trait Textable {
    fn text(&self) -> &TextAttributes;
    fn text_mut(&mut self) -> &mut TextAttributes;
}

impl DiagramNode for Group {
    fn id(&self) -> DiagramId {
        self.id
    }

    fn diagram_type(&self) -> DiagramType {
        DiagramType::Group
    }

    fn position(&self) -> Point {
        self.frame.center
    }
}

impl Selectable for Group {
    fn selection(&self) -> SelectionState {
        self.selection
    }

    fn selection_mut(&mut self) -> &mut SelectionState {
        &mut self.selection
    }
}

impl Transformative for Group {
    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }
}

impl Itemable for Group {
    type Item = Diagram;

    fn items(&self) -> &[Diagram] {
        &self.items
    }

    fn items_mut(&mut self) -> &mut Vec<Diagram> {
        &mut self.items
    }
}

impl DiagramNode for ConnectLine {
    fn id(&self) -> DiagramId {
        self.id
    }

    fn diagram_type(&self) -> DiagramType {
        DiagramType::ConnectLine
    }

    fn position(&self) -> Point {
        self.center
    }
}

impl Selectable for ConnectLine {
    fn selection(&self) -> SelectionState {
        self.selection
    }

    fn selection_mut(&mut self) -> &mut SelectionState {
        &mut self.selection
    }
}

impl Itemable for ConnectLine {
    type Item = PathPoint;

    fn items(&self) -> &[PathPoint] {
        &self.items
    }

    fn items_mut(&mut self) -> &mut Vec<PathPoint> {
        &mut self.items
    }
}

/// A node of the diagram tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagram {
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Image(Image),
    Svg(Svg),
    Group(Group),
    ConnectLine(ConnectLine),
}

impl Diagram {
    pub fn id(&self) -> DiagramId {
        match self {
            Diagram::Rectangle(s) => s.id(),
            Diagram::Ellipse(s) => s.id(),
            Diagram::Image(s) => s.id(),
            Diagram::Svg(s) => s.id(),
            Diagram::Group(s) => s.id(),
            Diagram::ConnectLine(s) => s.id(),
        }
    }

    pub fn diagram_type(&self) -> DiagramType {
        match self {
            Diagram::Rectangle(s) => s.diagram_type(),
            Diagram::Ellipse(s) => s.diagram_type(),
            Diagram::Image(s) => s.diagram_type(),
            Diagram::Svg(s) => s.diagram_type(),
            Diagram::Group(s) => s.diagram_type(),
            Diagram::ConnectLine(s) => s.diagram_type(),
        }
    }

    pub fn position(&self) -> Point {
        match self {
            Diagram::Rectangle(s) => s.position(),
            Diagram::Ellipse(s) => s.position(),
            Diagram::Image(s) => s.position(),
            Diagram::Svg(s) => s.position(),
            Diagram::Group(s) => s.position(),
            Diagram::ConnectLine(s) => s.position(),
        }
    }

    /// Frame of a transformative node.
    pub fn frame(&self) -> Option<&Frame> {
        match self {
            Diagram::Rectangle(s) => Some(&s.frame),
            Diagram::Ellipse(s) => Some(&s.frame),
            Diagram::Image(s) => Some(&s.frame),
            Diagram::Svg(s) => Some(&s.frame),
            Diagram::Group(s) => Some(&s.frame),
            Diagram::ConnectLine(_) => None,
        }
    }

    pub fn frame_mut(&mut self) -> Option<&mut Frame> {
        match self {
            Diagram::Rectangle(s) => Some(&mut s.frame),
            Diagram::Ellipse(s) => Some(&mut s.frame),
            Diagram::Image(s) => Some(&mut s.frame),
            Diagram::Svg(s) => Some(&mut s.frame),
            Diagram::Group(s) => Some(&mut s.frame),
            Diagram::ConnectLine(_) => None,
        }
    }

    pub fn selection(&self) -> SelectionState {
        match self {
            Diagram::Rectangle(s) => s.selection,
            Diagram::Ellipse(s) => s.selection,
            Diagram::Image(s) => s.selection,
            Diagram::Svg(s) => s.selection,
            Diagram::Group(s) => s.selection,
            Diagram::ConnectLine(s) => s.selection,
        }
    }

    pub fn selection_mut(&mut self) -> &mut SelectionState {
        match self {
            Diagram::Rectangle(s) => &mut s.selection,
            Diagram::Ellipse(s) => &mut s.selection,
            Diagram::Image(s) => &mut s.selection,
            Diagram::Svg(s) => &mut s.selection,
            Diagram::Group(s) => &mut s.selection,
            Diagram::ConnectLine(s) => &mut s.selection,
        }
    }

    pub fn is_selected(&self) -> bool {
        self.selection().is_selected
    }

    pub fn set_selection(&mut self, selection: SelectionState) {
        *self.selection_mut() = selection;
    }

    /// Connect points of a connectable node; empty for everything else.
    pub fn connect_points(&self) -> &[ConnectPoint] {
        match self {
            Diagram::Rectangle(s) => s.connect_points(),
            Diagram::Ellipse(s) => s.connect_points(),
            Diagram::Image(s) => s.connect_points(),
            Diagram::Svg(s) => s.connect_points(),
            Diagram::Group(_) | Diagram::ConnectLine(_) => &[],
        }
    }

    pub fn connect_points_mut(&mut self) -> Option<&mut Vec<ConnectPoint>> {
        match self {
            Diagram::Rectangle(s) => Some(s.connect_points_mut()),
            Diagram::Ellipse(s) => Some(s.connect_points_mut()),
            Diagram::Image(s) => Some(s.connect_points_mut()),
            Diagram::Svg(s) => Some(s.connect_points_mut()),
            Diagram::Group(_) | Diagram::ConnectLine(_) => None,
        }
    }

    pub fn connect_point(&self, id: DiagramId) -> Option<&ConnectPoint> {
        self.connect_points().iter().find(|p| p.id == id)
    }

    pub fn show_connect_points(&self) -> bool {
        match self {
            Diagram::Rectangle(s) => s.show_connect_points,
            Diagram::Ellipse(s) => s.show_connect_points,
            Diagram::Image(s) => s.show_connect_points,
            Diagram::Svg(s) => s.show_connect_points,
            Diagram::Group(_) | Diagram::ConnectLine(_) => false,
        }
    }

    pub fn set_show_connect_points(&mut self, show: bool) {
        match self {
            Diagram::Rectangle(s) => s.set_show_connect_points(show),
            Diagram::Ellipse(s) => s.set_show_connect_points(show),
            Diagram::Image(s) => s.set_show_connect_points(show),
            Diagram::Svg(s) => s.set_show_connect_points(show),
            Diagram::Group(_) | Diagram::ConnectLine(_) => {}
        }
    }

    pub fn text(&self) -> Option<&TextAttributes> {
        match self {
            Diagram::Rectangle(s) => Some(s.text()),
            Diagram::Ellipse(s) => Some(s.text()),
            Diagram::Image(s) => Some(s.text()),
            Diagram::Svg(s) => Some(s.text()),
            Diagram::Group(_) | Diagram::ConnectLine(_) => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut TextAttributes> {
        match self {
            Diagram::Rectangle(s) => Some(s.text_mut()),
            Diagram::Ellipse(s) => Some(s.text_mut()),
            Diagram::Image(s) => Some(s.text_mut()),
            Diagram::Svg(s) => Some(s.text_mut()),
            Diagram::Group(_) | Diagram::ConnectLine(_) => None,
        }
    }

    pub fn style(&self) -> Option<&ShapeStyle> {
        match self {
            Diagram::Rectangle(s) => Some(&s.style),
            Diagram::Ellipse(s) => Some(&s.style),
            Diagram::Image(s) => Some(&s.style),
            Diagram::Svg(s) => Some(&s.style),
            Diagram::ConnectLine(s) => Some(&s.style),
            Diagram::Group(_) => None,
        }
    }

    pub fn style_mut(&mut self) -> Option<&mut ShapeStyle> {
        match self {
            Diagram::Rectangle(s) => Some(&mut s.style),
            Diagram::Ellipse(s) => Some(&mut s.style),
            Diagram::Image(s) => Some(&mut s.style),
            Diagram::Svg(s) => Some(&mut s.style),
            Diagram::ConnectLine(s) => Some(&mut s.style),
            Diagram::Group(_) => None,
        }
    }

    /// Child nodes of a group; empty for everything else.
    pub fn children(&self) -> &[Diagram] {
        match self {
            Diagram::Group(g) => &g.items,
            _ => &[],
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Diagram::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_connect_line(&self) -> Option<&ConnectLine> {
        match self {
            Diagram::ConnectLine(l) => Some(l),
            _ => None,
        }
    }

    /// Move the node and everything it owns by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Diagram::Group(g) => {
                g.frame.translate(delta);
                for child in &mut g.items {
                    child.translate(delta);
                }
            }
            Diagram::ConnectLine(l) => l.translate(delta),
            other => {
                if let Some(frame) = other.frame_mut() {
                    frame.translate(delta);
                }
                if let Some(points) = other.connect_points_mut() {
                    for point in points {
                        point.position += delta;
                    }
                }
            }
        }
    }

    pub fn translated(mut self, delta: Vec2) -> Self {
        self.translate(delta);
        self
    }

    /// Give the node a fresh id, leaving owned leaves untouched.
    pub fn regenerate_id(&mut self) {
        let new_id = Uuid::new_v4();
        match self {
            Diagram::Rectangle(s) => s.id = new_id,
            Diagram::Ellipse(s) => s.id = new_id,
            Diagram::Image(s) => s.id = new_id,
            Diagram::Svg(s) => s.id = new_id,
            Diagram::Group(s) => s.id = new_id,
            Diagram::ConnectLine(s) => s.id = new_id,
        }
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        match self {
            Diagram::Rectangle(s) => s.hit_test(point, tolerance),
            Diagram::Ellipse(s) => s.hit_test(point, tolerance),
            Diagram::Image(s) => s.hit_test(point, tolerance),
            Diagram::Svg(s) => s.hit_test(point, tolerance),
            Diagram::Group(s) => s.hit_test(point, tolerance),
            Diagram::ConnectLine(s) => s.hit_test(point, tolerance),
        }
    }

    /// Test if this node intersects a selection rectangle.
    /// Lines test their segments, everything else its bounding box.
    pub fn intersects_rect(&self, rect: Rect) -> bool {
        match self {
            Diagram::ConnectLine(line) => {
                let points = line.points();
                points.iter().any(|p| rect.contains(*p))
                    || points.windows(2).any(|w| segment_crosses_rect(w[0], w[1], rect))
            }
            other => {
                rect.intersect(bounding_box(other)).area() > 0.0 || rect.contains(other.position())
            }
        }
    }
}

/// Type guard for nodes exposing connect points.
pub fn is_connectable(node: &Diagram) -> bool {
    matches!(
        node,
        Diagram::Rectangle(_) | Diagram::Ellipse(_) | Diagram::Image(_) | Diagram::Svg(_)
    )
}

pub fn is_connect_line(node: &Diagram) -> bool {
    matches!(node, Diagram::ConnectLine(_))
}
