//! Type-keyed table of per-variant behaviour.

use crate::error::EditorError;
use crate::geometry::{Frame, FrameChange};
use crate::interaction::transform::transform_node;
use crate::shapes::{
    ConnectPoint, Diagram, DiagramType, Ellipse, Image, Rectangle, Svg, frame_connect_points,
};
use kurbo::{Point, Size};
use serde_json::{Value, json};
use std::collections::HashMap;

/// Behaviour registered for one diagram type.
#[derive(Debug, Clone, Copy)]
pub struct DiagramDefinition {
    /// Create a node centered at a position. `None` for types that can only
    /// be built from other nodes.
    pub create: fn(Point, Size) -> Option<Diagram>,
    /// Calculate the connect points of a node from its frame.
    pub connect_points: fn(&Diagram) -> Vec<ConnectPoint>,
    /// Map a container's children through a frame change.
    pub transform_children: fn(&FrameChange, &[Diagram]) -> Vec<Diagram>,
    /// Compact plain-data description of a node.
    pub export: fn(&Diagram) -> Value,
}

/// Lookup table from type tag to definition, injected into every handler.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    definitions: HashMap<DiagramType, DiagramDefinition>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
        }
    }

    /// A registry with every built-in variant.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(DiagramType::Rectangle, shape_definition(create_rectangle));
        registry.register(DiagramType::Ellipse, shape_definition(create_ellipse));
        registry.register(
            DiagramType::Image,
            DiagramDefinition {
                export: export_image,
                ..shape_definition(create_image)
            },
        );
        registry.register(DiagramType::Svg, shape_definition(create_svg));
        registry.register(
            DiagramType::Group,
            DiagramDefinition {
                create: |_, _| None,
                connect_points: |_| Vec::new(),
                transform_children,
                export: export_group,
            },
        );
        registry.register(
            DiagramType::ConnectLine,
            DiagramDefinition {
                create: |_, _| None,
                connect_points: |_| Vec::new(),
                transform_children: |_, items| items.to_vec(),
                export: export_line,
            },
        );
        registry
    }

    /// Register or replace a definition.
    pub fn register(&mut self, diagram_type: DiagramType, definition: DiagramDefinition) {
        self.definitions.insert(diagram_type, definition);
    }

    pub fn get(&self, diagram_type: DiagramType) -> Result<&DiagramDefinition, EditorError> {
        self.definitions
            .get(&diagram_type)
            .ok_or(EditorError::UnregisteredType(diagram_type))
    }

    pub fn contains(&self, diagram_type: DiagramType) -> bool {
        self.definitions.contains_key(&diagram_type)
    }

    /// Create a node through its definition.
    pub fn create(
        &self,
        diagram_type: DiagramType,
        position: Point,
        size: Size,
    ) -> Result<Option<Diagram>, EditorError> {
        let definition = self.get(diagram_type)?;
        Ok((definition.create)(position, size))
    }

    /// Copy of `node` with connect points recalculated. Unknown types are
    /// logged and returned unchanged.
    pub fn refresh_connect_points(&self, node: &Diagram) -> Diagram {
        let mut node = node.clone();
        match self.get(node.diagram_type()) {
            Ok(definition) => {
                let points = (definition.connect_points)(&node);
                if let Some(existing) = node.connect_points_mut() {
                    *existing = points;
                }
            }
            Err(err) => log::warn!("Skipping connect point refresh: {err}"),
        }
        node
    }

    /// Export a node, or `Value::Null` for an unregistered type.
    pub fn export(&self, node: &Diagram) -> Value {
        match self.get(node.diagram_type()) {
            Ok(definition) => (definition.export)(node),
            Err(err) => {
                log::warn!("Skipping export: {err}");
                Value::Null
            }
        }
    }
}

fn shape_definition(create: fn(Point, Size) -> Option<Diagram>) -> DiagramDefinition {
    DiagramDefinition {
        create,
        connect_points: shape_connect_points,
        transform_children: |_, items| items.to_vec(),
        export: export_shape,
    }
}

fn frame_at(position: Point, size: Size) -> Frame {
    Frame::new(position, size.width, size.height)
}

fn create_rectangle(position: Point, size: Size) -> Option<Diagram> {
    Some(Diagram::Rectangle(Rectangle::new(frame_at(position, size))))
}

fn create_ellipse(position: Point, size: Size) -> Option<Diagram> {
    Some(Diagram::Ellipse(Ellipse::new(frame_at(position, size))))
}

fn create_image(position: Point, size: Size) -> Option<Diagram> {
    Some(Diagram::Image(Image::new(frame_at(position, size))))
}

fn create_svg(position: Point, size: Size) -> Option<Diagram> {
    Some(Diagram::Svg(Svg::new(frame_at(position, size), String::new())))
}

fn shape_connect_points(node: &Diagram) -> Vec<ConnectPoint> {
    match node.frame() {
        Some(frame) => frame_connect_points(frame, node.connect_points()),
        None => Vec::new(),
    }
}

fn transform_children(change: &FrameChange, items: &[Diagram]) -> Vec<Diagram> {
    items.iter().map(|child| transform_node(change, child)).collect()
}

fn export_shape(node: &Diagram) -> Value {
    let frame = node.frame().copied().unwrap_or_else(|| Frame::new(node.position(), 0.0, 0.0));
    json!({
        "type": node.diagram_type().name(),
        "id": node.id(),
        "center": [frame.center.x, frame.center.y],
        "size": [frame.width, frame.height],
        "rotation": frame.rotation,
        "text": node.text().map(|t| t.content.clone()).unwrap_or_default(),
    })
}

fn export_image(node: &Diagram) -> Value {
    let mut value = export_shape(node);
    if let Diagram::Image(image) = node {
        value["src"] = image.data_url().map_or(Value::Null, Value::String);
    }
    value
}

fn export_group(node: &Diagram) -> Value {
    let mut value = export_shape(node);
    value["children"] = node.children().iter().map(|c| c.id().to_string()).collect();
    value
}

fn export_line(node: &Diagram) -> Value {
    let Some(line) = node.as_connect_line() else {
        return Value::Null;
    };
    json!({
        "type": node.diagram_type().name(),
        "id": line.id,
        "start_owner_id": line.start_owner_id,
        "end_owner_id": line.end_owner_id,
        "auto_routing": line.auto_routing,
        "points": line.points().iter().map(|p| [p.x, p.y]).collect::<Vec<_>>(),
    })
}
