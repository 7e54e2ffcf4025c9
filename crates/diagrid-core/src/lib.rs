//! diagrid core library
//!
//! Interaction and state engine for a diagram canvas: the diagram tree,
//! geometry, orthogonal connect line routing, gesture handlers, undo
//! history and a per-editor event channel. Rendering and input capture
//! live outside this crate.

pub mod autoscroll;
pub mod config;
pub mod connect;
pub mod editor;
pub mod error;
pub mod events;
pub mod geometry;
pub mod history;
pub mod interaction;
pub mod registry;
pub mod shapes;
pub mod tree;
pub mod view;

pub use autoscroll::AutoScroller;
pub use config::{AutoScrollConfig, EditorConfig, MAX_UNDO_HISTORY};
pub use connect::{RouteOptions, connect_shapes, route};
pub use editor::{DispatchOutcome, Editor};
pub use error::{ConfigError, EditorError, EditorResult};
pub use events::{ChannelEvent, EventBus, EventSender, SubscriptionId, Topic};
pub use geometry::{Frame, FrameChange};
pub use history::History;
pub use interaction::{CanvasEvent, EditorState, EventId, EventPhase, GestureKind, HandlerContext};
pub use registry::{DiagramDefinition, TypeRegistry};
pub use shapes::{Diagram, DiagramId, DiagramType};
pub use tree::{TreeIndex, walk};
pub use view::{ActiveTransform, Outline, ViewData};
