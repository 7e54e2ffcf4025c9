//! Per-editor publish/subscribe channel.
//!
//! Listeners run synchronously in subscription order. A listener that wants
//! to publish a follow-up event queues it through an [`EventSender`]; the
//! editor drains the queue afterwards.

use crate::interaction::{AddEvent, ConnectShapesEvent, EventId, GroupEvent, UngroupEvent};
use crate::shapes::{DiagramId, ShapeStyle};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Channel topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    AddDiagram,
    Connect,
    GroupShapes,
    Ungroup,
    DiagramChange,
    StyleChange,
    ExecutionPropagation,
}

/// A message on the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic", rename_all = "snake_case")]
pub enum ChannelEvent {
    /// Request to create a node.
    AddDiagram(AddEvent),
    /// Request to connect two connect points.
    Connect(ConnectShapesEvent),
    /// Request to group nodes.
    GroupShapes(GroupEvent),
    /// Request to dissolve a group.
    Ungroup(UngroupEvent),
    /// The tree changed; `ids` are the top-level nodes after the change.
    DiagramChange {
        event_id: EventId,
        ids: Vec<DiagramId>,
    },
    /// Nodes were restyled.
    StyleChange {
        event_id: EventId,
        ids: Vec<DiagramId>,
        style: ShapeStyle,
    },
    /// Run signal passed along connect lines. Without a target it is a
    /// request to fan out from `source_id`.
    ExecutionPropagation {
        event_id: EventId,
        source_id: DiagramId,
        #[serde(default)]
        target_id: Option<DiagramId>,
    },
}

impl ChannelEvent {
    pub fn topic(&self) -> Topic {
        match self {
            ChannelEvent::AddDiagram(_) => Topic::AddDiagram,
            ChannelEvent::Connect(_) => Topic::Connect,
            ChannelEvent::GroupShapes(_) => Topic::GroupShapes,
            ChannelEvent::Ungroup(_) => Topic::Ungroup,
            ChannelEvent::DiagramChange { .. } => Topic::DiagramChange,
            ChannelEvent::StyleChange { .. } => Topic::StyleChange,
            ChannelEvent::ExecutionPropagation { .. } => Topic::ExecutionPropagation,
        }
    }

    pub fn event_id(&self) -> EventId {
        match self {
            ChannelEvent::AddDiagram(e) => e.event_id,
            ChannelEvent::Connect(e) => e.event_id,
            ChannelEvent::GroupShapes(e) => e.event_id,
            ChannelEvent::Ungroup(e) => e.event_id,
            ChannelEvent::DiagramChange { event_id, .. }
            | ChannelEvent::StyleChange { event_id, .. }
            | ChannelEvent::ExecutionPropagation { event_id, .. } => *event_id,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ChannelEvent)>;

struct Subscription {
    id: SubscriptionId,
    /// `None` receives every topic.
    topic: Option<Topic>,
    listener: Listener,
}

/// Queues events for later delivery. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventSender {
    queue: Rc<RefCell<VecDeque<ChannelEvent>>>,
}

impl EventSender {
    pub fn send(&self, event: ChannelEvent) {
        self.queue.borrow_mut().push_back(event);
    }
}

#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscriptions: Vec<Subscription>,
    queue: Rc<RefCell<VecDeque<ChannelEvent>>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .field("queued", &self.queue.borrow().len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen to one topic.
    pub fn subscribe<F>(&mut self, topic: Topic, listener: F) -> SubscriptionId
    where
        F: FnMut(&ChannelEvent) + 'static,
    {
        self.add(Some(topic), Box::new(listener))
    }

    /// Listen to every topic.
    pub fn subscribe_all<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&ChannelEvent) + 'static,
    {
        self.add(None, Box::new(listener))
    }

    fn add(&mut self, topic: Option<Topic>, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription { id, topic, listener });
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Deliver to current subscribers, in subscription order. Returns how
    /// many listeners ran.
    pub fn publish(&mut self, event: &ChannelEvent) -> usize {
        let topic = event.topic();
        let mut delivered = 0;
        for subscription in &mut self.subscriptions {
            if subscription.topic.is_none_or(|t| t == topic) {
                (subscription.listener)(event);
                delivered += 1;
            }
        }
        log::debug!("Delivered {topic:?} to {delivered} listeners");
        delivered
    }

    pub fn sender(&self) -> EventSender {
        EventSender {
            queue: Rc::clone(&self.queue),
        }
    }

    /// Take every queued event, oldest first.
    pub fn drain(&self) -> Vec<ChannelEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn has_queued(&self) -> bool {
        !self.queue.borrow().is_empty()
    }
}
