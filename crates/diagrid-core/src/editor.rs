//! The editor: gesture sessions, history and the event channel around the
//! pure handlers.
//!
//! [`Editor::dispatch`] is the gesture boundary. Handler errors are logged
//! there and the previous state is kept, so nothing fails mid-gesture.

use crate::autoscroll::AutoScroller;
use crate::config::EditorConfig;
use crate::error::{ConfigError, EditorError};
use crate::events::{ChannelEvent, EventBus, EventSender, SubscriptionId, Topic};
use crate::history::History;
use crate::interaction::connect::preview_path;
use crate::interaction::{
    CanvasEvent, EditorState, EventId, EventPhase, GestureKind, HandlerContext, apply,
};
use crate::registry::TypeRegistry;
use crate::shapes::{Diagram, DiagramId};
use crate::tree::{all_ids_unique, clear_selection, collect_ids, visit};
use crate::view::ViewData;
use kurbo::{Point, Rect, Vec2};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Instant;

/// Pick tolerance for [`Editor::diagram_at`], in world units.
const HIT_TOLERANCE: f64 = 4.0;

/// Rounds of queued events handled by one [`Editor::flush_events`] call.
const MAX_FLUSH_ROUNDS: usize = 32;

/// What a dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// State changed without a history entry (gesture tick or selection).
    Applied,
    /// State changed and was recorded in history.
    Committed,
    /// Nothing changed.
    Skipped,
    /// An open gesture was rolled back.
    Cancelled,
}

/// An open or just-finished multi-event gesture.
#[derive(Debug, Clone)]
struct GestureSession {
    event_id: EventId,
    kind: GestureKind,
    /// State when the gesture started; every tick derives from it.
    start: EditorState,
    /// Latest event, replayed by auto-scroll ticks.
    last_event: CanvasEvent,
}

/// Last committed event and the state it was applied to.
#[derive(Debug, Clone)]
struct CompletedEvent {
    event_id: EventId,
    start: EditorState,
}

#[derive(Debug)]
pub struct Editor {
    state: EditorState,
    history: History,
    registry: TypeRegistry,
    config: EditorConfig,
    bus: EventBus,
    session: Option<GestureSession>,
    /// Last committed event, kept so a replay of it coalesces.
    completed: Option<CompletedEvent>,
    auto_scroll: AutoScroller,
    viewport: Option<Rect>,
    connect_preview: Option<Vec<Point>>,
    scroll_offset: Vec2,
}

impl Default for Editor {
    fn default() -> Self {
        Self::from_parts(EditorConfig::default(), TypeRegistry::default(), Vec::new())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Result<Self, ConfigError> {
        Self::with_registry(config, TypeRegistry::default())
    }

    pub fn with_registry(
        config: EditorConfig,
        registry: TypeRegistry,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_parts(config, registry, Vec::new()))
    }

    fn from_parts(config: EditorConfig, registry: TypeRegistry, items: Vec<Diagram>) -> Self {
        Self {
            history: History::new(clear_selection(&items), config.history_capacity),
            state: EditorState::new(items),
            registry,
            auto_scroll: AutoScroller::new(config.auto_scroll),
            config,
            bus: EventBus::new(),
            session: None,
            completed: None,
            viewport: None,
            connect_preview: None,
            scroll_offset: Vec2::ZERO,
        }
    }

    /// Replace the document and start a fresh history.
    pub fn load(&mut self, items: Vec<Diagram>) {
        if !all_ids_unique(&items) {
            log::warn!("Loaded document repeats ids, lookups will pick the first match");
        }
        self.reset_gesture();
        self.completed = None;
        self.history = History::new(clear_selection(&items), self.config.history_capacity);
        self.state = EditorState::new(items);
        log::info!("Loaded {} items", self.state.items.len());
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn items(&self) -> &[Diagram] {
        &self.state.items
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn is_gesture_active(&self) -> bool {
        self.session.is_some()
    }

    /// Apply one event.
    pub fn dispatch(&mut self, event: CanvasEvent) -> DispatchOutcome {
        match event.gesture_kind() {
            Some(kind) => self.dispatch_gesture(kind, event),
            None => self.dispatch_discrete(event),
        }
    }

    fn dispatch_discrete(&mut self, event: CanvasEvent) -> DispatchOutcome {
        if self.session.is_some() {
            log::debug!("Discrete event during an open gesture, cancelling it");
            self.cancel();
        }
        let event_id = event.event_id();
        let Some(start) = self.start_for(event_id) else {
            return DispatchOutcome::Skipped;
        };
        let ctx = HandlerContext::new(&self.registry, &self.config);
        let next = match apply(&start, &event, &ctx) {
            Ok(next) => next,
            Err(err) => {
                log_failure(&err);
                return DispatchOutcome::Skipped;
            }
        };
        if next == self.state {
            return DispatchOutcome::Skipped;
        }
        let committed = !same_content(&self.state.items, &next.items);
        self.state = next;
        if !committed {
            // The recorded start no longer leads to the current state.
            self.completed = None;
            return DispatchOutcome::Applied;
        }
        self.completed = Some(CompletedEvent { event_id, start });
        self.commit(event_id);
        if let CanvasEvent::SetStyle(style) = &event {
            self.bus.publish(&ChannelEvent::StyleChange {
                event_id: style.event_id,
                ids: style.ids.clone(),
                style: style.style.clone(),
            });
        }
        DispatchOutcome::Committed
    }

    fn dispatch_gesture(&mut self, kind: GestureKind, event: CanvasEvent) -> DispatchOutcome {
        let event_id = event.event_id();
        let phase = event.phase();

        let open_id = self.session.as_ref().map(|s| s.event_id);
        match open_id {
            Some(active) if active == event_id => {}
            Some(active) if phase == EventPhase::Started => {
                log::debug!("Gesture {event_id} started while {active} was open, cancelling it");
                self.cancel();
            }
            Some(active) => {
                log_failure(&EditorError::GestureMismatch { active, got: event_id });
                return DispatchOutcome::Skipped;
            }
            None => {}
        }
        if self.session.is_none() {
            let Some(start) = self.start_for(event_id) else {
                return DispatchOutcome::Skipped;
            };
            log::debug!("Gesture {event_id} started ({kind:?})");
            self.session = Some(GestureSession {
                event_id,
                kind,
                start,
                last_event: event.clone(),
            });
        }

        self.track_pointer(&event);
        let Some(session) = self.session.as_mut() else {
            return DispatchOutcome::Skipped;
        };
        session.last_event = event.clone();
        let mut ctx = HandlerContext::new(&self.registry, &self.config);
        ctx.scroll_offset = self.scroll_offset;
        let result = apply(&session.start, &event, &ctx);
        self.connect_preview = match &event {
            CanvasEvent::Connect(connect) => preview_path(&session.start, connect, &ctx),
            _ => None,
        };

        match result {
            Ok(next) => {
                self.state = next;
                if phase == EventPhase::Ended {
                    self.finish_gesture()
                } else {
                    DispatchOutcome::Applied
                }
            }
            Err(err) => {
                log_failure(&err);
                if phase == EventPhase::Ended {
                    self.state = session.start.clone();
                    self.reset_gesture();
                }
                DispatchOutcome::Skipped
            }
        }
    }

    /// Close the open gesture and commit it if the document changed.
    fn finish_gesture(&mut self) -> DispatchOutcome {
        let Some(session) = self.session.take() else {
            return DispatchOutcome::Skipped;
        };
        self.reset_gesture();
        let changed = !same_content(&session.start.items, &self.state.items);
        let event_id = session.event_id;
        self.completed = Some(CompletedEvent {
            event_id,
            start: session.start,
        });
        if !changed {
            log::debug!("Gesture {event_id} ended without changes");
            return DispatchOutcome::Applied;
        }
        self.commit(event_id);
        DispatchOutcome::Committed
    }

    /// State an event with `event_id` applies to.
    ///
    /// A replay of the last committed event re-derives from that event's
    /// start state. A replay of an older commit, or of the last one after
    /// the state moved on, is `None`.
    fn start_for(&self, event_id: EventId) -> Option<EditorState> {
        if let Some(done) = self.completed.as_ref().filter(|done| done.event_id == event_id) {
            log::debug!("Replaying {event_id} from its start state");
            return Some(done.start.clone());
        }
        if self.history.last_event_id() == Some(event_id) {
            log::debug!("Event {event_id} is already committed, ignoring the replay");
            return None;
        }
        Some(self.state.clone())
    }

    fn reset_gesture(&mut self) {
        self.session = None;
        self.auto_scroll.disarm();
        self.connect_preview = None;
        self.scroll_offset = Vec2::ZERO;
    }

    fn track_pointer(&mut self, event: &CanvasEvent) {
        let CanvasEvent::Drag(drag) = event else {
            return;
        };
        match (drag.phase, drag.pointer, self.viewport) {
            (EventPhase::Ended, _, _) => self.auto_scroll.disarm(),
            (_, Some(pointer), Some(viewport)) => {
                self.auto_scroll.update(pointer, viewport, Instant::now());
            }
            _ => {}
        }
    }

    fn commit(&mut self, event_id: EventId) {
        self.history.commit(event_id, self.state.items.clone());
        log::debug!("Committed {event_id} ({} history entries)", self.history.len());
        let ids = self.state.items.iter().map(Diagram::id).collect();
        self.bus.publish(&ChannelEvent::DiagramChange { event_id, ids });
    }

    /// Roll back the open gesture.
    pub fn cancel(&mut self) -> DispatchOutcome {
        let Some(session) = self.session.take() else {
            return DispatchOutcome::Skipped;
        };
        log::debug!("Gesture {} cancelled", session.event_id);
        self.state = session.start;
        self.reset_gesture();
        DispatchOutcome::Cancelled
    }

    pub fn undo(&mut self) -> bool {
        self.cancel();
        let Some(items) = self.history.undo() else {
            return false;
        };
        log::debug!("Undo to history entry {}", self.history.index());
        self.restore(items);
        true
    }

    pub fn redo(&mut self) -> bool {
        self.cancel();
        let Some(items) = self.history.redo() else {
            return false;
        };
        log::debug!("Redo to history entry {}", self.history.index());
        self.restore(items);
        true
    }

    fn restore(&mut self, items: Vec<Diagram>) {
        self.completed = None;
        self.state = EditorState::new(items);
        let ids = self.state.items.iter().map(Diagram::id).collect();
        self.bus.publish(&ChannelEvent::DiagramChange {
            event_id: EventId::new(),
            ids,
        });
    }

    /// Screen rectangle of the viewport, enabling auto edge scroll.
    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = Some(viewport);
    }

    /// Fire due auto-scroll ticks for the open drag.
    pub fn tick(&mut self, now: Instant) -> DispatchOutcome {
        let Some(session) = &self.session else {
            return DispatchOutcome::Skipped;
        };
        if session.kind != GestureKind::Drag {
            return DispatchOutcome::Skipped;
        }
        let Some(step) = self.auto_scroll.poll(now) else {
            return DispatchOutcome::Skipped;
        };
        self.scroll_offset += step;
        let event = session.last_event.with_phase(EventPhase::InProgress);
        let mut ctx = HandlerContext::new(&self.registry, &self.config);
        ctx.scroll_offset = self.scroll_offset;
        match apply(&session.start, &event, &ctx) {
            Ok(next) => {
                self.state = next;
                DispatchOutcome::Applied
            }
            Err(err) => {
                log_failure(&err);
                DispatchOutcome::Skipped
            }
        }
    }

    pub fn subscribe<F>(&mut self, topic: Topic, listener: F) -> SubscriptionId
    where
        F: FnMut(&ChannelEvent) + 'static,
    {
        self.bus.subscribe(topic, listener)
    }

    pub fn subscribe_all<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&ChannelEvent) + 'static,
    {
        self.bus.subscribe_all(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Queue for listeners that want to publish follow-up events.
    pub fn sender(&self) -> EventSender {
        self.bus.sender()
    }

    /// Apply a channel event, then deliver it. Returns how many listeners ran.
    pub fn publish(&mut self, event: ChannelEvent) -> usize {
        match &event {
            ChannelEvent::AddDiagram(e) => {
                self.dispatch(CanvasEvent::Add(e.clone()));
            }
            ChannelEvent::Connect(e) => {
                self.dispatch(CanvasEvent::ConnectShapes(e.clone()));
            }
            ChannelEvent::GroupShapes(e) => {
                self.dispatch(CanvasEvent::Group(e.clone()));
            }
            ChannelEvent::Ungroup(e) => {
                self.dispatch(CanvasEvent::Ungroup(e.clone()));
            }
            ChannelEvent::ExecutionPropagation {
                event_id,
                source_id,
                target_id: None,
            } => {
                let mut delivered = self.bus.publish(&event);
                for target in self.outgoing_targets(*source_id) {
                    delivered += self.bus.publish(&ChannelEvent::ExecutionPropagation {
                        event_id: *event_id,
                        source_id: *source_id,
                        target_id: Some(target),
                    });
                }
                return delivered;
            }
            _ => {}
        }
        self.bus.publish(&event)
    }

    /// Publish every queued event, including ones queued while flushing.
    pub fn flush_events(&mut self) -> usize {
        let mut handled = 0;
        for _ in 0..MAX_FLUSH_ROUNDS {
            let queued = self.bus.drain();
            if queued.is_empty() {
                return handled;
            }
            for event in queued {
                self.publish(event);
                handled += 1;
            }
        }
        if self.bus.has_queued() {
            log::warn!("Event queue still busy after {MAX_FLUSH_ROUNDS} rounds");
        }
        handled
    }

    /// Owners at the far end of lines leaving `source`.
    fn outgoing_targets(&self, source: DiagramId) -> Vec<DiagramId> {
        let mut targets = Vec::new();
        visit(&self.state.items, &mut |node: &Diagram| {
            if let Some(line) = node.as_connect_line() {
                if line.start_owner_id == source {
                    targets.push(line.end_owner_id);
                }
            }
        });
        targets
    }

    pub fn view(&self) -> ViewData {
        ViewData::build(&self.state, self.connect_preview.clone(), self.scroll_offset)
    }

    /// Selected nodes plus the lines running between them, ready for the
    /// clipboard.
    pub fn copy_selection(&self) -> Vec<Diagram> {
        let mut copied: Vec<Diagram> =
            self.state.items.iter().filter(|i| i.is_selected()).cloned().collect();
        let ids: HashSet<DiagramId> = collect_ids(&copied).into_iter().collect();
        copied.extend(
            self.state
                .items
                .iter()
                .filter(|item| match item {
                    Diagram::ConnectLine(line) => {
                        !line.selection.is_selected
                            && ids.contains(&line.start_owner_id)
                            && ids.contains(&line.end_owner_id)
                    }
                    _ => false,
                })
                .cloned(),
        );
        clear_selection(&copied)
    }

    /// Export of every top-level node through the registry.
    pub fn export_items(&self) -> Vec<Value> {
        self.state.items.iter().map(|item| self.registry.export(item)).collect()
    }

    /// Topmost top-level node under `point`.
    pub fn diagram_at(&self, point: Point) -> Option<DiagramId> {
        self.state
            .items
            .iter()
            .rev()
            .find(|item| item.hit_test(point, HIT_TOLERANCE))
            .map(Diagram::id)
    }
}

fn log_failure(err: &EditorError) {
    if err.is_contract_violation() {
        log::error!("Rejected event: {err}");
    } else {
        log::warn!("Skipped event: {err}");
    }
}

/// Compare trees ignoring selection and connect point visibility.
fn same_content(a: &[Diagram], b: &[Diagram]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| strip_transient(x) == strip_transient(y))
}

fn strip_transient(node: &Diagram) -> Diagram {
    let mut node = node.clone();
    strip_in_place(&mut node);
    node
}

fn strip_in_place(node: &mut Diagram) {
    node.selection_mut().clear();
    node.set_show_connect_points(false);
    if let Diagram::Group(group) = node {
        for child in &mut group.items {
            strip_in_place(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect::crosses_margin_boxes;
    use crate::geometry::bounding_box;
    use crate::interaction::test_support::{point_id, rect};
    use crate::interaction::{
        AddEvent, ConnectShapesEvent, DeleteEvent, DragEvent, GroupEvent, ReorderEvent, SelectEvent,
        StackOrder, TransformEvent,
    };
    use crate::shapes::{ConnectPointName, DiagramType, ShapeStyle};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    fn editor_with(items: Vec<Diagram>) -> Editor {
        let mut editor = Editor::default();
        editor.load(items);
        editor
    }

    fn connect(editor: &mut Editor) -> DispatchOutcome {
        let items = editor.items().to_vec();
        editor.dispatch(CanvasEvent::ConnectShapes(ConnectShapesEvent {
            event_id: EventId::new(),
            start_owner: items[0].id(),
            start_point: point_id(&items[0], ConnectPointName::Right),
            end_owner: items[1].id(),
            end_point: point_id(&items[1], ConnectPointName::Left),
        }))
    }

    fn drag(
        event_id: EventId,
        phase: EventPhase,
        target: DiagramId,
        dx: f64,
        dy: f64,
    ) -> CanvasEvent {
        CanvasEvent::Drag(DragEvent {
            event_id,
            phase,
            target: Some(target),
            start: Point::ZERO,
            current: Point::new(dx, dy),
            pointer: None,
        })
    }

    fn select(id: DiagramId, additive: bool) -> CanvasEvent {
        CanvasEvent::Select(SelectEvent {
            event_id: EventId::new(),
            target: id,
            additive,
        })
    }

    fn delete(target: Option<DiagramId>) -> CanvasEvent {
        CanvasEvent::Delete(DeleteEvent {
            event_id: EventId::new(),
            target,
        })
    }

    fn add() -> CanvasEvent {
        CanvasEvent::Add(AddEvent {
            event_id: EventId::new(),
            diagram_type: DiagramType::Rectangle,
            position: Point::ZERO,
            size: None,
        })
    }

    #[test]
    fn test_connect_then_move_reroutes() {
        let mut editor = editor_with(vec![rect(0.0, 0.0), rect(400.0, 0.0)]);
        assert_eq!(connect(&mut editor), DispatchOutcome::Committed);
        let line = editor.items()[2].as_connect_line().unwrap();
        assert_eq!(line.points(), vec![Point::new(50.0, 0.0), Point::new(350.0, 0.0)]);

        let r2 = editor.items()[1].id();
        let id = EventId::new();
        let started = editor.dispatch(drag(id, EventPhase::Started, r2, 0.0, 0.0));
        assert_eq!(started, DispatchOutcome::Applied);
        let moving = editor.dispatch(drag(id, EventPhase::InProgress, r2, 0.0, 150.0));
        assert_eq!(moving, DispatchOutcome::Applied);
        let ended = editor.dispatch(drag(id, EventPhase::Ended, r2, 0.0, 300.0));
        assert_eq!(ended, DispatchOutcome::Committed);

        let items = editor.items();
        assert_eq!(items[1].position(), Point::new(400.0, 300.0));
        let path = items[2].as_connect_line().unwrap().points();
        assert_eq!(
            path,
            vec![
                Point::new(50.0, 0.0),
                Point::new(200.0, 0.0),
                Point::new(200.0, 300.0),
                Point::new(350.0, 300.0),
            ]
        );
        let margin = editor.config().connect_margin;
        let [a, b] = [bounding_box(&items[0]), bounding_box(&items[1])];
        assert!(!crosses_margin_boxes(&path, a, b, margin));
        // One entry for the connect, one for the whole drag.
        assert_eq!(editor.history().len(), 3);
    }

    #[test]
    fn test_group_delete_undo() {
        let mut editor = editor_with(vec![rect(0.0, 0.0), rect(200.0, 0.0)]);
        let [a, b] = [editor.items()[0].id(), editor.items()[1].id()];
        assert_eq!(editor.dispatch(select(a, false)), DispatchOutcome::Applied);
        assert_eq!(editor.dispatch(select(b, true)), DispatchOutcome::Applied);
        assert_eq!(editor.history().len(), 1);

        let group = CanvasEvent::Group(GroupEvent {
            event_id: EventId::new(),
            ids: Vec::new(),
        });
        assert_eq!(editor.dispatch(group), DispatchOutcome::Committed);
        assert_eq!(editor.items().len(), 1);
        assert_eq!(editor.items()[0].children().len(), 2);
        assert!(editor.state().multi_select.is_none());

        assert_eq!(editor.dispatch(delete(None)), DispatchOutcome::Committed);
        assert!(editor.items().is_empty());

        assert!(editor.undo());
        assert_eq!(editor.items().len(), 1);
        assert_eq!(editor.items()[0].children().len(), 2);
        assert!(!editor.items()[0].is_selected());
        assert!(editor.items()[0].children().iter().all(|c| !c.is_selected()));
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut editor = editor_with(vec![rect(0.0, 0.0)]);
        editor.dispatch(add());
        let committed = clear_selection(editor.items());
        assert!(editor.undo());
        let before = editor.items().to_vec();
        assert!(editor.redo());
        assert_eq!(editor.items(), committed.as_slice());
        assert!(editor.undo());
        assert_eq!(editor.items(), before.as_slice());

        // Both are no-ops at the bounds.
        assert!(!editor.undo());
        assert_eq!(editor.items(), before.as_slice());
        assert!(editor.redo());
        assert!(!editor.redo());
    }

    #[test]
    fn test_absent_id_is_noop() {
        let mut editor = editor_with(vec![rect(0.0, 0.0), rect(200.0, 0.0)]);
        let before = editor.items().to_vec();
        let missing = uuid::Uuid::new_v4();
        assert_eq!(editor.dispatch(delete(Some(missing))), DispatchOutcome::Skipped);
        let reorder = CanvasEvent::Reorder(ReorderEvent {
            event_id: EventId::new(),
            target: missing,
            order: StackOrder::BringToFront,
        });
        assert_eq!(editor.dispatch(reorder), DispatchOutcome::Skipped);
        let transform = CanvasEvent::Transform(TransformEvent {
            event_id: EventId::new(),
            phase: EventPhase::Ended,
            target: Some(missing),
            frame: *before[0].frame().unwrap(),
        });
        assert_eq!(editor.dispatch(transform), DispatchOutcome::Skipped);
        assert_eq!(editor.items(), before.as_slice());
        assert_eq!(editor.history().len(), 1);
    }

    #[test]
    fn test_history_cap() {
        let config = EditorConfig {
            history_capacity: 3,
            ..EditorConfig::default()
        };
        let mut editor = Editor::new(config).unwrap();
        for _ in 0..5 {
            assert_eq!(editor.dispatch(add()), DispatchOutcome::Committed);
            assert!(editor.history().len() <= 3);
        }
        assert!(editor.undo());
        assert!(editor.undo());
        assert!(!editor.undo());
        assert_eq!(editor.items().len(), 3);
    }

    #[test]
    fn test_cancel_restores_start() {
        let mut editor = editor_with(vec![rect(0.0, 0.0)]);
        let target = editor.items()[0].id();
        let id = EventId::new();
        editor.dispatch(drag(id, EventPhase::Started, target, 0.0, 0.0));
        editor.dispatch(drag(id, EventPhase::InProgress, target, 50.0, 0.0));
        assert_eq!(editor.items()[0].position(), Point::new(50.0, 0.0));
        assert_eq!(editor.cancel(), DispatchOutcome::Cancelled);
        assert_eq!(editor.items()[0].position(), Point::ZERO);
        assert!(!editor.is_gesture_active());
        assert_eq!(editor.history().len(), 1);
    }

    #[test]
    fn test_mismatched_gesture_is_rejected() {
        let mut editor = editor_with(vec![rect(0.0, 0.0)]);
        let target = editor.items()[0].id();
        let open = EventId::new();
        editor.dispatch(drag(open, EventPhase::Started, target, 0.0, 0.0));
        let stray = drag(EventId::new(), EventPhase::InProgress, target, 10.0, 0.0);
        let outcome = editor.dispatch(stray);
        assert_eq!(outcome, DispatchOutcome::Skipped);
        assert_eq!(editor.items()[0].position(), Point::ZERO);

        // A new Started takes over.
        let next = EventId::new();
        editor.dispatch(drag(next, EventPhase::Started, target, 0.0, 0.0));
        editor.dispatch(drag(next, EventPhase::Ended, target, 0.0, 30.0));
        assert_eq!(editor.items()[0].position(), Point::new(0.0, 30.0));
    }

    #[test]
    fn test_replaying_gesture_coalesces() {
        let mut editor = editor_with(vec![rect(0.0, 0.0)]);
        let target = editor.items()[0].id();
        let id = EventId::new();
        editor.dispatch(drag(id, EventPhase::Started, target, 0.0, 0.0));
        editor.dispatch(drag(id, EventPhase::Ended, target, 40.0, 0.0));
        let once = editor.items().to_vec();
        let len = editor.history().len();

        editor.dispatch(drag(id, EventPhase::Ended, target, 40.0, 0.0));
        assert_eq!(editor.items(), once.as_slice());
        assert_eq!(editor.history().len(), len);
    }

    #[test]
    fn test_discrete_replay_is_idempotent() {
        let mut editor = editor_with(vec![rect(0.0, 0.0)]);
        let event = add();
        assert_eq!(editor.dispatch(event.clone()), DispatchOutcome::Committed);
        assert_eq!(editor.dispatch(event.clone()), DispatchOutcome::Committed);
        assert_eq!(editor.items().len(), 2);
        assert_eq!(editor.history().len(), 2);

        // Once the state has moved on the replay has no effect.
        let first = editor.items()[0].id();
        assert_eq!(editor.dispatch(select(first, false)), DispatchOutcome::Applied);
        assert_eq!(editor.dispatch(event), DispatchOutcome::Skipped);
        assert_eq!(editor.items().len(), 2);
        assert!(editor.items()[0].is_selected());
        assert_eq!(editor.history().len(), 2);
    }

    #[test]
    fn test_gesture_replay_after_selection() {
        let mut editor = editor_with(vec![rect(0.0, 0.0), rect(300.0, 0.0)]);
        let [a, b] = [editor.items()[0].id(), editor.items()[1].id()];
        let id = EventId::new();
        let ended = drag(id, EventPhase::Ended, a, 40.0, 0.0);
        editor.dispatch(drag(id, EventPhase::Started, a, 0.0, 0.0));
        assert_eq!(editor.dispatch(ended.clone()), DispatchOutcome::Committed);
        assert_eq!(editor.dispatch(select(b, false)), DispatchOutcome::Applied);

        assert_eq!(editor.dispatch(ended), DispatchOutcome::Skipped);
        assert!(!editor.is_gesture_active());
        assert_eq!(editor.items()[0].position(), Point::new(40.0, 0.0));
        assert!(editor.items()[1].is_selected());
        assert!(!editor.items()[0].is_selected());
        assert_eq!(editor.history().len(), 2);
    }

    #[test]
    fn test_auto_scroll_moves_drag() {
        let mut editor = editor_with(vec![rect(0.0, 0.0)]);
        editor.set_viewport(Rect::new(0.0, 0.0, 800.0, 600.0));
        let target = editor.items()[0].id();
        let id = EventId::new();
        editor.dispatch(drag(id, EventPhase::Started, target, 0.0, 0.0));
        let mut tick = drag(id, EventPhase::InProgress, target, 10.0, 0.0);
        if let CanvasEvent::Drag(drag) = &mut tick {
            drag.pointer = Some(Point::new(795.0, 300.0));
        }
        editor.dispatch(tick);
        let later = Instant::now() + Duration::from_millis(100);
        assert_eq!(editor.tick(later), DispatchOutcome::Applied);
        assert!(editor.items()[0].position().x > 10.0);
        assert!(editor.view().scroll_offset.x > 0.0);

        editor.dispatch(drag(id, EventPhase::Ended, target, 10.0, 0.0));
        assert_eq!(editor.tick(Instant::now() + Duration::from_secs(1)), DispatchOutcome::Skipped);
        assert_eq!(editor.view().scroll_offset, Vec2::ZERO);
    }

    #[test]
    fn test_publish_applies_mutations_and_notifies() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut editor = editor_with(Vec::new());
        let log = Rc::clone(&seen);
        editor.subscribe_all(move |event| log.borrow_mut().push(event.topic()));

        let request = ChannelEvent::AddDiagram(AddEvent {
            event_id: EventId::new(),
            diagram_type: DiagramType::Ellipse,
            position: Point::new(5.0, 5.0),
            size: None,
        });
        assert_eq!(editor.publish(request), 1);
        assert_eq!(editor.items().len(), 1);
        assert_eq!(*seen.borrow(), vec![Topic::DiagramChange, Topic::AddDiagram]);
    }

    #[test]
    fn test_style_change_is_published() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut editor = editor_with(vec![rect(0.0, 0.0)]);
        let log = Rc::clone(&seen);
        editor.subscribe(Topic::StyleChange, move |event| log.borrow_mut().push(event.clone()));
        let style = ShapeStyle {
            stroke_width: 5.0,
            ..ShapeStyle::default()
        };
        let event = CanvasEvent::SetStyle(crate::interaction::StyleEvent {
            event_id: EventId::new(),
            ids: vec![editor.items()[0].id()],
            style,
        });
        assert_eq!(editor.dispatch(event), DispatchOutcome::Committed);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_execution_propagation_fans_out() {
        let mut editor = editor_with(vec![rect(0.0, 0.0), rect(400.0, 0.0)]);
        connect(&mut editor);
        let source = editor.items()[0].id();
        let target = editor.items()[1].id();
        let targets = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&targets);
        editor.subscribe(Topic::ExecutionPropagation, move |event| {
            if let ChannelEvent::ExecutionPropagation { target_id: Some(t), .. } = event {
                log.borrow_mut().push(*t);
            }
        });
        let delivered = editor.publish(ChannelEvent::ExecutionPropagation {
            event_id: EventId::new(),
            source_id: source,
            target_id: None,
        });
        assert_eq!(delivered, 2);
        assert_eq!(*targets.borrow(), vec![target]);
    }

    #[test]
    fn test_flush_handles_queued_requests() {
        let mut editor = editor_with(vec![rect(0.0, 0.0), rect(200.0, 0.0)]);
        let ids: Vec<DiagramId> = editor.items().iter().map(Diagram::id).collect();
        let sender = editor.sender();
        editor.subscribe(Topic::AddDiagram, move |_| {
            sender.send(ChannelEvent::GroupShapes(GroupEvent {
                event_id: EventId::new(),
                ids: ids.clone(),
            }));
        });
        editor.sender().send(ChannelEvent::AddDiagram(AddEvent {
            event_id: EventId::new(),
            diagram_type: DiagramType::Rectangle,
            position: Point::new(0.0, 400.0),
            size: None,
        }));
        assert_eq!(editor.flush_events(), 2);
        assert_eq!(editor.items().len(), 2);
        assert!(editor.items().iter().any(|i| i.as_group().is_some()));
    }

    #[test]
    fn test_copy_selection_includes_inner_lines() {
        let mut editor = editor_with(vec![rect(0.0, 0.0), rect(400.0, 0.0)]);
        connect(&mut editor);
        let [a, b] = [editor.items()[0].id(), editor.items()[1].id()];
        editor.dispatch(select(a, false));
        assert_eq!(editor.copy_selection().len(), 1);
        editor.dispatch(select(b, true));
        let copied = editor.copy_selection();
        assert_eq!(copied.len(), 3);
        assert!(copied.iter().all(|c| !c.is_selected()));
    }

    #[test]
    fn test_diagram_at_picks_topmost() {
        let editor = editor_with(vec![rect(0.0, 0.0), rect(20.0, 0.0)]);
        assert_eq!(editor.diagram_at(Point::new(10.0, 0.0)), Some(editor.items()[1].id()));
        assert_eq!(editor.diagram_at(Point::new(-45.0, 0.0)), Some(editor.items()[0].id()));
        assert_eq!(editor.diagram_at(Point::new(500.0, 500.0)), None);
    }

    #[test]
    fn test_export_items() {
        let editor = editor_with(vec![rect(0.0, 0.0)]);
        let exported = editor.export_items();
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0]["type"], "rectangle");
    }
}
