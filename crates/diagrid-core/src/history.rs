//! Snapshot history with gesture coalescing.

use crate::config::MAX_UNDO_HISTORY;
use crate::interaction::EventId;
use crate::shapes::Diagram;
use crate::tree::clear_selection;
use std::collections::VecDeque;

/// Bounded list of full-tree snapshots.
///
/// `index` points at the snapshot matching the current document. Entries
/// after it are the redo tail.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Vec<Diagram>>,
    index: usize,
    capacity: usize,
    /// Event id of the last commit, while it can still be coalesced.
    last_event_id: Option<EventId>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(Vec::new(), MAX_UNDO_HISTORY)
    }
}

impl History {
    /// Start a history whose first entry is `initial`.
    pub fn new(initial: Vec<Diagram>, capacity: usize) -> Self {
        let mut entries = VecDeque::with_capacity(capacity.max(1));
        entries.push_back(initial);
        Self {
            entries,
            index: 0,
            capacity: capacity.max(1),
            last_event_id: None,
        }
    }

    /// Record a snapshot.
    ///
    /// A commit with the same event id as the previous one overwrites it, so
    /// a gesture leaves a single entry however many ticks it had.
    pub fn commit(&mut self, event_id: EventId, items: Vec<Diagram>) {
        if self.last_event_id == Some(event_id) && self.index + 1 == self.entries.len() {
            self.entries[self.index] = items;
            return;
        }
        self.entries.truncate(self.index + 1);
        self.entries.push_back(items);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.index = self.entries.len() - 1;
        self.last_event_id = Some(event_id);
    }

    /// Step back one entry. Returns the restored tree with selection cleared,
    /// or `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<Vec<Diagram>> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.last_event_id = None;
        Some(clear_selection(&self.entries[self.index]))
    }

    /// Step forward one entry, or `None` at the newest.
    pub fn redo(&mut self) -> Option<Vec<Diagram>> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.last_event_id = None;
        Some(clear_selection(&self.entries[self.index]))
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn last_event_id(&self) -> Option<EventId> {
        self.last_event_id
    }

    /// Snapshot at the current index.
    pub fn current(&self) -> Option<&[Diagram]> {
        self.entries.get(self.index).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Frame;
    use crate::shapes::{Rectangle, SelectionState};
    use kurbo::Point;

    fn snapshot(n: usize) -> Vec<Diagram> {
        (0..n)
            .map(|i| {
                let frame = Frame::new(Point::new(i as f64, 0.0), 10.0, 10.0);
                Diagram::Rectangle(Rectangle::new(frame))
            })
            .collect()
    }

    #[test]
    fn test_commit_and_undo_redo() {
        let mut history = History::new(snapshot(0), 20);
        let one = snapshot(1);
        history.commit(EventId::new(), one.clone());
        assert!(history.can_undo());
        assert!(!history.can_redo());

        assert_eq!(history.undo(), Some(snapshot(0)));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), Some(one.clone()));
        assert_eq!(history.redo(), None);
        assert_eq!(history.index(), 1);
    }

    #[test]
    fn test_same_event_coalesces() {
        let mut history = History::new(Vec::new(), 20);
        let id = EventId::new();
        for n in 1..=5 {
            history.commit(id, snapshot(n));
        }
        assert_eq!(history.len(), 2);
        assert_eq!(history.current().map(<[Diagram]>::len), Some(5));
        history.commit(EventId::new(), snapshot(6));
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_undo_resets_coalescing() {
        let mut history = History::new(Vec::new(), 20);
        let id = EventId::new();
        history.commit(id, snapshot(1));
        history.undo();
        history.commit(id, snapshot(2));
        assert_eq!(history.len(), 2);
        assert_eq!(history.index(), 1);
        assert_eq!(history.current().map(<[Diagram]>::len), Some(2));
    }

    #[test]
    fn test_commit_truncates_redo_tail() {
        let mut history = History::new(Vec::new(), 20);
        history.commit(EventId::new(), snapshot(1));
        history.commit(EventId::new(), snapshot(2));
        history.undo();
        history.commit(EventId::new(), snapshot(3));
        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut history = History::new(snapshot(0), 3);
        for n in 1..=5 {
            history.commit(EventId::new(), snapshot(n));
            assert!(history.len() <= 3);
        }
        assert_eq!(history.current().map(<[Diagram]>::len), Some(5));
        history.undo();
        history.undo();
        assert_eq!(history.current().map(<[Diagram]>::len), Some(3));
        assert!(!history.can_undo());
    }

    #[test]
    fn test_restore_clears_selection() {
        let mut selected = snapshot(1);
        selected[0].set_selection(SelectionState::selected());
        let mut history = History::new(selected, 20);
        history.commit(EventId::new(), snapshot(2));
        let restored = history.undo().unwrap();
        assert!(!restored[0].is_selected());
    }
}
