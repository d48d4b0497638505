use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::db::Dependent;

/// Something a controller did that sibling controllers may need to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    RecordSaved {
        kind: &'static str,
        id: i64,
    },
    RecordDeleted {
        kind: &'static str,
        id: i64,
        cascaded: Vec<Dependent>,
    },
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::RecordSaved { kind, .. } | Event::RecordDeleted { kind, .. } => kind,
        }
    }
}

/// Shared FIFO of engine events. Clones share the same queue; the owner of
/// the interaction loop drains it after each action.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    queue: Rc<RefCell<VecDeque<Event>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: Event) {
        log::debug!("event: {event:?}");
        self.queue.borrow_mut().push_back(event);
    }

    pub fn drain(&self) -> Vec<Event> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_queue() {
        let queue = EventQueue::new();
        let sender = queue.clone();
        sender.emit(Event::RecordSaved {
            kind: "Customer",
            id: 1,
        });
        sender.emit(Event::RecordDeleted {
            kind: "Customer",
            id: 1,
            cascaded: Vec::new(),
        });

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].kind(), "Customer");
        assert!(matches!(drained[1], Event::RecordDeleted { id: 1, .. }));
        assert!(sender.is_empty());
    }
}
