//! Change-notification fan-out for the view pipeline.
//!
//! An explicit subscription registry: callbacks are registered with
//! [`Subscribers::subscribe`], receive every [`ViewEvent`] in
//! registration order, and may answer with [`ViewRequest`]s that the
//! view applies once the emitting operation has returned. Requests
//! raised while a rebuild is running are exactly what the rebuild
//! guard coalesces.

use crate::tasks::models::Priority;
use crate::view::{SortMode, StatusFilter};

/// A change the view announces to its subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// The source collection was reloaded from storage.
    Loaded,
    /// A task's fields changed and were written through.
    TaskChanged(i64),
    /// The derived view collection was recomputed.
    Rebuilt,
    /// Manual order was reassigned and persisted.
    OrderPersisted,
}

/// A follow-up a subscriber may request in response to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewRequest {
    /// Recompute the view collection.
    Rebuild,
    /// Replace the free-text search filter (empty turns it off).
    SetSearchText(String),
    /// Replace the tag filter text (empty turns it off).
    SetTagFilter(String),
    /// Replace the category filter (`None` selects all).
    SetCategoryFilter(Option<String>),
    /// Replace the priority filter (`None` selects all).
    SetPriorityFilter(Option<Priority>),
    /// Replace the status filter.
    SetStatusFilter(StatusFilter),
    /// Replace the sort mode.
    SetSortMode(SortMode),
}

/// Identifier returned by [`Subscribers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Callback signature: observe an event, optionally request follow-ups.
pub type Callback = Box<dyn FnMut(&ViewEvent) -> Vec<ViewRequest>>;

/// Registry of event callbacks.
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    entries: Vec<(SubscriptionId, Callback)>,
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers").field("count", &self.entries.len()).finish()
    }
}

impl Subscribers {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback and return its id.
    pub fn subscribe(&mut self, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }

    /// Remove a callback. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no callbacks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fan `event` out to every callback, in registration order, and
    /// collect their requests.
    pub fn emit(&mut self, event: &ViewEvent) -> Vec<ViewRequest> {
        let mut requests = Vec::new();
        for (_, callback) in &mut self.entries {
            requests.extend(callback(event));
        }
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_emit_reaches_every_subscriber_in_order() {
        let mut subscribers = Subscribers::new();
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));

        for tag in ["first", "second"] {
            let order = Rc::clone(&order);
            subscribers.subscribe(Box::new(move |_| {
                order.borrow_mut().push(tag);
                Vec::new()
            }));
        }

        let requests = subscribers.emit(&ViewEvent::Rebuilt);
        assert!(requests.is_empty());
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_emit_collects_requests() {
        let mut subscribers = Subscribers::new();
        subscribers.subscribe(Box::new(|event| {
            if *event == ViewEvent::Loaded {
                vec![ViewRequest::Rebuild]
            } else {
                Vec::new()
            }
        }));

        assert_eq!(subscribers.emit(&ViewEvent::Loaded), vec![ViewRequest::Rebuild]);
        assert!(subscribers.emit(&ViewEvent::Rebuilt).is_empty());
    }

    #[test]
    fn test_unsubscribe() {
        let mut subscribers = Subscribers::new();
        let calls = Rc::new(Cell::new(0));

        let calls_in = Rc::clone(&calls);
        let id = subscribers.subscribe(Box::new(move |_| {
            calls_in.set(calls_in.get() + 1);
            Vec::new()
        }));
        assert_eq!(subscribers.len(), 1);

        subscribers.emit(&ViewEvent::Rebuilt);
        assert!(subscribers.unsubscribe(id));
        subscribers.emit(&ViewEvent::Rebuilt);

        assert_eq!(calls.get(), 1);
        assert!(subscribers.is_empty());
        // Unsubscribing twice reports the id as gone.
        assert!(!subscribers.unsubscribe(id));
    }
}
