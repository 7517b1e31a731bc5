use std::sync::{Arc, Mutex};

use crate::{
    domain::BudgetDocument,
    errors::{BudgetError, BudgetResult},
};

/// Observer notified after every committed change to the budget document.
pub trait ChangeListener: Send {
    fn on_change(&mut self, document: &BudgetDocument) -> BudgetResult<()>;
}

struct FnListener<F>(F);

impl<F> ChangeListener for FnListener<F>
where
    F: FnMut(&BudgetDocument) -> BudgetResult<()> + Send,
{
    fn on_change(&mut self, document: &BudgetDocument) -> BudgetResult<()> {
        (self.0)(document)
    }
}

/// Wraps a closure as a boxed [`ChangeListener`].
pub fn listener_fn<F>(callback: F) -> Box<dyn ChangeListener>
where
    F: FnMut(&BudgetDocument) -> BudgetResult<()> + Send + 'static,
{
    Box::new(FnListener(callback))
}

impl<L: ChangeListener> ChangeListener for Arc<Mutex<L>> {
    fn on_change(&mut self, document: &BudgetDocument) -> BudgetResult<()> {
        let mut guard = self
            .lock()
            .map_err(|_| BudgetError::Presentation("listener lock poisoned".into()))?;
        guard.on_change(document)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Single-channel change signal. Delivery is synchronous and ordered: every listener
/// has reacted before [`ChangeBroadcaster::broadcast`] returns.
#[derive(Default)]
pub struct ChangeBroadcaster {
    next_id: u64,
    sent: u64,
    listeners: Vec<(ListenerId, Box<dyn ChangeListener>)>,
}

impl ChangeBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn ChangeListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Number of broadcasts sent so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Notifies every listener. A failing listener does not stop the others; the first
    /// failure is returned once all have run.
    pub fn broadcast(&mut self, document: &BudgetDocument) -> BudgetResult<()> {
        self.sent += 1;
        let mut first_error = None;
        for (id, listener) in &mut self.listeners {
            if let Err(err) = listener.on_change(document) {
                tracing::error!(listener = id.0, error = %err, "change listener failed");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn delivers_to_every_listener_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut broadcaster = ChangeBroadcaster::new();
        for tag in ["first", "second"] {
            let seen = Arc::clone(&seen);
            broadcaster.subscribe(listener_fn(move |_: &BudgetDocument| {
                seen.lock().unwrap().push(tag);
                Ok(())
            }));
        }
        broadcaster.broadcast(&BudgetDocument::default()).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(broadcaster.sent(), 1);
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut broadcaster = ChangeBroadcaster::new();
        let counter = Arc::clone(&calls);
        let id = broadcaster.subscribe(listener_fn(move |_: &BudgetDocument| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        assert!(broadcaster.unsubscribe(id));
        assert!(!broadcaster.unsubscribe(id));
        broadcaster.broadcast(&BudgetDocument::default()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failing_listener_does_not_starve_others() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut broadcaster = ChangeBroadcaster::new();
        broadcaster.subscribe(listener_fn(|_: &BudgetDocument| {
            Err(BudgetError::Presentation("sink offline".into()))
        }));
        let counter = Arc::clone(&calls);
        broadcaster.subscribe(listener_fn(move |_: &BudgetDocument| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        let err = broadcaster.broadcast(&BudgetDocument::default()).unwrap_err();
        assert!(matches!(err, BudgetError::Presentation(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
