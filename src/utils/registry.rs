use std::sync::{Arc, Mutex};

use uuid::Uuid;

/// Token handed out by the subscribe methods across the crate. Unsubscribing
/// with it is idempotent and removes exactly one registration.
pub type SubscriptionId = Uuid;

/// Uuid-keyed callback registry. Callbacks are invoked in registration order
/// on a snapshot taken outside the lock, so a subscriber may re-enter the
/// registry (or the component owning it) without deadlocking.
pub struct CallbackRegistry<F: ?Sized> {
    entries: Mutex<Vec<(SubscriptionId, Arc<F>)>>,
}

impl<F: ?Sized> CallbackRegistry<F> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn add(&self, callback: Box<F>) -> SubscriptionId {
        let id = Uuid::new_v4();
        self.entries.lock().unwrap().push((id, Arc::from(callback)));
        id
    }

    pub fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock().unwrap();
        match entries.iter().position(|(entry_id, _)| *entry_id == id) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Invokes `call` once per registered callback, in registration order.
    pub fn notify(&self, call: impl Fn(&F)) {
        let snapshot: Vec<Arc<F>> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();

        for callback in snapshot {
            call(&callback);
        }
    }
}

impl<F: ?Sized> Default for CallbackRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}
