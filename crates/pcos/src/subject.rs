//! Subject/observer change-notification channel.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;

/// A listener on a [`Subject`].
///
/// Implementations must tolerate being called from whichever thread
/// mutates the observed object.
pub trait Observer<P>: Send + Sync {
    /// Called when the observed object has changed; `source` is the
    /// object that fired the notification.
    fn updated(&self, source: &P);
}

struct Entry<P> {
    observer: Arc<dyn Observer<P>>,
    /// Suppression counter; notification is delivered only at zero.
    blocked: u32,
}

/// A publish channel with per-observer counted blocking.
///
/// Observers are held with shared ownership while attached and are
/// notified synchronously, in attachment order. A panic inside one
/// observer's callback is isolated and logged; remaining observers are
/// still notified.
pub struct Subject<P> {
    entries: Mutex<Vec<Entry<P>>>,
}

impl<P> Subject<P> {
    /// Create a channel with no observers.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Attach an observer. Attaching the same observer twice is a no-op.
    pub fn attach(&self, observer: Arc<dyn Observer<P>>) {
        let mut entries = self.entries.lock();
        if entries
            .iter()
            .any(|e| Arc::ptr_eq(&e.observer, &observer))
        {
            return;
        }
        entries.push(Entry {
            observer,
            blocked: 0,
        });
    }

    /// Detach an observer. Detaching one that was never attached is a
    /// no-op.
    pub fn detach(&self, observer: &Arc<dyn Observer<P>>) {
        self.entries
            .lock()
            .retain(|e| !Arc::ptr_eq(&e.observer, observer));
    }

    /// Increment the observer's suppression counter.
    pub fn block(&self, observer: &Arc<dyn Observer<P>>) {
        if let Some(entry) = self
            .entries
            .lock()
            .iter_mut()
            .find(|e| Arc::ptr_eq(&e.observer, observer))
        {
            entry.blocked += 1;
        }
    }

    /// Decrement the observer's suppression counter, floored at zero.
    pub fn unblock(&self, observer: &Arc<dyn Observer<P>>) {
        if let Some(entry) = self
            .entries
            .lock()
            .iter_mut()
            .find(|e| Arc::ptr_eq(&e.observer, observer))
        {
            entry.blocked = entry.blocked.saturating_sub(1);
        }
    }

    /// Notify every unblocked observer with `source` as the payload.
    ///
    /// The observer list is snapshotted first, so callbacks may attach or
    /// detach without deadlocking.
    pub fn notify(&self, source: &P) {
        let snapshot: Vec<Arc<dyn Observer<P>>> = self
            .entries
            .lock()
            .iter()
            .filter(|e| e.blocked == 0)
            .map(|e| Arc::clone(&e.observer))
            .collect();

        for observer in snapshot {
            if catch_unwind(AssertUnwindSafe(|| observer.updated(source))).is_err() {
                tracing::warn!("observer callback panicked; continuing with remaining observers");
            }
        }
    }

    /// Number of attached observers.
    pub fn observer_count(&self) -> usize {
        self.entries.lock().len()
    }
}

impl<P> Default for Subject<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> std::fmt::Debug for Subject<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subject")
            .field("observers", &self.observer_count())
            .finish()
    }
}
