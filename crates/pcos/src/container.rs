//! Aggregation of properties with re-broadcast of child changes.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::error::PropertyError;
use crate::key::{Key, KeyTable};
use crate::property::Property;
use crate::subject::{Observer, Subject};
use crate::visitor::Visitor;

struct ChildEntry {
    property: Property,
    relay: Arc<ChildRelay>,
}

struct ContainerInner {
    children: RwLock<Vec<ChildEntry>>,
    subject: Subject<PropertyContainer>,
}

/// Relays a child property's "changed" notification to the owning
/// container. Holds the parent weakly so child → parent edges never
/// form a retain cycle.
struct ChildRelay {
    parent: Weak<ContainerInner>,
}

impl Observer<Property> for ChildRelay {
    fn updated(&self, _source: &Property) {
        if let Some(inner) = self.parent.upgrade() {
            let container = PropertyContainer { inner };
            container.update();
        }
    }
}

/// A loose, ordered collection of [`Property`] cells.
///
/// The container observes its own children: when a contained property
/// changes, the container notifies its observers that *it* changed.
/// Like [`Property`], this is a cheap-clone handle over shared state.
#[derive(Clone)]
pub struct PropertyContainer {
    inner: Arc<ContainerInner>,
}

impl PropertyContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                children: RwLock::new(Vec::new()),
                subject: Subject::new(),
            }),
        }
    }

    /// Add a property.
    ///
    /// Fails with [`PropertyError::DuplicateKey`] if a property with the
    /// same key is already present.
    pub fn append(&self, property: Property) -> Result<(), PropertyError> {
        let mut children = self.inner.children.write();
        if children.iter().any(|c| c.property.key() == property.key()) {
            return Err(PropertyError::DuplicateKey(property.key().to_string()));
        }

        let relay = Arc::new(ChildRelay {
            parent: Arc::downgrade(&self.inner),
        });
        property.attach(Arc::clone(&relay) as Arc<dyn Observer<Property>>);
        children.push(ChildEntry { property, relay });
        Ok(())
    }

    /// Remove a property. Removing one that is not contained is a no-op.
    pub fn remove(&self, property: &Property) {
        let mut children = self.inner.children.write();
        if let Some(pos) = children.iter().position(|c| c.property == *property) {
            let entry = children.remove(pos);
            entry
                .property
                .detach(&(entry.relay as Arc<dyn Observer<Property>>));
        }
    }

    /// Look up a property by key.
    pub fn get(&self, key: Key) -> Option<Property> {
        self.inner
            .children
            .read()
            .iter()
            .find(|c| c.property.key() == key)
            .map(|c| c.property.clone())
    }

    /// Look up a property by raw string; the name is interned through
    /// the process-wide key table.
    pub fn get_by_name(&self, name: &str) -> Option<Property> {
        self.get(KeyTable::global().intern(name))
    }

    /// All contained keys, in insertion order.
    pub fn keys(&self) -> Vec<Key> {
        self.inner
            .children
            .read()
            .iter()
            .map(|c| c.property.key())
            .collect()
    }

    /// Number of contained properties.
    pub fn len(&self) -> usize {
        self.inner.children.read().len()
    }

    /// Whether the container is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.children.read().is_empty()
    }

    /// Attach an observer of the container as a whole.
    pub fn attach(&self, observer: Arc<dyn Observer<Self>>) {
        self.inner.subject.attach(observer);
    }

    /// Detach a container observer.
    pub fn detach(&self, observer: &Arc<dyn Observer<Self>>) {
        self.inner.subject.detach(observer);
    }

    /// Suppress notifications for one observer.
    pub fn block(&self, observer: &Arc<dyn Observer<Self>>) {
        self.inner.subject.block(observer);
    }

    /// Undo one [`block`](Self::block).
    pub fn unblock(&self, observer: &Arc<dyn Observer<Self>>) {
        self.inner.subject.unblock(observer);
    }

    /// Notify container observers.
    pub fn update(&self) {
        self.inner.subject.notify(self);
    }

    /// Visit the container, then each contained property, stopping as
    /// soon as any visit call returns `false`. Returns whether the
    /// enumeration ran to completion.
    pub fn accept(&self, visitor: &mut dyn Visitor) -> bool {
        if !visitor.visit_container(self) {
            return false;
        }

        let snapshot: Vec<Property> = self
            .inner
            .children
            .read()
            .iter()
            .map(|c| c.property.clone())
            .collect();

        for property in &snapshot {
            if !property.accept(visitor) {
                return false;
            }
        }
        true
    }
}

impl Default for PropertyContainer {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity comparison: clones of the same container compare equal.
impl PartialEq for PropertyContainer {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for PropertyContainer {}

impl fmt::Debug for PropertyContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyContainer")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn prop(name: &str, value: i64) -> Property {
        Property::with_value(Key::from_string(name), value)
    }

    #[test]
    fn append_and_lookup() {
        let container = PropertyContainer::new();
        container.append(prop("c-width", 720)).unwrap();
        container.append(prop("c-height", 576)).unwrap();

        let found = container.get_by_name("c-width").unwrap();
        assert_eq!(found.value::<i64>().unwrap(), 720);
        assert!(container.get_by_name("c-depth").is_none());
    }

    #[test]
    fn duplicate_append_is_rejected() {
        let container = PropertyContainer::new();
        container.append(prop("c-dup", 1)).unwrap();
        let err = container.append(prop("c-dup", 2)).unwrap_err();
        assert!(matches!(err, PropertyError::DuplicateKey(_)));
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn keys_preserve_insertion_order() {
        let container = PropertyContainer::new();
        container.append(prop("c-z", 1)).unwrap();
        container.append(prop("c-a", 2)).unwrap();

        assert_eq!(
            container.keys(),
            vec![Key::from_string("c-z"), Key::from_string("c-a")]
        );
    }

    #[test]
    fn remove_detaches_child() {
        let container = PropertyContainer::new();
        let p = prop("c-removed", 1);
        container.append(p.clone()).unwrap();
        container.remove(&p);
        assert!(container.is_empty());

        struct Count(AtomicUsize);
        impl Observer<PropertyContainer> for Count {
            fn updated(&self, _source: &PropertyContainer) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let obs = Arc::new(Count(AtomicUsize::new(0)));
        container.attach(Arc::clone(&obs) as Arc<dyn Observer<PropertyContainer>>);

        // Mutating a removed child no longer reaches the container.
        p.set(99i64).unwrap();
        assert_eq!(obs.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn child_change_rebroadcasts() {
        struct Count(AtomicUsize);
        impl Observer<PropertyContainer> for Count {
            fn updated(&self, _source: &PropertyContainer) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let container = PropertyContainer::new();
        let p = prop("c-observed", 1);
        container.append(p.clone()).unwrap();

        let obs = Arc::new(Count(AtomicUsize::new(0)));
        container.attach(Arc::clone(&obs) as Arc<dyn Observer<PropertyContainer>>);

        p.set(2i64).unwrap();
        assert_eq!(obs.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn visitor_stops_on_false() {
        struct StopAfter {
            visits: usize,
            budget: usize,
        }

        impl Visitor for StopAfter {
            fn visit_container(&mut self, _container: &PropertyContainer) -> bool {
                true
            }

            fn visit_property(&mut self, _property: &Property) -> bool {
                self.visits += 1;
                self.visits < self.budget
            }
        }

        let container = PropertyContainer::new();
        for name in ["c-v1", "c-v2", "c-v3"] {
            container.append(prop(name, 0)).unwrap();
        }

        let mut visitor = StopAfter {
            visits: 0,
            budget: 2,
        };
        let completed = container.accept(&mut visitor);
        assert!(!completed);
        assert_eq!(visitor.visits, 2);
    }

    #[test]
    fn visitor_full_walk() {
        struct CollectKeys(Vec<Key>);

        impl Visitor for CollectKeys {
            fn visit_container(&mut self, _container: &PropertyContainer) -> bool {
                true
            }

            fn visit_property(&mut self, property: &Property) -> bool {
                self.0.push(property.key());
                true
            }
        }

        let container = PropertyContainer::new();
        container.append(prop("c-w1", 0)).unwrap();
        container.append(prop("c-w2", 0)).unwrap();

        let mut visitor = CollectKeys(Vec::new());
        assert!(container.accept(&mut visitor));
        assert_eq!(visitor.0.len(), 2);
    }
}
