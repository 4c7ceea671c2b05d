//! The property cell: a key paired with a type-erased value.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::PropertyError;
use crate::key::Key;
use crate::subject::{Observer, Subject};
use crate::value::{FromValue, Value, ValueKind};
use crate::visitor::Visitor;

struct State {
    value: Option<Value>,
    always_notify: bool,
}

struct PropertyInner {
    key: Key,
    state: RwLock<State>,
    subject: Subject<Property>,
}

/// A named value cell with change notification.
///
/// Properties are cheap-clone handles over shared state, so they may be
/// passed by value; clones observe the same cell. The first assignment
/// fixes the cell's concrete type — later assignments of a different
/// [`Value`] variant fail with [`PropertyError::BadPropertyType`].
///
/// ```
/// use opal_pcos::{Key, Property};
///
/// let prop = Property::new(Key::from_string("volume"));
/// prop.set(0.5f64).unwrap();
/// assert_eq!(prop.value::<f64>().unwrap(), 0.5);
/// assert!(prop.set(3i64).is_err());
/// ```
#[derive(Clone)]
pub struct Property {
    inner: Arc<PropertyInner>,
}

impl Property {
    /// Create an unset property for `key`.
    pub fn new(key: Key) -> Self {
        Self {
            inner: Arc::new(PropertyInner {
                key,
                state: RwLock::new(State {
                    value: None,
                    always_notify: false,
                }),
                subject: Subject::new(),
            }),
        }
    }

    /// Create a property with an initial value.
    pub fn with_value(key: Key, value: impl Into<Value>) -> Self {
        let prop = Self::new(key);
        let mut state = prop.inner.state.write();
        state.value = Some(value.into());
        drop(state);
        prop
    }

    /// The key this property is registered under.
    pub fn key(&self) -> Key {
        self.inner.key
    }

    /// Assign a value, notifying observers if the stored value changed.
    ///
    /// With [`set_always_notify`](Self::set_always_notify) enabled,
    /// observers fire on every assignment.
    pub fn set(&self, value: impl Into<Value>) -> Result<(), PropertyError> {
        let value = value.into();
        let notify = {
            let mut state = self.inner.state.write();
            if let Some(current) = &state.value
                && current.kind() != value.kind()
            {
                return Err(PropertyError::BadPropertyType {
                    expected: current.kind(),
                    actual: value.kind(),
                });
            }

            let changed = state.value.as_ref() != Some(&value);
            if changed {
                state.value = Some(value);
            }
            changed || state.always_notify
        };

        if notify {
            self.update();
        }
        Ok(())
    }

    /// Parse `input` into the cell's value type and assign it.
    ///
    /// An unset property parses as a plain string.
    pub fn set_from_string(&self, input: &str) -> Result<(), PropertyError> {
        let kind = self
            .inner
            .state
            .read()
            .value
            .as_ref()
            .map_or(ValueKind::String, Value::kind);
        self.set(Value::parse_as(kind, input)?)
    }

    /// Copy another property's value into this one.
    pub fn set_from_property(&self, other: &Self) -> Result<(), PropertyError> {
        match other.raw_value() {
            Some(value) => self.set(value),
            None => Err(PropertyError::NotSet(other.key().to_string())),
        }
    }

    /// The stored value, typed as `T`.
    pub fn value<T: FromValue>(&self) -> Result<T, PropertyError> {
        let state = self.inner.state.read();
        let value = state
            .value
            .as_ref()
            .ok_or_else(|| PropertyError::NotSet(self.key().to_string()))?;
        T::from_value(value).ok_or(PropertyError::BadPropertyType {
            expected: T::kind(),
            actual: value.kind(),
        })
    }

    /// The stored value, if any, without typing.
    pub fn raw_value(&self) -> Option<Value> {
        self.inner.state.read().value.clone()
    }

    /// Whether the stored value is of kind `T`.
    pub fn is_a<T: FromValue>(&self) -> bool {
        self.inner
            .state
            .read()
            .value
            .as_ref()
            .is_some_and(|v| v.kind() == T::kind())
    }

    /// Force notification on every assignment, changed or not.
    pub fn set_always_notify(&self, always: bool) {
        self.inner.state.write().always_notify = always;
    }

    /// Attach a change observer.
    pub fn attach(&self, observer: Arc<dyn Observer<Self>>) {
        self.inner.subject.attach(observer);
    }

    /// Detach a change observer.
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

    /// Notify observers with this property as payload.
    pub fn update(&self) {
        self.inner.subject.notify(self);
    }

    /// Visit this property; the return value is the visitor's
    /// continue-visiting signal.
    pub fn accept(&self, visitor: &mut dyn Visitor) -> bool {
        visitor.visit_property(self)
    }
}

/// Identity comparison: clones of the same cell compare equal.
impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Property {}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("key", &self.inner.key.to_string())
            .field("value", &self.inner.state.read().value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Recorder {
        hits: AtomicUsize,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                hits: AtomicUsize::new(0),
            })
        }
    }

    impl Observer<Property> for Recorder {
        fn updated(&self, _source: &Property) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn set_and_get() {
        let prop = Property::new(Key::from_string("width"));
        prop.set(1920i64).unwrap();
        assert_eq!(prop.value::<i64>().unwrap(), 1920);
    }

    #[test]
    fn type_is_fixed_by_first_set() {
        let prop = Property::new(Key::from_string("fps"));
        prop.set((25i64, 1i64)).unwrap();

        let err = prop.set("25").unwrap_err();
        assert_eq!(
            err,
            PropertyError::BadPropertyType {
                expected: ValueKind::Rational,
                actual: ValueKind::String,
            }
        );
    }

    #[test]
    fn wrong_typed_get_fails() {
        let prop = Property::with_value(Key::from_string("label"), "pal");
        let err = prop.value::<i64>().unwrap_err();
        assert!(matches!(err, PropertyError::BadPropertyType { .. }));
    }

    #[test]
    fn unset_get_fails() {
        let prop = Property::new(Key::from_string("unset-prop"));
        assert!(matches!(
            prop.value::<i64>(),
            Err(PropertyError::NotSet(_))
        ));
    }

    #[test]
    fn mutation_notifies() {
        let prop = Property::new(Key::from_string("gain"));
        let obs = Recorder::new();
        prop.attach(Arc::clone(&obs) as Arc<dyn Observer<Property>>);

        prop.set(1.0f64).unwrap();
        assert_eq!(obs.hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unchanged_assignment_is_silent_unless_forced() {
        let prop = Property::with_value(Key::from_string("speed"), 1i64);
        let obs = Recorder::new();
        prop.attach(Arc::clone(&obs) as Arc<dyn Observer<Property>>);

        prop.set(1i64).unwrap();
        assert_eq!(obs.hits.load(Ordering::SeqCst), 0);

        prop.set_always_notify(true);
        prop.set(1i64).unwrap();
        assert_eq!(obs.hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn set_from_string_parses_fixed_type() {
        let prop = Property::with_value(Key::from_string("deinterlace"), false);
        prop.set_from_string("true").unwrap();
        assert!(prop.value::<bool>().unwrap());

        assert!(prop.set_from_string("maybe").is_err());
    }

    #[test]
    fn set_from_string_on_unset_stores_string() {
        let prop = Property::new(Key::from_string("profile-name"));
        prop.set_from_string("dv25").unwrap();
        assert_eq!(prop.value::<String>().unwrap(), "dv25");
    }

    #[test]
    fn clones_share_the_cell() {
        let prop = Property::new(Key::from_string("shared-cell"));
        let alias = prop.clone();
        alias.set(5i64).unwrap();
        assert_eq!(prop.value::<i64>().unwrap(), 5);
        assert_eq!(prop, alias);
    }
}
