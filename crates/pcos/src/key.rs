//! Interned string keys.
//!
//! A [`Key`] is a small copyable identifier minted by a [`KeyTable`].
//! Two keys interned from equal strings in the same table always compare
//! equal; comparison, hashing and ordering use the numeric id only, never
//! the string content.

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use lasso::{Key as _, Spur, ThreadedRodeo};

/// Errors from key table lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// The id was never issued by this table.
    #[error("key id {0} is not registered in this table")]
    KeyNotFound(u32),
}

/// An interned string identifier.
///
/// Cheap to copy and compare. The ordering is a strict total order over
/// id assignment, used for sorted-container placement — it is *not*
/// lexical ordering of the underlying strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(Spur);

impl Key {
    /// Intern `s` in the process-wide table and return its key.
    ///
    /// Idempotent: equal strings always yield equal keys for the
    /// lifetime of the process.
    pub fn from_string(s: &str) -> Self {
        KeyTable::global().intern(s)
    }

    /// Resolve this key against the process-wide table.
    ///
    /// Fails with [`KeyError::KeyNotFound`] for keys minted by an
    /// isolated [`KeyTable`] whose id the global table never issued.
    pub fn as_string(self) -> Result<String, KeyError> {
        KeyTable::global().resolve(self)
    }

    /// The stable numeric id backing this key.
    pub fn id(self) -> u32 {
        self.0.into_usize() as u32
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.into_usize().cmp(&other.0.into_usize())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match KeyTable::global().resolve(*self) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "key#{}", self.id()),
        }
    }
}

/// A bijective string ↔ id table.
///
/// [`KeyTable::global`] returns the process-wide table used by
/// [`Key::from_string`]; independent tables can be constructed for tests
/// or embedded tools that must not pollute global state.
///
/// ```
/// use opal_pcos::KeyTable;
///
/// let table = KeyTable::new();
/// let a = table.intern("width");
/// let b = table.intern("width");
/// assert_eq!(a, b);
/// assert_eq!(table.resolve(a).unwrap(), "width");
/// ```
#[derive(Debug)]
pub struct KeyTable {
    rodeo: ThreadedRodeo,
}

static GLOBAL_TABLE: OnceLock<KeyTable> = OnceLock::new();

impl KeyTable {
    /// Create an isolated table.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::default(),
        }
    }

    /// The process-wide table. Lives for the lifetime of the process;
    /// interned keys are never individually destroyed.
    pub fn global() -> &'static Self {
        GLOBAL_TABLE.get_or_init(Self::new)
    }

    /// Intern `s`, returning the existing key if it was seen before.
    pub fn intern(&self, s: &str) -> Key {
        Key(self.rodeo.get_or_intern(s))
    }

    /// Look up a string without interning it.
    pub fn get(&self, s: &str) -> Option<Key> {
        self.rodeo.get(s).map(Key)
    }

    /// The exact inverse of [`intern`](Self::intern).
    pub fn resolve(&self, key: Key) -> Result<String, KeyError> {
        self.rodeo
            .try_resolve(&key.0)
            .map(str::to_owned)
            .ok_or(KeyError::KeyNotFound(key.id()))
    }

    /// Number of distinct strings interned so far.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for KeyTable {
    fn default() -> Self {
        Self::new()
    }
}
