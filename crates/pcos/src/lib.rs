//! # Opal PCOS
//!
//! Property, container, observer and subject primitives for the opal
//! libraries — the introspectable configuration surface shared by the
//! plugin host and every plugin instance.
//!
//! ## Core types
//!
//! - [`Key`] / [`KeyTable`] — interned string identifiers, compared and
//!   ordered by a stable numeric id
//! - [`Value`] — the closed set of value types a property can hold
//! - [`Property`] — a named value cell with change notification
//! - [`PropertyContainer`] — an ordered collection of properties that
//!   re-broadcasts child changes
//! - [`Subject`] / [`Observer`] — the notification channel with
//!   per-observer counted blocking
//! - [`Visitor`] — double-dispatch enumeration over containers
//!
//! Cells and containers are cheap-clone handles; all shared state is
//! internally synchronized and safe to touch from multiple threads.

#![warn(missing_docs)]

mod container;
mod error;
mod key;
mod property;
mod subject;
mod value;
mod visitor;

pub use container::PropertyContainer;
pub use error::PropertyError;
pub use key::{Key, KeyError, KeyTable};
pub use property::Property;
pub use subject::{Observer, Subject};
pub use value::{FromValue, Value, ValueKind};
pub use visitor::Visitor;
