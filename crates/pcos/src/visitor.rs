//! Double-dispatch visitation over containers and properties.

use crate::container::PropertyContainer;
use crate::property::Property;

/// A visitor over a [`PropertyContainer`] and its properties.
///
/// Each visit method returns a continue-visiting signal; returning
/// `false` stops enumeration.
pub trait Visitor {
    /// Visit the container itself, before its properties.
    fn visit_container(&mut self, container: &PropertyContainer) -> bool;

    /// Visit one contained property.
    fn visit_property(&mut self, property: &Property) -> bool;
}
