//! Property subsystem errors.

use crate::value::ValueKind;

/// Errors from property and container operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropertyError {
    /// The stored value's concrete type differs from the requested one.
    #[error("bad property type: expected {expected}, stored value is {actual}")]
    BadPropertyType {
        /// The type the caller asked for (or tried to assign).
        expected: ValueKind,
        /// The type actually stored.
        actual: ValueKind,
    },

    /// The property has no value yet.
    #[error("property '{0}' has no value set")]
    NotSet(String),

    /// A property with this key is already present in the container.
    #[error("duplicate property key '{0}'")]
    DuplicateKey(String),

    /// A string could not be parsed into the property's value type.
    #[error("cannot parse '{input}' as {expected}")]
    Parse {
        /// The offending input.
        input: String,
        /// The value kind that was expected.
        expected: ValueKind,
    },
}
