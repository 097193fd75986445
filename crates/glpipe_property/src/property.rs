// SPDX-License-Identifier: MIT OR Apache-2.0
//! A single observable, typed, optionally read-only property.

use crate::value::{Value, ValueKind, ValueParseError};
use serde::{Deserialize, Serialize};

/// Stable identifier of a property within its list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub String);

impl PropertyId {
    /// Create an id from a stable name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PropertyId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl std::fmt::Display for PropertyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for PropertyId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Errors raised by property operations.
#[derive(Debug, thiserror::Error)]
pub enum PropertyError {
    /// Attempted to write a read-only property
    #[error("property {0} is read-only")]
    ReadOnly(PropertyId),

    /// Assigned or copied a value of the wrong kind
    #[error("property kind mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch {
        /// Declared kind of the target property
        expected: ValueKind,
        /// Kind of the offending value
        found: ValueKind,
    },

    /// Looked up an id that is not in the list
    #[error("unknown property {0}")]
    Unknown(PropertyId),

    /// Text form did not decode as the declared kind
    #[error(transparent)]
    Parse(#[from] ValueParseError),
}

/// External owner of a delegated property value.
///
/// While installed, reads, writes and change checks all go through the
/// delegate; the property never consults local storage.
pub trait ValueDelegate {
    /// Read the current value from the external owner.
    fn get(&self) -> Value;

    /// Write a value to the external owner.
    fn set(&mut self, value: Value) -> Result<(), PropertyError>;

    /// Whether the externally owned value changed since the last clear.
    fn has_changed(&self) -> bool;

    /// Reset the delegate's change marker.
    fn clear_changed(&mut self);
}

/// Storage behind a property: either a locally owned value or a
/// delegate redirecting to an external owner.
pub enum ValueSource {
    /// Plain local storage
    Owned(Value),
    /// Redirected storage, e.g. a value derived from cached data
    Delegated(Box<dyn ValueDelegate>),
}

impl std::fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owned(v) => f.debug_tuple("Owned").field(v).finish(),
            Self::Delegated(_) => f.write_str("Delegated(..)"),
        }
    }
}

/// An observable, typed value container attached to a block or
/// connection.
///
/// A property's identity is its id plus its declared kind; the kind
/// never changes after creation. Mutation is tracked: the previous
/// value is snapshotted lazily on the first write since the last
/// [`Property::clear_changed`], and flipping the read-only flag is
/// recorded the same way.
#[derive(Debug)]
pub struct Property {
    id: PropertyId,
    label: String,
    kind: ValueKind,
    source: ValueSource,
    read_only: bool,
    read_only_flipped: bool,
    initialized: bool,
    serializable: bool,
    unchanged: Option<Value>,
    choices: Vec<String>,
}

impl Property {
    /// Create a property with an owned initial value.
    pub fn new(id: impl Into<PropertyId>, label: impl Into<String>, initial: Value) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: initial.kind(),
            source: ValueSource::Owned(initial),
            read_only: false,
            read_only_flipped: false,
            initialized: false,
            serializable: true,
            unchanged: None,
            choices: Vec::new(),
        }
    }

    /// Mark read-only (builder form; does not record a flip).
    pub fn with_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Exclude from serialization in both directions (builder form).
    pub fn with_transient(mut self) -> Self {
        self.serializable = false;
        self
    }

    /// Attach display names for an enumerated value (builder form).
    pub fn with_choices(mut self, choices: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Install a delegate (builder form). The delegate must produce
    /// values of the declared kind.
    pub fn with_delegate(mut self, delegate: Box<dyn ValueDelegate>) -> Self {
        self.source = ValueSource::Delegated(delegate);
        self
    }

    /// Stable identifier.
    pub fn id(&self) -> &PropertyId {
        &self.id
    }

    /// Human-readable label for inspectors.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Declared value kind.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Whether writes are rejected.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Whether a value was ever assigned (or decoded) after creation.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether serialization includes this property.
    pub fn is_serializable(&self) -> bool {
        self.serializable
    }

    /// Whether storage is redirected to a delegate.
    pub fn is_delegated(&self) -> bool {
        matches!(self.source, ValueSource::Delegated(_))
    }

    /// Display names for an enumerated value; empty for free-form
    /// properties.
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    /// Display name of the current choice index, if this is an
    /// enumerated property with a valid index.
    pub fn choice_name(&self) -> Option<&str> {
        let index = self.value().as_choice()? as usize;
        self.choices.get(index).map(String::as_str)
    }

    /// Current value, read through the delegate when one is installed.
    pub fn value(&self) -> Value {
        match &self.source {
            ValueSource::Owned(v) => v.clone(),
            ValueSource::Delegated(d) => d.get(),
        }
    }

    /// Assign a new value.
    ///
    /// Fails with [`PropertyError::ReadOnly`] without touching storage
    /// when the property is read-only, and with
    /// [`PropertyError::TypeMismatch`] when the value's kind differs
    /// from the declared kind. Returns whether the stored value
    /// actually changed.
    pub fn set_value(&mut self, value: Value) -> Result<bool, PropertyError> {
        if self.read_only {
            return Err(PropertyError::ReadOnly(self.id.clone()));
        }
        if value.kind() != self.kind {
            return Err(PropertyError::TypeMismatch {
                expected: self.kind,
                found: value.kind(),
            });
        }
        match &mut self.source {
            ValueSource::Owned(current) => {
                self.initialized = true;
                if *current == value {
                    return Ok(false);
                }
                if self.unchanged.is_none() {
                    self.unchanged = Some(current.clone());
                }
                *current = value;
                Ok(true)
            }
            ValueSource::Delegated(delegate) => {
                delegate.set(value)?;
                self.initialized = true;
                Ok(true)
            }
        }
    }

    /// Copy the value of another property of the same declared kind.
    ///
    /// A kind mismatch is a programming-contract violation surfaced as
    /// [`PropertyError::TypeMismatch`]; callers treat it as fatal.
    pub fn copy_value_from(&mut self, other: &Property) -> Result<bool, PropertyError> {
        if other.kind != self.kind {
            return Err(PropertyError::TypeMismatch {
                expected: self.kind,
                found: other.kind,
            });
        }
        self.set_value(other.value())
    }

    /// Change the read-only flag, recording the flip for dirty
    /// tracking.
    pub fn set_read_only(&mut self, read_only: bool) {
        if self.read_only != read_only {
            self.read_only = read_only;
            self.read_only_flipped = true;
        }
    }

    /// Whether this property changed since the last
    /// [`Property::clear_changed`].
    ///
    /// True when the read-only flag flipped; otherwise the delegate
    /// predicate decides for delegated properties, and the existence
    /// of the unchanged snapshot decides for owned ones.
    pub fn has_changed(&self) -> bool {
        if self.read_only_flipped {
            return true;
        }
        match &self.source {
            ValueSource::Owned(_) => self.unchanged.is_some(),
            ValueSource::Delegated(d) => d.has_changed(),
        }
    }

    /// The value captured before the first write since the last clear,
    /// if any write happened.
    pub fn unchanged_value(&self) -> Option<&Value> {
        self.unchanged.as_ref()
    }

    /// Reset change tracking. Idempotent: a second call is a no-op.
    pub fn clear_changed(&mut self) {
        self.read_only_flipped = false;
        self.unchanged = None;
        if let ValueSource::Delegated(d) = &mut self.source {
            d.clear_changed();
        }
    }

    /// Replace the storage source. Used when a block re-binds a
    /// computed property to freshly derived data.
    pub fn install_delegate(&mut self, delegate: Box<dyn ValueDelegate>) {
        self.source = ValueSource::Delegated(delegate);
    }

    /// Canonical text form of the current value.
    pub fn encode(&self) -> String {
        self.value().encode()
    }

    /// Assign from the canonical text form, honoring read-only and
    /// kind checks.
    pub fn decode_into(&mut self, text: &str) -> Result<bool, PropertyError> {
        let value = Value::decode(self.kind, text)?;
        self.set_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_read_only_write_fails_and_preserves_value() {
        let mut p = Property::new("width", "Width", Value::UInt(4)).with_read_only();
        let err = p.set_value(Value::UInt(8)).unwrap_err();
        assert!(matches!(err, PropertyError::ReadOnly(_)));
        assert_eq!(p.value(), Value::UInt(4));
        assert!(!p.has_changed());
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let mut p = Property::new("factor", "Factor", Value::Float(0.5));
        let err = p.set_value(Value::Int(1)).unwrap_err();
        assert!(matches!(
            err,
            PropertyError::TypeMismatch {
                expected: ValueKind::Float,
                found: ValueKind::Int
            }
        ));
    }

    #[test]
    fn test_unchanged_snapshot_is_lazy() {
        let mut p = Property::new("factor", "Factor", Value::Float(0.5));
        assert!(p.unchanged_value().is_none());
        p.set_value(Value::Float(0.75)).unwrap();
        assert_eq!(p.unchanged_value(), Some(&Value::Float(0.5)));
        // Second write keeps the first snapshot.
        p.set_value(Value::Float(1.0)).unwrap();
        assert_eq!(p.unchanged_value(), Some(&Value::Float(0.5)));
    }

    #[test]
    fn test_clear_changed_is_idempotent() {
        let mut p = Property::new("factor", "Factor", Value::Float(0.5));
        p.set_value(Value::Float(0.75)).unwrap();
        assert!(p.has_changed());
        p.clear_changed();
        assert!(!p.has_changed());
        p.clear_changed();
        assert!(!p.has_changed());
    }

    #[test]
    fn test_equal_write_does_not_dirty() {
        let mut p = Property::new("name", "Name", Value::Text("a".into()));
        assert!(!p.set_value(Value::Text("a".into())).unwrap());
        assert!(!p.has_changed());
    }

    #[test]
    fn test_read_only_flip_counts_as_change() {
        let mut p = Property::new("name", "Name", Value::Text("a".into()));
        p.set_read_only(true);
        assert!(p.has_changed());
        p.clear_changed();
        assert!(!p.has_changed());
        // Setting to the same flag again is not a flip.
        p.set_read_only(true);
        assert!(!p.has_changed());
    }

    #[test]
    fn test_copy_between_incompatible_kinds_fails() {
        let mut dst = Property::new("a", "A", Value::Float(0.0));
        let src = Property::new("b", "B", Value::Text("x".into()));
        assert!(dst.copy_value_from(&src).is_err());
    }

    struct FakeDelegate {
        value: Rc<Cell<u32>>,
        seen: Cell<u32>,
    }

    impl ValueDelegate for FakeDelegate {
        fn get(&self) -> Value {
            Value::UInt(self.value.get())
        }
        fn set(&mut self, _value: Value) -> Result<(), PropertyError> {
            Err(PropertyError::ReadOnly(PropertyId::new("delegated")))
        }
        fn has_changed(&self) -> bool {
            self.value.get() != self.seen.get()
        }
        fn clear_changed(&mut self) {
            self.seen.set(self.value.get());
        }
    }

    #[test]
    fn test_delegate_routes_reads_and_change_checks() {
        let shared = Rc::new(Cell::new(16));
        let mut p = Property::new("width", "Width", Value::UInt(0)).with_delegate(Box::new(
            FakeDelegate {
                value: shared.clone(),
                seen: Cell::new(16),
            },
        ));
        assert_eq!(p.value(), Value::UInt(16));
        assert!(!p.has_changed());
        shared.set(32);
        assert_eq!(p.value(), Value::UInt(32));
        assert!(p.has_changed());
        p.clear_changed();
        assert!(!p.has_changed());
    }

    #[test]
    fn test_choice_names() {
        let mut p = Property::new("mode", "Mode", Value::Choice(1))
            .with_choices(["Nearest", "Linear"]);
        assert_eq!(p.choice_name(), Some("Linear"));
        p.set_value(Value::Choice(5)).unwrap();
        assert_eq!(p.choice_name(), None);
    }
}
