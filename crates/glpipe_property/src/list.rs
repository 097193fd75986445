// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ordered, id-keyed property collections with batched change
//! notification.

use crate::property::{Property, PropertyError, PropertyId};
use crate::value::{Value, ValueKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Serializable snapshot of one property.
///
/// The structured-document collaborator exchanges these instead of
/// live [`Property`] objects: delegated and otherwise non-serializable
/// properties never appear, and neither do properties whose canonical
/// text is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRecord {
    /// Property id
    pub id: PropertyId,
    /// Declared kind, directing the text decoder
    pub kind: ValueKind,
    /// Canonical text form of the value
    pub text: String,
}

/// An ordered collection of properties owned by one block or
/// connection.
///
/// Iteration follows insertion order, which makes serialization and
/// inspector layout deterministic.
#[derive(Debug, Default)]
pub struct PropertyList {
    entries: IndexMap<PropertyId, Property>,
    update_depth: u32,
    pending: bool,
    notifications: u64,
}

impl PropertyList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property, replacing any previous property with the same
    /// id. Returns a mutable reference for further setup.
    pub fn insert(&mut self, property: Property) -> &mut Property {
        let id = property.id().clone();
        self.entries.insert(id.clone(), property);
        self.entries.get_mut(&id).expect("property was just inserted")
    }

    /// Convenience: create and insert an owned property.
    pub fn create(
        &mut self,
        id: impl Into<PropertyId>,
        label: impl Into<String>,
        initial: Value,
    ) -> &mut Property {
        self.insert(Property::new(id, label, initial))
    }

    /// Remove every property. Used by idempotent re-initialization.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.pending = false;
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a property by id.
    pub fn get(&self, id: &str) -> Option<&Property> {
        self.entries.get(id)
    }

    /// Look up a property by id, mutably.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Property> {
        self.entries.get_mut(id)
    }

    /// Current value of a property, if present.
    pub fn value(&self, id: &str) -> Option<Value> {
        self.get(id).map(Property::value)
    }

    /// Current text of a property, if present and of text kind.
    pub fn text(&self, id: &str) -> Option<String> {
        match self.value(id)? {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Current unsigned-integer value of a property, if present and of
    /// that kind.
    pub fn uint(&self, id: &str) -> Option<u32> {
        self.value(id)?.as_uint()
    }

    /// Current float value of a property, if present and of that kind.
    pub fn float(&self, id: &str) -> Option<f32> {
        self.value(id)?.as_float()
    }

    /// Current bool value of a property, if present and of that kind.
    pub fn bool(&self, id: &str) -> Option<bool> {
        self.value(id)?.as_bool()
    }

    /// Ordered iteration over all properties.
    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.entries.values()
    }

    /// Ordered mutable iteration over all properties.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Property> {
        self.entries.values_mut()
    }

    /// Assign a value by id.
    ///
    /// Returns `Ok(true)` when a change notification should reach the
    /// owner now; inside a batch the notification is deferred to
    /// [`PropertyList::end_update`] and `Ok(false)` is returned.
    pub fn set_value(&mut self, id: &str, value: Value) -> Result<bool, PropertyError> {
        let property = self
            .entries
            .get_mut(id)
            .ok_or_else(|| PropertyError::Unknown(PropertyId::new(id)))?;
        let changed = property.set_value(value)?;
        Ok(changed && self.note_change())
    }

    /// Assign from canonical text by id, with the same notification
    /// semantics as [`PropertyList::set_value`].
    pub fn set_from_text(&mut self, id: &str, text: &str) -> Result<bool, PropertyError> {
        let property = self
            .entries
            .get_mut(id)
            .ok_or_else(|| PropertyError::Unknown(PropertyId::new(id)))?;
        let changed = property.decode_into(text)?;
        Ok(changed && self.note_change())
    }

    fn note_change(&mut self) -> bool {
        if self.update_depth > 0 {
            self.pending = true;
            false
        } else {
            self.notifications += 1;
            true
        }
    }

    /// Enter a batched-update scope. Reentrant: scopes nest and only
    /// the outermost exit can fire the aggregate notification.
    pub fn begin_update(&mut self) {
        self.update_depth += 1;
    }

    /// Leave a batched-update scope.
    ///
    /// When the outermost scope exits with `apply = true` and at least
    /// one property changed inside the batch, exactly one aggregate
    /// notification fires and `true` is returned. `apply = false`
    /// discards the pending mark.
    pub fn end_update(&mut self, apply: bool) -> bool {
        debug_assert!(self.update_depth > 0, "end_update without begin_update");
        self.update_depth = self.update_depth.saturating_sub(1);
        if self.update_depth > 0 {
            return false;
        }
        let fire = apply && self.pending;
        self.pending = false;
        if fire {
            self.notifications += 1;
            tracing::debug!("property batch applied");
        }
        fire
    }

    /// Whether a batched-update scope is open.
    pub fn in_update(&self) -> bool {
        self.update_depth > 0
    }

    /// Total change notifications fired so far (immediate and
    /// aggregate).
    pub fn notification_count(&self) -> u64 {
        self.notifications
    }

    /// Whether any property is dirty.
    pub fn any_changed(&self) -> bool {
        self.entries.values().any(Property::has_changed)
    }

    /// Reset change tracking on every property.
    pub fn clear_changed(&mut self) {
        for property in self.entries.values_mut() {
            property.clear_changed();
        }
    }

    /// Snapshot the serializable, non-empty properties in order.
    pub fn records(&self) -> Vec<PropertyRecord> {
        self.entries
            .values()
            .filter(|p| p.is_serializable())
            .filter_map(|p| {
                let text = p.encode();
                if text.is_empty() {
                    None
                } else {
                    Some(PropertyRecord {
                        id: p.id().clone(),
                        kind: p.kind(),
                        text,
                    })
                }
            })
            .collect()
    }

    /// Apply record snapshots through normal assignment semantics.
    ///
    /// Unknown ids and kind mismatches are errors; read-only and
    /// non-serializable properties are skipped (they are produced by
    /// the owning node, not by documents).
    pub fn apply_records(&mut self, records: &[PropertyRecord]) -> Result<(), PropertyError> {
        self.begin_update();
        let result = self.apply_records_inner(records);
        self.end_update(result.is_ok());
        result
    }

    fn apply_records_inner(&mut self, records: &[PropertyRecord]) -> Result<(), PropertyError> {
        for record in records {
            let property = self
                .entries
                .get_mut(record.id.as_str())
                .ok_or_else(|| PropertyError::Unknown(record.id.clone()))?;
            if !property.is_serializable() || property.is_read_only() {
                continue;
            }
            if property.kind() != record.kind {
                return Err(PropertyError::TypeMismatch {
                    expected: property.kind(),
                    found: record.kind,
                });
            }
            self.set_from_text(record.id.as_str(), &record.text)?;
        }
        Ok(())
    }
}

impl Serialize for PropertyList {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PropertyList {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<PropertyRecord>::deserialize(deserializer)?;
        let mut list = PropertyList::new();
        for record in records {
            let value = Value::decode(record.kind, &record.text).map_err(serde::de::Error::custom)?;
            let property = list.create(record.id, "", value.clone());
            // Mark initialized through the normal assignment path.
            let _ = property.set_value(value);
        }
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_list() -> PropertyList {
        let mut list = PropertyList::new();
        list.create("source_file", "Source file", Value::Text(String::new()));
        list.create("grid_cols", "Grid columns", Value::UInt(1));
        list.create("grid_rows", "Grid rows", Value::UInt(1));
        list
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let list = sample_list();
        let ids: Vec<_> = list.iter().map(|p| p.id().as_str().to_string()).collect();
        assert_eq!(ids, ["source_file", "grid_cols", "grid_rows"]);
    }

    #[test]
    fn test_immediate_notification_outside_batch() {
        let mut list = sample_list();
        assert!(list.set_value("grid_cols", Value::UInt(2)).unwrap());
        assert_eq!(list.notification_count(), 1);
    }

    #[test]
    fn test_batch_fires_exactly_one_notification() {
        let mut list = sample_list();
        list.begin_update();
        assert!(!list.set_value("grid_cols", Value::UInt(2)).unwrap());
        assert!(!list.set_value("grid_rows", Value::UInt(3)).unwrap());
        assert!(!list
            .set_value("source_file", Value::Text("photo.png".into()))
            .unwrap());
        assert!(list.end_update(true));
        assert_eq!(list.notification_count(), 1);
    }

    #[test]
    fn test_nested_batches_fire_once_at_outermost_exit() {
        let mut list = sample_list();
        list.begin_update();
        list.begin_update();
        list.set_value("grid_cols", Value::UInt(2)).unwrap();
        assert!(!list.end_update(true));
        list.set_value("grid_rows", Value::UInt(3)).unwrap();
        assert!(list.end_update(true));
        assert_eq!(list.notification_count(), 1);
    }

    #[test]
    fn test_discarded_batch_fires_nothing() {
        let mut list = sample_list();
        list.begin_update();
        list.set_value("grid_cols", Value::UInt(2)).unwrap();
        assert!(!list.end_update(false));
        assert_eq!(list.notification_count(), 0);
        // The value itself still changed.
        assert_eq!(list.uint("grid_cols"), Some(2));
    }

    #[test]
    fn test_no_change_means_no_notification() {
        let mut list = sample_list();
        list.begin_update();
        assert!(!list.set_value("grid_cols", Value::UInt(1)).unwrap());
        assert!(!list.end_update(true));
        assert_eq!(list.notification_count(), 0);
    }

    #[test]
    fn test_records_skip_empty_and_transient() {
        let mut list = sample_list();
        list.insert(
            Property::new("image_width", "Image width", Value::UInt(0)).with_transient(),
        );
        // source_file is empty text and must be omitted.
        let records = list.records();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str().to_string()).collect();
        assert_eq!(ids, ["grid_cols", "grid_rows"]);
    }

    #[test]
    fn test_records_round_trip_through_apply() {
        let mut list = sample_list();
        list.set_value("grid_cols", Value::UInt(4)).unwrap();
        list.set_value("source_file", Value::Text("photo.png".into()))
            .unwrap();
        let records = list.records();

        let mut fresh = sample_list();
        fresh.apply_records(&records).unwrap();
        assert_eq!(fresh.uint("grid_cols"), Some(4));
        assert_eq!(
            fresh.value("source_file"),
            Some(Value::Text("photo.png".into()))
        );
        // A whole batch of applied records notifies once.
        assert_eq!(fresh.notification_count(), 1);
    }

    #[test]
    fn test_serde_round_trip() {
        let mut list = sample_list();
        list.set_value("grid_cols", Value::UInt(3)).unwrap();
        let text = ron::to_string(&list).unwrap();
        let back: PropertyList = ron::from_str(&text).unwrap();
        assert_eq!(back.uint("grid_cols"), Some(3));
        assert!(back.get("grid_cols").unwrap().is_initialized());
        // Empty-text properties were omitted on the way out.
        assert!(back.get("source_file").is_none());
    }

    #[test]
    fn test_unknown_id_is_an_error() {
        let mut list = sample_list();
        assert!(matches!(
            list.set_value("nope", Value::UInt(1)),
            Err(PropertyError::Unknown(_))
        ));
    }
}
