//! Fixed-capacity attribute storage keyed by field ordinal.

use std::marker::PhantomData;

use super::{FieldValue, TaskField};

/// A closed set of field identifiers with dense ordinals.
pub trait FieldKey: Copy {
    /// Number of slots; every ordinal is below this.
    const COUNT: usize;

    /// Dense slot index.
    fn ordinal(self) -> usize;
}

impl FieldKey for TaskField {
    const COUNT: usize = TaskField::MAX_VALUE;

    #[inline]
    fn ordinal(self) -> usize {
        TaskField::ordinal(self)
    }
}

/// Slot array with O(1) access by field.
///
/// Each slot is `Option<FieldValue>`; `None` means unset. Storage is
/// allocated once at `F::COUNT` slots.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStore<F: FieldKey> {
    slots: Box<[Option<FieldValue>]>,
    _key: PhantomData<F>,
}

impl<F: FieldKey> FieldStore<F> {
    /// Creates a store with every slot unset.
    pub fn new() -> Self {
        Self {
            slots: vec![None; F::COUNT].into_boxed_slice(),
            _key: PhantomData,
        }
    }

    /// Value in a slot, or `None` if unset.
    #[inline]
    pub fn get(&self, field: F) -> Option<&FieldValue> {
        self.slots[field.ordinal()].as_ref()
    }

    /// Mutable access to a stored value.
    #[inline]
    pub fn get_mut(&mut self, field: F) -> Option<&mut FieldValue> {
        self.slots[field.ordinal()].as_mut()
    }

    /// Writes a slot, returning the previous value.
    #[inline]
    pub fn set(&mut self, field: F, value: Option<FieldValue>) -> Option<FieldValue> {
        std::mem::replace(&mut self.slots[field.ordinal()], value)
    }

    /// Unsets a slot, returning the previous value.
    #[inline]
    pub fn clear(&mut self, field: F) -> Option<FieldValue> {
        self.slots[field.ordinal()].take()
    }

    /// Whether a slot holds a value.
    #[inline]
    pub fn is_set(&self, field: F) -> bool {
        self.slots[field.ordinal()].is_some()
    }

    /// Number of slots holding a value.
    pub fn populated(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

impl<F: FieldKey> Default for FieldStore<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldFamily;

    #[test]
    fn test_unset_vs_zero() {
        let mut store: FieldStore<TaskField> = FieldStore::new();
        assert!(store.get(TaskField::COST).is_none());
        assert!(!store.is_set(TaskField::COST));

        store.set(TaskField::COST, Some(FieldValue::Currency(0.0)));
        assert!(store.is_set(TaskField::COST));
        assert_eq!(store.get(TaskField::COST), Some(&FieldValue::Currency(0.0)));
    }

    #[test]
    fn test_set_returns_previous() {
        let mut store: FieldStore<TaskField> = FieldStore::new();
        assert_eq!(store.set(TaskField::NAME, Some("a".into())), None);
        assert_eq!(
            store.set(TaskField::NAME, Some("b".into())),
            Some(FieldValue::from("a"))
        );
        assert_eq!(store.clear(TaskField::NAME), Some(FieldValue::from("b")));
        assert_eq!(store.populated(), 0);
    }

    #[test]
    fn test_last_slot_addressable() {
        let mut store: FieldStore<TaskField> = FieldStore::new();
        let last = FieldFamily::BaselineWork.field(10).unwrap();
        assert_eq!(last.ordinal(), TaskField::MAX_VALUE - 1);
        store.set(last, Some(FieldValue::Boolean(true)));
        assert_eq!(store.get(last).and_then(|v| v.as_bool()), Some(true));
    }
}
