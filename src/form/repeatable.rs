//! Repeatable section controller
//!
//! Keeps the ordered item list of one repeatable section within its
//! `min_items`/`max_items` bounds. A rejected operation returns a
//! [`StructuralError`] and leaves the list exactly as it was.

use crate::error::StructuralError;
use crate::schema::RepeatableDescriptor;
use crate::value::{FieldValue, ValueBag};

/// Ordered items of one repeatable section
#[derive(Debug, Clone)]
pub struct RepeatableSection<'a> {
    section_id: &'a str,
    descriptor: &'a RepeatableDescriptor,
    items: Vec<ValueBag>,
}

impl<'a> RepeatableSection<'a> {
    /// Take over existing items, or start with one empty row when there are none yet
    ///
    /// `None` means the section has never held values. One empty item is
    /// seeded in that case, also when `min_items` is 0, so there is always a
    /// first row to fill in. `Some(vec![])` keeps an emptied section empty.
    pub fn new(
        section_id: &'a str,
        descriptor: &'a RepeatableDescriptor,
        existing: Option<Vec<ValueBag>>,
    ) -> Self {
        let items = existing.unwrap_or_else(|| vec![ValueBag::new()]);
        Self {
            section_id,
            descriptor,
            items,
        }
    }

    pub fn items(&self) -> &[ValueBag] {
        &self.items
    }

    pub fn into_items(self) -> Vec<ValueBag> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn can_add(&self) -> bool {
        !self.descriptor.is_full(self.items.len())
    }

    pub fn can_remove(&self) -> bool {
        self.items.len() > self.descriptor.min_items && !self.items.is_empty()
    }

    /// Append one empty item
    pub fn add_item(&mut self) -> Result<usize, StructuralError> {
        if !self.can_add() {
            tracing::warn!(
                "Rejected add on '{}': already at {} items",
                self.section_id,
                self.items.len()
            );
            return Err(StructuralError::MaxItemsReached {
                section: self.section_id.to_string(),
                max: self.descriptor.max_items.unwrap_or(self.items.len()),
            });
        }
        self.items.push(ValueBag::new());
        Ok(self.items.len() - 1)
    }

    /// Remove the item at `index`, returning it
    pub fn remove_item(&mut self, index: usize) -> Result<ValueBag, StructuralError> {
        self.check_index(index)?;
        if !self.can_remove() {
            tracing::warn!(
                "Rejected remove on '{}': {} items, min {}",
                self.section_id,
                self.items.len(),
                self.descriptor.min_items
            );
            return Err(StructuralError::MinItemsReached {
                section: self.section_id.to_string(),
                min: self.descriptor.min_items,
            });
        }
        Ok(self.items.remove(index))
    }

    /// Move the item at `from` so that it ends up at `to`
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<(), StructuralError> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from != to {
            let item = self.items.remove(from);
            self.items.insert(to, item);
        }
        Ok(())
    }

    /// Replace one field of one item; sibling items are left untouched
    pub fn update_item(
        &mut self,
        index: usize,
        field_id: &str,
        value: FieldValue,
    ) -> Result<(), StructuralError> {
        self.check_index(index)?;
        self.items[index].insert(field_id.to_string(), value);
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), StructuralError> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(StructuralError::IndexOutOfRange {
                section: self.section_id.to_string(),
                index,
                len: self.items.len(),
            })
        }
    }
}
