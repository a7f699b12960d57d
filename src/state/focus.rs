//! Focus model for the form screen
//!
//! The focusable targets are derived from the schema and the current values
//! every time they are needed, so adding or removing items never leaves the
//! focus pointing at something that no longer exists.

use crate::form::DynamicForm;
use crate::schema::SectionLayout;

/// Something on the form screen that can hold keyboard focus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusTarget {
    /// A field of a flat section
    Field { section: String, field: String },
    /// A field of one repeatable item
    ItemField {
        section: String,
        index: usize,
        field: String,
    },
    /// The "remove" button of one repeatable item
    RemoveItem { section: String, index: usize },
    /// The "add item" button of a repeatable section
    AddItem { section: String },
    Submit,
}

impl FocusTarget {
    pub fn section(&self) -> Option<&str> {
        match self {
            FocusTarget::Field { section, .. }
            | FocusTarget::ItemField { section, .. }
            | FocusTarget::RemoveItem { section, .. }
            | FocusTarget::AddItem { section } => Some(section),
            FocusTarget::Submit => None,
        }
    }

    /// Repeatable item this target belongs to, if any
    pub fn item(&self) -> Option<(&str, usize)> {
        match self {
            FocusTarget::ItemField { section, index, .. }
            | FocusTarget::RemoveItem { section, index } => Some((section, *index)),
            _ => None,
        }
    }

    pub fn is_field(&self) -> bool {
        matches!(
            self,
            FocusTarget::Field { .. } | FocusTarget::ItemField { .. }
        )
    }

    /// Same target, but on another item of the same section
    pub fn with_index(&self, new_index: usize) -> Self {
        match self {
            FocusTarget::ItemField { section, field, .. } => FocusTarget::ItemField {
                section: section.clone(),
                index: new_index,
                field: field.clone(),
            },
            FocusTarget::RemoveItem { section, .. } => FocusTarget::RemoveItem {
                section: section.clone(),
                index: new_index,
            },
            other => other.clone(),
        }
    }
}

/// Targets in screen order: sections top to bottom, then submit
pub fn focus_targets(form: &DynamicForm) -> Vec<FocusTarget> {
    let mut targets = Vec::new();

    for section in form.schema().sections() {
        match &section.layout {
            SectionLayout::Flat(fields) => {
                targets.extend(fields.iter().map(|f| FocusTarget::Field {
                    section: section.id.clone(),
                    field: f.id.clone(),
                }));
            }
            SectionLayout::Repeatable(descriptor) => {
                let count = form.values().items(&section.id).len();
                for index in 0..count {
                    targets.extend(descriptor.fields.iter().map(|f| FocusTarget::ItemField {
                        section: section.id.clone(),
                        index,
                        field: f.id.clone(),
                    }));
                    targets.push(FocusTarget::RemoveItem {
                        section: section.id.clone(),
                        index,
                    });
                }
                targets.push(FocusTarget::AddItem {
                    section: section.id.clone(),
                });
            }
        }
    }

    targets.push(FocusTarget::Submit);
    targets
}

/// Currently focused position in the target list
#[derive(Debug, Clone, Default)]
pub struct Focus {
    index: usize,
}

impl Focus {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current<'a>(&self, targets: &'a [FocusTarget]) -> Option<&'a FocusTarget> {
        targets.get(self.index.min(targets.len().saturating_sub(1)))
    }

    pub fn next(&mut self, count: usize) {
        if count > 0 {
            self.index = (self.index + 1) % count;
        }
    }

    pub fn prev(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        if self.index == 0 || self.index >= count {
            self.index = count - 1;
        } else {
            self.index -= 1;
        }
    }

    /// Jump to `target` if it exists, otherwise stay within bounds
    pub fn focus(&mut self, targets: &[FocusTarget], target: &FocusTarget) {
        match targets.iter().position(|t| t == target) {
            Some(index) => self.index = index,
            None => self.clamp(targets.len()),
        }
    }

    pub fn clamp(&mut self, count: usize) {
        self.index = self.index.min(count.saturating_sub(1));
    }
}
