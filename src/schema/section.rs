//! Form sections: flat groups of fields or repeatable item lists

use serde::{Deserialize, Serialize};

use super::field::FieldConfig;

/// Field list and item bounds of a repeatable section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatableDescriptor {
    pub fields: Vec<FieldConfig>,
    pub min_items: usize,
    /// `None` means no upper bound
    pub max_items: Option<usize>,
}

impl RepeatableDescriptor {
    pub fn new(fields: Vec<FieldConfig>, min_items: usize, max_items: Option<usize>) -> Self {
        Self {
            fields,
            min_items,
            max_items,
        }
    }

    pub fn is_full(&self, len: usize) -> bool {
        self.max_items.is_some_and(|max| len >= max)
    }
}

/// Whether a section holds one value bag or a list of them
#[derive(Debug, Clone, PartialEq)]
pub enum SectionLayout {
    Flat(Vec<FieldConfig>),
    Repeatable(RepeatableDescriptor),
}

/// A named group of fields within a form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SectionRepr", into = "SectionRepr")]
pub struct FormSection {
    pub id: String,
    pub title: Option<String>,
    pub layout: SectionLayout,
}

impl FormSection {
    pub fn flat(id: &str, fields: Vec<FieldConfig>) -> Self {
        Self {
            id: id.to_string(),
            title: None,
            layout: SectionLayout::Flat(fields),
        }
    }

    pub fn repeatable(
        id: &str,
        fields: Vec<FieldConfig>,
        min_items: usize,
        max_items: Option<usize>,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: None,
            layout: SectionLayout::Repeatable(RepeatableDescriptor::new(
                fields, min_items, max_items,
            )),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Title for display, falling back to the id
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }

    pub fn fields(&self) -> &[FieldConfig] {
        match &self.layout {
            SectionLayout::Flat(fields) => fields,
            SectionLayout::Repeatable(descriptor) => &descriptor.fields,
        }
    }

    pub fn field(&self, field_id: &str) -> Option<&FieldConfig> {
        self.fields().iter().find(|f| f.id == field_id)
    }

    pub fn is_repeatable(&self) -> bool {
        matches!(self.layout, SectionLayout::Repeatable(_))
    }

    pub fn repeatable_descriptor(&self) -> Option<&RepeatableDescriptor> {
        match &self.layout {
            SectionLayout::Repeatable(descriptor) => Some(descriptor),
            SectionLayout::Flat(_) => None,
        }
    }
}

/// On-disk shape: a section is repeatable exactly when it has a `repeatable` block
#[derive(Serialize, Deserialize)]
struct SectionRepr {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    fields: Vec<FieldConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    repeatable: Option<BoundsRepr>,
}

#[derive(Serialize, Deserialize)]
struct BoundsRepr {
    #[serde(default)]
    min_items: usize,
    #[serde(default)]
    max_items: Option<usize>,
}

impl From<SectionRepr> for FormSection {
    fn from(repr: SectionRepr) -> Self {
        let layout = match repr.repeatable {
            Some(bounds) => SectionLayout::Repeatable(RepeatableDescriptor::new(
                repr.fields,
                bounds.min_items,
                bounds.max_items,
            )),
            None => SectionLayout::Flat(repr.fields),
        };
        Self {
            id: repr.id,
            title: repr.title,
            layout,
        }
    }
}

impl From<FormSection> for SectionRepr {
    fn from(section: FormSection) -> Self {
        let (fields, repeatable) = match section.layout {
            SectionLayout::Flat(fields) => (fields, None),
            SectionLayout::Repeatable(d) => (
                d.fields,
                Some(BoundsRepr {
                    min_items: d.min_items,
                    max_items: d.max_items,
                }),
            ),
        };
        Self {
            id: section.id,
            title: section.title,
            fields,
            repeatable,
        }
    }
}
