//! Form schema: an ordered list of sections, loaded once per form
//!
//! A schema file is JSON:
//!
//! ```json
//! {
//!   "title": "Service request",
//!   "sections": [
//!     { "id": "contact", "fields": [ { "id": "phone", "label": "Phone", "required": true } ] },
//!     { "id": "items", "fields": [ ... ], "repeatable": { "min_items": 1, "max_items": 5 } }
//!   ]
//! }
//! ```

mod field;
mod section;

pub use field::{FieldConfig, FieldKind, Pattern, SelectOption, ValidationRule};
pub use section::{FormSection, RepeatableDescriptor, SectionLayout};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::SchemaError;

/// Ordered, immutable set of sections describing one form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    sections: Vec<FormSection>,
}

impl FormSchema {
    /// Build a schema, checking ids, bounds and options
    pub fn new(sections: Vec<FormSection>) -> Result<Self, SchemaError> {
        let schema = Self {
            title: None,
            sections,
        };
        schema.check()?;
        Ok(schema)
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        let schema: FormSchema = serde_json::from_str(json)?;
        schema.check()?;
        Ok(schema)
    }

    /// Load and check a schema file
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        let schema = Self::from_json_str(&content)?;
        tracing::debug!(
            "Loaded schema from {} ({} sections)",
            path.display(),
            schema.sections.len()
        );
        Ok(schema)
    }

    pub fn sections(&self) -> &[FormSection] {
        &self.sections
    }

    pub fn section(&self, section_id: &str) -> Option<&FormSection> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Form")
    }

    fn check(&self) -> Result<(), SchemaError> {
        let mut section_ids = HashSet::new();
        for section in &self.sections {
            if !section_ids.insert(section.id.as_str()) {
                return Err(SchemaError::DuplicateSection(section.id.clone()));
            }

            let mut field_ids = HashSet::new();
            for field in section.fields() {
                if !field_ids.insert(field.id.as_str()) {
                    return Err(SchemaError::DuplicateField {
                        section: section.id.clone(),
                        field: field.id.clone(),
                    });
                }
                if field.kind.has_options() && field.options.is_empty() {
                    return Err(SchemaError::MissingOptions {
                        section: section.id.clone(),
                        field: field.id.clone(),
                    });
                }
            }

            if let Some(descriptor) = section.repeatable_descriptor() {
                if let Some(max) = descriptor.max_items {
                    if max == 0 || max < descriptor.min_items {
                        return Err(SchemaError::InvalidItemBounds {
                            section: section.id.clone(),
                            min: descriptor.min_items,
                            max,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
