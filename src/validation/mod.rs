//! Form validator
//!
//! Pure validation of value bags against field configs. Nothing here touches
//! I/O or keeps state between calls: the same fields and values always give
//! the same result.
//!
//! Per field the checks run in order and the first failure wins:
//! required, then the checks implied by the field kind, then the declared
//! rules. An optional field left empty passes without further checks. Rule
//! kinds the validator does not recognise, and custom rules without a
//! registered predicate, never fail.

mod rules;

pub use rules::{is_valid_email, parse_date, DATE_FORMAT};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::schema::FieldConfig;
use crate::value::{FieldErrors, FieldValue, ValueBag};

/// Predicate used by `custom` rules
pub type Predicate = Arc<dyn Fn(&FieldValue) -> bool + Send + Sync>;

/// Named predicates for `custom` validation rules
#[derive(Clone, Default)]
pub struct PredicateRegistry {
    predicates: HashMap<String, Predicate>,
}

impl PredicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a predicate under `name`, replacing any previous one
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&FieldValue) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), Arc::new(predicate));
    }

    pub fn with<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&FieldValue) -> bool + Send + Sync + 'static,
    {
        self.register(name, predicate);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Predicate> {
        self.predicates.get(name)
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.predicates.keys().collect();
        names.sort();
        f.debug_struct("PredicateRegistry")
            .field("predicates", &names)
            .finish()
    }
}

/// Result of validating one value bag
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: FieldErrors,
}

/// Result of validating every item of a repeatable section
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepeatableValidation {
    pub is_valid: bool,
    /// Aligned by index with the validated items
    pub errors: Vec<FieldErrors>,
}

/// Validator with an optional set of custom predicates
#[derive(Debug, Clone, Default)]
pub struct Validator {
    predicates: PredicateRegistry,
}

impl Validator {
    pub fn new(predicates: PredicateRegistry) -> Self {
        Self { predicates }
    }

    pub fn predicates(&self) -> &PredicateRegistry {
        &self.predicates
    }

    /// Validate one value bag; at most one message per field
    pub fn validate_form(&self, fields: &[FieldConfig], values: &ValueBag) -> ValidationResult {
        let errors: FieldErrors = fields
            .iter()
            .filter_map(|field| {
                self.validate_field(field, values.get(&field.id))
                    .map(|message| (field.id.clone(), message))
            })
            .collect();

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Validate each item independently against the same fields
    ///
    /// An empty list is valid here; item-count bounds are checked by the form.
    pub fn validate_repeatable_section(
        &self,
        fields: &[FieldConfig],
        items: &[ValueBag],
    ) -> RepeatableValidation {
        let results: Vec<ValidationResult> = items
            .iter()
            .map(|item| self.validate_form(fields, item))
            .collect();

        RepeatableValidation {
            is_valid: results.iter().all(|r| r.is_valid),
            errors: results.into_iter().map(|r| r.errors).collect(),
        }
    }

    /// First failing check for a single field, if any
    pub fn validate_field(&self, field: &FieldConfig, value: Option<&FieldValue>) -> Option<String> {
        let value = match value {
            Some(value) if !value.is_empty() => value,
            _ => return field.required.then(|| rules::required_message(field)),
        };

        rules::check_kind(field, value).or_else(|| {
            field
                .rules
                .iter()
                .find_map(|rule| rules::check_rule(field, rule, value, &self.predicates))
        })
    }
}

/// Validate one value bag with no custom predicates registered
pub fn validate_form(fields: &[FieldConfig], values: &ValueBag) -> ValidationResult {
    Validator::default().validate_form(fields, values)
}

/// Validate every item of a repeatable section with no custom predicates registered
pub fn validate_repeatable_section(fields: &[FieldConfig], items: &[ValueBag]) -> RepeatableValidation {
    Validator::default().validate_repeatable_section(fields, items)
}
