//! Individual checks applied by the validator
//!
//! Each check returns `Some(message)` on failure and `None` when the value
//! passes. Checks never panic and never fail on input they do not understand.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::{FieldConfig, FieldKind, ValidationRule};
use crate::value::FieldValue;

use super::PredicateRegistry;

/// Date format accepted by `date` fields
pub const DATE_FORMAT: &str = "%Y-%m-%d";

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex compiles")
});

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

pub(super) fn required_message(field: &FieldConfig) -> String {
    format!("{} is required", field.label)
}

/// Checks implied by the field kind itself
pub(super) fn check_kind(field: &FieldConfig, value: &FieldValue) -> Option<String> {
    let ok = match field.kind {
        FieldKind::Text | FieldKind::Textarea => !matches!(value, FieldValue::List(_)),
        FieldKind::Number => value.as_number().is_some(),
        FieldKind::Date => value.as_text().and_then(parse_date).is_some(),
        FieldKind::Checkbox => matches!(value, FieldValue::Bool(_)),
        FieldKind::Select => match value {
            FieldValue::List(_) | FieldValue::Bool(_) => false,
            scalar => field.has_option(&scalar.display_value()),
        },
        FieldKind::MultiSelect => match value {
            FieldValue::List(items) => items.iter().all(|item| field.has_option(item)),
            _ => false,
        },
        FieldKind::ImageSet => matches!(value, FieldValue::List(_)),
    };
    if ok {
        return None;
    }

    Some(match field.kind {
        FieldKind::Number => format!("{} must be a number", field.label),
        FieldKind::Date => format!("{} must be a date (YYYY-MM-DD)", field.label),
        FieldKind::Select | FieldKind::MultiSelect => {
            format!("{} has an invalid selection", field.label)
        }
        _ => format!("{} has an invalid value", field.label),
    })
}

/// Apply one declared rule
pub(super) fn check_rule(
    field: &FieldConfig,
    rule: &ValidationRule,
    value: &FieldValue,
    predicates: &PredicateRegistry,
) -> Option<String> {
    let passed = match rule {
        ValidationRule::Pattern { pattern, .. } => match value {
            FieldValue::List(items) => items.iter().all(|item| pattern.is_match(item)),
            scalar => pattern.is_match(&scalar.display_value()),
        },
        ValidationRule::MinLength { value: min, .. } => length_of(field, value) >= *min,
        ValidationRule::MaxLength { value: max, .. } => length_of(field, value) <= *max,
        ValidationRule::Min { value: min, .. } => value.as_number().map_or(true, |n| n >= *min),
        ValidationRule::Max { value: max, .. } => value.as_number().map_or(true, |n| n <= *max),
        ValidationRule::Email { .. } => is_valid_email(value.display_value().trim()),
        ValidationRule::Custom { name, .. } => match predicates.get(name) {
            Some(predicate) => predicate(value),
            None => {
                tracing::debug!("No predicate registered for custom rule '{name}'; skipping");
                true
            }
        },
        ValidationRule::Unknown => true,
    };
    if passed {
        return None;
    }

    Some(
        rule.message()
            .map(str::to_string)
            .unwrap_or_else(|| default_message(field, rule)),
    )
}

/// Characters for scalar values, entries for list values
fn length_of(field: &FieldConfig, value: &FieldValue) -> usize {
    match value {
        FieldValue::List(items) => items.len(),
        _ if field.kind.is_list() => 0,
        scalar => scalar.display_value().chars().count(),
    }
}

fn default_message(field: &FieldConfig, rule: &ValidationRule) -> String {
    let label = &field.label;
    match rule {
        ValidationRule::Pattern { .. } => format!("{label} has an invalid format"),
        ValidationRule::MinLength { value, .. } if field.kind.is_list() => {
            format!("{label} needs at least {value} items")
        }
        ValidationRule::MinLength { value, .. } => {
            format!("{label} must be at least {value} characters")
        }
        ValidationRule::MaxLength { value, .. } if field.kind.is_list() => {
            format!("{label} allows at most {value} items")
        }
        ValidationRule::MaxLength { value, .. } => {
            format!("{label} must be at most {value} characters")
        }
        ValidationRule::Min { value, .. } => format!("{label} must be at least {value}"),
        ValidationRule::Max { value, .. } => format!("{label} must be at most {value}"),
        ValidationRule::Email { .. } => format!("{label} must be a valid email address"),
        ValidationRule::Custom { .. } | ValidationRule::Unknown => format!("{label} is invalid"),
    }
}
