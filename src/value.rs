//! Form values and error trees
//!
//! [`FormState`] maps section ids to either a flat [`ValueBag`] or an ordered
//! list of bags for repeatable sections. [`FormErrors`] mirrors that shape
//! with error messages. A field without an error is simply absent.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value of a single field
///
/// Serialized untagged, so a submitted payload is plain JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Selected options of a multi-select, or image references of an image set
    List(Vec<String>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::List(values.into_iter().map(Into::into).collect())
    }

    /// True for null, blank text, empty lists and an unchecked checkbox
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Bool(b) => !b,
            FieldValue::Number(_) => false,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value; text is parsed the way an input box holds it
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|n| n.is_finite())
    }

    pub fn as_bool(&self) -> bool {
        matches!(self, FieldValue::Bool(true))
    }

    pub fn as_list(&self) -> &[String] {
        match self {
            FieldValue::List(items) => items,
            _ => &[],
        }
    }

    /// Get the display value for rendering
    pub fn display_value(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(b) => (if *b { "yes" } else { "no" }).to_string(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(", "),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// Field id -> value, for one flat section or one repeatable item
pub type ValueBag = BTreeMap<String, FieldValue>;

/// Field id -> error message
pub type FieldErrors = BTreeMap<String, String>;

static EMPTY_BAG: ValueBag = BTreeMap::new();

/// Value of one section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionValue {
    Flat(ValueBag),
    Repeatable(Vec<ValueBag>),
}

/// The full values tree of a form
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState {
    sections: BTreeMap<String, SectionValue>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a partial state from JSON, e.g. an initial-values file
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn get(&self, section_id: &str) -> Option<&SectionValue> {
        self.sections.get(section_id)
    }

    pub fn contains(&self, section_id: &str) -> bool {
        self.sections.contains_key(section_id)
    }

    pub fn insert(&mut self, section_id: impl Into<String>, value: SectionValue) {
        self.sections.insert(section_id.into(), value);
    }

    /// Values of a flat section; an absent or repeatable section reads as empty
    pub fn flat(&self, section_id: &str) -> &ValueBag {
        match self.sections.get(section_id) {
            Some(SectionValue::Flat(bag)) => bag,
            _ => &EMPTY_BAG,
        }
    }

    /// Items of a repeatable section; an absent or flat section reads as empty
    pub fn items(&self, section_id: &str) -> &[ValueBag] {
        match self.sections.get(section_id) {
            Some(SectionValue::Repeatable(items)) => items,
            _ => &[],
        }
    }

    /// Single field of a flat section
    pub fn field(&self, section_id: &str, field_id: &str) -> Option<&FieldValue> {
        self.flat(section_id).get(field_id)
    }

    /// Single field of one repeatable item
    pub fn item_field(&self, section_id: &str, index: usize, field_id: &str) -> Option<&FieldValue> {
        self.items(section_id)
            .get(index)
            .and_then(|item| item.get(field_id))
    }

    /// Mutable bag of a flat section, created on first use
    ///
    /// Returns `None` when the section currently holds a list of items.
    pub(crate) fn flat_mut(&mut self, section_id: &str) -> Option<&mut ValueBag> {
        match self
            .sections
            .entry(section_id.to_string())
            .or_insert_with(|| SectionValue::Flat(ValueBag::new()))
        {
            SectionValue::Flat(bag) => Some(bag),
            SectionValue::Repeatable(_) => None,
        }
    }

    pub(crate) fn set_items(&mut self, section_id: &str, items: Vec<ValueBag>) {
        self.sections
            .insert(section_id.to_string(), SectionValue::Repeatable(items));
    }

    pub(crate) fn remove(&mut self, section_id: &str) -> Option<SectionValue> {
        self.sections.remove(section_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SectionValue)> {
        self.sections.iter()
    }

    pub fn section_ids(&self) -> impl Iterator<Item = &String> {
        self.sections.keys()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Errors of one section, mirroring [`SectionValue`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SectionErrors {
    Flat(FieldErrors),
    Repeatable {
        /// Per-item errors, aligned by index with the section's items
        items: Vec<FieldErrors>,
        /// Item-count violation for the section as a whole
        #[serde(skip_serializing_if = "Option::is_none")]
        section: Option<String>,
    },
}

impl SectionErrors {
    pub fn is_empty(&self) -> bool {
        match self {
            SectionErrors::Flat(fields) => fields.is_empty(),
            SectionErrors::Repeatable { items, section } => {
                section.is_none() && items.iter().all(BTreeMap::is_empty)
            }
        }
    }

    /// Number of messages held for this section
    pub fn count(&self) -> usize {
        match self {
            SectionErrors::Flat(fields) => fields.len(),
            SectionErrors::Repeatable { items, section } => {
                items.iter().map(BTreeMap::len).sum::<usize>() + usize::from(section.is_some())
            }
        }
    }
}

/// The full errors tree of a form
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct FormErrors {
    sections: BTreeMap<String, SectionErrors>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.values().all(SectionErrors::is_empty)
    }

    /// Total number of messages across all sections
    pub fn count(&self) -> usize {
        self.sections.values().map(SectionErrors::count).sum()
    }

    pub fn section(&self, section_id: &str) -> Option<&SectionErrors> {
        self.sections.get(section_id)
    }

    pub fn insert(&mut self, section_id: impl Into<String>, errors: SectionErrors) {
        self.sections.insert(section_id.into(), errors);
    }

    pub fn section_ids(&self) -> impl Iterator<Item = &String> {
        self.sections.keys()
    }

    pub fn field(&self, section_id: &str, field_id: &str) -> Option<&str> {
        match self.sections.get(section_id) {
            Some(SectionErrors::Flat(fields)) => fields.get(field_id).map(String::as_str),
            _ => None,
        }
    }

    pub fn item_field(&self, section_id: &str, index: usize, field_id: &str) -> Option<&str> {
        match self.sections.get(section_id) {
            Some(SectionErrors::Repeatable { items, .. }) => items
                .get(index)
                .and_then(|item| item.get(field_id))
                .map(String::as_str),
            _ => None,
        }
    }

    /// Section-level message of a repeatable section (item-count violations)
    pub fn section_message(&self, section_id: &str) -> Option<&str> {
        match self.sections.get(section_id) {
            Some(SectionErrors::Repeatable { section, .. }) => section.as_deref(),
            _ => None,
        }
    }

    /// Drop the error at exactly (section, field), leaving all others in place
    pub fn clear_field(&mut self, section_id: &str, field_id: &str) {
        if let Some(SectionErrors::Flat(fields)) = self.sections.get_mut(section_id) {
            fields.remove(field_id);
            if fields.is_empty() {
                self.sections.remove(section_id);
            }
        }
    }

    /// Drop the error at exactly (section, item, field)
    pub fn clear_item_field(&mut self, section_id: &str, index: usize, field_id: &str) {
        if let Some(errors) = self.sections.get_mut(section_id) {
            if let SectionErrors::Repeatable { items, .. } = errors {
                if let Some(item) = items.get_mut(index) {
                    item.remove(field_id);
                }
            }
            if errors.is_empty() {
                self.sections.remove(section_id);
            }
        }
    }

    pub fn clear_section(&mut self, section_id: &str) {
        self.sections.remove(section_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    mod field_value {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_blank_text_is_empty() {
            assert!(FieldValue::text("   ").is_empty());
            assert!(!FieldValue::text(" a ").is_empty());
        }

        #[test]
        fn test_unchecked_checkbox_is_empty() {
            assert!(FieldValue::Bool(false).is_empty());
            assert!(!FieldValue::Bool(true).is_empty());
        }

        #[test]
        fn test_zero_is_not_empty() {
            assert!(!FieldValue::Number(0.0).is_empty());
        }

        #[test]
        fn test_as_number_parses_text() {
            assert_eq!(FieldValue::text(" 42.5 ").as_number(), Some(42.5));
            assert_eq!(FieldValue::text("abc").as_number(), None);
            assert_eq!(FieldValue::text("NaN").as_number(), None);
            assert_eq!(FieldValue::Bool(true).as_number(), None);
        }

        #[test]
        fn test_untagged_json_shapes() {
            let values: Vec<FieldValue> =
                serde_json::from_str(r#"[null, true, 3, "x", ["a", "b"]]"#).unwrap();
            assert_eq!(
                values,
                vec![
                    FieldValue::Null,
                    FieldValue::Bool(true),
                    FieldValue::Number(3.0),
                    FieldValue::text("x"),
                    FieldValue::list(["a", "b"]),
                ]
            );
        }

        #[test]
        fn test_display_value_joins_lists() {
            assert_eq!(FieldValue::list(["a", "b"]).display_value(), "a, b");
            assert_eq!(FieldValue::Null.display_value(), "");
        }
    }

    mod form_state {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_absent_sections_read_as_empty() {
            let state = FormState::new();
            assert!(state.flat("contact").is_empty());
            assert!(state.items("addresses").is_empty());
        }

        #[test]
        fn test_parses_flat_and_repeatable_sections() {
            let state = FormState::from_json_str(
                r#"{"contact": {"phone": "9876543210"}, "addresses": [{"city": "Pune"}, {}]}"#,
            )
            .unwrap();

            assert_eq!(
                state.field("contact", "phone"),
                Some(&FieldValue::text("9876543210"))
            );
            assert_eq!(state.items("addresses").len(), 2);
            assert_eq!(
                state.item_field("addresses", 0, "city"),
                Some(&FieldValue::text("Pune"))
            );
        }

        #[test]
        fn test_flat_mut_refuses_repeatable_entry() {
            let mut state = FormState::new();
            state.set_items("s", vec![ValueBag::new()]);
            assert!(state.flat_mut("s").is_none());

            if let Some(bag) = state.flat_mut("t") {
                bag.insert("a".into(), FieldValue::text("1"));
            }
            assert_eq!(state.field("t", "a"), Some(&FieldValue::text("1")));
        }
    }

    mod form_errors {
        use super::*;
        use pretty_assertions::assert_eq;

        fn sample() -> FormErrors {
            let mut errors = FormErrors::new();
            errors.insert(
                "contact",
                SectionErrors::Flat(FieldErrors::from([
                    ("phone".to_string(), "Phone is required".to_string()),
                    ("name".to_string(), "Name is required".to_string()),
                ])),
            );
            errors.insert(
                "addresses",
                SectionErrors::Repeatable {
                    items: vec![
                        FieldErrors::from([("city".to_string(), "City is required".to_string())]),
                        FieldErrors::new(),
                    ],
                    section: None,
                },
            );
            errors
        }

        #[test]
        fn test_clear_field_only_touches_that_field() {
            let mut errors = sample();
            errors.clear_field("contact", "phone");

            assert_eq!(errors.field("contact", "phone"), None);
            assert_eq!(errors.field("contact", "name"), Some("Name is required"));
            assert_eq!(
                errors.item_field("addresses", 0, "city"),
                Some("City is required")
            );
        }

        #[test]
        fn test_clearing_last_field_drops_section() {
            let mut errors = sample();
            errors.clear_field("contact", "phone");
            errors.clear_field("contact", "name");
            assert!(errors.section("contact").is_none());
        }

        #[test]
        fn test_clear_item_field() {
            let mut errors = sample();
            errors.clear_item_field("addresses", 0, "city");
            assert!(errors.section("addresses").is_none());
            assert_eq!(errors.count(), 2);
        }

        #[test]
        fn test_empty_string_message_is_an_error() {
            let mut errors = FormErrors::new();
            errors.insert(
                "s",
                SectionErrors::Flat(FieldErrors::from([("f".to_string(), String::new())])),
            );
            assert!(!errors.is_empty());
            assert_eq!(errors.field("s", "f"), Some(""));
        }

        #[test]
        fn test_section_message() {
            let mut errors = FormErrors::new();
            errors.insert(
                "addresses",
                SectionErrors::Repeatable {
                    items: vec![],
                    section: Some("Add at least 2 items".to_string()),
                },
            );
            assert_eq!(errors.section_message("addresses"), Some("Add at least 2 items"));
            assert_eq!(errors.count(), 1);
        }
    }
}
