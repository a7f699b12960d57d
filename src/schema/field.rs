//! Field configuration value objects

use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::value::FieldValue;

/// Input kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    Textarea,
    Number,
    Select,
    MultiSelect,
    /// Calendar date written as `YYYY-MM-DD`
    Date,
    Checkbox,
    /// Ordered list of image references (paths or URLs)
    ImageSet,
}

impl FieldKind {
    pub fn has_options(&self) -> bool {
        matches!(self, Self::Select | Self::MultiSelect)
    }

    /// Kinds whose value is a list and whose length rules count items
    pub fn is_list(&self) -> bool {
        matches!(self, Self::MultiSelect | Self::ImageSet)
    }
}

/// A compiled regular expression carried in a schema
///
/// Serialized as its source string. An invalid expression fails at schema
/// load, so validation never has to deal with one.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self)
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.0.is_match(value)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.as_str()).finish()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source).map_err(de::Error::custom)
    }
}

/// One validation rule attached to a field
///
/// Rule tags this build does not know deserialize to [`ValidationRule::Unknown`],
/// which never fails a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ValidationRule {
    Pattern {
        pattern: Pattern,
        message: Option<String>,
    },
    /// Characters for text, selected items for list kinds
    MinLength {
        value: usize,
        message: Option<String>,
    },
    MaxLength {
        value: usize,
        message: Option<String>,
    },
    Min {
        value: f64,
        message: Option<String>,
    },
    Max {
        value: f64,
        message: Option<String>,
    },
    Email {
        message: Option<String>,
    },
    /// Named predicate resolved through a predicate registry
    Custom {
        name: String,
        message: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl ValidationRule {
    pub fn pattern(source: &str) -> Result<Self, regex::Error> {
        Ok(Self::Pattern {
            pattern: Pattern::new(source)?,
            message: None,
        })
    }

    pub fn min_length(value: usize) -> Self {
        Self::MinLength {
            value,
            message: None,
        }
    }

    pub fn max_length(value: usize) -> Self {
        Self::MaxLength {
            value,
            message: None,
        }
    }

    pub fn min(value: f64) -> Self {
        Self::Min {
            value,
            message: None,
        }
    }

    pub fn max(value: f64) -> Self {
        Self::Max {
            value,
            message: None,
        }
    }

    pub fn email() -> Self {
        Self::Email { message: None }
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom {
            name: name.into(),
            message: None,
        }
    }

    /// Replace the default failure message
    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        match &mut self {
            Self::Pattern { message, .. }
            | Self::MinLength { message, .. }
            | Self::MaxLength { message, .. }
            | Self::Min { message, .. }
            | Self::Max { message, .. }
            | Self::Email { message }
            | Self::Custom { message, .. } => *message = Some(text.into()),
            Self::Unknown => {}
        }
        self
    }

    /// Custom failure message, if one was configured
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Pattern { message, .. }
            | Self::MinLength { message, .. }
            | Self::MaxLength { message, .. }
            | Self::Min { message, .. }
            | Self::Max { message, .. }
            | Self::Email { message }
            | Self::Custom { message, .. } => message.as_deref(),
            Self::Unknown => None,
        }
    }
}

/// A choice of a select or multi-select field
///
/// Schemas may write an option as a bare string (value and label alike) or
/// as `{"value": ..., "label": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OptionRepr")]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

impl From<&str> for SelectOption {
    fn from(value: &str) -> Self {
        Self::new(value, value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OptionRepr {
    Bare(String),
    Full { value: String, label: Option<String> },
}

impl From<OptionRepr> for SelectOption {
    fn from(repr: OptionRepr) -> Self {
        match repr {
            OptionRepr::Bare(value) => Self {
                label: value.clone(),
                value,
            },
            OptionRepr::Full { value, label } => Self {
                label: label.unwrap_or_else(|| value.clone()),
                value,
            },
        }
    }
}

/// Declarative description of a single input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub id: String,
    #[serde(default)]
    pub kind: FieldKind,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<ValidationRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl FieldConfig {
    /// Create a new field of the given kind
    pub fn new(id: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            label: label.to_string(),
            required: false,
            rules: Vec::new(),
            options: Vec::new(),
            placeholder: None,
            help: None,
        }
    }

    /// Create a new text field
    pub fn text(id: &str, label: &str) -> Self {
        Self::new(id, label, FieldKind::Text)
    }

    /// Create a new multiline text field
    pub fn textarea(id: &str, label: &str) -> Self {
        Self::new(id, label, FieldKind::Textarea)
    }

    pub fn number(id: &str, label: &str) -> Self {
        Self::new(id, label, FieldKind::Number)
    }

    pub fn date(id: &str, label: &str) -> Self {
        Self::new(id, label, FieldKind::Date)
    }

    pub fn checkbox(id: &str, label: &str) -> Self {
        Self::new(id, label, FieldKind::Checkbox)
    }

    pub fn image_set(id: &str, label: &str) -> Self {
        Self::new(id, label, FieldKind::ImageSet)
    }

    /// Create a new select field with its options
    pub fn select<O: Into<SelectOption>>(id: &str, label: &str, options: Vec<O>) -> Self {
        Self {
            options: options.into_iter().map(Into::into).collect(),
            ..Self::new(id, label, FieldKind::Select)
        }
    }

    pub fn multi_select<O: Into<SelectOption>>(id: &str, label: &str, options: Vec<O>) -> Self {
        Self {
            options: options.into_iter().map(Into::into).collect(),
            ..Self::new(id, label, FieldKind::MultiSelect)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    pub fn is_multiline(&self) -> bool {
        self.kind == FieldKind::Textarea
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }

    /// Label of the option with this value, falling back to the value itself
    pub fn option_label<'a>(&'a self, value: &'a str) -> &'a str {
        self.options
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
            .unwrap_or(value)
    }

    /// Value an untouched input of this kind holds
    pub fn empty_value(&self) -> FieldValue {
        match self.kind {
            FieldKind::Checkbox => FieldValue::Bool(false),
            FieldKind::MultiSelect | FieldKind::ImageSet => FieldValue::List(Vec::new()),
            _ => FieldValue::Null,
        }
    }
}
