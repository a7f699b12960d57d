//! dynform - schema-driven dynamic forms
//!
//! A form is declared as a [`FormSchema`] of flat and repeatable sections.
//! [`DynamicForm`] owns its values and errors, validates on submit and hands
//! valid values to a [`Submitter`]. The `app` and `ui` modules render any
//! schema in the terminal.

pub mod app;
pub mod config;
pub mod error;
pub mod form;
pub mod notify;
pub mod schema;
pub mod state;
pub mod submit;
pub mod ui;
pub mod validation;
pub mod value;

pub use error::{FormError, SchemaError, StructuralError};
pub use form::{DynamicForm, FormAction, FormModel, FormPhase, SubmitOutcome};
pub use notify::{Notification, NotificationLevel, Notifier};
pub use schema::{FieldConfig, FieldKind, FormSchema, FormSection, ValidationRule};
pub use submit::Submitter;
pub use validation::{validate_form, validate_repeatable_section, PredicateRegistry, Validator};
pub use value::{FieldValue, FormErrors, FormState, SectionErrors, SectionValue, ValueBag};
