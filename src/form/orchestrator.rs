//! Dynamic form orchestrator
//!
//! [`DynamicForm`] owns the values and errors of one form instance. Edits go
//! through [`FormModel::reduce`], which takes the current model and an
//! [`FormAction`] and returns the next model, so every transition is a plain
//! function of its inputs.
//!
//! Submitting runs in two halves so a caller can keep its event loop alive
//! while the submitter works: [`DynamicForm::begin_submit`] validates and
//! moves the form into [`FormPhase::Submitting`], and
//! [`DynamicForm::finish_submit`] reports the outcome and returns to
//! [`FormPhase::Editing`]. [`DynamicForm::submit`] does both in one call.

use std::fmt;
use std::sync::Arc;

use crate::error::FormError;
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::schema::{FormSchema, FormSection, RepeatableDescriptor, SectionLayout};
use crate::submit::Submitter;
use crate::validation::Validator;
use crate::value::{FieldValue, FormErrors, FormState, SectionErrors, SectionValue, ValueBag};

use super::repeatable::RepeatableSection;

/// Message shown once when validation blocks a submit
pub const BLOCKED_MESSAGE: &str = "Please fix the highlighted errors before submitting";

/// Message shown when a submit is attempted while one is in flight
pub const BUSY_MESSAGE: &str = "A submission is already in progress";

pub const SUCCESS_MESSAGE: &str = "Form submitted successfully";

type SuccessCallback = Box<dyn Fn(&FormState) + Send + Sync>;
type ErrorCallback = Box<dyn Fn(&str) + Send + Sync>;

/// A single state transition
#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    /// Set one field of a flat section
    SetFieldValue {
        section: String,
        field: String,
        value: FieldValue,
    },
    /// Set one field of one repeatable item
    SetItemFieldValue {
        section: String,
        index: usize,
        field: String,
        value: FieldValue,
    },
    /// Replace the whole item list of a repeatable section
    SetRepeatableValues {
        section: String,
        items: Vec<ValueBag>,
    },
    AddItem {
        section: String,
    },
    RemoveItem {
        section: String,
        index: usize,
    },
    MoveItem {
        section: String,
        from: usize,
        to: usize,
    },
}

impl FormAction {
    pub fn section(&self) -> &str {
        match self {
            Self::SetFieldValue { section, .. }
            | Self::SetItemFieldValue { section, .. }
            | Self::SetRepeatableValues { section, .. }
            | Self::AddItem { section }
            | Self::RemoveItem { section, .. }
            | Self::MoveItem { section, .. } => section,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::SetFieldValue { .. } => "set_field_value",
            Self::SetItemFieldValue { .. } => "set_item_field_value",
            Self::SetRepeatableValues { .. } => "set_repeatable_values",
            Self::AddItem { .. } => "add_item",
            Self::RemoveItem { .. } => "remove_item",
            Self::MoveItem { .. } => "move_item",
        }
    }
}

/// Values and errors of a form at one point in time
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormModel {
    pub values: FormState,
    pub errors: FormErrors,
}

impl FormModel {
    /// Seed a model from the schema and optional initial values
    ///
    /// Flat sections start from their initial bag or empty. Repeatable
    /// sections start from their initial items, or a single empty item.
    /// Initial values for undeclared sections, or of the wrong shape, are
    /// dropped.
    pub fn initial(schema: &FormSchema, initial: Option<FormState>) -> Self {
        let mut seed = initial.unwrap_or_default();
        let mut values = FormState::new();

        for section in schema.sections() {
            let given = seed.remove(&section.id);
            match (&section.layout, given) {
                (SectionLayout::Flat(_), Some(SectionValue::Flat(bag))) => {
                    values.insert(&section.id, SectionValue::Flat(bag));
                }
                (SectionLayout::Repeatable(descriptor), Some(SectionValue::Repeatable(items))) => {
                    let controller = RepeatableSection::new(&section.id, descriptor, Some(items));
                    values.set_items(&section.id, controller.into_items());
                }
                (layout, given) => {
                    if given.is_some() {
                        tracing::warn!(
                            "Initial values for section '{}' have the wrong shape; ignoring",
                            section.id
                        );
                    }
                    match layout {
                        SectionLayout::Flat(_) => {
                            values.insert(&section.id, SectionValue::Flat(ValueBag::new()))
                        }
                        SectionLayout::Repeatable(descriptor) => {
                            let controller = RepeatableSection::new(&section.id, descriptor, None);
                            values.set_items(&section.id, controller.into_items());
                        }
                    }
                }
            }
        }

        for unknown in seed.section_ids() {
            tracing::warn!("Initial values for undeclared section '{unknown}'; ignoring");
        }

        Self {
            values,
            errors: FormErrors::new(),
        }
    }

    /// Apply one action, returning the next model
    ///
    /// On error the current model is left as it was and nothing is returned.
    pub fn reduce(&self, schema: &FormSchema, action: FormAction) -> Result<Self, FormError> {
        let mut next = self.clone();
        let section = lookup_section(schema, action.section())?;

        match action {
            FormAction::SetFieldValue {
                section: section_id,
                field,
                value,
            } => {
                if section.is_repeatable() {
                    return Err(FormError::NotFlat(section_id));
                }
                ensure_field(section, &field)?;
                let bag = next
                    .values
                    .flat_mut(&section_id)
                    .ok_or_else(|| FormError::NotFlat(section_id.clone()))?;
                bag.insert(field.clone(), value);
                next.errors.clear_field(&section_id, &field);
            }
            FormAction::SetItemFieldValue {
                section: section_id,
                index,
                field,
                value,
            } => {
                let descriptor = repeatable_descriptor(section)?;
                ensure_field(section, &field)?;
                let mut controller = next.controller(&section_id, descriptor);
                controller.update_item(index, &field, value)?;
                let items = controller.into_items();
                next.values.set_items(&section_id, items);
                next.errors.clear_item_field(&section_id, index, &field);
            }
            FormAction::SetRepeatableValues {
                section: section_id,
                items,
            } => {
                repeatable_descriptor(section)?;
                next.values.set_items(&section_id, items);
                next.errors.clear_section(&section_id);
            }
            FormAction::AddItem {
                section: section_id,
            } => {
                let descriptor = repeatable_descriptor(section)?;
                let mut controller = next.controller(&section_id, descriptor);
                controller.add_item()?;
                let items = controller.into_items();
                next.values.set_items(&section_id, items);
                next.errors.clear_section(&section_id);
            }
            FormAction::RemoveItem {
                section: section_id,
                index,
            } => {
                let descriptor = repeatable_descriptor(section)?;
                let mut controller = next.controller(&section_id, descriptor);
                controller.remove_item(index)?;
                let items = controller.into_items();
                next.values.set_items(&section_id, items);
                next.errors.clear_section(&section_id);
            }
            FormAction::MoveItem {
                section: section_id,
                from,
                to,
            } => {
                let descriptor = repeatable_descriptor(section)?;
                let mut controller = next.controller(&section_id, descriptor);
                controller.move_item(from, to)?;
                let items = controller.into_items();
                next.values.set_items(&section_id, items);
                next.errors.clear_section(&section_id);
            }
        }

        Ok(next)
    }

    fn controller<'a>(
        &self,
        section_id: &'a str,
        descriptor: &'a RepeatableDescriptor,
    ) -> RepeatableSection<'a> {
        RepeatableSection::new(
            section_id,
            descriptor,
            Some(self.values.items(section_id).to_vec()),
        )
    }
}

fn lookup_section<'s>(schema: &'s FormSchema, section_id: &str) -> Result<&'s FormSection, FormError> {
    schema
        .section(section_id)
        .ok_or_else(|| FormError::UnknownSection(section_id.to_string()))
}

fn repeatable_descriptor(section: &FormSection) -> Result<&RepeatableDescriptor, FormError> {
    section
        .repeatable_descriptor()
        .ok_or_else(|| FormError::NotRepeatable(section.id.clone()))
}

fn ensure_field(section: &FormSection, field_id: &str) -> Result<(), FormError> {
    match section.field(field_id) {
        Some(_) => Ok(()),
        None => Err(FormError::UnknownField {
            section: section.id.clone(),
            field: field_id.to_string(),
        }),
    }
}

/// Validate every section, including repeatable item-count bounds
///
/// Only failing sections appear in the result.
pub fn validate_all(schema: &FormSchema, validator: &Validator, values: &FormState) -> FormErrors {
    let mut errors = FormErrors::new();

    for section in schema.sections() {
        match &section.layout {
            SectionLayout::Flat(fields) => {
                let result = validator.validate_form(fields, values.flat(&section.id));
                if !result.is_valid {
                    errors.insert(&section.id, SectionErrors::Flat(result.errors));
                }
            }
            SectionLayout::Repeatable(descriptor) => {
                let items = values.items(&section.id);
                let result = validator.validate_repeatable_section(&descriptor.fields, items);
                let count_error = item_count_error(section, descriptor, items.len());
                if !result.is_valid || count_error.is_some() {
                    errors.insert(
                        &section.id,
                        SectionErrors::Repeatable {
                            items: result.errors,
                            section: count_error,
                        },
                    );
                }
            }
        }
    }

    errors
}

fn item_count_error(
    section: &FormSection,
    descriptor: &RepeatableDescriptor,
    len: usize,
) -> Option<String> {
    if len < descriptor.min_items {
        return Some(format!(
            "{} needs at least {} item(s)",
            section.display_title(),
            descriptor.min_items
        ));
    }
    match descriptor.max_items {
        Some(max) if len > max => Some(format!(
            "{} allows at most {} item(s)",
            section.display_title(),
            max
        )),
        _ => None,
    }
}

/// Where the form is in its submit lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPhase {
    #[default]
    Editing,
    Submitting,
}

/// Result of one submit attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Validation failed; the submitter was not called
    Blocked(FormErrors),
    Succeeded,
    /// The submitter failed with this reason
    Failed(String),
    /// Another submission was still in flight
    Busy,
}

/// A validated snapshot waiting to be handed to the submitter
pub struct PendingSubmit {
    values: FormState,
    submitter: Arc<dyn Submitter>,
}

impl PendingSubmit {
    pub fn values(&self) -> &FormState {
        &self.values
    }

    /// Call the submitter once; errors are captured, never propagated
    pub async fn run(self) -> SubmitCompletion {
        let result = self
            .submitter
            .submit(&self.values)
            .await
            .map_err(|e| format!("{e:#}"));
        SubmitCompletion {
            values: self.values,
            result,
        }
    }
}

impl fmt::Debug for PendingSubmit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSubmit")
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

/// What the submitter reported for a [`PendingSubmit`]
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitCompletion {
    pub values: FormState,
    pub result: Result<(), String>,
}

/// One form instance: schema, state, and the submit lifecycle
pub struct DynamicForm {
    schema: FormSchema,
    initial: FormModel,
    model: FormModel,
    phase: FormPhase,
    validator: Validator,
    submitter: Arc<dyn Submitter>,
    notifier: Arc<dyn Notifier>,
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
}

impl DynamicForm {
    pub fn new(schema: FormSchema, initial: Option<FormState>, submitter: Arc<dyn Submitter>) -> Self {
        let model = FormModel::initial(&schema, initial);
        Self {
            schema,
            initial: model.clone(),
            model,
            phase: FormPhase::Editing,
            validator: Validator::default(),
            submitter,
            notifier: Arc::new(TracingNotifier),
            on_success: None,
            on_error: None,
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Called once with the submitted values after each successful submit
    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&FormState) + Send + Sync + 'static,
    {
        self.on_success = Some(Box::new(callback));
        self
    }

    /// Called once with the failure reason after each failed submit
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(callback));
        self
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn values(&self) -> &FormState {
        &self.model.values
    }

    pub fn errors(&self) -> &FormErrors {
        &self.model.errors
    }

    pub fn model(&self) -> &FormModel {
        &self.model
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == FormPhase::Submitting
    }

    /// True once any value differs from what the form started with
    pub fn is_dirty(&self) -> bool {
        self.model.values != self.initial.values
    }

    pub fn field_error(&self, section_id: &str, field_id: &str) -> Option<&str> {
        self.model.errors.field(section_id, field_id)
    }

    pub fn item_field_error(&self, section_id: &str, index: usize, field_id: &str) -> Option<&str> {
        self.model.errors.item_field(section_id, index, field_id)
    }

    pub fn section_error(&self, section_id: &str) -> Option<&str> {
        self.model.errors.section_message(section_id)
    }

    /// Apply one action; a rejected action leaves values and errors unchanged
    pub fn dispatch(&mut self, action: FormAction) -> Result<(), FormError> {
        let name = action.name();
        let section = action.section().to_string();
        match self.model.reduce(&self.schema, action) {
            Ok(next) => {
                tracing::debug!("Applied {name} on section '{section}'");
                self.model = next;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Rejected {name} on section '{section}': {e}");
                Err(e)
            }
        }
    }

    /// Set one field of a flat section and clear that field's error
    pub fn set_field_value(
        &mut self,
        section_id: &str,
        field_id: &str,
        value: FieldValue,
    ) -> Result<(), FormError> {
        self.dispatch(FormAction::SetFieldValue {
            section: section_id.to_string(),
            field: field_id.to_string(),
            value,
        })
    }

    /// Set one field of one repeatable item and clear that field's error
    pub fn set_item_field_value(
        &mut self,
        section_id: &str,
        index: usize,
        field_id: &str,
        value: FieldValue,
    ) -> Result<(), FormError> {
        self.dispatch(FormAction::SetItemFieldValue {
            section: section_id.to_string(),
            index,
            field: field_id.to_string(),
            value,
        })
    }

    /// Replace a repeatable section's items and clear all of its errors
    pub fn set_repeatable_section_values(
        &mut self,
        section_id: &str,
        items: Vec<ValueBag>,
    ) -> Result<(), FormError> {
        self.dispatch(FormAction::SetRepeatableValues {
            section: section_id.to_string(),
            items,
        })
    }

    pub fn add_item(&mut self, section_id: &str) -> Result<(), FormError> {
        self.dispatch(FormAction::AddItem {
            section: section_id.to_string(),
        })
    }

    pub fn remove_item(&mut self, section_id: &str, index: usize) -> Result<(), FormError> {
        self.dispatch(FormAction::RemoveItem {
            section: section_id.to_string(),
            index,
        })
    }

    pub fn move_item(&mut self, section_id: &str, from: usize, to: usize) -> Result<(), FormError> {
        self.dispatch(FormAction::MoveItem {
            section: section_id.to_string(),
            from,
            to,
        })
    }

    /// Whether `add_item` would be accepted right now
    pub fn can_add_item(&self, section_id: &str) -> bool {
        self.schema
            .section(section_id)
            .and_then(FormSection::repeatable_descriptor)
            .is_some_and(|d| !d.is_full(self.values().items(section_id).len()))
    }

    /// Whether removing an item would be accepted right now
    pub fn can_remove_item(&self, section_id: &str) -> bool {
        self.schema
            .section(section_id)
            .and_then(FormSection::repeatable_descriptor)
            .is_some_and(|d| self.values().items(section_id).len() > d.min_items)
    }

    /// Back to the initial values with no errors
    pub fn reset(&mut self) {
        tracing::debug!("Form reset");
        self.model = self.initial.clone();
    }

    /// Validate everything without changing state
    pub fn validate(&self) -> (bool, FormErrors) {
        let errors = validate_all(&self.schema, &self.validator, &self.model.values);
        (errors.is_empty(), errors)
    }

    /// Validate and, when everything passes, enter `Submitting`
    ///
    /// Returns the snapshot to hand to the submitter, or the outcome that
    /// ended this attempt early (`Busy` or `Blocked`).
    pub fn begin_submit(&mut self) -> Result<PendingSubmit, SubmitOutcome> {
        if self.is_submitting() {
            tracing::warn!("Submit ignored: previous submission still running");
            self.notifier.notify(Notification::warning(BUSY_MESSAGE));
            return Err(SubmitOutcome::Busy);
        }

        let (is_valid, errors) = self.validate();
        if !is_valid {
            tracing::info!("Submit blocked by {} validation error(s)", errors.count());
            self.model.errors = errors.clone();
            self.notifier.notify(Notification::warning(BLOCKED_MESSAGE));
            return Err(SubmitOutcome::Blocked(errors));
        }

        self.model.errors = FormErrors::new();
        self.phase = FormPhase::Submitting;
        tracing::info!("Submitting form '{}'", self.schema.display_title());
        Ok(PendingSubmit {
            values: self.model.values.clone(),
            submitter: Arc::clone(&self.submitter),
        })
    }

    /// Report the submitter's result and return to `Editing`
    ///
    /// Values and errors are left as they are either way.
    pub fn finish_submit(&mut self, completion: SubmitCompletion) -> SubmitOutcome {
        if !self.is_submitting() {
            tracing::warn!("Submit completion arrived while not submitting");
        }
        self.phase = FormPhase::Editing;

        match completion.result {
            Ok(()) => {
                tracing::info!("Submission succeeded");
                if let Some(callback) = &self.on_success {
                    callback(&completion.values);
                }
                self.notifier.notify(Notification::success(SUCCESS_MESSAGE));
                SubmitOutcome::Succeeded
            }
            Err(reason) => {
                tracing::warn!("Submission failed: {reason}");
                if let Some(callback) = &self.on_error {
                    callback(&reason);
                }
                self.notifier
                    .notify(Notification::error(format!("Submission failed: {reason}")));
                SubmitOutcome::Failed(reason)
            }
        }
    }

    /// Validate, submit and report in one call
    pub async fn submit(&mut self) -> SubmitOutcome {
        match self.begin_submit() {
            Ok(pending) => {
                let completion = pending.run().await;
                self.finish_submit(completion)
            }
            Err(outcome) => outcome,
        }
    }
}

impl fmt::Debug for DynamicForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicForm")
            .field("schema", &self.schema.display_title())
            .field("phase", &self.phase)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}
