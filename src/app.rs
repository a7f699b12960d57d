//! Application state and core logic

use crate::error::FormError;
use crate::form::{DynamicForm, SubmitCompletion};
use crate::notify::{Notification, NotificationLevel, NotificationQueue};
use crate::schema::FormSchema;
use crate::state::{edit_value, focus_targets, EditorState, Focus, FocusTarget};
use crate::submit::Submitter;
use crate::value::FormState;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Second Ctrl+C must follow the first within this window to quit
const DOUBLE_CTRL_C_WINDOW: Duration = Duration::from_millis(1000);

/// Shown when quitting is refused because a submission is in flight
pub const QUIT_WHILE_SUBMITTING: &str = "Submission in progress, wait for it to finish before quitting";

/// Main application struct
pub struct App {
    /// The form being filled in
    pub form: DynamicForm,
    /// Notifications raised by the form, waiting to be shown
    notifications: Arc<NotificationQueue>,
    focus: Focus,
    /// Editing state of the focused field
    pub editor: EditorState,
    /// Latest notification, shown in the status bar
    pub status: Option<Notification>,
    /// Message of the error dialog, when one is open
    pub error_dialog: Option<String>,
    submit_tx: mpsc::UnboundedSender<SubmitCompletion>,
    submit_rx: mpsc::UnboundedReceiver<SubmitCompletion>,
    /// Whether the app should quit
    quit: bool,
    /// Timestamp of last Ctrl+C press for double-tap quit
    pub last_ctrl_c: Option<Instant>,
}

impl App {
    /// Create a new App instance for one form
    pub fn new(
        schema: FormSchema,
        initial: Option<FormState>,
        submitter: Arc<dyn Submitter>,
    ) -> Self {
        let notifications = Arc::new(NotificationQueue::new());
        let form =
            DynamicForm::new(schema, initial, submitter).with_notifier(notifications.clone());
        let (submit_tx, submit_rx) = mpsc::unbounded_channel();

        Self {
            form,
            notifications,
            focus: Focus::default(),
            editor: EditorState::default(),
            status: None,
            error_dialog: None,
            submit_tx,
            submit_rx,
            quit: false,
            last_ctrl_c: None,
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Focusable targets for the current values
    pub fn targets(&self) -> Vec<FocusTarget> {
        focus_targets(&self.form)
    }

    pub fn focused(&self) -> Option<FocusTarget> {
        let targets = self.targets();
        self.focus.current(&targets).cloned()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.handle_ctrl_c();
            return Ok(());
        }
        self.last_ctrl_c = None;

        // Error dialog is modal
        if self.error_dialog.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.error_dialog = None;
            }
            return Ok(());
        }

        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => self.request_quit(),
            KeyCode::Char('s') if ctrl => self.submit(),
            KeyCode::Char('r') if ctrl => self.reset(),
            KeyCode::Up if alt => self.move_focused_item(-1),
            KeyCode::Down if alt => self.move_focused_item(1),
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_prev(),
            _ => {
                if let Some(target) = self.focused() {
                    match (&target, key.code) {
                        (FocusTarget::AddItem { section }, KeyCode::Enter) => {
                            self.add_item(section)
                        }
                        (FocusTarget::RemoveItem { section, index }, KeyCode::Enter) => {
                            self.remove_item(section, *index)
                        }
                        (FocusTarget::Submit, KeyCode::Enter) => self.submit(),
                        _ if target.is_field() => self.edit_field(&target, key),
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_ctrl_c(&mut self) {
        let now = Instant::now();
        match self.last_ctrl_c {
            Some(previous) if now.duration_since(previous) <= DOUBLE_CTRL_C_WINDOW => {
                self.last_ctrl_c = None;
                self.request_quit();
            }
            _ => {
                self.last_ctrl_c = Some(now);
                self.status = Some(Notification::info("Press Ctrl+C again to quit"));
            }
        }
    }

    /// Quit unless a submission is still in flight
    fn request_quit(&mut self) {
        if self.form.is_submitting() {
            tracing::warn!("Quit refused while submitting");
            self.status = Some(Notification::warning(QUIT_WHILE_SUBMITTING));
            return;
        }
        self.quit = true;
    }

    fn focus_next(&mut self) {
        self.focus.next(self.targets().len());
        self.editor.reset();
    }

    fn focus_prev(&mut self) {
        self.focus.prev(self.targets().len());
        self.editor.reset();
    }

    fn set_focus(&mut self, target: &FocusTarget) {
        let targets = self.targets();
        let before = self.focus.index();
        self.focus.focus(&targets, target);
        if self.focus.index() != before {
            self.editor.reset();
        }
    }

    fn edit_field(&mut self, target: &FocusTarget, key: KeyEvent) {
        if self.form.is_submitting() {
            return;
        }
        let Some(section) = target.section().and_then(|id| self.form.schema().section(id)) else {
            return;
        };

        let result = match target {
            FocusTarget::Field { section: id, field } => {
                let Some(config) = section.field(field) else {
                    return;
                };
                let current = self.form.values().field(id, field);
                match edit_value(config, current, key, &mut self.editor) {
                    Some(value) => self.form.set_field_value(id, field, value),
                    None => Ok(()),
                }
            }
            FocusTarget::ItemField {
                section: id,
                index,
                field,
            } => {
                let Some(config) = section.field(field) else {
                    return;
                };
                let current = self.form.values().item_field(id, *index, field);
                match edit_value(config, current, key, &mut self.editor) {
                    Some(value) => self.form.set_item_field_value(id, *index, field, value),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        };

        if let Err(e) = result {
            self.report(e);
        }
    }

    fn add_item(&mut self, section_id: &str) {
        if self.form.is_submitting() {
            return;
        }
        match self.form.add_item(section_id) {
            Ok(()) => {
                let index = self.form.values().items(section_id).len().saturating_sub(1);
                let first_field = self
                    .form
                    .schema()
                    .section(section_id)
                    .and_then(|s| s.fields().first())
                    .map(|f| f.id.clone());
                if let Some(field) = first_field {
                    self.set_focus(&FocusTarget::ItemField {
                        section: section_id.to_string(),
                        index,
                        field,
                    });
                }
            }
            Err(e) => self.report(e),
        }
    }

    fn remove_item(&mut self, section_id: &str, index: usize) {
        if self.form.is_submitting() {
            return;
        }
        match self.form.remove_item(section_id, index) {
            Ok(()) => {
                let remaining = self.form.values().items(section_id).len();
                let next = if remaining == 0 {
                    FocusTarget::AddItem {
                        section: section_id.to_string(),
                    }
                } else {
                    FocusTarget::RemoveItem {
                        section: section_id.to_string(),
                        index: index.min(remaining - 1),
                    }
                };
                self.set_focus(&next);
            }
            Err(e) => self.report(e),
        }
    }

    /// Move the focused repeatable item up (-1) or down (+1)
    fn move_focused_item(&mut self, delta: isize) {
        if self.form.is_submitting() {
            return;
        }
        let Some(target) = self.focused() else {
            return;
        };
        let Some((section_id, index)) = target.item() else {
            return;
        };
        let len = self.form.values().items(section_id).len();
        let Some(to) = index.checked_add_signed(delta).filter(|to| *to < len) else {
            return;
        };

        let section_id = section_id.to_string();
        match self.form.move_item(&section_id, index, to) {
            Ok(()) => self.set_focus(&target.with_index(to)),
            Err(e) => self.report(e),
        }
    }

    fn reset(&mut self) {
        if self.form.is_submitting() {
            return;
        }
        self.form.reset();
        self.focus = Focus::default();
        self.editor.reset();
        self.status = Some(Notification::info("Form reset"));
    }

    /// Start a submission in the background; the result arrives via `poll_submissions`
    fn submit(&mut self) {
        match self.form.begin_submit() {
            Ok(pending) => {
                let tx = self.submit_tx.clone();
                tokio::spawn(async move {
                    let completion = pending.run().await;
                    if tx.send(completion).is_err() {
                        tracing::warn!("Submission finished after the form was closed");
                    }
                });
                self.status = Some(Notification::info("Submitting…"));
            }
            Err(_) => self.focus_first_error(),
        }
        self.show_notifications();
    }

    /// Hand finished submissions back to the form
    pub fn poll_submissions(&mut self) {
        while let Ok(completion) = self.submit_rx.try_recv() {
            self.complete_submission(completion);
        }
    }

    fn complete_submission(&mut self, completion: SubmitCompletion) {
        self.form.finish_submit(completion);
        self.show_notifications();
    }

    fn focus_first_error(&mut self) {
        let errors = self.form.errors();
        let target = self.targets().into_iter().find(|t| match t {
            FocusTarget::Field { section, field } => errors.field(section, field).is_some(),
            FocusTarget::ItemField {
                section,
                index,
                field,
            } => errors.item_field(section, *index, field).is_some(),
            FocusTarget::AddItem { section } => errors.section_message(section).is_some(),
            _ => false,
        });
        if let Some(target) = target {
            self.set_focus(&target);
        }
    }

    fn report(&mut self, error: FormError) {
        self.status = Some(Notification::warning(error.to_string()));
    }

    fn show_notifications(&mut self) {
        for notification in self.notifications.drain() {
            if notification.level == NotificationLevel::Error {
                self.error_dialog = Some(notification.message.clone());
            }
            self.status = Some(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldConfig, FormSection};
    use crate::submit::{FnSubmitter, MockSubmitter};
    use crate::value::FieldValue;
    use anyhow::anyhow;
    use pretty_assertions::assert_eq;

    fn schema() -> FormSchema {
        FormSchema::new(vec![
            FormSection::flat("contact", vec![FieldConfig::text("name", "Name").required()]),
            FormSection::repeatable(
                "items",
                vec![FieldConfig::text("title", "Title")],
                1,
                Some(2),
            ),
        ])
        .unwrap()
    }

    fn app_with(submitter: Arc<dyn Submitter>) -> App {
        App::new(schema(), None, submitter)
    }

    fn app() -> App {
        app_with(Arc::new(FnSubmitter::new(|_: FormState| async { Ok(()) })))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap();
    }

    fn press_with(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
        app.handle_key(KeyEvent::new(code, modifiers)).unwrap();
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    mod editing {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_typing_updates_focused_field() {
            let mut app = app();
            type_text(&mut app, "Asha");
            assert_eq!(
                app.form.values().field("contact", "name"),
                Some(&FieldValue::text("Asha"))
            );
        }

        #[test]
        fn test_tab_moves_to_item_field() {
            let mut app = app();
            press(&mut app, KeyCode::Tab);
            type_text(&mut app, "Pump");
            assert_eq!(
                app.form.values().item_field("items", 0, "title"),
                Some(&FieldValue::text("Pump"))
            );
        }

        #[test]
        fn test_backtab_wraps_to_submit() {
            let mut app = app();
            press(&mut app, KeyCode::BackTab);
            assert_eq!(app.focused(), Some(FocusTarget::Submit));
        }
    }

    mod structure {
        use super::*;
        use pretty_assertions::assert_eq;

        fn focus_add(app: &mut App) {
            app.set_focus(&FocusTarget::AddItem {
                section: "items".to_string(),
            });
        }

        #[test]
        fn test_enter_on_add_creates_item_and_focuses_it() {
            let mut app = app();
            focus_add(&mut app);
            press(&mut app, KeyCode::Enter);

            assert_eq!(app.form.values().items("items").len(), 2);
            assert_eq!(
                app.focused(),
                Some(FocusTarget::ItemField {
                    section: "items".to_string(),
                    index: 1,
                    field: "title".to_string()
                })
            );
        }

        #[test]
        fn test_add_beyond_max_is_reported() {
            let mut app = app();
            focus_add(&mut app);
            press(&mut app, KeyCode::Enter);
            focus_add(&mut app);
            press(&mut app, KeyCode::Enter);

            assert_eq!(app.form.values().items("items").len(), 2);
            let status = app.status.as_ref().unwrap();
            assert_eq!(status.level, NotificationLevel::Warning);
            assert!(status.message.contains("maximum"));
        }

        #[test]
        fn test_remove_last_item_is_refused() {
            let mut app = app();
            app.set_focus(&FocusTarget::RemoveItem {
                section: "items".to_string(),
                index: 0,
            });
            press(&mut app, KeyCode::Enter);
            assert_eq!(app.form.values().items("items").len(), 1);
            assert!(app.status.is_some());
        }

        #[test]
        fn test_alt_down_moves_item_and_focus() {
            let mut app = app();
            app.form
                .set_item_field_value("items", 0, "title", FieldValue::text("first"))
                .unwrap();
            app.form.add_item("items").unwrap();
            app.set_focus(&FocusTarget::ItemField {
                section: "items".to_string(),
                index: 0,
                field: "title".to_string(),
            });

            press_with(&mut app, KeyCode::Down, KeyModifiers::ALT);

            assert_eq!(
                app.form.values().item_field("items", 1, "title"),
                Some(&FieldValue::text("first"))
            );
            assert_eq!(app.focused().unwrap().item(), Some(("items", 1)));
        }
    }

    mod submitting {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_blocked_submit_focuses_first_error() {
            let mut app = app();
            press(&mut app, KeyCode::Tab);
            press_with(&mut app, KeyCode::Char('s'), KeyModifiers::CONTROL);

            assert!(!app.form.is_submitting());
            assert_eq!(
                app.focused(),
                Some(FocusTarget::Field {
                    section: "contact".to_string(),
                    field: "name".to_string()
                })
            );
            assert_eq!(
                app.status.as_ref().map(|n| n.level),
                Some(NotificationLevel::Warning)
            );
            assert!(app.error_dialog.is_none());
        }

        #[tokio::test]
        async fn test_successful_submit_round_trip() {
            let mut app = app();
            type_text(&mut app, "Asha");
            press_with(&mut app, KeyCode::Char('s'), KeyModifiers::CONTROL);
            assert!(app.form.is_submitting());

            let completion = app.submit_rx.recv().await.unwrap();
            app.complete_submission(completion);

            assert!(!app.form.is_submitting());
            assert_eq!(
                app.status.as_ref().map(|n| n.level),
                Some(NotificationLevel::Success)
            );
        }

        #[tokio::test]
        async fn test_failed_submit_opens_error_dialog() {
            let mut mock = MockSubmitter::new();
            mock.expect_submit()
                .times(1)
                .returning(|_| Err(anyhow!("connection refused")));
            let mut app = app_with(Arc::new(mock));
            type_text(&mut app, "Asha");
            press_with(&mut app, KeyCode::Char('s'), KeyModifiers::CONTROL);

            let completion = app.submit_rx.recv().await.unwrap();
            app.complete_submission(completion);

            assert_eq!(
                app.error_dialog.as_deref(),
                Some("Submission failed: connection refused")
            );
            assert_eq!(
                app.form.values().field("contact", "name"),
                Some(&FieldValue::text("Asha"))
            );

            press(&mut app, KeyCode::Esc);
            assert!(app.error_dialog.is_none());
            assert!(!app.should_quit());
        }

        #[tokio::test]
        async fn test_edits_ignored_while_submitting() {
            let mut app = app();
            type_text(&mut app, "Asha");
            press_with(&mut app, KeyCode::Char('s'), KeyModifiers::CONTROL);
            type_text(&mut app, "!!");

            assert_eq!(
                app.form.values().field("contact", "name"),
                Some(&FieldValue::text("Asha"))
            );
        }

        #[tokio::test]
        async fn test_second_submit_reports_busy() {
            let mut app = app();
            type_text(&mut app, "Asha");
            press_with(&mut app, KeyCode::Char('s'), KeyModifiers::CONTROL);
            press_with(&mut app, KeyCode::Char('s'), KeyModifiers::CONTROL);

            assert_eq!(
                app.status.as_ref().map(|n| n.message.as_str()),
                Some(crate::form::BUSY_MESSAGE)
            );
        }
    }

    mod quitting {
        use super::*;
        use pretty_assertions::assert_eq;

        fn submitting_app() -> App {
            let mut app = app();
            type_text(&mut app, "Asha");
            press_with(&mut app, KeyCode::Char('s'), KeyModifiers::CONTROL);
            assert!(app.form.is_submitting());
            app
        }

        #[tokio::test]
        async fn test_esc_does_not_quit_while_submitting() {
            let mut app = submitting_app();
            press(&mut app, KeyCode::Esc);

            assert!(!app.should_quit());
            assert_eq!(
                app.status.as_ref().map(|n| n.message.as_str()),
                Some(QUIT_WHILE_SUBMITTING)
            );

            let completion = app.submit_rx.recv().await.unwrap();
            app.complete_submission(completion);
            assert_eq!(
                app.status.as_ref().map(|n| n.level),
                Some(NotificationLevel::Success)
            );

            press(&mut app, KeyCode::Esc);
            assert!(app.should_quit());
        }

        #[tokio::test]
        async fn test_double_ctrl_c_does_not_quit_while_submitting() {
            let mut app = submitting_app();
            press_with(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
            press_with(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
            assert!(!app.should_quit());

            let completion = app.submit_rx.recv().await.unwrap();
            app.complete_submission(completion);
            press_with(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
            press_with(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
            assert!(app.should_quit());
        }

        #[test]
        fn test_esc_quits() {
            let mut app = app();
            press(&mut app, KeyCode::Esc);
            assert!(app.should_quit());
        }

        #[test]
        fn test_double_ctrl_c_quits() {
            let mut app = app();
            press_with(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
            assert!(!app.should_quit());
            press_with(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
            assert!(app.should_quit());
        }

        #[test]
        fn test_other_key_between_ctrl_c_resets() {
            let mut app = app();
            press_with(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
            press(&mut app, KeyCode::Tab);
            press_with(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
            assert!(!app.should_quit());
        }
    }
}
