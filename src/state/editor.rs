//! Keyboard editing of a single field value
//!
//! Each key press is turned into a new [`FieldValue`] for the focused field,
//! depending on its kind. The caller hands the result to the form; nothing
//! here touches form state directly.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::schema::{FieldConfig, FieldKind};
use crate::value::FieldValue;

/// Per-focus editing state that is not part of the value itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
    /// Highlighted option of a multi-select
    pub option_cursor: usize,
    /// Path being typed for an image set
    pub pending_input: String,
}

impl EditorState {
    pub fn reset(&mut self) {
        self.option_cursor = 0;
        self.pending_input.clear();
    }
}

/// New value for `field` after `key`, or `None` when the value is unchanged
pub fn edit_value(
    field: &FieldConfig,
    current: Option<&FieldValue>,
    key: KeyEvent,
    editor: &mut EditorState,
) -> Option<FieldValue> {
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }
    let current = current.cloned().unwrap_or_default();

    match field.kind {
        FieldKind::Text | FieldKind::Number | FieldKind::Date => edit_text(&current, key, false),
        FieldKind::Textarea => edit_text(&current, key, true),
        FieldKind::Select => edit_select(field, &current, key),
        FieldKind::MultiSelect => edit_multi_select(field, &current, key, editor),
        FieldKind::Checkbox => match key.code {
            KeyCode::Char(' ') | KeyCode::Enter => Some(FieldValue::Bool(!current.as_bool())),
            _ => None,
        },
        FieldKind::ImageSet => edit_image_set(&current, key, editor),
    }
}

fn edit_text(current: &FieldValue, key: KeyEvent, multiline: bool) -> Option<FieldValue> {
    let mut text = current.display_value();
    match key.code {
        KeyCode::Char(c) => text.push(c),
        KeyCode::Enter if multiline => text.push('\n'),
        KeyCode::Backspace => {
            text.pop()?;
        }
        _ => return None,
    }
    Some(FieldValue::Text(text))
}

fn edit_select(field: &FieldConfig, current: &FieldValue, key: KeyEvent) -> Option<FieldValue> {
    let count = field.options.len();
    if count == 0 {
        return None;
    }
    let selected = current
        .as_text()
        .and_then(|v| field.options.iter().position(|o| o.value == v));

    let next = match (key.code, selected) {
        (KeyCode::Right, Some(i)) => (i + 1) % count,
        (KeyCode::Right, None) => 0,
        (KeyCode::Left, Some(0)) | (KeyCode::Left, None) => count - 1,
        (KeyCode::Left, Some(i)) => i - 1,
        _ => return None,
    };
    Some(FieldValue::Text(field.options[next].value.clone()))
}

fn edit_multi_select(
    field: &FieldConfig,
    current: &FieldValue,
    key: KeyEvent,
    editor: &mut EditorState,
) -> Option<FieldValue> {
    let count = field.options.len();
    if count == 0 {
        return None;
    }
    editor.option_cursor = editor.option_cursor.min(count - 1);

    match key.code {
        KeyCode::Right => {
            editor.option_cursor = (editor.option_cursor + 1) % count;
            None
        }
        KeyCode::Left => {
            editor.option_cursor = editor.option_cursor.checked_sub(1).unwrap_or(count - 1);
            None
        }
        KeyCode::Char(' ') => {
            let toggled = &field.options[editor.option_cursor].value;
            let chosen = current.as_list();
            // keep selections in option order
            let next = field
                .options
                .iter()
                .map(|o| &o.value)
                .filter(|v| {
                    let was_chosen = chosen.contains(*v);
                    if *v == toggled {
                        !was_chosen
                    } else {
                        was_chosen
                    }
                })
                .cloned();
            Some(FieldValue::list(next))
        }
        _ => None,
    }
}

fn edit_image_set(
    current: &FieldValue,
    key: KeyEvent,
    editor: &mut EditorState,
) -> Option<FieldValue> {
    match key.code {
        KeyCode::Char(c) => {
            editor.pending_input.push(c);
            None
        }
        KeyCode::Backspace if !editor.pending_input.is_empty() => {
            editor.pending_input.pop();
            None
        }
        KeyCode::Backspace => {
            let mut images = current.as_list().to_vec();
            images.pop()?;
            Some(FieldValue::List(images))
        }
        KeyCode::Enter => {
            let path = editor.pending_input.trim().to_string();
            editor.pending_input.clear();
            if path.is_empty() {
                return None;
            }
            let mut images = current.as_list().to_vec();
            images.push(path);
            Some(FieldValue::List(images))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_into(field: &FieldConfig, text: &str) -> Option<FieldValue> {
        let mut editor = EditorState::default();
        let mut value = None;
        for c in text.chars() {
            value = edit_value(field, value.as_ref(), key(KeyCode::Char(c)), &mut editor);
        }
        value
    }

    mod text {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_typing_and_backspace() {
            let field = FieldConfig::text("name", "Name");
            let mut editor = EditorState::default();
            let value = type_into(&field, "Ash").unwrap();
            assert_eq!(value, FieldValue::text("Ash"));

            let value = edit_value(&field, Some(&value), key(KeyCode::Backspace), &mut editor);
            assert_eq!(value, Some(FieldValue::text("As")));
        }

        #[test]
        fn test_backspace_on_empty_is_no_change() {
            let field = FieldConfig::text("name", "Name");
            let mut editor = EditorState::default();
            assert_eq!(
                edit_value(&field, None, key(KeyCode::Backspace), &mut editor),
                None
            );
        }

        #[test]
        fn test_enter_only_breaks_lines_in_textarea() {
            let mut editor = EditorState::default();
            let line = FieldValue::text("a");
            let text = FieldConfig::text("t", "T");
            let area = FieldConfig::textarea("d", "D");

            assert_eq!(
                edit_value(&text, Some(&line), key(KeyCode::Enter), &mut editor),
                None
            );
            assert_eq!(
                edit_value(&area, Some(&line), key(KeyCode::Enter), &mut editor),
                Some(FieldValue::text("a\n"))
            );
        }

        #[test]
        fn test_number_is_typed_as_text() {
            let field = FieldConfig::number("qty", "Quantity");
            let value = type_into(&field, "12").unwrap();
            assert_eq!(value.as_number(), Some(12.0));
        }

        #[test]
        fn test_control_keys_are_ignored() {
            let field = FieldConfig::text("name", "Name");
            let mut editor = EditorState::default();
            let ctrl_s = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
            assert_eq!(edit_value(&field, None, ctrl_s, &mut editor), None);
        }
    }

    mod choices {
        use super::*;
        use pretty_assertions::assert_eq;

        fn priority() -> FieldConfig {
            FieldConfig::select("priority", "Priority", vec!["low", "high"])
        }

        #[test]
        fn test_select_cycles_both_ways() {
            let field = priority();
            let mut editor = EditorState::default();

            let first = edit_value(&field, None, key(KeyCode::Right), &mut editor).unwrap();
            assert_eq!(first, FieldValue::text("low"));
            let second = edit_value(&field, Some(&first), key(KeyCode::Right), &mut editor).unwrap();
            assert_eq!(second, FieldValue::text("high"));
            let wrapped =
                edit_value(&field, Some(&second), key(KeyCode::Right), &mut editor).unwrap();
            assert_eq!(wrapped, FieldValue::text("low"));
            let back = edit_value(&field, Some(&wrapped), key(KeyCode::Left), &mut editor).unwrap();
            assert_eq!(back, FieldValue::text("high"));
        }

        #[test]
        fn test_multi_select_toggles_at_cursor() {
            let field = FieldConfig::multi_select("tags", "Tags", vec!["a", "b", "c"]);
            let mut editor = EditorState::default();

            assert_eq!(
                edit_value(&field, None, key(KeyCode::Right), &mut editor),
                None
            );
            assert_eq!(editor.option_cursor, 1);
            let value = edit_value(&field, None, key(KeyCode::Char(' ')), &mut editor).unwrap();
            assert_eq!(value, FieldValue::list(["b"]));

            editor.option_cursor = 0;
            let value =
                edit_value(&field, Some(&value), key(KeyCode::Char(' ')), &mut editor).unwrap();
            assert_eq!(value, FieldValue::list(["a", "b"]));

            editor.option_cursor = 1;
            let value =
                edit_value(&field, Some(&value), key(KeyCode::Char(' ')), &mut editor).unwrap();
            assert_eq!(value, FieldValue::list(["a"]));
        }

        #[test]
        fn test_multi_select_cursor_wraps_left() {
            let field = FieldConfig::multi_select("tags", "Tags", vec!["a", "b", "c"]);
            let mut editor = EditorState::default();
            edit_value(&field, None, key(KeyCode::Left), &mut editor);
            assert_eq!(editor.option_cursor, 2);
        }

        #[test]
        fn test_checkbox_toggles() {
            let field = FieldConfig::checkbox("agree", "Agree");
            let mut editor = EditorState::default();
            let on = edit_value(&field, None, key(KeyCode::Char(' ')), &mut editor).unwrap();
            assert_eq!(on, FieldValue::Bool(true));
            let off = edit_value(&field, Some(&on), key(KeyCode::Enter), &mut editor).unwrap();
            assert_eq!(off, FieldValue::Bool(false));
        }
    }

    mod images {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_enter_appends_typed_path() {
            let field = FieldConfig::image_set("photos", "Photos");
            let mut editor = EditorState::default();
            for c in "a.png".chars() {
                assert_eq!(
                    edit_value(&field, None, key(KeyCode::Char(c)), &mut editor),
                    None
                );
            }
            assert_eq!(editor.pending_input, "a.png");

            let value = edit_value(&field, None, key(KeyCode::Enter), &mut editor).unwrap();
            assert_eq!(value, FieldValue::list(["a.png"]));
            assert!(editor.pending_input.is_empty());
        }

        #[test]
        fn test_enter_with_blank_input_is_no_change() {
            let field = FieldConfig::image_set("photos", "Photos");
            let mut editor = EditorState {
                pending_input: "  ".to_string(),
                ..Default::default()
            };
            assert_eq!(
                edit_value(&field, None, key(KeyCode::Enter), &mut editor),
                None
            );
        }

        #[test]
        fn test_backspace_removes_last_image_when_input_empty() {
            let field = FieldConfig::image_set("photos", "Photos");
            let mut editor = EditorState::default();
            let current = FieldValue::list(["a.png", "b.png"]);
            let value =
                edit_value(&field, Some(&current), key(KeyCode::Backspace), &mut editor).unwrap();
            assert_eq!(value, FieldValue::list(["a.png"]));
        }

        #[test]
        fn test_backspace_edits_input_first() {
            let field = FieldConfig::image_set("photos", "Photos");
            let mut editor = EditorState {
                pending_input: "ab".to_string(),
                ..Default::default()
            };
            let current = FieldValue::list(["a.png"]);
            assert_eq!(
                edit_value(&field, Some(&current), key(KeyCode::Backspace), &mut editor),
                None
            );
            assert_eq!(editor.pending_input, "a");
        }
    }
}
