//! Front-end state that lives outside the form itself

mod editor;
mod focus;

pub use editor::{edit_value, EditorState};
pub use focus::{focus_targets, Focus, FocusTarget};
