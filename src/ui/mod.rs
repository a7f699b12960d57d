//! UI module for rendering the TUI

mod components;
mod forms;
mod layout;

use crate::app::App;
use ratatui::Frame;

pub use forms::{draw_field, field_height, FieldView};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let (header_area, body_area, status_area) = layout::create_layout(frame.area());

    layout::draw_header(frame, header_area, app);
    let inner = layout::draw_body_frame(frame, body_area);
    forms::draw_sections(frame, inner, app);
    layout::draw_status_bar(frame, status_area, app);

    // Modal overlay last so it sits on top
    if let Some(message) = &app.error_dialog {
        components::render_error_dialog(frame, message);
    }
}
