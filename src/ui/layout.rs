//! Layout components (header, status bar)

use crate::app::App;
use crate::form::FormPhase;
use crate::notify::NotificationLevel;
use crate::schema::FieldKind;
use crate::state::FocusTarget;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Split the screen into header, body and status bar
pub fn create_layout(area: Rect) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(0),    // Form body
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    (chunks[0], chunks[1], chunks[2])
}

/// Draw the form title, with a marker once anything was edited
pub fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        format!(" {} ", app.form.schema().display_title()),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    if app.form.is_dirty() {
        spans.push(Span::styled("● modified", Style::default().fg(Color::Yellow)));
    }
    let error_count = app.form.errors().count();
    if error_count > 0 {
        spans.push(Span::styled(
            format!("  {error_count} error(s)"),
            Style::default().fg(Color::Red),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Bordered frame around the form body; returns the inner area
pub fn draw_body_frame(frame: &mut Frame, area: Rect) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

/// Draw the status bar
pub fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![];

    let phase = match app.form.phase() {
        FormPhase::Editing => Span::styled(" ● Editing ", Style::default().fg(Color::Green)),
        FormPhase::Submitting => {
            Span::styled(" ◌ Submitting… ", Style::default().fg(Color::Yellow))
        }
    };
    spans.push(phase);

    if let Some(notification) = &app.status {
        let color = match notification.level {
            NotificationLevel::Info => Color::White,
            NotificationLevel::Success => Color::Green,
            NotificationLevel::Warning => Color::Yellow,
            NotificationLevel::Error => Color::Red,
        };
        spans.push(Span::raw("| "));
        spans.push(Span::styled(
            notification.message.as_str(),
            Style::default().fg(color),
        ));
        spans.push(Span::raw(" "));
    }

    spans.push(Span::raw("| "));
    spans.push(Span::styled(
        focus_hints(app.focused().as_ref(), app),
        Style::default().fg(Color::Gray),
    ));

    let status = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status, area);

    let quit_hint = " ^C^C:quit ";
    let width = quit_hint.len() as u16;
    if area.width > width {
        let quit_area = Rect {
            x: area.x + area.width - width,
            width,
            ..area
        };
        let quit_widget =
            Paragraph::new(quit_hint).style(Style::default().bg(Color::DarkGray).fg(Color::Gray));
        frame.render_widget(quit_widget, quit_area);
    }
}

/// Keyboard hints for what is focused
fn focus_hints(target: Option<&FocusTarget>, app: &App) -> String {
    let field_kind = target.and_then(|t| match t {
        FocusTarget::Field { section, field }
        | FocusTarget::ItemField { section, field, .. } => app
            .form
            .schema()
            .section(section)
            .and_then(|s| s.field(field))
            .map(|f| (f.kind, f.help.as_deref())),
        _ => None,
    });

    let keys = match (target, field_kind) {
        (Some(_), Some((kind, help))) => {
            let edit = match kind {
                FieldKind::Select => "←/→:choose",
                FieldKind::MultiSelect => "←/→:move  Space:toggle",
                FieldKind::Checkbox => "Space:toggle",
                FieldKind::ImageSet => "type path  Enter:add  Bksp:remove last",
                FieldKind::Textarea => "Enter:newline",
                _ => "type to edit",
            };
            let item_keys = if target.and_then(FocusTarget::item).is_some() {
                "  Alt+↑/↓:move item"
            } else {
                ""
            };
            match help {
                Some(help) => format!("{help}  {edit}{item_keys}"),
                None => format!("{edit}{item_keys}"),
            }
        }
        (Some(FocusTarget::AddItem { .. }), _) => "Enter:add item".to_string(),
        (Some(FocusTarget::RemoveItem { .. }), _) => {
            "Enter:remove item  Alt+↑/↓:move item".to_string()
        }
        (Some(FocusTarget::Submit), _) => "Enter:submit".to_string(),
        _ => String::new(),
    };

    format!("Tab:next  {keys}  ^S:submit  ^R:reset  Esc:quit")
}
