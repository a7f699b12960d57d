//! Field rendering for any schema field
//!
//! Every [`FieldKind`] is drawn as a bordered box titled with the field label,
//! followed by a red error line when the field has an error.

use crate::schema::{FieldConfig, FieldKind};
use crate::value::FieldValue;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const CURSOR: &str = "▌";
const TEXTAREA_HEIGHT: u16 = 6;
const BOX_HEIGHT: u16 = 3;

/// What to draw for one field
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldView<'a> {
    pub value: Option<&'a FieldValue>,
    pub error: Option<&'a str>,
    pub is_active: bool,
    /// Highlighted option of a focused multi-select
    pub option_cursor: usize,
    /// Text being typed into a focused image set
    pub pending_input: &'a str,
}

/// Rows the field occupies, including its error line
pub fn field_height(field: &FieldConfig, has_error: bool) -> u16 {
    let body = if field.is_multiline() {
        TEXTAREA_HEIGHT
    } else {
        BOX_HEIGHT
    };
    body + u16::from(has_error)
}

/// Draw a field with its value, focus state and error
pub fn draw_field(frame: &mut Frame, area: Rect, field: &FieldConfig, view: FieldView) {
    let has_error = view.error.is_some();
    let box_area = Rect {
        height: area.height.saturating_sub(u16::from(has_error)),
        ..area
    };

    let border_style = if view.is_active {
        Style::default().fg(Color::Cyan)
    } else if has_error {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let title = if field.required {
        format!(" {} * ", field.label)
    } else {
        format!(" {} ", field.label)
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    let content = Paragraph::new(field_lines(field, &view))
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(content, box_area);

    if let Some(message) = view.error {
        let error_area = Rect {
            y: box_area.y + box_area.height,
            height: 1,
            ..area
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!(" ✗ {message}"),
                Style::default().fg(Color::Red),
            ))),
            error_area,
        );
    }
}

fn field_lines<'a>(field: &'a FieldConfig, view: &FieldView<'a>) -> Vec<Line<'a>> {
    let value = view.value.cloned().unwrap_or_default();
    let text_style = if view.is_active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let cursor = Span::styled(
        if view.is_active { CURSOR } else { "" },
        Style::default().fg(Color::Cyan),
    );

    match field.kind {
        FieldKind::Text | FieldKind::Number | FieldKind::Date => {
            let shown = value.display_value();
            if shown.is_empty() && !view.is_active {
                vec![Line::from(placeholder(field))]
            } else {
                vec![Line::from(vec![Span::styled(shown, text_style), cursor])]
            }
        }
        FieldKind::Textarea => {
            let shown = value.display_value();
            if shown.is_empty() && !view.is_active {
                return vec![Line::from(placeholder(field))];
            }
            let mut lines: Vec<Line> = shown
                .split('\n')
                .map(|l| Line::from(Span::styled(l.to_string(), text_style)))
                .collect();
            if let Some(last) = lines.last_mut() {
                last.spans.push(cursor);
            }
            lines
        }
        FieldKind::Select => {
            let shown = value
                .as_text()
                .map(|v| field.option_label(v).to_string())
                .unwrap_or_else(|| "(none)".to_string());
            if view.is_active {
                vec![Line::from(vec![
                    Span::styled("◀ ", Style::default().fg(Color::Cyan)),
                    Span::styled(shown, text_style.add_modifier(Modifier::BOLD)),
                    Span::styled(" ▶", Style::default().fg(Color::Cyan)),
                ])]
            } else {
                vec![Line::from(shown)]
            }
        }
        FieldKind::MultiSelect => {
            let chosen = value.as_list();
            let mut spans = Vec::new();
            for (i, option) in field.options.iter().enumerate() {
                let mark = if chosen.contains(&option.value) {
                    "[x]"
                } else {
                    "[ ]"
                };
                let style = if view.is_active && i == view.option_cursor {
                    Style::default().fg(Color::Black).bg(Color::Cyan)
                } else {
                    text_style
                };
                if i > 0 {
                    spans.push(Span::raw("  "));
                }
                spans.push(Span::styled(format!("{mark} {}", option.label), style));
            }
            vec![Line::from(spans)]
        }
        FieldKind::Checkbox => {
            let mark = if value.as_bool() { "[x]" } else { "[ ]" };
            vec![Line::from(Span::styled(mark, text_style))]
        }
        FieldKind::ImageSet => {
            let images = value.as_list();
            let mut spans = Vec::new();
            if images.is_empty() {
                spans.push(Span::styled(
                    "(no images)",
                    Style::default().fg(Color::DarkGray),
                ));
            } else {
                spans.push(Span::styled(images.join(", "), text_style));
            }
            if view.is_active {
                spans.push(Span::styled("  + ", Style::default().fg(Color::Cyan)));
                spans.push(Span::raw(view.pending_input.to_string()));
                spans.push(cursor);
            }
            vec![Line::from(spans)]
        }
    }
}

fn placeholder(field: &FieldConfig) -> Span<'_> {
    Span::styled(
        field.placeholder.as_deref().unwrap_or("(empty)"),
        Style::default().fg(Color::DarkGray),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SelectOption;
    use ratatui::{backend::TestBackend, Terminal};

    fn render(field: &FieldConfig, view: FieldView) -> String {
        let height = field_height(field, view.error.is_some());
        let backend = TestBackend::new(50, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| draw_field(frame, frame.area(), field, view))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_heights() {
        assert_eq!(field_height(&FieldConfig::text("a", "A"), false), 3);
        assert_eq!(field_height(&FieldConfig::text("a", "A"), true), 4);
        assert_eq!(field_height(&FieldConfig::textarea("a", "A"), false), 6);
    }

    #[test]
    fn test_text_with_error() {
        let field = FieldConfig::text("name", "Name").required();
        let screen = render(
            &field,
            FieldView {
                error: Some("Name is required"),
                ..Default::default()
            },
        );
        assert!(screen.contains("Name *"));
        assert!(screen.contains("(empty)"));
        assert!(screen.contains("Name is required"));
    }

    #[test]
    fn test_placeholder_shown_when_empty() {
        let field = FieldConfig::text("phone", "Phone").with_placeholder("10 digits");
        let screen = render(&field, FieldView::default());
        assert!(screen.contains("10 digits"));
    }

    #[test]
    fn test_select_shows_option_label() {
        let field = FieldConfig::select(
            "priority",
            "Priority",
            vec![SelectOption::new("p1", "Urgent")],
        );
        let value = FieldValue::text("p1");
        let screen = render(
            &field,
            FieldView {
                value: Some(&value),
                is_active: true,
                ..Default::default()
            },
        );
        assert!(screen.contains("Urgent"));
        assert!(screen.contains("◀"));
    }

    #[test]
    fn test_multi_select_marks_chosen() {
        let field = FieldConfig::multi_select("tags", "Tags", vec!["red", "blue"]);
        let value = FieldValue::list(["blue"]);
        let screen = render(
            &field,
            FieldView {
                value: Some(&value),
                ..Default::default()
            },
        );
        assert!(screen.contains("[ ] red"));
        assert!(screen.contains("[x] blue"));
    }

    #[test]
    fn test_checkbox_and_images() {
        let checkbox = FieldConfig::checkbox("agree", "Agree");
        let on = FieldValue::Bool(true);
        let screen = render(
            &checkbox,
            FieldView {
                value: Some(&on),
                ..Default::default()
            },
        );
        assert!(screen.contains("[x]"));

        let images = FieldConfig::image_set("photos", "Photos");
        let screen = render(
            &images,
            FieldView {
                is_active: true,
                pending_input: "new.png",
                ..Default::default()
            },
        );
        assert!(screen.contains("(no images)"));
        assert!(screen.contains("new.png"));
    }
}
