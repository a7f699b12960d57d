//! Section and item layout for the form body
//!
//! The body is a vertical list of rows (section headings, item headings,
//! fields and buttons), laid out top to bottom and scrolled so the focused
//! row stays in view.

use super::field_renderer::{draw_field, field_height, FieldView};
use crate::app::App;
use crate::schema::{FieldConfig, SectionLayout};
use crate::state::FocusTarget;
use crate::ui::components::{render_button, BUTTON_HEIGHT};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// One drawable row of the form body
#[derive(Debug)]
enum Row<'a> {
    Heading {
        title: String,
        error: Option<&'a str>,
    },
    ItemHeading(String),
    Field {
        config: &'a FieldConfig,
        target: FocusTarget,
    },
    Button {
        label: String,
        target: FocusTarget,
        enabled: bool,
    },
    Spacer,
}

impl Row<'_> {
    fn target(&self) -> Option<&FocusTarget> {
        match self {
            Row::Field { target, .. } | Row::Button { target, .. } => Some(target),
            _ => None,
        }
    }
}

fn build_rows(app: &App) -> Vec<Row<'_>> {
    let form = &app.form;
    let mut rows = Vec::new();

    for section in form.schema().sections() {
        rows.push(Row::Heading {
            title: section.display_title().to_string(),
            error: form.section_error(&section.id),
        });

        match &section.layout {
            SectionLayout::Flat(fields) => {
                rows.extend(fields.iter().map(|config| Row::Field {
                    config,
                    target: FocusTarget::Field {
                        section: section.id.clone(),
                        field: config.id.clone(),
                    },
                }));
            }
            SectionLayout::Repeatable(descriptor) => {
                let count = form.values().items(&section.id).len();
                let can_remove = form.can_remove_item(&section.id);
                for index in 0..count {
                    rows.push(Row::ItemHeading(format!("#{}", index + 1)));
                    rows.extend(descriptor.fields.iter().map(|config| Row::Field {
                        config,
                        target: FocusTarget::ItemField {
                            section: section.id.clone(),
                            index,
                            field: config.id.clone(),
                        },
                    }));
                    rows.push(Row::Button {
                        label: format!("Remove #{}", index + 1),
                        target: FocusTarget::RemoveItem {
                            section: section.id.clone(),
                            index,
                        },
                        enabled: can_remove,
                    });
                }
                let bounds = match descriptor.max_items {
                    Some(max) => format!("{count}/{max}"),
                    None => count.to_string(),
                };
                rows.push(Row::Button {
                    label: format!("+ Add item ({bounds})"),
                    target: FocusTarget::AddItem {
                        section: section.id.clone(),
                    },
                    enabled: form.can_add_item(&section.id),
                });
            }
        }
        rows.push(Row::Spacer);
    }

    let label = if form.is_submitting() {
        "Submitting…"
    } else {
        "Submit (Ctrl+S)"
    };
    rows.push(Row::Button {
        label: label.to_string(),
        target: FocusTarget::Submit,
        enabled: !form.is_submitting(),
    });
    rows
}

fn row_height(app: &App, row: &Row) -> u16 {
    match row {
        Row::Heading { error, .. } => 1 + u16::from(error.is_some()),
        Row::ItemHeading(_) | Row::Spacer => 1,
        Row::Field { config, target } => field_height(config, field_error(app, target).is_some()),
        Row::Button { .. } => BUTTON_HEIGHT,
    }
}

fn field_error<'a>(app: &'a App, target: &FocusTarget) -> Option<&'a str> {
    match target {
        FocusTarget::Field { section, field } => app.form.field_error(section, field),
        FocusTarget::ItemField {
            section,
            index,
            field,
        } => app.form.item_field_error(section, *index, field),
        _ => None,
    }
}

/// First line to draw so that the focused row ends inside the viewport
///
/// Positions are `u32`: a long repeatable section can outgrow `u16`.
fn scroll_offset(heights: &[u16], focused: Option<usize>, viewport: u16) -> u32 {
    let Some(focused) = focused else {
        return 0;
    };
    let top: u32 = heights[..focused].iter().map(|h| u32::from(*h)).sum();
    let bottom = top + u32::from(heights[focused]);
    bottom.saturating_sub(u32::from(viewport)).min(top)
}

/// Draw every section of the form into `area`
pub fn draw_sections(frame: &mut Frame, area: Rect, app: &App) {
    let rows = build_rows(app);
    let focused = app.focused();
    let heights: Vec<u16> = rows.iter().map(|row| row_height(app, row)).collect();
    let focused_row = rows
        .iter()
        .position(|row| row.target().is_some() && row.target() == focused.as_ref());
    let offset = scroll_offset(&heights, focused_row, area.height);

    let mut y: u32 = 0;
    for (row, height) in rows.iter().zip(heights) {
        let top = y;
        y += u32::from(height);
        if top < offset {
            continue;
        }
        let Some(screen_top) = u16::try_from(top - offset)
            .ok()
            .filter(|screen_top| *screen_top < area.height)
        else {
            break;
        };
        let row_area = Rect {
            x: area.x,
            y: area.y + screen_top,
            width: area.width,
            height: height.min(area.height - screen_top),
        };
        let is_active = row.target().is_some() && row.target() == focused.as_ref();
        draw_row(frame, row_area, app, row, is_active);
    }
}

fn draw_row(frame: &mut Frame, area: Rect, app: &App, row: &Row, is_active: bool) {
    match row {
        Row::Heading { title, error } => {
            let mut lines = vec![Line::from(Span::styled(
                title.clone(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))];
            if let Some(message) = error {
                lines.push(Line::from(Span::styled(
                    format!("✗ {message}"),
                    Style::default().fg(Color::Red),
                )));
            }
            frame.render_widget(Paragraph::new(lines), area);
        }
        Row::ItemHeading(title) => {
            frame.render_widget(
                Paragraph::new(Span::styled(title.clone(), Style::default().fg(Color::Blue))),
                area,
            );
        }
        Row::Field { config, target } => {
            let value = match target {
                FocusTarget::Field { section, field } => app.form.values().field(section, field),
                FocusTarget::ItemField {
                    section,
                    index,
                    field,
                } => app.form.values().item_field(section, *index, field),
                _ => None,
            };
            let view = FieldView {
                value,
                error: field_error(app, target),
                is_active,
                option_cursor: app.editor.option_cursor,
                pending_input: if is_active {
                    &app.editor.pending_input
                } else {
                    ""
                },
            };
            draw_field(frame, area, config, view);
        }
        Row::Button { label, enabled, .. } => {
            let width = (label.chars().count() as u16 + 4).min(area.width);
            let button_area = Rect { width, ..area };
            render_button(frame, button_area, label, is_active, *enabled);
        }
        Row::Spacer => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_scroll_when_focus_fits() {
        assert_eq!(scroll_offset(&[3, 3, 3], Some(1), 10), 0);
    }

    #[test]
    fn test_scrolls_focused_row_into_view() {
        assert_eq!(scroll_offset(&[3, 3, 3, 3], Some(3), 7), 5);
    }

    #[test]
    fn test_tall_row_aligns_to_its_top() {
        assert_eq!(scroll_offset(&[3, 20], Some(1), 5), 3);
    }

    #[test]
    fn test_offset_beyond_u16_range() {
        let heights = vec![3u16; 30_000];
        assert_eq!(scroll_offset(&heights, Some(29_999), 30), 89_970);
    }

    #[test]
    fn test_no_focus_no_scroll() {
        assert_eq!(scroll_offset(&[3, 3], None, 1), 0);
    }
}
