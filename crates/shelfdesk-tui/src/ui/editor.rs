//! Product editor overlay.

use ratatui::{
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use shelfdesk_core::DraftField;

use crate::app::Editor;

use super::render::centered_rect_fixed;
use super::styles;

/// Width of the value column
const VALUE_WIDTH: usize = 44;

pub fn render(frame: &mut Frame, editor: &Editor) {
    let height = DraftField::ALL.len() as u16 + if editor.error.is_some() { 7 } else { 5 };
    let area = centered_rect_fixed(64, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = Vec::with_capacity(DraftField::ALL.len() + 4);
    for field in DraftField::ALL {
        lines.push(field_line(editor, field));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  [Ctrl+S]", styles::help_key_style()),
        Span::styled(" save  ", styles::muted_style()),
        Span::styled("[Tab]", styles::help_key_style()),
        Span::styled(" next field  ", styles::muted_style()),
        Span::styled("[Esc]", styles::help_key_style()),
        Span::styled(" cancel", styles::muted_style()),
    ]));

    if let Some(ref error) = editor.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    let block = Block::default()
        .title(editor.title())
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn field_line(editor: &Editor, field: DraftField) -> Line<'static> {
    let focused = editor.focus == field;
    let value_style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };

    let value = match editor.draft.text(field) {
        Some(text) => {
            let cursor = if focused { "▌" } else { "" };
            format!("{}{}", tail(text, VALUE_WIDTH - 1), cursor)
        }
        None => {
            let mark = if editor.draft.is_enabled { "[x]" } else { "[ ]" };
            format!("{} {}", mark, if editor.draft.is_enabled { "enabled" } else { "disabled" })
        }
    };

    Line::from(vec![
        Span::styled(format!("  {:>13}: ", field.label()), styles::muted_style()),
        Span::styled(format!("{:<width$}", value, width = VALUE_WIDTH), value_style),
    ])
}

/// Last `max` characters of `text`, so the cursor end stays visible.
fn tail(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        text.to_string()
    } else {
        let skip = count - max + 1;
        format!("…{}", text.chars().skip(skip).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_tail() {
        assert_eq!(tail("short", 10), "short");
        assert_eq!(tail("abcdefghij", 5), "…ghij");
        assert_eq!(tail("蘋果蘋果蘋果", 4), "…果蘋果");
    }

    #[test]
    fn test_field_line_shows_cursor_on_focus() {
        let mut editor = Editor::create();
        editor.focus = DraftField::Title;
        editor.draft.title = "Kiwi".to_string();

        let focused = text(&field_line(&editor, DraftField::Title));
        assert!(focused.contains("Title: Kiwi▌"));

        let other = text(&field_line(&editor, DraftField::Unit));
        assert!(!other.contains('▌'));
    }

    #[test]
    fn test_field_line_enabled_checkbox() {
        let mut editor = Editor::create();
        assert!(text(&field_line(&editor, DraftField::Enabled)).contains("[ ] disabled"));
        editor.draft.toggle_enabled();
        assert!(text(&field_line(&editor, DraftField::Enabled)).contains("[x] enabled"));
    }
}
