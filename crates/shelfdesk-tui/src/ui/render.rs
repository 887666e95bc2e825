use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};
use shelfdesk_core::models::format_price;
use shelfdesk_core::Pager;

use crate::app::{App, AppState, LoginFocus};

use super::{editor, styles};

pub fn render(frame: &mut Frame, app: &App) {
    let strip_height = if app.console.pager().total_pages() > 1 { 1 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),            // Title bar
            Constraint::Min(6),               // Product table
            Constraint::Length(strip_height), // Pagination strip
            Constraint::Length(2),            // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_product_table(frame, app, chunks[1]);
    if strip_height > 0 {
        render_pagination(frame, app.console.pager(), chunks[2]);
    }
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::Editing => {
            if let Some(ref ed) = app.editor {
                editor::render(frame, ed);
            }
        }
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  shelfdesk";
    let right = if app.console.is_authenticated() {
        let user = app.config.last_username.as_deref().unwrap_or("signed in");
        format!("{}  [?] Help", user)
    } else {
        "[?] Help".to_string()
    };

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + right.chars().count() + 4),
        )),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_product_table(frame: &mut Frame, app: &App, area: Rect) {
    let pager = app.console.pager();
    let focused = matches!(app.state, AppState::Normal);

    let header = Row::new([
        Cell::from("Category"),
        Cell::from("Title"),
        Cell::from(format!("{:>12}", "Origin price")),
        Cell::from(format!("{:>10}", "Price")),
        Cell::from("Status"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = pager
        .products()
        .iter()
        .map(|product| {
            Row::new(vec![
                Cell::from(product.category.clone()),
                Cell::from(product.title.clone()),
                Cell::from(format!("{:>12}", format_price(product.origin_price))),
                Cell::from(format!("{:>10}", format_price(product.price))),
                Cell::from(Span::styled(
                    product.enabled_display(),
                    styles::enabled_style(product.is_enabled),
                )),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Percentage(20),
        Constraint::Fill(1),
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Length(9),
    ];

    let category = &pager.descriptor().category;
    let title = if category.is_empty() {
        format!(" Products - page {} of {} ", pager.current_page(), pager.total_pages())
    } else {
        format!(
            " Products [{}] - page {} of {} ",
            category,
            pager.current_page(),
            pager.total_pages()
        )
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !pager.products().is_empty() {
        state.select(Some(app.selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

/// `«  1  2  3  4  5  »` for the current page group.
fn pagination_line(pager: &Pager) -> Line<'static> {
    let descriptor = pager.descriptor();
    let mut spans = vec![Span::styled("«", styles::arrow_style(descriptor.has_previous))];

    for page in pager.visible_pages() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            page.to_string(),
            styles::page_style(page == pager.current_page()),
        ));
    }

    spans.push(Span::raw("  "));
    spans.push(Span::styled("»", styles::arrow_style(descriptor.has_next)));
    Line::from(spans).centered()
}

fn render_pagination(frame: &mut Frame, pager: &Pager, area: Rect) {
    frame.render_widget(Paragraph::new(pagination_line(pager)), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[n]ew [e]dit [d]elete [←/→] page [l]ogout [q]uit";

    let left_text = if app.console.is_busy() {
        " Loading... ".to_string()
    } else if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else {
        let count = app.console.pager().products().len();
        format!(" {} products on this page ", count)
    };

    let right_text = format!(" {} ", shortcuts);
    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());

    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 24, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  shelfdesk", styles::title_style())),
        Line::from(Span::styled(format!("  version {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Products", styles::highlight_style())),
        help_line("↑/↓", "Select product"),
        help_line("←/→", "Previous/next page"),
        help_line("1-5", "Jump to a page in the strip"),
        help_line("r", "Reload current page"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("n", "New product"),
        help_line("e/Enter", "Edit selected product"),
        help_line("d", "Delete selected product"),
        help_line("l", "Log out"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled(" Editor", styles::highlight_style())),
        help_line("Tab/↑/↓", "Move between fields"),
        help_line("Space", "Toggle enabled"),
        help_line("Ctrl+S", "Save"),
        help_line("Esc", "Cancel"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 11 } else { 9 };
    let area = centered_rect_fixed(50, height, frame.area());
    frame.render_widget(Clear, area);

    let form = &app.console.login;
    let mut lines = vec![
        Line::from(Span::styled("  Sign in to shelfdesk", styles::title_style())),
        Line::from(""),
    ];

    // Email field
    let username_focused = app.login_focus == LoginFocus::Username;
    let username_style = if username_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if username_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled("Email:    [", styles::muted_style()),
        Span::styled(format!("{:<24}{}", form.username, cursor), username_style),
        Span::styled("]", styles::muted_style()),
    ]));

    // Password field
    let password_focused = app.login_focus == LoginFocus::Password;
    let password_style = if password_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let masked = "*".repeat(form.password.chars().count().min(24));
    let cursor = if password_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled("Password: [", styles::muted_style()),
        Span::styled(format!("{:<24}{}", masked, cursor), password_style),
        Span::styled("]", styles::muted_style()),
    ]));

    // Submit button
    lines.push(Line::from(""));
    let button = if app.login_focus == LoginFocus::Button {
        Span::styled(" ▶ Sign in ◀ ", styles::selected_style())
    } else {
        Span::styled("   Sign in   ", styles::list_item_style())
    };
    lines.push(Line::from(vec![Span::raw("              ["), button, Span::raw("]")]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
pub(crate) fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn confirm_lines(question: String, action: &'static str) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled(format!("   {}", question), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(format!(" to {}, ", action), styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ]
}

fn render_confirm(frame: &mut Frame, lines: Vec<Line<'static>>) {
    let area = centered_rect_fixed(50, 7, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    render_confirm(frame, confirm_lines("Are you sure you want to quit?".to_string(), "quit"));
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let title = app
        .pending_delete
        .as_ref()
        .map(|(_, title)| title.as_str())
        .unwrap_or_default();
    render_confirm(frame, confirm_lines(format!("Delete \"{}\"?", title), "delete"));
}
