use crate::app::App;
use crate::state::AppMode;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, List, ListItem};
use ratatui::Frame;

pub fn draw_catalog(f: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = app
        .pages
        .iter()
        .map(|page| {
            let spec = page.site.spec();
            let mut spans = vec![
                Span::styled(format!("{}.", spec.interface), Style::default().fg(Color::DarkGray)),
                Span::raw(spec.method),
            ];
            if page.site.is_busy() {
                spans.push(Span::styled(" ⟳", Style::default().fg(Color::Yellow)));
            } else if page.site.view().error.is_some() {
                spans.push(Span::styled(" ✗", Style::default().fg(Color::Red)));
            } else if page.site.view().output.is_some() {
                spans.push(Span::styled(" ✓", Style::default().fg(Color::Green)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let focused = app.ui.mode == AppMode::Catalog && !app.ui.console_focused;
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(
            Block::default()
                .title("Calls")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(border_style),
        )
        .highlight_style(Style::default().bg(Color::Cyan).fg(Color::Black).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut app.ui.catalog_state);
}
