use crate::app::App;
use crate::global_prefs::console_prefs;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use ratatui::Frame;

pub fn draw_preferences(f: &mut Frame, app: &App, area: Rect) {
    let prefs = console_prefs().clone();
    let on_off = |on: bool| (if on { "ON" } else { "OFF" }).to_string();
    let rows = [
        ("Show call preview", on_off(prefs.show_call_preview)),
        ("Banner glitch effect", on_off(prefs.banner_glitch_enabled)),
        ("Notification duration", format!("{} ms", prefs.notification_ms)),
        ("Console capacity", format!("{} lines", prefs.console_capacity)),
    ];

    let mut lines = vec![Line::from("")];
    for (i, (label, value)) in rows.iter().enumerate() {
        let style = if i == app.ui.preferences_selected {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<24}", label), style),
            Span::styled(format!(" {}", value), Style::default().fg(Color::Yellow)),
        ]));
    }

    let block = Block::default()
        .title("Preferences")
        .borders(Borders::ALL)
        .border_type(BorderType::Double);
    f.render_widget(Paragraph::new(lines).block(block), area);
}
