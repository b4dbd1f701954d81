use crate::app::App;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use tracing::Level;

pub fn draw_console(f: &mut Frame, app: &App, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = app
        .console
        .tail(visible, app.ui.console_scroll)
        .into_iter()
        .map(|line| {
            Line::from(vec![
                Span::styled(line.at.format("%H:%M:%S ").to_string(), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{:<5} ", line.level), level_style(line.level)),
                Span::styled(format!("{} ", short_target(&line.target)), Style::default().fg(Color::Blue)),
                Span::raw(line.text),
            ])
        })
        .collect();

    let title = if app.ui.console_scroll > 0 {
        format!("Console (-{})", app.ui.console_scroll)
    } else {
        "Console".to_string()
    };
    let border_style = if app.ui.console_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let block = Block::default().title(title).borders(Borders::ALL).border_style(border_style);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn level_style(level: Level) -> Style {
    match level {
        Level::ERROR => Style::default().fg(Color::Red),
        Level::WARN => Style::default().fg(Color::Yellow),
        Level::INFO => Style::default().fg(Color::Green),
        _ => Style::default().fg(Color::DarkGray),
    }
}

fn short_target(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}
