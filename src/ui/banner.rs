//! Banner drawing utilities for the UI.

use crate::app::App;
use crate::banner::get_styled_banner_lines;
use crate::global_prefs::console_prefs;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub fn draw_full_banner(f: &mut Frame, app: &App, area: Rect) {
    let glitch = console_prefs().banner_glitch_enabled;
    let banner_lines = get_styled_banner_lines(area.width, app.ui.tick_count, glitch);
    let banner = Paragraph::new(banner_lines).block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(banner, area);
}

pub fn draw_min_banner(f: &mut Frame, app: &App, area: Rect) {
    let title = match app.current() {
        Some(page) if app.ui.mode != crate::state::AppMode::Preferences => page.site.key().to_string(),
        _ => "preferences".to_string(),
    };
    let line = Line::from(vec![
        Span::styled("SDK CONSOLE", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(" :: "),
        Span::styled(title, Style::default().fg(Color::Yellow)),
    ]);
    f.render_widget(
        Paragraph::new(line)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::BOTTOM)),
        area,
    );
}
