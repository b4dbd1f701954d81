//! Popups: notifications and the quit confirmation.

use crate::app::App;
use crate::lifecycle::{Notice, NoticeLevel};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

pub fn draw_centered_rect(r: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Errors get a centred popup that stays until dismissed; everything else
/// is a small box in the top-right corner.
pub fn draw_notification_popup(f: &mut Frame, notice: &Notice) {
    let (title, color) = match notice.level {
        NoticeLevel::Info => ("Info", Color::Cyan),
        NoticeLevel::Success => ("Success", Color::Green),
        NoticeLevel::Warning => ("Warning", Color::Yellow),
        NoticeLevel::Error => ("Error", Color::Red),
    };

    if notice.level == NoticeLevel::Error {
        let area = draw_centered_rect(f.area(), 60, 25);
        let block = Block::default()
            .title(Span::styled(title, Style::default().fg(color).add_modifier(Modifier::BOLD)))
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Style::default().fg(color));
        let mut lines: Vec<Line> = notice.text.lines().map(Line::from).collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("[Esc] dismiss", Style::default().fg(Color::DarkGray))));
        let p = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(block)
            .alignment(Alignment::Center);
        f.render_widget(Clear, area);
        f.render_widget(p, area);
        return;
    }

    let size = f.area();
    let width = (notice.text.chars().count() as u16 + 4).clamp(30, (size.width / 2).max(30)).min(size.width);
    let height = 3u16.min(size.height);
    let area = Rect {
        x: size.x + size.width.saturating_sub(width + 2),
        y: size.y + 1.min(size.height.saturating_sub(height)),
        width,
        height,
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(Style::default().fg(color));
    let p = Paragraph::new(notice.text.as_str()).block(block).alignment(Alignment::Left);
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}

pub fn draw_quit_confirm_popup(f: &mut Frame, app: &App) {
    // Grow the popup until the message and buttons fit
    let mut percent_y = 18u16;
    let percent_x = 40u16;
    let content_lines = 5;
    let mut area = draw_centered_rect(f.area(), percent_x, percent_y);
    let mut popup_height = area.height.saturating_sub(2);
    while popup_height < content_lines && percent_y < 60 {
        percent_y += 5;
        area = draw_centered_rect(f.area(), percent_x, percent_y);
        popup_height = area.height.saturating_sub(2);
    }
    let block = Block::default()
        .title("Are you sure?")
        .borders(Borders::ALL)
        .border_type(BorderType::Double);
    let extra = popup_height.saturating_sub(content_lines);
    let pad_top = extra / 2;

    let mut lines = Vec::new();
    for _ in 0..pad_top + 1 {
        lines.push(Line::from(""));
    }
    let busy = app.pages.iter().filter(|p| p.site.is_busy()).count();
    let question = if busy > 0 {
        format!("Quit with {} call(s) still running?", busy)
    } else {
        "Do you really want to quit?".to_string()
    };
    lines.push(Line::from(Span::styled(question, Style::default().add_modifier(Modifier::BOLD))));
    lines.push(Line::from(""));
    let yes_style = if app.ui.quit_confirm_selected == 0 {
        Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green)
    };
    let no_style = if app.ui.quit_confirm_selected == 1 {
        Style::default().fg(Color::Black).bg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Red)
    };
    lines.push(Line::from(vec![
        Span::styled("[ Yes ]", yes_style),
        Span::raw("  "),
        Span::styled("[ No ]", no_style),
    ]));

    let para = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(Clear, area);
    f.render_widget(para, area);
}
