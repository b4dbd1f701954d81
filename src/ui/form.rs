use crate::app::{App, Page};
use crate::form::FieldKind;
use crate::global_prefs::console_prefs;
use crate::lifecycle::Phase;
use crate::state::AppMode;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use ratatui::Frame;

pub fn draw_page(f: &mut Frame, app: &App, area: Rect) {
    let Some(page) = app.current() else { return };
    let editing = app.ui.mode == AppMode::Form && !app.ui.console_focused;
    let show_preview = console_prefs().show_call_preview;

    let field_height = page.site.spec().fields.len() as u16 + 3;
    let mut constraints = vec![Constraint::Length(field_height.max(4))];
    if show_preview {
        constraints.push(Constraint::Percentage(35));
    }
    constraints.push(Constraint::Min(3));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    draw_fields(f, page, editing, chunks[0]);
    if show_preview {
        draw_preview(f, app, chunks[1]);
    }
    draw_result(f, page, chunks[chunks.len() - 1]);
}

fn draw_fields(f: &mut Frame, page: &Page, editing: bool, area: Rect) {
    let editor = &page.editor;
    let spec = page.site.spec();
    let mut lines = vec![Line::from(Span::styled(
        spec.summary,
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    ))];
    if editor.fields().is_empty() {
        lines.push(Line::from("(no parameters)"));
    }
    for (i, field) in editor.fields().iter().enumerate() {
        let focused = editing && i == editor.focus();
        let marker = if field.required { "*" } else { " " };
        let label_style = if focused {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };
        let value = match field.kind {
            FieldKind::Choice(_) => format!("‹ {} ›", editor.display(i)),
            FieldKind::Toggle => {
                if editor.buffer(i) == Some("true") { "[x]".to_string() } else { "[ ]".to_string() }
            }
            _ if focused => format!("{}_", editor.display(i)),
            _ => editor.display(i),
        };
        let mut spans = vec![
            Span::styled(format!("{}{:<22}", marker, field.label), label_style),
            Span::raw(" "),
            Span::raw(value),
        ];
        if let Some(err) = editor.error(field.name) {
            spans.push(Span::styled(format!("  {}", err), Style::default().fg(Color::Red)));
        } else if focused {
            if let Some(help) = field.help {
                spans.push(Span::styled(format!("  {}", help), Style::default().fg(Color::DarkGray)));
            }
        }
        lines.push(Line::from(spans));
    }

    let title = match page.site.phase() {
        Phase::Busy => format!("{} (running)", page.site.key()),
        _ => page.site.key().to_string(),
    };
    let border_style = if editing { Style::default().fg(Color::Cyan) } else { Style::default() };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border_style);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_preview(f: &mut Frame, app: &App, area: Rect) {
    let (text, style) = match app.preview_current() {
        Some(Ok(preview)) => (preview, Style::default().fg(Color::Green)),
        Some(Err(err)) => (err.to_string(), Style::default().fg(Color::Red)),
        None => (String::new(), Style::default()),
    };
    let block = Block::default().title("Call preview").borders(Borders::ALL);
    f.render_widget(
        Paragraph::new(text).style(style).wrap(Wrap { trim: false }).block(block),
        area,
    );
}

fn draw_result(f: &mut Frame, page: &Page, area: Rect) {
    let view = page.site.view();
    let lines: Vec<Line> = if page.site.is_busy() {
        vec![Line::from(Span::styled("waiting for the SDK...", Style::default().fg(Color::Yellow)))]
    } else if let Some(err) = &view.error {
        vec![Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red)))]
    } else if view.output.is_some() {
        view.lines.iter().map(|l| Line::from(l.clone())).collect()
    } else {
        vec![Line::from(Span::styled("no result yet", Style::default().fg(Color::DarkGray)))]
    };
    let title = match view.finished_at {
        Some(at) => format!("Result @ {}", at.format("%H:%M:%S")),
        None => "Result".to_string(),
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
}
