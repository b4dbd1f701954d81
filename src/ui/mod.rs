//! Main UI module. Re-exports submodules and provides the main entry point.

pub mod banner;
pub mod catalog;
pub mod console;
pub mod form;
pub mod popups;
pub mod preferences;

use crate::app::App;
use crate::state::AppMode;
use crate::ui::banner::{draw_full_banner, draw_min_banner};
use crate::ui::popups::{draw_notification_popup, draw_quit_confirm_popup};
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

pub fn ui(f: &mut Frame, app: &mut App) {
    let size = f.area();
    let (banner_height, use_full_banner) = match app.ui.mode {
        AppMode::Catalog if size.height > 30 => (9, true),
        _ => (3, false),
    };
    let chunks = Layout::default()
        .constraints([
            Constraint::Length(banner_height), // Banner
            Constraint::Min(0),                // Main content
            Constraint::Percentage(30),        // Console
            Constraint::Length(3),             // Footer
        ])
        .split(size);

    if use_full_banner {
        draw_full_banner(f, app, chunks[0]);
    } else {
        draw_min_banner(f, app, chunks[0]);
    }

    let main_area = chunks[1];
    match app.ui.mode {
        AppMode::Preferences => preferences::draw_preferences(f, app, main_area),
        AppMode::Catalog | AppMode::Form => {
            if main_area.width >= app.config.min_two_column_width {
                let columns = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(32), Constraint::Percentage(68)])
                    .split(main_area);
                catalog::draw_catalog(f, app, columns[0]);
                form::draw_page(f, app, columns[1]);
            } else if app.ui.mode == AppMode::Form {
                form::draw_page(f, app, main_area);
            } else {
                catalog::draw_catalog(f, app, main_area);
            }
        }
    }

    console::draw_console(f, app, chunks[2]);
    draw_footer(f, app, chunks[3]);

    if let Some((notice, _)) = &app.notifications.current {
        draw_notification_popup(f, notice);
    }
    if app.ui.show_quit_confirm {
        draw_quit_confirm_popup(f, app);
    }
}

fn draw_footer(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let help_text = if app.ui.console_focused {
        "[↑↓] Scroll | [End] Newest | [c] Clear | [Esc]/[F4] Leave console"
    } else {
        match app.ui.mode {
            AppMode::Catalog => "[↑↓] Select | [Enter] Open | [F2] Prefs | [F4] Console\n[PgUp/PgDn] Scroll console | [Esc] Quit",
            AppMode::Form => "[Tab]/[Shift+Tab] Field | [←→] Choice | [Space] Toggle | [Enter] Call\n[Ctrl+R] Reset | [PgUp/PgDn] Console | [Esc] Back",
            AppMode::Preferences => "[↑↓] Select | [Enter]/[Space] Change | [Esc] Back",
        }
    };
    let status_text = if app.sdk.is_created() {
        "SDK instance: ready".to_string()
    } else {
        "SDK instance: none".to_string()
    };

    let footer_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    f.render_widget(
        Paragraph::new(help_text)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::TOP)),
        footer_chunks[0],
    );
    let status_color = if app.sdk.is_created() { Color::Green } else { Color::Yellow };
    f.render_widget(
        Paragraph::new(Span::styled(status_text, Style::default().fg(status_color)))
            .alignment(Alignment::Right)
            .block(Block::default().borders(Borders::TOP)),
        footer_chunks[1],
    );
}
