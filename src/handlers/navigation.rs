use crate::app::App;
use crate::global_prefs::{console_prefs_mut, save_console_prefs};
use crate::lifecycle::{Notice, NoticeLevel};
use crate::state::AppMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

pub const PREFERENCE_COUNT: usize = 4;

/// Handle global shortcuts that work across all modes
pub fn handle_global_shortcuts(key: KeyEvent, app: &mut App) -> bool {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.ui.show_quit_confirm = true;
            app.ui.quit_confirm_selected = 1; // Default to "No"
            true
        }
        KeyCode::F(2) => {
            app.ui.console_focused = false;
            app.ui.set_mode(AppMode::Preferences);
            true
        }
        KeyCode::F(4) => {
            app.ui.console_focused = !app.ui.console_focused;
            true
        }
        KeyCode::PageUp => {
            let page = app.config.scroll_lines_per_page as isize;
            app.ui.scroll_console(page, app.console.len());
            true
        }
        KeyCode::PageDown => {
            let page = app.config.scroll_lines_per_page as isize;
            app.ui.scroll_console(-page, app.console.len());
            true
        }
        _ => false,
    }
}

pub fn handle_catalog_input(key: KeyEvent, app: &mut App) {
    let len = app.pages.len();
    match key.code {
        KeyCode::Down => app.ui.select_next(len),
        KeyCode::Up => app.ui.select_prev(len),
        KeyCode::Enter | KeyCode::Right => app.open_selected(),
        KeyCode::Esc => {
            app.ui.show_quit_confirm = true;
            app.ui.quit_confirm_selected = 1;
        }
        _ => {}
    }
}

pub fn handle_console_input(key: KeyEvent, app: &mut App) {
    let total = app.console.len();
    match key.code {
        KeyCode::Up => app.ui.scroll_console(1, total),
        KeyCode::Down => app.ui.scroll_console(-1, total),
        KeyCode::End => app.ui.console_scroll = 0,
        KeyCode::Char('c') => {
            app.console.clear();
            app.ui.console_scroll = 0;
        }
        KeyCode::Esc => app.ui.console_focused = false,
        _ => {}
    }
}

pub fn handle_preferences_input(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Down => {
            app.ui.preferences_selected = (app.ui.preferences_selected + 1) % PREFERENCE_COUNT;
        }
        KeyCode::Up => {
            app.ui.preferences_selected = if app.ui.preferences_selected == 0 {
                PREFERENCE_COUNT - 1
            } else {
                app.ui.preferences_selected - 1
            };
        }
        KeyCode::Char(' ') | KeyCode::Enter => {
            let capacity = {
                let mut prefs = console_prefs_mut();
                match app.ui.preferences_selected {
                    0 => prefs.show_call_preview = !prefs.show_call_preview,
                    1 => prefs.banner_glitch_enabled = !prefs.banner_glitch_enabled,
                    2 => prefs.cycle_notification_ms(),
                    3 => prefs.cycle_console_capacity(),
                    _ => {}
                }
                prefs.console_capacity
            };
            app.console.set_capacity(capacity);
            if let Err(err) = save_console_prefs() {
                warn!(error = %err, "could not save preferences");
                app.set_notification(Notice::new(
                    NoticeLevel::Warning,
                    format!("Preferences not saved: {}", err),
                ));
            }
        }
        KeyCode::Esc => app.ui.set_mode(AppMode::Catalog),
        _ => {}
    }
}
