pub mod form;
pub mod navigation;

use crate::app::App;
use crate::state::AppMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Main input handler dispatcher
pub fn handle_key_event(key: KeyEvent, app: &mut App) {
    // Handle quit confirmation dialog first
    if app.ui.show_quit_confirm {
        handle_quit_confirm_input(key, app);
        return;
    }

    if navigation::handle_global_shortcuts(key, app) {
        return;
    }

    // Esc dismisses an open notification before anything else
    if key.code == KeyCode::Esc && app.notifications.current.is_some() {
        app.notifications.clear_notification();
        return;
    }

    if app.ui.console_focused {
        navigation::handle_console_input(key, app);
        return;
    }

    match app.ui.mode {
        AppMode::Catalog => navigation::handle_catalog_input(key, app),
        AppMode::Form => form::handle_form_input(key, app),
        AppMode::Preferences => navigation::handle_preferences_input(key, app),
    }
}

fn handle_quit_confirm_input(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
            app.ui.quit_confirm_selected = if app.ui.quit_confirm_selected == 0 { 1 } else { 0 };
        }
        KeyCode::Enter => {
            if app.ui.quit_confirm_selected == 0 {
                app.ui.quit();
            }
            app.ui.show_quit_confirm = false;
        }
        KeyCode::Esc => {
            app.ui.show_quit_confirm = false;
        }
        // Ctrl+C again closes the dialog
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.ui.show_quit_confirm = false;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormBinding;
    use crate::pages::catalog;
    use crate::sdk::{LoopbackOptions, SdkHandle};
    use crate::state::ConsoleLog;
    use crate::storage::ParamStore;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(KeyEvent::new(code, KeyModifiers::NONE), app);
    }

    fn app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(
            SdkHandle::new(),
            ParamStore::in_memory(),
            catalog(&LoopbackOptions::default()),
            ConsoleLog::new(10),
            tx,
        )
    }

    #[test]
    fn keys_drive_the_selected_form() {
        let mut app = app();
        let index = app
            .pages
            .iter()
            .position(|p| p.site.key() == "LoginService.login")
            .unwrap();
        for _ in 0..index {
            press(&mut app, KeyCode::Down);
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ui.mode, AppMode::Form);

        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char(' '));

        let values = app.current().unwrap().editor.values();
        assert_eq!(values.get("accountId"), Some(&json!("alicx")));
        assert_eq!(values.get("forceMode"), Some(&json!(true)));

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.ui.mode, AppMode::Catalog);
    }

    #[test]
    fn quit_needs_confirmation() {
        let mut app = app();
        handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), &mut app);
        assert!(app.ui.show_quit_confirm);
        press(&mut app, KeyCode::Enter);
        assert!(!app.ui.should_quit);

        handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), &mut app);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Enter);
        assert!(app.ui.should_quit);
    }
}
