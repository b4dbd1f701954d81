use crate::app::App;
use crate::state::AppMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub fn handle_form_input(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Enter => {
            app.submit_current();
            return;
        }
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.reset_current();
            return;
        }
        KeyCode::Esc => {
            app.ui.set_mode(AppMode::Catalog);
            return;
        }
        _ => {}
    }

    let Some(page) = app.current_mut() else { return };
    let editor = &mut page.editor;
    match key.code {
        KeyCode::Tab | KeyCode::Down => editor.focus_next(),
        KeyCode::BackTab | KeyCode::Up => editor.focus_prev(),
        KeyCode::Right => editor.cycle(true),
        KeyCode::Left => editor.cycle(false),
        KeyCode::Backspace => editor.backspace(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => editor.insert_char(c),
        _ => {}
    }
}
