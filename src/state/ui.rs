use ratatui::widgets::ListState;

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum AppMode {
    Catalog,
    Form,
    Preferences,
}

/// State management for UI-specific state
pub struct UiState {
    pub mode: AppMode,
    pub should_quit: bool,
    pub tick_count: u64,

    pub catalog_state: ListState,

    // Preferences navigation
    pub preferences_selected: usize,

    // Console pane
    pub console_focused: bool,
    pub console_scroll: usize,

    // Quit confirmation
    pub show_quit_confirm: bool,
    pub quit_confirm_selected: usize,
}

impl Default for UiState {
    fn default() -> Self {
        let mut catalog_state = ListState::default();
        catalog_state.select(Some(0));
        Self {
            mode: AppMode::Catalog,
            should_quit: false,
            tick_count: 0,
            catalog_state,
            preferences_selected: 0,
            console_focused: false,
            console_scroll: 0,
            show_quit_confirm: false,
            quit_confirm_selected: 1,
        }
    }
}

impl UiState {
    pub fn set_mode(&mut self, mode: AppMode) {
        self.mode = mode;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn tick(&mut self) {
        self.tick_count += 1;
    }

    pub fn selected(&self) -> usize {
        self.catalog_state.selected().unwrap_or(0)
    }

    pub fn select_next(&mut self, len: usize) {
        if len > 0 {
            self.catalog_state.select(Some((self.selected() + 1) % len));
        }
    }

    pub fn select_prev(&mut self, len: usize) {
        if len > 0 {
            self.catalog_state.select(Some((self.selected() + len - 1) % len));
        }
    }

    /// Scroll is counted in lines back from the newest entry.
    pub fn scroll_console(&mut self, lines: isize, total: usize) {
        let next = self.console_scroll as isize + lines;
        self.console_scroll = next.clamp(0, total.saturating_sub(1) as isize) as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_selection_wraps() {
        let mut ui = UiState::default();
        ui.select_prev(3);
        assert_eq!(ui.selected(), 2);
        ui.select_next(3);
        assert_eq!(ui.selected(), 0);
    }

    #[test]
    fn console_scroll_is_clamped() {
        let mut ui = UiState::default();
        ui.scroll_console(-5, 10);
        assert_eq!(ui.console_scroll, 0);
        ui.scroll_console(50, 10);
        assert_eq!(ui.console_scroll, 9);
    }
}
