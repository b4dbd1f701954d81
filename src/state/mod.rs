pub mod console;
pub mod notification;
pub mod ui;

pub use console::{ConsoleLine, ConsoleLog};
pub use notification::NotificationState;
pub use ui::{AppMode, UiState};

/// Configuration constants for the application
pub struct AppConfig {
    pub scroll_lines_per_page: usize,
    pub tick_ms: u64,
    pub min_two_column_width: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scroll_lines_per_page: 10,
            tick_ms: 50,
            min_two_column_width: 100,
        }
    }
}

/// Errors that end the console process.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("logging setup failed: {0}")]
    Logging(String),
    #[error("preferences error: {0}")]
    Prefs(#[from] serde_json::Error),
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;
