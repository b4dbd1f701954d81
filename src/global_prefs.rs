//! Console preferences, shared process-wide and saved next to the user's home.

use crate::state::ConsoleResult;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ConsolePrefs {
    pub show_call_preview: bool,
    pub banner_glitch_enabled: bool,
    pub notification_ms: u64,
    pub console_capacity: usize,
}

impl Default for ConsolePrefs {
    fn default() -> Self {
        Self {
            show_call_preview: true,
            banner_glitch_enabled: true,
            notification_ms: 3000,
            console_capacity: 500,
        }
    }
}

pub const NOTIFICATION_STEPS_MS: &[u64] = &[1500, 3000, 5000, 10000];
pub const CONSOLE_CAPACITY_STEPS: &[usize] = &[100, 500, 2000];

impl ConsolePrefs {
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "ignoring malformed preferences");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> ConsoleResult<()> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn cycle_notification_ms(&mut self) {
        self.notification_ms = next_step(NOTIFICATION_STEPS_MS, self.notification_ms);
    }

    pub fn cycle_console_capacity(&mut self) {
        self.console_capacity = next_step(CONSOLE_CAPACITY_STEPS, self.console_capacity);
    }
}

fn next_step<T: Copy + PartialEq>(steps: &[T], current: T) -> T {
    let next = steps
        .iter()
        .position(|s| *s == current)
        .map(|i| (i + 1) % steps.len())
        .unwrap_or(0);
    steps[next]
}

struct PrefsCell {
    path: PathBuf,
    prefs: RwLock<ConsolePrefs>,
}

static CONSOLE_PREFS: OnceCell<PrefsCell> = OnceCell::new();

/// Load preferences from `path`. Later calls keep the first path.
pub fn init_console_prefs(path: PathBuf) {
    let prefs = ConsolePrefs::load(&path);
    CONSOLE_PREFS
        .set(PrefsCell {
            path,
            prefs: RwLock::new(prefs),
        })
        .ok();
}

fn cell() -> &'static PrefsCell {
    CONSOLE_PREFS.get_or_init(|| {
        let path = crate::config::home_path(".sdk_console_prefs.json");
        PrefsCell {
            prefs: RwLock::new(ConsolePrefs::load(&path)),
            path,
        }
    })
}

pub fn console_prefs() -> RwLockReadGuard<'static, ConsolePrefs> {
    cell().prefs.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn console_prefs_mut() -> RwLockWriteGuard<'static, ConsolePrefs> {
    cell().prefs.write().unwrap_or_else(PoisonError::into_inner)
}

pub fn save_console_prefs() -> ConsoleResult<()> {
    let cell = cell();
    let prefs = cell.prefs.read().unwrap_or_else(PoisonError::into_inner).clone();
    prefs.save(&cell.path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let mut prefs = ConsolePrefs::default();
        prefs.show_call_preview = false;
        prefs.cycle_notification_ms();
        prefs.save(&path).unwrap();
        assert_eq!(ConsolePrefs::load(&path), prefs);
        assert_eq!(prefs.notification_ms, 5000);
    }

    #[test]
    fn partial_and_broken_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{"notification_ms": 1500}"#).unwrap();
        let prefs = ConsolePrefs::load(&path);
        assert_eq!(prefs.notification_ms, 1500);
        assert!(prefs.show_call_preview);

        fs::write(&path, "{").unwrap();
        assert_eq!(ConsolePrefs::load(&path), ConsolePrefs::default());
    }

    #[test]
    fn unknown_step_restarts_the_cycle() {
        let mut prefs = ConsolePrefs {
            console_capacity: 7,
            ..ConsolePrefs::default()
        };
        prefs.cycle_console_capacity();
        assert_eq!(prefs.console_capacity, 100);
    }
}
