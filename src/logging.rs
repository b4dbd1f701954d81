//! Logging, powered by tracing-subscriber.
//!
//! Two layers: an optional plain-text file layer (stdout belongs to the
//! terminal UI) and a layer that copies every event into the console pane.

use crate::call::panic_message;
use crate::state::{ConsoleError, ConsoleLog};
use std::any::Any;
use std::fmt::Write as _;
use std::panic::{self, Location};
use std::fs::{self, OpenOptions};
use std::path::Path;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Base level plus overrides that keep terminal and runtime chatter out.
fn build_env_filter(level: &str) -> Result<EnvFilter, ConsoleError> {
    let mut directives = vec![level.to_string()];
    let noisy: &[(&str, &str)] = &[("mio", "warn"), ("tokio", "warn"), ("runtime", "warn")];
    for (target, lvl) in noisy {
        directives.push(format!("{}={}", target, lvl));
    }
    let filter_str = directives.join(",");
    EnvFilter::try_new(&filter_str)
        .map_err(|e| ConsoleError::Logging(format!("invalid tracing filter '{}': {}", filter_str, e)))
}

pub fn init_logging(level: &str, file_path: Option<&Path>, console: ConsoleLog) -> Result<(), ConsoleError> {
    let file_layer = match file_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let log_file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(log_file)
                    .with_target(true)
                    .with_thread_names(true)
                    .with_filter(build_env_filter(level)?),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(ConsoleLayer::new(console).with_filter(build_env_filter(level)?))
        .try_init()
        .map_err(|e| ConsoleError::Logging(e.to_string()))?;

    tracing::trace!("logging initialized: level={}, file={:?}", level, file_path);
    Ok(())
}

/// Report panics through tracing; stderr belongs to the terminal UI.
/// Panics caught by [`crate::call::to`] also pass through here.
pub fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        tracing::error!(target: "sdk_console::panic", "{}", panic_line(info.payload(), info.location()));
    }));
}

fn panic_line(payload: &(dyn Any + Send), location: Option<&Location<'_>>) -> String {
    match location {
        Some(at) => format!("panicked at {}:{}: {}", at.file(), at.line(), panic_message(payload)),
        None => format!("panicked: {}", panic_message(payload)),
    }
}

/// Forwards events into a [`ConsoleLog`].
pub struct ConsoleLayer {
    console: ConsoleLog,
}

impl ConsoleLayer {
    pub fn new(console: ConsoleLog) -> Self {
        Self { console }
    }
}

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        let meta = event.metadata();
        self.console.push(*meta.level(), meta.target(), visitor.finish());
    }
}

/// Renders `message key=value ...`.
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn events_land_in_the_console_log() {
        let console = ConsoleLog::new(16);
        let subscriber = tracing_subscriber::registry().with(ConsoleLayer::new(console.clone()));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(key = "LoginService.login", "invoking");
            tracing::warn!(code = 401, reason = %"not logged in", "call failed");
        });

        let lines = console.tail(10, 0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].level, Level::INFO);
        assert_eq!(lines[0].text, "invoking key=LoginService.login");
        assert_eq!(lines[1].text, "call failed code=401 reason=not logged in");
    }

    #[test]
    fn panic_reports_carry_message_and_location() {
        let at = Location::caller();
        let payload: Box<dyn Any + Send> = Box::new(format!("boom {}", 7));
        assert_eq!(
            panic_line(payload.as_ref(), Some(at)),
            format!("panicked at {}:{}: boom 7", at.file(), at.line())
        );
        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_line(payload.as_ref(), None), "panicked: operation panicked");
    }

    #[test]
    fn rejects_a_bad_level() {
        assert!(build_env_filter("info").is_ok());
        assert!(matches!(build_env_filter("lots=of=noise"), Err(ConsoleError::Logging(_))));
    }
}
