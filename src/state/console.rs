use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::Level;

/// One line in the in-app console pane.
#[derive(Debug, Clone)]
pub struct ConsoleLine {
    pub at: DateTime<Local>,
    pub level: Level,
    pub target: String,
    pub text: String,
}

/// Bounded, shared log of diagnostics and SDK events. The tracing layer
/// writes into it from any thread; the UI reads snapshots.
#[derive(Clone)]
pub struct ConsoleLog {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    lines: VecDeque<ConsoleLine>,
    capacity: usize,
}

impl ConsoleLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                lines: VecDeque::with_capacity(capacity.min(4096)),
                capacity: capacity.max(1),
            })),
        }
    }

    pub fn push(&self, level: Level, target: impl Into<String>, text: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        while inner.lines.len() >= inner.capacity {
            inner.lines.pop_front();
        }
        inner.lines.push_back(ConsoleLine {
            at: Local::now(),
            level,
            target: target.into(),
            text: text.into(),
        });
    }

    pub fn set_capacity(&self, capacity: usize) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.capacity = capacity.max(1);
        while inner.lines.len() > inner.capacity {
            inner.lines.pop_front();
        }
    }

    /// The newest `count` lines that end `skip_newest` lines before the tail.
    pub fn tail(&self, count: usize, skip_newest: usize) -> Vec<ConsoleLine> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let end = inner.lines.len().saturating_sub(skip_newest);
        let start = end.saturating_sub(count);
        inner.lines.range(start..end).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_oldest_lines_past_capacity() {
        let log = ConsoleLog::new(3);
        for i in 0..5 {
            log.push(Level::INFO, "test", format!("line {}", i));
        }
        let texts: Vec<String> = log.tail(10, 0).into_iter().map(|l| l.text).collect();
        assert_eq!(texts, ["line 2", "line 3", "line 4"]);

        log.set_capacity(1);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn tail_skips_from_the_newest_end() {
        let log = ConsoleLog::new(10);
        for i in 0..6 {
            log.push(Level::DEBUG, "test", i.to_string());
        }
        let texts: Vec<String> = log.tail(2, 1).into_iter().map(|l| l.text).collect();
        assert_eq!(texts, ["3", "4"]);
        assert!(log.tail(2, 100).is_empty());
    }
}
