use crate::lifecycle::Notice;

/// State management for the notification popup
#[derive(Default)]
pub struct NotificationState {
    pub current: Option<(Notice, Option<u64>)>, // notice, close_tick
}

impl NotificationState {
    /// `ms` of `None` keeps the popup until dismissed.
    pub fn set_notification(&mut self, notice: Notice, ms: Option<u64>, tick_count: u64, tick_ms: u64) {
        let close_tick = ms.map(|duration| tick_count + duration / tick_ms.max(1));
        self.current = Some((notice, close_tick));
    }

    pub fn clear_notification(&mut self) {
        self.current = None;
    }

    pub fn should_close_notification(&self, tick_count: u64) -> bool {
        if let Some((_, Some(close_tick))) = &self.current {
            tick_count >= *close_tick
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::NoticeLevel;

    #[test]
    fn closes_after_duration_in_ticks() {
        let mut state = NotificationState::default();
        state.set_notification(Notice::new(NoticeLevel::Info, "hi"), Some(500), 10, 50);
        assert!(!state.should_close_notification(19));
        assert!(state.should_close_notification(20));

        state.set_notification(Notice::new(NoticeLevel::Error, "sticky"), None, 10, 50);
        assert!(!state.should_close_notification(u64::MAX));
    }
}
