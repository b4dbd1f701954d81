use crate::form::{FieldError, FormBinding, FormEditor};
use crate::global_prefs::console_prefs;
use crate::lifecycle::{CallCompletion, CallSite, CallSpec, Notice, NoticeLevel, SubmitError};
use crate::sdk::{SdkEvent, SdkHandle};
use crate::state::{AppConfig, AppMode, ConsoleLog, NotificationState, UiState};
use crate::storage::ParamStore;
use crossterm::event::Event as CEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, Level};

/// Application events
pub enum AppEvent {
    Terminal(CEvent),
    Sdk(SdkEvent),
    CallFinished(CallCompletion),
    Tick,
}

/// One catalog entry: its lifecycle plus the form editing it.
pub struct Page {
    pub site: CallSite,
    pub editor: FormEditor,
}

pub struct App {
    pub sdk: SdkHandle,
    pub store: ParamStore,
    pub pages: Vec<Page>,
    pub ui: UiState,
    pub notifications: NotificationState,
    pub console: ConsoleLog,
    pub config: AppConfig,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        sdk: SdkHandle,
        store: ParamStore,
        specs: Vec<Arc<CallSpec>>,
        console: ConsoleLog,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let pages = specs
            .into_iter()
            .map(|spec| {
                let site = CallSite::new(spec.clone(), sdk.clone(), store.clone());
                let mut editor = FormEditor::new(spec.fields.clone());
                editor.set_values(&site.initialize());
                Page { site, editor }
            })
            .collect();
        Self {
            sdk,
            store,
            pages,
            ui: UiState::default(),
            notifications: NotificationState::default(),
            console,
            config: AppConfig::default(),
            events,
        }
    }

    pub fn current(&self) -> Option<&Page> {
        self.pages.get(self.ui.selected())
    }

    pub fn current_mut(&mut self) -> Option<&mut Page> {
        let index = self.ui.selected();
        self.pages.get_mut(index)
    }

    pub fn open_selected(&mut self) {
        if let Some(page) = self.current_mut() {
            page.editor.clear_errors();
            self.ui.set_mode(AppMode::Form);
        }
    }

    pub fn set_notification(&mut self, notice: Notice) {
        let ms = match notice.level {
            NoticeLevel::Error => None,
            _ => Some(console_prefs().notification_ms),
        };
        self.notifications
            .set_notification(notice, ms, self.ui.tick_count, self.config.tick_ms);
    }

    /// Validate the current form and, when it passes, run the call in the
    /// background. The result comes back as [`AppEvent::CallFinished`].
    pub fn submit_current(&mut self) {
        let events = self.events.clone();
        let Some(page) = self.current_mut() else { return };
        let values = page.editor.values();
        let notice = match page.site.begin_submit(&values) {
            Ok(pending) => {
                page.editor.clear_errors();
                let key = pending.key().to_string();
                tokio::spawn(async move {
                    let completion = pending.run().await;
                    let _ = events.send(AppEvent::CallFinished(completion));
                });
                Notice::new(NoticeLevel::Info, format!("calling {}...", key))
            }
            Err(SubmitError::Invalid(errors)) => {
                page.editor.set_errors(&errors);
                Notice::new(NoticeLevel::Warning, errors.to_string())
            }
            Err(busy @ SubmitError::Busy { .. }) => Notice::new(NoticeLevel::Warning, busy.to_string()),
        };
        self.set_notification(notice);
    }

    pub fn finish_call(&mut self, completion: CallCompletion) {
        let Some(page) = self.pages.iter_mut().find(|p| p.site.key() == completion.key) else {
            debug!(key = %completion.key, "completion for an unknown call site");
            return;
        };
        let submitted = page.site.complete(completion);
        self.set_notification(submitted.notice);
    }

    pub fn reset_current(&mut self) {
        let Some(page) = self.current_mut() else { return };
        let notice = match page.site.reset() {
            Ok((defaults, cleared)) => {
                page.editor.set_values(&defaults);
                match cleared {
                    Ok(()) => Notice::new(NoticeLevel::Info, format!("{} reset to defaults", page.site.key())),
                    Err(err) => Notice::new(
                        NoticeLevel::Warning,
                        format!("{} reset, but stored parameters remain: {}", page.site.key(), err),
                    ),
                }
            }
            Err(busy) => Notice::new(NoticeLevel::Warning, busy.to_string()),
        };
        self.set_notification(notice);
    }

    /// What submitting the current form would call.
    pub fn preview_current(&self) -> Option<Result<String, FieldError>> {
        self.current()
            .map(|page| page.site.describe_call(&page.editor.values()))
    }

    pub fn handle_sdk_event(&mut self, event: SdkEvent) {
        info!(target: "sdk_console::events", name = %event.name, payload = %event.payload, "event");
        if event.name == "instance.created" || event.name == "instance.destroyed" {
            self.console.push(Level::INFO, "sdk_console::events", event.name);
        }
    }

    pub fn on_tick(&mut self) {
        self.ui.tick();
        if self.notifications.should_close_notification(self.ui.tick_count) {
            self.notifications.clear_notification();
        }
    }
}
