//! Form-driven call lifecycle.
//!
//! A [`CallSpec`] declares one SDK call: which form fields it takes, how
//! those turn into call arguments, and how to invoke it. A [`CallSite`]
//! binds a spec to an SDK handle and a parameter store and runs the
//! validate, build, invoke, persist cycle through [`crate::call::to`].
//!
//! Submission is split in three so a UI can keep drawing while a call is in
//! flight: [`CallSite::begin_submit`] validates and marks the site busy,
//! [`PendingCall::run`] does the awaiting (it owns everything it needs, so it
//! can be spawned), and [`CallSite::complete`] applies the result.
//! [`CallSite::submit`] chains the three for callers that can just await.

use crate::call::{self, CallError, Outcome};
use crate::form::{self, FieldDef, FieldError, FormValues, ValidationErrors};
use crate::sdk::{SdkError, SdkHandle};
use crate::storage::{ParamStore, StoreError};
use chrono::{DateTime, Local};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub type BuildFn = Arc<dyn Fn(&FormValues) -> Result<Value, FieldError> + Send + Sync>;
pub type CallFn = Arc<dyn Fn(SdkHandle, Value) -> BoxFuture<'static, Result<Value, SdkError>> + Send + Sync>;
pub type ViewFn = Arc<dyn Fn(&Value) -> Vec<String> + Send + Sync>;

pub struct CallSpec {
    pub interface: &'static str,
    pub method: &'static str,
    pub summary: &'static str,
    pub fields: Vec<FieldDef>,
    pub defaults: FormValues,
    build: BuildFn,
    call: CallFn,
    view: Option<ViewFn>,
}

impl CallSpec {
    /// A spec that passes the form values through as the argument object
    /// and invokes `"<interface>.<method>"` on the SDK handle.
    pub fn new(interface: &'static str, method: &'static str) -> Self {
        let target = format!("{}.{}", interface, method);
        Self {
            interface,
            method,
            summary: "",
            fields: Vec::new(),
            defaults: FormValues::new(),
            build: Arc::new(|values: &FormValues| Ok::<_, FieldError>(Value::Object(values.clone()))),
            call: Arc::new(move |sdk: SdkHandle, args: Value| {
                let target = target.clone();
                async move { sdk.invoke(&target, args).await }.boxed()
            }),
            view: None,
        }
    }

    pub fn summary(mut self, summary: &'static str) -> Self {
        self.summary = summary;
        self
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Non-object values are ignored.
    pub fn defaults(mut self, defaults: Value) -> Self {
        if let Value::Object(values) = defaults {
            self.defaults = values;
        }
        self
    }

    pub fn build<F>(mut self, build: F) -> Self
    where
        F: Fn(&FormValues) -> Result<Value, FieldError> + Send + Sync + 'static,
    {
        self.build = Arc::new(build);
        self
    }

    pub fn call<F>(mut self, call: F) -> Self
    where
        F: Fn(SdkHandle, Value) -> BoxFuture<'static, Result<Value, SdkError>> + Send + Sync + 'static,
    {
        self.call = Arc::new(call);
        self
    }

    pub fn view<F>(mut self, view: F) -> Self
    where
        F: Fn(&Value) -> Vec<String> + Send + Sync + 'static,
    {
        self.view = Some(Arc::new(view));
        self
    }

    /// `"<Interface>.<method>"`, also the parameter store key.
    pub fn key(&self) -> String {
        format!("{}.{}", self.interface, self.method)
    }

    pub fn build_args(&self, values: &FormValues) -> Result<Value, FieldError> {
        (self.build)(values)
    }

    /// Lines for the result pane. Without a projection the output is shown
    /// as pretty JSON.
    pub fn project(&self, output: &Value) -> Vec<String> {
        match &self.view {
            Some(view) => view(output),
            None => pretty(output).lines().map(str::to_string).collect(),
        }
    }
}

impl fmt::Debug for CallSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallSpec")
            .field("key", &self.key())
            .field("fields", &self.fields.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Validating,
    Busy,
}

/// What the result pane shows for one call site.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub last_args: Option<Value>,
    pub output: Option<Value>,
    pub lines: Vec<String>,
    pub error: Option<String>,
    pub finished_at: Option<DateTime<Local>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmitError {
    #[error("{0}")]
    Invalid(ValidationErrors),
    #[error("{key} is already running")]
    Busy { key: String },
}

/// A call that passed validation and is ready to be awaited.
pub struct PendingCall {
    key: String,
    spec: Arc<CallSpec>,
    sdk: SdkHandle,
    values: FormValues,
    args: Value,
}

impl PendingCall {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn args(&self) -> &Value {
        &self.args
    }

    pub async fn run(self) -> CallCompletion {
        info!(target: "sdk_console::calls", key = %self.key, args = %self.args, "invoking");
        let op = self.spec.call.clone();
        let sdk = self.sdk.clone();
        let args = self.args.clone();
        let outcome = call::to(move || op(sdk, args)).await;
        match &outcome {
            Outcome::Success(value) => {
                info!(target: "sdk_console::calls", key = %self.key, output = %value, "call succeeded")
            }
            Outcome::Failure(err) => {
                warn!(target: "sdk_console::calls", key = %self.key, error = %err, kind = ?err.kind(), "call failed")
            }
        }
        CallCompletion {
            key: self.key,
            values: self.values,
            args: self.args,
            outcome,
        }
    }
}

/// A finished call, ready to be applied with [`CallSite::complete`].
#[derive(Debug, Clone)]
pub struct CallCompletion {
    pub key: String,
    pub values: FormValues,
    pub args: Value,
    pub outcome: Outcome<Value>,
}

/// Result of applying a completion.
#[derive(Debug, Clone)]
pub struct Submitted {
    pub notice: Notice,
    pub outcome: Outcome<Value>,
    pub persisted: bool,
}

pub struct CallSite {
    key: String,
    spec: Arc<CallSpec>,
    sdk: SdkHandle,
    store: ParamStore,
    phase: Phase,
    view: ViewState,
}

impl CallSite {
    pub fn new(spec: Arc<CallSpec>, sdk: SdkHandle, store: ParamStore) -> Self {
        Self {
            key: spec.key(),
            spec,
            sdk,
            store,
            phase: Phase::Idle,
            view: ViewState::default(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn spec(&self) -> &Arc<CallSpec> {
        &self.spec
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Busy
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Initial form values: declared defaults, overridden by the stored
    /// parameter set when one exists.
    pub fn initialize(&self) -> FormValues {
        let mut values = self.spec.defaults.clone();
        if let Some(stored) = self.store.load(&self.key) {
            debug!(key = %self.key, fields = stored.len(), "restoring stored parameters");
            values.extend(stored);
        }
        values
    }

    /// Validate and build. On success the site is busy until the returned
    /// call is completed.
    pub fn begin_submit(&mut self, values: &FormValues) -> Result<PendingCall, SubmitError> {
        if self.phase == Phase::Busy {
            return Err(SubmitError::Busy { key: self.key.clone() });
        }
        self.phase = Phase::Validating;
        let args = form::validate(&self.spec.fields, values)
            .and_then(|()| self.spec.build_args(values).map_err(ValidationErrors::from));
        let args = match args {
            Ok(args) => args,
            Err(errors) => {
                self.phase = Phase::Idle;
                debug!(key = %self.key, errors = %errors, "submit rejected by validation");
                return Err(SubmitError::Invalid(errors));
            }
        };
        self.phase = Phase::Busy;
        self.view.last_args = Some(args.clone());
        Ok(PendingCall {
            key: self.key.clone(),
            spec: self.spec.clone(),
            sdk: self.sdk.clone(),
            values: values.clone(),
            args,
        })
    }

    pub fn complete(&mut self, completion: CallCompletion) -> Submitted {
        self.phase = Phase::Idle;
        self.view.finished_at = Some(Local::now());
        self.view.last_args = Some(completion.args);
        match completion.outcome {
            Outcome::Success(output) => {
                self.view.lines = self.spec.project(&output);
                self.view.output = Some(output.clone());
                self.view.error = None;
                let (notice, persisted) = match self.store.save(&self.key, &completion.values) {
                    Ok(()) => (Notice::new(NoticeLevel::Success, format!("{} succeeded", self.key)), true),
                    Err(err) => {
                        warn!(key = %self.key, error = %err, "could not persist parameters");
                        let text = format!("{} succeeded, but parameters were not saved: {}", self.key, err);
                        (Notice::new(NoticeLevel::Warning, text), false)
                    }
                };
                Submitted {
                    notice,
                    outcome: Outcome::Success(output),
                    persisted,
                }
            }
            Outcome::Failure(err) => {
                self.record_failure(&err);
                Submitted {
                    notice: Notice::new(NoticeLevel::Error, format!("{} failed: {}", self.key, err)),
                    outcome: Outcome::Failure(err),
                    persisted: false,
                }
            }
        }
    }

    pub async fn submit(&mut self, values: &FormValues) -> Result<Submitted, SubmitError> {
        let pending = self.begin_submit(values)?;
        let completion = pending.run().await;
        Ok(self.complete(completion))
    }

    /// Forget the stored parameters and the result pane. Refused while a
    /// call is in flight, since its completion would write the parameters
    /// back. The defaults are returned even when the store could not be
    /// cleared.
    pub fn reset(&mut self) -> Result<(FormValues, Result<(), StoreError>), SubmitError> {
        if self.phase == Phase::Busy {
            return Err(SubmitError::Busy { key: self.key.clone() });
        }
        self.view = ViewState::default();
        let cleared = self.store.clear(&self.key);
        if let Err(err) = &cleared {
            warn!(key = %self.key, error = %err, "could not clear stored parameters");
        }
        Ok((self.spec.defaults.clone(), cleared))
    }

    /// Source-like preview of the call the current values would make.
    pub fn describe_call(&self, values: &FormValues) -> Result<String, FieldError> {
        let args = self.spec.build_args(values)?;
        Ok(format!(
            "client.{}.{}({})",
            self.spec.interface,
            self.spec.method,
            pretty(&args)
        ))
    }

    fn record_failure(&mut self, err: &CallError) {
        self.view.output = None;
        self.view.lines.clear();
        self.view.error = Some(err.to_string());
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
