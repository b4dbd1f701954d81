//! Handle to the messaging SDK instance.
//!
//! The console never talks to a concrete SDK type: every call goes through
//! an [`SdkHandle`], which owns the current [`ImClient`] (if one has been
//! created) and an event bus that outlives individual instances.

pub mod loopback;

pub use loopback::{LoopbackClient, LoopbackOptions};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use tracing::info;

const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SdkError {
    #[error("SDK instance has not been created")]
    NotInitialized,
    #[error("unknown method {0}")]
    UnknownMethod(String),
    #[error("[{code}] {message}")]
    Rejected { code: u16, message: String },
    #[error("local failure: {0}")]
    Local(String),
}

impl SdkError {
    pub fn rejected(code: u16, message: impl Into<String>) -> Self {
        SdkError::Rejected {
            code,
            message: message.into(),
        }
    }
}

/// One emission from the SDK's event-emitter surface.
#[derive(Debug, Clone, Serialize)]
pub struct SdkEvent {
    pub name: String,
    pub payload: Value,
    pub at: DateTime<Local>,
}

impl SdkEvent {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
            at: Local::now(),
        }
    }
}

/// Public method surface of a messaging SDK instance, addressed as
/// `"<Interface>.<method>"` with JSON arguments.
#[async_trait]
pub trait ImClient: Send + Sync {
    async fn invoke(&self, method: &str, args: Value) -> Result<Value, SdkError>;
}

#[derive(Clone)]
pub struct SdkHandle {
    client: Arc<RwLock<Option<Arc<dyn ImClient>>>>,
    events: broadcast::Sender<SdkEvent>,
}

static GLOBAL_HANDLE: Lazy<SdkHandle> = Lazy::new(SdkHandle::new);

impl Default for SdkHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SdkHandle {
    /// An empty handle with its own event bus. Tests build one each.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self {
            client: Arc::new(RwLock::new(None)),
            events,
        }
    }

    /// The process-wide handle used by the console binary.
    pub fn global() -> &'static SdkHandle {
        &GLOBAL_HANDLE
    }

    /// Replace the current instance with the one `build` returns. The
    /// builder receives the bus it should emit events on.
    pub fn create_with<C, F>(&self, build: F) -> Arc<dyn ImClient>
    where
        C: ImClient + 'static,
        F: FnOnce(broadcast::Sender<SdkEvent>) -> C,
    {
        let client: Arc<dyn ImClient> = Arc::new(build(self.events.clone()));
        let previous = self
            .client
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(client.clone());
        if previous.is_some() {
            info!("replaced existing SDK instance");
        } else {
            info!("SDK instance created");
        }
        self.emit(SdkEvent::new("instance.created", Value::Null));
        client
    }

    /// Drop the current instance. Returns false when there was none.
    pub fn destroy(&self) -> bool {
        let previous = self.client.write().unwrap_or_else(PoisonError::into_inner).take();
        if previous.is_some() {
            info!("SDK instance destroyed");
            self.emit(SdkEvent::new("instance.destroyed", Value::Null));
            true
        } else {
            false
        }
    }

    pub fn is_created(&self) -> bool {
        self.client.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    pub fn client(&self) -> Result<Arc<dyn ImClient>, SdkError> {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(SdkError::NotInitialized)
    }

    pub async fn invoke(&self, method: &str, args: Value) -> Result<Value, SdkError> {
        let client = self.client()?;
        client.invoke(method, args).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SdkEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SdkEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl ImClient for Echo {
        async fn invoke(&self, method: &str, args: Value) -> Result<Value, SdkError> {
            Ok(json!({ "method": method, "args": args }))
        }
    }

    #[tokio::test]
    async fn invoke_requires_an_instance() {
        let handle = SdkHandle::new();
        assert!(!handle.is_created());
        assert_eq!(
            handle.invoke("LoginService.login", Value::Null).await,
            Err(SdkError::NotInitialized)
        );
    }

    #[tokio::test]
    async fn create_and_destroy_round_trip() {
        let handle = SdkHandle::new();
        let mut events = handle.subscribe();
        handle.create_with(|_| Echo);
        let out = handle.invoke("A.b", json!({"x": 1})).await.unwrap();
        assert_eq!(out, json!({"method": "A.b", "args": {"x": 1}}));

        assert!(handle.destroy());
        assert!(!handle.destroy());
        assert_eq!(events.recv().await.unwrap().name, "instance.created");
        assert_eq!(events.recv().await.unwrap().name, "instance.destroyed");
    }

    #[test]
    fn clones_share_the_instance() {
        let handle = SdkHandle::new();
        let other = handle.clone();
        handle.create_with(|_| Echo);
        assert!(other.is_created());
    }
}
