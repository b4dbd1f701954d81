use futures::FutureExt;
use sdk_console::call::{self, CallErrorKind, Outcome};
use sdk_console::form::{FieldDef, FormValues};
use sdk_console::lifecycle::{CallSite, CallSpec, NoticeLevel, Phase, SubmitError};
use sdk_console::sdk::{SdkError, SdkHandle};
use sdk_console::storage::{JsonFileStore, KvStore, MemoryStore, ParamStore};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

fn values(value: Value) -> FormValues {
    value.as_object().cloned().unwrap_or_default()
}

/// `Example.sendThing` with a required `text` field. The call counts its
/// invocations and fails when the text is "fail".
fn send_thing(calls: Arc<AtomicUsize>) -> CallSpec {
    CallSpec::new("Example", "sendThing")
        .field(FieldDef::text("text", "Text").required())
        .field(FieldDef::integer("repeat", "Repeat").range(1, 5))
        .defaults(json!({ "text": "hi" }))
        .call(move |_, args| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                match args["text"].as_str() {
                    Some("fail") => Err(SdkError::rejected(500, "thing refused")),
                    _ => Ok(json!({ "sent": args["text"] })),
                }
            }
            .boxed()
        })
}

fn site_with(store: ParamStore) -> (CallSite, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let site = CallSite::new(Arc::new(send_thing(calls.clone())), SdkHandle::new(), store);
    (site, calls)
}

#[tokio::test]
async fn wrapper_yields_the_value_on_success() {
    let outcome = call::to(|| async { Ok::<_, SdkError>(json!({"id": 7})) }).await;
    assert_eq!(outcome.clone().into_pair(), (None, Some(json!({"id": 7}))));
    assert_eq!(outcome, Outcome::Success(json!({"id": 7})));
}

#[tokio::test]
async fn wrapper_yields_the_error_on_rejection_without_panicking() {
    let outcome = call::to(|| async { Err::<Value, _>(SdkError::rejected(414, "bad parameter")) }).await;
    let (err, value) = outcome.into_pair();
    let err = err.unwrap();
    assert_eq!(err.kind(), CallErrorKind::Rejected);
    assert_eq!(err.message(), "[414] bad parameter");
    assert_eq!(value, None);
}

#[tokio::test]
async fn example_send_thing_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("params.json");

    let (mut site, calls) = site_with(ParamStore::new(Arc::new(JsonFileStore::open(&path))));
    assert_eq!(site.initialize(), values(json!({"text": "hi"})));

    let submitted = site.submit(&values(json!({"text": "bye"}))).await.unwrap();
    assert_eq!(submitted.notice.level, NoticeLevel::Success);
    assert!(submitted.persisted);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(site.view().output, Some(json!({"sent": "bye"})));

    // A fresh page over the reopened store sees the new values.
    let (reloaded, _) = site_with(ParamStore::new(Arc::new(JsonFileStore::open(&path))));
    assert_eq!(reloaded.initialize(), values(json!({"text": "bye"})));
}

#[tokio::test]
async fn reset_after_success_restores_defaults() {
    let (mut site, _) = site_with(ParamStore::in_memory());
    site.submit(&values(json!({"text": "persisted", "repeat": 3})))
        .await
        .unwrap();
    assert_eq!(site.initialize().get("repeat"), Some(&json!(3)));

    let (defaults, cleared) = site.reset().unwrap();
    assert!(cleared.is_ok());
    assert_eq!(defaults, values(json!({"text": "hi"})));
    assert_eq!(site.initialize(), values(json!({"text": "hi"})));
    assert!(site.view().output.is_none());
}

#[tokio::test]
async fn second_success_overwrites_the_first() {
    let backend = Arc::new(MemoryStore::new());
    let (mut site, _) = site_with(ParamStore::new(backend.clone()));
    site.submit(&values(json!({"text": "a", "repeat": 2}))).await.unwrap();
    site.submit(&values(json!({"text": "b"}))).await.unwrap();

    let stored: Value = serde_json::from_str(&backend.get("Example.sendThing").unwrap()).unwrap();
    assert_eq!(stored, json!({"text": "b"}));
}

#[tokio::test]
async fn failure_leaves_stored_parameters_alone() {
    let (mut site, calls) = site_with(ParamStore::in_memory());
    site.submit(&values(json!({"text": "kept"}))).await.unwrap();

    let submitted = site.submit(&values(json!({"text": "fail"}))).await.unwrap();
    assert_eq!(submitted.notice.level, NoticeLevel::Error);
    assert!(submitted.notice.text.contains("[500] thing refused"));
    assert!(!submitted.persisted);
    assert_eq!(site.view().error.as_deref(), Some("[500] thing refused"));
    assert_eq!(site.phase(), Phase::Idle);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(site.initialize(), values(json!({"text": "kept"})));
}

#[test]
fn malformed_cache_falls_back_to_defaults() {
    for raw in ["{not json", "[1, 2, 3]", "\"just a string\"", ""] {
        let backend = Arc::new(MemoryStore::new());
        backend.set("Example.sendThing", raw).unwrap();
        let (site, _) = site_with(ParamStore::new(backend));
        assert_eq!(site.initialize(), values(json!({"text": "hi"})), "stored {:?}", raw);
    }
}

#[tokio::test]
async fn validation_gate_blocks_the_call_and_the_store() {
    let backend = Arc::new(MemoryStore::new());
    let (mut site, calls) = site_with(ParamStore::new(backend.clone()));

    for bad in [json!({}), json!({"text": "  "}), json!({"text": "ok", "repeat": 9})] {
        match site.submit(&values(bad)).await {
            Err(SubmitError::Invalid(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected a validation error, got {:?}", other.map(|s| s.notice)),
        }
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(backend.is_empty());
    assert_eq!(site.phase(), Phase::Idle);
}

#[tokio::test]
async fn busy_site_rejects_a_second_submit() {
    let calls = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Notify::new());
    let spec = {
        let calls = calls.clone();
        let gate = gate.clone();
        CallSpec::new("Example", "slowThing").call(move |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            let gate = gate.clone();
            async move {
                gate.notified().await;
                Ok(Value::Null)
            }
            .boxed()
        })
    };
    let mut site = CallSite::new(Arc::new(spec), SdkHandle::new(), ParamStore::in_memory());

    let pending = site.begin_submit(&FormValues::new()).unwrap();
    assert!(site.is_busy());
    let running = tokio::spawn(pending.run());
    tokio::task::yield_now().await;

    for _ in 0..3 {
        match site.begin_submit(&FormValues::new()) {
            Err(SubmitError::Busy { key }) => assert_eq!(key, "Example.slowThing"),
            Err(other) => panic!("unexpected {}", other),
            Ok(_) => panic!("second submit accepted while busy"),
        }
    }

    gate.notify_one();
    let completion = running.await.unwrap();
    let submitted = site.complete(completion);
    assert!(submitted.outcome.is_success());
    assert!(!site.is_busy());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Idle again, so the next submit goes through.
    assert!(site.begin_submit(&FormValues::new()).is_ok());
}

#[tokio::test]
async fn panicking_call_is_reported_as_a_failure() {
    let spec = CallSpec::new("Example", "explode").call(|_, _| async { panic!("boom") }.boxed());
    let mut site = CallSite::new(Arc::new(spec), SdkHandle::new(), ParamStore::in_memory());
    let submitted = site.submit(&FormValues::new()).await.unwrap();
    assert_eq!(submitted.outcome.error().map(|e| e.kind()), Some(CallErrorKind::Panicked));
    assert_eq!(site.view().error.as_deref(), Some("boom"));
    assert_eq!(site.phase(), Phase::Idle);
}

#[test]
fn describe_call_has_no_side_effects() {
    let backend = Arc::new(MemoryStore::new());
    let (site, calls) = site_with(ParamStore::new(backend.clone()));
    let text = site.describe_call(&values(json!({"text": "bye"}))).unwrap();
    assert_eq!(text, "client.Example.sendThing({\n  \"text\": \"bye\"\n})");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(backend.is_empty());
}

#[tokio::test]
async fn reset_is_refused_while_a_call_is_in_flight() {
    let gate = Arc::new(Notify::new());
    let spec = {
        let gate = gate.clone();
        CallSpec::new("Example", "sendThing")
            .field(FieldDef::text("text", "Text").required())
            .defaults(json!({ "text": "hi" }))
            .call(move |_, args| {
                let gate = gate.clone();
                async move {
                    gate.notified().await;
                    Ok(args)
                }
                .boxed()
            })
    };
    let backend = Arc::new(MemoryStore::new());
    let mut site = CallSite::new(Arc::new(spec), SdkHandle::new(), ParamStore::new(backend.clone()));

    let pending = site.begin_submit(&values(json!({"text": "bye"}))).unwrap();
    let running = tokio::spawn(pending.run());
    match site.reset() {
        Err(SubmitError::Busy { key }) => assert_eq!(key, "Example.sendThing"),
        Err(other) => panic!("unexpected {}", other),
        Ok(_) => panic!("reset accepted while busy"),
    }

    gate.notify_one();
    let submitted = site.complete(running.await.unwrap());
    assert!(submitted.persisted);
    assert_eq!(site.initialize(), values(json!({"text": "bye"})));

    // Once idle, reset sticks.
    let (defaults, cleared) = site.reset().unwrap();
    assert!(cleared.is_ok());
    assert_eq!(defaults, values(json!({"text": "hi"})));
    assert!(backend.get("Example.sendThing").is_none());
    assert_eq!(site.initialize(), values(json!({"text": "hi"})));
}

#[tokio::test]
async fn failed_save_does_not_change_initial_values() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the store file should be makes every write fail.
    let path = dir.path().join("params.json");
    std::fs::create_dir(&path).unwrap();

    let (mut site, calls) = site_with(ParamStore::new(Arc::new(JsonFileStore::open(&path))));
    let submitted = site.submit(&values(json!({"text": "bye"}))).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(submitted.outcome.is_success());
    assert!(!submitted.persisted);
    assert_eq!(submitted.notice.level, NoticeLevel::Warning);
    assert_eq!(site.initialize(), values(json!({"text": "hi"})));
}
