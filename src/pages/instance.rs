use crate::form::FieldDef;
use crate::lifecycle::CallSpec;
use crate::sdk::{LoopbackClient, LoopbackOptions, SdkError};
use futures::FutureExt;
use serde_json::{json, Value};
use std::time::Duration;

pub(super) fn specs(loopback: &LoopbackOptions) -> Vec<CallSpec> {
    vec![
        CallSpec::new("Instance", "create")
            .summary("Create the SDK instance every other call goes through")
            .field(FieldDef::text("appKey", "App key").required())
            .field(
                FieldDef::integer("latencyMs", "Simulated latency (ms)")
                    .range(0, 10_000)
                    .help("Delay the loopback SDK adds to every call"),
            )
            .defaults(json!({
                "appKey": loopback.app_key,
                "latencyMs": loopback.latency.as_millis() as u64,
            }))
            .build(|values| Ok(super::pick(values, &["appKey", "latencyMs"])))
            .call(|sdk, args| {
                async move {
                    let options = LoopbackOptions {
                        app_key: super::text(&args, "appKey").to_string(),
                        latency: Duration::from_millis(args.get("latencyMs").and_then(Value::as_u64).unwrap_or(0)),
                    };
                    let app_key = options.app_key.clone();
                    sdk.create_with(|events| LoopbackClient::new(options, events));
                    Ok(json!({ "created": true, "appKey": app_key }))
                }
                .boxed()
            }),
        CallSpec::new("Instance", "destroy")
            .summary("Tear the SDK instance down; calls fail until it is created again")
            .call(|sdk, _| {
                async move {
                    if sdk.destroy() {
                        Ok(Value::Null)
                    } else {
                        Err(SdkError::NotInitialized)
                    }
                }
                .boxed()
            }),
    ]
}
