//! Catalog of call sites offered by the console, one [`CallSpec`] per SDK
//! method, grouped by interface.

mod instance;
mod login;
mod message;
mod social;
mod upload;

use crate::form::FormValues;
use crate::lifecycle::CallSpec;
use crate::sdk::LoopbackOptions;
use serde_json::Value;
use std::sync::Arc;

pub const CONVERSATION_ID_PATTERN: &str = r"^[^|]+\|(p2p|team)\|[^|]+$";

pub fn catalog(loopback: &LoopbackOptions) -> Vec<Arc<CallSpec>> {
    let mut specs = instance::specs(loopback);
    specs.extend(login::specs());
    specs.extend(message::specs());
    specs.extend(social::specs());
    specs.extend(upload::specs());
    specs.into_iter().map(Arc::new).collect()
}

/// Object holding only the named fields that have a value.
fn pick(values: &FormValues, names: &[&str]) -> Value {
    let picked = names
        .iter()
        .filter_map(|name| values.get(*name).map(|v| (name.to_string(), v.clone())))
        .collect();
    Value::Object(picked)
}

fn text<'a>(value: &'a Value, name: &str) -> &'a str {
    value.get(name).and_then(Value::as_str).unwrap_or_default()
}

/// One line per array item, or the whole value when it is not an array.
fn item_lines(output: &Value, line: impl Fn(&Value) -> String) -> Vec<String> {
    match output {
        Value::Array(items) if items.is_empty() => vec!["(empty)".to_string()],
        Value::Array(items) => items.iter().map(line).collect(),
        other => vec![line(other)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::validate;
    use std::collections::HashSet;

    fn all() -> Vec<Arc<CallSpec>> {
        catalog(&LoopbackOptions::default())
    }

    #[test]
    fn keys_are_unique() {
        let specs = all();
        let keys: HashSet<String> = specs.iter().map(|s| s.key()).collect();
        assert_eq!(keys.len(), specs.len());
        assert!(keys.contains("Instance.create"));
        assert!(keys.contains("SubscriptionService.subscribeUserStatus"));
    }

    #[test]
    fn defaults_pass_their_own_validation_and_build() {
        for spec in all() {
            if let Err(errors) = validate(&spec.fields, &spec.defaults) {
                panic!("{} defaults invalid: {}", spec.key(), errors);
            }
            if let Err(err) = spec.build_args(&spec.defaults) {
                panic!("{} defaults do not build: {}", spec.key(), err);
            }
        }
    }

    #[test]
    fn every_spec_documents_itself() {
        for spec in all() {
            assert!(!spec.summary.is_empty(), "{} has no summary", spec.key());
        }
    }
}
