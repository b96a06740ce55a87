//! Person record behind the interception layer: a derived `name` field and
//! an age that cannot go negative.

use serde_json::{json, Value};

use crate::config::RelayConfig;
use crate::interception::{
    AccessLog, AttributeStore, CompositeField, Intercepted, LowerBound, PolicyChain,
};

/// `{fname: "John", lname: "Doe", age: 30}`.
pub fn john_doe() -> AttributeStore {
    let mut person = AttributeStore::new();
    person.set("fname", "John");
    person.set("lname", "Doe");
    person.set("age", 30);
    person
}

fn show(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => "undefined".to_string(),
    }
}

/// Read and rewrite the derived `name` field.
pub fn run_proxy(config: &RelayConfig) -> Vec<String> {
    rename(config, "Jane Doe")
}

/// Read `name`, write `new_name` through it, and read it back.
fn rename(config: &RelayConfig, new_name: &str) -> Vec<String> {
    let policy = PolicyChain::new()
        .with(AccessLog)
        .with(CompositeField::full_name());
    let mut proxy = Intercepted::with_config(john_doe(), policy, config.interception.clone());

    let mut lines = vec![show(proxy.get("name"))];
    if let Err(rejected) = proxy.try_set("name", json!(new_name)) {
        lines.push(rejected.to_string());
    }
    lines.push(show(proxy.get("name")));
    lines
}

/// Try to store a negative age.
pub fn run_validation(config: &RelayConfig) -> Vec<String> {
    let mut proxy = Intercepted::with_config(
        john_doe(),
        LowerBound::new("age", 0.0),
        config.interception.clone(),
    );

    let mut lines = Vec::new();
    if let Err(rejected) = proxy.try_set("age", -1) {
        lines.push(rejected.to_string());
    }
    lines.push(show(proxy.get("age")));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_proxy() {
        assert_eq!(
            run_proxy(&RelayConfig::default()),
            vec!["John Doe".to_string(), "Jane Doe".to_string()]
        );
    }

    #[test]
    fn test_refused_rename_is_reported() {
        assert_eq!(
            rename(&RelayConfig::default(), "Cher"),
            vec![
                "John Doe".to_string(),
                "write to 'name' rejected: 'name' must look like '<fname> <lname>'".to_string(),
                "John Doe".to_string(),
            ]
        );
    }

    #[test]
    fn test_run_validation() {
        assert_eq!(
            run_validation(&RelayConfig::default()),
            vec![
                "write to 'age' rejected: 'age' cannot be below 0".to_string(),
                "30".to_string(),
            ]
        );
    }
}
