//! The intercepting wrapper around an [`AttributeStore`].

use serde_json::Value;

use super::policy::{InterceptPolicy, SetAction};
use super::store::AttributeStore;
use crate::config::InterceptionConfig;
use crate::errors::ValidationRejected;

/// Routes every attribute read and write through a policy.
///
/// The wrapper keeps no state of its own beyond the target it owns: use
/// [`target`](Self::target) to inspect stored attributes without
/// interception.
///
/// # Example
///
/// ```
/// use relay::interception::{AttributeStore, CompositeField, Intercepted};
/// use serde_json::json;
///
/// let target = AttributeStore::from_value(json!({"fname": "John", "lname": "Doe"})).unwrap();
/// let mut person = Intercepted::new(target, CompositeField::full_name());
///
/// assert_eq!(person.get("name"), Some(json!("John Doe")));
/// assert!(person.set("name", "Jane Doe"));
/// assert_eq!(person.target().get_str("fname"), Some("Jane"));
/// ```
#[derive(Debug)]
pub struct Intercepted<P> {
    target: AttributeStore,
    policy: P,
    config: InterceptionConfig,
}

impl<P: InterceptPolicy> Intercepted<P> {
    /// Wrap `target` with the default interception config.
    pub fn new(target: AttributeStore, policy: P) -> Self {
        Self::with_config(target, policy, InterceptionConfig::default())
    }

    /// Wrap `target` with an explicit interception config.
    pub fn with_config(target: AttributeStore, policy: P, config: InterceptionConfig) -> Self {
        Self {
            target,
            policy,
            config,
        }
    }

    /// Read `key` through the policy.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.policy
            .on_get(&self.target, key)
            .or_else(|| self.target.get(key).cloned())
    }

    /// Write `key` through the policy.
    ///
    /// Returns `false` if the policy refused the write; the target is then
    /// unchanged.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> bool {
        match self.try_set(key, value) {
            Ok(()) => true,
            Err(rejected) => {
                if self.config.log_rejections {
                    log::warn!("{}", rejected);
                }
                false
            }
        }
    }

    /// Write `key` through the policy, reporting why a write was refused.
    pub fn try_set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), ValidationRejected> {
        let value = value.into();
        match self.policy.on_set(&self.target, key, &value) {
            SetAction::Pass => {
                self.target.set(key, value);
            }
            SetAction::Replace(writes) => {
                for (k, v) in writes {
                    self.target.set(k, v);
                }
            }
            SetAction::Reject(reason) => {
                return Err(ValidationRejected::new(key, reason));
            }
        }
        Ok(())
    }

    /// The wrapped target, read directly.
    pub fn target(&self) -> &AttributeStore {
        &self.target
    }

    /// The policy in use.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Unwrap, returning the target.
    pub fn into_inner(self) -> AttributeStore {
        self.target
    }
}
