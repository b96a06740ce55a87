//! Interception policies: derived reads and gated writes.
//!
//! A policy sees the target read-only and answers with a value (for reads)
//! or a [`SetAction`] (for writes). The layer applies accepted writes
//! itself, so a policy can never leave the target half-written.

use std::fmt;

use serde_json::Value;

use super::store::AttributeStore;

/// What should happen to an intercepted write.
#[derive(Debug, Clone, PartialEq)]
pub enum SetAction {
    /// Store the value under the requested key unchanged.
    Pass,
    /// Apply these writes instead (e.g. split one logical field into two
    /// stored ones). Applied in order.
    Replace(Vec<(String, Value)>),
    /// Refuse the write; the target keeps its prior state.
    Reject(String),
}

/// Hooks invoked by [`Intercepted`](super::Intercepted) on every access.
///
/// Both methods have pass-through defaults, so implementors only override
/// the side they care about.
pub trait InterceptPolicy {
    /// Called on every read. Return `Some` to answer with a derived value;
    /// `None` falls back to the target's stored value.
    fn on_get(&self, _target: &AttributeStore, _key: &str) -> Option<Value> {
        None
    }

    /// Called on every write, before anything is stored.
    fn on_set(&self, _target: &AttributeStore, _key: &str, _value: &Value) -> SetAction {
        SetAction::Pass
    }
}

impl<P: InterceptPolicy + ?Sized> InterceptPolicy for Box<P> {
    fn on_get(&self, target: &AttributeStore, key: &str) -> Option<Value> {
        (**self).on_get(target, key)
    }

    fn on_set(&self, target: &AttributeStore, key: &str, value: &Value) -> SetAction {
        (**self).on_set(target, key, value)
    }
}

/// Intercepts nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl InterceptPolicy for PassThrough {}

// ---------------------------------------------------------------------------
// CompositeField
// ---------------------------------------------------------------------------

/// A virtual field joined from two stored fields.
///
/// Reading `field` yields `"<first><separator><last>"`. Writing `field`
/// splits the string at the first separator and stores the halves. Writes
/// that are not strings, or contain no separator, are rejected.
#[derive(Debug, Clone)]
pub struct CompositeField {
    field: String,
    first: String,
    last: String,
    separator: String,
}

impl CompositeField {
    pub fn new(
        field: impl Into<String>,
        first: impl Into<String>,
        last: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            first: first.into(),
            last: last.into(),
            separator: " ".to_string(),
        }
    }

    /// Use a separator other than a single space.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// The `name = fname + " " + lname` field of the person demo.
    pub fn full_name() -> Self {
        Self::new("name", "fname", "lname")
    }
}

impl InterceptPolicy for CompositeField {
    fn on_get(&self, target: &AttributeStore, key: &str) -> Option<Value> {
        if key != self.field {
            return None;
        }
        let first = target.get(&self.first).map(text)?;
        let last = target.get(&self.last).map(text)?;
        Some(Value::String(format!("{first}{}{last}", self.separator)))
    }

    fn on_set(&self, _target: &AttributeStore, key: &str, value: &Value) -> SetAction {
        if key != self.field {
            return SetAction::Pass;
        }
        let Some(joined) = value.as_str() else {
            return SetAction::Reject(format!("'{}' must be a string", self.field));
        };
        match joined.split_once(self.separator.as_str()) {
            Some((first, last)) => SetAction::Replace(vec![
                (self.first.clone(), Value::String(first.to_string())),
                (self.last.clone(), Value::String(last.to_string())),
            ]),
            None => SetAction::Reject(format!(
                "'{}' must look like '<{}>{}<{}>'",
                self.field, self.first, self.separator, self.last
            )),
        }
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// LowerBound
// ---------------------------------------------------------------------------

/// Rejects writes to `key` that are below `min` or not numeric.
#[derive(Debug, Clone)]
pub struct LowerBound {
    key: String,
    min: f64,
}

impl LowerBound {
    pub fn new(key: impl Into<String>, min: f64) -> Self {
        Self {
            key: key.into(),
            min,
        }
    }
}

impl InterceptPolicy for LowerBound {
    fn on_set(&self, _target: &AttributeStore, key: &str, value: &Value) -> SetAction {
        if key != self.key {
            return SetAction::Pass;
        }
        match value.as_f64() {
            Some(n) if n >= self.min => SetAction::Pass,
            Some(_) => SetAction::Reject(format!("'{}' cannot be below {}", self.key, self.min)),
            None => SetAction::Reject(format!("'{}' must be a number", self.key)),
        }
    }
}

// ---------------------------------------------------------------------------
// Validate
// ---------------------------------------------------------------------------

/// Gates writes to one key with an arbitrary predicate.
///
/// The predicate returns `Err(reason)` to refuse the write.
pub struct Validate {
    key: String,
    check: Box<dyn Fn(&Value) -> Result<(), String>>,
}

impl Validate {
    pub fn new(
        key: impl Into<String>,
        check: impl Fn(&Value) -> Result<(), String> + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            check: Box::new(check),
        }
    }
}

impl fmt::Debug for Validate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validate").field("key", &self.key).finish()
    }
}

impl InterceptPolicy for Validate {
    fn on_set(&self, _target: &AttributeStore, key: &str, value: &Value) -> SetAction {
        if key != self.key {
            return SetAction::Pass;
        }
        match (self.check)(value) {
            Ok(()) => SetAction::Pass,
            Err(reason) => SetAction::Reject(reason),
        }
    }
}

// ---------------------------------------------------------------------------
// AccessLog
// ---------------------------------------------------------------------------

/// Logs every read and write at debug level; intercepts nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessLog;

impl InterceptPolicy for AccessLog {
    fn on_get(&self, target: &AttributeStore, key: &str) -> Option<Value> {
        match target.get(key) {
            Some(value) => log::debug!("The value of {} is {}", key, value),
            None => log::debug!("The value of {} is unset", key),
        }
        None
    }

    fn on_set(&self, _target: &AttributeStore, key: &str, value: &Value) -> SetAction {
        log::debug!("Setting {} to {}", key, value);
        SetAction::Pass
    }
}

// ---------------------------------------------------------------------------
// PolicyChain
// ---------------------------------------------------------------------------

/// Ordered composition of policies.
///
/// Reads: the first policy returning a derived value wins. Writes: every
/// policy is consulted in order; the first `Reject` wins outright,
/// otherwise the first `Replace` wins over `Pass`. Each write of a winning
/// `Replace` is then checked against the remaining policies, and any
/// `Reject` among them refuses the whole write.
#[derive(Default)]
pub struct PolicyChain {
    policies: Vec<Box<dyn InterceptPolicy>>,
}

impl PolicyChain {
    /// Create an empty chain (behaves like [`PassThrough`]).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a policy (builder style).
    pub fn with(mut self, policy: impl InterceptPolicy + 'static) -> Self {
        self.push(policy);
        self
    }

    /// Append a policy.
    pub fn push(&mut self, policy: impl InterceptPolicy + 'static) {
        self.policies.push(Box::new(policy));
    }

    /// Number of policies in the chain.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Check if the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl fmt::Debug for PolicyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyChain")
            .field("policies", &self.policies.len())
            .finish()
    }
}

impl InterceptPolicy for PolicyChain {
    fn on_get(&self, target: &AttributeStore, key: &str) -> Option<Value> {
        self.policies
            .iter()
            .find_map(|policy| policy.on_get(target, key))
    }

    fn on_set(&self, target: &AttributeStore, key: &str, value: &Value) -> SetAction {
        let mut replacement: Option<(usize, Vec<(String, Value)>)> = None;
        for (index, policy) in self.policies.iter().enumerate() {
            match policy.on_set(target, key, value) {
                SetAction::Reject(reason) => return SetAction::Reject(reason),
                SetAction::Replace(writes) => {
                    if replacement.is_none() {
                        replacement = Some((index, writes));
                    }
                }
                SetAction::Pass => {}
            }
        }

        let Some((source, writes)) = replacement else {
            return SetAction::Pass;
        };

        // Replacement writes are gated by every other policy too; a refusal
        // of any stored field refuses the whole write.
        for (stored_key, stored_value) in &writes {
            for (index, policy) in self.policies.iter().enumerate() {
                if index == source {
                    continue;
                }
                if let SetAction::Reject(reason) = policy.on_set(target, stored_key, stored_value) {
                    return SetAction::Reject(reason);
                }
            }
        }
        SetAction::Replace(writes)
    }
}
