//! Listener handles for the notification bus.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use crate::errors::ListenerError;

/// What a listener callback returns.
pub type ListenerResult = Result<(), ListenerError>;

/// Unique identifier for a listener, used for unsubscription and logging.
///
/// Equality is by numeric id only; two listeners with the same name are
/// still distinct.
#[derive(Clone)]
pub struct ListenerId {
    /// Human-readable name.
    pub name: String,
    id: u64,
}

static LISTENER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

impl ListenerId {
    fn next(name: String) -> Self {
        Self {
            name,
            id: LISTENER_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({}:{})", self.id, self.name)
    }
}

impl PartialEq for ListenerId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for ListenerId {}

impl std::hash::Hash for ListenerId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A named callback that can be subscribed to one or more topics.
///
/// Cloning a `Listener` yields the same listener instance (same id, shared
/// callback). Unsubscribing removes every slot occupied by that instance.
#[derive(Clone)]
pub struct Listener {
    id: ListenerId,
    callback: Rc<dyn Fn(&Value) -> ListenerResult>,
}

impl Listener {
    /// Create a listener whose callback can fail.
    pub fn new(
        name: impl Into<String>,
        callback: impl Fn(&Value) -> ListenerResult + 'static,
    ) -> Self {
        Self {
            id: ListenerId::next(name.into()),
            callback: Rc::new(callback),
        }
    }

    /// Create a listener from a callback that never fails.
    pub fn infallible(name: impl Into<String>, callback: impl Fn(&Value) + 'static) -> Self {
        Self::new(name, move |data| {
            callback(data);
            Ok(())
        })
    }

    /// This listener's id.
    pub fn id(&self) -> &ListenerId {
        &self.id
    }

    /// This listener's name.
    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub(crate) fn call(&self, data: &Value) -> ListenerResult {
        (self.callback)(data)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener").field(&self.id).finish()
    }
}
