//! Topic-keyed notification bus.
//!
//! Listeners subscribe to string topics; `notify` invokes every listener
//! currently subscribed to a topic, in subscription order, synchronously.
//! A failing listener never prevents the others from running: failures are
//! collected and returned as a [`NotifyError`].

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;

use super::listener::Listener;
use crate::config::NotifyConfig;
use crate::errors::{ListenerFailure, NotifyError};
use crate::registry::Registry;

/// Publish/subscribe bus keyed by topic.
///
/// Topics need no declaration: any string is a valid topic the first time
/// it is subscribed to or notified. All methods take `&self`, so listeners
/// can hold an `Rc<NotificationBus>` and subscribe, unsubscribe or notify
/// from inside a callback. Such changes apply from the next `notify` on.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use relay::observer::{Listener, NotificationBus};
/// use serde_json::json;
///
/// let bus = NotificationBus::new();
/// let log = Rc::new(RefCell::new(Vec::new()));
///
/// let sink = Rc::clone(&log);
/// let call = Listener::infallible("call", move |person| {
///     sink.borrow_mut().push(format!("call {}", person.as_str().unwrap_or_default()));
/// });
/// bus.subscribe("invite", &call);
///
/// assert_eq!(bus.notify("invite", &json!("Alice")).unwrap(), 1);
/// assert_eq!(*log.borrow(), vec!["call Alice".to_string()]);
/// ```
pub struct NotificationBus {
    topics: RefCell<Registry<Vec<Listener>>>,
    config: NotifyConfig,
}

impl NotificationBus {
    /// Create a bus with the default notify config.
    pub fn new() -> Self {
        Self::with_config(NotifyConfig::default())
    }

    /// Create a bus with an explicit notify config.
    pub fn with_config(config: NotifyConfig) -> Self {
        Self {
            topics: RefCell::new(Registry::new()),
            config,
        }
    }

    /// The config this bus was built with.
    pub fn config(&self) -> &NotifyConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Append `listener` to the topic's listener list.
    ///
    /// Subscribing the same listener twice gives it two slots: it will be
    /// invoked twice per `notify`.
    pub fn subscribe(&self, topic: &str, listener: &Listener) {
        self.topics
            .borrow_mut()
            .get_or_default(topic)
            .push(listener.clone());
        log::debug!("NotificationBus: {:?} subscribed to '{}'", listener.id(), topic);
    }

    /// Remove every slot `listener` occupies on `topic`.
    ///
    /// Returns the number of slots removed. Unknown topics and listeners are
    /// a no-op returning 0.
    pub fn unsubscribe(&self, topic: &str, listener: &Listener) -> usize {
        let mut topics = self.topics.borrow_mut();
        let Some(listeners) = topics.get_mut(topic) else {
            return 0;
        };

        let before = listeners.len();
        listeners.retain(|l| l != listener);
        let removed = before - listeners.len();

        if listeners.is_empty() {
            topics.remove(topic);
        }
        if removed > 0 {
            log::debug!(
                "NotificationBus: {:?} unsubscribed from '{}' ({} slot(s))",
                listener.id(),
                topic,
                removed
            );
        }
        removed
    }

    /// Remove every listener from `topic`. Returns the number removed.
    pub fn clear_topic(&self, topic: &str) -> usize {
        self.topics
            .borrow_mut()
            .remove(topic)
            .map_or(0, |listeners| listeners.len())
    }

    /// Number of listener slots on `topic`.
    pub fn listener_count(&self, topic: &str) -> usize {
        self.topics.borrow().get(topic).map_or(0, Vec::len)
    }

    /// Check if `topic` has at least one listener.
    pub fn has_listeners(&self, topic: &str) -> bool {
        self.listener_count(topic) > 0
    }

    /// Number of topics with at least one listener.
    pub fn topic_count(&self) -> usize {
        self.topics.borrow().len()
    }

    /// Sorted names of the topics with at least one listener.
    pub fn topics(&self) -> Vec<String> {
        self.topics.borrow().keys()
    }

    // -----------------------------------------------------------------------
    // Notification
    // -----------------------------------------------------------------------

    /// Deliver `data` to every listener subscribed to `topic`.
    ///
    /// Listeners run one after another in subscription order and all see
    /// the same `data`. The listener list is snapshotted when the call
    /// starts. Returns the number of listeners invoked, or a
    /// [`NotifyError`] listing each failure if any listener failed (the
    /// others still ran). A topic with no listeners is `Ok(0)`.
    pub fn notify(&self, topic: &str, data: &Value) -> Result<usize, NotifyError> {
        let listeners: Vec<Listener> = match self.topics.borrow().get(topic) {
            Some(listeners) => listeners.clone(),
            None => {
                log::debug!("NotificationBus: no listeners for '{}'", topic);
                return Ok(0);
            }
        };

        let mut failures = Vec::new();
        for (index, listener) in listeners.iter().enumerate() {
            if let Some(failure) = self.invoke(index, listener, data) {
                log::warn!("NotificationBus: topic '{}': {}", topic, failure);
                failures.push(failure);
            }
        }

        let delivered = listeners.len();
        log::debug!(
            "NotificationBus: '{}' delivered to {} listener(s), {} failed",
            topic,
            delivered,
            failures.len()
        );

        if failures.is_empty() {
            Ok(delivered)
        } else {
            Err(NotifyError {
                topic: topic.to_string(),
                delivered,
                failures,
            })
        }
    }

    fn invoke(&self, index: usize, listener: &Listener, data: &Value) -> Option<ListenerFailure> {
        let outcome = if self.config.catch_panics {
            match catch_unwind(AssertUnwindSafe(|| listener.call(data))) {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    log::error!(
                        "NotificationBus: listener {:?} panicked: {}",
                        listener.id(),
                        message
                    );
                    return Some(ListenerFailure {
                        listener: listener.name().to_string(),
                        index,
                        message,
                        panicked: true,
                    });
                }
            }
        } else {
            listener.call(data)
        };

        outcome.err().map(|err| ListenerFailure {
            listener: listener.name().to_string(),
            index,
            message: err.message,
            panicked: false,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationBus")
            .field("topics", &self.topics.borrow().keys())
            .field("config", &self.config)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
