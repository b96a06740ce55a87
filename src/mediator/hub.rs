//! Dispatch hub — name-based request routing between participants.
//!
//! Participants register under a name and address each other only by name,
//! never by reference. The hub looks the recipient up in its
//! [`Registry`] and invokes its handler synchronously.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use relay::mediator::{DispatchHub, DispatchResult, RequestHandler};
//! use serde_json::{json, Value};
//!
//! struct Service;
//!
//! impl RequestHandler for Service {
//!     fn handle_request(&self, from: &str, payload: &Value) -> DispatchResult {
//!         Ok(Some(json!({ "ack": from, "type": payload["type"] })))
//!     }
//! }
//!
//! let hub = DispatchHub::new();
//! let service = Rc::new(Service);
//! hub.register("service", &service);
//!
//! let reply = hub
//!     .send_request("speaker", "service", &json!({"type": "Microphone", "content": "AX-270"}))
//!     .unwrap();
//! assert_eq!(reply, Some(json!({"ack": "speaker", "type": "Microphone"})));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

use super::participant::{DispatchResult, RequestHandler};
use crate::config::DispatchConfig;
use crate::errors::DispatchError;
use crate::registry::Registry;

/// Routes requests between named participants.
///
/// The hub holds only `Weak` references: a participant that has been
/// dropped is treated as unregistered. All methods take `&self`, so
/// participants can hold an `Rc<DispatchHub>` and call back into it from
/// their handlers.
pub struct DispatchHub {
    participants: RefCell<Registry<Weak<dyn RequestHandler>>>,
    /// Recipients of the requests currently being handled, outermost first.
    in_flight: RefCell<Vec<String>>,
    config: DispatchConfig,
}

impl DispatchHub {
    /// Create a hub with the default dispatch config.
    pub fn new() -> Self {
        Self::with_config(DispatchConfig::default())
    }

    /// Create a hub with an explicit dispatch config.
    ///
    /// A `max_depth` of 0 would refuse every request; it is raised to 1.
    pub fn with_config(mut config: DispatchConfig) -> Self {
        if config.max_depth == 0 {
            log::warn!("DispatchHub: max_depth 0 would refuse every request, using 1");
            config.max_depth = 1;
        }
        Self {
            participants: RefCell::new(Registry::new()),
            in_flight: RefCell::new(Vec::new()),
            config,
        }
    }

    /// The config this hub was built with.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Register a participant under `name`.
    ///
    /// Replaces any participant previously registered under that name. The
    /// displaced participant is not notified.
    pub fn register<P>(&self, name: impl Into<String>, participant: &Rc<P>)
    where
        P: RequestHandler + 'static,
    {
        let weak: Weak<P> = Rc::downgrade(participant);
        self.register_weak(name, weak);
    }

    /// Register an already type-erased participant.
    pub fn register_dyn(&self, name: impl Into<String>, participant: &Rc<dyn RequestHandler>) {
        self.register_weak(name, Rc::downgrade(participant));
    }

    fn register_weak(&self, name: impl Into<String>, weak: Weak<dyn RequestHandler>) {
        let name = name.into();
        let displaced = self.participants.borrow_mut().insert(name.clone(), weak);
        if displaced.is_some() {
            log::debug!("DispatchHub: participant '{}' replaced", name);
        } else {
            log::debug!("DispatchHub: participant '{}' registered", name);
        }
    }

    /// Remove a participant. Returns `true` if a live participant was removed.
    pub fn unregister(&self, name: &str) -> bool {
        match self.participants.borrow_mut().remove(name) {
            Some(weak) => weak.strong_count() > 0,
            None => false,
        }
    }

    /// Check if a live participant is registered under `name`.
    pub fn is_registered(&self, name: &str) -> bool {
        self.participants
            .borrow()
            .get(name)
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Number of registry entries (including ones whose participant has
    /// been dropped but not yet pruned).
    pub fn len(&self) -> usize {
        self.participants.borrow().len()
    }

    /// Check if no participant is registered.
    pub fn is_empty(&self) -> bool {
        self.participants.borrow().is_empty()
    }

    /// Sorted names of the live participants.
    pub fn participant_names(&self) -> Vec<String> {
        let participants = self.participants.borrow();
        participants
            .keys()
            .into_iter()
            .filter(|name| {
                participants
                    .get(name)
                    .is_some_and(|weak| weak.strong_count() > 0)
            })
            .collect()
    }

    /// Drop registry entries whose participant no longer exists.
    /// Returns the number of entries removed.
    pub fn prune(&self) -> usize {
        let mut participants = self.participants.borrow_mut();
        let before = participants.len();
        participants.retain(|_, weak| weak.strong_count() > 0);
        before - participants.len()
    }

    /// Current request chain, outermost recipient first.
    pub fn in_flight(&self) -> Vec<String> {
        self.in_flight.borrow().clone()
    }

    /// Route `payload` from `from` to the participant registered as `to`.
    ///
    /// Returns whatever the recipient's handler returns. Fails with
    /// [`DispatchError::RecipientNotFound`] if `to` is unknown or dropped,
    /// and with [`DispatchError::ReentrantDispatch`] if the request would
    /// exceed the depth guard (or, with `reject_cycles`, re-enter a
    /// participant that is already handling a request).
    pub fn send_request(&self, from: &str, to: &str, payload: &Value) -> DispatchResult {
        let receiver = self.lookup(to)?;
        let _frame = self.enter(to)?;

        log::debug!(
            "DispatchHub: routing request from '{}' to '{}' (depth {})",
            from,
            to,
            self.in_flight.borrow().len()
        );

        // No registry borrow is held here; the handler may call back in.
        receiver.handle_request(from, payload)
    }

    fn lookup(&self, name: &str) -> Result<Rc<dyn RequestHandler>, DispatchError> {
        let found = self.participants.borrow().get(name).map(|weak| weak.upgrade());
        match found {
            Some(Some(receiver)) => Ok(receiver),
            Some(None) => {
                log::debug!("DispatchHub: participant '{}' was dropped, pruning", name);
                self.participants.borrow_mut().remove(name);
                Err(DispatchError::RecipientNotFound {
                    recipient: name.to_string(),
                })
            }
            None => Err(DispatchError::RecipientNotFound {
                recipient: name.to_string(),
            }),
        }
    }

    fn enter(&self, to: &str) -> Result<InFlight<'_>, DispatchError> {
        let mut chain = self.in_flight.borrow_mut();
        let too_deep = chain.len() >= self.config.max_depth;
        let cycle = self.config.reject_cycles && chain.iter().any(|name| name == to);

        if too_deep || cycle {
            let mut attempted = chain.clone();
            attempted.push(to.to_string());
            log::warn!(
                "DispatchHub: refusing reentrant request to '{}' ({})",
                to,
                attempted.join(" -> ")
            );
            return Err(DispatchError::ReentrantDispatch {
                depth: attempted.len(),
                chain: attempted,
            });
        }

        chain.push(to.to_string());
        Ok(InFlight { hub: self })
    }
}

impl Default for DispatchHub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DispatchHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchHub")
            .field("participants", &self.participants.borrow().keys())
            .field("in_flight", &self.in_flight.borrow())
            .field("config", &self.config)
            .finish()
    }
}

/// Pops the recipient off the in-flight chain when the handler returns,
/// including on unwind.
struct InFlight<'a> {
    hub: &'a DispatchHub,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.hub.in_flight.borrow_mut().pop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mediator::Request;
    use serde_json::json;
    use std::cell::{Cell, RefCell};

    /// Records every request it receives.
    #[derive(Default)]
    struct Recorder {
        received: RefCell<Vec<(String, Value)>>,
    }

    impl RequestHandler for Recorder {
        fn handle_request(&self, from: &str, payload: &Value) -> DispatchResult {
            self.received
                .borrow_mut()
                .push((from.to_string(), payload.clone()));
            Ok(None)
        }
    }

    /// Forwards every request to `next`, tagging itself as the sender.
    struct Forwarder {
        me: String,
        next: String,
        hub: Rc<DispatchHub>,
        calls: Cell<usize>,
    }

    impl RequestHandler for Forwarder {
        fn handle_request(&self, _from: &str, payload: &Value) -> DispatchResult {
            self.calls.set(self.calls.get() + 1);
            self.hub.send_request(&self.me, &self.next, payload)
        }
    }

    struct Failing;

    impl RequestHandler for Failing {
        fn handle_request(&self, _from: &str, _payload: &Value) -> DispatchResult {
            Err(DispatchError::handler("failing", "out of microphones"))
        }
    }

    #[test]
    fn test_routes_to_recipient_only() {
        let hub = DispatchHub::new();
        let speaker = Rc::new(Recorder::default());
        let service = Rc::new(Recorder::default());
        hub.register("speaker", &speaker);
        hub.register("service", &service);

        let payload = json!({"type": "Microphone", "content": "AX-270"});
        let reply = hub.send_request("speaker", "service", &payload).unwrap();

        assert!(reply.is_none());
        assert_eq!(
            *service.received.borrow(),
            vec![("speaker".to_string(), payload)]
        );
        assert!(speaker.received.borrow().is_empty());
    }

    #[test]
    fn test_returns_handler_reply() {
        let hub = DispatchHub::new();
        let echo = Rc::new(|from: &str, payload: &Value| -> DispatchResult {
            Ok(Some(json!({"from": from, "payload": payload})))
        });
        hub.register("echo", &echo);

        let reply = hub.send_request("a", "echo", &json!(42)).unwrap();
        assert_eq!(reply, Some(json!({"from": "a", "payload": 42})));
    }

    #[test]
    fn test_unregistered_recipient() {
        let hub = DispatchHub::new();
        let err = hub.send_request("speaker", "nobody", &json!(null)).unwrap_err();
        assert_eq!(
            err,
            DispatchError::RecipientNotFound {
                recipient: "nobody".into()
            }
        );
    }

    #[test]
    fn test_register_last_write_wins() {
        let hub = DispatchHub::new();
        let first = Rc::new(Recorder::default());
        let second = Rc::new(Recorder::default());
        hub.register("service", &first);
        hub.register("service", &second);

        hub.send_request("speaker", "service", &json!("hello")).unwrap();

        assert!(first.received.borrow().is_empty());
        assert_eq!(second.received.borrow().len(), 1);
        assert_eq!(hub.len(), 1);
    }

    #[test]
    fn test_dropped_participant_not_found() {
        let hub = DispatchHub::new();
        {
            let temp = Rc::new(Recorder::default());
            hub.register("temp", &temp);
            assert!(hub.is_registered("temp"));
        }
        assert!(!hub.is_registered("temp"));

        let err = hub.send_request("a", "temp", &json!(1)).unwrap_err();
        assert!(matches!(err, DispatchError::RecipientNotFound { .. }));
        // The dead entry is pruned on lookup.
        assert!(hub.is_empty());
    }

    #[test]
    fn test_unregister_and_prune() {
        let hub = DispatchHub::new();
        let kept = Rc::new(Recorder::default());
        hub.register("kept", &kept);
        assert!(hub.unregister("kept"));
        assert!(!hub.unregister("kept"));

        hub.register("kept", &kept);
        {
            let gone = Rc::new(Recorder::default());
            hub.register("gone", &gone);
        }
        assert_eq!(hub.len(), 2);
        assert_eq!(hub.participant_names(), vec!["kept".to_string()]);
        assert_eq!(hub.prune(), 1);
        assert_eq!(hub.len(), 1);
    }

    #[test]
    fn test_handler_can_redispatch() {
        let hub = Rc::new(DispatchHub::new());
        let sink = Rc::new(Recorder::default());
        let relay = Rc::new(Forwarder {
            me: "relay".into(),
            next: "sink".into(),
            hub: Rc::clone(&hub),
            calls: Cell::new(0),
        });
        hub.register("sink", &sink);
        hub.register("relay", &relay);

        hub.send_request("origin", "relay", &json!("ping")).unwrap();

        assert_eq!(relay.calls.get(), 1);
        assert_eq!(
            *sink.received.borrow(),
            vec![("relay".to_string(), json!("ping"))]
        );
        assert!(hub.in_flight().is_empty());
    }

    #[test]
    fn test_self_loop_hits_depth_guard() {
        let hub = Rc::new(DispatchHub::with_config(DispatchConfig {
            max_depth: 5,
            reject_cycles: false,
        }));
        let looper = Rc::new(Forwarder {
            me: "looper".into(),
            next: "looper".into(),
            hub: Rc::clone(&hub),
            calls: Cell::new(0),
        });
        hub.register("looper", &looper);

        let err = hub.send_request("origin", "looper", &json!(0)).unwrap_err();

        match err {
            DispatchError::ReentrantDispatch { depth, chain } => {
                assert_eq!(depth, 6);
                assert_eq!(chain.len(), 6);
                assert!(chain.iter().all(|name| name == "looper"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(looper.calls.get(), 5);
        // The chain unwinds cleanly; the hub is usable again.
        assert!(hub.in_flight().is_empty());
    }

    #[test]
    fn test_reject_cycles() {
        let hub = Rc::new(DispatchHub::with_config(DispatchConfig {
            max_depth: 32,
            reject_cycles: true,
        }));
        let a = Rc::new(Forwarder {
            me: "a".into(),
            next: "b".into(),
            hub: Rc::clone(&hub),
            calls: Cell::new(0),
        });
        let b = Rc::new(Forwarder {
            me: "b".into(),
            next: "a".into(),
            hub: Rc::clone(&hub),
            calls: Cell::new(0),
        });
        hub.register("a", &a);
        hub.register("b", &b);

        let err = hub.send_request("origin", "a", &json!(0)).unwrap_err();
        assert_eq!(
            err,
            DispatchError::ReentrantDispatch {
                depth: 3,
                chain: vec!["a".into(), "b".into(), "a".into()],
            }
        );
        assert_eq!(a.calls.get(), 1);
        assert_eq!(b.calls.get(), 1);
    }

    #[test]
    fn test_handler_error_propagates() {
        let hub = DispatchHub::new();
        let failing = Rc::new(Failing);
        hub.register("failing", &failing);

        let err = hub.send_request("a", "failing", &json!(null)).unwrap_err();
        assert_eq!(err, DispatchError::handler("failing", "out of microphones"));
        assert!(hub.in_flight().is_empty());
    }

    #[test]
    fn test_payload_is_opaque() {
        let hub = DispatchHub::new();
        let sink = Rc::new(Recorder::default());
        hub.register("sink", &sink);

        // Neither a Request-shaped payload nor an object: routed unchanged.
        hub.send_request("a", "sink", &json!([1, 2, 3])).unwrap();
        hub.send_request("a", "sink", &Request::new("Cable", 3).to_value())
            .unwrap();

        let received = sink.received.borrow();
        assert_eq!(received[0].1, json!([1, 2, 3]));
        assert_eq!(received[1].1, json!({"type": "Cable", "content": 3}));
    }

    #[test]
    fn test_zero_depth_is_raised_to_one() {
        let hub = DispatchHub::with_config(DispatchConfig {
            max_depth: 0,
            reject_cycles: false,
        });
        assert_eq!(hub.config().max_depth, 1);

        let sink = Rc::new(Recorder::default());
        hub.register("sink", &sink);
        assert!(hub.send_request("a", "sink", &json!(1)).is_ok());
    }

    #[test]
    fn test_in_flight_unwinds_after_handler_panic() {
        let hub = DispatchHub::new();
        let panicking = Rc::new(|_from: &str, _payload: &Value| -> DispatchResult {
            panic!("feedback loop on stage");
        });
        hub.register("panicking", &panicking);

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            hub.send_request("a", "panicking", &json!(null))
        }));

        assert!(outcome.is_err());
        assert!(hub.in_flight().is_empty());
        // The hub still routes after the unwind.
        let sink = Rc::new(Recorder::default());
        hub.register("sink", &sink);
        assert!(hub.send_request("a", "sink", &json!(1)).is_ok());
    }

    #[test]
    fn test_register_dyn() {
        let hub = DispatchHub::new();
        let recorder: Rc<dyn RequestHandler> = Rc::new(Recorder::default());
        hub.register_dyn("recorder", &recorder);
        assert!(hub.is_registered("recorder"));
        assert!(hub.send_request("a", "recorder", &json!(1)).is_ok());
    }
}
