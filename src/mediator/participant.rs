//! Participant capability and the conventional request shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DispatchError;

/// Result type for request handlers and for [`DispatchHub::send_request`].
///
/// `Ok(None)` is a fire-and-forget handler; `Ok(Some(v))` is a reply that
/// the hub hands back to the sender unchanged.
///
/// [`DispatchHub::send_request`]: super::DispatchHub::send_request
pub type DispatchResult = Result<Option<Value>, DispatchError>;

/// Anything that can receive requests through a [`DispatchHub`](super::DispatchHub).
///
/// # Contract
///
/// - The hub calls `handle_request` synchronously on the caller's thread.
/// - `from` is the sender name exactly as passed to `send_request`.
/// - The handler MAY call back into the hub (reply, forward). Chains are
///   bounded by the hub's depth guard.
/// - Handlers take `&self`; participants that keep state use interior
///   mutability (`RefCell`, `Cell`, or an [`Intercepted`](crate::interception::Intercepted)
///   store behind a `RefCell`).
pub trait RequestHandler {
    /// Handle a request sent by `from`.
    fn handle_request(&self, from: &str, payload: &Value) -> DispatchResult;
}

impl<F> RequestHandler for F
where
    F: Fn(&str, &Value) -> DispatchResult,
{
    fn handle_request(&self, from: &str, payload: &Value) -> DispatchResult {
        self(from, payload)
    }
}

/// The `{type, content}` request shape participants conventionally exchange.
///
/// The hub never looks at payloads; this type only saves participants from
/// hand-building JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: Value,
}

impl Request {
    /// Create a request of the given kind.
    pub fn new(kind: impl Into<String>, content: impl Into<Value>) -> Self {
        Self {
            kind: kind.into(),
            content: content.into(),
        }
    }

    /// Convert into a payload for `send_request`.
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "type": self.kind, "content": self.content })
    }

    /// Read a payload back as a `Request`, if it has the conventional shape.
    pub fn from_value(payload: &Value) -> Option<Self> {
        Self::deserialize(payload).ok()
    }
}

impl From<Request> for Value {
    fn from(request: Request) -> Self {
        request.to_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_to_value() {
        let request = Request::new("Microphone", "AX-270");
        assert_eq!(
            request.to_value(),
            json!({"type": "Microphone", "content": "AX-270"})
        );
    }

    #[test]
    fn test_request_from_value() {
        let payload = json!({"type": "Microphone", "content": "AX-270"});
        let request = Request::from_value(&payload).unwrap();
        assert_eq!(request.kind, "Microphone");
        assert_eq!(request.content, json!("AX-270"));

        assert!(Request::from_value(&json!({"content": "no type"})).is_none());
        assert!(Request::from_value(&json!("plain string")).is_none());
    }

    #[test]
    fn test_closure_handler() {
        let handler = |from: &str, payload: &Value| -> DispatchResult {
            Ok(Some(json!({"from": from, "echo": payload})))
        };
        let reply = handler.handle_request("speaker", &json!(1)).unwrap();
        assert_eq!(reply, Some(json!({"from": "speaker", "echo": 1})));
    }
}
