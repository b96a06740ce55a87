//! Conference coordinator: a speaker and the venue service talk only
//! through a [`DispatchHub`].
//!
//! The service keeps its microphone stock in an [`Intercepted`] store that
//! refuses to go below zero, and announces each assignment on a
//! [`NotificationBus`].

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{json, Value};

use super::Transcript;
use crate::config::{InterceptionConfig, RelayConfig};
use crate::errors::DispatchError;
use crate::interception::{AttributeStore, Intercepted, LowerBound};
use crate::mediator::{DispatchHub, DispatchResult, Request, RequestHandler};
use crate::observer::NotificationBus;

/// Topic the service publishes when it hands out a microphone.
pub const MICROPHONE_ASSIGNED: &str = "microphone-assigned";

const STOCK_KEY: &str = "microphones";

/// Render a request the way both parties log it.
fn describe(from: &str, payload: &Value) -> String {
    match Request::from_value(payload) {
        Some(request) => {
            let content = match &request.content {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("From {from}. Request for {}. Content {content}", request.kind)
        }
        None => format!("From {from}. Payload {payload}"),
    }
}

/// The speaker on stage.
pub struct Speaker {
    hub: Rc<DispatchHub>,
    transcript: Transcript,
}

impl Speaker {
    pub const NAME: &'static str = "speaker";

    pub fn new(hub: Rc<DispatchHub>, transcript: Transcript) -> Self {
        Self { hub, transcript }
    }

    /// Ask the service for a microphone.
    pub fn request_mic(&self, model: &str) -> DispatchResult {
        self.hub.send_request(
            Self::NAME,
            Service::NAME,
            &Request::new("Microphone", model).to_value(),
        )
    }
}

impl RequestHandler for Speaker {
    fn handle_request(&self, from: &str, payload: &Value) -> DispatchResult {
        let line = describe(from, payload);
        log::info!("[{}] {}", Self::NAME, line);
        self.transcript.borrow_mut().push(line);
        Ok(None)
    }
}

/// The venue service desk.
pub struct Service {
    hub: Rc<DispatchHub>,
    bus: Rc<NotificationBus>,
    stock: RefCell<Intercepted<LowerBound>>,
    transcript: Transcript,
}

impl Service {
    pub const NAME: &'static str = "service";

    pub fn new(
        hub: Rc<DispatchHub>,
        bus: Rc<NotificationBus>,
        microphones: u32,
        transcript: Transcript,
    ) -> Self {
        Self::with_config(hub, bus, microphones, transcript, InterceptionConfig::default())
    }

    /// Like [`new`](Self::new), with an explicit config for the stock layer.
    pub fn with_config(
        hub: Rc<DispatchHub>,
        bus: Rc<NotificationBus>,
        microphones: u32,
        transcript: Transcript,
        config: InterceptionConfig,
    ) -> Self {
        let mut store = AttributeStore::new();
        store.set(STOCK_KEY, microphones);
        let stock = Intercepted::with_config(store, LowerBound::new(STOCK_KEY, 0.0), config);
        Self {
            hub,
            bus,
            stock: RefCell::new(stock),
            transcript,
        }
    }

    /// Microphones still on the shelf.
    pub fn microphones_left(&self) -> i64 {
        self.stock
            .borrow()
            .target()
            .get(STOCK_KEY)
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }

    /// Tell the speaker their microphone is ready.
    pub fn respond_mic(&self, model: &str) -> DispatchResult {
        self.hub.send_request(
            Self::NAME,
            Speaker::NAME,
            &Request::new("Microphone", format!("Has provide speaker {model} mic")).to_value(),
        )
    }

    fn take_microphone(&self) -> bool {
        let remaining = self.microphones_left() - 1;
        self.stock.borrow_mut().set(STOCK_KEY, remaining)
    }
}

impl RequestHandler for Service {
    fn handle_request(&self, from: &str, payload: &Value) -> DispatchResult {
        let line = describe(from, payload);
        log::info!("[{}] {}", Self::NAME, line);
        self.transcript.borrow_mut().push(line);

        let Some(request) = Request::from_value(payload) else {
            return Ok(None);
        };
        if request.kind != "Microphone" {
            return Ok(None);
        }

        if !self.take_microphone() {
            return Err(DispatchError::handler(Self::NAME, "no microphones left"));
        }

        let assignment = json!({ "to": from, "model": request.content });
        if let Err(err) = self.bus.notify(MICROPHONE_ASSIGNED, &assignment) {
            log::warn!("[{}] {}", Self::NAME, err);
        }
        Ok(Some(assignment))
    }
}

/// Run the coordinator scenario: the speaker requests a mic, the service
/// answers.
pub fn run(config: &RelayConfig) -> Result<Vec<String>, DispatchError> {
    let transcript = Transcript::default();
    let hub = Rc::new(DispatchHub::with_config(config.dispatch.clone()));
    let bus = Rc::new(NotificationBus::with_config(config.notify.clone()));

    let speaker = Rc::new(Speaker::new(Rc::clone(&hub), Rc::clone(&transcript)));
    let service = Rc::new(Service::with_config(
        Rc::clone(&hub),
        Rc::clone(&bus),
        1,
        Rc::clone(&transcript),
        config.interception.clone(),
    ));

    hub.register(Speaker::NAME, &speaker);
    hub.register(Service::NAME, &service);

    speaker.request_mic("AX-270")?;
    service.respond_mic("AX-270")?;

    let lines = transcript.borrow().clone();
    Ok(lines)
}
