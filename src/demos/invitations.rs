//! Conference invitations: independent listeners react to "invite" and
//! "accept" events without the organiser knowing who is listening.

use std::rc::Rc;

use serde_json::{json, Value};

use super::Transcript;
use crate::config::RelayConfig;
use crate::errors::NotifyError;
use crate::observer::{Listener, NotificationBus};

pub const INVITE: &str = "invite";
pub const ACCEPT: &str = "accept";

fn person(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn transcribing(name: &str, transcript: &Transcript, render: fn(&str) -> String) -> Listener {
    let transcript = Rc::clone(transcript);
    Listener::infallible(name, move |data| {
        let line = render(&person(data));
        log::info!("{}", line);
        transcript.borrow_mut().push(line);
    })
}

/// Phone the invitee.
pub fn call(transcript: &Transcript) -> Listener {
    transcribing("call", transcript, |p| format!("☎️ Call {p}"))
}

/// Email the invitee a reminder.
pub fn send_email(transcript: &Transcript) -> Listener {
    transcribing("send_email", transcript, |p| {
        format!("✉️ Send email to {p}. Subject: Conference reminder")
    })
}

/// Note the acceptance.
pub fn record_accept(transcript: &Transcript) -> Listener {
    transcribing("record_accept", transcript, |p| {
        format!("✅ {p} has accepted invitation")
    })
}

/// Prepare a welcome gift.
pub fn prepare_gift(transcript: &Transcript) -> Listener {
    transcribing("prepare_gift", transcript, |p| {
        format!("🎁 A gift has been prepared for {p}")
    })
}

/// Run the invitation scenario for `invitee`.
pub fn run_for(invitee: &str, config: &RelayConfig) -> Result<Vec<String>, NotifyError> {
    let transcript = Transcript::default();
    let events = NotificationBus::with_config(config.notify.clone());

    events.subscribe(INVITE, &call(&transcript));
    events.subscribe(INVITE, &send_email(&transcript));
    events.notify(INVITE, &json!(invitee))?;

    events.subscribe(ACCEPT, &record_accept(&transcript));
    events.subscribe(ACCEPT, &prepare_gift(&transcript));
    events.notify(ACCEPT, &json!(invitee))?;

    let lines = transcript.borrow().clone();
    Ok(lines)
}

/// Run the invitation scenario for Alice.
pub fn run(config: &RelayConfig) -> Result<Vec<String>, NotifyError> {
    run_for("Alice", config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_transcript() {
        assert_eq!(
            run(&RelayConfig::default()).unwrap(),
            vec![
                "☎️ Call Alice".to_string(),
                "✉️ Send email to Alice. Subject: Conference reminder".to_string(),
                "✅ Alice has accepted invitation".to_string(),
                "🎁 A gift has been prepared for Alice".to_string(),
            ]
        );
    }

    #[test]
    fn test_declined_call_does_not_block_email() {
        let transcript = Transcript::default();
        let events = NotificationBus::new();
        events.subscribe(INVITE, &Listener::new("call", |_| Err("no answer".into())));
        events.subscribe(INVITE, &send_email(&transcript));

        let err = events.notify(INVITE, &json!("Bob")).unwrap_err();

        assert_eq!(err.failures.len(), 1);
        assert_eq!(
            *transcript.borrow(),
            vec!["✉️ Send email to Bob. Subject: Conference reminder".to_string()]
        );
    }

    #[test]
    fn test_unsubscribed_gift_is_skipped() {
        let transcript = Transcript::default();
        let events = NotificationBus::new();
        let gift = prepare_gift(&transcript);
        events.subscribe(ACCEPT, &record_accept(&transcript));
        events.subscribe(ACCEPT, &gift);
        events.unsubscribe(ACCEPT, &gift);

        events.notify(ACCEPT, &json!("Carol")).unwrap();
        assert_eq!(
            *transcript.borrow(),
            vec!["✅ Carol has accepted invitation".to_string()]
        );
    }
}
