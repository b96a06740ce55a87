//! Observer: a topic-keyed notification bus.
//!
//! Event sources call [`NotificationBus::notify`] without knowing who is
//! listening; any number of [`Listener`]s react to each topic.

pub mod bus;
pub mod listener;

pub use bus::NotificationBus;
pub use listener::{Listener, ListenerId, ListenerResult};
