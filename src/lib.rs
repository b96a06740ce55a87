//! # relay
//!
//! In-process indirect communication between units of one program.
//!
//! Three independent mechanisms, all synchronous and single-threaded:
//!
//! - [`mediator`]: a [`DispatchHub`] routing requests between named
//!   participants, so no participant references another directly.
//! - [`observer`]: a [`NotificationBus`] delivering topic events to every
//!   subscribed [`Listener`] in subscription order.
//! - [`interception`]: an [`Intercepted`] wrapper that computes derived
//!   attributes and gates writes on a plain [`AttributeStore`].
//!
//! They compose freely: a participant's handler may publish on a bus, and
//! its state may live behind an interception layer (see
//! [`demos::conference`]).

pub mod config;
pub mod demos;
pub mod errors;
pub mod interception;
pub mod mediator;
pub mod observer;
pub mod registry;

pub use config::RelayConfig;
pub use errors::{
    ConfigError, DispatchError, ListenerError, ListenerFailure, NotifyError, ValidationRejected,
};
pub use interception::{AttributeStore, InterceptPolicy, Intercepted, SetAction};
pub use mediator::{DispatchHub, DispatchResult, Request, RequestHandler};
pub use observer::{Listener, NotificationBus};
pub use registry::Registry;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
