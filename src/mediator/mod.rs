//! Mediator: a dispatch hub routing requests between named participants.
//!
//! Participants never hold references to each other. They register with a
//! [`DispatchHub`] and address peers by name through
//! [`DispatchHub::send_request`].
//!
//! # Reentrancy
//!
//! A handler may send new requests through the same hub, including back to
//! the participant that sent it the request. The hub bounds such chains
//! with [`DispatchConfig::max_depth`](crate::config::DispatchConfig) and
//! reports [`DispatchError::ReentrantDispatch`](crate::errors::DispatchError)
//! instead of recursing until the stack overflows.

pub mod hub;
pub mod participant;

pub use hub::DispatchHub;
pub use participant::{DispatchResult, Request, RequestHandler};
