//! commlink - vendor-portable real-time communication SDK
//!
//! The crate is organized around a prioritized, backpressured message
//! processing pipeline ([`pipeline`]) that routes structured messages through
//! independently registered processors. Around it sit the vendor abstraction
//! boundary ([`provider`]), the session facade ([`session`]) and an
//! in-process event notification system ([`notifications`]).
//!
//! Nothing in this crate opens sockets or persists state; vendor transports
//! are supplied by the host application behind
//! [`provider::CommunicationProvider`].

pub mod core;
pub mod notifications;
pub mod pipeline;
pub mod provider;
pub mod session;
