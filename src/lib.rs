//! Transport-agnostic STOMP 1.0/1.1/1.2 protocol core.
//!
//! The crate implements the protocol semantics of a STOMP client without
//! opening sockets, scheduling timers or spawning tasks:
//!
//! - [`Frame`]: the frame value type and its versioned wire rendering.
//! - [`Parser`]: an incremental, byte-fed frame parser with explicit
//!   states and configurable bounds.
//! - [`StompCodec`]: the `tokio_util::codec` adapter transports plug into.
//! - [`commands`]: stateless per-version frame constructors/validators.
//! - [`Session`]: the endpoint state machine — handshake and version
//!   negotiation, heart-beat parameters, subscriptions with replay,
//!   transactions, receipt correlation, server-frame dispatch.
//! - [`FailoverUri`]: `failover:(...)` URIs producing a reconnect
//!   schedule of `(endpoint, delay)` pairs.
//!
//! Drivers (sync TCP, async event loop, tests) own the I/O and feed bytes
//! and frames in; the core hands frames and events back.

pub mod codec;
pub mod commands;
pub mod error;
pub mod failover;
pub mod frame;
pub mod parser;
pub mod session;
pub mod spec;
pub mod subscription;

pub use codec::StompCodec;
pub use commands::{ConnectedInfo, SubscriptionToken};
pub use error::{ParseError, Result, StompError};
pub use failover::{BrokerUri, Failover, FailoverError, FailoverOptions, FailoverUri, Scheme};
pub use frame::Frame;
pub use parser::{Parser, ParserConfig, StompItem};
pub use session::{
    ConnectRequest, ReceiptRequest, Session, SessionEvent, SessionPhase, SubscribeRequest, Token,
};
pub use spec::{AckMode, Version};
pub use subscription::{FailurePolicy, SubscriptionEntry};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke_frame_render() {
        let frame = Frame::new("CONNECT")
            .header("accept-version", "1.2")
            .set_body(b"hello".to_vec());
        let wire = frame.render(Version::V1_2);
        assert!(wire.starts_with(b"CONNECT\n"));
        assert!(wire.ends_with(b"hello\0"));
    }
}
