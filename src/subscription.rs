//! Subscription bookkeeping data.

use crate::frame::Frame;
use crate::session::Token;
use crate::spec::{header, AckMode};

/// What the driver should do when a message handed to the application
/// cannot be handled.
///
/// The session only stores and surfaces this as data on every
/// [`MessageReceived`](crate::session::SessionEvent::MessageReceived)
/// event; acting on it is the driver's job.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Drop the connection.
    #[default]
    Disconnect,
    /// Re-publish the failed message to the given destination.
    Forward(String),
    /// Application-defined handling, keyed by a caller token.
    Custom(Token),
}

/// One active subscription of a [`Session`](crate::session::Session).
///
/// The entry holds everything needed to re-emit an identical SUBSCRIBE
/// frame after a forced reconnect: the id, destination, ack mode and any
/// extra headers the caller supplied. `token` is caller-opaque; the core
/// never inspects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionEntry {
    pub id: String,
    pub destination: String,
    pub ack: AckMode,
    /// Extra headers beyond `id`, `destination` and `ack`.
    pub headers: Vec<(String, String)>,
    pub token: Token,
    pub policy: FailurePolicy,
}

impl SubscriptionEntry {
    /// Build the SUBSCRIBE frame for this entry.
    ///
    /// Used both for the original subscription and for replay, so the
    /// replayed frame is byte-identical to the original (minus any receipt
    /// header, which is never replayed).
    pub fn to_subscribe_frame(&self) -> Frame {
        let mut frame = Frame::new(crate::spec::SUBSCRIBE)
            .header(header::ID, &self.id)
            .header(header::DESTINATION, &self.destination)
            .header(header::ACK, self.ack.as_str());
        for (k, v) in &self.headers {
            frame = frame.header(k, v);
        }
        frame
    }
}
