//! Error types for the protocol core.

use thiserror::Error;

use crate::session::SessionPhase;
use crate::spec::Version;

/// Result alias for protocol-level operations.
pub type Result<T> = std::result::Result<T, StompError>;

/// Failures discovered while decoding wire bytes.
///
/// Any of these poisons the [`Parser`](crate::parser::Parser); it must be
/// `reset()` before it will accept further input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    #[error("header line without ':' separator: {0:?}")]
    MalformedHeader(String),

    #[error("invalid escape sequence {0:?} in STOMP {1}")]
    BadEscape(String, Version),

    #[error("unescaped ':' in header value (STOMP {0})")]
    RawColon(Version),

    #[error("bare carriage return outside CR LF")]
    BareCarriageReturn,

    #[error("invalid content-length: {0:?}")]
    InvalidContentLength(String),

    #[error("byte after {0}-byte body is not NUL")]
    MissingNulTerminator(usize),

    #[error("frame exceeds maximum size of {0} bytes")]
    FrameTooLarge(usize),

    #[error("frame exceeds maximum of {0} headers")]
    TooManyHeaders(usize),

    #[error("line exceeds maximum length of {0} bytes")]
    LineTooLong(usize),

    #[error("command or header is not valid UTF-8")]
    InvalidUtf8,

    #[error("parser is poisoned; reset it before feeding more bytes")]
    Poisoned,
}

/// Protocol-level errors returned synchronously by the commands layer and
/// the session state machine.
///
/// `ERROR` frames from the broker are *not* represented here; they surface
/// as [`SessionEvent::ErrorReceived`](crate::session::SessionEvent) data.
#[derive(Error, Debug)]
pub enum StompError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation '{operation}' not permitted in phase {phase:?}")]
    State {
        operation: &'static str,
        phase: SessionPhase,
    },

    #[error("no common protocol version: accepted {accepted:?}, server offered {offered:?}")]
    Negotiation {
        accepted: Vec<Version>,
        offered: String,
    },

    #[error("unknown subscription: {0:?}")]
    UnknownSubscription(String),

    #[error("unknown transaction: {0:?}")]
    UnknownTransaction(String),

    #[error("{command} not supported in STOMP {version}")]
    Unsupported { command: String, version: Version },

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("cannot handle {0} frame")]
    UnexpectedFrame(String),
}
