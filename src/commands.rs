//! Stateless constructors and validators for every STOMP frame.
//!
//! Each function builds or checks one frame against the header and body
//! rules of a given protocol version, without touching any connection
//! state. The [`Session`](crate::session::Session) is layered on top of
//! these, but they are usable on their own for hand-rolled clients.

use std::collections::HashSet;

use crate::error::StompError;
use crate::frame::Frame;
use crate::parser::StompItem;
use crate::spec::{self, header, Version};

/// Correlation token produced by [`subscribe`] and [`message`].
///
/// From 1.1 on every subscription is identified by its `id` header; in
/// 1.0 a subscription opened without an id is identified by its
/// destination instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubscriptionToken {
    Id(String),
    Destination(String),
}

/// Everything a CONNECTED frame tells the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedInfo {
    /// Protocol version the broker settled on.
    pub version: Version,
    /// `server` header (1.1+), the broker's product identity.
    pub server: Option<String>,
    /// `session` header, the broker-assigned session identifier.
    pub session_id: Option<String>,
    /// Broker heart-beat capabilities `(sx, sy)` in milliseconds.
    pub heart_beat: (u64, u64),
}

// --- outgoing frames ---------------------------------------------------

/// Create a CONNECT frame.
///
/// For accept lists beyond plain 1.0 the `accept-version` and `host`
/// headers are mandatory and `host` must be supplied by the caller; the
/// heart-beat header is only legal beyond 1.0.
pub fn connect(
    login: Option<&str>,
    passcode: Option<&str>,
    headers: &[(String, String)],
    versions: &[Version],
    host: Option<&str>,
    heart_beat: Option<(u64, u64)>,
) -> Result<Frame, StompError> {
    build_connect(spec::CONNECT, login, passcode, headers, versions, host, heart_beat)
}

/// Create a STOMP frame: synonymous to [`connect`], but only legal when
/// the accept list goes beyond 1.0.
pub fn stomp(
    login: Option<&str>,
    passcode: Option<&str>,
    headers: &[(String, String)],
    versions: &[Version],
    host: Option<&str>,
    heart_beat: Option<(u64, u64)>,
) -> Result<Frame, StompError> {
    if normalize_versions(versions) == [Version::V1_0] {
        return Err(StompError::Unsupported {
            command: spec::STOMP.to_string(),
            version: Version::V1_0,
        });
    }
    build_connect(spec::STOMP, login, passcode, headers, versions, host, heart_beat)
}

fn build_connect(
    command: &str,
    login: Option<&str>,
    passcode: Option<&str>,
    headers: &[(String, String)],
    versions: &[Version],
    host: Option<&str>,
    heart_beat: Option<(u64, u64)>,
) -> Result<Frame, StompError> {
    let versions = normalize_versions(versions);
    let mut frame = Frame::new(command);
    if let Some(login) = login {
        frame = frame.header(header::LOGIN, login);
    }
    if let Some(passcode) = passcode {
        frame = frame.header(header::PASSCODE, passcode);
    }
    if versions != [Version::V1_0] {
        let accept = versions
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(",");
        frame = frame.header(header::ACCEPT_VERSION, accept);
        let host = host.ok_or_else(|| {
            StompError::InvalidHeader(
                "host header is mandatory when accepting versions beyond 1.0".to_string(),
            )
        })?;
        frame = frame.header(header::HOST, host);
    }
    if let Some((cx, cy)) = heart_beat {
        if versions == [Version::V1_0] {
            return Err(StompError::Unsupported {
                command: "heart-beat".to_string(),
                version: Version::V1_0,
            });
        }
        frame = frame.header(header::HEART_BEAT, format!("{},{}", cx, cy));
    }
    for (k, v) in headers {
        frame = frame.header(k, v);
    }
    Ok(frame)
}

/// Create a DISCONNECT frame, optionally requesting a receipt so the
/// socket can be closed only after the broker confirmed.
pub fn disconnect(receipt: Option<&str>) -> Frame {
    with_receipt(Frame::new(spec::DISCONNECT), receipt)
}

/// Create a SEND frame.
pub fn send(
    destination: &str,
    body: impl Into<Vec<u8>>,
    headers: &[(String, String)],
    receipt: Option<&str>,
) -> Frame {
    let mut frame = Frame::new(spec::SEND).header(header::DESTINATION, destination);
    for (k, v) in headers {
        frame = frame.header(k, v);
    }
    with_receipt(frame, receipt).set_body(body)
}

/// Create a SUBSCRIBE frame and the token later MESSAGE frames and
/// UNSUBSCRIBE are matched with.
///
/// `headers` may carry the `id` header; from 1.1 on it is mandatory.
pub fn subscribe(
    destination: &str,
    headers: &[(String, String)],
    receipt: Option<&str>,
    version: Version,
) -> Result<(Frame, SubscriptionToken), StompError> {
    let mut frame = Frame::new(spec::SUBSCRIBE).header(header::DESTINATION, destination);
    for (k, v) in headers {
        frame = frame.header(k, v);
    }
    let token = match frame.get_header(header::ID) {
        Some(id) => SubscriptionToken::Id(id.to_string()),
        None if version == Version::V1_0 => SubscriptionToken::Destination(destination.to_string()),
        None => {
            return Err(StompError::InvalidHeader(format!(
                "SUBSCRIBE requires an id header in STOMP {}",
                version
            )));
        }
    };
    Ok((with_receipt(frame, receipt), token))
}

/// Create an UNSUBSCRIBE frame from a subscription token.
pub fn unsubscribe(
    token: &SubscriptionToken,
    receipt: Option<&str>,
    version: Version,
) -> Result<Frame, StompError> {
    let frame = match token {
        SubscriptionToken::Id(id) => Frame::new(spec::UNSUBSCRIBE).header(header::ID, id),
        SubscriptionToken::Destination(destination) => {
            if version != Version::V1_0 {
                return Err(StompError::InvalidHeader(format!(
                    "UNSUBSCRIBE requires an id header in STOMP {}",
                    version
                )));
            }
            Frame::new(spec::UNSUBSCRIBE).header(header::DESTINATION, destination)
        }
    };
    Ok(with_receipt(frame, receipt))
}

/// Create an ACK frame for a received MESSAGE frame.
///
/// The `transaction` header is propagated only when the MESSAGE belongs
/// to one of the caller's currently active transactions.
pub fn ack(
    message: &Frame,
    active_transactions: &HashSet<String>,
    receipt: Option<&str>,
    version: Version,
) -> Result<Frame, StompError> {
    let mut frame = Frame::new(spec::ACK);
    for (k, v) in ack_headers(message, active_transactions, version)? {
        frame = frame.header(k, v);
    }
    Ok(with_receipt(frame, receipt))
}

/// Create a NACK frame for a received MESSAGE frame. Not available in
/// STOMP 1.0.
pub fn nack(
    message: &Frame,
    active_transactions: &HashSet<String>,
    receipt: Option<&str>,
    version: Version,
) -> Result<Frame, StompError> {
    if version == Version::V1_0 {
        return Err(StompError::Unsupported {
            command: spec::NACK.to_string(),
            version,
        });
    }
    let mut frame = Frame::new(spec::NACK);
    for (k, v) in ack_headers(message, active_transactions, version)? {
        frame = frame.header(k, v);
    }
    Ok(with_receipt(frame, receipt))
}

/// Per-version acknowledgement headers: 1.0 names the message, 1.1 names
/// message and subscription, 1.2 echoes the server-assigned `ack` id.
fn ack_headers(
    message: &Frame,
    active_transactions: &HashSet<String>,
    version: Version,
) -> Result<Vec<(String, String)>, StompError> {
    check_command(message, spec::MESSAGE)?;
    let mut out = Vec::new();
    match version {
        Version::V1_0 => {
            let id = require_header(message, header::MESSAGE_ID)?;
            out.push((header::MESSAGE_ID.to_string(), id.to_string()));
        }
        Version::V1_1 => {
            let id = require_header(message, header::MESSAGE_ID)?;
            let subscription = require_header(message, header::SUBSCRIPTION)?;
            out.push((header::MESSAGE_ID.to_string(), id.to_string()));
            out.push((header::SUBSCRIPTION.to_string(), subscription.to_string()));
        }
        Version::V1_2 => {
            let id = require_header(message, header::ACK)?;
            out.push((header::ID.to_string(), id.to_string()));
        }
    }
    if let Some(tx) = message.get_header(header::TRANSACTION) {
        if active_transactions.contains(tx) {
            out.push((header::TRANSACTION.to_string(), tx.to_string()));
        }
    }
    Ok(out)
}

/// Attach a receipt request to a frame if one was requested.
fn with_receipt(frame: Frame, receipt: Option<&str>) -> Frame {
    match receipt {
        Some(id) => frame.receipt(id),
        None => frame,
    }
}

/// Create a BEGIN frame.
pub fn begin(transaction: &str, receipt: Option<&str>) -> Frame {
    with_receipt(
        Frame::new(spec::BEGIN).header(header::TRANSACTION, transaction),
        receipt,
    )
}

/// Create a COMMIT frame.
pub fn commit(transaction: &str, receipt: Option<&str>) -> Frame {
    with_receipt(
        Frame::new(spec::COMMIT).header(header::TRANSACTION, transaction),
        receipt,
    )
}

/// Create an ABORT frame.
pub fn abort(transaction: &str, receipt: Option<&str>) -> Frame {
    with_receipt(
        Frame::new(spec::ABORT).header(header::TRANSACTION, transaction),
        receipt,
    )
}

/// Create a heart-beat marker. Not available in STOMP 1.0.
pub fn beat(version: Version) -> Result<StompItem, StompError> {
    if version == Version::V1_0 {
        return Err(StompError::Unsupported {
            command: "heart-beat".to_string(),
            version,
        });
    }
    Ok(StompItem::HeartBeat)
}

// --- incoming frames ---------------------------------------------------

/// Handle a CONNECTED frame against the accept list the CONNECT frame
/// carried.
///
/// The negotiated version is the broker's `version` header, which must be
/// inside the accept list; brokers limited to 1.0 send no such header.
pub fn connected(frame: &Frame, accept_versions: &[Version]) -> Result<ConnectedInfo, StompError> {
    check_command(frame, spec::CONNECTED)?;
    let accept = normalize_versions(accept_versions);
    let highest = accept.last().copied().unwrap_or(Version::V1_0);

    let version = if highest == Version::V1_0 {
        Version::V1_0
    } else {
        let offered = frame.get_header(header::VERSION).unwrap_or("1.0");
        match Version::parse(offered) {
            Some(v) if accept.contains(&v) => v,
            _ => {
                return Err(StompError::Negotiation {
                    accepted: accept,
                    offered: offered.to_string(),
                });
            }
        }
    };

    let server = if version == Version::V1_0 {
        None
    } else {
        frame.get_header(header::SERVER).map(str::to_string)
    };
    let session_id = frame.get_header(header::SESSION).map(str::to_string);
    let heart_beat = if version == Version::V1_0 {
        (0, 0)
    } else {
        match frame.get_header(header::HEART_BEAT) {
            Some(raw) => parse_heart_beat(raw)?,
            None => (0, 0),
        }
    };

    Ok(ConnectedInfo {
        version,
        server,
        session_id,
        heart_beat,
    })
}

/// Handle a MESSAGE frame. Returns the token that matches the message to
/// its subscription.
pub fn message(frame: &Frame, version: Version) -> Result<SubscriptionToken, StompError> {
    check_command(frame, spec::MESSAGE)?;
    require_header(frame, header::MESSAGE_ID)?;
    let destination = require_header(frame, header::DESTINATION)?;
    match frame.get_header(header::SUBSCRIPTION) {
        Some(id) => Ok(SubscriptionToken::Id(id.to_string())),
        None if version == Version::V1_0 => {
            Ok(SubscriptionToken::Destination(destination.to_string()))
        }
        None => Err(StompError::InvalidHeader(format!(
            "MESSAGE requires a subscription header in STOMP {}",
            version
        ))),
    }
}

/// Handle a RECEIPT frame. Returns the receipt id to correlate with the
/// frame that requested it.
pub fn receipt(frame: &Frame) -> Result<&str, StompError> {
    check_command(frame, spec::RECEIPT)?;
    require_header(frame, header::RECEIPT_ID)
}

/// Handle an ERROR frame: nothing to extract, but the command is checked.
pub fn error(frame: &Frame) -> Result<(), StompError> {
    check_command(frame, spec::ERROR)
}

// --- helpers -----------------------------------------------------------

/// Parse a `heart-beat` header value: two comma-separated non-negative
/// integers of milliseconds, `0` meaning "cannot / does not want".
pub fn parse_heart_beat(value: &str) -> Result<(u64, u64), StompError> {
    let mut parts = value.split(',');
    let (Some(a), Some(b), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid_heart_beat(value));
    };
    match (a.trim().parse::<u64>(), b.trim().parse::<u64>()) {
        (Ok(x), Ok(y)) => Ok((x, y)),
        _ => Err(invalid_heart_beat(value)),
    }
}

fn invalid_heart_beat(value: &str) -> StompError {
    StompError::InvalidHeader(format!(
        "heart-beat must be two comma-separated non-negative integers, got {:?}",
        value
    ))
}

/// All protocol versions up to and including `version`, ascending.
pub fn versions_through(version: Version) -> Vec<Version> {
    Version::ALL.iter().copied().filter(|v| *v <= version).collect()
}

/// Sorted, deduplicated accept list; an empty list means plain 1.0.
pub(crate) fn normalize_versions(versions: &[Version]) -> Vec<Version> {
    let mut out: Vec<Version> = versions.to_vec();
    out.sort();
    out.dedup();
    if out.is_empty() {
        out.push(Version::V1_0);
    }
    out
}

fn check_command(frame: &Frame, expected: &str) -> Result<(), StompError> {
    if frame.command == expected {
        Ok(())
    } else {
        Err(StompError::UnexpectedFrame(frame.command.clone()))
    }
}

fn require_header<'a>(frame: &'a Frame, name: &str) -> Result<&'a str, StompError> {
    frame.get_header(name).ok_or_else(|| {
        StompError::InvalidHeader(format!("{} frame requires a {} header", frame.command, name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message() -> Frame {
        Frame::new("MESSAGE")
            .header("message-id", "007")
            .header("destination", "/queue/test")
            .header("subscription", "0")
            .header("ack", "srv-ack-1")
    }

    #[test]
    fn connect_1_0_has_no_accept_version() {
        let frame = connect(Some("guest"), Some("guest"), &[], &[Version::V1_0], None, None)
            .expect("connect");
        assert_eq!(frame.command, "CONNECT");
        assert_eq!(frame.get_header("accept-version"), None);
        assert_eq!(frame.get_header("host"), None);
    }

    #[test]
    fn connect_multi_version_sorts_accept_list() {
        let frame = connect(
            None,
            None,
            &[],
            &[Version::V1_2, Version::V1_0, Version::V1_1],
            Some("earth"),
            Some((4000, 5000)),
        )
        .expect("connect");
        assert_eq!(frame.get_header("accept-version"), Some("1.0,1.1,1.2"));
        assert_eq!(frame.get_header("host"), Some("earth"));
        assert_eq!(frame.get_header("heart-beat"), Some("4000,5000"));
    }

    #[test]
    fn stomp_command_rejected_for_1_0_only() {
        let err = stomp(None, None, &[], &[Version::V1_0], Some("earth"), None).unwrap_err();
        assert!(matches!(err, StompError::Unsupported { .. }));
    }

    #[test]
    fn ack_headers_follow_the_version() {
        let msg = sample_message();
        let none = HashSet::new();

        let v0 = ack(&msg, &none, None, Version::V1_0).expect("1.0");
        assert_eq!(v0.get_header("message-id"), Some("007"));
        assert_eq!(v0.get_header("subscription"), None);

        let v1 = ack(&msg, &none, None, Version::V1_1).expect("1.1");
        assert_eq!(v1.get_header("message-id"), Some("007"));
        assert_eq!(v1.get_header("subscription"), Some("0"));

        let v2 = ack(&msg, &none, None, Version::V1_2).expect("1.2");
        assert_eq!(v2.get_header("id"), Some("srv-ack-1"));
        assert_eq!(v2.get_header("message-id"), None);
    }

    #[test]
    fn nack_is_rejected_in_1_0() {
        let msg = sample_message();
        let err = nack(&msg, &HashSet::new(), None, Version::V1_0).unwrap_err();
        assert!(matches!(err, StompError::Unsupported { .. }));
    }

    #[test]
    fn ack_propagates_only_active_transactions() {
        let msg = sample_message().header("transaction", "tx-1");
        let mut active = HashSet::new();

        let outside = ack(&msg, &active, None, Version::V1_2).expect("ack");
        assert_eq!(outside.get_header("transaction"), None);

        active.insert("tx-1".to_string());
        let inside = ack(&msg, &active, None, Version::V1_2).expect("ack");
        assert_eq!(inside.get_header("transaction"), Some("tx-1"));
    }

    #[test]
    fn connected_negotiates_against_accept_list() {
        let frame = Frame::new("CONNECTED")
            .header("version", "1.1")
            .header("session", "s-42")
            .header("heart-beat", "100,200");
        let info = connected(&frame, &[Version::V1_0, Version::V1_1]).expect("connected");
        assert_eq!(info.version, Version::V1_1);
        assert_eq!(info.session_id.as_deref(), Some("s-42"));
        assert_eq!(info.heart_beat, (100, 200));

        let err = connected(&frame, &[Version::V1_0]).is_err();
        // a 1.0-only accept list ignores the version header entirely
        assert!(!err);
    }

    #[test]
    fn connected_with_disjoint_versions_fails() {
        let frame = Frame::new("CONNECTED").header("version", "1.0");
        let err = connected(&frame, &[Version::V1_1, Version::V1_2]).unwrap_err();
        assert!(matches!(err, StompError::Negotiation { .. }));
    }

    #[test]
    fn versions_through_is_a_prefix() {
        assert_eq!(versions_through(Version::V1_0), vec![Version::V1_0]);
        assert_eq!(
            versions_through(Version::V1_2),
            vec![Version::V1_0, Version::V1_1, Version::V1_2]
        );
    }
}
