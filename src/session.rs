//! The STOMP session state machine.
//!
//! [`Session`] is a pure protocol endpoint: every operation is a
//! synchronous function that validates the request against the current
//! phase and protocol version, returns the frame to put on the wire, and
//! records the bookkeeping needed to interpret the broker's answers. It
//! never performs I/O, sleeps or spawns anything; the driver owns the
//! transport and the timers.
//!
//! The driver's loop is: call an operation, write the returned frame;
//! parse incoming bytes and hand every server frame to
//! [`receive`](Session::receive); act on the returned [`SessionEvent`]s.
//! After the `Connected` event, push [`Session::version`] into the
//! parser/codec so both ends use the negotiated escape rules. When the
//! transport drops, report it via [`disconnected`](Session::disconnected)
//! and — once a fresh handshake has completed — restore the consumer state
//! with [`replay`](Session::replay).

use std::collections::HashSet;

use tracing::debug;

use crate::commands::{self, SubscriptionToken};
use crate::error::{Result, StompError};
use crate::frame::Frame;
use crate::parser::StompItem;
use crate::spec::{self, header, AckMode, Version};
use crate::subscription::{FailurePolicy, SubscriptionEntry};

/// Caller-opaque correlation handle.
///
/// The session stores tokens with subscriptions and pending receipts and
/// hands them back in events; it never inspects them. Map them to
/// handlers, channels or futures on your side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(pub u64);

/// A receipt request attached to an outbound operation: the `receipt`
/// header value plus the token the eventual
/// [`ReceiptReceived`](SessionEvent::ReceiptReceived) (or
/// [`ReceiptCancelled`](SessionEvent::ReceiptCancelled)) event will carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptRequest {
    pub id: String,
    pub token: Token,
}

impl ReceiptRequest {
    pub fn new(id: impl Into<String>, token: Token) -> Self {
        Self {
            id: id.into(),
            token,
        }
    }
}

/// Connection lifecycle phase. Transitions are monotonic within one
/// connection attempt; only `disconnected()` resets the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// Facts the session reports back to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Handshake complete; the driver should propagate `version` to its
    /// parser/codec and start heart-beat timers per
    /// [`Session::heart_beat_intervals`].
    Connected {
        version: Version,
        server: Option<String>,
        session_id: Option<String>,
    },
    /// A MESSAGE was matched to a subscription. `token` and `policy` come
    /// from the owning subscription entry.
    MessageReceived {
        frame: Frame,
        token: Token,
        policy: FailurePolicy,
    },
    /// A MESSAGE that no active subscription claims. Not auto-acked.
    OrphanMessage { frame: Frame },
    /// A RECEIPT matched a pending receipt request.
    ReceiptReceived { token: Token },
    /// A pending receipt was abandoned because the connection went away.
    ReceiptCancelled { token: Token },
    /// A RECEIPT with an id nothing is waiting for.
    OrphanReceipt { receipt_id: String },
    /// An ERROR frame arrived. This is data, not a failure of the session;
    /// the driver decides whether to close.
    ErrorReceived { frame: Frame },
}

/// Parameters for the connect handshake.
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    /// Versions to offer, any order. Defaults to all supported.
    pub versions: Vec<Version>,
    /// `host` header; mandatory when offering anything beyond 1.0.
    pub host: Option<String>,
    pub login: Option<String>,
    pub passcode: Option<String>,
    /// Client heart-beat `(cx, cy)` in milliseconds; `(0, 0)` disables.
    pub heart_beat: (u64, u64),
    /// Extra headers for the CONNECT/STOMP frame.
    pub headers: Vec<(String, String)>,
    /// Force the handshake command. `None` picks STOMP whenever 1.2 is in
    /// the accept list, CONNECT otherwise.
    pub prefer_stomp_command: Option<bool>,
}

impl ConnectRequest {
    pub fn new() -> Self {
        Self {
            versions: Version::ALL.to_vec(),
            host: None,
            login: None,
            passcode: None,
            heart_beat: (0, 0),
            headers: Vec::new(),
            prefer_stomp_command: None,
        }
    }

    pub fn versions(mut self, versions: &[Version]) -> Self {
        self.versions = versions.to_vec();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn credentials(mut self, login: impl Into<String>, passcode: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self.passcode = Some(passcode.into());
        self
    }

    pub fn heart_beat(mut self, cx: u64, cy: u64) -> Self {
        self.heart_beat = (cx, cy);
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn use_connect_command(mut self) -> Self {
        self.prefer_stomp_command = Some(false);
        self
    }

    pub fn use_stomp_command(mut self) -> Self {
        self.prefer_stomp_command = Some(true);
        self
    }
}

impl Default for ConnectRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameters for opening a subscription.
#[derive(Debug, Clone)]
pub struct SubscribeRequest {
    pub destination: String,
    pub ack: AckMode,
    /// Explicit subscription id; generated when absent.
    pub id: Option<String>,
    /// Extra headers beyond `id`, `destination` and `ack`.
    pub headers: Vec<(String, String)>,
    pub token: Token,
    pub policy: FailurePolicy,
    pub receipt: Option<ReceiptRequest>,
}

impl SubscribeRequest {
    pub fn new(destination: impl Into<String>, token: Token) -> Self {
        Self {
            destination: destination.into(),
            ack: AckMode::Auto,
            id: None,
            headers: Vec::new(),
            token,
            policy: FailurePolicy::default(),
            receipt: None,
        }
    }

    pub fn ack(mut self, ack: AckMode) -> Self {
        self.ack = ack;
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn receipt(mut self, receipt: ReceiptRequest) -> Self {
        self.receipt = Some(receipt);
        self
    }
}

/// Negotiate heart-beat intervals between client and server.
///
/// `client` is the client's `(cx, cy)` from CONNECT, `server` the broker's
/// `(sx, sy)` from CONNECTED. Returns `(outbound, inbound)` intervals in
/// milliseconds: outbound is `max(cx, sy)` when both sides enabled that
/// direction and `0` otherwise, inbound likewise from `(cy, sx)`.
pub fn negotiate_heart_beats(client: (u64, u64), server: (u64, u64)) -> (u64, u64) {
    let (cx, cy) = client;
    let (sx, sy) = server;
    (negotiate_pair(cx, sy), negotiate_pair(cy, sx))
}

fn negotiate_pair(a: u64, b: u64) -> u64 {
    if a == 0 || b == 0 {
        0
    } else {
        a.max(b)
    }
}

/// A STOMP client session.
///
/// Created in the `Disconnected` phase with empty tables. Survives forced
/// reconnects: the subscription table is retained across
/// [`disconnected`](Session::disconnected) so [`replay`](Session::replay)
/// can rebuild the consumer state after a fresh handshake.
#[derive(Debug)]
pub struct Session {
    phase: SessionPhase,
    version: Option<Version>,
    server: Option<String>,
    session_id: Option<String>,
    accept_versions: Vec<Version>,
    client_heart_beat: (u64, u64),
    server_heart_beat: (u64, u64),
    subscriptions: Vec<SubscriptionEntry>,
    transactions: HashSet<String>,
    pending_receipts: Vec<(String, Token)>,
    used_receipts: HashSet<String>,
    disconnect_receipt: Option<String>,
    next_subscription_id: u64,
    next_transaction_id: u64,
    last_sent_at: u64,
    last_received_at: u64,
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Disconnected,
            version: None,
            server: None,
            session_id: None,
            accept_versions: vec![Version::V1_0],
            client_heart_beat: (0, 0),
            server_heart_beat: (0, 0),
            subscriptions: Vec::new(),
            transactions: HashSet::new(),
            pending_receipts: Vec::new(),
            used_receipts: HashSet::new(),
            disconnect_receipt: None,
            next_subscription_id: 0,
            next_transaction_id: 0,
            last_sent_at: 0,
            last_received_at: 0,
        }
    }

    // --- read-only state ------------------------------------------------

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Negotiated protocol version; `None` until a handshake completed.
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Broker product identity from the CONNECTED frame (1.1+).
    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    /// Broker-assigned session id from the CONNECTED frame.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn client_heart_beat(&self) -> (u64, u64) {
        self.client_heart_beat
    }

    pub fn server_heart_beat(&self) -> (u64, u64) {
        self.server_heart_beat
    }

    /// Negotiated `(outbound, inbound)` heart-beat intervals in
    /// milliseconds, `0` meaning disabled. The driver owns the timers.
    pub fn heart_beat_intervals(&self) -> (u64, u64) {
        negotiate_heart_beats(self.client_heart_beat, self.server_heart_beat)
    }

    /// Active subscriptions in insertion order.
    pub fn subscriptions(&self) -> &[SubscriptionEntry] {
        &self.subscriptions
    }

    /// Active transaction ids, sorted for stable output.
    pub fn active_transactions(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.transactions.iter().map(String::as_str).collect();
        out.sort_unstable();
        out
    }

    /// Receipt ids awaiting a RECEIPT frame, in request order.
    pub fn pending_receipts(&self) -> Vec<&str> {
        self.pending_receipts
            .iter()
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Advisory timestamp of the last outbound activity, as reported by
    /// the driver via [`note_sent`](Session::note_sent).
    pub fn last_sent_at(&self) -> u64 {
        self.last_sent_at
    }

    /// Advisory timestamp of the last inbound activity, as reported by
    /// the driver via [`note_received`](Session::note_received).
    pub fn last_received_at(&self) -> u64 {
        self.last_received_at
    }

    pub fn note_sent(&mut self, now_ms: u64) {
        self.last_sent_at = now_ms;
    }

    pub fn note_received(&mut self, now_ms: u64) {
        self.last_received_at = now_ms;
    }

    // --- outbound operations --------------------------------------------

    /// Start the handshake. Emits STOMP when 1.2 is offered (unless the
    /// request forces CONNECT) and moves to `Connecting`.
    pub fn connect(&mut self, request: ConnectRequest) -> Result<Frame> {
        self.ensure_phase(&[SessionPhase::Disconnected], "connect")?;
        let versions = commands::normalize_versions(&request.versions);
        let use_stomp = request
            .prefer_stomp_command
            .unwrap_or_else(|| versions.contains(&Version::V1_2));
        let heart_beat = if request.heart_beat == (0, 0) {
            None
        } else {
            Some(request.heart_beat)
        };
        let frame = if use_stomp {
            commands::stomp(
                request.login.as_deref(),
                request.passcode.as_deref(),
                &request.headers,
                &versions,
                request.host.as_deref(),
                heart_beat,
            )?
        } else {
            commands::connect(
                request.login.as_deref(),
                request.passcode.as_deref(),
                &request.headers,
                &versions,
                request.host.as_deref(),
                heart_beat,
            )?
        };
        self.accept_versions = versions;
        self.client_heart_beat = request.heart_beat;
        self.phase = SessionPhase::Connecting;
        debug!(command = %frame.command, "handshake started");
        Ok(frame)
    }

    /// Build a SEND frame for `destination`.
    pub fn send(
        &mut self,
        destination: &str,
        body: impl Into<Vec<u8>>,
        headers: &[(String, String)],
        receipt: Option<ReceiptRequest>,
    ) -> Result<Frame> {
        self.ensure_phase(&[SessionPhase::Connected], "send")?;
        self.check_receipt(&receipt)?;
        let frame = commands::send(destination, body, headers, receipt_id(&receipt));
        self.register_receipt(receipt);
        Ok(frame)
    }

    /// Open a subscription. Returns the SUBSCRIBE frame and the
    /// subscription id (generated when the request carried none).
    pub fn subscribe(&mut self, request: SubscribeRequest) -> Result<(Frame, String)> {
        self.ensure_phase(&[SessionPhase::Connected], "subscribe")?;
        self.check_receipt(&request.receipt)?;

        let mut extra = request.headers;
        let explicit = match request.id {
            Some(id) => Some(id),
            None => extra
                .iter()
                .position(|(k, _)| k == header::ID)
                .map(|pos| extra.remove(pos).1),
        };
        let id = match explicit {
            Some(id) => {
                if self.subscriptions.iter().any(|entry| entry.id == id) {
                    return Err(StompError::InvalidHeader(format!(
                        "subscription id {:?} already in use",
                        id
                    )));
                }
                id
            }
            None => self.generate_subscription_id(),
        };

        let entry = SubscriptionEntry {
            id: id.clone(),
            destination: request.destination,
            ack: request.ack,
            headers: extra,
            token: request.token,
            policy: request.policy,
        };
        let mut frame = entry.to_subscribe_frame();
        if let Some(r) = &request.receipt {
            frame = frame.receipt(&r.id);
        }
        self.subscriptions.push(entry);
        self.register_receipt(request.receipt);
        debug!(id = %id, "subscription opened");
        Ok((frame, id))
    }

    /// Close the subscription with the given id.
    pub fn unsubscribe(&mut self, id: &str, receipt: Option<ReceiptRequest>) -> Result<Frame> {
        self.ensure_phase(&[SessionPhase::Connected], "unsubscribe")?;
        self.check_receipt(&receipt)?;
        let pos = self
            .subscriptions
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| StompError::UnknownSubscription(id.to_string()))?;
        let entry = self.subscriptions.remove(pos);
        let frame = commands::unsubscribe(
            &SubscriptionToken::Id(entry.id),
            receipt_id(&receipt),
            self.current_version(),
        )?;
        self.register_receipt(receipt);
        Ok(frame)
    }

    /// Close the first subscription carrying the given caller token.
    pub fn unsubscribe_by_token(
        &mut self,
        token: Token,
        receipt: Option<ReceiptRequest>,
    ) -> Result<Frame> {
        let id = self
            .subscriptions
            .iter()
            .find(|entry| entry.token == token)
            .map(|entry| entry.id.clone())
            .ok_or_else(|| StompError::UnknownSubscription(format!("token {:?}", token)))?;
        self.unsubscribe(&id, receipt)
    }

    /// Begin a transaction. Returns the BEGIN frame and the transaction id
    /// (generated when `transaction` is `None`).
    pub fn begin(
        &mut self,
        transaction: Option<String>,
        receipt: Option<ReceiptRequest>,
    ) -> Result<(Frame, String)> {
        self.ensure_phase(&[SessionPhase::Connected], "begin")?;
        self.check_receipt(&receipt)?;
        let id = match transaction {
            Some(id) => {
                if self.transactions.contains(&id) {
                    return Err(StompError::InvalidHeader(format!(
                        "transaction {:?} already active",
                        id
                    )));
                }
                id
            }
            None => self.generate_transaction_id(),
        };
        let frame = commands::begin(&id, receipt_id(&receipt));
        self.transactions.insert(id.clone());
        self.register_receipt(receipt);
        Ok((frame, id))
    }

    /// Commit an active transaction.
    pub fn commit(&mut self, transaction: &str, receipt: Option<ReceiptRequest>) -> Result<Frame> {
        self.ensure_phase(&[SessionPhase::Connected], "commit")?;
        self.check_receipt(&receipt)?;
        if !self.transactions.remove(transaction) {
            return Err(StompError::UnknownTransaction(transaction.to_string()));
        }
        let frame = commands::commit(transaction, receipt_id(&receipt));
        self.register_receipt(receipt);
        Ok(frame)
    }

    /// Abort an active transaction.
    pub fn abort(&mut self, transaction: &str, receipt: Option<ReceiptRequest>) -> Result<Frame> {
        self.ensure_phase(&[SessionPhase::Connected], "abort")?;
        self.check_receipt(&receipt)?;
        if !self.transactions.remove(transaction) {
            return Err(StompError::UnknownTransaction(transaction.to_string()));
        }
        let frame = commands::abort(transaction, receipt_id(&receipt));
        self.register_receipt(receipt);
        Ok(frame)
    }

    /// Acknowledge a received MESSAGE frame, with the headers the
    /// negotiated version requires.
    pub fn ack(&mut self, message: &Frame, receipt: Option<ReceiptRequest>) -> Result<Frame> {
        self.ensure_phase(&[SessionPhase::Connected], "ack")?;
        self.check_receipt(&receipt)?;
        let frame = commands::ack(
            message,
            &self.transactions,
            receipt_id(&receipt),
            self.current_version(),
        )?;
        self.register_receipt(receipt);
        Ok(frame)
    }

    /// Negative-acknowledge a received MESSAGE frame. Not available in
    /// STOMP 1.0.
    pub fn nack(&mut self, message: &Frame, receipt: Option<ReceiptRequest>) -> Result<Frame> {
        self.ensure_phase(&[SessionPhase::Connected], "nack")?;
        self.check_receipt(&receipt)?;
        let frame = commands::nack(
            message,
            &self.transactions,
            receipt_id(&receipt),
            self.current_version(),
        )?;
        self.register_receipt(receipt);
        Ok(frame)
    }

    /// An outbound heart-beat marker for the negotiated version.
    pub fn beat(&self) -> Result<StompItem> {
        self.ensure_phase(&[SessionPhase::Connected], "beat")?;
        commands::beat(self.current_version())
    }

    /// Start a graceful shutdown and move to `Disconnecting`. With a
    /// receipt request, the matching RECEIPT frame completes the shutdown;
    /// without one the driver closes the transport and reports
    /// [`disconnected`](Session::disconnected) itself.
    pub fn disconnect(&mut self, receipt: Option<ReceiptRequest>) -> Result<Frame> {
        self.ensure_phase(&[SessionPhase::Connected], "disconnect")?;
        self.check_receipt(&receipt)?;
        let frame = commands::disconnect(receipt_id(&receipt));
        if let Some(r) = &receipt {
            self.disconnect_receipt = Some(r.id.clone());
        }
        self.register_receipt(receipt);
        self.phase = SessionPhase::Disconnecting;
        debug!("graceful shutdown started");
        Ok(frame)
    }

    /// SUBSCRIBE frames reconstructing all retained subscriptions, in
    /// original insertion order with their original ids and headers. Call
    /// after a fresh handshake on the replacement connection.
    pub fn replay(&self) -> Result<Vec<Frame>> {
        self.ensure_phase(&[SessionPhase::Connected], "replay")?;
        Ok(self
            .subscriptions
            .iter()
            .map(SubscriptionEntry::to_subscribe_frame)
            .collect())
    }

    // --- inbound --------------------------------------------------------

    /// Feed a parsed server frame and collect the resulting events.
    ///
    /// Errors leave the session state untouched.
    pub fn receive(&mut self, frame: Frame) -> Result<Vec<SessionEvent>> {
        match frame.command.as_str() {
            spec::CONNECTED => self.on_connected(frame),
            spec::MESSAGE => self.on_message(frame),
            spec::RECEIPT => self.on_receipt(frame),
            spec::ERROR => self.on_error(frame),
            _ => Err(StompError::UnexpectedFrame(frame.command)),
        }
    }

    /// The transport dropped. Abandons pending receipts (each resolves as
    /// [`ReceiptCancelled`](SessionEvent::ReceiptCancelled)), clears
    /// transactions and the negotiated version, retains subscriptions for
    /// [`replay`](Session::replay). A no-op in `Disconnected`.
    pub fn disconnected(&mut self) -> Vec<SessionEvent> {
        if self.phase == SessionPhase::Disconnected {
            return Vec::new();
        }
        debug!(phase = ?self.phase, "transport lost");
        self.disconnect_receipt = None;
        self.teardown()
    }

    // --- internals ------------------------------------------------------

    fn on_connected(&mut self, frame: Frame) -> Result<Vec<SessionEvent>> {
        self.ensure_phase(&[SessionPhase::Connecting], "receive CONNECTED")?;
        let info = commands::connected(&frame, &self.accept_versions)?;
        self.version = Some(info.version);
        self.server = info.server.clone();
        self.session_id = info.session_id.clone();
        self.server_heart_beat = info.heart_beat;
        self.phase = SessionPhase::Connected;
        debug!(version = %info.version, server = ?info.server, "connection negotiated");
        Ok(vec![SessionEvent::Connected {
            version: info.version,
            server: info.server,
            session_id: info.session_id,
        }])
    }

    fn on_message(&mut self, frame: Frame) -> Result<Vec<SessionEvent>> {
        self.ensure_phase(
            &[SessionPhase::Connected, SessionPhase::Disconnecting],
            "receive MESSAGE",
        )?;
        let token = commands::message(&frame, self.current_version())?;
        match self.resolve_subscription(&token) {
            Some(entry) => Ok(vec![SessionEvent::MessageReceived {
                token: entry.token,
                policy: entry.policy.clone(),
                frame,
            }]),
            None => Ok(vec![SessionEvent::OrphanMessage { frame }]),
        }
    }

    fn on_receipt(&mut self, frame: Frame) -> Result<Vec<SessionEvent>> {
        self.ensure_phase(
            &[SessionPhase::Connected, SessionPhase::Disconnecting],
            "receive RECEIPT",
        )?;
        let id = commands::receipt(&frame)?.to_string();
        let Some(pos) = self.pending_receipts.iter().position(|(rid, _)| *rid == id) else {
            return Ok(vec![SessionEvent::OrphanReceipt { receipt_id: id }]);
        };
        let (_, token) = self.pending_receipts.remove(pos);
        let mut events = vec![SessionEvent::ReceiptReceived { token }];
        if self.phase == SessionPhase::Disconnecting
            && self.disconnect_receipt.as_deref() == Some(id.as_str())
        {
            debug!("graceful shutdown confirmed");
            self.disconnect_receipt = None;
            events.extend(self.teardown());
        }
        Ok(events)
    }

    fn on_error(&mut self, frame: Frame) -> Result<Vec<SessionEvent>> {
        self.ensure_phase(
            &[
                SessionPhase::Connecting,
                SessionPhase::Connected,
                SessionPhase::Disconnecting,
            ],
            "receive ERROR",
        )?;
        commands::error(&frame)?;
        Ok(vec![SessionEvent::ErrorReceived { frame }])
    }

    /// Drop connection-scoped state. Subscriptions, id counters and the
    /// used-receipt set survive; receipt ids are never reused within a
    /// session.
    fn teardown(&mut self) -> Vec<SessionEvent> {
        self.phase = SessionPhase::Disconnected;
        self.version = None;
        self.server = None;
        self.session_id = None;
        self.server_heart_beat = (0, 0);
        self.transactions.clear();
        self.pending_receipts
            .drain(..)
            .map(|(_, token)| SessionEvent::ReceiptCancelled { token })
            .collect()
    }

    fn resolve_subscription(&self, token: &SubscriptionToken) -> Option<&SubscriptionEntry> {
        match token {
            SubscriptionToken::Id(id) => self.subscriptions.iter().find(|entry| entry.id == *id),
            // 1.0 fallback: first match in insertion order
            SubscriptionToken::Destination(destination) => self
                .subscriptions
                .iter()
                .find(|entry| entry.destination == *destination),
        }
    }

    fn ensure_phase(&self, allowed: &[SessionPhase], operation: &'static str) -> Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(StompError::State {
                operation,
                phase: self.phase,
            })
        }
    }

    fn current_version(&self) -> Version {
        self.version.unwrap_or(Version::V1_0)
    }

    fn check_receipt(&self, receipt: &Option<ReceiptRequest>) -> Result<()> {
        if let Some(r) = receipt {
            if self.used_receipts.contains(&r.id) {
                return Err(StompError::InvalidHeader(format!(
                    "receipt id {:?} already used in this session",
                    r.id
                )));
            }
        }
        Ok(())
    }

    fn register_receipt(&mut self, receipt: Option<ReceiptRequest>) {
        if let Some(r) = receipt {
            self.used_receipts.insert(r.id.clone());
            self.pending_receipts.push((r.id, r.token));
        }
    }

    fn generate_subscription_id(&mut self) -> String {
        loop {
            let id = self.next_subscription_id.to_string();
            self.next_subscription_id += 1;
            if !self.subscriptions.iter().any(|entry| entry.id == id) {
                return id;
            }
        }
    }

    fn generate_transaction_id(&mut self) -> String {
        loop {
            let id = format!("tx-{}", self.next_transaction_id);
            self.next_transaction_id += 1;
            if !self.transactions.contains(&id) {
                return id;
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn receipt_id(receipt: &Option<ReceiptRequest>) -> Option<&str> {
    receipt.as_ref().map(|r| r.id.as_str())
}
