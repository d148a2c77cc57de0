//! Protocol constants: versions, command tokens, header names, ack modes.

use std::fmt;

/// STOMP wire protocol versions supported by this crate, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Version {
    V1_0,
    V1_1,
    V1_2,
}

impl Version {
    /// All supported versions, ascending.
    pub const ALL: [Version; 3] = [Version::V1_0, Version::V1_1, Version::V1_2];

    pub fn as_str(self) -> &'static str {
        match self {
            Version::V1_0 => "1.0",
            Version::V1_1 => "1.1",
            Version::V1_2 => "1.2",
        }
    }

    /// Parse a `version` / `accept-version` header token.
    pub fn parse(s: &str) -> Option<Version> {
        match s.trim() {
            "1.0" => Some(Version::V1_0),
            "1.1" => Some(Version::V1_1),
            "1.2" => Some(Version::V1_2),
            _ => None,
        }
    }

    /// Header escaping and heart-beats only exist from 1.1 on.
    pub fn escapes_headers(self) -> bool {
        self >= Version::V1_1
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Client commands
pub const ABORT: &str = "ABORT";
pub const ACK: &str = "ACK";
pub const BEGIN: &str = "BEGIN";
pub const COMMIT: &str = "COMMIT";
pub const CONNECT: &str = "CONNECT";
pub const DISCONNECT: &str = "DISCONNECT";
pub const NACK: &str = "NACK";
pub const SEND: &str = "SEND";
pub const STOMP: &str = "STOMP";
pub const SUBSCRIBE: &str = "SUBSCRIBE";
pub const UNSUBSCRIBE: &str = "UNSUBSCRIBE";

// Server commands
pub const CONNECTED: &str = "CONNECTED";
pub const ERROR: &str = "ERROR";
pub const MESSAGE: &str = "MESSAGE";
pub const RECEIPT: &str = "RECEIPT";

/// Commands a client may send in the given protocol version.
pub fn client_commands(version: Version) -> &'static [&'static str] {
    match version {
        Version::V1_0 => &[
            ABORT, ACK, BEGIN, COMMIT, CONNECT, DISCONNECT, SEND, SUBSCRIBE, UNSUBSCRIBE,
        ],
        Version::V1_1 | Version::V1_2 => &[
            ABORT, ACK, BEGIN, COMMIT, CONNECT, DISCONNECT, NACK, SEND, STOMP, SUBSCRIBE,
            UNSUBSCRIBE,
        ],
    }
}

/// Commands a broker may send; identical across versions.
pub const SERVER_COMMANDS: [&str; 4] = [CONNECTED, ERROR, MESSAGE, RECEIPT];

/// Whether `command` belongs to the closed set of STOMP commands (client or
/// server, any version). The parser rejects everything else.
pub fn is_known_command(command: &str) -> bool {
    client_commands(Version::V1_2).contains(&command) || SERVER_COMMANDS.contains(&command)
}

/// Well-known header names.
pub mod header {
    pub const ACCEPT_VERSION: &str = "accept-version";
    pub const ACK: &str = "ack";
    pub const CONTENT_LENGTH: &str = "content-length";
    pub const CONTENT_TYPE: &str = "content-type";
    pub const DESTINATION: &str = "destination";
    pub const HEART_BEAT: &str = "heart-beat";
    pub const HOST: &str = "host";
    pub const ID: &str = "id";
    pub const LOGIN: &str = "login";
    pub const MESSAGE_ID: &str = "message-id";
    pub const PASSCODE: &str = "passcode";
    pub const RECEIPT: &str = "receipt";
    pub const RECEIPT_ID: &str = "receipt-id";
    pub const SERVER: &str = "server";
    pub const SESSION: &str = "session";
    pub const SUBSCRIPTION: &str = "subscription";
    pub const TRANSACTION: &str = "transaction";
    pub const VERSION: &str = "version";
}

/// Subscription acknowledgement modes as defined by STOMP 1.1 and 1.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckMode {
    #[default]
    Auto,
    Client,
    ClientIndividual,
}

impl AckMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AckMode::Auto => "auto",
            AckMode::Client => "client",
            AckMode::ClientIndividual => "client-individual",
        }
    }

    pub fn parse(s: &str) -> Option<AckMode> {
        match s {
            "auto" => Some(AckMode::Auto),
            "client" => Some(AckMode::Client),
            "client-individual" => Some(AckMode::ClientIndividual),
            _ => None,
        }
    }
}

impl fmt::Display for AckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_ordering_is_ascending() {
        assert!(Version::V1_0 < Version::V1_1);
        assert!(Version::V1_1 < Version::V1_2);
        assert_eq!(Version::parse("1.2"), Some(Version::V1_2));
        assert_eq!(Version::parse("2.0"), None);
    }

    #[test]
    fn nack_is_not_a_1_0_client_command() {
        assert!(!client_commands(Version::V1_0).contains(&NACK));
        assert!(client_commands(Version::V1_1).contains(&NACK));
        assert!(is_known_command("NACK"));
        assert!(!is_known_command("PUBLISH"));
    }
}
