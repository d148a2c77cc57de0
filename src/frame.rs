use std::fmt;

use crate::spec::{header, Version};

/// A single STOMP frame.
///
/// `Frame` contains the command (e.g. "SEND", "MESSAGE"), an ordered list
/// of headers (key/value pairs) and the raw body bytes. Frames are plain
/// values: all mutation happens through the consuming builder helpers, and
/// equality compares command, header sequence (order-sensitive) and body
/// bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// STOMP command (e.g. CONNECT, SEND, SUBSCRIBE)
    pub command: String,
    /// Ordered headers as (key, value) pairs. The wire order is preserved;
    /// for repeated names the FIRST occurrence is the effective value.
    pub headers: Vec<(String, String)>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl Frame {
    /// Create a new frame with the given command and empty headers/body.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Add a header (builder style).
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Set the frame body (builder style).
    pub fn set_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Request a receipt for this frame (builder style).
    ///
    /// The broker answers with a RECEIPT frame carrying the same id in its
    /// `receipt-id` header.
    pub fn receipt(self, id: impl Into<String>) -> Self {
        self.header(header::RECEIPT, id)
    }

    /// Get the value of a header by name.
    ///
    /// Returns the first header value matching the given key
    /// (case-sensitive), or `None` if no such header exists. "First wins"
    /// is the effective-value rule for repeated header names in STOMP 1.1
    /// and 1.2.
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Render the frame to its wire form for the given protocol version.
    ///
    /// Produces: command, LF, one `name:value` line per header with name
    /// and value escaped per `version` (the `content-length` value is never
    /// escaped), a blank line, the body, and the terminating NUL octet.
    ///
    /// If the body is non-empty and no `content-length` header is present,
    /// one is appended equal to the body length in bytes. Header order is
    /// preserved, so rendering is deterministic.
    pub fn render(&self, version: Version) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.command.len() + self.body.len() + 64);
        out.extend_from_slice(self.command.as_bytes());
        out.push(b'\n');

        for (k, v) in &self.headers {
            out.extend_from_slice(escape_header(k, version).as_bytes());
            out.push(b':');
            if k == header::CONTENT_LENGTH {
                out.extend_from_slice(v.as_bytes());
            } else {
                out.extend_from_slice(escape_header(v, version).as_bytes());
            }
            out.push(b'\n');
        }

        if !self.body.is_empty() && self.get_header(header::CONTENT_LENGTH).is_none() {
            out.extend_from_slice(header::CONTENT_LENGTH.as_bytes());
            out.push(b':');
            out.extend_from_slice(self.body.len().to_string().as_bytes());
            out.push(b'\n');
        }

        out.push(b'\n');
        out.extend_from_slice(&self.body);
        out.push(0);
        out
    }
}

/// Escape a header name or value for wire transmission.
///
/// STOMP 1.0 transmits headers verbatim. 1.1 escapes backslash (`\\`),
/// line feed (`\n`) and colon (`\c`); 1.2 additionally escapes carriage
/// return (`\r`).
pub fn escape_header(input: &str, version: Version) -> String {
    if !version.escapes_headers() {
        return input.to_string();
    }
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            ':' => result.push_str("\\c"),
            '\r' if version == Version::V1_2 => result.push_str("\\r"),
            _ => result.push(ch),
        }
    }
    result
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Command: {}", self.command)?;
        for (k, v) in &self.headers {
            writeln!(f, "{}: {}", k, v)?;
        }
        writeln!(f, "Body ({} bytes)", self.body.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_appends_content_length_for_nonempty_body() {
        let frame = Frame::new("SEND")
            .header("destination", "/queue/a")
            .set_body(b"hello".to_vec());
        let wire = frame.render(Version::V1_2);
        assert_eq!(
            wire,
            b"SEND\ndestination:/queue/a\ncontent-length:5\n\nhello\0".to_vec()
        );
    }

    #[test]
    fn render_keeps_explicit_content_length_unescaped() {
        let frame = Frame::new("SEND")
            .header("content-length", "3")
            .set_body(b"abc".to_vec());
        let wire = frame.render(Version::V1_2);
        assert_eq!(wire, b"SEND\ncontent-length:3\n\nabc\0".to_vec());
    }

    #[test]
    fn escape_is_version_dependent() {
        assert_eq!(escape_header("a:b", Version::V1_0), "a:b");
        assert_eq!(escape_header("a:b", Version::V1_1), "a\\cb");
        assert_eq!(escape_header("a\rb", Version::V1_1), "a\rb");
        assert_eq!(escape_header("a\rb", Version::V1_2), "a\\rb");
        assert_eq!(escape_header("a\\b\nc", Version::V1_2), "a\\\\b\\nc");
    }

    #[test]
    fn first_header_occurrence_wins() {
        let frame = Frame::new("MESSAGE")
            .header("foo", "first")
            .header("foo", "second");
        assert_eq!(frame.get_header("foo"), Some("first"));
    }
}
