//! Incremental STOMP wire parser.
//!
//! [`Parser`] consumes arbitrary byte chunks and emits complete frames and
//! heart-beat markers in byte order. It is a pure state machine: it never
//! reads from a transport, and suspension is simply `Ok(None)` ("feed me
//! more bytes").

use bytes::{Buf, BytesMut};
use tracing::trace;

use crate::error::ParseError;
use crate::frame::Frame;
use crate::spec::{self, header, Version};

/// Items produced by the parser (and consumed/produced by the codec).
///
/// A `StompItem` is either a decoded [`Frame`] or a `HeartBeat` marker
/// representing a bare end-of-line received between frames (STOMP 1.1+).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StompItem {
    Frame(Frame),
    HeartBeat,
}

/// Bounds and strictness knobs for the parser.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Upper bound on the total size of one frame (command, headers, body).
    pub max_frame_size: usize,
    /// Upper bound on the number of headers in one frame.
    pub max_headers: usize,
    /// Upper bound on the length of one command or header line.
    pub max_header_line: usize,
    /// Accept carriage returns that are not part of a CR LF pair.
    ///
    /// The STOMP specifications forbid them, but some 1.1 brokers emit
    /// them anyway; default is strict.
    pub tolerate_bare_cr: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_frame_size: 10 * 1024 * 1024,
            max_headers: 128,
            max_header_line: 8 * 1024,
            tolerate_bare_cr: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between frames: skipping end-of-lines, which are heart-beats in 1.1+.
    PreCommand,
    /// Accumulating the command line.
    Command,
    /// Reading header lines until the blank line.
    Headers,
    /// Reading exactly `remaining` body bytes, then a mandatory NUL.
    BodyLengthDelimited { remaining: usize },
    /// Reading body bytes up to the first NUL.
    BodyNulDelimited,
    /// A parse error occurred; `reset()` is required.
    Poisoned,
}

/// Streaming STOMP frame parser.
///
/// Feed bytes with [`feed`](Parser::feed), then drain items with
/// [`next`](Parser::next) until it returns `Ok(None)`. Any error poisons
/// the parser: every subsequent `next` returns [`ParseError::Poisoned`]
/// until [`reset`](Parser::reset) is called.
///
/// The active protocol version controls header unescaping and heart-beat
/// recognition; the session driver pushes the negotiated version here via
/// [`set_version`](Parser::set_version).
#[derive(Debug)]
pub struct Parser {
    version: Version,
    config: ParserConfig,
    buf: BytesMut,
    state: State,
    command: String,
    headers: Vec<(String, String)>,
    frame_bytes: usize,
}

impl Parser {
    pub fn new(version: Version) -> Self {
        Self::with_config(version, ParserConfig::default())
    }

    pub fn with_config(version: Version, config: ParserConfig) -> Self {
        Self {
            version,
            config,
            buf: BytesMut::new(),
            state: State::PreCommand,
            command: String::new(),
            headers: Vec::new(),
            frame_bytes: 0,
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Switch the protocol version, typically right after negotiation.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    pub fn is_poisoned(&self) -> bool {
        self.state == State::Poisoned
    }

    /// Append a chunk of wire bytes. Chunk boundaries are irrelevant: any
    /// partitioning of a byte stream yields the same item stream.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Drop all buffered bytes and partial frame state, and unpoison.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.command.clear();
        self.headers.clear();
        self.frame_bytes = 0;
        self.state = State::PreCommand;
    }

    /// Produce the next complete item, or `Ok(None)` if more bytes are
    /// required.
    pub fn next(&mut self) -> Result<Option<StompItem>, ParseError> {
        if self.state == State::Poisoned {
            return Err(ParseError::Poisoned);
        }
        match self.advance() {
            Ok(item) => Ok(item),
            Err(e) => {
                self.state = State::Poisoned;
                Err(e)
            }
        }
    }

    fn advance(&mut self) -> Result<Option<StompItem>, ParseError> {
        loop {
            match self.state {
                State::Poisoned => return Err(ParseError::Poisoned),
                State::PreCommand => match self.buf.first().copied() {
                    None => return Ok(None),
                    Some(b'\n') => {
                        self.buf.advance(1);
                        if self.version >= Version::V1_1 {
                            return Ok(Some(StompItem::HeartBeat));
                        }
                        // 1.0 has no heart-beats; stray newlines are skipped
                    }
                    Some(b'\r') => {
                        if self.buf.len() < 2 {
                            return Ok(None);
                        }
                        if self.buf[1] == b'\n' {
                            self.buf.advance(2);
                            if self.version >= Version::V1_1 {
                                return Ok(Some(StompItem::HeartBeat));
                            }
                        } else if self.config.tolerate_bare_cr {
                            self.frame_bytes = 0;
                            self.state = State::Command;
                        } else {
                            return Err(ParseError::BareCarriageReturn);
                        }
                    }
                    Some(_) => {
                        self.frame_bytes = 0;
                        self.state = State::Command;
                    }
                },
                State::Command => {
                    let Some(line) = self.take_line()? else {
                        return Ok(None);
                    };
                    let command = utf8(&line)?;
                    if !spec::is_known_command(&command) {
                        return Err(ParseError::UnknownCommand(command));
                    }
                    self.command = command;
                    self.headers.clear();
                    self.state = State::Headers;
                }
                State::Headers => {
                    let Some(line) = self.take_line()? else {
                        return Ok(None);
                    };
                    if line.is_empty() {
                        match self.content_length()? {
                            Some(n) => {
                                if self.frame_bytes + n > self.config.max_frame_size {
                                    return Err(ParseError::FrameTooLarge(
                                        self.config.max_frame_size,
                                    ));
                                }
                                self.state = State::BodyLengthDelimited { remaining: n };
                            }
                            None => self.state = State::BodyNulDelimited,
                        }
                    } else {
                        self.push_header(&line)?;
                    }
                }
                State::BodyLengthDelimited { remaining } => {
                    // need the body plus its NUL terminator
                    if self.buf.len() < remaining + 1 {
                        return Ok(None);
                    }
                    let body = self.buf.split_to(remaining).to_vec();
                    if self.buf[0] != 0 {
                        return Err(ParseError::MissingNulTerminator(remaining));
                    }
                    self.buf.advance(1);
                    self.frame_bytes += remaining + 1;
                    return Ok(Some(self.finish_frame(body)));
                }
                State::BodyNulDelimited => {
                    let Some(idx) = self.buf.iter().position(|&b| b == 0) else {
                        if self.frame_bytes + self.buf.len() > self.config.max_frame_size {
                            return Err(ParseError::FrameTooLarge(self.config.max_frame_size));
                        }
                        return Ok(None);
                    };
                    if self.frame_bytes + idx > self.config.max_frame_size {
                        return Err(ParseError::FrameTooLarge(self.config.max_frame_size));
                    }
                    let body = self.buf.split_to(idx).to_vec();
                    self.buf.advance(1);
                    self.frame_bytes += idx + 1;
                    return Ok(Some(self.finish_frame(body)));
                }
            }
        }
    }

    /// Take one LF-terminated line out of the buffer, stripping the LF and
    /// a single optional preceding CR. `Ok(None)` means the line is still
    /// incomplete.
    fn take_line(&mut self) -> Result<Option<Vec<u8>>, ParseError> {
        let Some(idx) = self.buf.iter().position(|&b| b == b'\n') else {
            if self.buf.len() > self.config.max_header_line {
                return Err(ParseError::LineTooLong(self.config.max_header_line));
            }
            return Ok(None);
        };
        if idx > self.config.max_header_line {
            return Err(ParseError::LineTooLong(self.config.max_header_line));
        }
        self.frame_bytes += idx + 1;
        if self.frame_bytes > self.config.max_frame_size {
            return Err(ParseError::FrameTooLarge(self.config.max_frame_size));
        }
        let mut line = self.buf.split_to(idx + 1);
        line.truncate(idx);
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        if !self.config.tolerate_bare_cr && line.contains(&b'\r') {
            return Err(ParseError::BareCarriageReturn);
        }
        Ok(Some(line.to_vec()))
    }

    fn push_header(&mut self, line: &[u8]) -> Result<(), ParseError> {
        if self.headers.len() >= self.config.max_headers {
            return Err(ParseError::TooManyHeaders(self.config.max_headers));
        }
        let colon = line
            .iter()
            .position(|&b| b == b':')
            .ok_or_else(|| ParseError::MalformedHeader(String::from_utf8_lossy(line).into_owned()))?;
        let (name_raw, value_raw) = (&line[..colon], &line[colon + 1..]);
        let name = unescape_header(name_raw, self.version)?;
        let value = if name == header::CONTENT_LENGTH {
            // the content-length value is exempt from escaping rules
            utf8(value_raw)?
        } else {
            if self.version >= Version::V1_1 && value_raw.contains(&b':') {
                return Err(ParseError::RawColon(self.version));
            }
            unescape_header(value_raw, self.version)?
        };
        // first occurrence wins; later duplicates are discarded silently
        if !self.headers.iter().any(|(k, _)| *k == name) {
            self.headers.push((name, value));
        }
        Ok(())
    }

    fn content_length(&self) -> Result<Option<usize>, ParseError> {
        let Some(value) = self
            .headers
            .iter()
            .find(|(k, _)| k == header::CONTENT_LENGTH)
            .map(|(_, v)| v.as_str())
        else {
            return Ok(None);
        };
        value
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ParseError::InvalidContentLength(value.to_string()))
    }

    fn finish_frame(&mut self, body: Vec<u8>) -> StompItem {
        let frame = Frame {
            command: std::mem::take(&mut self.command),
            headers: std::mem::take(&mut self.headers),
            body,
        };
        self.state = State::PreCommand;
        trace!(command = %frame.command, body_len = frame.body.len(), "decoded frame");
        StompItem::Frame(frame)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(Version::V1_0)
    }
}

/// Decode the escape sequences of a header name or value.
///
/// STOMP 1.0 performs no unescaping. 1.1 decodes `\n`, `\c` and `\\`;
/// 1.2 additionally decodes `\r`. Any other backslash sequence (including
/// a trailing lone backslash) is an error.
pub fn unescape_header(input: &[u8], version: Version) -> Result<String, ParseError> {
    if !version.escapes_headers() {
        return utf8(input);
    }
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        let b = input[i];
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }
        let Some(&next) = input.get(i + 1) else {
            return Err(ParseError::BadEscape("\\".to_string(), version));
        };
        let decoded = match next {
            b'n' => b'\n',
            b'c' => b':',
            b'\\' => b'\\',
            b'r' if version == Version::V1_2 => b'\r',
            other => {
                return Err(ParseError::BadEscape(
                    format!("\\{}", other as char),
                    version,
                ));
            }
        };
        out.push(decoded);
        i += 2;
    }
    utf8(&out)
}

fn utf8(bytes: &[u8]) -> Result<String, ParseError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| ParseError::InvalidUtf8)
}
