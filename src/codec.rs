//! `tokio_util::codec` adapter over the streaming [`Parser`] and
//! [`Frame::render`]. The codec performs no I/O itself; it is the seam
//! that transport layers (TCP, TLS, in-memory pipes) plug into.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::StompError;
use crate::parser::{Parser, ParserConfig, StompItem};
use crate::spec::Version;

/// `StompCodec` implements `tokio_util::codec::{Decoder, Encoder}` for the
/// STOMP wire protocol.
///
/// Decoding delegates to the incremental [`Parser`]; encoding renders
/// frames with [`Frame::render`] for the codec's active protocol version
/// and heart-beats as a single LF. After version negotiation the driver
/// calls [`set_version`](StompCodec::set_version) so both directions use
/// the negotiated escape rules.
#[derive(Debug)]
pub struct StompCodec {
    parser: Parser,
    version: Version,
}

impl StompCodec {
    pub fn new(version: Version) -> Self {
        Self {
            parser: Parser::new(version),
            version,
        }
    }

    pub fn with_config(version: Version, config: ParserConfig) -> Self {
        Self {
            parser: Parser::with_config(version, config),
            version,
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Switch both encode and decode to the negotiated protocol version.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
        self.parser.set_version(version);
    }

    /// Access the underlying parser, e.g. to `reset()` it after an error.
    pub fn parser_mut(&mut self) -> &mut Parser {
        &mut self.parser
    }
}

impl Default for StompCodec {
    fn default() -> Self {
        Self::new(Version::V1_0)
    }
}

impl Decoder for StompCodec {
    type Item = StompItem;
    type Error = StompError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if !src.is_empty() {
            self.parser.feed(&src[..]);
            src.clear();
        }
        Ok(self.parser.next()?)
    }
}

impl Encoder<StompItem> for StompCodec {
    type Error = StompError;

    fn encode(&mut self, item: StompItem, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            StompItem::HeartBeat => dst.put_u8(b'\n'),
            StompItem::Frame(frame) => dst.extend_from_slice(&frame.render(self.version)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    #[test]
    fn encode_then_decode_round_trips() {
        let mut codec = StompCodec::new(Version::V1_2);
        let frame = Frame::new("SEND")
            .header("destination", "/queue/x")
            .set_body(b"payload".to_vec());

        let mut wire = BytesMut::new();
        codec
            .encode(StompItem::Frame(frame.clone()), &mut wire)
            .expect("encode");

        let decoded = codec.decode(&mut wire).expect("decode").expect("item");
        match decoded {
            StompItem::Frame(f) => {
                assert_eq!(f.command, frame.command);
                assert_eq!(f.body, frame.body);
                // render added content-length; the original headers lead
                assert_eq!(f.headers[0], frame.headers[0]);
            }
            other => panic!("expected frame, got {:?}", other),
        }
    }

    #[test]
    fn heartbeat_encodes_as_single_lf() {
        let mut codec = StompCodec::new(Version::V1_1);
        let mut wire = BytesMut::new();
        codec.encode(StompItem::HeartBeat, &mut wire).expect("encode");
        assert_eq!(&wire[..], b"\n");
    }
}
