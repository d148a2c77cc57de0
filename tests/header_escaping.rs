//! Tests for header escaping/unescaping across protocol versions.
//!
//! STOMP 1.1 defines these escape sequences in header names and values:
//! - `\n` → line feed (0x0a)
//! - `\c` → colon (0x3a)
//! - `\\` → backslash (0x5c)
//!
//! STOMP 1.2 adds `\r` → carriage return (0x0d). STOMP 1.0 transmits
//! headers verbatim.

use bytes::BytesMut;
use stomp_core::{Frame, ParseError, StompCodec, StompError, StompItem, Version};
use tokio_util::codec::{Decoder, Encoder};

fn decode_one(codec: &mut StompCodec, raw: &[u8]) -> Frame {
    let mut buf = BytesMut::from(raw);
    match codec.decode(&mut buf).expect("decode").expect("item") {
        StompItem::Frame(frame) => frame,
        other => panic!("expected frame, got {:?}", other),
    }
}

// ============================================================================
// Unescape (decoding incoming frames)
// ============================================================================

#[test]
fn unescape_backslash() {
    let mut codec = StompCodec::new(Version::V1_2);
    let frame = decode_one(&mut codec, b"MESSAGE\nheader:value\\\\with\\\\backslashes\n\n\0");
    assert_eq!(frame.get_header("header"), Some("value\\with\\backslashes"));
}

#[test]
fn unescape_newline() {
    let mut codec = StompCodec::new(Version::V1_2);
    let frame = decode_one(&mut codec, b"MESSAGE\nheader:line1\\nline2\n\n\0");
    assert_eq!(frame.get_header("header"), Some("line1\nline2"));
}

#[test]
fn unescape_colon() {
    let mut codec = StompCodec::new(Version::V1_2);
    let frame = decode_one(&mut codec, b"MESSAGE\nheader:key\\cvalue\n\n\0");
    assert_eq!(frame.get_header("header"), Some("key:value"));
}

#[test]
fn unescape_carriage_return_is_1_2_only() {
    let mut codec = StompCodec::new(Version::V1_2);
    let frame = decode_one(&mut codec, b"MESSAGE\nheader:before\\rafter\n\n\0");
    assert_eq!(frame.get_header("header"), Some("before\rafter"));

    let mut codec = StompCodec::new(Version::V1_1);
    let mut buf = BytesMut::from(&b"MESSAGE\nheader:before\\rafter\n\n\0"[..]);
    let err = codec.decode(&mut buf).unwrap_err();
    assert!(matches!(
        err,
        StompError::Parse(ParseError::BadEscape(seq, Version::V1_1)) if seq == "\\r"
    ));
}

#[test]
fn unescape_multiple_sequences() {
    let mut codec = StompCodec::new(Version::V1_2);
    let frame = decode_one(&mut codec, b"MESSAGE\nheader:a\\nb\\rc\\\\d\\ce\n\n\0");
    assert_eq!(frame.get_header("header"), Some("a\nb\rc\\d:e"));
}

#[test]
fn unescape_applies_to_header_names() {
    let mut codec = StompCodec::new(Version::V1_2);
    let frame = decode_one(&mut codec, b"MESSAGE\nkey\\nname:value\n\n\0");
    assert_eq!(frame.get_header("key\nname"), Some("value"));
}

#[test]
fn unknown_escape_sequence_is_an_error() {
    let mut codec = StompCodec::new(Version::V1_2);
    let mut buf = BytesMut::from(&b"MESSAGE\nheader:bad\\xescape\n\n\0"[..]);
    let err = codec.decode(&mut buf).unwrap_err();
    assert!(matches!(
        err,
        StompError::Parse(ParseError::BadEscape(seq, _)) if seq == "\\x"
    ));
}

#[test]
fn trailing_lone_backslash_is_an_error() {
    let mut codec = StompCodec::new(Version::V1_1);
    let mut buf = BytesMut::from(&b"MESSAGE\nheader:oops\\\n\n\0"[..]);
    let err = codec.decode(&mut buf).unwrap_err();
    assert!(matches!(err, StompError::Parse(ParseError::BadEscape(_, _))));
}

#[test]
fn v1_0_keeps_backslashes_verbatim() {
    let mut codec = StompCodec::new(Version::V1_0);
    let frame = decode_one(&mut codec, b"MESSAGE\nheader:keep\\nliteral\n\n\0");
    assert_eq!(frame.get_header("header"), Some("keep\\nliteral"));
}

// ============================================================================
// Escape (encoding outgoing frames)
// ============================================================================

#[test]
fn encode_escapes_colon_from_1_1_on() {
    let mut codec = StompCodec::new(Version::V1_1);
    let mut wire = BytesMut::new();
    let frame = Frame::new("SEND").header("selector", "a:b");
    codec
        .encode(StompItem::Frame(frame), &mut wire)
        .expect("encode");
    assert_eq!(&wire[..], b"SEND\nselector:a\\cb\n\n\0");
}

#[test]
fn encode_does_not_escape_in_1_0() {
    let mut codec = StompCodec::new(Version::V1_0);
    let mut wire = BytesMut::new();
    let frame = Frame::new("SEND").header("selector", "a:b");
    codec
        .encode(StompItem::Frame(frame), &mut wire)
        .expect("encode");
    assert_eq!(&wire[..], b"SEND\nselector:a:b\n\n\0");
}

#[test]
fn escaped_value_round_trips_through_the_codec() {
    let mut codec = StompCodec::new(Version::V1_2);
    let frame = Frame::new("SEND")
        .header("destination", "/queue/test")
        .header("selector", "price > 100 \\ region:EU\r\n");

    let mut wire = BytesMut::new();
    codec
        .encode(StompItem::Frame(frame.clone()), &mut wire)
        .expect("encode");
    let parsed = decode_one(&mut codec, &wire);
    assert_eq!(parsed.headers, frame.headers);
}
