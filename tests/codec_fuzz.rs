//! Randomized chunking: any partitioning of an encoded byte stream must
//! decode to the same item stream. RNGs are seeded so the tests are
//! deterministic.

use bytes::BytesMut;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stomp_core::{Frame, StompCodec, StompItem, Version};
use tokio_util::codec::{Decoder, Encoder};

fn encode_all(version: Version, items: &[StompItem]) -> BytesMut {
    let mut codec = StompCodec::new(version);
    let mut wire = BytesMut::new();
    for item in items {
        codec.encode(item.clone(), &mut wire).expect("encode");
    }
    wire
}

fn decode_in_random_chunks(version: Version, wire: &[u8], seed: [u8; 32]) -> Vec<StompItem> {
    let mut rng = StdRng::from_seed(seed);
    let mut codec = StompCodec::new(version);
    let mut decoded = Vec::new();
    let mut off = 0usize;
    while off < wire.len() {
        let size = rng.gen_range(1..8).min(wire.len() - off);
        let mut chunk = BytesMut::new();
        chunk.extend_from_slice(&wire[off..off + size]);
        off += size;
        loop {
            match codec.decode(&mut chunk) {
                Ok(Some(item)) => decoded.push(item),
                Ok(None) => break,
                Err(e) => panic!("decoder error: {}", e),
            }
        }
    }
    decoded
}

#[test]
fn randomized_splits_multiple_frames() {
    let items = vec![
        StompItem::Frame(
            Frame::new("SEND")
                .header("destination", "/queue/a")
                .set_body(b"alpha".to_vec()),
        ),
        StompItem::Frame(
            Frame::new("SEND")
                .header("destination", "/queue/b")
                .set_body(vec![0u8, 1, 2, 3, 4]), // binary -> content-length framing
        ),
        StompItem::HeartBeat,
        StompItem::Frame(
            Frame::new("SEND")
                .header("destination", "/queue/c")
                .set_body(b"omega".to_vec()),
        ),
    ];
    let wire = encode_all(Version::V1_2, &items);
    let decoded = decode_in_random_chunks(Version::V1_2, &wire, [0x42; 32]);

    let bodies: Vec<Vec<u8>> = decoded
        .iter()
        .filter_map(|item| match item {
            StompItem::Frame(f) => Some(f.body.clone()),
            StompItem::HeartBeat => None,
        })
        .collect();
    assert_eq!(
        bodies,
        vec![b"alpha".to_vec(), vec![0u8, 1, 2, 3, 4], b"omega".to_vec()]
    );
    assert_eq!(
        decoded
            .iter()
            .filter(|i| matches!(i, StompItem::HeartBeat))
            .count(),
        1
    );
}

#[test]
fn streaming_many_small_frames() {
    let items: Vec<StompItem> = (0..200)
        .map(|i| {
            StompItem::Frame(
                Frame::new("SEND")
                    .header("destination", "/queue/stream")
                    .set_body(format!("msg-{}", i).into_bytes()),
            )
        })
        .collect();
    let wire = encode_all(Version::V1_2, &items);
    let decoded = decode_in_random_chunks(Version::V1_2, &wire, [0x99; 32]);
    assert_eq!(decoded.len(), 200, "expected to decode 200 frames");
}

#[test]
fn chunked_and_whole_feeds_agree() {
    let items = vec![
        StompItem::HeartBeat,
        StompItem::Frame(
            Frame::new("MESSAGE")
                .header("message-id", "1")
                .header("destination", "/q")
                .header("subscription", "0")
                .header("selector", "region:EU")
                .set_body(b"x".to_vec()),
        ),
        StompItem::HeartBeat,
        StompItem::Frame(
            Frame::new("RECEIPT").header("receipt-id", "r-9"),
        ),
    ];
    let wire = encode_all(Version::V1_2, &items);

    let mut whole_codec = StompCodec::new(Version::V1_2);
    let mut whole_buf = BytesMut::from(&wire[..]);
    let mut whole = Vec::new();
    while let Some(item) = whole_codec.decode(&mut whole_buf).expect("decode") {
        whole.push(item);
    }

    for seed in 0u8..16 {
        let chunked = decode_in_random_chunks(Version::V1_2, &wire, [seed; 32]);
        assert_eq!(chunked, whole, "seed {}", seed);
    }
}
