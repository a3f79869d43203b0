use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};

use super::decode_header;
use crate::model::english::english_model;
use crate::model::{canonical_packs, Model};
use crate::trainer::{self, TrainOptions};
use crate::{compress, decompress, set_default_model, DecodeError, Decoder, Encoder};

fn roundtrip(model: &Model, input: &[u8]) -> Vec<u8> {
    let encoded = Encoder::new(model).encode_to_vec(input);
    Decoder::new(model).decode_to_vec(&encoded).unwrap()
}

/// A model whose only tracked character is 'a', so that pack selection
/// depends on nothing but the run length.
fn single_char_model() -> Model {
    trainer::train(b"aaaaaaaaaaaaaaaa\naaaaaaaaaaaaaaaa\n", &TrainOptions::default()).unwrap()
}

#[test]
fn test_empty_input() {
    let model = english_model();
    assert!(Encoder::new(&model).encode_to_vec(b"").is_empty());
    assert!(Decoder::new(&model).decode_to_vec(b"").unwrap().is_empty());
}

#[test]
fn test_single_characters() {
    let model = english_model();
    assert_eq!(Encoder::new(&model).encode_to_vec(b"a"), vec![b'a']);
    assert_eq!(Encoder::new(&model).encode_to_vec(&[0x80]), vec![0x00, 0x80]);
    assert_eq!(
        Decoder::new(&model).decode_to_vec(&[0x00, 0x80]).unwrap(),
        vec![0x80]
    );
}

#[test]
fn test_literal_fallback_bounds() {
    let model = english_model();
    let encoder = Encoder::new(&model);
    let decoder = Decoder::new(&model);

    for byte in 1..=255u8 {
        let encoded = encoder.encode_to_vec(&[byte]);
        if byte < 0x80 {
            assert_eq!(encoded, vec![byte]);
        } else {
            assert_eq!(encoded, vec![0x00, byte]);
        }
        assert_eq!(decoder.decode_to_vec(&encoded).unwrap(), vec![byte]);
    }
}

#[test]
fn test_nul_terminates_encoding() {
    let model = english_model();
    let encoder = Encoder::new(&model);
    assert_eq!(encoder.encode_to_vec(b"ab\x00cd"), encoder.encode_to_vec(b"ab"));
    assert!(encoder.encode_to_vec(b"\x00whatever").is_empty());
}

#[test]
fn test_the_needs_two_bytes() {
    let model = english_model();
    let encoded = Encoder::new(&model).encode_to_vec(b"the");

    // "th" fits the one-byte pack, the dangling 'e' stays a literal
    assert_eq!(encoded.len(), 2);
    assert_eq!(encoded[0] & 0xC0, 0x80);
    assert_eq!(encoded[1], b'e');
    assert_eq!(Decoder::new(&model).decode_to_vec(&encoded).unwrap(), b"the");
}

#[test]
fn test_sentence_shrinks_and_roundtrips() {
    let model = english_model();
    let input = b"This is a test.";
    let encoded = Encoder::new(&model).encode_to_vec(input);

    assert!(encoded.len() < input.len());
    assert_eq!(Decoder::new(&model).decode_to_vec(&encoded).unwrap(), input);
}

#[test]
fn test_non_ascii_bytes_are_escaped() {
    let model = english_model();
    // "Just \u{3c0}." in UTF-8
    let input: &[u8] = &[0x4A, 0x75, 0x73, 0x74, 0x20, 0xCF, 0x80, 0x2E];
    let encoded = Encoder::new(&model).encode_to_vec(input);

    assert!(encoded.windows(2).any(|pair| pair == [0x00, 0xCF]));
    assert!(encoded.windows(2).any(|pair| pair == [0x00, 0x80]));
    assert_eq!(Decoder::new(&model).decode_to_vec(&encoded).unwrap(), input);
}

#[test]
fn test_greedy_selection_prefers_the_largest_pack() {
    let model = single_char_model();
    let encoder = Encoder::new(&model);

    assert_eq!(encoder.encode_to_vec(b"aa"), vec![0x80]);
    assert_eq!(encoder.encode_to_vec(b"aaa"), vec![0x80, b'a']);
    assert_eq!(encoder.encode_to_vec(b"aaaa"), vec![0xC0, 0x00]);
    assert_eq!(
        encoder.encode_to_vec(b"aaaaaaa"),
        vec![0xC0, 0x00, 0x80, b'a']
    );
    assert_eq!(
        encoder.encode_to_vec(b"aaaaaaaa"),
        vec![0xE0, 0x00, 0x00, 0x00]
    );
    assert_eq!(
        encoder.encode_to_vec(b"aaaaaaaaa"),
        vec![0xE0, 0x00, 0x00, 0x00, b'a']
    );
    assert_eq!(
        encoder.encode_to_vec(b"aaaaaaaaaaaaaaaa"),
        vec![0xE0, 0x00, 0x00, 0x00, 0xE0, 0x00, 0x00, 0x00]
    );

    for input in [&b"aa"[..], b"aaa", b"aaaaaaa", b"aaaaaaaaaaaaaaaa"] {
        assert_eq!(roundtrip(&model, input), input);
    }
}

#[test]
fn test_masks_can_reject_a_tracked_pair() {
    // 'b' follows 'a' only at rank 5, past the one-byte pack's two
    // successor bits, while 'a' follows 'b' at rank 0
    let leaders = [b'a', b'b'];
    let successors = vec![vec![b'c', b'd', b'e', b'f', b'g', b'b'], vec![b'a']];
    let model =
        Model::from_rankings(&leaders, &successors, 5, 4, canonical_packs(3).unwrap()).unwrap();
    let encoder = Encoder::new(&model);

    assert_eq!(encoder.encode_to_vec(b"ab"), vec![b'a', b'b']);
    assert_eq!(encoder.encode_to_vec(b"ba"), vec![0x84]);
    assert_eq!(roundtrip(&model, b"ab"), b"ab");
    assert_eq!(roundtrip(&model, b"ba"), b"ba");
}

#[test]
fn test_header_dispatch_partition() {
    for byte in 0..=255u16 {
        let mark = decode_header(byte as u8);
        let expected = match byte {
            0x00..=0x7F => -1,
            0x80..=0xBF => 0,
            0xC0..=0xDF => 1,
            0xE0..=0xEF => 2,
            0xF0..=0xF7 => 3,
            0xF8..=0xFB => 4,
            0xFC..=0xFD => 5,
            0xFE => 6,
            _ => 7,
        };
        assert_eq!(mark, expected, "byte {byte:#04x}");
    }
}

#[test]
fn test_decoder_rejects_malformed_headers() {
    let model = english_model();
    let decoder = Decoder::new(&model);

    assert_eq!(
        decoder.decode_to_vec(&[0xFE, 0x00, 0x00]),
        Err(DecodeError::InvalidHeader(0))
    );
    assert_eq!(
        decoder.decode_to_vec(&[0xF0, 0x00, 0x00, 0x00]),
        Err(DecodeError::InvalidHeader(0))
    );

    // a model with fewer packs rejects marks the default model accepts
    let single = trainer::train(
        b"aaaaaaaa\naaaaaaaa\n",
        &TrainOptions {
            encoding_types: 1,
            ..TrainOptions::default()
        },
    )
    .unwrap();
    assert_eq!(
        Decoder::new(&single).decode_to_vec(&[0xC0, 0x00]),
        Err(DecodeError::InvalidHeader(0))
    );
}

#[test]
fn test_decoder_rejects_truncated_input() {
    let model = english_model();
    let decoder = Decoder::new(&model);

    assert_eq!(decoder.decode_to_vec(&[0xC0]), Err(DecodeError::Truncated(0)));
    assert_eq!(
        decoder.decode_to_vec(&[0xE0, 0x00]),
        Err(DecodeError::Truncated(0))
    );
    assert_eq!(decoder.decode_to_vec(&[0x00]), Err(DecodeError::Truncated(1)));

    // everything before the broken code word is still delivered
    let mut out = Vec::new();
    assert_eq!(
        decoder.decode(&[b'a', 0xC0], &mut out),
        Err(DecodeError::Truncated(1))
    );
    assert_eq!(out, b"a");
}

#[test]
fn test_decoder_survives_corrupt_pack_words() {
    // field bits pointing at untrained table slots must decode to
    // something (garbage) rather than panic
    for model in [english_model(), single_char_model()] {
        let decoder = Decoder::new(&model);
        for first in [0x80, 0xBF, 0xC0, 0xDF, 0xE7] {
            let word = [first, 0xFF, 0xFF, 0xFF];
            let _ = decoder.decode_to_vec(&word);
        }
    }
}

#[test]
fn test_random_inputs_roundtrip() {
    let model = english_model();
    let mut rng = StdRng::seed_from_u64(0xC0DEC);
    let common = b"etaoin shrdlu,'the quick brown fox";

    for _ in 0..250 {
        let len = rng.gen_range(0..120);
        let input: Vec<u8> = (0..len)
            .map(|_| {
                if rng.gen_bool(0.7) {
                    common[rng.gen_range(0..common.len())]
                } else {
                    rng.gen_range(1..=255u8)
                }
            })
            .collect();
        assert_eq!(roundtrip(&model, &input), input);
    }
}

#[test]
fn test_default_model_swap() {
    let input = b"the people of the town";
    let encoded = compress(input);
    assert_eq!(decompress(&encoded).unwrap(), input);

    set_default_model(Arc::new(single_char_model()));
    assert_eq!(compress(b"aaaaaaaa"), vec![0xE0, 0x00, 0x00, 0x00]);
    assert_eq!(
        decompress(&[0xE0, 0x00, 0x00, 0x00]).unwrap(),
        b"aaaaaaaa"
    );
}
