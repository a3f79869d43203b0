use super::*;
use crate::model::english::english_model;
use crate::trainer::{self, TrainOptions};

#[test]
fn test_english_model_roundtrips() {
    let model = english_model();
    let text = write_header(&model);
    assert_eq!(read_header(&text).unwrap(), model);
}

#[test]
fn test_trained_models_roundtrip() {
    let corpus = b"the first lines of text\nthe second of the lines\nmore of the same\n";
    for options in [
        TrainOptions::default(),
        TrainOptions {
            encoding_types: 1,
            ..TrainOptions::default()
        },
        TrainOptions {
            leading_bits: 3,
            successor_bits: 2,
            encoding_types: 2,
            optimize_encoding: true,
            ..TrainOptions::default()
        },
    ] {
        let model = trainer::train(corpus, &options).unwrap();
        let text = write_header(&model);
        assert_eq!(read_header(&text).unwrap(), model, "options {options:?}");
    }
}

#[test]
fn test_escaped_characters_roundtrip() {
    // leaders that exercise every emitter escape class: control
    // characters, quote, backslash and a high byte
    let leaders = [b'\t', b'\n', b'\'', b'\\', 0x8A, b'a'];
    let successors = vec![vec![b'a']; 6];
    let packs = vec![Pack::from_widths(&[2, 3, 1, 1, 1]).unwrap()];
    let model = Model::from_rankings(&leaders, &successors, 3, 1, packs).unwrap();

    let text = write_header(&model);
    assert!(text.contains("'\\t'"));
    assert!(text.contains("'\\n'"));
    assert!(text.contains("'\\''"));
    assert!(text.contains("'\\\\'"));
    assert!(text.contains("'\\x8a'"));
    assert_eq!(read_header(&text).unwrap(), model);
}

#[test]
fn test_scanner_accepts_all_c_escapes() {
    let cases: [(&str, i64); 12] = [
        ("'\\a'", 0x07),
        ("'\\b'", 0x08),
        ("'\\f'", 0x0C),
        ("'\\v'", 0x0B),
        ("'\\e'", 0x1B),
        ("'\\?'", 0x3F),
        ("'\\\"'", 0x22),
        ("'\\x41'", 0x41),
        ("'\\xf'", 0x0F),
        ("'\\101'", 0x41),
        ("'\\0'", 0x00),
        ("'\\377'", 0xFF),
    ];
    for (text, expected) in cases {
        let mut scanner = Scanner::new(text, "test");
        assert_eq!(scanner.parse_item().unwrap(), Item::Value(expected), "{text}");
    }
}

#[test]
fn test_scanner_numbers() {
    for (text, expected) in [("-1", -1), ("0x80000000", 0x80000000), ("26", 26), ("0", 0)] {
        let mut scanner = Scanner::new(text, "test");
        assert_eq!(scanner.parse_item().unwrap(), Item::Value(expected), "{text}");
    }
}

#[test]
fn test_scanner_rejects_garbage() {
    for text in ["'\\q'", "'", "''", "'\\x'", "--1", "{ 1, ", "junk"] {
        let mut scanner = Scanner::new(text, "test");
        assert!(scanner.parse_item().is_err(), "{text}");
    }
}

#[test]
fn test_missing_pieces_are_parse_errors() {
    let model = english_model();
    let text = write_header(&model);

    assert!(matches!(
        read_header(""),
        Err(ModelError::HeaderParse(_))
    ));
    assert!(read_header(&text.replace("#define PACK_COUNT 3", "")).is_err());
    assert!(read_header(&text.replace("chrs_by_chr_id", "chrs_by_id")).is_err());
    assert!(read_header(&text.replacen('{', "{ what,", 1)).is_err());
}

#[test]
fn test_value_level_validation() {
    let model = english_model();
    let text = write_header(&model);

    // the pack list length has to match its #define
    assert!(matches!(
        read_header(&text.replace("#define PACK_COUNT 3", "#define PACK_COUNT 2")),
        Err(ModelError::HeaderParse(_))
    ));
    // only seven packed successors are supported
    assert!(matches!(
        read_header(&text.replace("#define MAX_SUCCESSOR_N 7", "#define MAX_SUCCESSOR_N 9")),
        Err(ModelError::HeaderParse(_))
    ));
    // an id pointing at an empty character slot fails table validation
    assert!(matches!(
        read_header(&text.replacen("-1", "31", 1)),
        Err(ModelError::InvalidConfiguration(_))
    ));
}
