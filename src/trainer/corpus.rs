use std::fmt::Display;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub(crate) const NEWLINE_SEPARATORS: &[u8] = b"\r\n";

/// Whitespace for splitting and stripping: blank, tab, vertical tab, form
/// feed, the newlines, and the two bytes of a UTF-8 soft hyphen.
pub(crate) const WHITESPACE: &[u8] = &[b' ', b'\t', 0x0B, 0x0C, b'\r', b'\n', 0xC2, 0xAD];

pub(crate) const PUNCTUATION: &[u8] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Where a corpus is cut into training segments.
#[derive(Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Debug, ValueEnum)]
pub enum SplitMode {
    None,
    Newline,
    WhitespaceAndNewline,
}

/// Which byte classes are trimmed from both ends of every segment.
#[derive(Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Debug, ValueEnum)]
pub enum StripMode {
    None,
    Whitespace,
    Punctuation,
    WhitespaceAndPunctuation,
}

impl SplitMode {
    #[inline(always)]
    fn is_separator(self, byte: u8) -> bool {
        match self {
            SplitMode::None => false,
            SplitMode::Newline => NEWLINE_SEPARATORS.contains(&byte),
            SplitMode::WhitespaceAndNewline => WHITESPACE.contains(&byte),
        }
    }
}

impl StripMode {
    #[inline(always)]
    fn strips(self, byte: u8) -> bool {
        match self {
            StripMode::None => false,
            StripMode::Whitespace => WHITESPACE.contains(&byte),
            StripMode::Punctuation => PUNCTUATION.contains(&byte),
            StripMode::WhitespaceAndPunctuation => {
                WHITESPACE.contains(&byte) || PUNCTUATION.contains(&byte)
            }
        }
    }
}

impl Display for SplitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SplitMode::None => "none",
            SplitMode::Newline => "newline",
            SplitMode::WhitespaceAndNewline => "whitespace-and-newline",
        })
    }
}

impl Display for StripMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            StripMode::None => "none",
            StripMode::Whitespace => "whitespace",
            StripMode::Punctuation => "punctuation",
            StripMode::WhitespaceAndPunctuation => "whitespace-and-punctuation",
        })
    }
}

/// Lazy segmentation of a corpus: split at the configured separators,
/// trim the configured byte classes, and drop what cannot contribute a
/// bigram.
///
/// Runs of separators yield no empty segments, and every emitted segment
/// is at least two bytes long.
pub struct Segments<'a> {
    data: &'a [u8],
    position: usize,
    split: SplitMode,
    strip: StripMode,
}

impl<'a> Segments<'a> {
    pub fn new(data: &'a [u8], split: SplitMode, strip: StripMode) -> Self {
        Segments {
            data,
            position: 0,
            split,
            strip,
        }
    }

    fn trim(&self, mut segment: &'a [u8]) -> &'a [u8] {
        while let Some((&first, rest)) = segment.split_first() {
            if !self.strip.strips(first) {
                break;
            }
            segment = rest;
        }
        while let Some((&last, rest)) = segment.split_last() {
            if !self.strip.strips(last) {
                break;
            }
            segment = rest;
        }
        segment
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        while self.position < self.data.len() {
            let start = self.position;
            let mut end = start;
            while end < self.data.len() && !self.split.is_separator(self.data[end]) {
                end += 1;
            }
            self.position = end + 1;

            let segment = self.trim(&self.data[start..end]);
            if segment.len() >= 2 {
                return Some(segment);
            }
        }
        None
    }
}
