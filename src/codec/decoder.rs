use crate::codec::decode_header;
use crate::model::Model;
use crate::DecodeError;

/// Inverse of [`crate::Encoder`].
///
/// Only consults `chars_by_id` and the successor character table; the
/// id-side tables exist for the encoder alone.
pub struct Decoder<'a> {
    model: &'a Model,
}

impl<'a> Decoder<'a> {
    pub fn new(model: &'a Model) -> Self {
        Decoder { model }
    }

    /// Appends the decoding of `input` to `out`.
    ///
    /// Nothing is appended for a code word that turns out malformed or
    /// truncated.
    pub fn decode(&self, input: &[u8], out: &mut Vec<u8>) -> Result<(), DecodeError> {
        let model = self.model;
        let packs = model.packs();
        let mut position = 0;

        while position < input.len() {
            let header = input[position];
            let mark = decode_header(header);

            if mark < 0 {
                if header == 0x00 {
                    position += 1;
                    if position >= input.len() {
                        return Err(DecodeError::Truncated(position));
                    }
                }
                out.push(input[position]);
                position += 1;
                continue;
            }

            let mark = mark as usize;
            if mark >= packs.len() {
                return Err(DecodeError::InvalidHeader(position));
            }

            let pack = &packs[mark];
            if position + pack.bytes_packed > input.len() {
                return Err(DecodeError::Truncated(position));
            }

            let mut word = 0u32;
            for (i, &byte) in input[position..position + pack.bytes_packed]
                .iter()
                .enumerate()
            {
                word |= (byte as u32) << (24 - 8 * i);
            }

            let mut last = model.char_by_id(((word >> pack.offsets[0]) & pack.masks[0]) as usize);
            out.push(last);
            for (offset, mask) in pack.offsets[1..].iter().zip(pack.masks[1..].iter()) {
                last = model.successor_char(last, ((word >> offset) & mask) as usize);
                out.push(last);
            }

            position += pack.bytes_packed;
        }

        Ok(())
    }

    pub fn decode_to_vec(&self, input: &[u8]) -> Result<Vec<u8>, DecodeError> {
        let mut out = Vec::with_capacity(input.len() * 2);
        self.decode(input, &mut out)?;
        Ok(out)
    }
}
