use serde::{Deserialize, Serialize};

use crate::{ModelError, INVALID_ID, MAX_SUCCESSOR_N};

pub mod english;

/// Upper bound on the number of pack layouts a model may carry. Pack `i`
/// is announced on the wire by a first byte with `i + 1` leading ones, so
/// anything past three would collide with the malformed-header range.
pub const MAX_PACKS: usize = 3;

/// Bit-width vectors of the canonical pack layouts: header bits first,
/// then the leading-character field, then the successor fields.
const CANONICAL_WIDTHS: [&[u32]; MAX_PACKS] = [
    &[2, 4, 2],
    &[3, 4, 3, 3, 3],
    &[4, 5, 4, 4, 4, 3, 3, 3, 2],
];

/// A fixed layout mapping `bytes_unpacked` original characters into
/// `bytes_packed` encoded bytes.
///
/// All bit positions refer to a 32-bit code word whose upper
/// `bytes_packed * 8` bits are the ones that reach the wire.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Pack {
    /// The header prefix pre-shifted into the top byte of the code word.
    pub word: u32,
    pub bytes_packed: usize,
    pub bytes_unpacked: usize,
    /// Bit offset of each field, leading character first.
    pub offsets: Vec<u32>,
    /// Mask of each field, `(1 << width) - 1`.
    pub masks: Vec<u32>,
    /// Mask selecting the header prefix in the first wire byte.
    pub header_mask: u8,
    /// The header prefix itself, `1...10` padded to 8 bits.
    pub header: u8,
}

impl Pack {
    /// Builds a pack from a bit-width vector: `widths[0]` is the header
    /// width, the rest are field widths. Trailing zero entries are
    /// accepted as padding.
    pub fn from_widths(widths: &[u32]) -> Result<Pack, ModelError> {
        let fields: Vec<u32> = widths
            .iter()
            .skip(1)
            .copied()
            .take_while(|&width| width > 0)
            .collect();

        if widths.len() < 3 || fields.len() < 2 {
            return Err(ModelError::InvalidConfiguration(
                "a pack needs a header, a leading field and at least one successor field".to_owned(),
            ));
        }
        if widths[1 + fields.len()..].iter().any(|&width| width > 0) {
            return Err(ModelError::InvalidConfiguration(
                "pack field widths must not contain embedded zeros".to_owned(),
            ));
        }

        let header_bits = widths[0];
        if !(2..=4).contains(&header_bits) {
            return Err(ModelError::InvalidConfiguration(format!(
                "pack header width {header_bits} is outside 2..=4"
            )));
        }

        let total: u32 = header_bits + fields.iter().sum::<u32>();
        if total % 8 != 0 {
            return Err(ModelError::InvalidConfiguration(format!(
                "pack widths sum to {total} bits, not a whole number of bytes"
            )));
        }
        let bytes_packed = (total / 8) as usize;
        if !matches!(bytes_packed, 1 | 2 | 4) {
            return Err(ModelError::InvalidConfiguration(format!(
                "a code word must be 1, 2 or 4 bytes, not {bytes_packed}"
            )));
        }

        let bytes_unpacked = fields.len();
        if bytes_unpacked > MAX_SUCCESSOR_N + 1 {
            return Err(ModelError::InvalidConfiguration(format!(
                "a pack cannot consume more than {} characters",
                MAX_SUCCESSOR_N + 1
            )));
        }

        let mut offsets = Vec::with_capacity(bytes_unpacked);
        let mut masks = Vec::with_capacity(bytes_unpacked);
        let mut used = header_bits;
        for &width in &fields {
            used += width;
            offsets.push(32 - used);
            masks.push((1 << width) - 1);
        }

        let header = (((1u16 << header_bits) - 2) << (8 - header_bits)) as u8;
        let header_mask = (((1u16 << header_bits) - 1) << (8 - header_bits)) as u8;

        Ok(Pack {
            word: (header as u32) << 24,
            bytes_packed,
            bytes_unpacked,
            offsets,
            masks,
            header_mask,
            header,
        })
    }

    /// Whether this pack can encode the front of the given index run.
    #[inline(always)]
    pub fn admits(&self, indices: &[u32]) -> bool {
        indices.len() >= self.bytes_unpacked
            && indices[..self.bytes_unpacked]
                .iter()
                .zip(self.masks.iter())
                .all(|(&index, &mask)| index <= mask)
    }
}

/// The canonical pack layouts, trimmed to the requested number of
/// encoding types.
pub fn canonical_packs(encoding_types: usize) -> Result<Vec<Pack>, ModelError> {
    if !(1..=MAX_PACKS).contains(&encoding_types) {
        return Err(ModelError::InvalidConfiguration(format!(
            "encoding types must be between 1 and {MAX_PACKS}, got {encoding_types}"
        )));
    }
    CANONICAL_WIDTHS[..encoding_types]
        .iter()
        .map(|widths| Pack::from_widths(widths))
        .collect()
}

/// The immutable lookup tables parameterizing the codec.
///
/// A model is constructed once, validated, and then only read; encoders
/// and decoders borrow it and hold no state of their own across calls.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Model {
    min_char: usize,
    max_char: usize,
    chars_by_id: Vec<u8>,
    ids_by_char: Vec<u8>,
    successor_ids: Vec<u8>,
    chars_by_successor_id: Vec<u8>,
    successors_count: usize,
    packs: Vec<Pack>,
}

impl Model {
    /// Builds a model from ranked frequency lists: `leaders` in rank
    /// order, and for each leader its successors in rank order.
    ///
    /// The character table is sized at `1 << leading_bits` and the
    /// successor rows at `1 << successor_bits`; unused slots are filled
    /// with [`INVALID_ID`].
    pub fn from_rankings(
        leaders: &[u8],
        successors: &[Vec<u8>],
        leading_bits: u32,
        successor_bits: u32,
        packs: Vec<Pack>,
    ) -> Result<Model, ModelError> {
        let count = 1usize << leading_bits;
        let successors_count = 1usize << successor_bits;

        if leaders.is_empty() || leaders.len() > count {
            return Err(ModelError::InvalidConfiguration(format!(
                "{} leading characters do not fit a table of {count}",
                leaders.len()
            )));
        }
        if successors.len() != leaders.len() {
            return Err(ModelError::InvalidConfiguration(
                "one successor ranking per leading character is required".to_owned(),
            ));
        }
        if successors.iter().any(|row| row.len() > successors_count) {
            return Err(ModelError::InvalidConfiguration(format!(
                "a successor ranking exceeds the table row size {successors_count}"
            )));
        }

        let min_char = *leaders.iter().min().unwrap() as usize;
        let max_char = *leaders.iter().max().unwrap() as usize + 1;

        let mut chars_by_id = vec![INVALID_ID; count];
        chars_by_id[..leaders.len()].copy_from_slice(leaders);

        let mut ids_by_char = vec![INVALID_ID; 256];
        for (id, &leader) in leaders.iter().enumerate() {
            ids_by_char[leader as usize] = id as u8;
        }

        let mut successor_ids = vec![INVALID_ID; count * count];
        let mut chars_by_successor_id = vec![INVALID_ID; (max_char - min_char) * successors_count];
        for (id, ranked) in successors.iter().enumerate() {
            let row = (leaders[id] as usize - min_char) * successors_count;
            for (rank, &follower) in ranked.iter().enumerate() {
                chars_by_successor_id[row + rank] = follower;
                let follower_id = ids_by_char[follower as usize];
                if follower_id != INVALID_ID {
                    successor_ids[id * count + follower_id as usize] = rank as u8;
                }
            }
        }

        Model::from_tables(
            min_char,
            max_char,
            chars_by_id,
            ids_by_char,
            successor_ids,
            chars_by_successor_id,
            successors_count,
            packs,
        )
    }

    /// Builds a model from raw tables, as parsed back from a model
    /// header, and validates every structural invariant.
    #[allow(clippy::too_many_arguments)]
    pub fn from_tables(
        min_char: usize,
        max_char: usize,
        chars_by_id: Vec<u8>,
        ids_by_char: Vec<u8>,
        successor_ids: Vec<u8>,
        chars_by_successor_id: Vec<u8>,
        successors_count: usize,
        packs: Vec<Pack>,
    ) -> Result<Model, ModelError> {
        let model = Model {
            min_char,
            max_char,
            chars_by_id,
            ids_by_char,
            successor_ids,
            chars_by_successor_id,
            successors_count,
            packs,
        };
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ModelError> {
        let count = self.chars_by_id.len();
        if count == 0 || !count.is_power_of_two() || count > 256 {
            return Err(ModelError::InvalidConfiguration(format!(
                "the character table size {count} is not a power of two up to 256"
            )));
        }
        if !self.successors_count.is_power_of_two() || self.successors_count > 256 {
            return Err(ModelError::InvalidConfiguration(format!(
                "the successor row size {} is not a power of two up to 256",
                self.successors_count
            )));
        }
        if self.ids_by_char.len() != 256 {
            return Err(ModelError::InvalidConfiguration(format!(
                "the id table holds {} entries instead of 256",
                self.ids_by_char.len()
            )));
        }
        if self.successor_ids.len() != count * count {
            return Err(ModelError::InvalidConfiguration(format!(
                "the successor id table holds {} entries instead of {}",
                self.successor_ids.len(),
                count * count
            )));
        }
        if self.min_char > self.max_char || self.max_char > 256 {
            return Err(ModelError::InvalidConfiguration(format!(
                "invalid character range {}..{}",
                self.min_char, self.max_char
            )));
        }
        let rows = self.max_char - self.min_char;
        if self.chars_by_successor_id.len() != rows * self.successors_count {
            return Err(ModelError::InvalidConfiguration(format!(
                "the successor character table holds {} entries instead of {}",
                self.chars_by_successor_id.len(),
                rows * self.successors_count
            )));
        }

        self.validate_chars()?;
        self.validate_successors()?;
        self.validate_packs()
    }

    fn validate_chars(&self) -> Result<(), ModelError> {
        for (id, &chr) in self.chars_by_id.iter().enumerate() {
            if chr == INVALID_ID {
                continue;
            }
            if (chr as usize) < self.min_char || chr as usize >= self.max_char {
                return Err(ModelError::InvalidConfiguration(format!(
                    "character {chr} lies outside the range {}..{}",
                    self.min_char, self.max_char
                )));
            }
            if self.ids_by_char[chr as usize] != id as u8 {
                return Err(ModelError::InvalidConfiguration(format!(
                    "the id table does not invert the character table at id {id}"
                )));
            }
        }
        for (chr, &id) in self.ids_by_char.iter().enumerate() {
            if id == INVALID_ID {
                continue;
            }
            if id as usize >= self.chars_by_id.len() || self.chars_by_id[id as usize] != chr as u8 {
                return Err(ModelError::InvalidConfiguration(format!(
                    "the character table does not invert the id table at character {chr}"
                )));
            }
        }
        Ok(())
    }

    fn validate_successors(&self) -> Result<(), ModelError> {
        let count = self.chars_by_id.len();
        for leader_id in 0..count {
            for follower_id in 0..count {
                let rank = self.successor_ids[leader_id * count + follower_id];
                if rank == INVALID_ID {
                    continue;
                }
                let leader = self.chars_by_id[leader_id];
                let follower = self.chars_by_id[follower_id];
                if leader == INVALID_ID || follower == INVALID_ID {
                    return Err(ModelError::InvalidConfiguration(format!(
                        "successor rank stored for the undefined pair ({leader_id}, {follower_id})"
                    )));
                }
                if rank as usize >= self.successors_count {
                    return Err(ModelError::InvalidConfiguration(format!(
                        "successor rank {rank} exceeds the row size {}",
                        self.successors_count
                    )));
                }
                if self.successor_char(leader, rank as usize) != follower {
                    return Err(ModelError::InvalidConfiguration(format!(
                        "incoherent successor tables for the pair ({leader}, {follower})"
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_packs(&self) -> Result<(), ModelError> {
        if self.packs.is_empty() || self.packs.len() > MAX_PACKS {
            return Err(ModelError::InvalidConfiguration(format!(
                "a model carries between 1 and {MAX_PACKS} packs, got {}",
                self.packs.len()
            )));
        }
        for (index, pack) in self.packs.iter().enumerate() {
            if !matches!(pack.bytes_packed, 1 | 2 | 4) {
                return Err(ModelError::InvalidConfiguration(format!(
                    "pack {index} has an invalid code word size {}",
                    pack.bytes_packed
                )));
            }
            if index > 0 && pack.bytes_packed <= self.packs[index - 1].bytes_packed {
                return Err(ModelError::InvalidConfiguration(
                    "packs must be ordered by strictly growing code word size".to_owned(),
                ));
            }
            if pack.bytes_unpacked < 2 || pack.bytes_unpacked > MAX_SUCCESSOR_N + 1 {
                return Err(ModelError::InvalidConfiguration(format!(
                    "pack {index} consumes {} characters",
                    pack.bytes_unpacked
                )));
            }
            if pack.offsets.len() != pack.bytes_unpacked || pack.masks.len() != pack.bytes_unpacked {
                return Err(ModelError::InvalidConfiguration(format!(
                    "pack {index} carries {} offsets and {} masks for {} fields",
                    pack.offsets.len(),
                    pack.masks.len(),
                    pack.bytes_unpacked
                )));
            }
            if pack.header.leading_ones() as usize != index + 1 {
                return Err(ModelError::InvalidConfiguration(format!(
                    "pack {index} header {:#04x} does not carry {} leading ones",
                    pack.header,
                    index + 1
                )));
            }
            let prefix_bits = index as u32 + 2;
            if pack.header_mask != (((1u16 << prefix_bits) - 1) << (8 - prefix_bits)) as u8 {
                return Err(ModelError::InvalidConfiguration(format!(
                    "pack {index} header mask {:#04x} does not cover its prefix",
                    pack.header_mask
                )));
            }
            if pack.word != (pack.header as u32) << 24 {
                return Err(ModelError::InvalidConfiguration(format!(
                    "pack {index} word {:#010x} disagrees with its header",
                    pack.word
                )));
            }
            // Masks bounded by the table sizes keep decoding of corrupt
            // input inside the tables.
            if pack.masks[0] >= self.chars_by_id.len() as u32 {
                return Err(ModelError::InvalidConfiguration(format!(
                    "pack {index} leading mask {} exceeds the character table",
                    pack.masks[0]
                )));
            }
            if pack.masks[1..]
                .iter()
                .any(|&mask| mask >= self.successors_count as u32)
            {
                return Err(ModelError::InvalidConfiguration(format!(
                    "pack {index} successor masks exceed the row size {}",
                    self.successors_count
                )));
            }
            let low_bit = 32 - pack.bytes_packed as u32 * 8;
            for (&offset, &mask) in pack.offsets.iter().zip(pack.masks.iter()) {
                let width = (mask + 1).trailing_zeros();
                if mask == 0
                    || mask != (1u32 << width) - 1
                    || offset < low_bit
                    || offset + width > 32 - prefix_bits
                {
                    return Err(ModelError::InvalidConfiguration(format!(
                        "pack {index} field at offset {offset} does not fit the code word"
                    )));
                }
            }
        }
        Ok(())
    }

    #[inline(always)]
    pub fn min_char(&self) -> usize {
        self.min_char
    }

    #[inline(always)]
    pub fn max_char(&self) -> usize {
        self.max_char
    }

    /// Size of the leading character table, a power of two.
    #[inline(always)]
    pub fn leader_count(&self) -> usize {
        self.chars_by_id.len()
    }

    /// Size of one successor table row, a power of two.
    #[inline(always)]
    pub fn successors_count(&self) -> usize {
        self.successors_count
    }

    #[inline(always)]
    pub fn packs(&self) -> &[Pack] {
        &self.packs
    }

    #[inline(always)]
    pub fn chars_by_id(&self) -> &[u8] {
        &self.chars_by_id
    }

    #[inline(always)]
    pub fn char_by_id(&self, id: usize) -> u8 {
        self.chars_by_id[id]
    }

    #[inline(always)]
    pub fn id_by_char(&self, chr: u8) -> u8 {
        self.ids_by_char[chr as usize]
    }

    /// Successor rank of `follower_id` under `leader_id`, or
    /// [`INVALID_ID`] when the pair is not tracked.
    #[inline(always)]
    pub fn successor_id(&self, leader_id: u8, follower_id: u8) -> u8 {
        self.successor_ids[leader_id as usize * self.chars_by_id.len() + follower_id as usize]
    }

    /// Character decoded for successor slot `rank` after `last`.
    ///
    /// Characters outside the trained range, reachable only from corrupt
    /// input, map to [`INVALID_ID`] instead of a table row.
    #[inline(always)]
    pub fn successor_char(&self, last: u8, rank: usize) -> u8 {
        let last = last as usize;
        if last < self.min_char || last >= self.max_char {
            return INVALID_ID;
        }
        self.chars_by_successor_id[(last - self.min_char) * self.successors_count + rank]
    }
}
