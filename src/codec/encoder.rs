use crate::model::{Model, Pack};
use crate::{INVALID_ID, MAX_SUCCESSOR_N};

/// Greedy bit-packing encoder.
///
/// Holds nothing but the model handle, so one instance can serve any
/// number of calls, from any number of threads.
pub struct Encoder<'a> {
    model: &'a Model,
}

impl<'a> Encoder<'a> {
    pub fn new(model: &'a Model) -> Self {
        Encoder { model }
    }

    /// Appends the encoding of `input` to `out`.
    ///
    /// Scans left to right, at each position emitting the largest pack
    /// that fits the run of indexable characters, and falling back to a
    /// literal otherwise. Characters with the high bit set are escaped
    /// with a leading NUL. A NUL in the input terminates the encoding
    /// without being emitted.
    pub fn encode(&self, input: &[u8], out: &mut Vec<u8>) {
        let model = self.model;
        let mut indices = [0u32; MAX_SUCCESSOR_N + 1];
        let mut position = 0;

        while position < input.len() {
            let chr = input[position];
            if chr == 0x00 {
                return;
            }

            let lead_id = model.id_by_char(chr);
            let mut consecutive = 0;

            if lead_id != INVALID_ID {
                indices[0] = lead_id as u32;
                consecutive = 1;

                let mut previous_id = lead_id;
                while consecutive <= MAX_SUCCESSOR_N && position + consecutive < input.len() {
                    let next_id = model.id_by_char(input[position + consecutive]);
                    if next_id == INVALID_ID {
                        break;
                    }
                    let successor = model.successor_id(previous_id, next_id);
                    if successor == INVALID_ID {
                        break;
                    }
                    indices[consecutive] = successor as u32;
                    previous_id = next_id;
                    consecutive += 1;
                }
            }

            if consecutive >= 2 {
                if let Some(pack) = best_pack(model.packs(), &indices[..consecutive]) {
                    let mut word = pack.word;
                    for (index, offset) in indices[..pack.bytes_unpacked]
                        .iter()
                        .zip(pack.offsets.iter())
                    {
                        word |= index << offset;
                    }
                    out.extend_from_slice(&word.to_be_bytes()[..pack.bytes_packed]);
                    position += pack.bytes_unpacked;
                    continue;
                }
            }

            if chr & 0x80 != 0 {
                out.push(0x00);
            }
            out.push(chr);
            position += 1;
        }
    }

    pub fn encode_to_vec(&self, input: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(input.len());
        self.encode(input, &mut out);
        out
    }
}

/// The largest pack admitting the collected index run, if any. Packs are
/// stored smallest first, so the scan runs back to front.
fn best_pack<'p>(packs: &'p [Pack], indices: &[u32]) -> Option<&'p Pack> {
    packs.iter().rev().find(|pack| pack.admits(indices))
}
