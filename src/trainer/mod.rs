use serde::{Deserialize, Serialize};

use crate::model::{canonical_packs, Model, Pack};
use crate::{ModelError, INVALID_ID, MAX_SUCCESSOR_N};

pub mod corpus;
pub mod counter;

pub use corpus::{Segments, SplitMode, StripMode};
pub use counter::BigramCounter;

/// Options steering a training run.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
pub struct TrainOptions {
    /// Bits of a code word addressing the leading character table; the
    /// table holds `1 << leading_bits` entries.
    pub leading_bits: u32,
    /// Bits of a code word addressing a successor table row.
    pub successor_bits: u32,
    /// How many pack layouts the model carries, 1 to 3.
    pub encoding_types: usize,
    /// Search the corpus for the best pack layouts instead of taking the
    /// canonical ones.
    pub optimize_encoding: bool,
    pub split: SplitMode,
    pub strip: StripMode,
}

impl Default for TrainOptions {
    fn default() -> Self {
        TrainOptions {
            leading_bits: 5,
            successor_bits: 4,
            encoding_types: 3,
            optimize_encoding: false,
            split: SplitMode::Newline,
            strip: StripMode::Whitespace,
        }
    }
}

fn validate_options(options: &TrainOptions) -> Result<(), ModelError> {
    if !(1..=8).contains(&options.leading_bits) {
        return Err(ModelError::InvalidConfiguration(format!(
            "leading bits must lie in 1..=8, got {}",
            options.leading_bits
        )));
    }
    if !(1..=8).contains(&options.successor_bits) {
        return Err(ModelError::InvalidConfiguration(format!(
            "successor bits must lie in 1..=8, got {}",
            options.successor_bits
        )));
    }
    if !(1..=crate::model::MAX_PACKS).contains(&options.encoding_types) {
        return Err(ModelError::InvalidConfiguration(format!(
            "encoding types must lie in 1..=3, got {}",
            options.encoding_types
        )));
    }
    Ok(())
}

/// Builds a model from a corpus.
///
/// One streaming pass counts bigrams over the segmented input; a second
/// pass scores candidate pack layouts when `optimize_encoding` is set.
/// The options are validated up front, after which no input byte can make
/// training fail.
pub fn train(corpus: &[u8], options: &TrainOptions) -> Result<Model, ModelError> {
    validate_options(options)?;

    let mut counter = BigramCounter::new();
    for segment in Segments::new(corpus, options.split, options.strip) {
        counter.add_segment(segment);
    }
    if counter.bigrams() == 0 {
        return Err(ModelError::InvalidConfiguration(
            "the corpus contains no countable bigrams".to_owned(),
        ));
    }

    let leaders = counter.top_leaders(1 << options.leading_bits);
    let successors: Vec<Vec<u8>> = leaders
        .iter()
        .map(|&leader| counter.top_successors(leader, 1 << options.successor_bits))
        .collect();

    let packs = if options.optimize_encoding {
        optimize_packs(corpus, options, &leaders, &successors)?
    } else {
        canonical_packs(options.encoding_types)?
    };

    Model::from_rankings(
        &leaders,
        &successors,
        options.leading_bits,
        options.successor_bits,
        packs,
    )
}

/// Picks one pack layout per size class by replaying the corpus.
///
/// Every corpus position charges each candidate either its pack ratio
/// (`bytes_packed / bytes_unpacked`, when the candidate could encode
/// there) or the literal ratio 1.0; the smallest accumulated total wins
/// its class, ties going to the earliest enumerated layout.
fn optimize_packs(
    corpus: &[u8],
    options: &TrainOptions,
    leaders: &[u8],
    successors: &[Vec<u8>],
) -> Result<Vec<Pack>, ModelError> {
    let mut ids_by_char = [INVALID_ID; 256];
    for (id, &leader) in leaders.iter().enumerate() {
        ids_by_char[leader as usize] = id as u8;
    }

    let count = leaders.len();
    let mut successor_ids = vec![INVALID_ID; count * count];
    for (id, ranked) in successors.iter().enumerate() {
        for (rank, &follower) in ranked.iter().enumerate() {
            let follower_id = ids_by_char[follower as usize];
            if follower_id != INVALID_ID {
                successor_ids[id * count + follower_id as usize] = rank as u8;
            }
        }
    }

    let classes: Vec<Vec<Pack>> = (0..options.encoding_types)
        .map(|pack_index| enumerate_candidates(pack_index, options))
        .collect::<Result<_, _>>()?;
    let mut scores: Vec<Vec<f64>> = classes.iter().map(|class| vec![0.0; class.len()]).collect();

    for segment in Segments::new(corpus, options.split, options.strip) {
        for start in 0..segment.len() {
            let (indices, consecutive) =
                index_run(&segment[start..], &ids_by_char, &successor_ids, count);
            let run = &indices[..consecutive];

            for (class, class_scores) in classes.iter().zip(scores.iter_mut()) {
                for (candidate, score) in class.iter().zip(class_scores.iter_mut()) {
                    *score += if candidate.admits(run) {
                        candidate.bytes_packed as f64 / candidate.bytes_unpacked as f64
                    } else {
                        1.0
                    };
                }
            }
        }
    }

    let mut chosen = Vec::with_capacity(classes.len());
    for (class, class_scores) in classes.into_iter().zip(scores.iter()) {
        let mut best = 0;
        for (candidate, &score) in class_scores.iter().enumerate() {
            if score < class_scores[best] {
                best = candidate;
            }
        }
        chosen.push(class.into_iter().nth(best).unwrap());
    }
    Ok(chosen)
}

/// The run of pack indices rooted at the front of `window`: the leading
/// character id followed by successor ranks, cut at the first untracked
/// step. Mirrors what the encoder will collect at this position.
fn index_run(
    window: &[u8],
    ids_by_char: &[u8; 256],
    successor_ids: &[u8],
    leader_count: usize,
) -> ([u32; MAX_SUCCESSOR_N + 1], usize) {
    let mut indices = [0u32; MAX_SUCCESSOR_N + 1];
    if window.is_empty() || window[0] == 0x00 {
        return (indices, 0);
    }

    let lead_id = ids_by_char[window[0] as usize];
    if lead_id == INVALID_ID {
        return (indices, 0);
    }
    indices[0] = lead_id as u32;

    let mut consecutive = 1;
    let mut previous_id = lead_id;
    while consecutive <= MAX_SUCCESSOR_N && consecutive < window.len() {
        let next_id = ids_by_char[window[consecutive] as usize];
        if next_id == INVALID_ID {
            break;
        }
        let successor = successor_ids[previous_id as usize * leader_count + next_id as usize];
        if successor == INVALID_ID {
            break;
        }
        indices[consecutive] = successor as u32;
        previous_id = next_id;
        consecutive += 1;
    }
    (indices, consecutive)
}

/// All pack layouts for one size class: header width fixed by the pack
/// index, a leading field of at most `leading_bits`, and non-increasing
/// successor fields of at most `successor_bits`, filling the code word
/// exactly.
fn enumerate_candidates(pack_index: usize, options: &TrainOptions) -> Result<Vec<Pack>, ModelError> {
    let header_bits = pack_index as u32 + 2;
    let bytes_packed = [1usize, 2, 4][pack_index];
    let budget = bytes_packed as u32 * 8 - header_bits;

    let mut candidates = Vec::new();
    for unpacked in 2..=MAX_SUCCESSOR_N + 1 {
        let successor_slots = (unpacked - 1) as u32;
        for lead in 1..=options.leading_bits.min(budget.saturating_sub(successor_slots)) {
            let mut widths = vec![header_bits, lead];
            fill_successor_widths(
                &mut candidates,
                &mut widths,
                successor_slots,
                budget - lead,
                options.successor_bits,
            )?;
        }
    }

    if candidates.is_empty() {
        return Err(ModelError::InvalidConfiguration(format!(
            "no pack layout with {bytes_packed} packed bytes fits leading bits {} and successor bits {}",
            options.leading_bits, options.successor_bits
        )));
    }
    Ok(candidates)
}

fn fill_successor_widths(
    candidates: &mut Vec<Pack>,
    widths: &mut Vec<u32>,
    slots: u32,
    remaining: u32,
    cap: u32,
) -> Result<(), ModelError> {
    if slots == 0 {
        if remaining == 0 {
            candidates.push(Pack::from_widths(widths)?);
        }
        return Ok(());
    }

    let high = cap.min(remaining.saturating_sub(slots - 1));
    for width in (1..=high).rev() {
        widths.push(width);
        fill_successor_widths(candidates, widths, slots - 1, remaining - width, width)?;
        widths.pop();
    }
    Ok(())
}
